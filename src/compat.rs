//! Compatibility Filter: given an on-demand "pattern" instance, returns
//! spot candidates that dominate it on every capability axis, pass the
//! allow/deny glob lists, and are strictly cheaper than on-demand.

use crate::catalog::TypeInfo;
use crate::config::{glob_matches, EffectiveConfig};
use crate::types::{AvailabilityZone, BiddingPolicy, Virtualization};

/// Relative tolerance applied to the memory comparison, per §4.3.
const MEMORY_TOLERANCE: f64 = 0.01;

/// A spot type that passed every compatibility check, priced in the one
/// AZ it was evaluated against.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub instance_type: String,
    pub az: AvailabilityZone,
    pub spot_price: f64,
}

fn virtualization_compatible(pattern: Virtualization, candidate: Virtualization) -> bool {
    candidate == pattern || candidate == Virtualization::Hvm
}

pub(crate) fn capability_dominates(pattern: &TypeInfo, candidate: &TypeInfo) -> bool {
    if !virtualization_compatible(pattern.virtualization, candidate.virtualization) {
        return false;
    }
    if candidate.vcpu < pattern.vcpu {
        return false;
    }
    if candidate.memory_gib < pattern.memory_gib * (1.0 - MEMORY_TOLERANCE) {
        return false;
    }
    if candidate.gpu_count < pattern.gpu_count {
        return false;
    }
    if pattern.has_instance_storage()
        && !pattern.ebs_only
        && candidate.instance_storage_gib < pattern.instance_storage_gib
    {
        return false;
    }
    if candidate.network_tier < pattern.network_tier {
        return false;
    }
    true
}

/// Distance used to break price ties: smaller is a closer match.
fn capability_distance(pattern: &TypeInfo, candidate: &TypeInfo) -> f64 {
    (candidate.vcpu - pattern.vcpu).abs()
        + (candidate.memory_gib - pattern.memory_gib).abs()
        + (candidate.instance_storage_gib - pattern.instance_storage_gib).abs()
}

pub(crate) fn passes_allow_deny(
    instance_type: &str,
    pattern_type: &str,
    allowed: &[String],
    disallowed: &[String],
) -> bool {
    let allow_ok = allowed.is_empty()
        || allowed.iter().any(|glob| {
            if glob == "current" {
                instance_type == pattern_type
            } else {
                glob_matches(glob, instance_type)
            }
        });
    let deny_ok = !disallowed.iter().any(|glob| glob_matches(glob, instance_type));
    allow_ok && deny_ok
}

pub struct CompatibilityFilter;

impl CompatibilityFilter {
    /// Produce compatible candidates for `pattern`, ordered by spot
    /// price ascending, ties broken by closer capability match then
    /// lexicographic type name.
    pub fn candidates<'a>(
        pattern: &TypeInfo,
        azs: impl IntoIterator<Item = &'a AvailabilityZone>,
        all_types: impl IntoIterator<Item = &'a TypeInfo>,
        config: &EffectiveConfig,
    ) -> Vec<Candidate> {
        let azs: Vec<&AvailabilityZone> = azs.into_iter().collect();
        let mut out: Vec<(Candidate, &TypeInfo)> = Vec::new();

        for candidate_type in all_types {
            if !capability_dominates(pattern, candidate_type) {
                continue;
            }
            if !passes_allow_deny(
                &candidate_type.instance_type,
                &pattern.instance_type,
                &config.allowed_types,
                &config.disallowed_types,
            ) {
                continue;
            }

            let threshold = pattern.on_demand_price * config.on_demand_price_multiplier;
            for az in &azs {
                let Some(spot_price) = candidate_type.spot_price(az) else {
                    continue;
                };
                let buffered = spot_price * (1.0 + config.spot_price_buffer_pct / 100.0);
                if buffered < threshold {
                    out.push((
                        Candidate {
                            instance_type: candidate_type.instance_type.clone(),
                            az: (*az).clone(),
                            spot_price,
                        },
                        candidate_type,
                    ));
                }
            }
        }

        out.sort_by(|(a, a_type), (b, b_type)| {
            a.spot_price
                .partial_cmp(&b.spot_price)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| {
                    capability_distance(pattern, a_type)
                        .partial_cmp(&capability_distance(pattern, b_type))
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .then_with(|| a.instance_type.cmp(&b.instance_type))
        });

        out.into_iter().map(|(candidate, _)| candidate).collect()
    }

    /// `getPricetoBid`: compute the bid price given the chosen
    /// candidate, never exceeding on-demand price.
    pub fn price_to_bid(
        on_demand_price: f64,
        spot_price: f64,
        config: &EffectiveConfig,
    ) -> f64 {
        match config.bidding_policy {
            BiddingPolicy::Normal => on_demand_price,
            BiddingPolicy::Aggressive => {
                let buffered = spot_price * (1.0 + config.spot_price_buffer_pct / 100.0);
                buffered.min(on_demand_price)
            }
        }
    }
}
