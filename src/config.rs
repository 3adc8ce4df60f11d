//! Config Resolver: merges process defaults, region defaults, and ASG
//! tags into an `EffectiveConfig`. Resolution is a pure function of its
//! inputs — no I/O, so it is safe to call repeatedly and to property-test.

use crate::tags;
use crate::types::BiddingPolicy;
use regex::Regex;
use std::collections::HashMap;

pub const DEFAULT_MIN_ON_DEMAND_VALUE: u32 = 0;

/// Process-wide defaults, normally sourced from CLI flags or env vars
/// by the (out-of-scope) driver and handed to the resolver as a value.
#[derive(Debug, Clone)]
pub struct ProcessDefaults {
    pub allowed_instance_types: Vec<String>,
    pub disallowed_instance_types: Vec<String>,
    pub min_on_demand_number: Option<u32>,
    pub min_on_demand_percentage: Option<f64>,
    pub on_demand_price_multiplier: f64,
    pub spot_product_description: String,
    pub spot_price_buffer_percentage: f64,
    pub bidding_policy: BiddingPolicy,
    pub tag_filters: Vec<tags::TagFilter>,
    /// Deadline for the SIR tracker's bounded wait for fulfilment.
    /// Not documented in the source this system was distilled from;
    /// kept as configuration rather than a hard-coded constant.
    pub sir_wait_deadline: std::time::Duration,
}

impl Default for ProcessDefaults {
    fn default() -> Self {
        Self {
            allowed_instance_types: Vec::new(),
            disallowed_instance_types: Vec::new(),
            min_on_demand_number: None,
            min_on_demand_percentage: None,
            on_demand_price_multiplier: 1.0,
            spot_product_description: "Linux/UNIX".to_string(),
            spot_price_buffer_percentage: 10.0,
            bidding_policy: BiddingPolicy::Normal,
            tag_filters: tags::TagFilter::parse_list(&format!(
                "{}={}",
                tags::DEFAULT_OPT_IN_TAG_KEY,
                tags::DEFAULT_OPT_IN_TAG_VALUE
            )),
            sir_wait_deadline: std::time::Duration::from_secs(45),
        }
    }
}

impl ProcessDefaults {
    /// Load from the environment variables named in the external
    /// interface spec. Unset or unparseable variables fall back to
    /// `Default::default()` field by field.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            allowed_instance_types: std::env::var("ALLOWED_INSTANCE_TYPES")
                .map(|v| split_tokens(&v))
                .unwrap_or(defaults.allowed_instance_types),
            disallowed_instance_types: std::env::var("DISALLOWED_INSTANCE_TYPES")
                .map(|v| split_tokens(&v))
                .unwrap_or(defaults.disallowed_instance_types),
            min_on_demand_number: std::env::var("MIN_ON_DEMAND_NUMBER")
                .ok()
                .and_then(|v| v.parse().ok())
                .or(defaults.min_on_demand_number),
            min_on_demand_percentage: std::env::var("MIN_ON_DEMAND_PERCENTAGE")
                .ok()
                .and_then(|v| v.parse().ok())
                .or(defaults.min_on_demand_percentage),
            on_demand_price_multiplier: std::env::var("ON_DEMAND_PRICE_MULTIPLIER")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.on_demand_price_multiplier),
            spot_product_description: std::env::var("SPOT_PRODUCT_DESCRIPTION")
                .unwrap_or(defaults.spot_product_description),
            spot_price_buffer_percentage: std::env::var("SPOT_PRICE_BUFFER_PERCENTAGE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.spot_price_buffer_percentage),
            bidding_policy: std::env::var("BIDDING_POLICY")
                .ok()
                .and_then(|v| BiddingPolicy::parse(&v))
                .unwrap_or(defaults.bidding_policy),
            tag_filters: std::env::var("TAG_FILTERS")
                .map(|v| tags::TagFilter::parse_list(&v))
                .unwrap_or(defaults.tag_filters),
            sir_wait_deadline: defaults.sir_wait_deadline,
        }
    }
}

/// Region-level overrides, sitting between process defaults and ASG
/// tags in precedence. Any field left `None` falls through.
#[derive(Debug, Clone, Default)]
pub struct RegionDefaults {
    pub min_on_demand_number: Option<u32>,
    pub min_on_demand_percentage: Option<f64>,
}

/// The fully resolved, per-ASG configuration the rest of the controller
/// operates on.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveConfig {
    pub min_on_demand_count: u32,
    pub min_on_demand_percent: f64,
    pub bidding_policy: BiddingPolicy,
    pub spot_price_buffer_pct: f64,
    pub allowed_types: Vec<String>,
    pub disallowed_types: Vec<String>,
    pub on_demand_price_multiplier: f64,
    pub spot_product_description: String,
}

/// Splits on comma or whitespace, dropping empty tokens, per §4.1.
fn split_tokens(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Floor `percent` (0..=100) of `total` down to an integer, per the
/// resolved rounding-direction open question in SPEC_FULL.md §9.
pub fn floor_percent(percent: f64, total: u32) -> u32 {
    ((percent / 100.0) * total as f64).floor() as u32
}

pub struct ConfigResolver;

impl ConfigResolver {
    /// Resolve process defaults, region defaults, and ASG tags into an
    /// `EffectiveConfig`. `asg_max_size` bounds the valid range for
    /// `autospotting_min_on_demand_number`.
    pub fn resolve(
        process: &ProcessDefaults,
        region: &RegionDefaults,
        asg_tags: &HashMap<String, String>,
        asg_max_size: u32,
    ) -> EffectiveConfig {
        let tag_count = asg_tags
            .get(tags::MIN_ON_DEMAND_NUMBER)
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|&n| n >= 0 && n as u32 <= asg_max_size)
            .map(|n| n as u32);

        let tag_percent = asg_tags
            .get(tags::MIN_ON_DEMAND_PERCENTAGE)
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|&p| (0.0..=100.0).contains(&p));

        // A percent-based floor is only ever evaluated against the ASG's
        // live running size (`AsgView::on_demand_floor`), never against
        // `MaxSize`: `min_on_demand_count` stays 0 in that case so
        // `on_demand_floor`'s `max(min_on_demand_count, floor(percent *
        // current_size / 100))` reduces to the percentage alone. Using
        // `asg_max_size` here would wrongly pin the floor to MaxSize for
        // any ASG running below capacity.
        let (min_on_demand_count, min_on_demand_percent) = match (tag_count, tag_percent) {
            (Some(count), _) => (count, 0.0),
            (None, Some(percent)) => (0, percent),
            (None, None) => {
                let count = region
                    .min_on_demand_number
                    .or(process.min_on_demand_number);
                let percent = region.min_on_demand_percentage.or(process.min_on_demand_percentage);
                match (count, percent) {
                    (Some(count), _) => (count, 0.0),
                    (None, Some(percent)) => (0, percent),
                    (None, None) => (DEFAULT_MIN_ON_DEMAND_VALUE, 0.0),
                }
            }
        };

        let allowed_types = asg_tags
            .get(tags::ALLOWED_INSTANCE_TYPES)
            .map(|v| split_tokens(v))
            .unwrap_or_else(|| process.allowed_instance_types.clone());

        let disallowed_types = asg_tags
            .get(tags::DISALLOWED_INSTANCE_TYPES)
            .map(|v| split_tokens(v))
            .unwrap_or_else(|| process.disallowed_instance_types.clone());

        let bidding_policy = asg_tags
            .get(tags::BIDDING_POLICY)
            .and_then(|v| BiddingPolicy::parse(v))
            .unwrap_or(process.bidding_policy);

        let spot_price_buffer_pct = asg_tags
            .get(tags::SPOT_PRICE_BUFFER_PERCENTAGE)
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|&v| v >= 0.0)
            .unwrap_or(process.spot_price_buffer_percentage);

        let on_demand_price_multiplier = asg_tags
            .get(tags::ON_DEMAND_PRICE_MULTIPLIER)
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|&v| v > 0.0)
            .unwrap_or(process.on_demand_price_multiplier);

        EffectiveConfig {
            min_on_demand_count,
            min_on_demand_percent,
            bidding_policy,
            spot_price_buffer_pct,
            allowed_types,
            disallowed_types,
            on_demand_price_multiplier,
            spot_product_description: process.spot_product_description.clone(),
        }
    }
}

/// Compile a glob token (only `*` is a wildcard) into an anchored regex.
/// The special token `current` is handled by the caller, not here.
pub fn glob_to_regex(pattern: &str) -> Regex {
    let mut anchored = String::from("^");
    for part in pattern.split('*') {
        anchored.push_str(&regex::escape(part));
        anchored.push_str(".*");
    }
    // trailing ".*" added once too many; strip it back off.
    anchored.truncate(anchored.len() - 2);
    anchored.push('$');
    Regex::new(&anchored).unwrap_or_else(|_| Regex::new("$^").expect("empty-match regex is valid"))
}

pub fn glob_matches(pattern: &str, candidate: &str) -> bool {
    glob_to_regex(pattern).is_match(candidate)
}
