//! Replacement Controller: the top-level per-ASG state machine from
//! SPEC_FULL.md §4.2. One `tick` call drives at most one action:
//! placing a new SIR, attaching a ready spot instance, or a no-op.

use crate::asg::AsgView;
use crate::catalog::{InstanceCatalog, TypeInfo};
use crate::cloud::{AsgMutator, PricingOracle, SpotRequester, Waiter};
use crate::compat::{capability_dominates, passes_allow_deny, CompatibilityFilter};
use crate::config::EffectiveConfig;
use crate::error::{Error, Result};
use crate::sir::{SirOutcome, SirTracker};
use crate::tags;
use crate::types::AvailabilityZone;
use std::time::Duration;
use tracing::{info, warn};

/// What happened on this ASG during this tick. Returned to the driver
/// for reporting; never itself a reason to fail the invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    PlacedSir { sir_id: String, instance_type: String, bid_price: f64 },
    AttachedSpotInstance { instance_id: String },
    NoOp(NoOpReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoOpReason {
    NoReplacementNeeded,
    WaitingOnSir,
    NoCompatibleCandidate,
}

pub struct ReplacementController<'a, M, P, R, W>
where
    M: AsgMutator,
    P: PricingOracle,
    R: SpotRequester,
    W: Waiter,
{
    asg_mutator: &'a M,
    pricing: &'a P,
    requester: &'a R,
    sir_tracker: SirTracker<'a, R, W>,
}

impl<'a, M, P, R, W> ReplacementController<'a, M, P, R, W>
where
    M: AsgMutator,
    P: PricingOracle,
    R: SpotRequester,
    W: Waiter,
{
    pub fn new(asg_mutator: &'a M, pricing: &'a P, requester: &'a R, waiter: &'a W) -> Self {
        Self {
            asg_mutator,
            pricing,
            requester,
            sir_tracker: SirTracker::new(requester, waiter),
        }
    }

    /// Run one tick for a single ASG. Errors are intended to be caught
    /// by the caller (the out-of-scope driver), logged, and reported
    /// without failing the rest of the invocation.
    pub async fn tick(
        &self,
        view: &AsgView,
        catalog: &InstanceCatalog,
        sir_wait_deadline: Duration,
    ) -> Result<TickOutcome> {
        if let Some(outcome) = self
            .sir_tracker
            .find_match(&view.name, catalog, &view.instance_ids, sir_wait_deadline)
            .await?
        {
            return match outcome {
                SirOutcome::ReadyForSwap { sir_id, instance_id } => {
                    self.swap(view, catalog, &instance_id).await?;
                    self.sir_tracker.finalize(&sir_id).await?;
                    Ok(TickOutcome::AttachedSpotInstance { instance_id })
                }
                SirOutcome::WaitForNextTick => Ok(TickOutcome::NoOp(NoOpReason::WaitingOnSir)),
                SirOutcome::TryNext => unreachable!("find_match never returns TryNext"),
            };
        }

        if !view.needs_replacement(catalog) {
            return Ok(TickOutcome::NoOp(NoOpReason::NoReplacementNeeded));
        }

        let spot_az = self.spot_instance_az(view, catalog);
        let victim = match view.pick_on_demand_victim(catalog, spot_az.as_ref()) {
            Some(v) => v,
            None => return Ok(TickOutcome::NoOp(NoOpReason::NoReplacementNeeded)),
        };

        let pattern = catalog
            .type_info(&victim.instance_type)
            .ok_or_else(|| Error::NotFound(format!("type info for {}", victim.instance_type)))?;

        let priced_types = self
            .priced_candidate_types(pattern, &view.availability_zones, catalog, &view.config)
            .await?;

        let candidates = CompatibilityFilter::candidates(
            pattern,
            &view.availability_zones,
            priced_types.iter(),
            &view.config,
        );

        let Some(chosen) = candidates.into_iter().next() else {
            info!(asg = %view.name, pattern = %victim.instance_type, "no compatible spot candidate this tick");
            return Ok(TickOutcome::NoOp(NoOpReason::NoCompatibleCandidate));
        };

        let on_demand_price = self
            .pricing
            .on_demand_price(&victim.instance_type)
            .await?
            .unwrap_or(pattern.on_demand_price);

        let bid_price = CompatibilityFilter::price_to_bid(on_demand_price, chosen.spot_price, &view.config);

        let mut sir_tags = view.propagated_sir_tags(&format!("{}-lc", view.name));
        sir_tags.insert(tags::LAUNCHED_FOR_ASG.to_string(), view.name.clone());

        let sir = self
            .requester
            .create_sir(
                &chosen.instance_type,
                &chosen.az,
                bid_price,
                &view.config.spot_product_description,
                &sir_tags,
            )
            .await?;

        info!(asg = %view.name, sir_id = %sir.id, instance_type = %chosen.instance_type, bid_price, "placed spot instance request");

        Ok(TickOutcome::PlacedSir {
            sir_id: sir.id,
            instance_type: chosen.instance_type,
            bid_price,
        })
    }

    /// Fills in `spot_price_by_az` for every candidate type/AZ pair the
    /// Compatibility Filter would otherwise consider, by calling the
    /// pricing oracle directly (`TypeInfo` coming out of the catalog
    /// builder carries no live spot pricing). Only queries types that
    /// already pass the cheap capability/allow-deny checks, so a tick
    /// never prices a family it could not place a SIR for anyway.
    async fn priced_candidate_types(
        &self,
        pattern: &TypeInfo,
        azs: &[AvailabilityZone],
        catalog: &InstanceCatalog,
        config: &EffectiveConfig,
    ) -> Result<Vec<TypeInfo>> {
        let mut out = Vec::new();
        for candidate_type in catalog.all_type_info() {
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

            let mut priced = candidate_type.clone();
            for az in azs {
                if priced.spot_price(az).is_some() {
                    continue;
                }
                if let Some(price) = self.pricing.spot_price(&priced.instance_type, az).await? {
                    priced.spot_price_by_az.insert(az.clone(), price);
                }
            }
            out.push(priced);
        }
        Ok(out)
    }

    /// AZ of a not-yet-attached spot instance seen by the SIR tracker,
    /// used to prefer a co-located on-demand victim. Not applicable to
    /// the "place a new SIR" path, only ever consulted after the
    /// tracker reports `ReadyForSwap`; returns `None` here because at
    /// this point in `tick` no such instance has been discovered yet.
    fn spot_instance_az(&self, _view: &AsgView, _catalog: &InstanceCatalog) -> Option<AvailabilityZone> {
        None
    }

    /// The atomic detach/terminate/attach swap from §4.2.
    async fn swap(&self, view: &AsgView, catalog: &InstanceCatalog, spot_instance_id: &str) -> Result<()> {
        let spot_az = catalog
            .get(spot_instance_id)
            .map(|i| i.az.clone());

        let victim = view
            .pick_on_demand_victim(catalog, spot_az.as_ref())
            .ok_or_else(|| Error::NotFound(format!("on-demand victim for ASG {}", view.name)))?;
        let victim_id = victim.id.clone();

        let raised_max_size = view.current_size(catalog) as u32 >= view.max_size;
        if raised_max_size {
            self.asg_mutator.set_max_size(&view.name, view.max_size + 1).await?;
        }

        self.asg_mutator.detach_instance(&view.name, &victim_id).await?;

        if let Err(err) = self.asg_mutator.terminate_instance(&victim_id).await {
            warn!(asg = %view.name, instance_id = %victim_id, error = %err, "victim termination failed after detach, proceeding to attach");
        }

        self.asg_mutator.attach_instance(&view.name, spot_instance_id).await?;

        if raised_max_size {
            self.asg_mutator.set_max_size(&view.name, view.max_size).await?;
        }

        Ok(())
    }
}
