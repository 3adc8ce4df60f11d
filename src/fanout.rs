//! Per-region concurrency helper: drives one tick per ASG, independent
//! of each other, per SPEC_FULL.md §5. Region enumeration, credentials,
//! and the periodic trigger itself remain the caller's responsibility.

use crate::asg::AsgView;
use crate::catalog::InstanceCatalog;
use crate::cloud::{AsgMutator, PricingOracle, SpotRequester, Waiter};
use crate::controller::{ReplacementController, TickOutcome};
use crate::error::Result;
use std::time::Duration;

/// Run `controller.tick` for every `(AsgView, InstanceCatalog)` pair
/// concurrently. Per-ASG errors are returned alongside the ASG name
/// rather than aborting the batch, matching §7's "errors never escape
/// a single ASG task" propagation policy.
pub async fn tick_region<M, P, R, W>(
    controller: &ReplacementController<'_, M, P, R, W>,
    asgs: &[(AsgView, InstanceCatalog)],
    sir_wait_deadline: Duration,
) -> Vec<(String, Result<TickOutcome>)>
where
    M: AsgMutator,
    P: PricingOracle,
    R: SpotRequester,
    W: Waiter,
{
    let ticks = asgs.iter().map(|(view, catalog)| async move {
        let outcome = controller.tick(view, catalog, sir_wait_deadline).await;
        (view.name.clone(), outcome)
    });
    futures::future::join_all(ticks).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigResolver, ProcessDefaults, RegionDefaults};
    use crate::testing::FakeCloud;
    use std::collections::HashMap;

    fn empty_view(name: &str) -> AsgView {
        let config = ConfigResolver::resolve(&ProcessDefaults::default(), &RegionDefaults::default(), &HashMap::new(), 0);
        AsgView {
            name: name.to_string(),
            min_size: 0,
            max_size: 0,
            desired_capacity: 0,
            instance_ids: vec![],
            tags: HashMap::new(),
            propagated_tags: HashMap::new(),
            availability_zones: vec![],
            config,
        }
    }

    #[tokio::test]
    async fn runs_every_asg_and_reports_by_name() {
        let fake = FakeCloud::new();
        let controller = ReplacementController::new(&fake, &fake, &fake, &fake);
        let asgs = vec![
            (empty_view("asg-1"), InstanceCatalog::new()),
            (empty_view("asg-2"), InstanceCatalog::new()),
        ];

        let results = tick_region(&controller, &asgs, Duration::from_secs(1)).await;

        assert_eq!(results.len(), 2);
        let names: Vec<&str> = results.iter().map(|(name, _)| name.as_str()).collect();
        assert!(names.contains(&"asg-1"));
        assert!(names.contains(&"asg-2"));
        for (_, outcome) in &results {
            assert!(outcome.is_ok());
        }
    }
}
