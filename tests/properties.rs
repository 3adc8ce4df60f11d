//! Property-based tests for the quantified invariants and round-trip
//! properties named in SPEC_FULL.md §8: config resolution purity, the
//! on-demand floor bound, and the bid-never-exceeds-on-demand rule.

use autospotting::compat::CompatibilityFilter;
use autospotting::config::{floor_percent, ConfigResolver, EffectiveConfig, ProcessDefaults, RegionDefaults};
use autospotting::tags;
use autospotting::types::BiddingPolicy;
use proptest::prelude::*;
use std::collections::{HashMap, HashSet};

fn aggressive_config(buffer_pct: f64) -> EffectiveConfig {
    EffectiveConfig {
        min_on_demand_count: 0,
        min_on_demand_percent: 0.0,
        bidding_policy: BiddingPolicy::Aggressive,
        spot_price_buffer_pct: buffer_pct,
        allowed_types: vec![],
        disallowed_types: vec![],
        on_demand_price_multiplier: 1.0,
        spot_product_description: "Linux/UNIX".to_string(),
    }
}

proptest! {
    /// §8: "for every config resolution: given inputs, output is a pure
    /// function (idempotent, referentially transparent)".
    #[test]
    fn config_resolution_is_referentially_transparent(max_size in 0u32..64, percent in 0.0f64..100.0) {
        let process = ProcessDefaults::default();
        let region = RegionDefaults::default();
        let mut asg_tags = HashMap::new();
        asg_tags.insert(tags::MIN_ON_DEMAND_PERCENTAGE.to_string(), percent.to_string());

        let a = ConfigResolver::resolve(&process, &region, &asg_tags, max_size);
        let b = ConfigResolver::resolve(&process, &region, &asg_tags, max_size);
        prop_assert_eq!(a, b);
    }

    /// The percent-to-count floor conversion never asks for more
    /// on-demand instances than are actually running.
    #[test]
    fn percent_floor_never_exceeds_running_total(running_total in 0u32..512, percent in 0.0f64..100.0) {
        prop_assert!(floor_percent(percent, running_total) <= running_total);
    }

    /// Boundary from §8: `minOnDemandPercent=100` pins the floor to the
    /// full running total, which is what blocks all replacement.
    #[test]
    fn hundred_percent_floor_equals_running_total(running_total in 0u32..512) {
        prop_assert_eq!(floor_percent(100.0, running_total), running_total);
    }

    /// §8: "for every chosen spot candidate... spotPrice(C, chosenAZ) ≤
    /// onDemandPrice(P)" — enforced at the bid step regardless of how
    /// high the configured buffer is.
    #[test]
    fn aggressive_bid_never_exceeds_on_demand_price(
        on_demand in 0.001f64..10.0,
        spot in 0.0f64..10.0,
        buffer_pct in 0.0f64..500.0,
    ) {
        let config = aggressive_config(buffer_pct);
        let bid = CompatibilityFilter::price_to_bid(on_demand, spot, &config);
        prop_assert!(bid <= on_demand + 1e-9);
    }

    /// Normal bidding policy always bids exactly on-demand price,
    /// regardless of the spot price or buffer.
    #[test]
    fn normal_bid_is_always_on_demand_price(
        on_demand in 0.0f64..10.0,
        spot in 0.0f64..10.0,
        buffer_pct in 0.0f64..500.0,
    ) {
        let mut config = aggressive_config(buffer_pct);
        config.bidding_policy = BiddingPolicy::Normal;
        let bid = CompatibilityFilter::price_to_bid(on_demand, spot, &config);
        prop_assert_eq!(bid, on_demand);
    }

    /// Round-trip: the set of non-empty tokens in an
    /// `allowed_instance_types` tag survives being split and resolved.
    #[test]
    fn allowed_instance_types_tag_round_trips_through_resolve(
        tokens in proptest::collection::hash_set("[a-z][a-z0-9]{1,5}\\.[a-z][a-z0-9]{1,5}", 1..5)
    ) {
        let process = ProcessDefaults::default();
        let region = RegionDefaults::default();
        let joined = tokens.iter().cloned().collect::<Vec<_>>().join(",");
        let mut asg_tags = HashMap::new();
        asg_tags.insert(tags::ALLOWED_INSTANCE_TYPES.to_string(), joined);

        let cfg = ConfigResolver::resolve(&process, &region, &asg_tags, 10);
        let resolved: HashSet<String> = cfg.allowed_types.into_iter().collect();
        prop_assert_eq!(resolved, tokens);
    }
}
