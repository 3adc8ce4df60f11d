//! End-to-end scenarios for `ReplacementController` driven against
//! `FakeCloud`, one per example walked through in SPEC_FULL.md §8.

use autospotting::asg::AsgView;
use autospotting::catalog::{Instance, InstanceCatalog, TypeInfo};
use autospotting::cloud::{AsgDescription, SpotRequester};
use autospotting::config::{ConfigResolver, ProcessDefaults, RegionDefaults};
use autospotting::controller::{NoOpReason, ReplacementController, TickOutcome};
use autospotting::sir::SpotInstanceRequest;
use autospotting::tags;
use autospotting::testing::FakeCloud;
use autospotting::types::{AvailabilityZone, InstanceState, Lifecycle, NetworkTier, SirState, SirStatusCode, Virtualization};
use std::collections::HashMap;
use std::time::Duration;

fn on_demand_instance(id: &str, instance_type: &str, az: &str, price: f64) -> Instance {
    Instance {
        id: id.to_string(),
        instance_type: instance_type.to_string(),
        az: AvailabilityZone::new(az),
        lifecycle: Lifecycle::OnDemand,
        state: InstanceState::Running,
        tags: HashMap::new(),
        effective_price: price,
    }
}

fn m5_large() -> TypeInfo {
    TypeInfo {
        instance_type: "m5.large".to_string(),
        vcpu: 2.0,
        memory_gib: 8.0,
        instance_storage_gib: 0.0,
        gpu_count: 0,
        virtualization: Virtualization::Hvm,
        ebs_only: true,
        network_tier: NetworkTier::Moderate,
        on_demand_price: 0.096,
        spot_price_by_az: HashMap::new(),
    }
}

fn m5_xlarge_spot(az: &str, price: f64) -> TypeInfo {
    let mut t = TypeInfo {
        instance_type: "m5.xlarge".to_string(),
        vcpu: 4.0,
        memory_gib: 16.0,
        instance_storage_gib: 0.0,
        gpu_count: 0,
        virtualization: Virtualization::Hvm,
        ebs_only: true,
        network_tier: NetworkTier::High,
        on_demand_price: 0.192,
        spot_price_by_az: HashMap::new(),
    };
    t.spot_price_by_az.insert(AvailabilityZone::new(az), price);
    t
}

fn base_asg_description(name: &str, ids: &[&str], max: u32, desired: u32) -> AsgDescription {
    let mut tags_map = HashMap::new();
    tags_map.insert(tags::MIN_ON_DEMAND_PERCENTAGE.to_string(), "75".to_string());
    AsgDescription {
        name: name.to_string(),
        min_size: 0,
        max_size: max,
        desired_capacity: desired,
        instance_ids: ids.iter().map(|s| s.to_string()).collect(),
        tags: tags_map,
        propagated_tags: HashMap::new(),
        availability_zones: vec![AvailabilityZone::new("us-east-1a")],
    }
}

fn resolve_config(description: &AsgDescription) -> autospotting::config::EffectiveConfig {
    ConfigResolver::resolve(
        &ProcessDefaults::default(),
        &RegionDefaults::default(),
        &description.tags,
        description.max_size,
    )
}

/// Four running on-demand `m5.large`s with a 75% floor need exactly one
/// replacement; the controller prices and places a SIR for it.
#[tokio::test]
async fn places_a_sir_when_floor_allows_replacement() {
    let fake = FakeCloud::new();

    let mut catalog = InstanceCatalog::new();
    for i in 1..=4 {
        catalog.insert_instance(on_demand_instance(&format!("i-{i}"), "m5.large", "us-east-1a", 0.096));
    }
    catalog.insert_type_info(m5_large());
    catalog.insert_type_info(m5_xlarge_spot("us-east-1a", 0.05));
    fake.set_catalog(catalog.clone());
    fake.set_on_demand_price("m5.large", 0.096);
    fake.set_spot_price("m5.xlarge", &AvailabilityZone::new("us-east-1a"), 0.05);

    let description = base_asg_description("asg-A", &["i-1", "i-2", "i-3", "i-4"], 4, 4);
    let config = resolve_config(&description);
    fake.seed_asg(description.clone());
    let view = AsgView::from_description(description, config);

    let controller = ReplacementController::new(&fake, &fake, &fake, &fake);
    let outcome = controller.tick(&view, &catalog, Duration::from_secs(5)).await.unwrap();

    match outcome {
        TickOutcome::PlacedSir { instance_type, bid_price, .. } => {
            assert_eq!(instance_type, "m5.xlarge");
            assert_eq!(bid_price, 0.096); // normal policy bids on-demand price
        }
        other => panic!("expected PlacedSir, got {other:?}"),
    }
}

/// A 100% on-demand floor must block any replacement.
#[tokio::test]
async fn hundred_percent_floor_is_a_no_op() {
    let fake = FakeCloud::new();
    let mut catalog = InstanceCatalog::new();
    for i in 1..=4 {
        catalog.insert_instance(on_demand_instance(&format!("i-{i}"), "m5.large", "us-east-1a", 0.096));
    }
    catalog.insert_type_info(m5_large());
    fake.set_catalog(catalog.clone());

    let mut description = base_asg_description("asg-B", &["i-1", "i-2", "i-3", "i-4"], 4, 4);
    description.tags.insert(tags::MIN_ON_DEMAND_PERCENTAGE.to_string(), "100".to_string());
    let config = resolve_config(&description);
    fake.seed_asg(description.clone());
    let view = AsgView::from_description(description, config);

    let controller = ReplacementController::new(&fake, &fake, &fake, &fake);
    let outcome = controller.tick(&view, &catalog, Duration::from_secs(5)).await.unwrap();
    assert_eq!(outcome, TickOutcome::NoOp(NoOpReason::NoReplacementNeeded));
}

/// A SIR fulfilled in an earlier tick, with its instance now visible in
/// the catalog but not yet a member of the ASG, is swapped in and the
/// SIR is finalized in the same tick it is attached.
#[tokio::test]
async fn resumes_and_completes_a_fulfilled_sir_in_one_tick() {
    let fake = FakeCloud::new();

    let mut catalog = InstanceCatalog::new();
    catalog.insert_instance(on_demand_instance("i-1", "m5.large", "us-east-1a", 0.096));
    catalog.insert_instance({
        let mut spot = on_demand_instance("i-spot", "m5.xlarge", "us-east-1a", 0.05);
        spot.lifecycle = Lifecycle::Spot;
        spot
    });
    catalog.insert_type_info(m5_large());
    catalog.insert_type_info(m5_xlarge_spot("us-east-1a", 0.05));
    fake.set_catalog(catalog.clone());

    let description = base_asg_description("asg-C", &["i-1"], 1, 1);
    let config = resolve_config(&description);
    fake.seed_asg(description.clone());
    let view = AsgView::from_description(description, config);

    let mut sir_tags = HashMap::new();
    sir_tags.insert(tags::LAUNCHED_FOR_ASG.to_string(), "asg-C".to_string());
    fake.seed_sir(SpotInstanceRequest {
        id: "sir-1".to_string(),
        state: SirState::Active,
        status: SirStatusCode::Fulfilled,
        fulfilled_instance_id: Some("i-spot".to_string()),
        tags: sir_tags,
    });

    let controller = ReplacementController::new(&fake, &fake, &fake, &fake);
    let outcome = controller.tick(&view, &catalog, Duration::from_secs(5)).await.unwrap();

    assert_eq!(
        outcome,
        TickOutcome::AttachedSpotInstance { instance_id: "i-spot".to_string() }
    );
    assert_eq!(fake.max_size_of("asg-C"), Some(1));

    let sirs = fake.describe_sirs_for_asg("asg-C").await.unwrap();
    let sir = sirs.iter().find(|s| s.id == "sir-1").unwrap();
    assert!(sir.is_complete());
}
