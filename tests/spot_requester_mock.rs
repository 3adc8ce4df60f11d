//! Call-by-call verification of the "place a SIR" path using a
//! `mockall`-generated `SpotRequester`, rather than the scripted
//! `FakeCloud` in `controller_scenarios.rs` — this asserts the exact
//! arguments the controller passes to `create_sir`, not just its result.

use autospotting::asg::AsgView;
use autospotting::catalog::{Instance, InstanceCatalog, TypeInfo};
use autospotting::cloud::{AsgDescription, SpotRequester};
use autospotting::config::{ConfigResolver, ProcessDefaults, RegionDefaults};
use autospotting::controller::{ReplacementController, TickOutcome};
use autospotting::error::Result;
use autospotting::sir::SpotInstanceRequest;
use autospotting::tags;
use autospotting::testing::FakeCloud;
use autospotting::types::{AvailabilityZone, InstanceState, Lifecycle, NetworkTier, SirState, SirStatusCode, Virtualization};
use std::collections::HashMap;
use std::time::Duration;

mockall::mock! {
    pub SpotRequesterMock {}

    #[async_trait::async_trait]
    impl SpotRequester for SpotRequesterMock {
        async fn describe_sirs_for_asg(&self, asg_name: &str) -> Result<Vec<SpotInstanceRequest>>;

        async fn create_sir(
            &self,
            instance_type: &str,
            az: &AvailabilityZone,
            bid_price: f64,
            spot_product_description: &str,
            tags: &HashMap<String, String>,
        ) -> Result<SpotInstanceRequest>;

        async fn cancel_sir(&self, sir_id: &str) -> Result<()>;
        async fn tag_sir(&self, sir_id: &str, key: &str, value: &str) -> Result<()>;
        async fn tag_instance(&self, instance_id: &str, key: &str, value: &str) -> Result<()>;
    }
}

fn on_demand_instance(id: &str, instance_type: &str, az: &str) -> Instance {
    Instance {
        id: id.to_string(),
        instance_type: instance_type.to_string(),
        az: AvailabilityZone::new(az),
        lifecycle: Lifecycle::OnDemand,
        state: InstanceState::Running,
        tags: HashMap::new(),
        effective_price: 0.096,
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

fn m5_xlarge() -> TypeInfo {
    TypeInfo {
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
    }
}

#[tokio::test]
async fn places_sir_calls_create_sir_exactly_once_with_the_chosen_candidate() {
    let fake = FakeCloud::new();

    let mut catalog = InstanceCatalog::new();
    for i in 1..=4 {
        catalog.insert_instance(on_demand_instance(&format!("i-{i}"), "m5.large", "us-east-1a"));
    }
    catalog.insert_type_info(m5_large());
    catalog.insert_type_info(m5_xlarge());
    fake.set_catalog(catalog.clone());
    fake.set_on_demand_price("m5.large", 0.096);
    fake.set_spot_price("m5.xlarge", &AvailabilityZone::new("us-east-1a"), 0.05);

    let mut tags_map = HashMap::new();
    tags_map.insert(tags::MIN_ON_DEMAND_PERCENTAGE.to_string(), "75".to_string());
    let description = AsgDescription {
        name: "asg-A".to_string(),
        min_size: 0,
        max_size: 4,
        desired_capacity: 4,
        instance_ids: vec!["i-1", "i-2", "i-3", "i-4"].into_iter().map(String::from).collect(),
        tags: tags_map,
        propagated_tags: HashMap::new(),
        availability_zones: vec![AvailabilityZone::new("us-east-1a")],
    };
    let config = ConfigResolver::resolve(&ProcessDefaults::default(), &RegionDefaults::default(), &description.tags, description.max_size);
    let view = AsgView::from_description(description, config);

    let mut requester = SpotRequesterMock::new();
    requester
        .expect_describe_sirs_for_asg()
        .times(1)
        .returning(|_| Ok(vec![]));
    requester
        .expect_create_sir()
        .times(1)
        .returning(|instance_type, az, bid_price, _desc, sir_tags| {
            assert_eq!(instance_type, "m5.xlarge");
            assert_eq!(az.as_str(), "us-east-1a");
            assert!((bid_price - 0.096).abs() < 1e-9);
            Ok(SpotInstanceRequest {
                id: "sir-mock-1".to_string(),
                state: SirState::Open,
                status: SirStatusCode::Other,
                fulfilled_instance_id: None,
                tags: sir_tags.clone(),
            })
        });

    let controller = ReplacementController::new(&fake, &fake, &requester, &fake);
    let outcome = controller.tick(&view, &catalog, Duration::from_secs(5)).await.unwrap();

    match outcome {
        TickOutcome::PlacedSir { sir_id, instance_type, .. } => {
            assert_eq!(sir_id, "sir-mock-1");
            assert_eq!(instance_type, "m5.xlarge");
        }
        other => panic!("expected PlacedSir, got {other:?}"),
    }
}
