//! Verifies the controller actually emits the tracing events the rest
//! of the design relies on for operator-facing logging, using a custom
//! `tracing_subscriber::Layer` to capture events rather than asserting
//! on stdout text.

use autospotting::asg::AsgView;
use autospotting::catalog::{Instance, InstanceCatalog, TypeInfo};
use autospotting::cloud::AsgDescription;
use autospotting::config::{ConfigResolver, ProcessDefaults, RegionDefaults};
use autospotting::controller::ReplacementController;
use autospotting::tags;
use autospotting::testing::FakeCloud;
use autospotting::types::{AvailabilityZone, InstanceState, Lifecycle, NetworkTier, Virtualization};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;

struct EventCapture {
    messages: Arc<Mutex<Vec<String>>>,
}

impl<S: Subscriber> Layer<S> for EventCapture {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        struct MessageVisitor(String);
        impl tracing::field::Visit for MessageVisitor {
            fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
                if field.name() == "message" {
                    self.0 = format!("{value:?}");
                }
            }
        }
        let mut visitor = MessageVisitor(String::new());
        event.record(&mut visitor);
        self.messages.lock().unwrap().push(visitor.0);
    }
}

fn on_demand_instance(id: &str) -> Instance {
    Instance {
        id: id.to_string(),
        instance_type: "m5.large".to_string(),
        az: AvailabilityZone::new("us-east-1a"),
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

#[tokio::test]
async fn no_candidate_path_logs_at_info() {
    let captured = Arc::new(Mutex::new(Vec::new()));
    let layer = EventCapture { messages: captured.clone() };
    let _guard = tracing_subscriber::registry().with(layer).set_default();

    let fake = FakeCloud::new();
    let mut catalog = InstanceCatalog::new();
    catalog.insert_instance(on_demand_instance("i-1"));
    catalog.insert_type_info(m5_large());
    fake.set_catalog(catalog.clone());
    // No compatible spot type is ever registered, so pricing is never
    // asked and the filter must fall through to `NoCompatibleCandidate`.

    let mut tags_map = HashMap::new();
    tags_map.insert(tags::MIN_ON_DEMAND_PERCENTAGE.to_string(), "0".to_string());
    let description = AsgDescription {
        name: "asg-log".to_string(),
        min_size: 0,
        max_size: 1,
        desired_capacity: 1,
        instance_ids: vec!["i-1".to_string()],
        tags: tags_map,
        propagated_tags: HashMap::new(),
        availability_zones: vec![AvailabilityZone::new("us-east-1a")],
    };
    let config = ConfigResolver::resolve(&ProcessDefaults::default(), &RegionDefaults::default(), &description.tags, description.max_size);
    let view = AsgView::from_description(description, config);

    let controller = ReplacementController::new(&fake, &fake, &fake, &fake);
    let _ = controller.tick(&view, &catalog, Duration::from_secs(5)).await.unwrap();

    let messages = captured.lock().unwrap();
    assert!(
        messages.iter().any(|m| m.contains("no compatible spot candidate")),
        "expected an info-level log for the no-candidate path, got: {messages:?}"
    );
}
