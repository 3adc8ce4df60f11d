//! Narrow capability interfaces over the cloud API surface named in
//! SPEC_FULL.md §6 and §9. Production code drives the real AWS clients
//! in `cloud::aws`; tests inject the in-memory fakes in `testing`.
//!
//! Each trait is auto-implemented for shared references and `Arc`
//! wrappers so a single owned client can be handed to many concurrent
//! per-ASG tasks without an explicit wrapper type at call sites.

use crate::catalog::InstanceCatalog;
use crate::error::Result;
use crate::sir::SpotInstanceRequest;
use crate::types::AvailabilityZone;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

/// Builds the per-region instance catalog: running instances plus the
/// type info / pricing table they reference. Called once per region
/// per tick; the result is treated as immutable afterwards.
#[auto_impl::auto_impl(&, Arc)]
#[async_trait]
pub trait CatalogBuilder: Send + Sync {
    async fn build_catalog(&self, instance_ids: &[String]) -> Result<InstanceCatalog>;
}

/// `price(region, type, az)` oracle, consumed rather than implemented
/// by the core per §1 ("we consume a price(region, type, az) oracle").
#[auto_impl::auto_impl(&, Arc)]
#[async_trait]
pub trait PricingOracle: Send + Sync {
    async fn spot_price(&self, instance_type: &str, az: &AvailabilityZone) -> Result<Option<f64>>;
    async fn on_demand_price(&self, instance_type: &str) -> Result<Option<f64>>;
}

/// Description of one ASG as reported live by the cloud API.
#[derive(Debug, Clone)]
pub struct AsgDescription {
    pub name: String,
    pub min_size: u32,
    pub max_size: u32,
    pub desired_capacity: u32,
    pub instance_ids: Vec<String>,
    pub tags: HashMap<String, String>,
    /// Tags propagated from the ASG, keyed by tag key, valued by
    /// `(value, propagate_at_launch)`.
    pub propagated_tags: HashMap<String, (String, bool)>,
    pub availability_zones: Vec<AvailabilityZone>,
}

/// Mutating operations against an ASG: describe, resize, detach/attach.
#[auto_impl::auto_impl(&, Arc)]
#[async_trait]
pub trait AsgMutator: Send + Sync {
    async fn describe_asg(&self, name: &str) -> Result<Option<AsgDescription>>;

    /// Raise or lower `MaxSize`. Used to make room for the attach step
    /// of the atomic swap when the ASG is already at capacity.
    async fn set_max_size(&self, name: &str, max_size: u32) -> Result<()>;

    /// Detach an instance from the ASG without it being replaced.
    async fn detach_instance(&self, asg_name: &str, instance_id: &str) -> Result<()>;

    /// Attach an already-running instance to the ASG.
    async fn attach_instance(&self, asg_name: &str, instance_id: &str) -> Result<()>;

    async fn terminate_instance(&self, instance_id: &str) -> Result<()>;
}

/// Create, describe, cancel, and tag spot instance requests.
#[auto_impl::auto_impl(&, Arc)]
#[async_trait]
pub trait SpotRequester: Send + Sync {
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

/// Bounded wait for a SIR to reach `active`/`fulfilled`.
#[auto_impl::auto_impl(&, Arc)]
#[async_trait]
pub trait Waiter: Send + Sync {
    async fn wait_until_fulfilled(
        &self,
        sir_id: &str,
        deadline: Duration,
    ) -> Result<SpotInstanceRequest>;
}
