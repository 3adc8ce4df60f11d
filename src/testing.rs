//! In-memory fakes for the five capability traits, used by the
//! controller and SIR tracker's own test suites and available to
//! downstream crates that want to drive `ReplacementController` against
//! scripted cloud state without network access.

use crate::catalog::InstanceCatalog;
use crate::cloud::{AsgDescription, AsgMutator, CatalogBuilder, PricingOracle, SpotRequester, Waiter};
use crate::error::{Error, Result};
use crate::sir::SpotInstanceRequest;
use crate::types::{AvailabilityZone, SirState, SirStatusCode};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Scripted cloud state shared by every fake trait impl below. Tests
/// build one of these, seed it, then hand `&FakeCloud` to
/// `ReplacementController::new` (the capability traits auto-implement
/// for shared references).
#[derive(Default)]
pub struct FakeCloud {
    catalog: Mutex<InstanceCatalog>,
    asgs: Mutex<HashMap<String, AsgDescription>>,
    sirs: Mutex<HashMap<String, SpotInstanceRequest>>,
    spot_prices: Mutex<HashMap<(String, String), f64>>,
    on_demand_prices: Mutex<HashMap<String, f64>>,
    next_sir_id: Mutex<u64>,
    /// Number of `wait_until_fulfilled` calls that should observe the
    /// pre-seeded SIR as still `open` before the next call sees it
    /// flip to whatever state is in `sirs`. Lets tests exercise the
    /// bounded-wait/"try again next tick" path deterministically.
    pub stall_waits: Mutex<u32>,
}

impl FakeCloud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_catalog(&self, catalog: InstanceCatalog) {
        *self.catalog.lock().unwrap() = catalog;
    }

    pub fn seed_asg(&self, description: AsgDescription) {
        self.asgs.lock().unwrap().insert(description.name.clone(), description);
    }

    pub fn seed_sir(&self, sir: SpotInstanceRequest) {
        self.sirs.lock().unwrap().insert(sir.id.clone(), sir);
    }

    pub fn set_spot_price(&self, instance_type: &str, az: &AvailabilityZone, price: f64) {
        self.spot_prices
            .lock()
            .unwrap()
            .insert((instance_type.to_string(), az.as_str().to_string()), price);
    }

    pub fn set_on_demand_price(&self, instance_type: &str, price: f64) {
        self.on_demand_prices.lock().unwrap().insert(instance_type.to_string(), price);
    }

    pub fn max_size_of(&self, asg_name: &str) -> Option<u32> {
        self.asgs.lock().unwrap().get(asg_name).map(|a| a.max_size)
    }
}

#[async_trait]
impl CatalogBuilder for FakeCloud {
    async fn build_catalog(&self, _instance_ids: &[String]) -> Result<InstanceCatalog> {
        Ok(self.catalog.lock().unwrap().clone())
    }
}

#[async_trait]
impl PricingOracle for FakeCloud {
    async fn spot_price(&self, instance_type: &str, az: &AvailabilityZone) -> Result<Option<f64>> {
        Ok(self
            .spot_prices
            .lock()
            .unwrap()
            .get(&(instance_type.to_string(), az.as_str().to_string()))
            .copied())
    }

    async fn on_demand_price(&self, instance_type: &str) -> Result<Option<f64>> {
        Ok(self.on_demand_prices.lock().unwrap().get(instance_type).copied())
    }
}

#[async_trait]
impl AsgMutator for FakeCloud {
    async fn describe_asg(&self, name: &str) -> Result<Option<AsgDescription>> {
        Ok(self.asgs.lock().unwrap().get(name).cloned())
    }

    async fn set_max_size(&self, name: &str, max_size: u32) -> Result<()> {
        let mut asgs = self.asgs.lock().unwrap();
        let asg = asgs.get_mut(name).ok_or_else(|| Error::NotFound(name.to_string()))?;
        asg.max_size = max_size;
        Ok(())
    }

    async fn detach_instance(&self, asg_name: &str, instance_id: &str) -> Result<()> {
        let mut asgs = self.asgs.lock().unwrap();
        let asg = asgs.get_mut(asg_name).ok_or_else(|| Error::NotFound(asg_name.to_string()))?;
        asg.instance_ids.retain(|id| id != instance_id);
        Ok(())
    }

    async fn attach_instance(&self, asg_name: &str, instance_id: &str) -> Result<()> {
        let mut asgs = self.asgs.lock().unwrap();
        let asg = asgs.get_mut(asg_name).ok_or_else(|| Error::NotFound(asg_name.to_string()))?;
        if !asg.instance_ids.iter().any(|id| id == instance_id) {
            asg.instance_ids.push(instance_id.to_string());
        }
        Ok(())
    }

    async fn terminate_instance(&self, instance_id: &str) -> Result<()> {
        let mut catalog = self.catalog.lock().unwrap();
        if let Some(instance) = catalog.get(instance_id).cloned() {
            let mut terminated = instance;
            terminated.state = crate::types::InstanceState::Terminated;
            catalog.insert_instance(terminated);
        }
        Ok(())
    }
}

#[async_trait]
impl SpotRequester for FakeCloud {
    async fn describe_sirs_for_asg(&self, asg_name: &str) -> Result<Vec<SpotInstanceRequest>> {
        Ok(self
            .sirs
            .lock()
            .unwrap()
            .values()
            .filter(|sir| crate::tags::launched_for(&sir.tags) == Some(asg_name))
            .cloned()
            .collect())
    }

    async fn create_sir(
        &self,
        instance_type: &str,
        az: &AvailabilityZone,
        bid_price: f64,
        _spot_product_description: &str,
        tags: &HashMap<String, String>,
    ) -> Result<SpotInstanceRequest> {
        let _ = (instance_type, az, bid_price);
        let mut next_id = self.next_sir_id.lock().unwrap();
        *next_id += 1;
        let sir = SpotInstanceRequest {
            id: format!("sir-fake-{next_id}"),
            state: SirState::Open,
            status: SirStatusCode::Other,
            fulfilled_instance_id: None,
            tags: tags.clone(),
        };
        self.sirs.lock().unwrap().insert(sir.id.clone(), sir.clone());
        Ok(sir)
    }

    async fn cancel_sir(&self, sir_id: &str) -> Result<()> {
        if let Some(sir) = self.sirs.lock().unwrap().get_mut(sir_id) {
            sir.state = SirState::Cancelled;
        }
        Ok(())
    }

    async fn tag_sir(&self, sir_id: &str, key: &str, value: &str) -> Result<()> {
        if let Some(sir) = self.sirs.lock().unwrap().get_mut(sir_id) {
            sir.tags.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }

    async fn tag_instance(&self, instance_id: &str, key: &str, value: &str) -> Result<()> {
        let mut catalog = self.catalog.lock().unwrap();
        if let Some(mut instance) = catalog.get(instance_id).cloned() {
            instance.tags.insert(key.to_string(), value.to_string());
            catalog.insert_instance(instance);
        }
        Ok(())
    }
}

#[async_trait]
impl Waiter for FakeCloud {
    async fn wait_until_fulfilled(&self, sir_id: &str, _deadline: Duration) -> Result<SpotInstanceRequest> {
        let mut stalls = self.stall_waits.lock().unwrap();
        if *stalls > 0 {
            *stalls -= 1;
            return Err(Error::DeadlineExceeded(sir_id.to_string()));
        }
        self.sirs
            .lock()
            .unwrap()
            .get(sir_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(sir_id.to_string()))
    }
}
