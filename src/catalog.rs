//! Instance Catalog: a per-region snapshot of instances and the type
//! metadata / pricing each one is decorated with. Built once per region
//! per tick and treated as immutable afterwards.

use crate::types::{AvailabilityZone, InstanceState, Lifecycle, NetworkTier, Virtualization};
use std::collections::HashMap;

/// Static capability and pricing metadata for one instance type.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeInfo {
    pub instance_type: String,
    pub vcpu: f64,
    pub memory_gib: f64,
    pub instance_storage_gib: f64,
    pub gpu_count: u32,
    pub virtualization: Virtualization,
    pub ebs_only: bool,
    pub network_tier: NetworkTier,
    pub on_demand_price: f64,
    /// Spot price per AZ; absence means the type is not offered as spot
    /// in that AZ (or we have no pricing data for it).
    pub spot_price_by_az: HashMap<AvailabilityZone, f64>,
}

impl TypeInfo {
    pub fn has_instance_storage(&self) -> bool {
        self.instance_storage_gib > 0.0
    }

    pub fn spot_price(&self, az: &AvailabilityZone) -> Option<f64> {
        self.spot_price_by_az.get(az).copied()
    }
}

/// One instance observed in the region, decorated with its type info.
#[derive(Debug, Clone)]
pub struct Instance {
    pub id: String,
    pub instance_type: String,
    pub az: AvailabilityZone,
    pub lifecycle: Lifecycle,
    pub state: InstanceState,
    pub tags: HashMap<String, String>,
    /// The price actually being paid: on-demand list price, or the
    /// bid/clearing price for a spot instance.
    pub effective_price: f64,
}

impl Instance {
    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    pub fn is_on_demand(&self) -> bool {
        self.lifecycle == Lifecycle::OnDemand
    }

    pub fn is_spot(&self) -> bool {
        self.lifecycle == Lifecycle::Spot
    }
}

/// `instanceId -> Instance` snapshot for a region, plus the type info
/// table every `Instance.instance_type` can be looked up in.
#[derive(Debug, Clone, Default)]
pub struct InstanceCatalog {
    instances: HashMap<String, Instance>,
    type_info: HashMap<String, TypeInfo>,
}

impl InstanceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_instance(&mut self, instance: Instance) {
        self.instances.insert(instance.id.clone(), instance);
    }

    pub fn insert_type_info(&mut self, info: TypeInfo) {
        self.type_info.insert(info.instance_type.clone(), info);
    }

    pub fn get(&self, instance_id: &str) -> Option<&Instance> {
        self.instances.get(instance_id)
    }

    pub fn type_info(&self, instance_type: &str) -> Option<&TypeInfo> {
        self.type_info.get(instance_type)
    }

    pub fn all_type_info(&self) -> impl Iterator<Item = &TypeInfo> {
        self.type_info.values()
    }

    /// Count running instances matching `lifecycle`, optionally
    /// restricted to a single AZ. Pass `None` to count across all AZs.
    pub fn already_running_count(
        &self,
        instance_ids: &[String],
        lifecycle: Lifecycle,
        az: Option<&AvailabilityZone>,
    ) -> usize {
        instance_ids
            .iter()
            .filter_map(|id| self.instances.get(id))
            .filter(|i| i.is_running() && i.lifecycle == lifecycle)
            .filter(|i| match az {
                Some(az) => &i.az == az,
                None => true,
            })
            .count()
    }

    /// Count all running instances among `instance_ids`, any lifecycle.
    pub fn total_running_count(&self, instance_ids: &[String]) -> usize {
        instance_ids
            .iter()
            .filter_map(|id| self.instances.get(id))
            .filter(|i| i.is_running())
            .count()
    }
}
