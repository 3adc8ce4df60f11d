//! ASG View: one ASG's membership, tags, size bounds, and the subset of
//! the region's Instance Catalog it owns. Rebuilt each tick from live
//! API state plus the resolved `EffectiveConfig`.

use crate::catalog::InstanceCatalog;
use crate::cloud::AsgDescription;
use crate::config::EffectiveConfig;
use crate::types::{AvailabilityZone, Lifecycle};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct AsgView {
    pub name: String,
    pub min_size: u32,
    pub max_size: u32,
    pub desired_capacity: u32,
    pub instance_ids: Vec<String>,
    pub tags: HashMap<String, String>,
    pub propagated_tags: HashMap<String, (String, bool)>,
    pub availability_zones: Vec<AvailabilityZone>,
    pub config: EffectiveConfig,
}

impl AsgView {
    pub fn from_description(description: AsgDescription, config: EffectiveConfig) -> Self {
        Self {
            name: description.name,
            min_size: description.min_size,
            max_size: description.max_size,
            desired_capacity: description.desired_capacity,
            instance_ids: description.instance_ids,
            tags: description.tags,
            propagated_tags: description.propagated_tags,
            availability_zones: description.availability_zones,
            config,
        }
    }

    /// Current size: how many of the ASG's reported instance ids are
    /// actually present in the catalog (still-being-born instances,
    /// reported in membership but not yet visible, are ignored).
    pub fn current_size(&self, catalog: &InstanceCatalog) -> usize {
        self.instance_ids
            .iter()
            .filter(|id| catalog.get(id).is_some())
            .count()
    }

    pub fn running_on_demand_count(&self, catalog: &InstanceCatalog) -> usize {
        catalog.already_running_count(&self.instance_ids, Lifecycle::OnDemand, None)
    }

    pub fn running_total_count(&self, catalog: &InstanceCatalog) -> usize {
        catalog.total_running_count(&self.instance_ids)
    }

    /// Any running on-demand instance owned by this ASG, preferring
    /// one in `preferred_az` when given (used by the attach case to
    /// favor a victim already co-located with the spot instance).
    pub fn pick_on_demand_victim<'a>(
        &self,
        catalog: &'a InstanceCatalog,
        preferred_az: Option<&AvailabilityZone>,
    ) -> Option<&'a crate::catalog::Instance> {
        let mut running: Vec<&crate::catalog::Instance> = self
            .instance_ids
            .iter()
            .filter_map(|id| catalog.get(id))
            .filter(|i| i.is_on_demand() && i.is_running())
            .collect();

        if let Some(az) = preferred_az {
            if let Some(pos) = running.iter().position(|i| &i.az == az) {
                return Some(running.remove(pos));
            }
        }
        running.into_iter().next()
    }

    /// The on-demand floor: `max(minOnDemandCount, floor(minOnDemandPercent * currentSize / 100))`.
    pub fn on_demand_floor(&self, catalog: &InstanceCatalog) -> u32 {
        let current = self.current_size(catalog) as u32;
        let from_percent = crate::config::floor_percent(self.config.min_on_demand_percent, current);
        self.config.min_on_demand_count.max(from_percent)
    }

    /// `needReplaceOnDemandInstances`: true only when there is a running
    /// on-demand instance to give up, removing it still satisfies the
    /// floor, and the ASG is not below its desired capacity (the
    /// "never shrink" guard resolved in SPEC_FULL.md §9: equality at
    /// `current_size == desired_capacity` passes).
    pub fn needs_replacement(&self, catalog: &InstanceCatalog) -> bool {
        let running_on_demand = self.running_on_demand_count(catalog) as u32;
        if running_on_demand == 0 {
            return false;
        }
        let floor = self.on_demand_floor(catalog);
        if running_on_demand.saturating_sub(1) < floor {
            return false;
        }
        let current = self.current_size(catalog) as u32;
        current >= self.desired_capacity
    }

    /// Tags propagated onto a newly created SIR: every ASG tag with
    /// `PropagateAtLaunch=true` whose key is not reserved, plus the
    /// mandatory `LaunchConfigurationName` tag.
    pub fn propagated_sir_tags(&self, launch_configuration_name: &str) -> HashMap<String, String> {
        let mut out: HashMap<String, String> = self
            .propagated_tags
            .iter()
            .filter(|(key, (_, propagate))| *propagate && !crate::tags::is_reserved_key(key))
            .map(|(key, (value, _))| (key.clone(), value.clone()))
            .collect();
        out.insert(
            crate::tags::LAUNCH_CONFIGURATION_NAME.to_string(),
            launch_configuration_name.to_string(),
        );
        out
    }
}
