use super::AwsCloudClient;
use crate::catalog::{Instance, InstanceCatalog};
use crate::cloud::CatalogBuilder;
use crate::error::Result;
use crate::types::{AvailabilityZone, InstanceState, Lifecycle};
use async_trait::async_trait;
use std::collections::HashMap;

fn map_state(state: Option<&aws_sdk_ec2::types::InstanceState>) -> InstanceState {
    match state.and_then(|s| s.name()) {
        Some(aws_sdk_ec2::types::InstanceStateName::Pending) => InstanceState::Pending,
        Some(aws_sdk_ec2::types::InstanceStateName::Running) => InstanceState::Running,
        Some(aws_sdk_ec2::types::InstanceStateName::ShuttingDown) => InstanceState::ShuttingDown,
        Some(aws_sdk_ec2::types::InstanceStateName::Stopped) => InstanceState::Stopped,
        Some(aws_sdk_ec2::types::InstanceStateName::Terminated) => InstanceState::Terminated,
        _ => InstanceState::Stopped,
    }
}

fn map_lifecycle(instance: &aws_sdk_ec2::types::Instance) -> Lifecycle {
    match instance.instance_lifecycle() {
        Some(aws_sdk_ec2::types::InstanceLifecycleType::Spot) => Lifecycle::Spot,
        _ => Lifecycle::OnDemand,
    }
}

#[async_trait]
impl CatalogBuilder for AwsCloudClient {
    async fn build_catalog(&self, instance_ids: &[String]) -> Result<InstanceCatalog> {
        let mut catalog = InstanceCatalog::new();
        for info in super::instance_types::known_type_info().into_values() {
            catalog.insert_type_info(info);
        }

        if instance_ids.is_empty() {
            return Ok(catalog);
        }

        let mut paginator = self
            .ec2
            .describe_instances()
            .set_instance_ids(Some(instance_ids.to_vec()))
            .into_paginator()
            .send();

        while let Some(page) = paginator.next().await {
            let page = page?;
            for reservation in page.reservations() {
                for instance in reservation.instances() {
                    let Some(id) = instance.instance_id() else { continue };
                    let Some(instance_type) = instance.instance_type() else { continue };
                    let Some(az) = instance.placement().and_then(|p| p.availability_zone()) else {
                        continue;
                    };
                    let tags: HashMap<String, String> = instance
                        .tags()
                        .iter()
                        .filter_map(|t| Some((t.key()?.to_string(), t.value()?.to_string())))
                        .collect();

                    catalog.insert_instance(Instance {
                        id: id.to_string(),
                        instance_type: instance_type.as_str().to_string(),
                        az: AvailabilityZone::new(az),
                        lifecycle: map_lifecycle(instance),
                        state: map_state(instance.state()),
                        tags,
                        effective_price: 0.0,
                    });
                }
            }
        }

        Ok(catalog)
    }
}
