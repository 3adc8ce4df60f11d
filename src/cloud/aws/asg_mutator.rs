use super::AwsCloudClient;
use crate::cloud::{AsgDescription, AsgMutator};
use crate::error::{Error, Result};
use crate::types::AvailabilityZone;
use async_trait::async_trait;
use std::collections::HashMap;

#[async_trait]
impl AsgMutator for AwsCloudClient {
    async fn describe_asg(&self, name: &str) -> Result<Option<AsgDescription>> {
        let response = self
            .autoscaling
            .describe_auto_scaling_groups()
            .auto_scaling_group_names(name)
            .send()
            .await?;

        let Some(group) = response.auto_scaling_groups().first() else {
            return Ok(None);
        };

        let tags: HashMap<String, String> = group
            .tags()
            .iter()
            .filter_map(|t| Some((t.key()?.to_string(), t.value()?.to_string())))
            .collect();

        let propagated_tags: HashMap<String, (String, bool)> = group
            .tags()
            .iter()
            .filter_map(|t| {
                Some((
                    t.key()?.to_string(),
                    (t.value().unwrap_or_default().to_string(), t.propagate_at_launch()),
                ))
            })
            .collect();

        Ok(Some(AsgDescription {
            name: group.auto_scaling_group_name().unwrap_or(name).to_string(),
            min_size: group.min_size() as u32,
            max_size: group.max_size() as u32,
            desired_capacity: group.desired_capacity() as u32,
            instance_ids: group
                .instances()
                .iter()
                .filter_map(|i| i.instance_id().map(str::to_string))
                .collect(),
            tags,
            propagated_tags,
            availability_zones: group
                .availability_zones()
                .iter()
                .map(|az| AvailabilityZone::new(az.as_str()))
                .collect(),
        }))
    }

    async fn set_max_size(&self, name: &str, max_size: u32) -> Result<()> {
        self.autoscaling
            .update_auto_scaling_group()
            .auto_scaling_group_name(name)
            .max_size(max_size as i32)
            .send()
            .await?;
        Ok(())
    }

    async fn detach_instance(&self, asg_name: &str, instance_id: &str) -> Result<()> {
        self.autoscaling
            .detach_instances()
            .auto_scaling_group_name(asg_name)
            .instance_ids(instance_id)
            .should_decrement_desired_capacity(false)
            .send()
            .await?;
        Ok(())
    }

    async fn attach_instance(&self, asg_name: &str, instance_id: &str) -> Result<()> {
        self.autoscaling
            .attach_instances()
            .auto_scaling_group_name(asg_name)
            .instance_ids(instance_id)
            .send()
            .await?;
        Ok(())
    }

    async fn terminate_instance(&self, instance_id: &str) -> Result<()> {
        let response = self
            .ec2
            .terminate_instances()
            .instance_ids(instance_id)
            .send()
            .await?;

        if response.terminating_instances().is_empty() {
            return Err(Error::NotFound(format!("instance {instance_id} not found for termination")));
        }
        Ok(())
    }
}
