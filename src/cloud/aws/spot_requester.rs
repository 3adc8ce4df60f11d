use super::AwsCloudClient;
use crate::cloud::SpotRequester;
use crate::error::Result;
use crate::sir::SpotInstanceRequest;
use crate::tags;
use crate::types::{AvailabilityZone, SirState, SirStatusCode};
use async_trait::async_trait;
use aws_sdk_ec2::types::{ResourceType, SpotInstanceStateCode, Tag, TagSpecification};
use std::collections::HashMap;

fn map_state(state: Option<&SpotInstanceStateCode>) -> SirState {
    match state {
        Some(SpotInstanceStateCode::Open) => SirState::Open,
        Some(SpotInstanceStateCode::Active) => SirState::Active,
        Some(SpotInstanceStateCode::Cancelled) => SirState::Cancelled,
        Some(SpotInstanceStateCode::Closed) => SirState::Closed,
        Some(SpotInstanceStateCode::Failed) => SirState::Failed,
        _ => SirState::Failed,
    }
}

fn map_status(status_code: Option<&str>) -> SirStatusCode {
    match status_code {
        Some("fulfilled") => SirStatusCode::Fulfilled,
        _ => SirStatusCode::Other,
    }
}

fn map_request(req: &aws_sdk_ec2::types::SpotInstanceRequest) -> Option<SpotInstanceRequest> {
    let id = req.spot_instance_request_id()?.to_string();
    let tags: HashMap<String, String> = req
        .tags()
        .iter()
        .filter_map(|t| Some((t.key()?.to_string(), t.value()?.to_string())))
        .collect();
    Some(SpotInstanceRequest {
        id,
        state: map_state(req.state()),
        status: map_status(req.status().and_then(|s| s.code())),
        fulfilled_instance_id: req.instance_id().map(str::to_string),
        tags,
    })
}

#[async_trait]
impl SpotRequester for AwsCloudClient {
    async fn describe_sirs_for_asg(&self, asg_name: &str) -> Result<Vec<SpotInstanceRequest>> {
        let response = self
            .ec2
            .describe_spot_instance_requests()
            .filters(
                aws_sdk_ec2::types::Filter::builder()
                    .name(format!("tag:{}", tags::LAUNCHED_FOR_ASG))
                    .values(asg_name)
                    .build(),
            )
            .send()
            .await?;

        Ok(response
            .spot_instance_requests()
            .iter()
            .filter_map(map_request)
            .collect())
    }

    async fn create_sir(
        &self,
        instance_type: &str,
        az: &AvailabilityZone,
        bid_price: f64,
        spot_product_description: &str,
        tags: &HashMap<String, String>,
    ) -> Result<SpotInstanceRequest> {
        let launch_spec = aws_sdk_ec2::types::RequestSpotLaunchSpecification::builder()
            .instance_type(aws_sdk_ec2::types::InstanceType::from(instance_type))
            .placement(
                aws_sdk_ec2::types::SpotPlacement::builder()
                    .availability_zone(az.as_str())
                    .build(),
            )
            .build();

        let response = self
            .ec2
            .request_spot_instances()
            .spot_price(format!("{bid_price}"))
            .instance_count(1)
            .r#type(aws_sdk_ec2::types::SpotInstanceType::OneTime)
            .launch_specification(launch_spec)
            .tag_specifications(
                TagSpecification::builder()
                    .resource_type(ResourceType::SpotInstancesRequest)
                    .set_tags(Some(
                        tags.iter()
                            .map(|(k, v)| Tag::builder().key(k).value(v).build())
                            .collect(),
                    ))
                    .build(),
            )
            .send()
            .await?;

        let _ = spot_product_description;

        let created = response
            .spot_instance_requests()
            .first()
            .and_then(map_request)
            .ok_or_else(|| crate::error::Error::Other("spot instance request was not created".to_string()))?;

        Ok(created)
    }

    async fn cancel_sir(&self, sir_id: &str) -> Result<()> {
        self.ec2
            .cancel_spot_instance_requests()
            .spot_instance_request_ids(sir_id)
            .send()
            .await?;
        Ok(())
    }

    async fn tag_sir(&self, sir_id: &str, key: &str, value: &str) -> Result<()> {
        self.ec2
            .create_tags()
            .resources(sir_id)
            .tags(Tag::builder().key(key).value(value).build())
            .send()
            .await?;
        Ok(())
    }

    async fn tag_instance(&self, instance_id: &str, key: &str, value: &str) -> Result<()> {
        self.ec2
            .create_tags()
            .resources(instance_id)
            .tags(Tag::builder().key(key).value(value).build())
            .send()
            .await?;
        Ok(())
    }
}
