use super::AwsCloudClient;
use crate::cloud::Waiter;
use crate::error::{Error, Result};
use crate::sir::SpotInstanceRequest;
use crate::types::{SirState, SirStatusCode};
use async_trait::async_trait;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_secs(5);

#[async_trait]
impl Waiter for AwsCloudClient {
    async fn wait_until_fulfilled(&self, sir_id: &str, deadline: Duration) -> Result<SpotInstanceRequest> {
        let started = Instant::now();
        loop {
            let response = self
                .ec2
                .describe_spot_instance_requests()
                .spot_instance_request_ids(sir_id)
                .send()
                .await?;

            if let Some(req) = response.spot_instance_requests().first() {
                let state = match req.state() {
                    Some(aws_sdk_ec2::types::SpotInstanceStateCode::Open) => SirState::Open,
                    Some(aws_sdk_ec2::types::SpotInstanceStateCode::Active) => SirState::Active,
                    Some(aws_sdk_ec2::types::SpotInstanceStateCode::Cancelled) => SirState::Cancelled,
                    Some(aws_sdk_ec2::types::SpotInstanceStateCode::Closed) => SirState::Closed,
                    _ => SirState::Failed,
                };
                let fulfilled = state == SirState::Active
                    && req.status().and_then(|s| s.code()) == Some("fulfilled");
                if fulfilled || state != SirState::Open {
                    return Ok(SpotInstanceRequest {
                        id: sir_id.to_string(),
                        state,
                        status: if fulfilled { SirStatusCode::Fulfilled } else { SirStatusCode::Other },
                        fulfilled_instance_id: req.instance_id().map(str::to_string),
                        tags: req
                            .tags()
                            .iter()
                            .filter_map(|t| Some((t.key()?.to_string(), t.value()?.to_string())))
                            .collect(),
                    });
                }
            }

            if started.elapsed() >= deadline {
                return Err(Error::DeadlineExceeded(sir_id.to_string()));
            }
            tokio::time::sleep(POLL_INTERVAL.min(deadline.saturating_sub(started.elapsed()))).await;
        }
    }
}
