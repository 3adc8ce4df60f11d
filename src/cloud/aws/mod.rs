//! Real AWS implementation of the capability traits in `cloud::traits`,
//! built once per process and shared across concurrent per-ASG ticks via
//! `&AwsCloudClient` / `Arc<AwsCloudClient>` (both auto-implement the
//! traits through `#[auto_impl::auto_impl(&, Arc)]`).

mod asg_mutator;
mod catalog;
mod instance_types;
mod pricing;
mod spot_requester;
mod waiter;

use crate::error::Result;

pub struct AwsCloudClient {
    ec2: aws_sdk_ec2::Client,
    autoscaling: aws_sdk_autoscaling::Client,
}

impl AwsCloudClient {
    /// Load credentials and region from the environment/instance profile
    /// and build both typed clients once.
    pub async fn new() -> Result<Self> {
        let config = aws_config::load_from_env().await;
        Ok(Self {
            ec2: aws_sdk_ec2::Client::new(&config),
            autoscaling: aws_sdk_autoscaling::Client::new(&config),
        })
    }

    /// Build from already-configured clients, bypassing environment
    /// credential/region discovery. Used by tests that exercise request
    /// building against a `StaticReplayClient` instead of real AWS.
    pub fn from_clients(ec2: aws_sdk_ec2::Client, autoscaling: aws_sdk_autoscaling::Client) -> Self {
        Self { ec2, autoscaling }
    }
}
