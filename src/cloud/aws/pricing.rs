use super::AwsCloudClient;
use crate::cloud::PricingOracle;
use crate::error::Result;
use crate::types::AvailabilityZone;
use async_trait::async_trait;

#[async_trait]
impl PricingOracle for AwsCloudClient {
    async fn spot_price(&self, instance_type: &str, az: &AvailabilityZone) -> Result<Option<f64>> {
        let response = self
            .ec2
            .describe_spot_price_history()
            .instance_types(aws_sdk_ec2::types::InstanceType::from(instance_type))
            .availability_zone(az.as_str())
            .product_descriptions("Linux/UNIX")
            .max_results(1)
            .send()
            .await?;

        let price = response
            .spot_price_history()
            .first()
            .and_then(|entry| entry.spot_price())
            .and_then(|p| p.parse::<f64>().ok());

        Ok(price)
    }

    async fn on_demand_price(&self, instance_type: &str) -> Result<Option<f64>> {
        Ok(super::instance_types::known_type_info()
            .get(instance_type)
            .map(|info| info.on_demand_price))
    }
}
