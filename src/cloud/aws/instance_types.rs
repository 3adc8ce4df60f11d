//! Static capability table for the instance families this controller
//! knows how to compare. `DescribeInstanceTypes` does return most of
//! these fields live, but on-demand list price does not come from any
//! EC2 API call; rather than add the separate pricing service client
//! this table mirrors the "known families" estimate table in the
//! original instance-mapping code, extended with the capability axes
//! the Compatibility Filter needs.

use crate::catalog::TypeInfo;
use crate::types::{NetworkTier, Virtualization};
use std::collections::HashMap;

struct StaticSpec {
    vcpu: f64,
    memory_gib: f64,
    instance_storage_gib: f64,
    gpu_count: u32,
    network_tier: NetworkTier,
    on_demand_price: f64,
}

fn table() -> &'static [(&'static str, StaticSpec)] {
    use NetworkTier::*;
    const fn spec(
        vcpu: f64,
        memory_gib: f64,
        instance_storage_gib: f64,
        gpu_count: u32,
        network_tier: NetworkTier,
        on_demand_price: f64,
    ) -> StaticSpec {
        StaticSpec { vcpu, memory_gib, instance_storage_gib, gpu_count, network_tier, on_demand_price }
    }
    &[
        ("t3.micro", spec(2.0, 1.0, 0.0, 0, Low, 0.0104)),
        ("t3.small", spec(2.0, 2.0, 0.0, 0, Low, 0.0208)),
        ("t3.medium", spec(2.0, 4.0, 0.0, 0, Low, 0.0416)),
        ("t3.large", spec(2.0, 8.0, 0.0, 0, Moderate, 0.0832)),
        ("m5.large", spec(2.0, 8.0, 0.0, 0, Moderate, 0.096)),
        ("m5.xlarge", spec(4.0, 16.0, 0.0, 0, High, 0.192)),
        ("m5.2xlarge", spec(8.0, 32.0, 0.0, 0, High, 0.384)),
        ("m5.4xlarge", spec(16.0, 64.0, 0.0, 0, High, 0.768)),
        ("m6i.large", spec(2.0, 8.0, 0.0, 0, Moderate, 0.096)),
        ("m6i.xlarge", spec(4.0, 16.0, 0.0, 0, High, 0.192)),
        ("m6i.2xlarge", spec(8.0, 32.0, 0.0, 0, High, 0.384)),
        ("m6i.4xlarge", spec(16.0, 64.0, 0.0, 0, High, 0.768)),
        ("m6i.8xlarge", spec(32.0, 128.0, 0.0, 0, TenGigabit, 1.536)),
        ("c5.large", spec(2.0, 4.0, 0.0, 0, Moderate, 0.085)),
        ("c5.xlarge", spec(4.0, 8.0, 0.0, 0, High, 0.17)),
        ("c5.2xlarge", spec(8.0, 16.0, 0.0, 0, High, 0.34)),
        ("c6i.12xlarge", spec(48.0, 96.0, 0.0, 0, TwentyFiveGigabit, 2.04)),
        ("r5.large", spec(2.0, 16.0, 0.0, 0, Moderate, 0.126)),
        ("r5.xlarge", spec(4.0, 32.0, 0.0, 0, High, 0.252)),
        ("r6i.2xlarge", spec(8.0, 64.0, 0.0, 0, High, 0.504)),
        ("i3.large", spec(2.0, 15.25, 475.0, 0, Moderate, 0.156)),
        ("i3.xlarge", spec(4.0, 30.5, 950.0, 0, High, 0.312)),
        ("g4dn.xlarge", spec(4.0, 16.0, 125.0, 1, Moderate, 0.526)),
        ("p3.8xlarge", spec(32.0, 244.0, 0.0, 4, TenGigabit, 12.24)),
        ("p4d.24xlarge", spec(96.0, 1152.0, 8000.0, 8, TwentyFiveGigabit, 32.77)),
    ]
}

/// Build a `TypeInfo` (minus spot pricing, filled in separately) for
/// every family this controller recognizes. Unknown types are simply
/// absent from the resulting catalog and so never show up as candidates.
pub fn known_type_info() -> HashMap<String, TypeInfo> {
    table()
        .iter()
        .map(|(name, s)| {
            (
                name.to_string(),
                TypeInfo {
                    instance_type: name.to_string(),
                    vcpu: s.vcpu,
                    memory_gib: s.memory_gib,
                    instance_storage_gib: s.instance_storage_gib,
                    gpu_count: s.gpu_count,
                    virtualization: Virtualization::Hvm,
                    ebs_only: s.instance_storage_gib == 0.0,
                    network_tier: s.network_tier,
                    on_demand_price: s.on_demand_price,
                    spot_price_by_az: HashMap::new(),
                },
            )
        })
        .collect()
}
