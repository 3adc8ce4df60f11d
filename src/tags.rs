//! Well-known tag keys the controller reads and writes.
//!
//! Everything the controller needs to know about an ASG or a spot
//! instance request is reconstructed from these tags plus live API
//! state; the controller keeps no state of its own between ticks.

use std::collections::HashMap;

pub const MIN_ON_DEMAND_NUMBER: &str = "autospotting_min_on_demand_number";
pub const MIN_ON_DEMAND_PERCENTAGE: &str = "autospotting_min_on_demand_percentage";
pub const ALLOWED_INSTANCE_TYPES: &str = "autospotting_allowed_instance_types";
pub const DISALLOWED_INSTANCE_TYPES: &str = "autospotting_disallowed_instance_types";
pub const BIDDING_POLICY: &str = "autospotting_bidding_policy";
pub const SPOT_PRICE_BUFFER_PERCENTAGE: &str = "autospotting_spot_price_buffer_percentage";
pub const ON_DEMAND_PRICE_MULTIPLIER: &str = "autospotting_on_demand_price_multiplier";

/// Opt-in marker; an ASG must match every `key=value` pair in the
/// process's `TAG_FILTERS` (default just this one tag) to be considered.
pub const DEFAULT_OPT_IN_TAG_KEY: &str = "spot-enabled";
pub const DEFAULT_OPT_IN_TAG_VALUE: &str = "true";

/// Written onto every SIR the controller creates.
pub const LAUNCHED_FOR_ASG: &str = "launched-for-asg";

/// The commit marker. Once present with value `"true"` a SIR is
/// considered fully processed and is never revisited.
pub const AUTOSPOTTING_COMPLETE: &str = "autospotting-complete";

/// AWS tag that is always propagated onto launched spot instances.
pub const LAUNCH_CONFIGURATION_NAME: &str = "LaunchConfigurationName";

/// Tag key prefixes that are never propagated from an ASG onto a SIR,
/// regardless of `PropagateAtLaunch`.
const RESERVED_PREFIXES: &[&str] = &["aws:"];

pub fn is_reserved_key(key: &str) -> bool {
    RESERVED_PREFIXES.iter().any(|prefix| key.starts_with(prefix))
}

pub fn is_complete(tags: &HashMap<String, String>) -> bool {
    tags.get(AUTOSPOTTING_COMPLETE).map(String::as_str) == Some("true")
}

pub fn launched_for(tags: &HashMap<String, String>) -> Option<&str> {
    tags.get(LAUNCHED_FOR_ASG).map(String::as_str)
}

/// One `key=value` requirement from the `TAG_FILTERS` process setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagFilter {
    pub key: String,
    pub value: String,
}

impl TagFilter {
    /// Parse a comma-separated `key=value` list, e.g. `spot-enabled=true,team=infra`.
    pub fn parse_list(raw: &str) -> Vec<Self> {
        raw.split(',')
            .filter_map(|pair| {
                let pair = pair.trim();
                if pair.is_empty() {
                    return None;
                }
                let (key, value) = pair.split_once('=')?;
                Some(Self {
                    key: key.trim().to_string(),
                    value: value.trim().to_string(),
                })
            })
            .collect()
    }

    pub fn matches_all(filters: &[Self], tags: &HashMap<String, String>) -> bool {
        filters
            .iter()
            .all(|f| tags.get(&f.key).map(String::as_str) == Some(f.value.as_str()))
    }
}
