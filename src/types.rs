//! Shared data model types used across the catalog, ASG view, and controller.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Billing lifecycle of an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Lifecycle {
    OnDemand,
    Spot,
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OnDemand => write!(f, "on-demand"),
            Self::Spot => write!(f, "spot"),
        }
    }
}

/// Cloud-reported instance lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstanceState {
    Pending,
    Running,
    ShuttingDown,
    Stopped,
    Terminated,
}

impl InstanceState {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::ShuttingDown | Self::Stopped | Self::Terminated)
    }
}

/// Virtualization mode a type supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Virtualization {
    Hvm,
    Pv,
}

/// Network performance ladder, low to high. Ordering is derived so
/// `net_C >= net_P` can be expressed with a plain comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NetworkTier {
    Low,
    Moderate,
    High,
    TenGigabit,
    TwentyFiveGigabit,
}

/// An availability zone within a region, e.g. `us-east-1a`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AvailabilityZone(pub String);

impl AvailabilityZone {
    pub fn new(az: impl Into<String>) -> Self {
        Self(az.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AvailabilityZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AvailabilityZone {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// State of a spot instance request, as reported by the cloud API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SirState {
    Open,
    Active,
    Cancelled,
    Closed,
    Failed,
}

/// Coarse status code for an active SIR; only the "fulfilled" / "other"
/// distinction matters to the dispatch table in the SIR tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SirStatusCode {
    Fulfilled,
    Other,
}

/// Bidding strategy recognized by `autospotting_bidding_policy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BiddingPolicy {
    #[default]
    Normal,
    Aggressive,
}

impl BiddingPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "normal" => Some(Self::Normal),
            "aggressive" => Some(Self::Aggressive),
            _ => None,
        }
    }
}
