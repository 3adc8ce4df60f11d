//! Cloud API surface: narrow capability traits (§10.2) plus the real
//! AWS implementation of each.

pub mod aws;
pub mod traits;

pub use traits::{AsgDescription, AsgMutator, CatalogBuilder, PricingOracle, SpotRequester, Waiter};
