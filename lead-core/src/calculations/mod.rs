//! Estimate calculation for configurator leads.
//!
//! [`EstimateCalculator`] turns a form snapshot into a priced range;
//! [`PricingPolicy`] is the table of business coefficients it prices with.

pub mod common;
pub mod estimate;
pub mod pricing;

pub use estimate::{EstimateCalculator, EstimateError, RequiredField};
pub use pricing::{PricingPolicy, PricingPolicyError};
