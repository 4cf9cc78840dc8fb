//! Core of the home-systems lead configurator: wizard step flow, answer
//! accumulation, estimate calculation and lead persistence contracts.

pub mod calculations;
pub mod db;
pub mod flow;
pub mod form;
pub mod models;
pub mod wizard;

pub use calculations::{EstimateCalculator, EstimateError, PricingPolicy, RequiredField};
pub use db::repository::{LeadRepository, RepositoryError};
pub use flow::{FlowEngine, FlowError, Navigation, NavigationPosition, StepDefinition, StepId};
pub use form::{FormPatch, FormStateStore, Merge, PatchError};
pub use models::*;
pub use wizard::{WizardError, WizardSession};
