//! Step-flow engine for the configurator wizard.
//!
//! The registry lists every screen once, in display order, each with an
//! optional applicability predicate over the [`FormState`](crate::FormState).
//! Navigation works on the filtered *active* list only.

pub mod engine;
pub mod registry;
pub mod step;

pub use engine::{FlowEngine, FlowError, Navigation, NavigationPosition};
pub use registry::{DEFAULT_STEPS, default_steps};
pub use step::{Applicability, StepDefinition, StepId};
