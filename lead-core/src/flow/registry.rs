//! The configurator's step registry.
//!
//! Order here is the only source of step ordering. Conditional screens
//! are skipped through their predicate; none of them is ever jumped over
//! by navigation.

use crate::models::{FormState, ModuleName, Service};

use super::step::{StepDefinition, StepId};

fn is_renovation(state: &FormState) -> bool {
    state.is_renovation()
}

fn wants_electrical(state: &FormState) -> bool {
    state.service_selected(Service::Electrical)
}

/// The domotic tier ships motorised shutters, so there is nothing to ask.
fn needs_shutter_question(state: &FormState) -> bool {
    wants_electrical(state) && !state.shutters_included_in_tier()
}

fn wants_photovoltaic(state: &FormState) -> bool {
    state.service_selected(Service::Photovoltaic)
}

fn wants_security(state: &FormState) -> bool {
    state.service_selected(Service::Security)
}

pub static DEFAULT_STEPS: [StepDefinition; 15] = [
    StepDefinition::new(StepId::DwellingType, ModuleName::General),
    StepDefinition::new(StepId::SurfaceArea, ModuleName::General),
    StepDefinition::new(StepId::ConstructionStatus, ModuleName::General),
    StepDefinition::new(StepId::RenovationScope, ModuleName::General).when(is_renovation),
    StepDefinition::new(StepId::RoomCount, ModuleName::General),
    StepDefinition::new(StepId::Services, ModuleName::General),
    StepDefinition::new(StepId::ElectricalTier, ModuleName::Electrical).when(wants_electrical),
    StepDefinition::new(StepId::ShutterElectrification, ModuleName::Electrical)
        .when(needs_shutter_question),
    StepDefinition::new(StepId::PhotovoltaicRoof, ModuleName::Photovoltaic)
        .when(wants_photovoltaic),
    StepDefinition::new(StepId::PhotovoltaicConsumption, ModuleName::Photovoltaic)
        .when(wants_photovoltaic),
    StepDefinition::new(StepId::PhotovoltaicStorage, ModuleName::Photovoltaic)
        .when(wants_photovoltaic),
    StepDefinition::new(StepId::SecuritySystem, ModuleName::Security).when(wants_security),
    StepDefinition::new(StepId::SecurityCameras, ModuleName::Security).when(wants_security),
    StepDefinition::new(StepId::Contact, ModuleName::Contact),
    StepDefinition::new(StepId::Estimate, ModuleName::Contact).requiring_estimate(),
];

/// Owned copy of [`DEFAULT_STEPS`].
pub fn default_steps() -> Vec<StepDefinition> {
    DEFAULT_STEPS.to_vec()
}
