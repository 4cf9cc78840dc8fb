use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::{FormState, ModuleName};

/// Stable identifier of a wizard screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepId {
    DwellingType,
    SurfaceArea,
    ConstructionStatus,
    RenovationScope,
    RoomCount,
    Services,
    ElectricalTier,
    ShutterElectrification,
    PhotovoltaicRoof,
    PhotovoltaicConsumption,
    PhotovoltaicStorage,
    SecuritySystem,
    SecurityCameras,
    Contact,
    Estimate,
}

impl StepId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DwellingType => "dwelling-type",
            Self::SurfaceArea => "surface-area",
            Self::ConstructionStatus => "construction-status",
            Self::RenovationScope => "renovation-scope",
            Self::RoomCount => "room-count",
            Self::Services => "services",
            Self::ElectricalTier => "electrical-tier",
            Self::ShutterElectrification => "shutter-electrification",
            Self::PhotovoltaicRoof => "photovoltaic-roof",
            Self::PhotovoltaicConsumption => "photovoltaic-consumption",
            Self::PhotovoltaicStorage => "photovoltaic-storage",
            Self::SecuritySystem => "security-system",
            Self::SecurityCameras => "security-cameras",
            Self::Contact => "contact",
            Self::Estimate => "estimate",
        }
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Applicability test of a step.
///
/// A bare function pointer: it cannot capture anything, so applicability
/// depends on the form state alone.
pub type Applicability = fn(&FormState) -> bool;

/// One entry of the flow registry.
#[derive(Clone, Copy)]
pub struct StepDefinition {
    pub id: StepId,
    /// Module the step's answers are written to.
    pub module: ModuleName,
    applies_when: Option<Applicability>,
    pub requires_estimate: bool,
}

impl StepDefinition {
    /// An always-applicable step.
    pub const fn new(id: StepId, module: ModuleName) -> Self {
        Self {
            id,
            module,
            applies_when: None,
            requires_estimate: false,
        }
    }

    pub const fn when(mut self, predicate: Applicability) -> Self {
        self.applies_when = Some(predicate);
        self
    }

    pub const fn requiring_estimate(mut self) -> Self {
        self.requires_estimate = true;
        self
    }

    pub fn is_applicable(&self, state: &FormState) -> bool {
        self.applies_when.is_none_or(|predicate| predicate(state))
    }

    pub fn is_conditional(&self) -> bool {
        self.applies_when.is_some()
    }
}

impl fmt::Debug for StepDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepDefinition")
            .field("id", &self.id)
            .field("module", &self.module)
            .field("conditional", &self.is_conditional())
            .field("requires_estimate", &self.requires_estimate)
            .finish()
    }
}

impl PartialEq for StepDefinition {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.module == other.module
            && self.requires_estimate == other.requires_estimate
            && self.is_conditional() == other.is_conditional()
    }
}
