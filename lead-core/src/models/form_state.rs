use std::fmt;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The fixed set of answer namespaces inside a [`FormState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleName {
    General,
    Electrical,
    Photovoltaic,
    Security,
    Contact,
}

impl ModuleName {
    pub const ALL: [ModuleName; 5] = [
        Self::General,
        Self::Electrical,
        Self::Photovoltaic,
        Self::Security,
        Self::Contact,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Electrical => "electrical",
            Self::Photovoltaic => "photovoltaic",
            Self::Security => "security",
            Self::Contact => "contact",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == s)
    }
}

impl fmt::Display for ModuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DwellingType {
    Apartment,
    DetachedHouse,
    Townhouse,
    Office,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstructionStatus {
    NewBuild,
    Renovation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenovationScope {
    Partial,
    Full,
}

/// Installation areas a customer can ask a quote for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Service {
    Electrical,
    Photovoltaic,
    Security,
}

impl Service {
    /// The module holding this service's answers.
    pub fn module(&self) -> ModuleName {
        match self {
            Self::Electrical => ModuleName::Electrical,
            Self::Photovoltaic => ModuleName::Photovoltaic,
            Self::Security => ModuleName::Security,
        }
    }
}

/// Electrical system tier. `Domotic` is the full home-automation package
/// (tier 3) and already ships motorised shutters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemTier {
    Standard,
    Advanced,
    Domotic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoofOrientation {
    South,
    EastWest,
    North,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shading {
    None,
    Partial,
    Heavy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlarmType {
    Perimeter,
    Volumetric,
    Combined,
}

/// Answers about the dwelling itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GeneralInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dwelling_type: Option<DwellingType>,
    /// Floor area in square meters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surface_area: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub construction: Option<ConstructionStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renovation_scope: Option<RenovationScope>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub services: Option<Vec<Service>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ElectricalInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_tier: Option<SystemTier>,
    /// Shutters to electrify; ignored when the tier already includes them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shutter_count: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RoofInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<RoofOrientation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shading: Option<Shading>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usable_area: Option<Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PhotovoltaicInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roof: Option<RoofInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annual_consumption_kwh: Option<Decimal>,
    /// Plant power requested explicitly; overrides sizing from consumption.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desired_power_kw: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery_capacity_kwh: Option<Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SecurityInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alarm: Option<AlarmType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera_count: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Address {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ContactInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privacy_consent: Option<bool>,
}

impl ContactInfo {
    /// True when at least one non-blank way to reach the customer is present.
    pub fn has_channel(&self) -> bool {
        let filled = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        filled(&self.email) || filled(&self.phone)
    }
}

/// Accumulated wizard answers.
///
/// Every module sits behind an [`Arc`]: applying a patch rebuilds only the
/// modules it names, so untouched modules stay pointer-identical across
/// snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FormState {
    pub general: Arc<GeneralInfo>,
    pub electrical: Arc<ElectricalInfo>,
    pub photovoltaic: Arc<PhotovoltaicInfo>,
    pub security: Arc<SecurityInfo>,
    pub contact: Arc<ContactInfo>,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The customer explicitly picked `service` on the services step.
    pub fn service_selected(&self, service: Service) -> bool {
        self.general
            .services
            .as_ref()
            .is_some_and(|s| s.contains(&service))
    }

    /// The services step was answered and `service` was left out.
    pub fn service_declined(&self, service: Service) -> bool {
        self.general
            .services
            .as_ref()
            .is_some_and(|s| !s.contains(&service))
    }

    /// Selected, or answered about without having been declined.
    pub fn service_requested(&self, service: Service) -> bool {
        self.service_selected(service)
            || (!self.service_declined(service) && self.module_has_answers(service.module()))
    }

    pub fn is_renovation(&self) -> bool {
        self.general.construction == Some(ConstructionStatus::Renovation)
    }

    pub fn shutters_included_in_tier(&self) -> bool {
        self.electrical.system_tier == Some(SystemTier::Domotic)
    }

    pub fn module_has_answers(&self, module: ModuleName) -> bool {
        match module {
            ModuleName::General => *self.general != GeneralInfo::default(),
            ModuleName::Electrical => *self.electrical != ElectricalInfo::default(),
            ModuleName::Photovoltaic => *self.photovoltaic != PhotovoltaicInfo::default(),
            ModuleName::Security => *self.security != SecurityInfo::default(),
            ModuleName::Contact => *self.contact != ContactInfo::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        ModuleName::ALL.iter().all(|m| !self.module_has_answers(*m))
    }
}
