use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Named line of an estimate breakdown.
///
/// Declaration order is the order lines are computed and listed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostComponent {
    BaseArea,
    Renovation,
    SystemTier,
    ExtraRooms,
    ShutterElectrification,
    Photovoltaic,
    Battery,
    Alarm,
    Cameras,
}

impl CostComponent {
    pub fn label(&self) -> &'static str {
        match self {
            Self::BaseArea => "Base installation (area)",
            Self::Renovation => "Renovation works",
            Self::SystemTier => "System tier",
            Self::ExtraRooms => "Extra rooms",
            Self::ShutterElectrification => "Shutter electrification",
            Self::Photovoltaic => "Photovoltaic plant",
            Self::Battery => "Storage battery",
            Self::Alarm => "Alarm system",
            Self::Cameras => "Cameras",
        }
    }
}

/// Priced range produced from one [`FormState`](crate::FormState) snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateResult {
    /// Lower bound of the quote.
    pub min: Decimal,

    /// Upper bound of the quote.
    pub max: Decimal,

    /// Pre-variance estimate; always the sum of `breakdown`.
    pub midpoint: Decimal,

    /// Non-negative contributions of each priced component.
    pub breakdown: BTreeMap<CostComponent, Decimal>,

    /// Incentive amounts recoverable against a component. Informational:
    /// they never change `min`, `max` or `midpoint`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub deductions: BTreeMap<CostComponent, Decimal>,

    /// Sized plant power, present when photovoltaic was priced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photovoltaic_kwp: Option<Decimal>,

    pub calculated_at: DateTime<Utc>,
}

impl EstimateResult {
    pub fn breakdown_total(&self) -> Decimal {
        self.breakdown.values().copied().sum()
    }

    pub fn total_deductions(&self) -> Decimal {
        self.deductions.values().copied().sum()
    }

    /// Compares everything except the informational timestamp.
    pub fn same_quote(&self, other: &Self) -> bool {
        self.min == other.min
            && self.max == other.max
            && self.midpoint == other.midpoint
            && self.breakdown == other.breakdown
            && self.deductions == other.deductions
            && self.photovoltaic_kwp == other.photovoltaic_kwp
    }
}
