//! Quote calculation from accumulated wizard answers.
//!
//! # Computation
//!
//! | Stage | Component                  | Amount                                               |
//! |-------|----------------------------|------------------------------------------------------|
//! | 1     | `base_area`                | surface × rate for the dwelling type                 |
//! | 2     | `renovation`               | running × (renovation factor − 1), renovations only  |
//! | 3     | `system_tier`              | running × (tier factor − 1), tier answered           |
//! | 4     | `extra_rooms`              | running × extra-room surcharge, rooms answered       |
//! | 5     | `shutter_electrification`  | shutters × unit price, unless the tier includes them |
//! | 6     | `photovoltaic`, `battery`  | sized kWp × price per kWp, battery kWh × price       |
//! | 7     | `alarm`, `cameras`         | alarm price, cameras × unit price                    |
//!
//! The midpoint is the sum of all lines; `min` and `max` are the midpoint
//! shifted down and up by the policy variance.
//!
//! Sizing divides consumption by the derated yield and never exceeds what the
//! usable roof area holds. Every product is checked, so an answer too large
//! to price yields [`EstimateError::AmountOutOfRange`].
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use lead_core::{EstimateCalculator, FormState};
//!
//! let state: FormState = serde_json::from_value(json!({
//!     "general": { "dwellingType": "apartment", "surfaceArea": 85 },
//!     "electrical": { "systemTier": "advanced" }
//! }))
//! .unwrap();
//!
//! let estimate = EstimateCalculator::default().compute(&state).unwrap();
//!
//! assert!(estimate.min <= estimate.max);
//! assert_eq!(estimate.breakdown_total(), estimate.midpoint);
//! ```

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::calculations::common::{excess, factor_contribution, round_half_up};
use crate::calculations::pricing::{PricingPolicy, PricingPolicyError};
use crate::flow::StepId;
use crate::models::{CostComponent, EstimateResult, FormState, Service};

/// Answers without which no estimate is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequiredField {
    DwellingType,
    SurfaceArea,
}

impl RequiredField {
    /// The wizard step that collects this field.
    pub fn answered_by(&self) -> StepId {
        match self {
            Self::DwellingType => StepId::DwellingType,
            Self::SurfaceArea => StepId::SurfaceArea,
        }
    }
}

impl fmt::Display for RequiredField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DwellingType => f.write_str("dwelling type"),
            Self::SurfaceArea => f.write_str("surface area"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EstimateError {
    /// A required answer is absent, or the surface area is not positive.
    #[error("cannot estimate yet: {0} is missing")]
    IncompleteInput(RequiredField),

    /// An answer is so large that a breakdown line does not fit in a decimal.
    #[error("{} amount is out of range", .0.label())]
    AmountOutOfRange(CostComponent),

    /// The lines fit individually but their total or band does not.
    #[error("estimate total is out of range")]
    TotalOutOfRange,
}

/// Rounds `amount` to cents, or reports `component` when it overflowed.
fn line(component: CostComponent, amount: Option<Decimal>) -> Result<Decimal, EstimateError> {
    amount
        .map(round_half_up)
        .ok_or(EstimateError::AmountOutOfRange(component))
}

/// Computes [`EstimateResult`]s under one [`PricingPolicy`].
#[derive(Debug, Clone)]
pub struct EstimateCalculator {
    policy: PricingPolicy,
}

impl Default for EstimateCalculator {
    fn default() -> Self {
        Self {
            policy: PricingPolicy::default(),
        }
    }
}

struct Lines {
    breakdown: BTreeMap<CostComponent, Decimal>,
    deductions: BTreeMap<CostComponent, Decimal>,
}

impl Lines {
    fn add(&mut self, component: CostComponent, amount: Decimal) -> Decimal {
        self.breakdown.insert(component, amount);
        amount
    }

    fn deduct(
        &mut self,
        component: CostComponent,
        cost: Decimal,
        rate: Decimal,
    ) -> Result<(), EstimateError> {
        let amount = line(component, cost.checked_mul(rate))?;
        if amount > Decimal::ZERO {
            self.deductions.insert(component, amount);
        }
        Ok(())
    }

    /// Adds the surcharge of `factor` on `running`; returns the new running total.
    fn compound(
        &mut self,
        component: CostComponent,
        running: Decimal,
        factor: Decimal,
    ) -> Result<Decimal, EstimateError> {
        let contribution = factor_contribution(running, factor)
            .ok_or(EstimateError::AmountOutOfRange(component))?;
        self.add(component, contribution);
        running
            .checked_add(contribution)
            .ok_or(EstimateError::TotalOutOfRange)
    }

    fn total(&self) -> Result<Decimal, EstimateError> {
        self.breakdown
            .values()
            .try_fold(Decimal::ZERO, |sum, value| sum.checked_add(*value))
            .ok_or(EstimateError::TotalOutOfRange)
    }
}

impl EstimateCalculator {
    /// # Errors
    ///
    /// Returns [`PricingPolicyError`] if the policy fails validation.
    pub fn new(policy: PricingPolicy) -> Result<Self, PricingPolicyError> {
        policy.validate()?;
        Ok(Self { policy })
    }

    pub fn policy(&self) -> &PricingPolicy {
        &self.policy
    }

    /// Prices `state`, stamping the result with the current time.
    ///
    /// # Errors
    ///
    /// Returns [`EstimateError::IncompleteInput`] when the dwelling type is
    /// missing or the surface area is missing or not positive, and
    /// [`EstimateError::AmountOutOfRange`] or [`EstimateError::TotalOutOfRange`]
    /// when an answer is too large to price.
    pub fn compute(&self, state: &FormState) -> Result<EstimateResult, EstimateError> {
        self.compute_at(state, Utc::now())
    }

    /// Prices `state`; `calculated_at` is recorded but never used in the arithmetic.
    pub fn compute_at(
        &self,
        state: &FormState,
        calculated_at: DateTime<Utc>,
    ) -> Result<EstimateResult, EstimateError> {
        let general = &state.general;
        let dwelling = general
            .dwelling_type
            .ok_or(EstimateError::IncompleteInput(RequiredField::DwellingType))?;
        let surface = general
            .surface_area
            .filter(|area| *area > Decimal::ZERO)
            .ok_or(EstimateError::IncompleteInput(RequiredField::SurfaceArea))?;

        let policy = &self.policy;
        let mut lines = Lines {
            breakdown: BTreeMap::new(),
            deductions: BTreeMap::new(),
        };

        let base = line(
            CostComponent::BaseArea,
            surface.checked_mul(policy.rates_per_m2.rate(dwelling)),
        )?;
        let mut running = lines.add(CostComponent::BaseArea, base);

        if state.is_renovation() {
            running = lines.compound(
                CostComponent::Renovation,
                running,
                policy.renovation.factor(general.renovation_scope),
            )?;
        }

        if let Some(tier) = state.electrical.system_tier {
            if !state.service_declined(Service::Electrical) {
                running = lines.compound(
                    CostComponent::SystemTier,
                    running,
                    policy.tiers.factor(tier),
                )?;
            }
        }

        if let Some(rooms) = general.room_count {
            let factor = policy
                .extra_room_factor
                .checked_mul(excess(rooms, policy.included_rooms))
                .and_then(|surcharge| surcharge.checked_add(Decimal::ONE))
                .ok_or(EstimateError::AmountOutOfRange(CostComponent::ExtraRooms))?;
            lines.compound(CostComponent::ExtraRooms, running, factor)?;
        }

        self.add_shutters(state, &mut lines)?;
        let photovoltaic_kwp = self.add_photovoltaic(state, &mut lines)?;
        self.add_security(state, &mut lines)?;

        let midpoint = lines.total()?;
        let band = |factor: Option<Decimal>| {
            factor
                .and_then(|factor| midpoint.checked_mul(factor))
                .map(round_half_up)
                .ok_or(EstimateError::TotalOutOfRange)
        };
        let min = band(Decimal::ONE.checked_sub(policy.variance))?;
        let max = band(Decimal::ONE.checked_add(policy.variance))?;

        debug!(%midpoint, %min, %max, lines = lines.breakdown.len(), "estimate computed");

        Ok(EstimateResult {
            min,
            max,
            midpoint,
            breakdown: lines.breakdown,
            deductions: lines.deductions,
            photovoltaic_kwp,
            calculated_at,
        })
    }

    fn add_shutters(&self, state: &FormState, lines: &mut Lines) -> Result<(), EstimateError> {
        if state.shutters_included_in_tier() || !state.service_requested(Service::Electrical) {
            return Ok(());
        }
        if let Some(count) = state.electrical.shutter_count.filter(|c| *c > 0) {
            let component = CostComponent::ShutterElectrification;
            let amount = line(
                component,
                Decimal::from(count).checked_mul(self.policy.shutter_unit_price),
            )?;
            lines.add(component, amount);
        }
        Ok(())
    }

    /// Plant power sized from consumption and roof, capped by the usable roof area.
    fn sized_kwp(&self, state: &FormState) -> Option<Decimal> {
        let pv = &state.photovoltaic;
        let pricing = &self.policy.photovoltaic;
        let roof = pv.roof.as_ref();

        let consumption = pv
            .annual_consumption_kwh
            .filter(|kwh| *kwh > Decimal::ZERO)
            .unwrap_or(pricing.default_annual_consumption_kwh);
        let annual_yield = pricing
            .yield_kwh_per_kwp
            .checked_mul(pricing.orientation.factor(roof.and_then(|r| r.orientation)))?
            .checked_mul(pricing.shading.factor(roof.and_then(|r| r.shading)))?;
        let sized = round_half_up(consumption.checked_div(annual_yield)?);

        let fits = roof
            .and_then(|r| r.usable_area)
            .filter(|area| *area > Decimal::ZERO)
            .and_then(|area| area.checked_div(pricing.area_per_kwp_m2))
            .map(round_half_up);
        Some(match fits {
            Some(fits) => sized.min(fits),
            None => sized,
        })
    }

    /// Adds plant and battery lines; returns the sized plant power.
    fn add_photovoltaic(
        &self,
        state: &FormState,
        lines: &mut Lines,
    ) -> Result<Option<Decimal>, EstimateError> {
        if !state.service_requested(Service::Photovoltaic) {
            return Ok(None);
        }
        let pv = &state.photovoltaic;
        let pricing = &self.policy.photovoltaic;

        let kwp = match pv.desired_power_kw.filter(|kw| *kw > Decimal::ZERO) {
            Some(kw) => kw,
            None => self
                .sized_kwp(state)
                .ok_or(EstimateError::AmountOutOfRange(CostComponent::Photovoltaic))?,
        };

        let plant = line(
            CostComponent::Photovoltaic,
            kwp.checked_mul(pricing.price_per_kwp),
        )?;
        lines.add(CostComponent::Photovoltaic, plant);
        lines.deduct(CostComponent::Photovoltaic, plant, pricing.incentive_rate)?;

        if pv.battery == Some(true) {
            let capacity = pv
                .battery_capacity_kwh
                .filter(|kwh| *kwh > Decimal::ZERO)
                .unwrap_or(pricing.default_battery_kwh);
            let battery = line(
                CostComponent::Battery,
                capacity.checked_mul(pricing.battery_price_per_kwh),
            )?;
            lines.add(CostComponent::Battery, battery);
            lines.deduct(CostComponent::Battery, battery, pricing.incentive_rate)?;
        }

        Ok(Some(kwp))
    }

    fn add_security(&self, state: &FormState, lines: &mut Lines) -> Result<(), EstimateError> {
        if !state.service_requested(Service::Security) {
            return Ok(());
        }
        let pricing = &self.policy.security;

        let alarm = lines.add(
            CostComponent::Alarm,
            pricing.alarm_price(state.security.alarm),
        );
        lines.deduct(CostComponent::Alarm, alarm, pricing.incentive_rate)?;

        if let Some(count) = state.security.camera_count.filter(|c| *c > 0) {
            let cameras = line(
                CostComponent::Cameras,
                Decimal::from(count).checked_mul(pricing.camera_unit_price),
            )?;
            lines.add(CostComponent::Cameras, cameras);
            lines.deduct(CostComponent::Cameras, cameras, pricing.incentive_rate)?;
        }
        Ok(())
    }
}
