//! Business coefficients used by the estimate calculator.
//!
//! Every value here is policy, not mechanism: deployments load their own
//! table from configuration and [`PricingPolicy::validate`] checks that it
//! keeps every breakdown line non-negative.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{AlarmType, DwellingType, RenovationScope, RoofOrientation, Shading, SystemTier};

/// Errors for pricing tables that would produce invalid estimates.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PricingPolicyError {
    /// A rate or unit price must be strictly positive.
    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: Decimal },

    /// A multiplicative surcharge below 1 would produce a negative line.
    #[error("{name} must be at least 1, got {value}")]
    FactorBelowOne { name: &'static str, value: Decimal },

    /// A yield derating factor must be in (0, 1].
    #[error("{name} must be between 0 (exclusive) and 1, got {value}")]
    InvalidDerating { name: &'static str, value: Decimal },

    /// A rate expressed as a share must be in [0, 1].
    #[error("{name} must be between 0 and 1, got {value}")]
    InvalidShare { name: &'static str, value: Decimal },

    /// The variance band must be in [0, 1).
    #[error("variance must be at least 0 and below 1, got {0}")]
    InvalidVariance(Decimal),
}

/// Price per square meter of the base installation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DwellingRates {
    pub apartment: Decimal,
    pub detached_house: Decimal,
    pub townhouse: Decimal,
    pub office: Decimal,
}

impl Default for DwellingRates {
    fn default() -> Self {
        Self {
            apartment: dec!(55),
            detached_house: dec!(65),
            townhouse: dec!(60),
            office: dec!(70),
        }
    }
}

impl DwellingRates {
    pub fn rate(&self, dwelling: DwellingType) -> Decimal {
        match dwelling {
            DwellingType::Apartment => self.apartment,
            DwellingType::DetachedHouse => self.detached_house,
            DwellingType::Townhouse => self.townhouse,
            DwellingType::Office => self.office,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenovationFactors {
    pub partial: Decimal,
    pub full: Decimal,
    /// Used for a renovation whose scope was not given.
    pub unspecified: Decimal,
}

impl Default for RenovationFactors {
    fn default() -> Self {
        Self {
            partial: dec!(1.10),
            full: dec!(1.25),
            unspecified: dec!(1.25),
        }
    }
}

impl RenovationFactors {
    pub fn factor(&self, scope: Option<RenovationScope>) -> Decimal {
        match scope {
            Some(RenovationScope::Partial) => self.partial,
            Some(RenovationScope::Full) => self.full,
            None => self.unspecified,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierFactors {
    pub standard: Decimal,
    pub advanced: Decimal,
    pub domotic: Decimal,
}

impl Default for TierFactors {
    fn default() -> Self {
        Self {
            standard: Decimal::ONE,
            advanced: dec!(1.20),
            domotic: dec!(1.45),
        }
    }
}

impl TierFactors {
    pub fn factor(&self, tier: SystemTier) -> Decimal {
        match tier {
            SystemTier::Standard => self.standard,
            SystemTier::Advanced => self.advanced,
            SystemTier::Domotic => self.domotic,
        }
    }
}

/// Yield derating by roof orientation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrientationFactors {
    pub south: Decimal,
    pub east_west: Decimal,
    pub north: Decimal,
    pub unspecified: Decimal,
}

impl Default for OrientationFactors {
    fn default() -> Self {
        Self {
            south: Decimal::ONE,
            east_west: dec!(0.85),
            north: dec!(0.60),
            unspecified: dec!(0.85),
        }
    }
}

impl OrientationFactors {
    pub fn factor(&self, orientation: Option<RoofOrientation>) -> Decimal {
        match orientation {
            Some(RoofOrientation::South) => self.south,
            Some(RoofOrientation::EastWest) => self.east_west,
            Some(RoofOrientation::North) => self.north,
            None => self.unspecified,
        }
    }
}

/// Yield derating by roof shading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadingFactors {
    pub none: Decimal,
    pub partial: Decimal,
    pub heavy: Decimal,
    /// Applied when shading is not known; deliberately pessimistic.
    pub unspecified: Decimal,
}

impl Default for ShadingFactors {
    fn default() -> Self {
        Self {
            none: Decimal::ONE,
            partial: dec!(0.85),
            heavy: dec!(0.70),
            unspecified: dec!(0.80),
        }
    }
}

impl ShadingFactors {
    pub fn factor(&self, shading: Option<Shading>) -> Decimal {
        match shading {
            Some(Shading::None) => self.none,
            Some(Shading::Partial) => self.partial,
            Some(Shading::Heavy) => self.heavy,
            None => self.unspecified,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhotovoltaicPricing {
    pub price_per_kwp: Decimal,
    /// Annual production of 1 kWp under ideal orientation and no shading.
    pub yield_kwh_per_kwp: Decimal,
    pub default_annual_consumption_kwh: Decimal,
    /// Roof surface one installed kWp occupies; caps sizing by usable area.
    pub area_per_kwp_m2: Decimal,
    pub orientation: OrientationFactors,
    pub shading: ShadingFactors,
    pub battery_price_per_kwh: Decimal,
    pub default_battery_kwh: Decimal,
    /// Share of plant and battery cost recoverable through incentives.
    pub incentive_rate: Decimal,
}

impl Default for PhotovoltaicPricing {
    fn default() -> Self {
        Self {
            price_per_kwp: dec!(1600),
            yield_kwh_per_kwp: dec!(1200),
            default_annual_consumption_kwh: dec!(2700),
            area_per_kwp_m2: dec!(6),
            orientation: OrientationFactors::default(),
            shading: ShadingFactors::default(),
            battery_price_per_kwh: dec!(700),
            default_battery_kwh: dec!(5),
            incentive_rate: dec!(0.50),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityPricing {
    pub perimeter: Decimal,
    pub volumetric: Decimal,
    pub combined: Decimal,
    /// Price used when security is requested but no alarm type was picked.
    pub unspecified: Decimal,
    pub camera_unit_price: Decimal,
    pub incentive_rate: Decimal,
}

impl Default for SecurityPricing {
    fn default() -> Self {
        Self {
            perimeter: dec!(900),
            volumetric: dec!(1200),
            combined: dec!(1800),
            unspecified: dec!(1200),
            camera_unit_price: dec!(250),
            incentive_rate: dec!(0.50),
        }
    }
}

impl SecurityPricing {
    pub fn alarm_price(&self, alarm: Option<AlarmType>) -> Decimal {
        match alarm {
            Some(AlarmType::Perimeter) => self.perimeter,
            Some(AlarmType::Volumetric) => self.volumetric,
            Some(AlarmType::Combined) => self.combined,
            None => self.unspecified,
        }
    }
}

/// Complete pricing table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingPolicy {
    pub rates_per_m2: DwellingRates,
    pub renovation: RenovationFactors,
    pub tiers: TierFactors,
    /// Rooms covered by the base rate.
    pub included_rooms: u32,
    /// Surcharge per room above `included_rooms`, e.g. 0.03 for 3%.
    pub extra_room_factor: Decimal,
    pub shutter_unit_price: Decimal,
    pub photovoltaic: PhotovoltaicPricing,
    pub security: SecurityPricing,
    /// Half-width of the quoted band around the midpoint, e.g. 0.15 for ±15%.
    pub variance: Decimal,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            rates_per_m2: DwellingRates::default(),
            renovation: RenovationFactors::default(),
            tiers: TierFactors::default(),
            included_rooms: 4,
            extra_room_factor: dec!(0.03),
            shutter_unit_price: dec!(180),
            photovoltaic: PhotovoltaicPricing::default(),
            security: SecurityPricing::default(),
            variance: dec!(0.15),
        }
    }
}

fn positive(name: &'static str, value: Decimal) -> Result<(), PricingPolicyError> {
    if value <= Decimal::ZERO {
        return Err(PricingPolicyError::NonPositive { name, value });
    }
    Ok(())
}

fn at_least_one(name: &'static str, value: Decimal) -> Result<(), PricingPolicyError> {
    if value < Decimal::ONE {
        return Err(PricingPolicyError::FactorBelowOne { name, value });
    }
    Ok(())
}

fn derating(name: &'static str, value: Decimal) -> Result<(), PricingPolicyError> {
    if value <= Decimal::ZERO || value > Decimal::ONE {
        return Err(PricingPolicyError::InvalidDerating { name, value });
    }
    Ok(())
}

fn share(name: &'static str, value: Decimal) -> Result<(), PricingPolicyError> {
    if value < Decimal::ZERO || value > Decimal::ONE {
        return Err(PricingPolicyError::InvalidShare { name, value });
    }
    Ok(())
}

impl PricingPolicy {
    /// Checks that every coefficient is within its valid range.
    ///
    /// # Errors
    ///
    /// Returns the first [`PricingPolicyError`] found.
    pub fn validate(&self) -> Result<(), PricingPolicyError> {
        let rates = &self.rates_per_m2;
        positive("rates_per_m2.apartment", rates.apartment)?;
        positive("rates_per_m2.detached_house", rates.detached_house)?;
        positive("rates_per_m2.townhouse", rates.townhouse)?;
        positive("rates_per_m2.office", rates.office)?;

        at_least_one("renovation.partial", self.renovation.partial)?;
        at_least_one("renovation.full", self.renovation.full)?;
        at_least_one("renovation.unspecified", self.renovation.unspecified)?;
        at_least_one("tiers.standard", self.tiers.standard)?;
        at_least_one("tiers.advanced", self.tiers.advanced)?;
        at_least_one("tiers.domotic", self.tiers.domotic)?;
        share("extra_room_factor", self.extra_room_factor)?;

        positive("shutter_unit_price", self.shutter_unit_price)?;

        let pv = &self.photovoltaic;
        positive("photovoltaic.price_per_kwp", pv.price_per_kwp)?;
        positive("photovoltaic.yield_kwh_per_kwp", pv.yield_kwh_per_kwp)?;
        positive(
            "photovoltaic.default_annual_consumption_kwh",
            pv.default_annual_consumption_kwh,
        )?;
        positive("photovoltaic.area_per_kwp_m2", pv.area_per_kwp_m2)?;
        positive("photovoltaic.battery_price_per_kwh", pv.battery_price_per_kwh)?;
        positive("photovoltaic.default_battery_kwh", pv.default_battery_kwh)?;
        derating("photovoltaic.orientation.south", pv.orientation.south)?;
        derating("photovoltaic.orientation.east_west", pv.orientation.east_west)?;
        derating("photovoltaic.orientation.north", pv.orientation.north)?;
        derating("photovoltaic.orientation.unspecified", pv.orientation.unspecified)?;
        derating("photovoltaic.shading.none", pv.shading.none)?;
        derating("photovoltaic.shading.partial", pv.shading.partial)?;
        derating("photovoltaic.shading.heavy", pv.shading.heavy)?;
        derating("photovoltaic.shading.unspecified", pv.shading.unspecified)?;
        share("photovoltaic.incentive_rate", pv.incentive_rate)?;

        let security = &self.security;
        positive("security.perimeter", security.perimeter)?;
        positive("security.volumetric", security.volumetric)?;
        positive("security.combined", security.combined)?;
        positive("security.unspecified", security.unspecified)?;
        positive("security.camera_unit_price", security.camera_unit_price)?;
        share("security.incentive_rate", security.incentive_rate)?;

        if self.variance < Decimal::ZERO || self.variance >= Decimal::ONE {
            return Err(PricingPolicyError::InvalidVariance(self.variance));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn default_policy_is_valid() {
        assert_eq!(PricingPolicy::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_non_positive_rate() {
        let mut policy = PricingPolicy::default();
        policy.rates_per_m2.office = Decimal::ZERO;

        assert_eq!(
            policy.validate(),
            Err(PricingPolicyError::NonPositive {
                name: "rates_per_m2.office",
                value: Decimal::ZERO
            })
        );
    }

    #[test]
    fn rejects_discounting_factor() {
        let mut policy = PricingPolicy::default();
        policy.tiers.standard = dec!(0.9);

        assert_eq!(
            policy.validate(),
            Err(PricingPolicyError::FactorBelowOne {
                name: "tiers.standard",
                value: dec!(0.9)
            })
        );
    }

    #[test]
    fn rejects_zero_shading_factor() {
        let mut policy = PricingPolicy::default();
        policy.photovoltaic.shading.heavy = Decimal::ZERO;

        assert!(matches!(
            policy.validate(),
            Err(PricingPolicyError::InvalidDerating { name: "photovoltaic.shading.heavy", .. })
        ));
    }

    #[test]
    fn rejects_zero_roof_area_per_kwp() {
        let mut policy = PricingPolicy::default();
        policy.photovoltaic.area_per_kwp_m2 = Decimal::ZERO;

        assert!(matches!(
            policy.validate(),
            Err(PricingPolicyError::NonPositive { name: "photovoltaic.area_per_kwp_m2", .. })
        ));
    }

    #[test]
    fn rejects_full_variance() {
        let mut policy = PricingPolicy::default();
        policy.variance = Decimal::ONE;

        assert_eq!(
            policy.validate(),
            Err(PricingPolicyError::InvalidVariance(Decimal::ONE))
        );
    }

    #[test]
    fn unknown_shading_is_more_pessimistic_than_partial() {
        let shading = ShadingFactors::default();

        assert!(shading.factor(None) < shading.factor(Some(Shading::Partial)));
    }

    #[test]
    fn partial_table_fills_in_defaults() {
        let policy: PricingPolicy = serde_json::from_value(serde_json::json!({
            "variance": "0.10",
            "tiers": { "advanced": 1.3 }
        }))
        .unwrap();

        assert_eq!(policy.variance, dec!(0.10));
        assert_eq!(policy.tiers.advanced, dec!(1.3));
        assert_eq!(policy.tiers.domotic, TierFactors::default().domotic);
        assert_eq!(policy.rates_per_m2, DwellingRates::default());
    }
}
