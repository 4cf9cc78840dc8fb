//! Field-wise merge of partial module values.
//!
//! A field set in the patch replaces the base field, except for nested
//! objects, which merge recursively. Arrays and scalars replace wholesale.

use std::sync::Arc;

use crate::models::{
    Address, ContactInfo, ElectricalInfo, FormState, GeneralInfo, PhotovoltaicInfo, RoofInfo,
    SecurityInfo,
};

use super::patch::FormPatch;

pub trait Merge: Clone {
    /// Returns `self` with every field present in `patch` applied.
    fn merge(&self, patch: &Self) -> Self;
}

fn pick<T: Clone>(base: &Option<T>, patch: &Option<T>) -> Option<T> {
    patch.as_ref().or(base.as_ref()).cloned()
}

fn merge_nested<T: Merge>(base: &Option<T>, patch: &Option<T>) -> Option<T> {
    match (base, patch) {
        (Some(base), Some(patch)) => Some(base.merge(patch)),
        (None, Some(patch)) => Some(patch.clone()),
        (base, None) => base.clone(),
    }
}

impl Merge for GeneralInfo {
    fn merge(&self, patch: &Self) -> Self {
        Self {
            dwelling_type: pick(&self.dwelling_type, &patch.dwelling_type),
            surface_area: pick(&self.surface_area, &patch.surface_area),
            construction: pick(&self.construction, &patch.construction),
            renovation_scope: pick(&self.renovation_scope, &patch.renovation_scope),
            room_count: pick(&self.room_count, &patch.room_count),
            services: pick(&self.services, &patch.services),
        }
    }
}

impl Merge for ElectricalInfo {
    fn merge(&self, patch: &Self) -> Self {
        Self {
            system_tier: pick(&self.system_tier, &patch.system_tier),
            shutter_count: pick(&self.shutter_count, &patch.shutter_count),
        }
    }
}

impl Merge for RoofInfo {
    fn merge(&self, patch: &Self) -> Self {
        Self {
            orientation: pick(&self.orientation, &patch.orientation),
            shading: pick(&self.shading, &patch.shading),
            usable_area: pick(&self.usable_area, &patch.usable_area),
        }
    }
}

impl Merge for PhotovoltaicInfo {
    fn merge(&self, patch: &Self) -> Self {
        Self {
            roof: merge_nested(&self.roof, &patch.roof),
            annual_consumption_kwh: pick(
                &self.annual_consumption_kwh,
                &patch.annual_consumption_kwh,
            ),
            desired_power_kw: pick(&self.desired_power_kw, &patch.desired_power_kw),
            battery: pick(&self.battery, &patch.battery),
            battery_capacity_kwh: pick(&self.battery_capacity_kwh, &patch.battery_capacity_kwh),
        }
    }
}

impl Merge for SecurityInfo {
    fn merge(&self, patch: &Self) -> Self {
        Self {
            alarm: pick(&self.alarm, &patch.alarm),
            camera_count: pick(&self.camera_count, &patch.camera_count),
        }
    }
}

impl Merge for Address {
    fn merge(&self, patch: &Self) -> Self {
        Self {
            street: pick(&self.street, &patch.street),
            city: pick(&self.city, &patch.city),
            postal_code: pick(&self.postal_code, &patch.postal_code),
        }
    }
}

impl Merge for ContactInfo {
    fn merge(&self, patch: &Self) -> Self {
        Self {
            full_name: pick(&self.full_name, &patch.full_name),
            email: pick(&self.email, &patch.email),
            phone: pick(&self.phone, &patch.phone),
            address: merge_nested(&self.address, &patch.address),
            notes: pick(&self.notes, &patch.notes),
            privacy_consent: pick(&self.privacy_consent, &patch.privacy_consent),
        }
    }
}

/// Modules named by the patch get a new allocation; the rest are shared.
fn apply_module<T: Merge>(base: &Arc<T>, patch: &Option<T>) -> Arc<T> {
    match patch {
        Some(patch) => Arc::new(base.merge(patch)),
        None => Arc::clone(base),
    }
}

impl FormState {
    /// Returns a new state with `patch` merged in. `self` is left untouched.
    pub fn apply(&self, patch: &FormPatch) -> FormState {
        FormState {
            general: apply_module(&self.general, &patch.general),
            electrical: apply_module(&self.electrical, &patch.electrical),
            photovoltaic: apply_module(&self.photovoltaic, &patch.photovoltaic),
            security: apply_module(&self.security, &patch.security),
            contact: apply_module(&self.contact, &patch.contact),
        }
    }
}
