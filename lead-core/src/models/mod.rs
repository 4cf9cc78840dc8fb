mod estimate;
mod form_state;
mod lead;

pub use estimate::{CostComponent, EstimateResult};
pub use form_state::{
    Address, AlarmType, ConstructionStatus, ContactInfo, DwellingType, ElectricalInfo, FormState,
    GeneralInfo, ModuleName, PhotovoltaicInfo, RenovationScope, RoofInfo, RoofOrientation,
    SecurityInfo, Service, Shading, SystemTier,
};
pub use lead::{Lead, LeadStatus, NewLead};
