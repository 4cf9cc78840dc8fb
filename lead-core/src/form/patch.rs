use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::models::{
    ContactInfo, ElectricalInfo, GeneralInfo, ModuleName, PhotovoltaicInfo, SecurityInfo,
};

/// Errors for patches that cannot be applied.
#[derive(Debug, Error)]
pub enum PatchError {
    /// The patch document is not a JSON object.
    #[error("patch must be a mapping of module names, got {0}")]
    NotAMapping(&'static str),

    /// A top-level key does not name a module.
    #[error("unknown module '{0}'")]
    UnknownModule(String),

    /// A module value is not a JSON object.
    #[error("module '{module}' must be a mapping, got {found}")]
    ModuleNotAMapping {
        module: ModuleName,
        found: &'static str,
    },

    /// A module object has unknown or ill-typed fields.
    #[error("invalid fields in module '{module}': {source}")]
    InvalidModule {
        module: ModuleName,
        #[source]
        source: serde_json::Error,
    },
}

/// Partial answers for one or more modules.
///
/// Modules left as `None` are not touched when the patch is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FormPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub general: Option<GeneralInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub electrical: Option<ElectricalInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photovoltaic: Option<PhotovoltaicInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<SecurityInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<ContactInfo>,
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn module_value<T: DeserializeOwned>(module: ModuleName, value: &Value) -> Result<T, PatchError> {
    if !value.is_object() {
        return Err(PatchError::ModuleNotAMapping {
            module,
            found: kind(value),
        });
    }
    serde_json::from_value(value.clone())
        .map_err(|source| PatchError::InvalidModule { module, source })
}

impl FormPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn general(mut self, general: GeneralInfo) -> Self {
        self.general = Some(general);
        self
    }

    pub fn electrical(mut self, electrical: ElectricalInfo) -> Self {
        self.electrical = Some(electrical);
        self
    }

    pub fn photovoltaic(mut self, photovoltaic: PhotovoltaicInfo) -> Self {
        self.photovoltaic = Some(photovoltaic);
        self
    }

    pub fn security(mut self, security: SecurityInfo) -> Self {
        self.security = Some(security);
        self
    }

    pub fn contact(mut self, contact: ContactInfo) -> Self {
        self.contact = Some(contact);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.modules().is_empty()
    }

    /// Modules this patch touches, in [`ModuleName::ALL`] order.
    pub fn modules(&self) -> Vec<ModuleName> {
        let present = [
            self.general.is_some(),
            self.electrical.is_some(),
            self.photovoltaic.is_some(),
            self.security.is_some(),
            self.contact.is_some(),
        ];
        ModuleName::ALL
            .into_iter()
            .zip(present)
            .filter_map(|(module, present)| present.then_some(module))
            .collect()
    }

    /// Validates a loosely-typed patch document.
    ///
    /// The whole document is checked before a patch is returned, so a
    /// rejected document never reaches the store.
    ///
    /// # Errors
    ///
    /// Returns [`PatchError`] if the document is not an object, names an
    /// unknown module, or a module value is not an object of known fields.
    pub fn from_json(value: &Value) -> Result<Self, PatchError> {
        let map = value
            .as_object()
            .ok_or_else(|| PatchError::NotAMapping(kind(value)))?;

        let mut patch = Self::new();
        for (key, module_json) in map {
            let module =
                ModuleName::parse(key).ok_or_else(|| PatchError::UnknownModule(key.clone()))?;
            match module {
                ModuleName::General => patch.general = Some(module_value(module, module_json)?),
                ModuleName::Electrical => {
                    patch.electrical = Some(module_value(module, module_json)?)
                }
                ModuleName::Photovoltaic => {
                    patch.photovoltaic = Some(module_value(module, module_json)?)
                }
                ModuleName::Security => patch.security = Some(module_value(module, module_json)?),
                ModuleName::Contact => patch.contact = Some(module_value(module, module_json)?),
            }
        }
        Ok(patch)
    }
}
