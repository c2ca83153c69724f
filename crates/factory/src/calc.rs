use crate::error::CalcError;
use collection::Collection;
use core_types::{Context, RawRecord};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

/// A user-defined processing step over a collection.
pub trait Calc {
    type Output: Serialize;

    /// Constructs the calc from keyword settings.
    fn from_settings(settings: &Context) -> Result<Self, CalcError>
    where
        Self: Sized;

    fn calculate(&mut self, input: &Collection) -> Result<Vec<Self::Output>, CalcError>;
}

/// Anything that renders as one output record.
pub trait CalcResult {
    fn to_record(&self) -> Result<RawRecord, CalcError>;
}

impl<T: Serialize> CalcResult for T {
    fn to_record(&self) -> Result<RawRecord, CalcError> {
        match serde_json::to_value(self)? {
            JsonValue::Object(map) => Ok(map),
            other => Err(CalcError::NotARecord(other.to_string())),
        }
    }
}

/// Reads a required setting.
pub fn setting<T: DeserializeOwned>(settings: &Context, key: &str) -> Result<T, CalcError> {
    let value = settings
        .get(key)
        .ok_or_else(|| CalcError::MissingSetting(key.to_string()))?;
    serde_json::from_value(value.clone())
        .map_err(|e| CalcError::InvalidSettings(format!("{key}: {e}")))
}

/// Reads an optional setting, falling back to `default` when absent.
pub fn setting_or<T: DeserializeOwned>(settings: &Context, key: &str, default: T) -> Result<T, CalcError> {
    match settings.get(key) {
        Some(_) => setting(settings, key),
        None => Ok(default),
    }
}
