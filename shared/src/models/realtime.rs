//! Realtime store fields shared by the roaster, the controllers and the UI

use serde::{Deserialize, Serialize};

/// Namespace every roaster field lives under
pub const REALTIME_NAMESPACE: &str = "manualRoast";

/// A named scalar field in the realtime store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RealtimeField {
    Temperature,
    Heater,
    Motor,
    PidControl,
    Status,
    Phase,
    PreHeatTargetTemp,
    DryingTargetTemp,
    DryingTargetTime,
    FirstCrackTargetTemp,
    FirstCrackTargetTime,
    DropTargetTemp,
    DropTargetTime,
    TurningPoint,
    BeansInserted,
    TargetTemp,
    MaxSafetyTemp,
}

impl RealtimeField {
    pub const ALL: [RealtimeField; 17] = [
        RealtimeField::Temperature,
        RealtimeField::Heater,
        RealtimeField::Motor,
        RealtimeField::PidControl,
        RealtimeField::Status,
        RealtimeField::Phase,
        RealtimeField::PreHeatTargetTemp,
        RealtimeField::DryingTargetTemp,
        RealtimeField::DryingTargetTime,
        RealtimeField::FirstCrackTargetTemp,
        RealtimeField::FirstCrackTargetTime,
        RealtimeField::DropTargetTemp,
        RealtimeField::DropTargetTime,
        RealtimeField::TurningPoint,
        RealtimeField::BeansInserted,
        RealtimeField::TargetTemp,
        RealtimeField::MaxSafetyTemp,
    ];

    /// Key of the field inside the namespace
    pub fn key(&self) -> &'static str {
        match self {
            RealtimeField::Temperature => "temperature",
            RealtimeField::Heater => "heater",
            RealtimeField::Motor => "motor",
            RealtimeField::PidControl => "pidControl",
            RealtimeField::Status => "status",
            RealtimeField::Phase => "phase",
            RealtimeField::PreHeatTargetTemp => "preHeatTargetTemp",
            RealtimeField::DryingTargetTemp => "dryingTargetTemp",
            RealtimeField::DryingTargetTime => "dryingTargetTime",
            RealtimeField::FirstCrackTargetTemp => "firstCrackTargetTemp",
            RealtimeField::FirstCrackTargetTime => "firstCrackTargetTime",
            RealtimeField::DropTargetTemp => "dropTargetTemp",
            RealtimeField::DropTargetTime => "dropTargetTime",
            RealtimeField::TurningPoint => "turningPoint",
            RealtimeField::BeansInserted => "beansInserted",
            RealtimeField::TargetTemp => "targetTemp",
            RealtimeField::MaxSafetyTemp => "maxSafetyTemp",
        }
    }

    /// Full path, e.g. `manualRoast/temperature`
    pub fn path(&self) -> String {
        format!("{}/{}", REALTIME_NAMESPACE, self.key())
    }

    /// Accepts either a bare key or a namespaced path
    pub fn from_key(key: &str) -> Option<Self> {
        let key = key
            .strip_prefix(REALTIME_NAMESPACE)
            .and_then(|rest| rest.strip_prefix('/'))
            .unwrap_or(key);
        Self::ALL.iter().copied().find(|field| field.key() == key)
    }
}

impl std::fmt::Display for RealtimeField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path())
    }
}

/// Scalar value stored in a realtime field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl FieldValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        FieldValue::Number(f64::from(value))
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_paths_are_namespaced() {
        assert_eq!(RealtimeField::Temperature.path(), "manualRoast/temperature");
        assert_eq!(RealtimeField::PreHeatTargetTemp.path(), "manualRoast/preHeatTargetTemp");
    }

    #[test]
    fn test_from_key_accepts_bare_and_namespaced() {
        assert_eq!(RealtimeField::from_key("heater"), Some(RealtimeField::Heater));
        assert_eq!(
            RealtimeField::from_key("manualRoast/turningPoint"),
            Some(RealtimeField::TurningPoint)
        );
        assert_eq!(RealtimeField::from_key("manualRoast/unknown"), None);
    }

    #[test]
    fn test_every_field_key_is_unique() {
        let mut keys: Vec<_> = RealtimeField::ALL.iter().map(|f| f.key()).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), RealtimeField::ALL.len());
    }

    #[test]
    fn test_field_value_untagged_json() {
        assert_eq!(serde_json::to_string(&FieldValue::from(true)).unwrap(), "true");
        assert_eq!(serde_json::to_string(&FieldValue::from(150.5)).unwrap(), "150.5");
        let parsed: FieldValue = serde_json::from_str("\"drying\"").unwrap();
        assert_eq!(parsed.as_str(), Some("drying"));
    }
}
