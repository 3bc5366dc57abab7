//! Validation of operator input for the roast control surfaces
//!
//! Every check runs synchronously before any state changes. A rejected form
//! leaves the session untouched and reports field-level errors.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

use crate::control::SafetySettings;
use crate::models::{ManualRoastSettings, RoastPlan, RoastProfileInput};

/// A rejected form field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Flatten `validator` output into field errors sorted by field name
pub fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut out: Vec<FieldError> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |err| {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| err.code.to_string());
                FieldError::new(field, message)
            })
        })
        .collect();
    out.sort_by(|a, b| a.field.cmp(&b.field));
    out
}

// ============================================================================
// Auto Roast
// ============================================================================

/// Pre-heat target must be between 100°C and 200°C
pub fn validate_pre_heat_target(temperature: f64) -> Result<(), FieldError> {
    if !(100.0..=200.0).contains(&temperature) {
        return Err(FieldError::new(
            "pre_heat_target_temp",
            "Temperature must be between 100°C and 200°C",
        ));
    }
    Ok(())
}

/// Validate a roast plan: per-field ranges, strictly increasing phase
/// temperatures, and drying + first crack time strictly below drop time
pub fn validate_roast_plan(plan: &RoastPlan) -> Result<(), Vec<FieldError>> {
    let mut errors = match plan.validate() {
        Ok(()) => Vec::new(),
        Err(e) => field_errors(&e),
    };

    if plan.drying_target_temp >= plan.first_crack_target_temp {
        errors.push(FieldError::new(
            "first_crack_target_temp",
            "Temperature must be above the drying target temperature",
        ));
    }
    if plan.first_crack_target_temp >= plan.drop_target_temp {
        errors.push(FieldError::new(
            "first_crack_target_temp",
            "Temperature exceeds drop target temperature",
        ));
    }
    let phase_time = u64::from(plan.drying_target_time) + u64::from(plan.first_crack_target_time);
    if phase_time >= u64::from(plan.drop_target_time) {
        errors.push(FieldError::new(
            "drying_target_time",
            "Total time exceeds drop target time",
        ));
        errors.push(FieldError::new(
            "first_crack_target_time",
            "Total time exceeds drop target time",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

// ============================================================================
// Manual Roast
// ============================================================================

/// Manual start form; bounds derive from the system ceiling
pub fn validate_manual_settings(
    settings: &ManualRoastSettings,
    safety: &SafetySettings,
) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();
    let ceiling = safety.system_max_temperature;

    let target_max = ceiling - 20.0;
    if !(50.0..=target_max).contains(&settings.target_temperature) {
        errors.push(FieldError::new(
            "target_temperature",
            format!("Temperature must be between 50°C and {}°C", target_max),
        ));
    }

    let safety_max = ceiling - 10.0;
    if !(100.0..=safety_max).contains(&settings.max_safety_temp) {
        errors.push(FieldError::new(
            "max_safety_temp",
            format!("Temperature must be between 100°C and {}°C", safety_max),
        ));
    }

    if settings.timer_enabled && !(1..=60).contains(&settings.timer_duration) {
        errors.push(FieldError::new(
            "timer_duration",
            "Duration must be between 1 and 60 minutes",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

// ============================================================================
// Profiles
// ============================================================================

/// Validate a profile before it is written to the document store
pub fn validate_profile_input(input: &RoastProfileInput) -> Result<(), Vec<FieldError>> {
    let mut errors = match input.validate() {
        Ok(()) => Vec::new(),
        Err(e) => field_errors(&e),
    };
    if input.name.trim().is_empty() && !errors.iter().any(|e| e.field == "name") {
        errors.push(FieldError::new("name", "Profile name is required"));
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Development time ratio in percent: time after first crack over total time
pub fn development_ratio(first_crack_time: u32, drop_time: u32) -> f64 {
    if first_crack_time == 0 || drop_time == 0 || first_crack_time >= drop_time {
        return 0.0;
    }
    f64::from(drop_time - first_crack_time) / f64::from(drop_time) * 100.0
}

/// Recommended development ratio window is 15–30%
pub fn is_recommended_development_ratio(first_crack_time: u32, drop_time: u32) -> bool {
    let ratio = development_ratio(first_crack_time, drop_time);
    (15.0..=30.0).contains(&ratio)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(drying_time: u32, first_crack_time: u32, drop_time: u32) -> RoastPlan {
        RoastPlan {
            drying_target_time: drying_time,
            first_crack_target_time: first_crack_time,
            drop_target_time: drop_time,
            ..RoastPlan::default()
        }
    }

    #[test]
    fn test_plan_rejected_when_phase_time_exceeds_drop_time() {
        let errors = validate_roast_plan(&plan(240, 180, 300)).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "drying_target_time"));
        assert!(errors.iter().any(|e| e.field == "first_crack_target_time"));
    }

    #[test]
    fn test_plan_accepted_with_room_for_development() {
        assert!(validate_roast_plan(&plan(240, 180, 600)).is_ok());
    }

    #[test]
    fn test_plan_rejected_when_phase_time_equals_drop_time() {
        assert!(validate_roast_plan(&plan(240, 180, 420)).is_err());
    }

    #[test]
    fn test_plan_temperatures_must_increase() {
        let p = RoastPlan {
            drying_target_temp: 190.0,
            first_crack_target_temp: 180.0,
            ..RoastPlan::default()
        };
        let errors = validate_roast_plan(&p).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "first_crack_target_temp");

        let p = RoastPlan {
            first_crack_target_temp: 210.0,
            drop_target_temp: 205.0,
            ..RoastPlan::default()
        };
        assert!(validate_roast_plan(&p).is_err());
    }

    #[test]
    fn test_plan_field_ranges() {
        let p = RoastPlan {
            drying_target_temp: 90.0,
            ..RoastPlan::default()
        };
        let errors = validate_roast_plan(&p).unwrap_err();
        assert_eq!(errors[0].field, "drying_target_temp");

        let p = RoastPlan {
            drying_target_time: 30,
            ..RoastPlan::default()
        };
        assert!(validate_roast_plan(&p).is_err());
    }

    #[test]
    fn test_pre_heat_target_range() {
        assert!(validate_pre_heat_target(150.0).is_ok());
        assert!(validate_pre_heat_target(100.0).is_ok());
        assert!(validate_pre_heat_target(99.5).is_err());
        assert!(validate_pre_heat_target(201.0).is_err());
    }

    #[test]
    fn test_manual_settings_bounds_follow_ceiling() {
        let safety = SafetySettings::default();
        assert!(validate_manual_settings(&ManualRoastSettings::default(), &safety).is_ok());

        let too_hot = ManualRoastSettings {
            target_temperature: 285.0,
            max_safety_temp: 295.0,
            ..ManualRoastSettings::default()
        };
        let errors = validate_manual_settings(&too_hot, &safety).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_manual_timer_checked_only_when_enabled() {
        let safety = SafetySettings::default();
        let disabled = ManualRoastSettings {
            timer_enabled: false,
            timer_duration: 0,
            ..ManualRoastSettings::default()
        };
        assert!(validate_manual_settings(&disabled, &safety).is_ok());

        let enabled = ManualRoastSettings {
            timer_enabled: true,
            timer_duration: 61,
            ..ManualRoastSettings::default()
        };
        assert!(validate_manual_settings(&enabled, &safety).is_err());
    }

    #[test]
    fn test_development_ratio() {
        assert_eq!(development_ratio(480, 600), 20.0);
        assert_eq!(development_ratio(0, 600), 0.0);
        assert_eq!(development_ratio(600, 600), 0.0);
        assert!(is_recommended_development_ratio(480, 600));
        assert!(!is_recommended_development_ratio(580, 600));
    }
}
