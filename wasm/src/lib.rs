//! WebAssembly module for the roast companion
//!
//! Provides client-side computation for:
//! - Roast plan and pre-heat form validation
//! - Elapsed time formatting
//! - Turning point detection over a recorded temperature series
//! - Dashboard metrics and development ratio

use std::time::Duration;

use serde::Serialize;
use wasm_bindgen::prelude::*;

use roast_core::control::find_turning_point;
use roast_core::{calculate_metrics, RoastPlan, RoastProfile, TempSample};

// Re-export shared types for use in JavaScript
pub use roast_core::models::*;
pub use roast_core::types::*;
pub use roast_core::validation::*;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    // Set up panic hook for better error messages in browser console
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

fn parse<T: serde::de::DeserializeOwned>(json: &str, what: &str) -> Result<T, JsValue> {
    serde_json::from_str(json).map_err(|e| {
        let message = format!("Invalid {} JSON: {}", what, e);
        warn(&message);
        JsValue::from_str(&message)
    })
}

fn to_json<T: Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

#[cfg(target_arch = "wasm32")]
fn warn(message: &str) {
    web_sys::console::warn_1(&JsValue::from_str(message));
}

#[cfg(not(target_arch = "wasm32"))]
fn warn(_message: &str) {}

/// Validate a roast plan; returns a JSON array of field errors, empty when valid
#[wasm_bindgen]
pub fn validate_roast_plan_json(plan_json: &str) -> Result<String, JsValue> {
    let plan: RoastPlan = parse(plan_json, "roast plan")?;
    let errors = validate_roast_plan(&plan).err().unwrap_or_default();
    to_json(&errors)
}

/// Pre-heat target error message, or `None` when the target is valid
#[wasm_bindgen]
pub fn check_pre_heat_target(temperature: f64) -> Option<String> {
    validate_pre_heat_target(temperature).err().map(|e| e.message)
}

/// Format seconds as `m:ss`
#[wasm_bindgen]
pub fn format_elapsed(seconds: u32) -> String {
    format_elapsed_time(seconds)
}

#[wasm_bindgen]
pub fn elapsed_minutes(seconds: u32) -> f64 {
    seconds_to_minutes(seconds)
}

/// Find the turning point in a recorded series of temperature samples.
///
/// Returns the JSON `{temperature, detectedAt}` or `null`.
#[wasm_bindgen]
pub fn detect_turning_point(
    samples_json: &str,
    arm_delay_secs: u32,
    hysteresis: f64,
) -> Result<String, JsValue> {
    let samples: Vec<TempSample> = parse(samples_json, "temperature samples")?;
    let series: Vec<(u32, f64)> = samples.iter().map(|s| (s.elapsed, s.temp)).collect();
    let turning_point = find_turning_point(
        &series,
        Duration::from_secs(u64::from(arm_delay_secs)),
        hysteresis,
    );
    to_json(&turning_point)
}

/// Dashboard metrics over profiles ordered newest first; `null` when empty
#[wasm_bindgen]
pub fn calculate_dashboard_metrics(profiles_json: &str) -> Result<String, JsValue> {
    let profiles: Vec<RoastProfile> = parse(profiles_json, "roast profiles")?;
    to_json(&calculate_metrics(&profiles))
}

/// Development time ratio in percent
#[wasm_bindgen]
pub fn calculate_development_ratio(first_crack_time: u32, drop_time: u32) -> f64 {
    development_ratio(first_crack_time, drop_time)
}

#[wasm_bindgen]
pub fn is_development_ratio_recommended(first_crack_time: u32, drop_time: u32) -> bool {
    is_recommended_development_ratio(first_crack_time, drop_time)
}
