//! Auto-roast session models

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::types::TempSample;

/// Roast status; also used as the displayed phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RoastStatus {
    Idle,
    Preheating,
    Drying,
    FirstCrack,
    Development,
    Finished,
}

impl RoastStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoastStatus::Idle => "idle",
            RoastStatus::Preheating => "preheating",
            RoastStatus::Drying => "drying",
            RoastStatus::FirstCrack => "firstCrack",
            RoastStatus::Development => "development",
            RoastStatus::Finished => "finished",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "idle" => Some(RoastStatus::Idle),
            "preheating" => Some(RoastStatus::Preheating),
            "drying" => Some(RoastStatus::Drying),
            "firstCrack" => Some(RoastStatus::FirstCrack),
            "development" => Some(RoastStatus::Development),
            "finished" => Some(RoastStatus::Finished),
            _ => None,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, RoastStatus::Idle)
    }
}

impl std::fmt::Display for RoastStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single confirmation dialog that may be open at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Modal {
    PreHeatEntry,
    BeansInserted,
    RoastPlanEntry,
    TurningPointAck,
    FinishConfirm,
}

impl Modal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Modal::PreHeatEntry => "preHeat",
            Modal::BeansInserted => "beansInserted",
            Modal::RoastPlanEntry => "roastPlan",
            Modal::TurningPointAck => "turningPointDetected",
            Modal::FinishConfirm => "finishRoasting",
        }
    }

    /// Whether the operator may close the dialog without confirming it
    pub fn is_cancellable(&self) -> bool {
        matches!(
            self,
            Modal::PreHeatEntry | Modal::FinishConfirm | Modal::TurningPointAck
        )
    }
}

/// Phase targets entered after the turning point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RoastPlan {
    #[validate(range(min = 100.0, max = 200.0, message = "Temperature must be between 100°C and 200°C"))]
    pub drying_target_temp: f64,
    #[validate(range(min = 60, message = "Time must be at least 60 seconds"))]
    pub drying_target_time: u32,
    #[validate(range(min = 150.0, max = 220.0, message = "Temperature must be between 150°C and 220°C"))]
    pub first_crack_target_temp: f64,
    #[validate(range(min = 60, message = "Time must be at least 60 seconds"))]
    pub first_crack_target_time: u32,
    #[validate(range(min = 170.0, max = 240.0, message = "Temperature must be between 170°C and 240°C"))]
    pub drop_target_temp: f64,
    #[validate(range(min = 300, message = "Time must be at least 300 seconds"))]
    pub drop_target_time: u32,
}

impl Default for RoastPlan {
    fn default() -> Self {
        Self {
            drying_target_temp: 150.0,
            drying_target_time: 240,
            first_crack_target_temp: 180.0,
            first_crack_target_time: 180,
            drop_target_temp: 200.0,
            drop_target_time: 600,
        }
    }
}

/// Read-only view of the auto-roast session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoastSnapshot {
    pub status: RoastStatus,
    pub phase: RoastStatus,
    pub heater: bool,
    pub motor: bool,
    pub pid_control: bool,
    pub temperature: f64,
    pub elapsed_time: u32,
    pub pre_heat_target_temp: f64,
    pub drying_target_temp: f64,
    pub drying_target_time: u32,
    pub first_crack_target_temp: f64,
    pub first_crack_target_time: u32,
    pub drop_target_temp: f64,
    pub drop_target_time: u32,
    pub turning_point: Option<f64>,
    pub heater_control_disabled: bool,
    pub is_modal_open: bool,
    pub modal_type: Option<Modal>,
    pub temp_history: Vec<TempSample>,
}

impl RoastSnapshot {
    pub fn is_active(&self) -> bool {
        !self.status.is_idle()
    }
}
