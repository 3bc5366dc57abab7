//! Manual-roast session models

use serde::{Deserialize, Serialize};

use super::roast::{CrackMark, PhaseSpan, RoastLevel, RoastPhaseLog};
use crate::types::{TempSample, TempStats};

/// Operator settings chosen when a manual roast starts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualRoastSettings {
    pub target_temperature: f64,
    pub max_safety_temp: f64,
    pub auto_shutoff_enabled: bool,
    pub timer_enabled: bool,
    /// Timer length in minutes
    pub timer_duration: u32,
}

impl Default for ManualRoastSettings {
    fn default() -> Self {
        Self {
            target_temperature: 180.0,
            max_safety_temp: 220.0,
            auto_shutoff_enabled: true,
            timer_enabled: false,
            timer_duration: 5,
        }
    }
}

/// Dialogs of the manual control surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ManualDialog {
    StopConfirm,
    SaveData,
    /// The stopped roast is being written to the profile store
    Saving,
}

/// Free-form notes captured while roasting
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoastLog {
    pub description: String,
    pub roast_level: Option<RoastLevel>,
    pub roast_phase: RoastPhaseLog,
}

impl RoastLog {
    pub fn apply(&mut self, patch: RoastLogPatch) {
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(level) = patch.roast_level {
            self.roast_level = Some(level);
        }
        if let Some(span) = patch.drying_phase {
            self.roast_phase.drying_phase = span;
        }
        if let Some(mark) = patch.first_crack {
            self.roast_phase.first_crack = mark;
        }
        if let Some(span) = patch.development_phase {
            self.roast_phase.development_phase = span;
        }
        if let Some(mark) = patch.second_crack {
            self.roast_phase.second_crack = mark;
        }
    }
}

/// Partial update to the roast log; absent fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoastLogPatch {
    pub description: Option<String>,
    pub roast_level: Option<RoastLevel>,
    pub drying_phase: Option<PhaseSpan>,
    pub first_crack: Option<CrackMark>,
    pub development_phase: Option<PhaseSpan>,
    pub second_crack: Option<CrackMark>,
}

/// Values captured the moment a manual roast is stopped
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoppedRoast {
    pub duration: u32,
    pub drop_temperature: f64,
    pub target_temperature: f64,
    pub log: RoastLog,
}

/// Save-dialog form; missing fields fall back to the captured log
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRoastInput {
    pub name: String,
    pub description: Option<String>,
    pub roast_level: Option<RoastLevel>,
    pub roast_phase: Option<RoastPhaseLog>,
}

/// Read-only view of the manual session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualSnapshot {
    pub is_roasting: bool,
    pub heater: bool,
    pub motor: bool,
    pub temperature: f64,
    pub elapsed_time: u32,
    pub settings: ManualRoastSettings,
    pub heater_control_disabled: bool,
    pub is_target_reached: bool,
    pub is_nearing_safety_limit: bool,
    pub timer_notification_sent: bool,
    pub stats: Option<TempStats>,
    pub temp_history: Vec<TempSample>,
    pub log: RoastLog,
    pub dialog: Option<ManualDialog>,
    pub stopped: Option<StoppedRoast>,
}

impl ManualSnapshot {
    pub fn is_active(&self) -> bool {
        self.is_roasting || self.stopped.is_some()
    }
}
