//! Roast profile models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A saved roast profile (document collection `roastProfile`)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoastProfile {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub roast_level: Option<RoastLevel>,
    /// Total roast time in seconds
    pub duration: u32,
    pub target_temperature: f64,
    pub drop_temperature: f64,
    pub timestamp: DateTime<Utc>,
    pub roast_phase: RoastPhaseLog,
}

impl RoastProfile {
    /// Build a stored profile from validated input
    pub fn from_input(id: Uuid, input: RoastProfileInput, timestamp: DateTime<Utc>) -> Self {
        Self {
            id,
            name: input.name,
            description: input.description,
            roast_level: input.roast_level,
            duration: input.duration,
            target_temperature: input.target_temperature,
            drop_temperature: input.drop_temperature,
            timestamp,
            roast_phase: input.roast_phase,
        }
    }

    /// Development time ratio based on the logged first crack and the total duration
    pub fn development_ratio(&self) -> f64 {
        match self.roast_phase.first_crack.time {
            Some(first_crack) => crate::validation::development_ratio(first_crack, self.duration),
            None => 0.0,
        }
    }
}

/// Input for creating or overwriting a roast profile
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RoastProfileInput {
    #[validate(length(min = 1, message = "Profile name is required"))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub roast_level: Option<RoastLevel>,
    #[serde(default)]
    pub duration: u32,
    #[validate(range(min = 0.0, max = 300.0, message = "Target temperature must be between 0°C and 300°C"))]
    #[serde(default)]
    pub target_temperature: f64,
    #[validate(range(min = 0.0, max = 300.0, message = "Drop temperature must be between 0°C and 300°C"))]
    #[serde(default)]
    pub drop_temperature: f64,
    #[serde(default)]
    pub roast_phase: RoastPhaseLog,
}

/// Operator log of the four roast milestones
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoastPhaseLog {
    #[serde(default)]
    pub drying_phase: PhaseSpan,
    #[serde(default)]
    pub first_crack: CrackMark,
    #[serde(default)]
    pub development_phase: PhaseSpan,
    #[serde(default)]
    pub second_crack: CrackMark,
}

/// A logged phase with start and end readings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PhaseSpan {
    pub start_time: Option<u32>,
    pub start_temp: Option<f64>,
    pub end_time: Option<u32>,
    pub end_temp: Option<f64>,
    #[serde(default)]
    pub notes: String,
}

/// A single-moment milestone such as first or second crack
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CrackMark {
    pub time: Option<u32>,
    pub temp: Option<f64>,
    #[serde(default)]
    pub notes: String,
}

/// Roast levels
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub enum RoastLevel {
    Light,
    MediumLight,
    Medium,
    MediumDark,
    Dark,
}

impl RoastLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoastLevel::Light => "light",
            RoastLevel::MediumLight => "mediumLight",
            RoastLevel::Medium => "medium",
            RoastLevel::MediumDark => "mediumDark",
            RoastLevel::Dark => "dark",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "light" => Some(RoastLevel::Light),
            "mediumLight" => Some(RoastLevel::MediumLight),
            "medium" => Some(RoastLevel::Medium),
            "mediumDark" => Some(RoastLevel::MediumDark),
            "dark" => Some(RoastLevel::Dark),
            _ => None,
        }
    }
}

impl std::fmt::Display for RoastLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoastLevel::Light => write!(f, "Light"),
            RoastLevel::MediumLight => write!(f, "Medium Light"),
            RoastLevel::Medium => write!(f, "Medium"),
            RoastLevel::MediumDark => write!(f, "Medium Dark"),
            RoastLevel::Dark => write!(f, "Dark"),
        }
    }
}
