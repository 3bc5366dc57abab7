//! Configuration management for the roast companion server
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with ROAST__ prefix

use std::time::Duration;

use config::{ConfigError, Environment, File};
use roast_core::control::{RoastSettings, SafetySettings};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Document store configuration
    pub database: DatabaseConfig,

    /// Heater interlock limits
    pub safety: SafetyConfig,

    /// Session timing and detection
    pub roast: RoastConfig,

    /// Telemetry link behaviour
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL; profiles are kept in memory when unset
    pub url: Option<String>,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SafetyConfig {
    /// Absolute ceiling enforced in every mode (°C)
    pub system_max_temperature: f64,

    /// Heater trips this far below the operator's maximum
    pub trip_margin: f64,

    /// Heater control returns this far below the operator's maximum
    pub reset_margin: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RoastConfig {
    pub turning_point_arm_delay_ms: u64,
    pub turning_point_hysteresis: f64,
    pub roast_plan_delay_ms: u64,
    pub manual_history_capacity: usize,
    pub notification_buffer: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    /// Warn once after this long without a temperature reading
    pub stale_after_secs: Option<u64>,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("ROAST_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("safety.system_max_temperature", 300.0)?
            .set_default("safety.trip_margin", 10.0)?
            .set_default("safety.reset_margin", 20.0)?
            .set_default("roast.turning_point_arm_delay_ms", 5000)?
            .set_default("roast.turning_point_hysteresis", 1.0)?
            .set_default("roast.roast_plan_delay_ms", 800)?
            .set_default("roast.manual_history_capacity", 30)?
            .set_default("roast.notification_buffer", 50)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (ROAST__ prefix)
            .add_source(
                Environment::with_prefix("ROAST")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    pub fn safety_settings(&self) -> SafetySettings {
        SafetySettings {
            system_max_temperature: self.safety.system_max_temperature,
            trip_margin: self.safety.trip_margin,
            reset_margin: self.safety.reset_margin,
        }
    }

    pub fn roast_settings(&self) -> RoastSettings {
        RoastSettings {
            turning_point_arm_delay: Duration::from_millis(self.roast.turning_point_arm_delay_ms),
            turning_point_hysteresis: self.roast.turning_point_hysteresis,
            roast_plan_delay: Duration::from_millis(self.roast.roast_plan_delay_ms),
            manual_history_capacity: self.roast.manual_history_capacity,
        }
    }

    pub fn telemetry_stale_after(&self) -> Option<Duration> {
        self.telemetry.stale_after_secs.map(Duration::from_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            server: ServerConfig::default(),
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                min_connections: 2,
            },
            safety: SafetyConfig {
                system_max_temperature: 300.0,
                trip_margin: 10.0,
                reset_margin: 20.0,
            },
            roast: RoastConfig {
                turning_point_arm_delay_ms: 5000,
                turning_point_hysteresis: 1.0,
                roast_plan_delay_ms: 800,
                manual_history_capacity: 30,
                notification_buffer: 50,
            },
            telemetry: TelemetryConfig {
                stale_after_secs: None,
            },
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}
