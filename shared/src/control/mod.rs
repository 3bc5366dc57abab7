//! Roast control machines
//!
//! The machines in this module are synchronous and own no I/O. Every
//! operation mutates local state and returns the [`Effect`]s the caller must
//! carry out: realtime-store writes, operator notifications, bus events and
//! deferred actions.

pub mod auto;
pub mod detector;
pub mod interlock;
pub mod manual;

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::models::{FieldValue, Modal, Notification, RealtimeField, RoastStatus};

pub use auto::AutoRoast;
pub use detector::{find_turning_point, DetectorState, TurningPoint, TurningPointDetector};
pub use interlock::{InterlockReport, InterlockSignal, SafetyInterlock};
pub use manual::ManualRoast;

/// Side effect requested by a control machine
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Write a scalar to the realtime store
    Write { field: RealtimeField, value: FieldValue },
    Notify(Notification),
    Publish(RoastEvent),
    /// Deliver `action` back to the machine after `delay`
    Schedule { delay: Duration, action: Deferred },
}

/// Actions a machine asks to have delivered later
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deferred {
    /// Open the roast-plan dialog for the session with this generation
    OpenRoastPlan { session: u64 },
}

/// Events published on the roast event bus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum RoastEvent {
    PhaseChanged { from: RoastStatus, to: RoastStatus },
    ModalOpened { modal: Modal },
    ModalClosed { modal: Modal },
    TurningPointDetected { temperature: f64 },
    HeaterInterlocked { temperature: f64 },
    HeaterControlRestored { temperature: f64 },
    ManualStarted { target_temperature: f64, max_safety_temp: f64 },
    ManualStopped { duration: u32, drop_temperature: f64 },
    SessionReset,
}

/// Absolute limits and hysteresis band of the heater interlock
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SafetySettings {
    pub system_max_temperature: f64,
    /// Heater trips at `max_safety_temp - trip_margin`
    pub trip_margin: f64,
    /// Heater control returns below `max_safety_temp - reset_margin`
    pub reset_margin: f64,
}

impl Default for SafetySettings {
    fn default() -> Self {
        Self {
            system_max_temperature: 300.0,
            trip_margin: 10.0,
            reset_margin: 20.0,
        }
    }
}

/// Timing and detection parameters for roast sessions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoastSettings {
    pub turning_point_arm_delay: Duration,
    pub turning_point_hysteresis: f64,
    pub roast_plan_delay: Duration,
    pub manual_history_capacity: usize,
}

impl Default for RoastSettings {
    fn default() -> Self {
        Self {
            turning_point_arm_delay: Duration::from_secs(5),
            turning_point_hysteresis: 1.0,
            roast_plan_delay: Duration::from_millis(800),
            manual_history_capacity: 30,
        }
    }
}

/// Accumulates effects in the order they were requested
#[derive(Debug, Default)]
pub(crate) struct Effects(Vec<Effect>);

impl Effects {
    pub(crate) fn new() -> Self {
        Self(Vec::new())
    }

    pub(crate) fn write(&mut self, field: RealtimeField, value: impl Into<FieldValue>) {
        self.0.push(Effect::Write {
            field,
            value: value.into(),
        });
    }

    pub(crate) fn notify(&mut self, notification: Notification) {
        self.0.push(Effect::Notify(notification));
    }

    pub(crate) fn publish(&mut self, event: RoastEvent) {
        self.0.push(Effect::Publish(event));
    }

    pub(crate) fn schedule(&mut self, delay: Duration, action: Deferred) {
        self.0.push(Effect::Schedule { delay, action });
    }

    pub(crate) fn into_vec(self) -> Vec<Effect> {
        self.0
    }
}

impl Effect {
    pub fn as_write(&self) -> Option<(RealtimeField, &FieldValue)> {
        match self {
            Effect::Write { field, value } => Some((*field, value)),
            _ => None,
        }
    }

    pub fn as_notification(&self) -> Option<&Notification> {
        match self {
            Effect::Notify(notification) => Some(notification),
            _ => None,
        }
    }

    pub fn as_event(&self) -> Option<&RoastEvent> {
        match self {
            Effect::Publish(event) => Some(event),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_is_tagged() {
        let event = RoastEvent::PhaseChanged {
            from: RoastStatus::Drying,
            to: RoastStatus::FirstCrack,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "phaseChanged");
        assert_eq!(json["to"], "firstCrack");
    }

    #[test]
    fn test_effects_keep_request_order() {
        let mut fx = Effects::new();
        fx.write(RealtimeField::Heater, false);
        fx.publish(RoastEvent::SessionReset);
        let effects = fx.into_vec();
        assert!(effects[0].as_write().is_some());
        assert_eq!(effects[1].as_event(), Some(&RoastEvent::SessionReset));
    }
}
