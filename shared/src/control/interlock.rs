//! Heater safety interlock
//!
//! Evaluates each temperature reading against the operator's limits and the
//! absolute system ceiling. Alerts are edge-triggered; the heater is forced
//! off on every reading inside the trip band.

use super::{RoastEvent, SafetySettings};
use crate::models::Notification;

/// Something the interlock noticed on a reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InterlockSignal {
    TargetReached { temperature: f64, target: f64 },
    NearingSafetyLimit { temperature: f64, max_safety_temp: f64 },
    AutoShutoff { temperature: f64 },
    CeilingExceeded { temperature: f64 },
    Restored { temperature: f64 },
}

impl InterlockSignal {
    pub fn notification(&self) -> Notification {
        match *self {
            InterlockSignal::TargetReached { target, .. } => Notification::info(
                "Target Temperature Reached",
                format!("Temperature has reached your target of {}°C.", target),
            ),
            InterlockSignal::NearingSafetyLimit {
                temperature,
                max_safety_temp,
            } => Notification::warning(
                "Approaching Maximum Temperature",
                format!(
                    "Temperature is nearing the safety limit. Only {:.1}°C before the heater shuts off.",
                    (max_safety_temp - temperature).max(0.0)
                ),
            )
            .persistent(),
            InterlockSignal::AutoShutoff { .. } => Notification::error(
                "Heater Auto Shutoff Activated",
                "The heater was turned off for safety. Heater control returns once the temperature drops.",
            ),
            InterlockSignal::CeilingExceeded { temperature } => Notification::error(
                "System Maximum Temperature Exceeded",
                format!(
                    "The heater was turned off at {:.1}°C. Let the roaster cool down and inspect it.",
                    temperature
                ),
            )
            .persistent(),
            InterlockSignal::Restored { .. } => Notification::success(
                "Heater Control Restored",
                "Temperature has dropped to a safe level. Heater control is available again.",
            ),
        }
    }

    /// Bus event for signals that change heater availability
    pub fn event(&self) -> Option<RoastEvent> {
        match *self {
            InterlockSignal::AutoShutoff { temperature }
            | InterlockSignal::CeilingExceeded { temperature } => {
                Some(RoastEvent::HeaterInterlocked { temperature })
            }
            InterlockSignal::Restored { temperature } => {
                Some(RoastEvent::HeaterControlRestored { temperature })
            }
            _ => None,
        }
    }

    pub fn is_trip(&self) -> bool {
        matches!(
            self,
            InterlockSignal::AutoShutoff { .. } | InterlockSignal::CeilingExceeded { .. }
        )
    }
}

/// Outcome of evaluating one reading
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InterlockReport {
    pub signals: Vec<InterlockSignal>,
    /// The heater must be off after this reading
    pub force_heater_off: bool,
}

impl InterlockReport {
    /// Whether this reading moved the interlock into the locked state
    pub fn tripped(&self) -> bool {
        self.signals.iter().any(InterlockSignal::is_trip)
    }
}

#[derive(Debug, Clone)]
pub struct SafetyInterlock {
    safety: SafetySettings,
    target_temperature: Option<f64>,
    max_safety_temp: Option<f64>,
    auto_shutoff: bool,
    target_reached: bool,
    nearing_limit: bool,
    heater_disabled: bool,
    ceiling_tripped: bool,
}

impl SafetyInterlock {
    /// Full interlock for a manual session
    pub fn new(
        safety: SafetySettings,
        target_temperature: f64,
        max_safety_temp: f64,
        auto_shutoff: bool,
    ) -> Self {
        Self {
            safety,
            target_temperature: Some(target_temperature),
            max_safety_temp: Some(max_safety_temp),
            auto_shutoff,
            target_reached: false,
            nearing_limit: false,
            heater_disabled: false,
            ceiling_tripped: false,
        }
    }

    /// Only the absolute system ceiling is enforced
    pub fn ceiling_only(safety: SafetySettings) -> Self {
        Self {
            safety,
            target_temperature: None,
            max_safety_temp: None,
            auto_shutoff: false,
            target_reached: false,
            nearing_limit: false,
            heater_disabled: false,
            ceiling_tripped: false,
        }
    }

    pub fn is_heater_disabled(&self) -> bool {
        self.heater_disabled
    }

    pub fn is_target_reached(&self) -> bool {
        self.target_reached
    }

    pub fn is_nearing_limit(&self) -> bool {
        self.nearing_limit
    }

    /// Temperature at which the heater is cut
    pub fn trip_temperature(&self) -> f64 {
        match self.max_safety_temp {
            Some(max) => max - self.safety.trip_margin,
            None => self.safety.system_max_temperature,
        }
    }

    /// Temperature the reading must fall below for heater control to return
    pub fn restore_temperature(&self) -> f64 {
        match self.max_safety_temp {
            Some(max) => max - self.safety.reset_margin,
            None => self.safety.system_max_temperature - self.safety.reset_margin,
        }
    }

    pub fn evaluate(&mut self, temperature: f64) -> InterlockReport {
        let mut report = InterlockReport::default();

        if let Some(target) = self.target_temperature {
            if !self.target_reached && temperature >= target {
                self.target_reached = true;
                report
                    .signals
                    .push(InterlockSignal::TargetReached { temperature, target });
            }
        }

        if let Some(max_safety_temp) = self.max_safety_temp {
            if temperature >= self.trip_temperature() {
                if !self.nearing_limit {
                    self.nearing_limit = true;
                    report.signals.push(InterlockSignal::NearingSafetyLimit {
                        temperature,
                        max_safety_temp,
                    });
                }
                if self.auto_shutoff {
                    report.force_heater_off = true;
                    if !self.heater_disabled {
                        self.heater_disabled = true;
                        report.signals.push(InterlockSignal::AutoShutoff { temperature });
                    }
                }
            }
        }

        let ceiling = self.safety.system_max_temperature;
        if temperature >= ceiling {
            report.force_heater_off = true;
            self.heater_disabled = true;
            if !self.ceiling_tripped {
                self.ceiling_tripped = true;
                report
                    .signals
                    .push(InterlockSignal::CeilingExceeded { temperature });
            }
        } else if temperature < ceiling - self.safety.reset_margin {
            self.ceiling_tripped = false;
        }

        if self.heater_disabled
            && !report.force_heater_off
            && temperature < self.restore_temperature()
        {
            self.heater_disabled = false;
            self.nearing_limit = false;
            report.signals.push(InterlockSignal::Restored { temperature });
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manual_interlock() -> SafetyInterlock {
        SafetyInterlock::new(SafetySettings::default(), 180.0, 220.0, true)
    }

    #[test]
    fn test_band_edges() {
        let manual = manual_interlock();
        assert_eq!(manual.trip_temperature(), 210.0);
        assert_eq!(manual.restore_temperature(), 200.0);

        let auto = SafetyInterlock::ceiling_only(SafetySettings::default());
        assert_eq!(auto.trip_temperature(), 300.0);
        assert_eq!(auto.restore_temperature(), 280.0);
    }

    #[test]
    fn test_trips_at_210_and_restores_at_199() {
        let mut interlock = manual_interlock();

        let report = interlock.evaluate(209.9);
        assert!(!report.force_heater_off);

        let report = interlock.evaluate(210.0);
        assert!(report.force_heater_off);
        assert!(report.tripped());
        assert!(interlock.is_heater_disabled());

        // Inside the hysteresis band nothing changes
        for temp in [205.0, 200.0, 200.5] {
            let report = interlock.evaluate(temp);
            assert!(report.signals.is_empty());
            assert!(interlock.is_heater_disabled());
        }

        let report = interlock.evaluate(199.0);
        assert_eq!(
            report.signals,
            vec![InterlockSignal::Restored { temperature: 199.0 }]
        );
        assert!(!interlock.is_heater_disabled());
        assert!(!interlock.is_nearing_limit());
    }

    #[test]
    fn test_trip_alert_fires_once_but_heater_forced_every_reading() {
        let mut interlock = manual_interlock();
        let first = interlock.evaluate(212.0);
        assert!(first.tripped());

        let second = interlock.evaluate(215.0);
        assert!(second.force_heater_off);
        assert!(!second.tripped());
        assert!(second.signals.is_empty());
    }

    #[test]
    fn test_target_reached_is_one_shot() {
        let mut interlock = manual_interlock();
        let report = interlock.evaluate(180.0);
        assert!(matches!(
            report.signals[0],
            InterlockSignal::TargetReached { target, .. } if target == 180.0
        ));
        assert!(interlock.evaluate(181.0).signals.is_empty());
        assert!(interlock.evaluate(180.0).signals.is_empty());
    }

    #[test]
    fn test_without_auto_shutoff_only_warns() {
        let mut interlock = SafetyInterlock::new(SafetySettings::default(), 180.0, 220.0, false);
        let report = interlock.evaluate(215.0);
        assert!(!report.force_heater_off);
        assert!(report
            .signals
            .iter()
            .any(|s| matches!(s, InterlockSignal::NearingSafetyLimit { .. })));
        assert!(!interlock.is_heater_disabled());
    }

    #[test]
    fn test_ceiling_locks_regardless_of_auto_shutoff() {
        let mut interlock = SafetyInterlock::new(SafetySettings::default(), 180.0, 220.0, false);
        let report = interlock.evaluate(300.0);
        assert!(report.force_heater_off);
        let ceiling = report
            .signals
            .iter()
            .find(|s| matches!(s, InterlockSignal::CeilingExceeded { .. }))
            .unwrap();
        assert!(!ceiling.notification().auto_dismiss);
        assert!(interlock.is_heater_disabled());
    }

    #[test]
    fn test_ceiling_only_restores_below_reset_band() {
        let mut interlock = SafetyInterlock::ceiling_only(SafetySettings::default());
        assert!(interlock.evaluate(250.0).signals.is_empty());

        let report = interlock.evaluate(301.0);
        assert!(report.tripped());
        assert!(!report.signals[0].notification().auto_dismiss);

        assert!(interlock.evaluate(285.0).signals.is_empty());
        assert!(interlock.is_heater_disabled());

        let report = interlock.evaluate(279.0);
        assert_eq!(
            report.signals,
            vec![InterlockSignal::Restored { temperature: 279.0 }]
        );
    }
}
