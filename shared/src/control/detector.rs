//! Turning-point detection
//!
//! After beans are charged the probe reading falls, bottoms out, then
//! climbs. The detector ignores readings for an arm delay, tracks the
//! minimum, and latches that minimum once a reading rises more than the
//! hysteresis above it.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Detector lifecycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DetectorState {
    Inactive,
    /// Armed at `since`; readings are ignored until the delay elapses
    Arming { since: Duration },
    Tracking { min_temp: f64, dropping: bool },
    Detected { turning_point: f64 },
}

#[derive(Debug, Clone)]
pub struct TurningPointDetector {
    state: DetectorState,
    arm_delay: Duration,
    hysteresis: f64,
}

impl Default for TurningPointDetector {
    fn default() -> Self {
        Self::new(Duration::from_secs(5), 1.0)
    }
}

impl TurningPointDetector {
    pub fn new(arm_delay: Duration, hysteresis: f64) -> Self {
        Self {
            state: DetectorState::Inactive,
            arm_delay,
            hysteresis,
        }
    }

    /// Start a fresh detection window at `now`
    pub fn arm(&mut self, now: Duration) {
        self.state = DetectorState::Arming { since: now };
    }

    pub fn reset(&mut self) {
        self.state = DetectorState::Inactive;
    }

    pub fn state(&self) -> DetectorState {
        self.state
    }

    pub fn is_temp_dropping(&self) -> bool {
        matches!(self.state, DetectorState::Tracking { dropping: true, .. })
    }

    pub fn min_temp(&self) -> Option<f64> {
        match self.state {
            DetectorState::Tracking { min_temp, .. } => Some(min_temp),
            DetectorState::Detected { turning_point } => Some(turning_point),
            _ => None,
        }
    }

    pub fn turning_point(&self) -> Option<f64> {
        match self.state {
            DetectorState::Detected { turning_point } => Some(turning_point),
            _ => None,
        }
    }

    /// Feed one reading; returns the turning point on the reading that
    /// detects it and `None` on every other call.
    pub fn observe(&mut self, temperature: f64, now: Duration) -> Option<f64> {
        match self.state {
            DetectorState::Inactive | DetectorState::Detected { .. } => None,
            DetectorState::Arming { since } => {
                if now.saturating_sub(since) >= self.arm_delay {
                    self.state = DetectorState::Tracking {
                        min_temp: temperature,
                        dropping: false,
                    };
                }
                None
            }
            DetectorState::Tracking { min_temp, dropping } => {
                if temperature < min_temp {
                    self.state = DetectorState::Tracking {
                        min_temp: temperature,
                        dropping: true,
                    };
                    None
                } else if temperature > min_temp + self.hysteresis {
                    self.state = DetectorState::Detected {
                        turning_point: min_temp,
                    };
                    Some(min_temp)
                } else {
                    self.state = DetectorState::Tracking { min_temp, dropping };
                    None
                }
            }
        }
    }
}

/// Turning point found in a recorded series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurningPoint {
    pub temperature: f64,
    /// Seconds of the reading that confirmed the turning point
    pub detected_at: u32,
}

/// Run the detector over `(seconds, temperature)` pairs, arming at the
/// first sample.
pub fn find_turning_point(
    series: &[(u32, f64)],
    arm_delay: Duration,
    hysteresis: f64,
) -> Option<TurningPoint> {
    let (start, _) = *series.first()?;
    let mut detector = TurningPointDetector::new(arm_delay, hysteresis);
    detector.arm(Duration::from_secs(u64::from(start)));

    series.iter().find_map(|&(seconds, temp)| {
        detector
            .observe(temp, Duration::from_secs(u64::from(seconds)))
            .map(|temperature| TurningPoint {
                temperature,
                detected_at: seconds,
            })
    })
}
