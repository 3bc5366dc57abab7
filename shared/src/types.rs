//! Common types used across the roast companion

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// One temperature reading in a session's history
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TempSample {
    /// Session seconds at the time of the reading
    pub elapsed: u32,
    pub temp: f64,
    /// Target temperature in force when the reading arrived
    pub target: f64,
}

/// Append-only temperature history, optionally capped to the newest entries
#[derive(Debug, Clone, Default)]
pub struct TempHistory {
    samples: VecDeque<TempSample>,
    capacity: Option<usize>,
}

impl TempHistory {
    pub fn unbounded() -> Self {
        Self {
            samples: VecDeque::new(),
            capacity: None,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity: Some(capacity),
        }
    }

    pub fn push(&mut self, sample: TempSample) {
        if let Some(capacity) = self.capacity {
            if capacity == 0 {
                return;
            }
            while self.samples.len() >= capacity {
                self.samples.pop_front();
            }
        }
        self.samples.push_back(sample);
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TempSample> {
        self.samples.iter()
    }

    pub fn to_vec(&self) -> Vec<TempSample> {
        self.samples.iter().copied().collect()
    }

    /// Min / max / average over the retained window
    pub fn stats(&self) -> Option<TempStats> {
        if self.samples.is_empty() {
            return None;
        }
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        for sample in &self.samples {
            min = min.min(sample.temp);
            max = max.max(sample.temp);
            sum += sample.temp;
        }
        let avg = sum / self.samples.len() as f64;
        Some(TempStats {
            min,
            max,
            avg: (avg * 10.0).round() / 10.0,
        })
    }
}

/// Summary over a temperature window; `avg` is rounded to one decimal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TempStats {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

/// Format seconds as `m:ss`
pub fn format_elapsed_time(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Convert seconds to minutes rounded to two decimals
pub fn seconds_to_minutes(seconds: u32) -> f64 {
    (f64::from(seconds) / 60.0 * 100.0).round() / 100.0
}
