//! Dashboard metrics derived from saved roast profiles

use serde::{Deserialize, Serialize};

use super::roast::{RoastLevel, RoastProfile};

/// Summary cards on the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub profile_sum: usize,
    pub most_roast_level: Option<RoastLevel>,
    pub recent_profile: String,
    pub max_drop_temperature: f64,
}

/// Compute metrics over profiles ordered newest first.
///
/// Returns `None` for an empty list. Ties for the most common roast level go
/// to the level seen first.
pub fn calculate_metrics(profiles: &[RoastProfile]) -> Option<DashboardMetrics> {
    let most_recent = profiles.first()?;

    let mut counts: Vec<(RoastLevel, usize)> = Vec::new();
    for level in profiles.iter().filter_map(|p| p.roast_level) {
        match counts.iter_mut().find(|(l, _)| *l == level) {
            Some((_, count)) => *count += 1,
            None => counts.push((level, 1)),
        }
    }
    let most_roast_level = counts
        .iter()
        .fold(None::<(RoastLevel, usize)>, |best, &(level, count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((level, count)),
        })
        .map(|(level, _)| level);

    let max_drop_temperature = profiles
        .iter()
        .map(|p| p.drop_temperature)
        .fold(0.0_f64, f64::max);

    let recent_profile = if most_recent.name.is_empty() {
        "Unknown".to_string()
    } else {
        most_recent.name.clone()
    };

    Some(DashboardMetrics {
        profile_sum: profiles.len(),
        most_roast_level,
        recent_profile,
        max_drop_temperature,
    })
}
