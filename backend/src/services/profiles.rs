//! Roast profile service: CRUD, search and dashboard metrics

use std::sync::Arc;

use chrono::Utc;
use roast_core::{
    calculate_metrics, validate_profile_input, DashboardMetrics, RoastLevel, RoastProfile,
    RoastProfileInput,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::store::ProfileStore;

/// Number of profiles shown on the dashboard and used for its metrics
pub const RECENT_PROFILE_LIMIT: usize = 20;

/// Filters for listing profiles
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileQuery {
    /// Case-insensitive match on name or description
    pub search: Option<String>,
    pub roast_level: Option<RoastLevel>,
}

impl ProfileQuery {
    fn matches(&self, profile: &RoastProfile) -> bool {
        if let Some(level) = self.roast_level {
            if profile.roast_level != Some(level) {
                return false;
            }
        }
        match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => {
                let term = term.to_lowercase();
                profile.name.to_lowercase().contains(&term)
                    || profile.description.to_lowercase().contains(&term)
            }
            _ => true,
        }
    }
}

#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn ProfileStore>,
}

impl ProfileService {
    pub fn new(store: Arc<dyn ProfileStore>) -> Self {
        Self { store }
    }

    /// Profiles matching `query`, newest first
    pub async fn list(&self, query: &ProfileQuery) -> AppResult<Vec<RoastProfile>> {
        let profiles = self.store.list_all().await?;
        Ok(profiles.into_iter().filter(|p| query.matches(p)).collect())
    }

    pub async fn recent(&self, limit: Option<usize>) -> AppResult<Vec<RoastProfile>> {
        let limit = limit.unwrap_or(RECENT_PROFILE_LIMIT);
        Ok(self.store.list_recent(limit).await?)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<RoastProfile> {
        Ok(self.store.get(id).await?)
    }

    pub async fn create(&self, input: RoastProfileInput) -> AppResult<RoastProfile> {
        validate_profile_input(&input).map_err(AppError::Validation)?;

        let profile = RoastProfile::from_input(Uuid::new_v4(), input, Utc::now());
        self.store.create(&profile).await?;

        tracing::info!(id = %profile.id, name = %profile.name, "roast profile created");
        Ok(profile)
    }

    /// Overwrite a profile; the timestamp is refreshed
    pub async fn update(&self, id: Uuid, input: RoastProfileInput) -> AppResult<RoastProfile> {
        validate_profile_input(&input).map_err(AppError::Validation)?;

        let profile = RoastProfile::from_input(id, input, Utc::now());
        self.store.update(&profile).await?;

        tracing::info!(id = %id, "roast profile updated");
        Ok(profile)
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.store.delete(id).await?;
        tracing::info!(id = %id, "roast profile deleted");
        Ok(())
    }

    /// Metrics over the most recent profiles; `None` when there are none
    pub async fn metrics(&self) -> AppResult<Option<DashboardMetrics>> {
        let recent = self.store.list_recent(RECENT_PROFILE_LIMIT).await?;
        Ok(calculate_metrics(&recent))
    }
}
