//! Document store for the `roastProfile` collection

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use roast_core::{RoastLevel, RoastPhaseLog, RoastProfile};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{StoreError, StoreResult};

#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// All profiles, newest first
    async fn list_all(&self) -> StoreResult<Vec<RoastProfile>>;

    /// The newest `limit` profiles
    async fn list_recent(&self, limit: usize) -> StoreResult<Vec<RoastProfile>>;

    async fn get(&self, id: Uuid) -> StoreResult<RoastProfile>;

    async fn create(&self, profile: &RoastProfile) -> StoreResult<()>;

    /// Overwrite an existing profile
    async fn update(&self, profile: &RoastProfile) -> StoreResult<()>;

    async fn delete(&self, id: Uuid) -> StoreResult<()>;
}

// ============================================================================
// In-memory
// ============================================================================

#[derive(Default)]
pub struct InMemoryProfileStore {
    profiles: RwLock<HashMap<Uuid, RoastProfile>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first(mut profiles: Vec<RoastProfile>) -> Vec<RoastProfile> {
    profiles.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    profiles
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn list_all(&self) -> StoreResult<Vec<RoastProfile>> {
        let profiles = self.profiles.read().await;
        Ok(newest_first(profiles.values().cloned().collect()))
    }

    async fn list_recent(&self, limit: usize) -> StoreResult<Vec<RoastProfile>> {
        let mut profiles = self.list_all().await?;
        profiles.truncate(limit);
        Ok(profiles)
    }

    async fn get(&self, id: Uuid) -> StoreResult<RoastProfile> {
        self.profiles
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn create(&self, profile: &RoastProfile) -> StoreResult<()> {
        self.profiles
            .write()
            .await
            .insert(profile.id, profile.clone());
        Ok(())
    }

    async fn update(&self, profile: &RoastProfile) -> StoreResult<()> {
        let mut profiles = self.profiles.write().await;
        match profiles.get_mut(&profile.id) {
            Some(existing) => {
                *existing = profile.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(profile.id)),
        }
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        self.profiles
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound(id))
    }
}

// ============================================================================
// PostgreSQL
// ============================================================================

/// Row shape of the `roast_profiles` table
#[derive(Debug, FromRow)]
struct ProfileRow {
    id: Uuid,
    name: String,
    description: String,
    roast_level: Option<String>,
    duration: i32,
    target_temperature: f64,
    drop_temperature: f64,
    timestamp: DateTime<Utc>,
    roast_phase: Json<RoastPhaseLog>,
}

impl TryFrom<ProfileRow> for RoastProfile {
    type Error = StoreError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        let roast_level = match row.roast_level.as_deref() {
            None | Some("") => None,
            Some(level) => Some(
                RoastLevel::from_str(level)
                    .ok_or_else(|| StoreError::Corrupt(format!("roast level {}", level)))?,
            ),
        };
        Ok(RoastProfile {
            id: row.id,
            name: row.name,
            description: row.description,
            roast_level,
            duration: u32::try_from(row.duration)
                .map_err(|_| StoreError::Corrupt(format!("duration {}", row.duration)))?,
            target_temperature: row.target_temperature,
            drop_temperature: row.drop_temperature,
            timestamp: row.timestamp,
            roast_phase: row.roast_phase.0,
        })
    }
}

fn duration_column(profile: &RoastProfile) -> StoreResult<i32> {
    i32::try_from(profile.duration)
        .map_err(|_| StoreError::Corrupt(format!("duration {}", profile.duration)))
}

#[derive(Clone)]
pub struct PgProfileStore {
    db: PgPool,
}

impl PgProfileStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn list_all(&self) -> StoreResult<Vec<RoastProfile>> {
        let rows = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT id, name, description, roast_level, duration,
                   target_temperature, drop_temperature, timestamp, roast_phase
            FROM roast_profiles
            ORDER BY timestamp DESC
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(RoastProfile::try_from).collect()
    }

    async fn list_recent(&self, limit: usize) -> StoreResult<Vec<RoastProfile>> {
        let rows = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT id, name, description, roast_level, duration,
                   target_temperature, drop_temperature, timestamp, roast_phase
            FROM roast_profiles
            ORDER BY timestamp DESC
            LIMIT $1
            "#,
        )
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(RoastProfile::try_from).collect()
    }

    async fn get(&self, id: Uuid) -> StoreResult<RoastProfile> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT id, name, description, roast_level, duration,
                   target_temperature, drop_temperature, timestamp, roast_phase
            FROM roast_profiles
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(StoreError::NotFound(id))?;

        RoastProfile::try_from(row)
    }

    async fn create(&self, profile: &RoastProfile) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO roast_profiles (
                id, name, description, roast_level, duration,
                target_temperature, drop_temperature, timestamp, roast_phase
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(profile.id)
        .bind(&profile.name)
        .bind(&profile.description)
        .bind(profile.roast_level.map(|level| level.as_str()))
        .bind(duration_column(profile)?)
        .bind(profile.target_temperature)
        .bind(profile.drop_temperature)
        .bind(profile.timestamp)
        .bind(Json(&profile.roast_phase))
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn update(&self, profile: &RoastProfile) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE roast_profiles
            SET name = $2, description = $3, roast_level = $4, duration = $5,
                target_temperature = $6, drop_temperature = $7, timestamp = $8,
                roast_phase = $9
            WHERE id = $1
            "#,
        )
        .bind(profile.id)
        .bind(&profile.name)
        .bind(&profile.description)
        .bind(profile.roast_level.map(|level| level.as_str()))
        .bind(duration_column(profile)?)
        .bind(profile.target_temperature)
        .bind(profile.drop_temperature)
        .bind(profile.timestamp)
        .bind(Json(&profile.roast_phase))
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(profile.id));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM roast_profiles WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }
}
