//! Storage ports: the realtime field store shared with the roaster, and the
//! document store for saved roast profiles

pub mod profiles;
pub mod realtime;

use thiserror::Error;
use uuid::Uuid;

pub use profiles::{InMemoryProfileStore, PgProfileStore, ProfileStore};
pub use realtime::{InMemoryRealtimeStore, RealtimeStore};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Roast profile {0} not found")]
    NotFound(Uuid),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid stored value: {0}")]
    Corrupt(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;
