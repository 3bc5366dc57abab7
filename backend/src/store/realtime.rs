//! Realtime key-value store for the `manualRoast/*` namespace
//!
//! Last writer wins. Subscribers observe the latest value of a field and are
//! woken on every write, including writes of an unchanged value.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use roast_core::{FieldValue, RealtimeField};
use tokio::sync::watch;

use super::{StoreError, StoreResult};

#[async_trait]
pub trait RealtimeStore: Send + Sync {
    async fn read(&self, field: RealtimeField) -> StoreResult<Option<FieldValue>>;

    async fn write(&self, field: RealtimeField, value: FieldValue) -> StoreResult<()>;

    /// Watch a field; the receiver holds the latest value
    fn subscribe(&self, field: RealtimeField) -> watch::Receiver<Option<FieldValue>>;

    /// Every field that currently holds a value
    async fn snapshot(&self) -> StoreResult<BTreeMap<RealtimeField, FieldValue>> {
        let mut values = BTreeMap::new();
        for field in RealtimeField::ALL {
            if let Some(value) = self.read(field).await? {
                values.insert(field, value);
            }
        }
        Ok(values)
    }
}

/// Process-local store backed by one `watch` channel per field
pub struct InMemoryRealtimeStore {
    fields: HashMap<RealtimeField, watch::Sender<Option<FieldValue>>>,
    reject_writes: AtomicBool,
}

impl InMemoryRealtimeStore {
    pub fn new() -> Self {
        let fields = RealtimeField::ALL
            .iter()
            .map(|&field| (field, watch::channel(None).0))
            .collect();
        Self {
            fields,
            reject_writes: AtomicBool::new(false),
        }
    }

    /// Make every subsequent write fail, emulating a lost connection
    pub fn set_reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    fn sender(&self, field: RealtimeField) -> StoreResult<&watch::Sender<Option<FieldValue>>> {
        self.fields
            .get(&field)
            .ok_or_else(|| StoreError::Unavailable(format!("unknown field {}", field)))
    }
}

impl Default for InMemoryRealtimeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RealtimeStore for InMemoryRealtimeStore {
    async fn read(&self, field: RealtimeField) -> StoreResult<Option<FieldValue>> {
        Ok(self.sender(field)?.borrow().clone())
    }

    async fn write(&self, field: RealtimeField, value: FieldValue) -> StoreResult<()> {
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!("write to {} rejected", field)));
        }
        tracing::trace!(%field, ?value, "realtime write");
        self.sender(field)?.send_replace(Some(value));
        Ok(())
    }

    fn subscribe(&self, field: RealtimeField) -> watch::Receiver<Option<FieldValue>> {
        match self.fields.get(&field) {
            Some(sender) => sender.subscribe(),
            None => watch::channel(None).1,
        }
    }
}
