//! Telemetry link: forwards realtime-store changes to a controller
//!
//! One task per subscribed field. Each task sends the current value on
//! subscribe and then every subsequent write. Dropping the [`TelemetryLink`]
//! aborts the tasks.

use std::sync::Arc;
use std::time::Duration;

use roast_core::{FieldValue, RealtimeField};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::store::RealtimeStore;

const CHANNEL_CAPACITY: usize = 64;

/// A reading delivered to a controller
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryUpdate {
    Temperature(f64),
    Heater(bool),
    Motor(bool),
    /// No temperature reading arrived for `silent_for`
    Stale { silent_for: Duration },
}

impl TelemetryUpdate {
    fn decode(field: RealtimeField, value: &FieldValue) -> Option<Self> {
        match field {
            RealtimeField::Temperature => value.as_f64().map(Self::Temperature),
            RealtimeField::Heater => value.as_bool().map(Self::Heater),
            RealtimeField::Motor => value.as_bool().map(Self::Motor),
            _ => None,
        }
    }
}

pub struct TelemetryLink {
    tasks: Vec<JoinHandle<()>>,
}

impl TelemetryLink {
    /// Subscribe to temperature, heater and motor.
    ///
    /// With `stale_after` set, a single [`TelemetryUpdate::Stale`] is sent per
    /// gap in temperature readings.
    pub fn subscribe(
        store: Arc<dyn RealtimeStore>,
        stale_after: Option<Duration>,
    ) -> (Self, mpsc::Receiver<TelemetryUpdate>) {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);

        let tasks = vec![
            tokio::spawn(forward_temperature(
                store.subscribe(RealtimeField::Temperature),
                tx.clone(),
                stale_after,
            )),
            tokio::spawn(forward(
                RealtimeField::Heater,
                store.subscribe(RealtimeField::Heater),
                tx.clone(),
            )),
            tokio::spawn(forward(
                RealtimeField::Motor,
                store.subscribe(RealtimeField::Motor),
                tx,
            )),
        ];

        (Self { tasks }, rx)
    }
}

impl Drop for TelemetryLink {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

/// Decode the current value, marking it seen
fn take_current(
    field: RealtimeField,
    rx: &mut watch::Receiver<Option<FieldValue>>,
) -> Option<TelemetryUpdate> {
    let value = rx.borrow_and_update().clone()?;
    let update = TelemetryUpdate::decode(field, &value);
    if update.is_none() {
        tracing::debug!(%field, ?value, "ignoring malformed telemetry value");
    }
    update
}

async fn forward(
    field: RealtimeField,
    mut rx: watch::Receiver<Option<FieldValue>>,
    tx: mpsc::Sender<TelemetryUpdate>,
) {
    loop {
        if let Some(update) = take_current(field, &mut rx) {
            if tx.send(update).await.is_err() {
                return;
            }
        }
        if rx.changed().await.is_err() {
            return;
        }
    }
}

async fn forward_temperature(
    mut rx: watch::Receiver<Option<FieldValue>>,
    tx: mpsc::Sender<TelemetryUpdate>,
    stale_after: Option<Duration>,
) {
    let mut reported = false;
    if let Some(update) = take_current(RealtimeField::Temperature, &mut rx) {
        if tx.send(update).await.is_err() {
            return;
        }
    }

    loop {
        let changed = match stale_after {
            Some(silent_for) if !reported => {
                match tokio::time::timeout(silent_for, rx.changed()).await {
                    Ok(changed) => changed,
                    Err(_) => {
                        reported = true;
                        tracing::warn!(?silent_for, "temperature telemetry went silent");
                        if tx.send(TelemetryUpdate::Stale { silent_for }).await.is_err() {
                            return;
                        }
                        continue;
                    }
                }
            }
            _ => rx.changed().await,
        };
        if changed.is_err() {
            return;
        }

        reported = false;
        if let Some(update) = take_current(RealtimeField::Temperature, &mut rx) {
            if tx.send(update).await.is_err() {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryRealtimeStore;

    #[tokio::test]
    async fn test_forwards_current_value_and_changes() {
        let store = Arc::new(InMemoryRealtimeStore::new());
        store
            .write(RealtimeField::Heater, FieldValue::Bool(true))
            .await
            .unwrap();

        let (_link, mut rx) = TelemetryLink::subscribe(store.clone(), None);
        assert_eq!(rx.recv().await, Some(TelemetryUpdate::Heater(true)));

        store
            .write(RealtimeField::Temperature, FieldValue::Number(151.5))
            .await
            .unwrap();
        assert_eq!(rx.recv().await, Some(TelemetryUpdate::Temperature(151.5)));
    }

    #[tokio::test]
    async fn test_malformed_values_are_skipped() {
        let store = Arc::new(InMemoryRealtimeStore::new());
        let (_link, mut rx) = TelemetryLink::subscribe(store.clone(), None);

        store
            .write(RealtimeField::Temperature, FieldValue::Text("hot".into()))
            .await
            .unwrap();
        store
            .write(RealtimeField::Temperature, FieldValue::Number(120.0))
            .await
            .unwrap();
        assert_eq!(rx.recv().await, Some(TelemetryUpdate::Temperature(120.0)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_is_reported_once_per_gap() {
        let store = Arc::new(InMemoryRealtimeStore::new());
        let silent_for = Duration::from_secs(5);
        let (_link, mut rx) = TelemetryLink::subscribe(store.clone(), Some(silent_for));

        assert_eq!(rx.recv().await, Some(TelemetryUpdate::Stale { silent_for }));

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(rx.try_recv().is_err());

        store
            .write(RealtimeField::Temperature, FieldValue::Number(100.0))
            .await
            .unwrap();
        assert_eq!(rx.recv().await, Some(TelemetryUpdate::Temperature(100.0)));
        assert_eq!(rx.recv().await, Some(TelemetryUpdate::Stale { silent_for }));
    }
}
