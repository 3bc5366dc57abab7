//! Manual roast controller tests
//!
//! Cover the interlock band, the stop/save dialog flow and store failures
//! against the in-memory stores.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use roast_core::{
    FieldValue, ManualDialog, ManualRoastSettings, ManualSnapshot, RealtimeField, RoastLevel,
    RoastLogPatch, RoastProfile, SaveRoastInput,
};
use roast_server::error::AppError;
use roast_server::store::{
    InMemoryProfileStore, InMemoryRealtimeStore, ProfileStore, RealtimeStore, StoreError,
    StoreResult,
};
use roast_server::{AppState, Config};
use tokio::sync::{watch, Notify};
use uuid::Uuid;

/// Profile store whose writes always fail
struct OfflineProfileStore;

#[async_trait]
impl ProfileStore for OfflineProfileStore {
    async fn list_all(&self) -> StoreResult<Vec<RoastProfile>> {
        Ok(Vec::new())
    }

    async fn list_recent(&self, _limit: usize) -> StoreResult<Vec<RoastProfile>> {
        Ok(Vec::new())
    }

    async fn get(&self, id: Uuid) -> StoreResult<RoastProfile> {
        Err(StoreError::NotFound(id))
    }

    async fn create(&self, _profile: &RoastProfile) -> StoreResult<()> {
        Err(StoreError::Unavailable("document store offline".into()))
    }

    async fn update(&self, profile: &RoastProfile) -> StoreResult<()> {
        Err(StoreError::NotFound(profile.id))
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        Err(StoreError::NotFound(id))
    }
}

/// In-memory profile store whose creates wait for `release`
struct GatedProfileStore {
    inner: InMemoryProfileStore,
    release: Notify,
}

#[async_trait]
impl ProfileStore for GatedProfileStore {
    async fn list_all(&self) -> StoreResult<Vec<RoastProfile>> {
        self.inner.list_all().await
    }

    async fn list_recent(&self, limit: usize) -> StoreResult<Vec<RoastProfile>> {
        self.inner.list_recent(limit).await
    }

    async fn get(&self, id: Uuid) -> StoreResult<RoastProfile> {
        self.inner.get(id).await
    }

    async fn create(&self, profile: &RoastProfile) -> StoreResult<()> {
        self.release.notified().await;
        self.inner.create(profile).await
    }

    async fn update(&self, profile: &RoastProfile) -> StoreResult<()> {
        self.inner.update(profile).await
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        self.inner.delete(id).await
    }
}

fn app_with(profiles: Arc<dyn ProfileStore>) -> (AppState, Arc<InMemoryRealtimeStore>) {
    let realtime = Arc::new(InMemoryRealtimeStore::new());
    let app = AppState::new(Config::default(), realtime.clone(), profiles);
    (app, realtime)
}

fn settings() -> ManualRoastSettings {
    ManualRoastSettings {
        target_temperature: 180.0,
        max_safety_temp: 220.0,
        auto_shutoff_enabled: true,
        timer_enabled: false,
        timer_duration: 5,
    }
}

async fn settle<T: Clone>(rx: &mut watch::Receiver<T>, pred: impl FnMut(&T) -> bool) -> T {
    tokio::time::timeout(Duration::from_secs(5), rx.wait_for(pred))
        .await
        .expect("timed out waiting for snapshot")
        .expect("controller stopped")
        .clone()
}

async fn stored(app: &AppState, field: RealtimeField, expected: FieldValue) {
    let mut rx = app.realtime.subscribe(field);
    settle(&mut rx, |value| value.as_ref() == Some(&expected)).await;
}

/// Push a reading and wait until the session has seen it
async fn feed(
    app: &AppState,
    rx: &mut watch::Receiver<ManualSnapshot>,
    temperature: f64,
) -> ManualSnapshot {
    app.realtime
        .write(RealtimeField::Temperature, FieldValue::Number(temperature))
        .await
        .unwrap();
    settle(rx, |s| s.temperature == temperature).await
}

// ============================================================================
// Interlock
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_auto_shutoff_trips_at_210_and_restores_at_199() {
    let (app, _) = app_with(Arc::new(InMemoryProfileStore::new()));
    let mut rx = app.manual_roast.watch();

    let snapshot = app.manual_roast.start(settings()).await.unwrap();
    assert!(snapshot.is_roasting);
    stored(&app, RealtimeField::Heater, FieldValue::Bool(true)).await;
    stored(&app, RealtimeField::MaxSafetyTemp, FieldValue::Number(220.0)).await;

    let snapshot = feed(&app, &mut rx, 209.5).await;
    assert!(!snapshot.heater_control_disabled);
    assert!(snapshot.is_target_reached);

    let snapshot = feed(&app, &mut rx, 210.0).await;
    assert!(snapshot.heater_control_disabled);
    stored(&app, RealtimeField::Heater, FieldValue::Bool(false)).await;

    assert!(matches!(
        app.manual_roast.set_heater(true).await,
        Err(AppError::HeaterLocked)
    ));

    let snapshot = feed(&app, &mut rx, 200.0).await;
    assert!(snapshot.heater_control_disabled);

    let snapshot = feed(&app, &mut rx, 199.0).await;
    assert!(!snapshot.heater_control_disabled);
    let snapshot = app.manual_roast.set_heater(true).await.unwrap();
    assert!(snapshot.heater);
}

#[tokio::test(start_paused = true)]
async fn test_invalid_settings_are_rejected() {
    let (app, _) = app_with(Arc::new(InMemoryProfileStore::new()));
    let result = app
        .manual_roast
        .start(ManualRoastSettings {
            max_safety_temp: 295.0,
            ..settings()
        })
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));
    assert!(!app.manual_roast.snapshot().is_roasting);
}

#[tokio::test(start_paused = true)]
async fn test_heater_requires_active_roast() {
    let (app, _) = app_with(Arc::new(InMemoryProfileStore::new()));
    assert!(matches!(
        app.manual_roast.set_heater(true).await,
        Err(AppError::NotRoasting)
    ));
}

#[tokio::test(start_paused = true)]
async fn test_timer_notifies_once() {
    let (app, _) = app_with(Arc::new(InMemoryProfileStore::new()));
    app.manual_roast
        .start(ManualRoastSettings {
            timer_enabled: true,
            timer_duration: 1,
            ..settings()
        })
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_secs(125)).await;

    let timer_alerts = app
        .notifications
        .recent()
        .into_iter()
        .filter(|n| n.notification.title == "Timer Reached")
        .count();
    assert_eq!(timer_alerts, 1);
    assert!(app.manual_roast.snapshot().timer_notification_sent);
}

// ============================================================================
// Stop and save
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_stop_and_save_with_default_name() {
    let profiles = Arc::new(InMemoryProfileStore::new());
    let (app, _) = app_with(profiles.clone());
    let mut rx = app.manual_roast.watch();

    app.manual_roast.start(settings()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(90_500)).await;
    feed(&app, &mut rx, 204.0).await;

    app.manual_roast
        .update_log(RoastLogPatch {
            description: Some("Washed Yirgacheffe".into()),
            roast_level: Some(RoastLevel::Light),
            ..Default::default()
        })
        .await
        .unwrap();

    let snapshot = app.manual_roast.request_stop().await.unwrap();
    assert_eq!(snapshot.dialog, Some(ManualDialog::StopConfirm));
    let snapshot = app.manual_roast.cancel_stop().await.unwrap();
    assert_eq!(snapshot.dialog, None);
    assert!(snapshot.is_roasting);

    app.manual_roast.request_stop().await.unwrap();
    let snapshot = app.manual_roast.confirm_stop().await.unwrap();
    assert!(!snapshot.is_roasting);
    assert_eq!(snapshot.dialog, Some(ManualDialog::SaveData));
    let stopped = snapshot.stopped.expect("stopped roast captured");
    assert_eq!(stopped.duration, 90);
    assert_eq!(stopped.drop_temperature, 204.0);
    stored(&app, RealtimeField::Status, FieldValue::Text("idle".into())).await;
    stored(&app, RealtimeField::Heater, FieldValue::Bool(false)).await;

    let profile = app
        .manual_roast
        .save(SaveRoastInput::default(), &app.profiles)
        .await
        .unwrap();
    assert_eq!(profile.name, "My Roast Profile");
    assert_eq!(profile.description, "Washed Yirgacheffe");
    assert_eq!(profile.roast_level, Some(RoastLevel::Light));
    assert_eq!(profile.duration, 90);
    assert_eq!(profile.target_temperature, 180.0);

    let saved = profiles.get(profile.id).await.unwrap();
    assert_eq!(saved, profile);

    let snapshot = app.manual_roast.snapshot();
    assert_eq!(snapshot.dialog, None);
    assert!(snapshot.stopped.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_failed_save_keeps_dialog_open() {
    let (app, _) = app_with(Arc::new(OfflineProfileStore));

    app.manual_roast.start(settings()).await.unwrap();
    app.manual_roast.request_stop().await.unwrap();
    app.manual_roast.confirm_stop().await.unwrap();

    let result = app
        .manual_roast
        .save(
            SaveRoastInput {
                name: "Morning batch".into(),
                ..Default::default()
            },
            &app.profiles,
        )
        .await;
    assert!(matches!(result, Err(AppError::Store(_))));

    let snapshot = app.manual_roast.snapshot();
    assert_eq!(snapshot.dialog, Some(ManualDialog::SaveData));
    assert!(snapshot.stopped.is_some());
    assert!(app
        .notifications
        .recent()
        .iter()
        .any(|n| n.notification.title == "Failed to Save Roast"));

    let snapshot = app.manual_roast.discard().await.unwrap();
    assert_eq!(snapshot.dialog, None);
    assert!(snapshot.stopped.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_saves_store_one_profile() {
    let profiles = Arc::new(InMemoryProfileStore::new());
    let (app, _) = app_with(profiles.clone());

    app.manual_roast.start(settings()).await.unwrap();
    app.manual_roast.request_stop().await.unwrap();
    app.manual_roast.confirm_stop().await.unwrap();

    let (a, b) = tokio::join!(
        app.manual_roast.save(SaveRoastInput::default(), &app.profiles),
        app.manual_roast.save(SaveRoastInput::default(), &app.profiles),
    );
    assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
    assert!(matches!(
        a.err().or(b.err()),
        Some(AppError::InvalidStateTransition(_))
    ));
    assert_eq!(profiles.list_all().await.unwrap().len(), 1);
    assert_eq!(app.manual_roast.snapshot().dialog, None);
}

#[tokio::test(start_paused = true)]
async fn test_discard_rejected_while_save_in_flight() {
    let store = Arc::new(GatedProfileStore {
        inner: InMemoryProfileStore::new(),
        release: Notify::new(),
    });
    let (app, _) = app_with(store.clone());
    let mut rx = app.manual_roast.watch();

    app.manual_roast.start(settings()).await.unwrap();
    app.manual_roast.request_stop().await.unwrap();
    app.manual_roast.confirm_stop().await.unwrap();

    let saving = {
        let app = app.clone();
        tokio::spawn(async move {
            app.manual_roast
                .save(SaveRoastInput::default(), &app.profiles)
                .await
        })
    };
    settle(&mut rx, |s| s.dialog == Some(ManualDialog::Saving)).await;

    assert!(matches!(
        app.manual_roast.discard().await,
        Err(AppError::InvalidStateTransition(_))
    ));

    store.release.notify_one();
    let profile = saving.await.unwrap().unwrap();
    assert_eq!(store.list_all().await.unwrap(), vec![profile]);
    assert_eq!(app.manual_roast.snapshot().dialog, None);
}

#[tokio::test(start_paused = true)]
async fn test_save_without_stopped_roast_is_rejected() {
    let (app, _) = app_with(Arc::new(InMemoryProfileStore::new()));
    let result = app
        .manual_roast
        .save(SaveRoastInput::default(), &app.profiles)
        .await;
    assert!(matches!(result, Err(AppError::InvalidStateTransition(_))));
}

// ============================================================================
// Store failures
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_rejected_write_is_reported_without_rollback() {
    let (app, realtime) = app_with(Arc::new(InMemoryProfileStore::new()));
    let mut notifications = app.notifications.subscribe();
    realtime.set_reject_writes(true);

    let snapshot = app.manual_roast.start(settings()).await.unwrap();
    assert!(snapshot.is_roasting);
    assert!(snapshot.heater);

    let delivered = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let delivered = notifications.recv().await.unwrap();
            if delivered.notification.title == "Roaster Update Failed" {
                return delivered;
            }
        }
    })
    .await
    .expect("write failure was not reported");
    assert!(!delivered.notification.body.is_empty());
    assert!(app.manual_roast.snapshot().is_roasting);
}
