//! Roast Companion - backend server
//!
//! Drives a coffee roaster through a shared realtime field store: automatic
//! and manual roast sessions, the heater safety interlock, saved roast
//! profiles and the HTTP API the operator UI and the roaster bridge talk to.

use std::sync::Arc;

use axum::{routing::get, Router};
use tokio::sync::Mutex;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod services;
pub mod store;

pub use config::Config;

use services::{
    AutoRoastController, EventBus, ManualRoastController, NotificationHub, ProfileService,
    SessionDeps,
};
use store::{ProfileStore, RealtimeStore};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub realtime: Arc<dyn RealtimeStore>,
    pub profiles: ProfileService,
    pub notifications: NotificationHub,
    pub events: EventBus,
    pub auto_roast: AutoRoastController,
    pub manual_roast: ManualRoastController,
    /// Held while a session checks the other mode and starts, so the two
    /// modes never run at once
    pub start_guard: Arc<Mutex<()>>,
}

impl AppState {
    /// Build the services and spawn both roast controllers.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(
        config: Config,
        realtime: Arc<dyn RealtimeStore>,
        profiles: Arc<dyn ProfileStore>,
    ) -> Self {
        let notifications = NotificationHub::new(config.roast.notification_buffer);
        let events = EventBus::new(config.roast.notification_buffer);
        let deps = SessionDeps {
            realtime: realtime.clone(),
            notifications: notifications.clone(),
            events: events.clone(),
            stale_after: config.telemetry_stale_after(),
        };

        let roast_settings = config.roast_settings();
        let safety = config.safety_settings();
        let auto_roast = AutoRoastController::spawn(roast_settings, safety, &deps);
        let manual_roast = ManualRoastController::spawn(roast_settings, safety, &deps);

        Self {
            config: Arc::new(config),
            realtime,
            profiles: ProfileService::new(profiles),
            notifications,
            events,
            auto_roast,
            manual_roast,
            start_guard: Arc::new(Mutex::new(())),
        }
    }
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Roast Companion API v1.0"
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
