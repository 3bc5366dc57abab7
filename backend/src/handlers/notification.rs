//! Notification handlers

use axum::{extract::State, Json};

use crate::services::DeliveredNotification;
use crate::AppState;

/// Recent operator notifications, newest first
pub async fn list_notifications(State(state): State<AppState>) -> Json<Vec<DeliveredNotification>> {
    Json(state.notifications.recent())
}
