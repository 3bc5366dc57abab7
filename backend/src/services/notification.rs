//! Notification sink for operator alerts
//!
//! Every notification is logged, fanned out on a broadcast channel and kept
//! in a bounded buffer of recent notifications.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use roast_core::{Notification, Severity};
use serde::Serialize;
use tokio::sync::broadcast;

/// Notification as delivered to clients
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveredNotification {
    #[serde(flatten)]
    pub notification: Notification,
    pub sent_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct NotificationHub {
    sender: broadcast::Sender<DeliveredNotification>,
    recent: Arc<Mutex<VecDeque<DeliveredNotification>>>,
    capacity: usize,
}

impl NotificationHub {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            recent: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    pub fn notify(&self, notification: Notification) {
        match notification.severity {
            Severity::Info | Severity::Success => {
                tracing::info!(title = %notification.title, "{}", notification.body)
            }
            Severity::Warning => {
                tracing::warn!(title = %notification.title, "{}", notification.body)
            }
            Severity::Error => {
                tracing::error!(title = %notification.title, "{}", notification.body)
            }
        }

        let delivered = DeliveredNotification {
            notification,
            sent_at: Utc::now(),
        };

        if let Ok(mut recent) = self.recent.lock() {
            if recent.len() == self.capacity {
                recent.pop_front();
            }
            recent.push_back(delivered.clone());
        }

        let _ = self.sender.send(delivered);
    }

    /// Recent notifications, newest first
    pub fn recent(&self) -> Vec<DeliveredNotification> {
        self.recent
            .lock()
            .map(|recent| recent.iter().rev().cloned().collect())
            .unwrap_or_default()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DeliveredNotification> {
        self.sender.subscribe()
    }
}
