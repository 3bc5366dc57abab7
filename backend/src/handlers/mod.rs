//! HTTP request handlers

pub mod auto_roast;
pub mod dashboard;
pub mod health;
pub mod manual_roast;
pub mod notification;
pub mod profiles;
pub mod realtime;

pub use dashboard::get_metrics;
pub use health::health_check;
pub use notification::list_notifications;
pub use profiles::{
    create_profile, delete_profile, get_profile, list_profiles, recent_profiles, update_profile,
};
pub use realtime::{get_field, list_fields, put_field};
