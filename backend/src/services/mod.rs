//! Services behind the HTTP API: roast controllers, profiles, notifications
//! and the event bus

pub mod auto;
pub mod events;
pub mod manual;
pub mod notification;
pub mod profiles;
pub mod session;
pub mod telemetry;

pub use auto::AutoRoastController;
pub use events::EventBus;
pub use manual::ManualRoastController;
pub use notification::{DeliveredNotification, NotificationHub};
pub use profiles::{ProfileQuery, ProfileService};
pub use session::{ControlMachine, SessionController, SessionDeps};
pub use telemetry::{TelemetryLink, TelemetryUpdate};
