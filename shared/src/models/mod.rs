//! Domain models for the roast companion

mod manual;
mod metrics;
mod notification;
mod realtime;
mod roast;
mod session;

pub use manual::*;
pub use metrics::*;
pub use notification::*;
pub use realtime::*;
pub use roast::*;
pub use session::*;
