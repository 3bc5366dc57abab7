//! Core roast-control logic for the roast companion
//!
//! Pure, synchronous domain code shared by the backend service and the
//! browser (via WASM): models, validation, the turning-point detector, the
//! safety interlock, and the auto/manual roast session machines. Nothing in
//! this crate performs I/O; machines return [`control::Effect`]s for the
//! caller to execute.

pub mod control;
pub mod error;
pub mod models;
pub mod types;
pub mod validation;

pub use error::*;
pub use models::*;
pub use types::*;
pub use validation::*;
