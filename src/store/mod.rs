//! Persistent stores built on the connection manager: installation
//! settings and the telemetry reading log.
pub mod settings;
pub mod telemetry;

pub use settings::{SettingsStore, DEFAULT_DEVICE_ID};
pub use telemetry::{Reading, TelemetryLog};
