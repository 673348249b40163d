/// Database Module
///
/// This module holds the connection-lifecycle layer of pumpdb. The wrapper
/// in `connection.rs` owns the single live connection; higher layers (the
/// settings store and the telemetry log) drive it through full
/// connect/execute/close cycles.
///
/// All database operations use the crate-wide `PumpDbError` type for
/// consistent error propagation.
pub mod connection;

pub use connection::*;
