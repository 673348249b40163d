//! Telemetry log of sampled instrument readings.
//!
//! One row is appended per controller sample; the web uplink reads the
//! newest row back out. Like the settings store, every operation runs a
//! full connect/statement/close cycle through the connection manager.

use crate::core::db::ConnectionManager;
use crate::core::Result;
use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};
use tracing::debug;

const READINGS_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS readings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    inlet_pressure INTEGER NOT NULL DEFAULT 0,
    inlet_temperature INTEGER NOT NULL DEFAULT 0,
    outlet_pressure INTEGER NOT NULL DEFAULT 0,
    outlet_pressure_target INTEGER NOT NULL DEFAULT 0,
    working_hours INTEGER NOT NULL DEFAULT 0,
    working_minutes INTEGER NOT NULL DEFAULT 0,
    anti_drip INTEGER NOT NULL DEFAULT 0,
    start_code TEXT NOT NULL DEFAULT '0',
    alarms TEXT NOT NULL DEFAULT '',
    bk_service INTEGER NOT NULL DEFAULT 0,
    tl_service INTEGER NOT NULL DEFAULT 0,
    rb_service INTEGER NOT NULL DEFAULT 0,
    run INTEGER NOT NULL DEFAULT 0,
    running INTEGER NOT NULL DEFAULT 0,
    timestamp TEXT NOT NULL DEFAULT ''
)"#;

/// One sampled row of instrument values.
///
/// `id` is assigned by the database on insert. `new` stamps the current
/// time and the idle start code; callers fill in the sampled fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub id: i64,
    pub inlet_pressure: i64,
    pub inlet_temperature: i64,
    pub outlet_pressure: i64,
    pub outlet_pressure_target: i64,
    pub working_hours: i64,
    pub working_minutes: i64,
    pub anti_drip: i64,
    pub start_code: String,
    pub alarms: String,
    pub bk_service: i64,
    pub tl_service: i64,
    pub rb_service: i64,
    pub run: i64,
    pub running: i64,
    pub timestamp: String,
}

impl Reading {
    /// A zeroed reading stamped with the current time (RFC 3339) and the
    /// idle start code.
    pub fn new() -> Self {
        Reading {
            id: 0, // Will be set by database
            inlet_pressure: 0,
            inlet_temperature: 0,
            outlet_pressure: 0,
            outlet_pressure_target: 0,
            working_hours: 0,
            working_minutes: 0,
            anti_drip: 0,
            start_code: "0x000".to_string(),
            alarms: String::new(),
            bk_service: 0,
            tl_service: 0,
            rb_service: 0,
            run: 0,
            running: 0,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Reading {
            id: row.get(0)?,
            inlet_pressure: row.get(1)?,
            inlet_temperature: row.get(2)?,
            outlet_pressure: row.get(3)?,
            outlet_pressure_target: row.get(4)?,
            working_hours: row.get(5)?,
            working_minutes: row.get(6)?,
            anti_drip: row.get(7)?,
            start_code: row.get(8)?,
            alarms: row.get(9)?,
            bk_service: row.get(10)?,
            tl_service: row.get(11)?,
            rb_service: row.get(12)?,
            run: row.get(13)?,
            running: row.get(14)?,
            timestamp: row.get(15)?,
        })
    }
}

impl Default for Reading {
    fn default() -> Self {
        Self::new()
    }
}

/// Append-and-read-back log backed by the `readings` table.
pub struct TelemetryLog {
    link: ConnectionManager,
}

impl TelemetryLog {
    /// Opens the log on the database at `path`, creating the `readings`
    /// table when absent. Needs a file-backed database for the same reason
    /// as the settings store.
    pub fn open(path: impl Into<String>) -> Result<Self> {
        let mut link = ConnectionManager::new(path);
        link.connect()?;
        link.execute(READINGS_TABLE_SQL, [])?;
        link.close()?;
        Ok(TelemetryLog { link })
    }

    /// The underlying connection manager.
    pub fn link(&self) -> &ConnectionManager {
        &self.link
    }

    /// Appends one reading, returning its database id.
    pub fn record(&mut self, reading: &Reading) -> Result<i64> {
        self.link.connect()?;
        self.link.execute(
            "INSERT INTO readings (
                inlet_pressure, inlet_temperature, outlet_pressure,
                outlet_pressure_target, working_hours, working_minutes,
                anti_drip, start_code, alarms, bk_service, tl_service,
                rb_service, run, running, timestamp
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            params![
                reading.inlet_pressure,
                reading.inlet_temperature,
                reading.outlet_pressure,
                reading.outlet_pressure_target,
                reading.working_hours,
                reading.working_minutes,
                reading.anti_drip,
                reading.start_code,
                reading.alarms,
                reading.bk_service,
                reading.tl_service,
                reading.rb_service,
                reading.run,
                reading.running,
                reading.timestamp,
            ],
        )?;
        let id = self.link.connection()?.last_insert_rowid();
        self.link.close()?;
        debug!("Recorded reading {}", id);
        Ok(id)
    }

    /// Returns the newest reading, or `None` on an empty log.
    pub fn latest(&mut self) -> Result<Option<Reading>> {
        self.link.connect()?;
        let reading = self
            .link
            .connection()?
            .query_row(
                "SELECT id, inlet_pressure, inlet_temperature, outlet_pressure,
                        outlet_pressure_target, working_hours, working_minutes,
                        anti_drip, start_code, alarms, bk_service, tl_service,
                        rb_service, run, running, timestamp
                 FROM readings ORDER BY id DESC LIMIT 1",
                [],
                Reading::from_row,
            )
            .optional()?;
        self.link.close()?;
        Ok(reading)
    }
}
