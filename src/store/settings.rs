//! Persisted installation settings, stored as key/value rows.
//!
//! The settings store is the configuration collaborator for the connection
//! manager: on open it makes sure the `settings` table exists, seeds the
//! installation defaults on a fresh database, and loads every row into the
//! manager's settings mapping. Each operation drives the manager through a
//! full connect/statement/close cycle, so the database file is only held
//! open while a statement runs.

use crate::config::Config;
use crate::core::db::ConnectionManager;
use crate::core::{PumpDbError, Result};
use rusqlite::OptionalExtension;
use std::collections::HashMap;
use tracing::{debug, info};

const SETTINGS_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS settings (
    key TEXT PRIMARY KEY,
    value TEXT DEFAULT NULL
)"#;

/// Placeholder identity seeded until the modem reports the real one.
pub const DEFAULT_DEVICE_ID: &str = "AAAAA BBBBB CCCCC DDDDD";

/// Every setting key seeded on first initialization, besides `device_id`.
///
/// Covers installation identity flags, the instrument readings with their
/// min/max/ok bounds, anti-drip controls, the three service counter groups
/// and the per-pump alarm/start flags.
const SETTINGS_KEYS: &[&str] = &[
    "site_code",
    "site_code_ok",
    "device_id_ok",
    "link_ok",
    "operator_pump_start",
    "inlet_pressure",
    "inlet_pressure_min",
    "inlet_pressure_max",
    "inlet_pressure_ok",
    "inlet_temperature",
    "inlet_temperature_min",
    "inlet_temperature_max",
    "inlet_temperature_ok",
    "outlet_pressure",
    "outlet_pressure_target",
    "outlet_pressure_max",
    "outlet_pressure_ok",
    "anti_drip_ok",
    "anti_drip_check_period",
    "anti_drip_max_starts",
    "anti_drip_min_run_secs",
    "rb_service",
    "rb_counter_secs",
    "rb_counter_mins",
    "rb_counter_hours",
    "rb_counter_reset",
    "rb_counter_limit",
    "bk_service",
    "bk_counter_secs",
    "bk_counter_mins",
    "bk_counter_hours",
    "bk_counter_reset",
    "bk_counter_limit",
    "tl_service",
    "tl_counter_secs",
    "tl_counter_mins",
    "tl_counter_hours",
    "tl_counter_reset",
    "tl_counter_limit",
    "pump_1_alarm",
    "pump_2_alarm",
    "pump_3_alarm",
    "pump_4_alarm",
    "pump_5_alarm",
    "pump_6_alarm",
    "pump_1_start",
    "pump_2_start",
    "pump_3_start",
    "pump_4_start",
    "pump_5_start",
    "pump_6_start",
];

/// Seed value for a settings key on a fresh database.
fn default_seed(key: &str) -> &'static str {
    match key {
        "anti_drip_ok" => "1",
        "inlet_pressure_max" => "20",
        "anti_drip_max_starts" => "10",
        "outlet_pressure_target" => "12",
        _ => "0",
    }
}

/// Key/value settings store backed by the `settings` table.
pub struct SettingsStore {
    link: ConnectionManager,
}

impl SettingsStore {
    /// Opens the store on the database at `path`.
    ///
    /// Initializes and seeds the `settings` table when it does not exist
    /// yet, then loads all rows into the manager's settings mapping. The
    /// store needs a file-backed database: every operation reopens the
    /// connection, so an in-memory database would lose its rows between
    /// calls.
    pub fn open(path: impl Into<String>) -> Result<Self> {
        let link = ConnectionManager::with_init(path, HashMap::new(), |mgr| {
            if Self::is_initialized(mgr)? {
                info!("Settings table already initialized");
            } else {
                Self::initialize(mgr)?;
            }
            let loaded = Self::load_all(mgr)?;
            debug!("Loaded {} settings", loaded.len());
            *mgr.settings_mut() = loaded;
            Ok(())
        })?;
        Ok(SettingsStore { link })
    }

    /// The settings mapping loaded at open (plus any later `set` calls).
    pub fn settings(&self) -> &HashMap<String, String> {
        self.link.settings()
    }

    /// The underlying connection manager.
    pub fn link(&self) -> &ConnectionManager {
        &self.link
    }

    /// Reads one setting straight from the database.
    pub fn get(&mut self, key: &str) -> Result<String> {
        self.link.connect()?;
        let value: Option<String> = self
            .link
            .connection()?
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        self.link.close()?;
        value.ok_or_else(|| PumpDbError::Store(format!("unknown setting: {}", key)))
    }

    /// Updates one setting, keeping the in-memory mapping in sync.
    ///
    /// Updating a key that was never seeded is a `Store` error.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.link.connect()?;
        let changed = self
            .link
            .execute("UPDATE settings SET value = ?1 WHERE key = ?2", [value, key])?;
        self.link.close()?;
        if changed == 0 {
            return Err(PumpDbError::Store(format!("unknown setting: {}", key)));
        }
        self.link
            .settings_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    /// Re-reads every settings row from the database into the mapping.
    pub fn reload(&mut self) -> Result<()> {
        let loaded = Self::load_all(&mut self.link)?;
        *self.link.settings_mut() = loaded;
        Ok(())
    }

    /// Writes the site-config overrides through `set`, making the config
    /// file authoritative over the seeded defaults.
    pub fn apply(&mut self, config: &Config) -> Result<()> {
        for (key, value) in config.settings_overrides() {
            self.set(key, &value)?;
        }
        info!("Applied site config overrides");
        Ok(())
    }

    fn is_initialized(mgr: &mut ConnectionManager) -> Result<bool> {
        mgr.connect()?;
        let count: i64 = mgr.connection()?.query_row(
            "SELECT count(name) FROM sqlite_master WHERE type = 'table' AND name = 'settings'",
            [],
            |row| row.get(0),
        )?;
        mgr.close()?;
        Ok(count == 1)
    }

    fn initialize(mgr: &mut ConnectionManager) -> Result<()> {
        info!("Settings table not initialized, creating and seeding it");
        mgr.connect()?;
        mgr.execute(SETTINGS_TABLE_SQL, [])?;

        let mut records: Vec<(&str, &str)> = vec![("device_id", DEFAULT_DEVICE_ID)];
        for key in SETTINGS_KEYS.iter().copied() {
            records.push((key, default_seed(key)));
        }
        mgr.execute_many(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)",
            records,
        )?;
        mgr.close()?;
        info!("Seeded {} default settings", SETTINGS_KEYS.len() + 1);
        Ok(())
    }

    fn load_all(mgr: &mut ConnectionManager) -> Result<HashMap<String, String>> {
        mgr.connect()?;
        let mut settings = HashMap::new();
        {
            let conn = mgr.connection()?;
            let mut stmt = conn.prepare("SELECT key, value FROM settings")?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?;
            for row in rows {
                let (key, value) = row?;
                settings.insert(key, value);
            }
        }
        mgr.close()?;
        Ok(settings)
    }
}
