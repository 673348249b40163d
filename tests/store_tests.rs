//! Integration tests across the store layer: site config, settings store
//! and telemetry log sharing one database file, the way the controller
//! runs them.

use pumpdb::config::Config;
use pumpdb::store::{Reading, SettingsStore, TelemetryLog, DEFAULT_DEVICE_ID};
use tempfile::TempDir;

fn db_path(dir: &TempDir) -> String {
    dir.path().join("controller.db").to_str().unwrap().to_string()
}

fn init_test_logging() {
    let _ = tracing_subscriber::fmt::try_init();
}

#[test]
fn settings_and_telemetry_share_one_database() {
    init_test_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = db_path(&dir);

    let mut settings = SettingsStore::open(&path).unwrap();
    let mut telemetry = TelemetryLog::open(&path).unwrap();

    assert_eq!(settings.get("device_id").unwrap(), DEFAULT_DEVICE_ID);

    let mut reading = Reading::new();
    reading.outlet_pressure = 9;
    telemetry.record(&reading).unwrap();

    // Both tables live side by side in the same file
    assert_eq!(telemetry.latest().unwrap().unwrap().outlet_pressure, 9);
    assert_eq!(settings.get("anti_drip_ok").unwrap(), "1");
}

#[test]
fn first_boot_flow_config_then_settings() {
    init_test_logging();
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("site.toml");
    let path = db_path(&dir);

    // First boot: no config file yet, defaults get written
    let config = Config::load_or_create(&config_path).unwrap();
    assert_eq!(config, Config::default());

    let mut settings = SettingsStore::open(&path).unwrap();
    settings.apply(&config).unwrap();

    assert_eq!(settings.get("outlet_pressure_max").unwrap(), "110");
    assert_eq!(settings.get("bk_counter_limit").unwrap(), "1080");

    // Subsequent boot: overrides survive in the database
    let mut reopened = SettingsStore::open(&path).unwrap();
    assert_eq!(reopened.get("outlet_pressure_max").unwrap(), "110");
    assert_eq!(
        reopened.settings().get("outlet_pressure_max").unwrap(),
        "110"
    );
}

#[test]
fn edited_config_overrides_seeded_defaults() {
    init_test_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = db_path(&dir);

    let toml = r#"
[pressure]
outlet_max = 95
inlet_min = 2
inlet_max = 80
"#;
    let config: Config = toml::from_str(toml).unwrap();

    let mut settings = SettingsStore::open(&path).unwrap();
    assert_eq!(settings.get("inlet_pressure_max").unwrap(), "20");

    settings.apply(&config).unwrap();
    assert_eq!(settings.get("inlet_pressure_max").unwrap(), "80");
    assert_eq!(settings.get("outlet_pressure_max").unwrap(), "95");
    // Untouched sections apply their defaults
    assert_eq!(settings.get("anti_drip_check_period").unwrap(), "3600");
}

#[test]
fn telemetry_survives_reopen() {
    init_test_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = db_path(&dir);

    {
        let mut telemetry = TelemetryLog::open(&path).unwrap();
        let mut reading = Reading::new();
        reading.working_hours = 120;
        reading.alarms = "none".to_string();
        telemetry.record(&reading).unwrap();
    }

    let mut reopened = TelemetryLog::open(&path).unwrap();
    let stored = reopened.latest().unwrap().unwrap();
    assert_eq!(stored.working_hours, 120);
    assert_eq!(stored.alarms, "none");
}
