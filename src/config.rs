use crate::core::{PumpDbError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Top-level site configuration parsed from a TOML file.
///
/// The file carries the per-installation operating limits an operator may
/// edit between deployments. Missing sections fall back to the shipped
/// defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub service_limits: ServiceLimitsConfig,
    #[serde(default)]
    pub pressure: PressureConfig,
    #[serde(default)]
    pub anti_drip: AntiDripConfig,
}

/// Installation identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteConfig {
    pub site_code: String,
}

/// Hour limits before each service counter class blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceLimitsConfig {
    /// Daily hours before the tl counters block
    pub tl_hours_limit: u32,
    /// Total hours before the rb counters block
    pub rb_hours_limit: u32,
    /// Total hours before the bk counters block
    pub bk_hours_limit: u32,
}

/// Pressure thresholds (bar) gating pump starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PressureConfig {
    /// Outlet bar above which pumps never start
    pub outlet_max: u32,
    /// Inlet bar below which pumps do not start
    pub inlet_min: u32,
    /// Inlet bar above which pumps do not start
    pub inlet_max: u32,
}

/// Anti-drip detection parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AntiDripConfig {
    /// Seconds before the start counter resets
    pub check_period_secs: u32,
    /// Starts within the check period that trigger anti-drip mode
    pub max_starts: u32,
    /// Minimum seconds a pump must stay on for a start to count
    pub min_run_secs: u32,
}

impl Default for SiteConfig {
    fn default() -> Self {
        SiteConfig {
            site_code: "default".to_string(),
        }
    }
}

impl Default for ServiceLimitsConfig {
    fn default() -> Self {
        ServiceLimitsConfig {
            tl_hours_limit: 4,
            rb_hours_limit: 720,
            bk_hours_limit: 1080,
        }
    }
}

impl Default for PressureConfig {
    fn default() -> Self {
        PressureConfig {
            outlet_max: 110,
            inlet_min: 0,
            inlet_max: 100,
        }
    }
}

impl Default for AntiDripConfig {
    fn default() -> Self {
        AntiDripConfig {
            check_period_secs: 3600,
            max_starts: 20,
            min_run_secs: 30,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            site: SiteConfig::default(),
            service_limits: ServiceLimitsConfig::default(),
            pressure: PressureConfig::default(),
            anti_drip: AntiDripConfig::default(),
        }
    }
}

impl Config {
    /// Maps the config fields onto their settings-store keys.
    ///
    /// The returned pairs can be written through
    /// `SettingsStore::apply` to make the file values authoritative over
    /// the seeded defaults.
    pub fn settings_overrides(&self) -> Vec<(&'static str, String)> {
        vec![
            ("site_code", self.site.site_code.clone()),
            ("tl_counter_limit", self.service_limits.tl_hours_limit.to_string()),
            ("rb_counter_limit", self.service_limits.rb_hours_limit.to_string()),
            ("bk_counter_limit", self.service_limits.bk_hours_limit.to_string()),
            ("outlet_pressure_max", self.pressure.outlet_max.to_string()),
            ("inlet_pressure_min", self.pressure.inlet_min.to_string()),
            ("inlet_pressure_max", self.pressure.inlet_max.to_string()),
            ("anti_drip_check_period", self.anti_drip.check_period_secs.to_string()),
            ("anti_drip_max_starts", self.anti_drip.max_starts.to_string()),
            ("anti_drip_min_run_secs", self.anti_drip.min_run_secs.to_string()),
        ]
    }

    /// Writes the shipped defaults to `path` as TOML.
    pub fn write_default<P: AsRef<Path>>(path: P) -> Result<()> {
        let content = toml::to_string(&Config::default())
            .map_err(|e| PumpDbError::Config(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Loads the config at `path`, writing the defaults there first when
    /// the file does not exist yet.
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Config> {
        if !path.as_ref().exists() {
            Config::write_default(&path)?;
        }
        load_config(path)
    }
}

/// Loads configuration from a TOML file at the given path.
///
/// # Example
///
/// ```no_run
/// let config = pumpdb::config::load_config("site.toml").expect("Failed to load config");
/// println!("{:?}", config);
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = fs::read_to_string(path)?;
    toml::from_str(&content).map_err(|e| PumpDbError::Config(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CONFIG: &str = r#"
[site]
site_code = "IT-0042"

[service_limits]
tl_hours_limit = 8
rb_hours_limit = 500
bk_hours_limit = 900

[pressure]
outlet_max = 95
inlet_min = 2
inlet_max = 80

[anti_drip]
check_period_secs = 1800
max_starts = 12
min_run_secs = 45
"#;

    #[test]
    fn test_load_config_from_str() {
        let config: Config = toml::from_str(SAMPLE_CONFIG).expect("Failed to parse sample config");
        assert_eq!(config.site.site_code, "IT-0042");
        assert_eq!(config.service_limits.tl_hours_limit, 8);
        assert_eq!(config.pressure.outlet_max, 95);
        assert_eq!(config.anti_drip.max_starts, 12);
    }

    #[test]
    fn test_missing_sections_fall_back_to_defaults() {
        let config: Config = toml::from_str("[pressure]\noutlet_max = 90\ninlet_min = 1\ninlet_max = 60\n")
            .expect("Failed to parse partial config");
        assert_eq!(config.pressure.outlet_max, 90);
        assert_eq!(config.site.site_code, "default");
        assert_eq!(config.service_limits.bk_hours_limit, 1080);
        assert_eq!(config.anti_drip.check_period_secs, 3600);
    }

    #[test]
    fn test_default_round_trips_through_toml() {
        let serialized = toml::to_string(&Config::default()).unwrap();
        let parsed: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_load_or_create_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site.toml");

        let config = Config::load_or_create(&path).unwrap();
        assert_eq!(config, Config::default());
        assert!(path.exists());

        // A second load reads the file it just wrote
        let reloaded = Config::load_or_create(&path).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let result = load_config("/nonexistent/site.toml");
        match result {
            Err(PumpDbError::Io(_)) => {}
            other => panic!("Expected Io error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_settings_overrides_mapping() {
        let overrides = Config::default().settings_overrides();
        assert!(overrides.contains(&("outlet_pressure_max", "110".to_string())));
        assert!(overrides.contains(&("anti_drip_max_starts", "20".to_string())));
        assert!(overrides.contains(&("site_code", "default".to_string())));
    }
}
