use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{
    constants::{
        DRIFT_CAPACITY, DRIFT_INTERVAL_MS, FRAME_INTERVAL_MS, MAX_HZ, RATE_CAPACITY, RATE_DROP_LOOKBACK,
        RATE_DROP_RATIO, RATE_INTERVAL_MS,
    },
    error::ScopeError,
};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DriftPanelConfig {
    pub capacity: usize,
    pub interval_ms: u64,
}

impl Default for DriftPanelConfig {
    fn default() -> Self {
        Self {
            capacity: DRIFT_CAPACITY,
            interval_ms: DRIFT_INTERVAL_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RatePanelConfig {
    pub capacity: usize,
    pub interval_ms: u64,
    pub max_hz: f64,
    pub drop_ratio: f64,
    pub drop_lookback: usize,
}

impl Default for RatePanelConfig {
    fn default() -> Self {
        Self {
            capacity: RATE_CAPACITY,
            interval_ms: RATE_INTERVAL_MS,
            max_hz: MAX_HZ,
            drop_ratio: RATE_DROP_RATIO,
            drop_lookback: RATE_DROP_LOOKBACK,
        }
    }
}

/// Dashboard configuration, read once at startup.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub frame_interval_ms: u64,
    pub log_level: String,
    pub log_file: PathBuf,
    pub drift: DriftPanelConfig,
    pub rate: RatePanelConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            frame_interval_ms: FRAME_INTERVAL_MS,
            log_level: "info".to_string(),
            log_file: PathBuf::from("telemetry_scope.log"),
            drift: DriftPanelConfig::default(),
            rate: RatePanelConfig::default(),
        }
    }
}

impl Config {
    pub fn from_toml(text: &str) -> Result<Self, ScopeError> {
        let config: Config = toml::from_str(text).map_err(|e| ScopeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ScopeError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    /// Load `path` if given, else the per-user default file if it exists,
    /// else built-in defaults.
    pub fn resolve(path: Option<&Path>) -> Result<Self, ScopeError> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match default_path() {
            Some(p) if p.exists() => Self::load(&p),
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ScopeError> {
        if self.drift.capacity == 0 || self.rate.capacity == 0 {
            return Err(ScopeError::InvalidCapacity);
        }
        if self.frame_interval_ms == 0 || self.drift.interval_ms == 0 || self.rate.interval_ms == 0 {
            return Err(ScopeError::Config("intervals must be positive".into()));
        }
        if !(self.rate.max_hz > 0.0) {
            return Err(ScopeError::Config(format!("max_hz must be positive, got {}", self.rate.max_hz)));
        }
        if !(0.0..=1.0).contains(&self.rate.drop_ratio) {
            return Err(ScopeError::Config(format!("drop_ratio must be in [0, 1], got {}", self.rate.drop_ratio)));
        }
        Ok(())
    }
}

pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("telemetry_scope").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = Config::from_toml("[rate]\nmax_hz = 50.0\n").unwrap();
        assert_eq!(cfg.rate.max_hz, 50.0);
        assert_eq!(cfg.rate.capacity, RATE_CAPACITY);
        assert_eq!(cfg.drift.interval_ms, DRIFT_INTERVAL_MS);
    }

    #[test]
    fn zero_capacity_is_invalid() {
        let err = Config::from_toml("[drift]\ncapacity = 0\n").unwrap_err();
        assert!(matches!(err, ScopeError::InvalidCapacity));
    }

    #[test]
    fn negative_capacity_fails_to_parse() {
        assert!(matches!(Config::from_toml("[drift]\ncapacity = -3\n"), Err(ScopeError::Config(_))));
    }

    #[test]
    fn bad_rate_settings_rejected() {
        assert!(Config::from_toml("[rate]\nmax_hz = 0.0\n").is_err());
        assert!(Config::from_toml("[rate]\ndrop_ratio = 1.5\n").is_err());
        assert!(Config::from_toml("frame_interval_ms = 0\n").is_err());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "log_level = \"debug\"\n[drift]\ncapacity = 120").unwrap();
        let cfg = Config::resolve(Some(file.path())).unwrap();
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.drift.capacity, 120);
    }

    #[test]
    fn missing_explicit_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::resolve(Some(dir.path().join("nope.toml").as_path())).unwrap_err();
        assert!(matches!(err, ScopeError::Io(_)));
    }
}
