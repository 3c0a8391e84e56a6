use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "Carewatch";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Database file name inside the data directory.
pub const DATABASE_FILE: &str = "carewatch.db";

/// Get the application data directory (~/Carewatch/).
///
/// Falls back to the current directory when no home directory is known
/// (service accounts, some containers).
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Path of the surveillance database.
pub fn database_path() -> PathBuf {
    app_data_dir().join(DATABASE_FILE)
}

/// Directory holding bundled reference data (knowledge base JSON).
pub fn resources_dir() -> PathBuf {
    app_data_dir().join("resources")
}

/// Filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "carewatch=info,warn"
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("Failed to parse config {path}: {reason}")]
    Parse { path: String, reason: String },

    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Longest acknowledgment window a config may set (two shifts).
pub const MAX_ACKNOWLEDGMENT_VALIDITY_HOURS: i64 = 24;

/// Longest batch lookback a config may set (one year).
pub const MAX_BATCH_LOOKBACK_HOURS: i64 = 24 * 365;

/// Tunables for the surveillance engine and acknowledgment gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurveillanceConfig {
    /// How long an acknowledgment stays valid (one shift).
    pub acknowledgment_validity_hours: i64,
    /// Age at which the "elderly" risk factor applies.
    pub elderly_age_years: u32,
    /// Default lookback window for batch sweeps.
    pub batch_lookback_hours: i64,
}

impl Default for SurveillanceConfig {
    fn default() -> Self {
        Self {
            acknowledgment_validity_hours: 12,
            elderly_age_years: 65,
            batch_lookback_hours: 24,
        }
    }
}

impl SurveillanceConfig {
    /// Load from a JSON file. Missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        config.validate()?;
        if config.acknowledgment_validity_hours != Self::default().acknowledgment_validity_hours {
            tracing::warn!(
                hours = config.acknowledgment_validity_hours,
                "Acknowledgment validity overridden"
            );
        }
        Ok(config)
    }

    /// Reject windows that would make acknowledgments born expired or push
    /// timestamps out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_ACKNOWLEDGMENT_VALIDITY_HOURS).contains(&self.acknowledgment_validity_hours) {
            return Err(ConfigError::Invalid {
                field: "acknowledgment_validity_hours",
                reason: format!(
                    "must be 1-{MAX_ACKNOWLEDGMENT_VALIDITY_HOURS}, got {}",
                    self.acknowledgment_validity_hours
                ),
            });
        }
        if !(1..=MAX_BATCH_LOOKBACK_HOURS).contains(&self.batch_lookback_hours) {
            return Err(ConfigError::Invalid {
                field: "batch_lookback_hours",
                reason: format!(
                    "must be 1-{MAX_BATCH_LOOKBACK_HOURS}, got {}",
                    self.batch_lookback_hours
                ),
            });
        }
        Ok(())
    }
}
