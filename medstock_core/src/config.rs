//! Configuration file support for medstock.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/medstock/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub medication: MedicationConfig,

    #[serde(default)]
    pub display: DisplayConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Medication stock thresholds
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MedicationConfig {
    /// Days of stock remaining at which an "order more" action is raised
    #[serde(default = "default_order_lead_time_days")]
    pub order_lead_time_days: u32,

    #[serde(default = "default_days_remaining_warning_days")]
    pub days_remaining_warning_days: u32,

    #[serde(default = "default_days_remaining_critical_days")]
    pub days_remaining_critical_days: u32,
}

impl Default for MedicationConfig {
    fn default() -> Self {
        Self {
            order_lead_time_days: default_order_lead_time_days(),
            days_remaining_warning_days: default_days_remaining_warning_days(),
            days_remaining_critical_days: default_days_remaining_critical_days(),
        }
    }
}

/// Listing configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("medstock")
}

fn default_order_lead_time_days() -> u32 {
    14
}

fn default_days_remaining_warning_days() -> u32 {
    14
}

fn default_days_remaining_critical_days() -> u32 {
    7
}

fn default_page_size() -> usize {
    50
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Check that the thresholds are consistent
    pub fn validate(&self) -> Result<()> {
        let medication = &self.medication;
        if medication.days_remaining_critical_days > medication.days_remaining_warning_days {
            return Err(Error::Config(format!(
                "critical threshold ({} days) exceeds warning threshold ({} days)",
                medication.days_remaining_critical_days, medication.days_remaining_warning_days
            )));
        }
        if self.display.page_size == 0 {
            return Err(Error::Config("page_size must be at least 1".into()));
        }
        Ok(())
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("medstock").join("config.toml")
    }

    /// Path of the data snapshot inside the configured data directory
    pub fn data_file(&self) -> PathBuf {
        self.data.data_dir.join(crate::data::DATA_FILE_NAME)
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.medication.order_lead_time_days, 14);
        assert_eq!(config.medication.days_remaining_warning_days, 14);
        assert_eq!(config.medication.days_remaining_critical_days, 7);
        assert_eq!(config.display.page_size, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(
            config.medication.order_lead_time_days,
            parsed.medication.order_lead_time_days
        );
        assert_eq!(config.data.data_dir, parsed.data.data_dir);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[medication]
order_lead_time_days = 21
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.medication.order_lead_time_days, 21);
        assert_eq!(config.medication.days_remaining_critical_days, 7); // default
    }

    #[test]
    fn test_inconsistent_thresholds_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[medication]\ndays_remaining_warning_days = 3\ndays_remaining_critical_days = 5\n",
        )
        .unwrap();

        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_save_and_load_from() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.data.data_dir = temp_dir.path().join("data");
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.data.data_dir, temp_dir.path().join("data"));
        assert_eq!(loaded.data_file(), temp_dir.path().join("data").join("medstock.json"));
    }
}
