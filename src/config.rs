use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::chart::DEFAULT_VO2MAX_AXIS_MAX;
use crate::logging::LogConfig;
use crate::models::{Gender, DEFAULT_AGE, DEFAULT_VO2MAX, MIN_AGE};

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Application metadata
    pub metadata: ConfigMetadata,

    /// HTTP server binding
    pub server: ServerSettings,

    /// Values used when a request leaves an input empty
    pub defaults: InputDefaults,

    /// Chart rendering settings
    pub chart: ChartSettings,

    /// Logging settings
    pub logging: LogConfig,
}

/// Configuration metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Configuration format version
    pub version: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputDefaults {
    /// No gender is preselected unless configured
    pub gender: Option<Gender>,

    /// Starting age in years
    pub age: i32,

    /// Starting VO2max in ml/kg/min
    pub vo2max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartSettings {
    /// Upper bound of the VO2max axis
    pub vo2max_axis_max: f64,

    /// SVG width in pixels
    pub width: u32,

    /// SVG height in pixels
    pub height: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            metadata: ConfigMetadata::default(),
            server: ServerSettings::default(),
            defaults: InputDefaults::default(),
            chart: ChartSettings::default(),
            logging: LogConfig::default(),
        }
    }
}

impl Default for ConfigMetadata {
    fn default() -> Self {
        let now = Utc::now();
        ConfigMetadata {
            version: "1.0".to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        ServerSettings {
            host: "127.0.0.1".to_string(),
            port: 8050,
        }
    }
}

impl Default for InputDefaults {
    fn default() -> Self {
        InputDefaults {
            gender: None,
            age: DEFAULT_AGE,
            vo2max: DEFAULT_VO2MAX,
        }
    }
}

impl Default for ChartSettings {
    fn default() -> Self {
        ChartSettings {
            vo2max_axis_max: DEFAULT_VO2MAX_AXIS_MAX,
            width: 900,
            height: 600,
        }
    }
}

/// Configuration management implementation
impl AppConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: AppConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.metadata.updated_at = Utc::now();

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml_content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".vo2trend")
            .join("config.toml")
    }

    /// Load from `path` (or the default location), falling back to defaults
    /// when the file does not exist
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let config_path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::default_config_path);

        if !config_path.exists() {
            if path.is_some() {
                return Err(anyhow!("Config file not found: {}", config_path.display()));
            }
            tracing::debug!(path = %config_path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        Self::load_from_file(&config_path)
    }

    /// Check values that would make the server or chart unusable
    pub fn validate(&self) -> Result<()> {
        if self.server.host.trim().is_empty() {
            return Err(anyhow!("server.host must not be empty"));
        }
        if !(self.chart.vo2max_axis_max.is_finite() && self.chart.vo2max_axis_max > 0.0) {
            return Err(anyhow!("chart.vo2max_axis_max must be a positive number"));
        }
        if self.chart.width == 0 || self.chart.height == 0 {
            return Err(anyhow!("chart.width and chart.height must be non-zero"));
        }
        if self.defaults.age < MIN_AGE {
            return Err(anyhow!("defaults.age must be at least {}", MIN_AGE));
        }
        if !self.defaults.vo2max.is_finite() {
            return Err(anyhow!("defaults.vo2max must be a finite number"));
        }
        Ok(())
    }

    /// Keys accepted by [`AppConfig::get`] and [`AppConfig::set`]
    pub fn keys() -> &'static [&'static str] {
        &[
            "server.host",
            "server.port",
            "defaults.gender",
            "defaults.age",
            "defaults.vo2max",
            "chart.vo2max_axis_max",
            "chart.width",
            "chart.height",
            "logging.level",
            "logging.format",
        ]
    }

    /// Read a value by dotted key
    pub fn get(&self, key: &str) -> Result<String> {
        let value = match key {
            "server.host" => self.server.host.clone(),
            "server.port" => self.server.port.to_string(),
            "defaults.gender" => self
                .defaults
                .gender
                .map(|g| g.to_string().to_lowercase())
                .unwrap_or_default(),
            "defaults.age" => self.defaults.age.to_string(),
            "defaults.vo2max" => self.defaults.vo2max.to_string(),
            "chart.vo2max_axis_max" => self.chart.vo2max_axis_max.to_string(),
            "chart.width" => self.chart.width.to_string(),
            "chart.height" => self.chart.height.to_string(),
            "logging.level" => self.logging.level.to_filter(),
            "logging.format" => format!("{:?}", self.logging.format).to_lowercase(),
            _ => return Err(anyhow!("Unknown configuration key: {}", key)),
        };
        Ok(value)
    }

    /// Set a value by dotted key, validating the result
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let invalid = || format!("Invalid value for {}: {}", key, value);
        match key {
            "server.host" => self.server.host = value.to_string(),
            "server.port" => self.server.port = value.parse().with_context(invalid)?,
            "defaults.gender" => {
                self.defaults.gender = if value.trim().is_empty() {
                    None
                } else {
                    Some(value.parse().with_context(invalid)?)
                }
            }
            "defaults.age" => self.defaults.age = value.parse().with_context(invalid)?,
            "defaults.vo2max" => self.defaults.vo2max = value.parse().with_context(invalid)?,
            "chart.vo2max_axis_max" => {
                self.chart.vo2max_axis_max = value.parse().with_context(invalid)?
            }
            "chart.width" => self.chart.width = value.parse().with_context(invalid)?,
            "chart.height" => self.chart.height = value.parse().with_context(invalid)?,
            "logging.level" => {
                self.logging.level = value.parse().map_err(|e: String| anyhow!(e))?
            }
            "logging.format" => {
                self.logging.format = value.parse().map_err(|e: String| anyhow!(e))?
            }
            _ => return Err(anyhow!("Unknown configuration key: {}", key)),
        }
        self.validate()
    }
}
