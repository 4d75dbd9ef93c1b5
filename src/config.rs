//! Configuration system for crosswl
//!
//! Loads configuration from TOML file at `~/.config/crosswl/config.toml`
//! Auto-generates default config file on first run if missing.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::transform::{ScaleConfig, ScalePair};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scale: ScaleSection,
    pub identity: IdentityConfig,
    pub channel: ChannelConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from `path`, or from the default location.
    ///
    /// A missing file at the default location is created with defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::config_path()?,
        };

        if !config_path.exists() {
            if path.is_some() {
                bail!("Config file {:?} does not exist", config_path);
            }
            info!("Config file not found at {:?}, using defaults", config_path);
            if let Err(e) = Self::save_default(&config_path) {
                warn!("Failed to create default config file: {}", e);
            }
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file {:?}", config_path))?;
        let config = Self::parse(&content)?;

        info!("Configuration loaded from {:?}", config_path);
        debug!("Config: {:?}", config);

        Ok(config)
    }

    /// Parse and validate TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let scale = &self.scale;
        for (name, value) in [
            ("scale.factor", scale.factor),
            ("scale.direct_x", scale.direct_x),
            ("scale.direct_y", scale.direct_y),
        ] {
            if !(value > 0.0 && value.is_finite()) {
                bail!("{} must be a positive number, got {}", name, value);
            }
        }
        Ok(())
    }

    /// Get the path to the config file
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("crosswl");

        Ok(config_dir.join("config.toml"))
    }

    /// Save default configuration to file
    fn save_default(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let toml_string = toml::to_string_pretty(&Self::default())
            .context("Failed to serialize default config")?;

        fs::write(path, toml_string).context("Failed to write default config file")?;

        info!("Created default config file at {:?}", path);
        Ok(())
    }
}

/// Scale configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleSection {
    /// Global scale factor between guest pixels and host logical units
    pub factor: f64,
    /// Use per-axis direct scale instead of the uniform factor
    pub direct: bool,
    pub direct_x: f64,
    pub direct_y: f64,
}

impl Default for ScaleSection {
    fn default() -> Self {
        Self {
            factor: 1.0,
            direct: false,
            direct_x: 1.0,
            direct_y: 1.0,
        }
    }
}

impl ScaleSection {
    pub fn to_scale_config(&self) -> ScaleConfig {
        if self.direct {
            ScaleConfig::direct(self.factor, ScalePair::new(self.direct_x, self.direct_y))
        } else {
            ScaleConfig::uniform(self.factor)
        }
    }
}

/// Application identity configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Application id forced onto every window
    pub application_id: Option<String>,
    /// Guest identifier embedded in derived ids
    pub vm_id: String,
    pub prefix: String,
    /// X11 property holding a per-window application id
    pub app_id_property: Option<String>,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            application_id: None,
            vm_id: "guest".into(),
            prefix: "org.chromium".into(),
            app_id_property: None,
        }
    }
}

/// Host channel configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Unix socket of the host transport. Requests are only traced when unset.
    pub socket: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive, overridden by `RUST_LOG`
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "crosswl=info".into(),
        }
    }
}
