//! Core configuration, persisted as `config.json` in the per-user config dir.

use crate::error::config::ConfigError;
use crate::scripts::ExecutionSettings;
use crate::{STARTUP_SCRIPTS_DIR_NAME, WOL_PORT};

use common::ErrorLocation;

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Serialize};

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_VERSION: u32 = 1;
const MAX_KILL_GRACE_SECS: u64 = 60;
const MAX_KEEP_AWAKE_SECS: u64 = 600;

// ============================================
// CONFIG STRUCTS
// ============================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptsConfig {
    #[serde(default)]
    pub directory_override: Option<String>,
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_kill_grace_secs")]
    pub kill_grace_secs: u64,
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self {
            directory_override: None,
            cooldown_secs: default_cooldown_secs(),
            timeout_secs: default_timeout_secs(),
            kill_grace_secs: default_kill_grace_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_display_enabled")]
    pub enabled: bool,
    #[serde(default = "default_keep_awake_secs")]
    pub keep_awake_secs: u64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            enabled: default_display_enabled(),
            keep_awake_secs: default_keep_awake_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WakeConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub listener: ListenerConfig,

    #[serde(default)]
    pub scripts: ScriptsConfig,

    #[serde(default)]
    pub display: DisplayConfig,
}

impl Default for WakeConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            listener: ListenerConfig::default(),
            scripts: ScriptsConfig::default(),
            display: DisplayConfig::default(),
        }
    }
}

// ============================================
// DEFAULT FUNCTIONS
// ============================================

fn default_version() -> u32 {
    CONFIG_VERSION
}
fn default_bind_address() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}
fn default_port() -> u16 {
    WOL_PORT
}
fn default_cooldown_secs() -> u64 {
    30
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_kill_grace_secs() -> u64 {
    2
}
fn default_display_enabled() -> bool {
    true
}
fn default_keep_awake_secs() -> u64 {
    20
}

// ============================================
// IMPLEMENTATION
// ============================================

impl WakeConfig {
    /// Load config from {config_dir}/config.json.
    ///
    /// # Returns
    ///
    /// Returns `Ok(WakeConfig)` if loaded successfully or defaults if file missing.
    /// Returns `Err(ConfigError)` if file exists but is corrupted/invalid.
    pub fn load(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            info!(
                "Config file not found at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path).map_err(|e| {
            warn!("Failed to read config file: {}", e);
            ConfigError::ReadError {
                location: ErrorLocation::from(Location::caller()),
                path: config_path.clone(),
                source: e,
            }
        })?;

        let config: WakeConfig = serde_json::from_str(&contents).map_err(|e| {
            warn!("Failed to parse config JSON: {}", e);
            ConfigError::ParseError {
                location: ErrorLocation::from(Location::caller()),
                path: config_path.clone(),
                reason: e.to_string(),
            }
        })?;

        config.validate()?;

        info!("Config loaded from {}", config_path.display());
        Ok(config)
    }

    /// Save config to {config_dir}/config.json using temp file + rename.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        self.validate()?;

        std::fs::create_dir_all(config_dir).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: config_dir.to_path_buf(),
            source: e,
        })?;

        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let temp_path = config_dir.join(format!("{}.tmp", CONFIG_FILE_NAME));

        let json = serde_json::to_string_pretty(self).map_err(|e| ConfigError::SerializeError {
            location: ErrorLocation::from(Location::caller()),
            reason: e.to_string(),
        })?;

        std::fs::write(&temp_path, json).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: temp_path.clone(),
            source: e,
        })?;

        std::fs::rename(&temp_path, &config_path).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: config_path.clone(),
            source: e,
        })?;

        info!("Config saved to {}", config_path.display());
        Ok(())
    }

    /// Validate config values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version == 0 || self.version > CONFIG_VERSION {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!(
                    "Invalid version: {} (expected 1-{})",
                    self.version, CONFIG_VERSION
                ),
            });
        }

        if self.scripts.timeout_secs == 0 {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: String::from("scripts.timeout_secs must be at least 1"),
            });
        }

        if self.scripts.kill_grace_secs == 0 || self.scripts.kill_grace_secs > MAX_KILL_GRACE_SECS {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!(
                    "Invalid kill grace: {}s (must be 1-{MAX_KILL_GRACE_SECS})",
                    self.scripts.kill_grace_secs
                ),
            });
        }

        if self.display.keep_awake_secs == 0 || self.display.keep_awake_secs > MAX_KEEP_AWAKE_SECS
        {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!(
                    "Invalid keep-awake duration: {}s (must be 1-{MAX_KEEP_AWAKE_SECS})",
                    self.display.keep_awake_secs
                ),
            });
        }

        if let Some(ref dir) = self.scripts.directory_override
            && dir.trim().is_empty()
        {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: String::from("scripts.directory_override cannot be empty string"),
            });
        }

        Ok(())
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.listener.bind_address, self.listener.port)
    }

    /// Scripts directory: the override if set, else `{data_dir}/startup-scripts`.
    pub fn scripts_dir(&self, data_dir: &Path) -> PathBuf {
        match self.scripts.directory_override {
            Some(ref dir) => PathBuf::from(dir),
            None => data_dir.join(STARTUP_SCRIPTS_DIR_NAME),
        }
    }

    pub fn execution_settings(&self, data_dir: &Path) -> ExecutionSettings {
        ExecutionSettings::new(self.scripts_dir(data_dir))
            .with_cooldown(Duration::from_secs(self.scripts.cooldown_secs))
            .with_timeout(Duration::from_secs(self.scripts.timeout_secs))
            .with_kill_grace(Duration::from_secs(self.scripts.kill_grace_secs))
    }

    pub fn keep_awake(&self) -> Duration {
        Duration::from_secs(self.display.keep_awake_secs)
    }
}
