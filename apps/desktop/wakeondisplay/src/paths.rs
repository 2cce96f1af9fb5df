//! Per-user directories.

use crate::error::WakeOnDisplayError;

use common::ErrorLocation;

use wake_core::APP_NAME;

use std::fs::create_dir_all;
use std::panic::Location;
use std::path::{Path, PathBuf};

const LOG_DIR_NAME: &str = "logs";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    /// `<data_dir>/WakeOnDisplay`; the startup scripts live under it.
    pub data_dir: PathBuf,
    /// `<config_dir>/WakeOnDisplay`, holds `config.json`.
    pub config_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl AppPaths {
    /// Resolve the platform's per-user data and config directories.
    #[track_caller]
    pub fn resolve() -> Result<Self, WakeOnDisplayError> {
        let data_root = dirs::data_dir().ok_or_else(|| WakeOnDisplayError::App {
            message: String::from("Could not determine the user data directory"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let config_root = dirs::config_dir().ok_or_else(|| WakeOnDisplayError::App {
            message: String::from("Could not determine the user config directory"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        Ok(Self::from_roots(&data_root, &config_root))
    }

    /// All directories under a single root; used by tests and portable installs.
    pub fn under(root: &Path) -> Self {
        Self::from_roots(&root.join("data"), &root.join("config"))
    }

    fn from_roots(data_root: &Path, config_root: &Path) -> Self {
        let data_dir = data_root.join(APP_NAME);
        Self {
            log_dir: data_dir.join(LOG_DIR_NAME),
            config_dir: config_root.join(APP_NAME),
            data_dir,
        }
    }

    /// Create the config and log directories (and the data dir above the logs).
    #[track_caller]
    pub fn ensure(&self) -> Result<(), WakeOnDisplayError> {
        for dir in [&self.config_dir, &self.log_dir] {
            create_dir_all(dir).map_err(|e| WakeOnDisplayError::App {
                message: format!("Failed to create directory {}: {e}", dir.display()),
                location: ErrorLocation::from(Location::caller()),
            })?;
        }
        Ok(())
    }
}
