//! Wiring of the core components for one process lifetime.

use crate::error::WakeOnDisplayError;
use crate::paths::AppPaths;

use common::ErrorLocation;

use wake_core::config::WakeConfig;
use wake_core::display::DisplayWaker;
use wake_core::listener::MagicPacketListener;
use wake_core::scripts::{BatchOutcome, ScriptEngine, ensure_scripts_dir};

use std::net::SocketAddr;
use std::panic::Location;
use std::path::{Path, PathBuf};

use log::info;

pub struct WakeService {
    engine: ScriptEngine,
    listener: MagicPacketListener,
}

impl WakeService {
    pub fn new(config: &WakeConfig, paths: &AppPaths) -> Self {
        let engine = ScriptEngine::new(config.execution_settings(&paths.data_dir));
        Self::with_engine(config, engine)
    }

    /// Build around an already configured engine; the listener shares its guard.
    pub fn with_engine(config: &WakeConfig, engine: ScriptEngine) -> Self {
        let waker = if config.display.enabled {
            DisplayWaker::new(config.keep_awake())
        } else {
            info!("Display wake disabled by configuration");
            DisplayWaker::disabled()
        };

        let listener =
            MagicPacketListener::new(engine.clone(), waker).with_bind_addr(config.bind_addr());

        Self { engine, listener }
    }

    pub fn engine(&self) -> &ScriptEngine {
        &self.engine
    }

    pub fn listener(&self) -> &MagicPacketListener {
        &self.listener
    }

    pub fn scripts_dir(&self) -> &Path {
        &self.engine.settings().scripts_dir
    }

    /// Create the scripts directory so the user can find it before the first wake.
    pub async fn prepare_scripts_dir(&self) -> Result<PathBuf, WakeOnDisplayError> {
        ensure_scripts_dir(self.scripts_dir())
            .await
            .map_err(|e| WakeOnDisplayError::Core {
                message: e.to_string(),
                location: ErrorLocation::from(Location::caller()),
            })
    }

    /// Start passive wake detection.
    ///
    /// An `Err` here means detection is disabled for this run; the listener
    /// has already told its notifier.
    pub async fn start_listener(&self) -> Result<SocketAddr, WakeOnDisplayError> {
        self.listener
            .start()
            .await
            .map_err(|e| WakeOnDisplayError::Core {
                message: e.to_string(),
                location: ErrorLocation::from(Location::caller()),
            })
    }

    /// Run the startup scripts outside of a wake event.
    pub async fn execute_startup_scripts(&self) -> BatchOutcome {
        self.engine.execute_startup_scripts().await
    }
}
