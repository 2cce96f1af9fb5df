use wakeondisplay::error::WakeOnDisplayError;
use wakeondisplay::logger::initialize as LoggerInitialize;
use wakeondisplay::paths::AppPaths;
use wakeondisplay::service::WakeService;

use wake_core::APP_NAME;
use wake_core::config::WakeConfig;
use wake_core::platform::Platform;

use common::ErrorLocation;

use std::panic::Location;

use log::{info, warn};

#[tokio::main]
async fn main() -> Result<(), WakeOnDisplayError> {
    let paths = AppPaths::resolve()?;
    paths.ensure()?;

    // Logger FIRST so everything below is recorded
    LoggerInitialize(&paths.log_dir)?;

    info!("{APP_NAME} starting on {}", Platform::current());
    info!("Log directory: {}", paths.log_dir.display());

    let config = WakeConfig::load(&paths.config_dir).unwrap_or_else(|e| {
        warn!("Ignoring unusable config, using defaults: {e}");
        WakeConfig::default()
    });

    let service = WakeService::new(&config, &paths);

    match service.prepare_scripts_dir().await {
        Ok(dir) => info!("Place startup scripts in {}", dir.display()),
        Err(e) => warn!("Startup scripts directory unavailable: {e}"),
    }

    if let Err(e) = service.start_listener().await {
        warn!("Continuing without wake detection: {e}");
    }

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| WakeOnDisplayError::App {
            message: format!("Failed to wait for shutdown signal: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })?;

    info!("{APP_NAME} shutting down");
    Ok(())
}
