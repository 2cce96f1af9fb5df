use common::ErrorLocation;

use thiserror::Error;

/// Errors raised by the host application.
///
/// Core failures are flattened to a message here; the core error already
/// logged its own source chain.
#[derive(Debug, Error)]
pub enum WakeOnDisplayError {
    /// Error from this App (directories, logger, signals)
    #[error("WakeOnDisplay Error: {message} {location}")]
    App {
        message: String,
        location: ErrorLocation,
    },

    /// Error from wake-core operations (scripts directory, listener)
    #[error("Core Error: {message} {location}")]
    Core {
        message: String,
        location: ErrorLocation,
    },
}
