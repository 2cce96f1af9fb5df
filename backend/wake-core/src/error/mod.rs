pub mod config;
pub mod listener;
pub mod scripts;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Listener(#[from] listener::ListenerError),

    #[error(transparent)]
    Script(#[from] scripts::ScriptError),

    #[error(transparent)]
    Config(#[from] config::ConfigError),
}
