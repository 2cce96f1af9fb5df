pub mod config;
pub mod display;
pub mod error;
pub mod listener;
pub mod magic_packet;
pub mod network;
pub mod platform;
pub mod scripts;

#[cfg(test)]
mod tests;

pub const APP_NAME: &str = "WakeOnDisplay";
pub const STARTUP_SCRIPTS_DIR_NAME: &str = "startup-scripts";

/// Conventional Wake-on-LAN listening port.
pub const WOL_PORT: u16 = 9;
