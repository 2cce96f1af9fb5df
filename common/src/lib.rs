//! Shared types for WakeOnDisplay.
//!
//! This crate holds the small leaf types every other crate in the workspace
//! depends on. It has no business logic.
//!
//! ## Architecture
//!
//! - **common** (this crate): Shared leaf types
//! - **wake-core**: Packet detection, display wake, and script execution
//! - **wakeondisplay**: Host application wiring everything together

pub mod error;

pub use error::error_location::ErrorLocation;
