use common::ErrorLocation;

use std::io::Error as IoError;
use std::net::SocketAddr;
use std::panic::Location;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum ListenerError {
    #[error("Bind Error: {address}: {message} {location}")]
    Bind {
        address: SocketAddr,
        message: String,
        location: ErrorLocation,
        #[source]
        source: IoError,
    },

    #[error("Receive Error: {message} {location}")]
    Receive {
        message: String,
        location: ErrorLocation,
        #[source]
        source: IoError,
    },

    #[error("Listener Closed Error: {message} {location}")]
    Closed {
        message: String,
        location: ErrorLocation,
    },
}

impl ListenerError {
    #[track_caller]
    pub fn bind(address: SocketAddr, source: IoError) -> Self {
        ListenerError::Bind {
            address,
            message: source.to_string(),
            location: ErrorLocation::from(Location::caller()),
            source,
        }
    }

    #[track_caller]
    pub fn receive(source: IoError) -> Self {
        ListenerError::Receive {
            message: source.to_string(),
            location: ErrorLocation::from(Location::caller()),
            source,
        }
    }

    #[track_caller]
    pub fn closed() -> Self {
        ListenerError::Closed {
            message: String::from("Wake detection was disabled after a socket failure"),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// True when the port is held by another process.
    pub fn is_address_in_use(&self) -> bool {
        match self {
            ListenerError::Bind { source, .. } => {
                source.kind() == std::io::ErrorKind::AddrInUse
            }
            _ => false,
        }
    }
}
