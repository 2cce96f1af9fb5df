use common::ErrorLocation;

use std::io::Error as IoError;
use std::path::{Path, PathBuf};
use std::panic::Location;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum ScriptError {
    #[error("Scripts Directory Error: {path}: {message} {location}")]
    Directory {
        path: PathBuf,
        message: String,
        location: ErrorLocation,
        #[source]
        source: IoError,
    },

    #[error("Scan Error: {path}: {message} {location}")]
    Scan {
        path: PathBuf,
        message: String,
        location: ErrorLocation,
        #[source]
        source: IoError,
    },

    #[error("Spawn Error: {path}: {message} {location}")]
    Spawn {
        path: PathBuf,
        message: String,
        location: ErrorLocation,
        #[source]
        source: IoError,
    },
}

impl ScriptError {
    #[track_caller]
    pub fn directory(path: &Path, source: IoError) -> Self {
        ScriptError::Directory {
            path: path.to_path_buf(),
            message: format!("Failed to prepare scripts directory: {source}"),
            location: ErrorLocation::from(Location::caller()),
            source,
        }
    }

    #[track_caller]
    pub fn scan(path: &Path, source: IoError) -> Self {
        ScriptError::Scan {
            path: path.to_path_buf(),
            message: format!("Failed to read scripts directory: {source}"),
            location: ErrorLocation::from(Location::caller()),
            source,
        }
    }

    #[track_caller]
    pub fn spawn(path: &Path, program: &str, source: IoError) -> Self {
        ScriptError::Spawn {
            path: path.to_path_buf(),
            message: format!("Failed to start {program}: {source}"),
            location: ErrorLocation::from(Location::caller()),
            source,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            ScriptError::Directory { path, .. }
            | ScriptError::Scan { path, .. }
            | ScriptError::Spawn { path, .. } => path,
        }
    }
}
