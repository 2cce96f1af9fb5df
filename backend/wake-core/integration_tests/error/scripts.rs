use wake_core::error::CoreError;
use wake_core::error::scripts::ScriptError;

use std::error::Error as StdError;
use std::io::{Error as IoError, ErrorKind};
use std::path::Path;

/// **VALUE**: Verifies spawn errors name the script and interpreter.
///
/// **WHY THIS MATTERS**: "Failed to run script" with no path is useless when the folder holds
/// a dozen scripts.
///
/// **BUG THIS CATCHES**: Would catch the path or program being dropped from the message.
#[test]
fn given_spawn_failure_when_displayed_then_names_script_and_program() {
    // GIVEN: A missing interpreter
    let script = Path::new("/tmp/scripts/a.ps1");
    let io = IoError::new(ErrorKind::NotFound, "program not found");

    // WHEN: Wrapping it
    let err = ScriptError::spawn(script, "powershell.exe", io);
    let shown = err.to_string();

    // THEN: Path, program and cause all present
    assert!(shown.starts_with("Spawn Error: /tmp/scripts/a.ps1"));
    assert!(shown.contains("Failed to start powershell.exe"));
    assert!(shown.contains("program not found"));
    assert_eq!(err.path(), script);
    assert!(err.source().is_some());
}

/// **VALUE**: Verifies every variant reports the directory or file it concerns.
///
/// **BUG THIS CATCHES**: Would catch `path()` returning the wrong field for one variant.
#[test]
fn given_directory_and_scan_errors_when_path_queried_then_returns_directory() {
    let dir = Path::new("/data/WakeOnDisplay/startup-scripts");

    let directory = ScriptError::directory(dir, IoError::new(ErrorKind::PermissionDenied, "denied"));
    let scan = ScriptError::scan(dir, IoError::new(ErrorKind::NotFound, "gone"));

    assert_eq!(directory.path(), dir);
    assert_eq!(scan.path(), dir);
    assert!(directory.to_string().starts_with("Scripts Directory Error:"));
    assert!(scan.to_string().starts_with("Scan Error:"));
}

/// **VALUE**: Verifies the crate-level error forwards the source chain.
///
/// **BUG THIS CATCHES**: Would catch `#[error(transparent)]` being replaced by a wrapper that hides
/// the io cause.
#[test]
fn given_script_error_when_converted_to_core_error_then_source_preserved() {
    let err = ScriptError::scan(Path::new("/x"), IoError::new(ErrorKind::NotFound, "gone"));

    let core: CoreError = err.into();

    assert_eq!(core.source().map(|s| s.to_string()), Some(String::from("gone")));
}
