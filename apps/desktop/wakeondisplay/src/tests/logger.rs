// Unit tests for logger module initialization logic
// Only one test touches the global logger; the rest exercise the file sink directly

use crate::logger::{LOG_FILE_NAME, initialize, open_log_file, source_label};

use wake_core::scripts::SCRIPT_OUTPUT_TARGET;

use std::path::PathBuf;

/// **VALUE**: Verifies that calling initialize() multiple times doesn't panic or fail.
///
/// **WHY THIS MATTERS**: A second install of a global logger makes fern return an
/// error; if that surfaced, startup would abort for no real reason.
///
/// **BUG THIS CATCHES**: Would catch the Once or AtomicBool guards being removed.
#[test]
fn given_logger_initialized_when_called_again_then_returns_ok() {
    // GIVEN: A valid temporary directory
    let temp_dir = tempfile::tempdir().unwrap();

    // WHEN: Calling initialize twice
    let result1 = initialize(temp_dir.path());
    let result2 = initialize(temp_dir.path());

    // THEN: Both return Ok and the log file exists
    assert!(result1.is_ok(), "First initialization should succeed");
    assert!(
        result2.is_ok(),
        "Second initialization should succeed (idempotent)"
    );
    assert!(temp_dir.path().join(LOG_FILE_NAME).exists());
}

/// **VALUE**: Verifies an unwritable log directory is an error, not a panic.
///
/// **WHY THIS MATTERS**: A read-only profile or full disk must give a clear message.
///
/// **BUG THIS CATCHES**: Would catch `fern::log_file()` being unwrapped.
#[test]
fn given_invalid_log_dir_when_opening_log_file_then_returns_error() {
    // GIVEN: A directory path nested under a regular file
    let temp_dir = tempfile::tempdir().unwrap();
    let file = temp_dir.path().join("not-a-dir");
    std::fs::write(&file, "").unwrap();
    let invalid_dir: PathBuf = file.join("logs");

    // WHEN: Opening the log file there
    let result = open_log_file(&invalid_dir);

    // THEN: Error naming the log file
    let err = result.expect_err("Should fail for invalid log directory");
    let shown = err.to_string();
    assert!(shown.contains("Failed to create log file"), "{shown}");
    assert!(shown.contains(LOG_FILE_NAME), "{shown}");
}

/// **VALUE**: Verifies the log file is appended to, not truncated, across runs.
///
/// **BUG THIS CATCHES**: Would catch a switch to `File::create`, losing the previous session's log.
#[test]
fn given_existing_log_when_opened_again_then_contents_kept() {
    use std::io::Write;

    let temp_dir = tempfile::tempdir().unwrap();
    let log_path = temp_dir.path().join(LOG_FILE_NAME);
    std::fs::write(&log_path, "previous session\n").unwrap();

    let mut file = open_log_file(temp_dir.path()).unwrap();
    writeln!(file, "new session").unwrap();
    drop(file);

    let contents = std::fs::read_to_string(&log_path).unwrap();
    assert_eq!(contents, "previous session\nnew session\n");
}

/// **VALUE**: Verifies captured script output is tagged as such instead of with a source location.
///
/// **WHY THIS MATTERS**: Every script line is emitted from the same spot in the supervisor; users
/// reading the log need to tell script output from the app's own messages.
///
/// **BUG THIS CATCHES**: Would catch script lines carrying a misleading `supervisor.rs:NN` suffix,
/// or ordinary records losing their file and line.
#[test]
fn given_record_targets_when_labelled_then_script_output_marked_and_others_located() {
    // WHEN: Labelling a script output record and a core record
    let script = source_label(SCRIPT_OUTPUT_TARGET, Some("src/scripts/supervisor.rs"), Some(150));
    let core = source_label("wake_core::listener", Some("src/listener/mod.rs"), Some(42));
    let bare = source_label("wake_core::listener", None, None);

    // THEN: Script output is marked, others keep file:line
    assert_eq!(script, "script");
    assert_eq!(core, "src/listener/mod.rs:42");
    assert_eq!(bare, "unknown:0");
}
