use crate::helpers::{
    SlowProbe, SwitchableProbe, append_line, engine_for, read_lines, write_script,
};

use wake_core::scripts::{BatchOutcome, ExecutionSettings, ScriptEngine, ScriptOutcome, SkipReason};

use std::sync::Arc;
use std::time::{Duration, Instant};

// ============================================================================
// Public API tests for the script execution engine
// These drive execute_startup_scripts() against real /bin/sh processes
// ============================================================================

const NO_COOLDOWN: Duration = Duration::ZERO;
const LONG_COOLDOWN: Duration = Duration::from_secs(30);

fn expect_ran(outcome: BatchOutcome) -> wake_core::scripts::BatchReport {
    match outcome {
        BatchOutcome::Ran(report) => report,
        other => panic!("Expected batch to run, got {other:?}"),
    }
}

/// **VALUE**: End-to-end check of discovery + dispatch on the documented fixture.
///
/// **WHY THIS MATTERS**: Given `a.sh`, `b.sh`, a symlink `c.sh` and a dotfile `.d.sh`, exactly
/// `a.sh` then `b.sh` must run. This is the user-visible contract of the scripts folder.
///
/// **BUG THIS CATCHES**: Would catch symlinks or dotfiles being executed, or dispatch order
/// depending on directory iteration order.
#[cfg(unix)]
#[tokio::test]
async fn given_scripts_symlink_and_dotfile_when_executed_then_only_regular_scripts_run_in_order() {
    // GIVEN: The fixture directory and a marker file outside it
    let scripts = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let marker = work.path().join("ran.txt");

    write_script(scripts.path(), "b.sh", &append_line(&marker, "b"));
    write_script(scripts.path(), "a.sh", &append_line(&marker, "a"));
    write_script(scripts.path(), ".d.sh", &append_line(&marker, "d"));
    let target = write_script(work.path(), "target.sh", &append_line(&marker, "c"));
    std::os::unix::fs::symlink(&target, scripts.path().join("c.sh")).unwrap();

    let engine = engine_for(scripts.path(), NO_COOLDOWN);

    // WHEN: Executing and waiting for completion
    let report = expect_ran(engine.execute_startup_scripts().await);
    let names: Vec<String> = report
        .dispatched_paths()
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    let outcomes = report.wait_all().await;

    // THEN: a.sh and b.sh dispatched in order, both succeeded, nothing else ran
    assert_eq!(names, vec!["a.sh", "b.sh"]);
    assert!(outcomes.iter().all(|(_, o)| o.is_success()));

    let mut lines = read_lines(&marker);
    lines.sort();
    assert_eq!(lines, vec!["a", "b"]);
}

/// **VALUE**: Verifies a second call inside the cooldown is a no-op that never rescans.
///
/// **WHY THIS MATTERS**: Wake tools often send the magic packet several times in a row; the user's
/// scripts must run once per wake, not once per packet.
///
/// **BUG THIS CATCHES**: Would catch the cooldown being checked after the scan, or not at all.
#[cfg(unix)]
#[tokio::test]
async fn given_recent_batch_when_executed_again_within_cooldown_then_skipped() {
    // GIVEN: A script that records every run
    let scripts = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let marker = work.path().join("ran.txt");
    write_script(scripts.path(), "once.sh", &append_line(&marker, "run"));

    let engine = engine_for(scripts.path(), LONG_COOLDOWN);

    // WHEN: Two calls back to back
    let first = expect_ran(engine.execute_startup_scripts().await);
    first.wait_all().await;

    // Add a script between calls; a rescan would pick it up
    write_script(scripts.path(), "late.sh", &append_line(&marker, "late"));
    let second = engine.execute_startup_scripts().await;

    // THEN: Second is skipped for cooldown, script ran exactly once
    assert!(matches!(
        second,
        BatchOutcome::Skipped(SkipReason::Cooldown { .. })
    ));
    assert_eq!(read_lines(&marker), vec!["run"]);
}

/// **VALUE**: Verifies overlapping triggers are rejected while a batch is still in flight.
///
/// **WHY THIS MATTERS**: The listener spawns a batch per matching packet without waiting; the guard
/// is the only thing stopping two batches from interleaving.
///
/// **BUG THIS CATCHES**: Would catch the running flag being set after the first suspension point.
#[tokio::test]
async fn given_batch_in_flight_when_triggered_again_then_skipped_as_in_flight() {
    // GIVEN: An engine whose privilege check takes a while
    let scripts = tempfile::tempdir().unwrap();
    let engine = ScriptEngine::with_probe(
        ExecutionSettings::new(scripts.path()).with_cooldown(NO_COOLDOWN),
        Arc::new(SlowProbe(Duration::from_millis(200))),
    );

    // WHEN: Two calls race
    let (first, second) = tokio::join!(
        engine.execute_startup_scripts(),
        engine.execute_startup_scripts()
    );

    // THEN: One ran, the other was turned away
    assert!(matches!(first, BatchOutcome::Ran(_)));
    assert!(matches!(second, BatchOutcome::Skipped(SkipReason::InFlight)));
}

/// **VALUE**: Verifies an elevated context dispatches nothing and releases the guard.
///
/// **WHY THIS MATTERS**: User scripts must never inherit root or administrator rights. After the
/// refusal, a later normal-privilege trigger must still work.
///
/// **BUG THIS CATCHES**: Would catch the refusal leaving the running flag set forever, or scripts
/// running before the check.
#[cfg(unix)]
#[tokio::test]
async fn given_elevated_context_when_executed_then_refused_and_guard_cleared() {
    // GIVEN: A script and a probe that reports elevation
    let scripts = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let marker = work.path().join("ran.txt");
    write_script(scripts.path(), "a.sh", &append_line(&marker, "a"));

    let probe = Arc::new(SwitchableProbe::new(true));
    let engine = ScriptEngine::with_probe(
        ExecutionSettings::new(scripts.path()).with_cooldown(NO_COOLDOWN),
        probe.clone(),
    );

    // WHEN: Executing while elevated
    let refused = engine.execute_startup_scripts().await;

    // THEN: Refused, nothing ran
    assert!(matches!(refused, BatchOutcome::Refused));
    assert!(read_lines(&marker).is_empty());

    // WHEN: Privileges dropped and triggered again
    probe.set(false);
    let report = expect_ran(engine.execute_startup_scripts().await);
    report.wait_all().await;

    // THEN: The script runs
    assert_eq!(read_lines(&marker), vec!["a"]);
}

/// **VALUE**: Verifies a hung script is killed at the timeout without delaying its siblings.
///
/// **WHY THIS MATTERS**: One stuck script (waiting on a network share, say) must not hold the
/// others hostage or keep running forever.
///
/// **BUG THIS CATCHES**: Would catch sequential supervision or a missing timeout.
#[cfg(unix)]
#[tokio::test]
async fn given_hung_script_when_timeout_expires_then_killed_and_siblings_unaffected() {
    // GIVEN: a.sh hangs, b.sh finishes immediately; 1s timeout
    let scripts = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let marker = work.path().join("ran.txt");
    write_script(scripts.path(), "a.sh", "sleep 30\n");
    write_script(scripts.path(), "b.sh", &append_line(&marker, "b"));

    let engine = ScriptEngine::with_probe(
        ExecutionSettings::new(scripts.path())
            .with_cooldown(NO_COOLDOWN)
            .with_timeout(Duration::from_secs(1))
            .with_kill_grace(Duration::from_secs(1)),
        Arc::new(crate::helpers::NeverElevated),
    );
    let started = Instant::now();

    // WHEN: Running the batch
    let report = expect_ran(engine.execute_startup_scripts().await);
    let mut dispatched = report.dispatched.into_iter();
    let hung = dispatched.next().unwrap();
    let quick = dispatched.next().unwrap();

    // THEN: The quick one finishes well before the hung one is killed
    assert_eq!(quick.wait().await, ScriptOutcome::Succeeded);
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(read_lines(&marker), vec!["b"]);

    assert_eq!(hung.wait().await, ScriptOutcome::TimedOut);
    assert!(started.elapsed() < Duration::from_secs(10));
}

/// **VALUE**: Verifies escalation to a forced kill when the script ignores the polite signal.
///
/// **WHY THIS MATTERS**: Scripts that trap SIGTERM would otherwise survive the timeout.
///
/// **BUG THIS CATCHES**: Would catch the SIGKILL phase being skipped after the grace period.
#[cfg(unix)]
#[tokio::test]
async fn given_script_ignoring_sigterm_when_timeout_expires_then_force_killed() {
    let scripts = tempfile::tempdir().unwrap();
    write_script(scripts.path(), "stubborn.sh", "trap '' TERM\nsleep 30\n");

    let engine = ScriptEngine::with_probe(
        ExecutionSettings::new(scripts.path())
            .with_cooldown(NO_COOLDOWN)
            .with_timeout(Duration::from_millis(500))
            .with_kill_grace(Duration::from_millis(500)),
        Arc::new(crate::helpers::NeverElevated),
    );
    let started = Instant::now();

    let outcomes = expect_ran(engine.execute_startup_scripts().await)
        .wait_all()
        .await;

    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].1, ScriptOutcome::TimedOut);
    assert!(started.elapsed() < Duration::from_secs(10));
}

/// **VALUE**: Verifies a failing script is reported with its exit code and does not stop the batch.
///
/// **WHY THIS MATTERS**: Per-script failures are warnings, isolated to that script.
///
/// **BUG THIS CATCHES**: Would catch an early return on the first failure.
#[cfg(unix)]
#[tokio::test]
async fn given_failing_script_when_executed_then_failed_with_code_and_siblings_run() {
    let scripts = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let marker = work.path().join("ran.txt");
    write_script(scripts.path(), "a.sh", "exit 3\n");
    write_script(scripts.path(), "b.sh", &append_line(&marker, "b"));

    let engine = engine_for(scripts.path(), NO_COOLDOWN);

    let outcomes = expect_ran(engine.execute_startup_scripts().await)
        .wait_all()
        .await;

    assert_eq!(outcomes[0].1, ScriptOutcome::Failed { code: Some(3) });
    assert_eq!(outcomes[1].1, ScriptOutcome::Succeeded);
    assert_eq!(read_lines(&marker), vec!["b"]);
}

/// **VALUE**: Verifies unsupported extensions are skipped and reported, not treated as failures.
///
/// **WHY THIS MATTERS**: The scripts folder may hold READMEs or scripts for other platforms.
///
/// **BUG THIS CATCHES**: Would catch unknown files being handed to a default interpreter.
#[tokio::test]
async fn given_unsupported_files_when_executed_then_listed_as_unsupported() {
    let scripts = tempfile::tempdir().unwrap();
    write_script(scripts.path(), "notes.txt", "hello");
    write_script(scripts.path(), "tool.py", "print('hi')");

    let engine = engine_for(scripts.path(), NO_COOLDOWN);

    let report = expect_ran(engine.execute_startup_scripts().await);

    assert!(report.dispatched.is_empty());
    assert!(report.spawn_failures.is_empty());
    assert_eq!(report.unsupported.len(), 2);
}

/// **VALUE**: Verifies an unusable scripts directory fails the pass cleanly and frees the guard.
///
/// **WHY THIS MATTERS**: A scan exception must never leave the engine stuck in "running".
///
/// **BUG THIS CATCHES**: Would catch the guard being released only on the success path.
#[tokio::test]
async fn given_scripts_path_is_a_file_when_executed_then_failed_and_guard_released() {
    // GIVEN: The scripts "directory" is actually a regular file
    let work = tempfile::tempdir().unwrap();
    let not_a_dir = write_script(work.path(), "startup-scripts", "");
    let engine = engine_for(&not_a_dir, NO_COOLDOWN);

    // WHEN: Executing twice
    let first = engine.execute_startup_scripts().await;
    let second = engine.execute_startup_scripts().await;

    // THEN: Both fail with a script error rather than being skipped as in-flight
    assert!(matches!(first, BatchOutcome::Failed(_)));
    assert!(matches!(second, BatchOutcome::Failed(_)));
}

/// **VALUE**: Verifies the forced kill reaches every member of the script's process group.
///
/// **WHY THIS MATTERS**: A script that backgrounds a helper and exits on SIGTERM must not leave
/// that helper running after the script is reported as timed out.
///
/// **BUG THIS CATCHES**: Would catch SIGKILL being sent only while the group leader is still
/// alive, or a kill that only hits the shell and leaves its children behind.
#[cfg(unix)]
#[tokio::test]
async fn given_background_child_ignoring_sigterm_when_timed_out_then_group_killed() {
    // GIVEN: The shell waits on a subshell that ignores SIGTERM and would write a marker later
    let scripts = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let marker = work.path().join("survived.txt");
    write_script(
        scripts.path(),
        "spawner.sh",
        &format!(
            "(trap '' TERM; sleep 3; {}) &\nwait\n",
            append_line(&marker, "survived").trim_end()
        ),
    );

    let engine = ScriptEngine::with_probe(
        ExecutionSettings::new(scripts.path())
            .with_cooldown(NO_COOLDOWN)
            .with_timeout(Duration::from_millis(500))
            .with_kill_grace(Duration::from_millis(500)),
        Arc::new(crate::helpers::NeverElevated),
    );

    // WHEN: The batch times out
    let outcomes = expect_ran(engine.execute_startup_scripts().await)
        .wait_all()
        .await;
    assert_eq!(outcomes[0].1, ScriptOutcome::TimedOut);

    // THEN: Well past the subshell's sleep, it never wrote its marker
    tokio::time::sleep(Duration::from_secs(4)).await;
    assert!(read_lines(&marker).is_empty(), "Background child outlived the kill");
}

/// **VALUE**: Verifies output that is not valid UTF-8 keeps being drained.
///
/// **WHY THIS MATTERS**: Scripts print whatever their tools print. If the reader gives up on a
/// bad byte, the pipe fills or closes and a healthy script blocks or dies on SIGPIPE.
///
/// **BUG THIS CATCHES**: Would catch line decoding that stops at the first invalid byte, turning
/// a successful script into `Failed { code: None }`.
#[cfg(unix)]
#[tokio::test]
async fn given_script_printing_invalid_utf8_when_executed_then_runs_to_completion() {
    // GIVEN: Invalid bytes first, then plenty of normal output, then a marker
    let scripts = tempfile::tempdir().unwrap();
    let work = tempfile::tempdir().unwrap();
    let marker = work.path().join("done.txt");
    let body = format!(
        "printf '\\377\\376\\n'\nsleep 0.3\ni=0\nwhile [ $i -lt 2000 ]; do echo line $i; i=$((i+1)); done\n{}",
        append_line(&marker, "done")
    );
    write_script(scripts.path(), "noisy.sh", &body);

    let engine = engine_for(scripts.path(), NO_COOLDOWN);

    // WHEN: Running it to completion
    let outcomes = expect_ran(engine.execute_startup_scripts().await)
        .wait_all()
        .await;

    // THEN: It succeeded and reached the end
    assert_eq!(outcomes[0].1, ScriptOutcome::Succeeded);
    assert_eq!(read_lines(&marker), vec!["done"]);
}
