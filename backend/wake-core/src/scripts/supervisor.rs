//! Child process supervision: output streaming, timeout, kill escalation.

use crate::error::scripts::ScriptError;
use crate::scripts::discovery::ScriptEntry;

use std::path::PathBuf;
use std::process::{Command as StdCommand, ExitStatus, Stdio};
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Child as TokioChild;
use tokio::process::Command as TokioCommand;
use tokio::spawn as TokioSpawn;
use tokio::task::JoinHandle;
use tokio::time::timeout as TokioTimeout;

pub const DEFAULT_SCRIPT_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_KILL_GRACE: Duration = Duration::from_secs(2);

/// Log target of captured script output, so hosts can filter it separately.
pub const SCRIPT_OUTPUT_TARGET: &str = "wake_core::script_output";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisionLimits {
    pub timeout: Duration,
    /// Time between the polite signal and the forced kill.
    pub kill_grace: Duration,
}

impl Default for SupervisionLimits {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_SCRIPT_TIMEOUT,
            kill_grace: DEFAULT_KILL_GRACE,
        }
    }
}

/// How one script run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptOutcome {
    Succeeded,
    /// Non-zero exit, or killed by a signal (`code` is `None`).
    Failed { code: Option<i32> },
    /// Killed after exceeding the timeout.
    TimedOut,
    /// The supervising task was cancelled or panicked.
    Aborted,
}

impl ScriptOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ScriptOutcome::Succeeded)
    }
}

/// A spawned script and the task supervising it.
#[derive(Debug)]
pub struct DispatchedScript {
    pub path: PathBuf,
    pub pid: Option<u32>,
    handle: JoinHandle<ScriptOutcome>,
}

impl DispatchedScript {
    /// Wait for the script to finish (or be killed).
    pub async fn wait(self) -> ScriptOutcome {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Supervisor for {} failed: {e}", self.path.display());
                ScriptOutcome::Aborted
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum OutputStream {
    Stdout,
    Stderr,
}

/// Spawn `cmd` for `entry` and hand the child to a supervising task.
///
/// Returns as soon as the process exists; nothing here waits on the script.
pub(crate) fn spawn_supervised(
    mut cmd: StdCommand,
    entry: &ScriptEntry,
    limits: SupervisionLimits,
) -> Result<DispatchedScript, ScriptError> {
    let program = cmd.get_program().to_string_lossy().to_string();

    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        // Own process group so the timeout can signal the whole tree.
        cmd.process_group(0);
    }

    #[cfg(windows)]
    {
        use crate::display::CREATE_NO_WINDOW;
        use std::os::windows::process::CommandExt;
        cmd.creation_flags(CREATE_NO_WINDOW);
    }

    let mut child = TokioCommand::from(cmd)
        .spawn()
        .map_err(|e| ScriptError::spawn(&entry.path, &program, e))?;

    let pid = child.id();
    info!("Started script {} with {program} (PID: {pid:?})", entry.name);

    if let Some(stdout) = child.stdout.take() {
        drain_lines(stdout, entry.name.clone(), OutputStream::Stdout);
    }
    if let Some(stderr) = child.stderr.take() {
        drain_lines(stderr, entry.name.clone(), OutputStream::Stderr);
    }

    let handle = TokioSpawn(supervise(child, entry.name.clone(), pid, limits));

    Ok(DispatchedScript {
        path: entry.path.clone(),
        pid,
        handle,
    })
}

/// Log every line `reader` produces until EOF.
///
/// Lines are read as raw bytes and decoded lossily; the pipe must stay drained
/// whatever the script writes, or the script blocks or dies on SIGPIPE.
fn drain_lines<R>(reader: R, script: String, stream: OutputStream)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    TokioSpawn(async move {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => {
                    debug!("Stopped reading {stream:?} of {script}: {e}");
                    break;
                }
            }

            let text = String::from_utf8_lossy(&buf);
            let line = text.trim();
            if line.is_empty() {
                continue;
            }
            match stream {
                OutputStream::Stdout => info!(target: SCRIPT_OUTPUT_TARGET, "[{script} stdout] {line}"),
                OutputStream::Stderr => warn!(target: SCRIPT_OUTPUT_TARGET, "[{script} stderr] {line}"),
            }
        }
    });
}

async fn supervise(
    mut child: TokioChild,
    script: String,
    pid: Option<u32>,
    limits: SupervisionLimits,
) -> ScriptOutcome {
    // The timer lives only as long as this wait; a normal exit drops it.
    match TokioTimeout(limits.timeout, child.wait()).await {
        Ok(Ok(status)) => classify_exit(&script, status),
        Ok(Err(e)) => {
            warn!("Failed to wait for script {script}: {e}");
            ScriptOutcome::Failed { code: None }
        }
        Err(_) => {
            warn!(
                "Script {script} timed out after {:?}, terminating",
                limits.timeout
            );
            terminate(&mut child, pid, limits.kill_grace).await;
            ScriptOutcome::TimedOut
        }
    }
}

fn classify_exit(script: &str, status: ExitStatus) -> ScriptOutcome {
    if status.success() {
        info!("Script {script} finished (code=0)");
        ScriptOutcome::Succeeded
    } else {
        let code = status.code();
        warn!("Script {script} exited abnormally ({status})");
        ScriptOutcome::Failed { code }
    }
}

#[cfg(unix)]
async fn terminate(child: &mut TokioChild, pid: Option<u32>, grace: Duration) {
    let Some(pid) = pid else {
        let _ = child.kill().await;
        return;
    };

    if !signal_group(pid, libc::SIGTERM) {
        // Leader not reaped yet, so its pid is still ours.
        let _ = child.start_kill();
    }

    match TokioTimeout(grace, child.wait()).await {
        Ok(Ok(status)) => debug!("Script leader {pid} exited after SIGTERM ({status})"),
        _ => warn!("Script leader {pid} still running after {grace:?}"),
    }

    // Group members may ignore SIGTERM even when the leader is gone.
    if signal_group(pid, libc::SIGKILL) {
        debug!("Sent SIGKILL to process group {pid}");
    }
    if let Err(e) = child.kill().await {
        debug!("Kill of PID {pid} reported: {e}");
    }
}

/// Signal the process group led by `pid`.
///
/// Never signals `pid` alone: once the leader is reaped that pid may belong to
/// an unrelated process, while the group id stays reserved until its last
/// member exits.
#[cfg(unix)]
fn signal_group(pid: u32, signal: libc::c_int) -> bool {
    let Ok(pgid) = libc::pid_t::try_from(pid) else {
        return false;
    };

    // SAFETY: kill() takes plain integers; a vanished group only yields ESRCH.
    unsafe { libc::kill(-pgid, signal) == 0 }
}

#[cfg(windows)]
async fn terminate(child: &mut TokioChild, pid: Option<u32>, _grace: Duration) {
    use crate::display::CREATE_NO_WINDOW;

    // No graceful signal on Windows; kill the whole tree at once.
    if let Some(pid) = pid {
        let status = TokioCommand::new("taskkill")
            .args(["/PID", &pid.to_string(), "/T", "/F"])
            .creation_flags(CREATE_NO_WINDOW)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match status {
            Ok(status) if status.success() => {
                let _ = child.wait().await;
                return;
            }
            Ok(status) => warn!("taskkill for PID {pid} exited with {status}"),
            Err(e) => warn!("Failed to run taskkill for PID {pid}: {e}"),
        }
    }

    if let Err(e) = child.kill().await {
        error!("Forced kill after timeout failed: {e}");
    }
}

#[cfg(not(any(unix, windows)))]
async fn terminate(child: &mut TokioChild, _pid: Option<u32>, _grace: Duration) {
    if let Err(e) = child.kill().await {
        error!("Forced kill after timeout failed: {e}");
    }
}
