//! Best-effort display wake.
//!
//! - Windows: a hidden PowerShell toggles CapsLock twice, which counts as user
//!   input and turns the monitor back on without changing keyboard state.
//! - macOS: `caffeinate -u` declares user activity for a bounded duration.
//! - Elsewhere: nothing to do.
//!
//! The command runs on its own task; callers never wait on it and never see
//! its failures beyond a log line.

use crate::platform::Platform;

use std::process::{Command as StdCommand, Stdio};
use std::time::Duration;

use const_format::concatcp;
use log::{debug, info, warn};
use tokio::process::Command as TokioCommand;
use tokio::spawn as TokioSpawn;

pub const DEFAULT_KEEP_AWAKE: Duration = Duration::from_secs(20);

const POWERSHELL_BINARY: &str = "powershell";
const CAFFEINATE_BINARY: &str = "caffeinate";
const CAPSLOCK_KEY: &str = "{CAPSLOCK}";
const SEND_KEYS: &str = "[System.Windows.Forms.SendKeys]::SendWait('";
const CAPSLOCK_TOGGLE_SCRIPT: &str = concatcp!(
    "Add-Type -AssemblyName System.Windows.Forms; ",
    SEND_KEYS,
    CAPSLOCK_KEY,
    "'); Start-Sleep -Milliseconds 100; ",
    SEND_KEYS,
    CAPSLOCK_KEY,
    "')"
);

#[cfg(windows)]
pub(crate) const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Build the platform's wake command, or `None` where no wake action exists.
pub fn wake_command(platform: Platform, keep_awake: Duration) -> Option<StdCommand> {
    match platform {
        Platform::Windows => {
            let mut cmd = StdCommand::new(POWERSHELL_BINARY);
            cmd.args([
                "-NoProfile",
                "-NonInteractive",
                "-WindowStyle",
                "Hidden",
                "-Command",
                CAPSLOCK_TOGGLE_SCRIPT,
            ]);
            Some(cmd)
        }
        Platform::MacOs => {
            let mut cmd = StdCommand::new(CAFFEINATE_BINARY);
            cmd.arg("-u")
                .arg("-t")
                .arg(keep_awake.as_secs().max(1).to_string());
            Some(cmd)
        }
        Platform::Generic => None,
    }
}

#[derive(Debug, Clone)]
pub struct DisplayWaker {
    platform: Platform,
    keep_awake: Duration,
    enabled: bool,
}

impl DisplayWaker {
    pub fn new(keep_awake: Duration) -> Self {
        Self {
            platform: Platform::current(),
            keep_awake,
            enabled: true,
        }
    }

    /// A waker that only logs. Used when display wake is turned off in config.
    pub fn disabled() -> Self {
        Self {
            platform: Platform::current(),
            keep_awake: DEFAULT_KEEP_AWAKE,
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Fire the wake command and return immediately.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn wake(&self) {
        if !self.enabled {
            debug!("Display wake disabled, skipping");
            return;
        }

        let Some(mut cmd) = wake_command(self.platform, self.keep_awake) else {
            debug!("No display wake action on {} platform", self.platform);
            return;
        };

        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            cmd.creation_flags(CREATE_NO_WINDOW);
        }

        let platform = self.platform;
        let program = cmd.get_program().to_string_lossy().to_string();

        TokioSpawn(async move {
            match TokioCommand::from(cmd).status().await {
                Ok(status) if status.success() => {
                    info!("Display woken up on {platform}");
                }
                Ok(status) => {
                    warn!("Display wake via {program} exited with {status}");
                }
                Err(e) => {
                    warn!("Failed to run {program} to wake display: {e}");
                }
            }
        });
    }
}

impl Default for DisplayWaker {
    fn default() -> Self {
        Self::new(DEFAULT_KEEP_AWAKE)
    }
}
