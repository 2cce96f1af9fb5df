//! Startup script execution.
//!
//! A wake event runs every eligible script in the scripts directory once:
//!
//! 1. The [`guard`] rejects overlapping or too-frequent batches.
//! 2. Batches are refused outright in an elevated context ([`privilege`]).
//! 3. [`discovery`] lists eligible files in deterministic order.
//! 4. [`dispatch`] picks an interpreter from the file extension.
//! 5. [`supervisor`] runs each script with its own timeout.
//!
//! Scripts run concurrently; only their start order is fixed.

pub mod discovery;
pub mod dispatch;
pub(crate) mod guard;
pub mod privilege;
pub mod supervisor;

pub use discovery::{ScriptEntry, discover_scripts, ensure_scripts_dir};
pub use dispatch::{DispatchTable, Interpreter, PathArg};
pub use guard::SkipReason;
pub use privilege::{ElevationProbe, SystemElevationProbe};
pub use supervisor::{DispatchedScript, SCRIPT_OUTPUT_TARGET, ScriptOutcome, SupervisionLimits};

use crate::error::scripts::ScriptError;
use crate::scripts::guard::ExecutionGuard;
use crate::scripts::supervisor::spawn_supervised;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use log::{error, info, warn};

pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ExecutionSettings {
    pub scripts_dir: PathBuf,
    pub cooldown: Duration,
    pub limits: SupervisionLimits,
}

impl ExecutionSettings {
    pub fn new(scripts_dir: impl Into<PathBuf>) -> Self {
        Self {
            scripts_dir: scripts_dir.into(),
            cooldown: DEFAULT_COOLDOWN,
            limits: SupervisionLimits::default(),
        }
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.limits.timeout = timeout;
        self
    }

    pub fn with_kill_grace(mut self, kill_grace: Duration) -> Self {
        self.limits.kill_grace = kill_grace;
        self
    }
}

/// Result of one `execute_startup_scripts` call.
#[derive(Debug)]
pub enum BatchOutcome {
    /// The guard turned the call away; nothing was scanned.
    Skipped(SkipReason),
    /// Running elevated; nothing was scanned.
    Refused,
    /// The scripts directory could not be prepared or read.
    Failed(ScriptError),
    Ran(BatchReport),
}

#[derive(Debug, Default)]
pub struct BatchReport {
    /// Started scripts, in dispatch order.
    pub dispatched: Vec<DispatchedScript>,
    /// Scripts whose extension has no interpreter on this platform.
    pub unsupported: Vec<PathBuf>,
    pub spawn_failures: Vec<ScriptError>,
}

impl BatchReport {
    pub fn dispatched_paths(&self) -> Vec<PathBuf> {
        self.dispatched.iter().map(|d| d.path.clone()).collect()
    }

    /// Wait for every dispatched script, in dispatch order.
    pub async fn wait_all(self) -> Vec<(PathBuf, ScriptOutcome)> {
        let mut outcomes = Vec::with_capacity(self.dispatched.len());
        for script in self.dispatched {
            let path = script.path.clone();
            outcomes.push((path, script.wait().await));
        }
        outcomes
    }
}

/// Guarded script runner. Cheap to clone; clones share one guard.
#[derive(Clone)]
pub struct ScriptEngine {
    settings: Arc<ExecutionSettings>,
    guard: Arc<ExecutionGuard>,
    dispatch: DispatchTable,
    probe: Arc<dyn ElevationProbe>,
}

impl ScriptEngine {
    pub fn new(settings: ExecutionSettings) -> Self {
        Self::with_probe(settings, Arc::new(SystemElevationProbe))
    }

    pub fn with_probe(settings: ExecutionSettings, probe: Arc<dyn ElevationProbe>) -> Self {
        Self {
            guard: Arc::new(ExecutionGuard::new(settings.cooldown)),
            settings: Arc::new(settings),
            dispatch: DispatchTable::current(),
            probe,
        }
    }

    pub fn settings(&self) -> &ExecutionSettings {
        &self.settings
    }

    pub(crate) fn guard(&self) -> &Arc<ExecutionGuard> {
        &self.guard
    }

    /// Run every eligible startup script once.
    ///
    /// Returns once all scripts are started; it does not wait for them to
    /// finish. Dropping the returned outcome leaves the scripts running under
    /// their own supervisors.
    pub async fn execute_startup_scripts(&self) -> BatchOutcome {
        // Check-then-set happens here, before the first suspension point.
        let permit = match self.guard.try_acquire() {
            Ok(permit) => permit,
            Err(SkipReason::InFlight) => {
                info!("Script execution already in progress, skipping");
                return BatchOutcome::Skipped(SkipReason::InFlight);
            }
            Err(reason @ SkipReason::Cooldown { remaining }) => {
                info!("Script execution cooling down ({remaining:?} left), skipping");
                return BatchOutcome::Skipped(reason);
            }
        };

        if self.running_elevated().await {
            warn!("Refusing to run startup scripts with elevated privileges; run as a normal user");
            return BatchOutcome::Refused;
        }

        let scripts = match discover_scripts(&self.settings.scripts_dir).await {
            Ok(scripts) => scripts,
            Err(e) => {
                warn!("Failed to scan startup scripts: {e}");
                return BatchOutcome::Failed(e);
            }
        };

        let mut report = BatchReport::default();

        for entry in &scripts {
            let Some(cmd) = self.dispatch.command_for(&entry.path) else {
                warn!("Unsupported script type: {}", entry.path.display());
                report.unsupported.push(entry.path.clone());
                continue;
            };

            info!("Running script: {}", entry.path.display());

            match spawn_supervised(cmd, entry, self.settings.limits) {
                Ok(dispatched) => report.dispatched.push(dispatched),
                Err(e) => {
                    error!("Failed to run script {}: {e}", entry.path.display());
                    report.spawn_failures.push(e);
                }
            }
        }

        drop(permit);
        BatchOutcome::Ran(report)
    }

    async fn running_elevated(&self) -> bool {
        let probe = Arc::clone(&self.probe);
        // A probe that panics counts as elevated.
        tokio::task::spawn_blocking(move || probe.is_elevated())
            .await
            .unwrap_or(true)
    }
}
