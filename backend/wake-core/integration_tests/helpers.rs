//! Test helpers shared by the integration tests:
//! - Elevation probes with fixed or switchable answers
//! - Script fixtures
//! - Polling with a deadline

use wake_core::scripts::{ElevationProbe, ExecutionSettings, ScriptEngine};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Probe that never reports elevation, so tests behave the same under root.
pub struct NeverElevated;

impl ElevationProbe for NeverElevated {
    fn is_elevated(&self) -> bool {
        false
    }
}

/// Probe whose answer can be flipped between calls.
#[derive(Default)]
pub struct SwitchableProbe {
    elevated: AtomicBool,
}

impl SwitchableProbe {
    pub fn new(elevated: bool) -> Self {
        Self {
            elevated: AtomicBool::new(elevated),
        }
    }

    pub fn set(&self, elevated: bool) {
        self.elevated.store(elevated, Ordering::SeqCst);
    }
}

impl ElevationProbe for SwitchableProbe {
    fn is_elevated(&self) -> bool {
        self.elevated.load(Ordering::SeqCst)
    }
}

/// Probe that takes a while to answer, holding the batch in flight.
pub struct SlowProbe(pub Duration);

impl ElevationProbe for SlowProbe {
    fn is_elevated(&self) -> bool {
        std::thread::sleep(self.0);
        false
    }
}

pub fn engine_for(scripts_dir: &Path, cooldown: Duration) -> ScriptEngine {
    ScriptEngine::with_probe(
        ExecutionSettings::new(scripts_dir).with_cooldown(cooldown),
        Arc::new(NeverElevated),
    )
}

pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).expect("Failed to write script fixture");
    path
}

/// Shell line appending `tag` to `marker`.
pub fn append_line(marker: &Path, tag: &str) -> String {
    format!("echo {tag} >> '{}'\n", marker.display())
}

pub fn read_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .map(|s| s.lines().map(str::to_string).collect())
        .unwrap_or_default()
}

/// Poll `check` every 25ms until it holds or `deadline` passes.
pub async fn wait_until<F>(deadline: Duration, mut check: F) -> bool
where
    F: FnMut() -> bool,
{
    let result = tokio::time::timeout(deadline, async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
    })
    .await;

    result.is_ok()
}
