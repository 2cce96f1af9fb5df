use wakeondisplay::error::WakeOnDisplayError;
use wakeondisplay::paths::AppPaths;
use wakeondisplay::service::WakeService;

use wake_core::STARTUP_SCRIPTS_DIR_NAME;
use wake_core::config::WakeConfig;
use wake_core::listener::ListenerState;
use wake_core::scripts::{BatchOutcome, ElevationProbe, ExecutionSettings, ScriptEngine};

use std::net::{IpAddr, Ipv4Addr, UdpSocket as StdUdpSocket};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Integration tests for the host service wiring
// Config -> engine + listener, exercised on loopback and temp directories
// ============================================================================

/// Tests may run as root; never let that refuse the batch.
struct NeverElevated;

impl ElevationProbe for NeverElevated {
    fn is_elevated(&self) -> bool {
        false
    }
}

fn loopback_config(scripts_dir: &Path, port: u16) -> WakeConfig {
    let mut config = WakeConfig::default();
    config.listener.bind_address = IpAddr::V4(Ipv4Addr::LOCALHOST);
    config.listener.port = port;
    config.scripts.directory_override = Some(scripts_dir.to_string_lossy().to_string());
    config.scripts.cooldown_secs = 0;
    config.display.enabled = false;
    config
}

fn service_for(config: &WakeConfig, data_dir: &Path) -> WakeService {
    let engine = ScriptEngine::with_probe(
        config.execution_settings(data_dir),
        Arc::new(NeverElevated),
    );
    WakeService::with_engine(config, engine)
}

/// **VALUE**: Verifies default config puts scripts under the per-user data directory.
///
/// **WHY THIS MATTERS**: The log line at startup tells users where to put scripts; this is
/// that path.
///
/// **BUG THIS CATCHES**: Would catch the service ignoring `AppPaths::data_dir`.
#[test]
fn given_default_config_when_service_built_then_scripts_dir_under_data_dir() {
    // GIVEN: Paths under a temp root and default config
    let root = tempfile::tempdir().unwrap();
    let paths = AppPaths::under(root.path());

    // WHEN: Building the service
    let service = WakeService::new(&WakeConfig::default(), &paths);

    // THEN: Scripts dir is <data_dir>/startup-scripts
    assert_eq!(
        service.scripts_dir(),
        paths.data_dir.join(STARTUP_SCRIPTS_DIR_NAME)
    );
}

/// **VALUE**: Verifies the startup bootstrap creates the scripts directory.
///
/// **BUG THIS CATCHES**: Would catch a first run leaving users with no folder to find.
#[tokio::test]
async fn given_missing_scripts_dir_when_prepared_then_created() {
    let root = tempfile::tempdir().unwrap();
    let scripts = root.path().join("nested").join("scripts");
    let config = loopback_config(&scripts, 0);
    let service = service_for(&config, root.path());

    let created = service
        .prepare_scripts_dir()
        .await
        .expect("Preparing scripts dir should succeed");

    assert!(scripts.is_dir());
    assert!(created.is_dir());
}

/// **VALUE**: Verifies the configured bind address reaches the listener.
///
/// **BUG THIS CATCHES**: Would catch the service always binding the default `0.0.0.0:9`.
#[tokio::test]
async fn given_loopback_config_when_listener_started_then_bound_on_loopback() {
    // GIVEN: Config pointing at loopback, ephemeral port
    let root = tempfile::tempdir().unwrap();
    let config = loopback_config(root.path(), 0);
    let service = service_for(&config, root.path());

    // WHEN: Starting twice
    let addr = service.start_listener().await.expect("Listener should start");
    let again = service.start_listener().await.expect("Restart should be a no-op");

    // THEN: Loopback, same address, listening
    assert!(addr.ip().is_loopback());
    assert_eq!(addr, again);
    assert_eq!(
        service.listener().state().await,
        ListenerState::Listening(addr)
    );
}

/// **VALUE**: Verifies a taken port becomes a Core error the host can log and survive.
///
/// **WHY THIS MATTERS**: `main` keeps running without detection in this case.
///
/// **BUG THIS CATCHES**: Would catch the bind failure being swallowed, or mapped to the
/// App variant.
#[tokio::test]
async fn given_port_taken_when_listener_started_then_core_error() {
    // GIVEN: Port already in use
    let squatter = StdUdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
    let port = squatter.local_addr().unwrap().port();

    let root = tempfile::tempdir().unwrap();
    let config = loopback_config(root.path(), port);
    let service = service_for(&config, root.path());

    // WHEN: Starting
    let result = service.start_listener().await;

    // THEN: Core error carrying the bind failure
    match result {
        Err(WakeOnDisplayError::Core { message, .. }) => {
            assert!(message.starts_with("Bind Error"), "{message}");
        }
        other => panic!("Expected Core error, got {other:?}"),
    }
    assert_eq!(service.listener().state().await, ListenerState::Closed);
}

/// **VALUE**: Verifies configured timings flow into the engine.
///
/// **BUG THIS CATCHES**: Would catch seconds being read from the wrong config field.
#[test]
fn given_custom_timings_when_service_built_then_engine_settings_match() {
    let root = tempfile::tempdir().unwrap();
    let mut config = loopback_config(root.path(), 0);
    config.scripts.cooldown_secs = 5;
    config.scripts.timeout_secs = 7;
    config.scripts.kill_grace_secs = 3;

    let service = service_for(&config, root.path());
    let settings: &ExecutionSettings = service.engine().settings();

    assert_eq!(settings.cooldown, Duration::from_secs(5));
    assert_eq!(settings.limits.timeout, Duration::from_secs(7));
    assert_eq!(settings.limits.kill_grace, Duration::from_secs(3));
}

/// **VALUE**: Verifies a manual trigger through the service runs the user's scripts.
///
/// **BUG THIS CATCHES**: Would catch the service holding an engine pointed at a different
/// directory than the one it prepared.
#[cfg(unix)]
#[tokio::test]
async fn given_script_in_prepared_dir_when_triggered_then_runs() {
    // GIVEN: A prepared scripts dir with one script
    let root = tempfile::tempdir().unwrap();
    let scripts = root.path().join("scripts");
    let marker = root.path().join("ran.txt");
    let config = loopback_config(&scripts, 0);
    let service = service_for(&config, root.path());
    service.prepare_scripts_dir().await.unwrap();
    std::fs::write(
        scripts.join("hello.sh"),
        format!("echo hello > '{}'\n", marker.display()),
    )
    .unwrap();

    // WHEN: Triggering
    let outcome = service.execute_startup_scripts().await;

    // THEN: The script ran
    let report = match outcome {
        BatchOutcome::Ran(report) => report,
        other => panic!("Expected batch to run, got {other:?}"),
    };
    let outcomes = report.wait_all().await;
    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].1.is_success());
    assert_eq!(std::fs::read_to_string(&marker).unwrap(), "hello\n");
}
