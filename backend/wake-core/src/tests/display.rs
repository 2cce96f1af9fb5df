// Unit tests for display wake command construction

use crate::display::{DisplayWaker, wake_command};
use crate::platform::Platform;

use std::time::Duration;

fn args_of(cmd: &std::process::Command) -> Vec<String> {
    cmd.get_args()
        .map(|a| a.to_string_lossy().to_string())
        .collect()
}

/// **VALUE**: Verifies the macOS wake asserts user activity for the configured duration.
///
/// **WHY THIS MATTERS**: Without `-u` caffeinate only blocks idle sleep and the panel stays dark.
///
/// **BUG THIS CATCHES**: Would catch a dropped flag or the duration not being forwarded.
#[test]
fn given_macos_when_building_wake_command_then_uses_caffeinate_user_activity() {
    let cmd = wake_command(Platform::MacOs, Duration::from_secs(20)).unwrap();

    assert_eq!(cmd.get_program(), "caffeinate");
    assert_eq!(args_of(&cmd), vec!["-u", "-t", "20"]);
}

/// **VALUE**: Verifies the Windows wake is a hidden, non-interactive CapsLock double toggle.
///
/// **WHY THIS MATTERS**: A single toggle would leave CapsLock flipped after every wake; a visible
/// window would flash over the user's desktop.
///
/// **BUG THIS CATCHES**: Would catch a script with one toggle or a missing hidden-window flag.
#[test]
fn given_windows_when_building_wake_command_then_toggles_capslock_twice_hidden() {
    let cmd = wake_command(Platform::Windows, Duration::from_secs(20)).unwrap();
    let args = args_of(&cmd);

    assert_eq!(cmd.get_program(), "powershell");
    assert!(args.contains(&String::from("Hidden")));
    let script = args.last().unwrap();
    assert_eq!(script.matches("{CAPSLOCK}").count(), 2);
}

#[test]
fn given_generic_platform_when_building_wake_command_then_none() {
    assert!(wake_command(Platform::Generic, Duration::from_secs(20)).is_none());
}

/// **VALUE**: Verifies that `wake()` returns without blocking and without a runtime panic.
///
/// **WHY THIS MATTERS**: The listener calls `wake()` inline from its receive loop.
///
/// **BUG THIS CATCHES**: Would catch an implementation that awaits the command inline.
#[tokio::test]
async fn given_disabled_waker_when_woken_then_returns_immediately() {
    let waker = DisplayWaker::disabled();

    waker.wake();

    assert!(!waker.is_enabled());
}
