//! Elevated-context detection.
//!
//! Scripts are user-supplied; running them as root or as a Windows
//! administrator would hand them privileges the user never asked for.

use std::sync::OnceLock;

use regex::Regex;

/// Reports whether the current process runs with elevated privileges.
pub trait ElevationProbe: Send + Sync {
    fn is_elevated(&self) -> bool;
}

/// Probe backed by the operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemElevationProbe;

impl ElevationProbe for SystemElevationProbe {
    #[cfg(unix)]
    fn is_elevated(&self) -> bool {
        // SAFETY: geteuid has no preconditions and cannot fail.
        unsafe { libc::geteuid() == 0 }
    }

    #[cfg(windows)]
    fn is_elevated(&self) -> bool {
        use crate::display::CREATE_NO_WINDOW;
        use std::os::windows::process::CommandExt;
        use std::process::Command as StdCommand;

        match StdCommand::new("whoami")
            .arg("/groups")
            .creation_flags(CREATE_NO_WINDOW)
            .output()
        {
            Ok(output) if output.status.success() => {
                groups_indicate_admin(&String::from_utf8_lossy(&output.stdout))
            }
            Ok(output) => {
                log::debug!("whoami /groups exited with {}", output.status);
                false
            }
            Err(e) => {
                log::debug!("Failed to run whoami /groups: {e}");
                false
            }
        }
    }

    #[cfg(not(any(unix, windows)))]
    fn is_elevated(&self) -> bool {
        false
    }
}

const ADMIN_GROUP_PATTERN: &str = r"(?i)S-1-5-32-544|BUILTIN\\Administrators";

static ADMIN_GROUP_REGEX: OnceLock<Regex> = OnceLock::new();

pub(crate) fn get_admin_group_regex() -> &'static Regex {
    ADMIN_GROUP_REGEX.get_or_init(|| Regex::new(ADMIN_GROUP_PATTERN).expect("valid regex pattern"))
}

/// True if `whoami /groups` output lists the built-in Administrators group.
pub fn groups_indicate_admin(output: &str) -> bool {
    get_admin_group_regex().is_match(output)
}
