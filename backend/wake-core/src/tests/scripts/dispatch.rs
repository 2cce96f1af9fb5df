// Unit tests for the interpreter dispatch table

use crate::platform::Platform;
use crate::scripts::dispatch::{DispatchTable, PathArg};

use std::path::Path;

fn args_of(cmd: &std::process::Command) -> Vec<String> {
    cmd.get_args()
        .map(|a| a.to_string_lossy().to_string())
        .collect()
}

/// **VALUE**: Verifies the generic platform runs only `.sh` through the POSIX shell.
///
/// **WHY THIS MATTERS**: On Linux anything else has no defined interpreter and must be skipped.
///
/// **BUG THIS CATCHES**: Would catch `.ps1` or `.applescript` leaking into the generic table.
#[test]
fn given_generic_table_when_looking_up_extensions_then_only_sh() {
    let table = DispatchTable::for_platform(Platform::Generic);
    let script = Path::new("/scripts/a.sh");

    let cmd = table.command_for(script).unwrap();
    assert_eq!(cmd.get_program(), "/bin/sh");
    assert_eq!(args_of(&cmd), vec!["/scripts/a.sh"]);

    for other in ["b.ps1", "c.bat", "d.applescript", "e.py", "noext"] {
        assert!(table.interpreter_for(Path::new(other)).is_none(), "{other}");
    }
}

#[test]
fn given_macos_table_when_looking_up_then_shell_and_osascript() {
    let table = DispatchTable::for_platform(Platform::MacOs);

    assert_eq!(
        table.interpreter_for(Path::new("x.sh")).unwrap().program,
        "/bin/sh"
    );
    for ext in ["applescript", "scpt"] {
        let path = format!("x.{ext}");
        assert_eq!(
            table.interpreter_for(Path::new(&path)).unwrap().program,
            "osascript"
        );
    }
    assert!(table.interpreter_for(Path::new("x.ps1")).is_none());
}

/// **VALUE**: Verifies the PowerShell invocation is non-interactive, hidden and bypasses policy.
///
/// **WHY THIS MATTERS**: Without `-ExecutionPolicy Bypass` unsigned user scripts fail on default
/// Windows installs; without `-NonInteractive` a prompt would hang until the timeout.
///
/// **BUG THIS CATCHES**: Would catch a reordered argument list that puts the path before `-File`.
#[test]
fn given_windows_table_when_dispatching_ps1_then_powershell_with_bypass() {
    let table = DispatchTable::for_platform(Platform::Windows);
    let cmd = table.command_for(Path::new("C:/s/run.ps1")).unwrap();
    let args = args_of(&cmd);

    assert_eq!(cmd.get_program(), "powershell");
    assert!(args.windows(2).any(|w| w == ["-ExecutionPolicy", "Bypass"]));
    assert!(args.windows(2).any(|w| w == ["-WindowStyle", "Hidden"]));
    assert!(args.contains(&String::from("-NonInteractive")));
    assert_eq!(args[args.len() - 2], "-File");
    assert_eq!(args[args.len() - 1], "C:/s/run.ps1");
}

/// **VALUE**: Verifies batch files go through `cmd /d /c` with a quoted path.
///
/// **WHY THIS MATTERS**: `/d` disables AutoRun hooks; quoting keeps paths with spaces intact.
///
/// **BUG THIS CATCHES**: Would catch a dropped `/d` or an unquoted path.
#[test]
fn given_windows_table_when_dispatching_bat_and_cmd_then_cmd_with_quoted_path() {
    let table = DispatchTable::for_platform(Platform::Windows);

    for name in ["setup.bat", "setup.cmd"] {
        let interpreter = table.interpreter_for(Path::new(name)).unwrap();
        assert_eq!(interpreter.program, "cmd");
        assert_eq!(interpreter.args, &["/d", "/c"]);
        assert_eq!(interpreter.path_arg, PathArg::Quoted);
    }

    #[cfg(not(windows))]
    {
        let cmd = table.command_for(Path::new("/s/my script.bat")).unwrap();
        assert_eq!(args_of(&cmd).last().unwrap(), "\"/s/my script.bat\"");
    }
}

/// **VALUE**: Verifies extension matching is case-sensitive.
///
/// **WHY THIS MATTERS**: The scripts directory matches extensions exactly; `RUN.SH` is not a
/// shell script for dispatch purposes.
///
/// **BUG THIS CATCHES**: Would catch an accidental lowercase normalization.
#[test]
fn given_uppercase_extension_when_looking_up_then_unsupported() {
    let table = DispatchTable::for_platform(Platform::Generic);

    assert!(table.interpreter_for(Path::new("RUN.SH")).is_none());
    assert!(table.interpreter_for(Path::new("run.Sh")).is_none());
}

#[test]
fn given_current_table_when_created_then_matches_host_platform() {
    assert_eq!(DispatchTable::current().platform(), Platform::current());
    assert!(DispatchTable::current().extensions().count() > 0);
}
