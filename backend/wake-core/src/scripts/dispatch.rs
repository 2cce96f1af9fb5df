//! Extension-based interpreter dispatch.
//!
//! The table is keyed by platform and file extension. Extensions match
//! case-sensitively; anything not listed is unsupported on that platform.

use crate::platform::Platform;

use std::path::Path;
use std::process::Command as StdCommand;

/// How the script path is passed to the interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathArg {
    Plain,
    /// Wrapped in double quotes and passed verbatim, for `cmd /c`.
    Quoted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interpreter {
    pub program: &'static str,
    pub args: &'static [&'static str],
    pub path_arg: PathArg,
}

impl Interpreter {
    /// Build the interpreter invocation for `script`.
    pub fn command(&self, script: &Path) -> StdCommand {
        let mut cmd = StdCommand::new(self.program);
        cmd.args(self.args);

        match self.path_arg {
            PathArg::Plain => {
                cmd.arg(script);
            }
            PathArg::Quoted => push_quoted(&mut cmd, script),
        }

        cmd
    }
}

#[cfg(windows)]
fn push_quoted(cmd: &mut StdCommand, script: &Path) {
    use std::os::windows::process::CommandExt;
    cmd.raw_arg(format!("\"{}\"", script.display()));
}

#[cfg(not(windows))]
fn push_quoted(cmd: &mut StdCommand, script: &Path) {
    cmd.arg(format!("\"{}\"", script.display()));
}

const POWERSHELL: Interpreter = Interpreter {
    program: "powershell",
    args: &[
        "-NoProfile",
        "-NonInteractive",
        "-NoLogo",
        "-WindowStyle",
        "Hidden",
        "-ExecutionPolicy",
        "Bypass",
        "-File",
    ],
    path_arg: PathArg::Plain,
};

// /d skips AutoRun registry commands
const CMD: Interpreter = Interpreter {
    program: "cmd",
    args: &["/d", "/c"],
    path_arg: PathArg::Quoted,
};

const POSIX_SHELL: Interpreter = Interpreter {
    program: "/bin/sh",
    args: &[],
    path_arg: PathArg::Plain,
};

const OSASCRIPT: Interpreter = Interpreter {
    program: "osascript",
    args: &[],
    path_arg: PathArg::Plain,
};

const WINDOWS_ENTRIES: &[(&str, Interpreter)] =
    &[("ps1", POWERSHELL), ("bat", CMD), ("cmd", CMD)];

const MACOS_ENTRIES: &[(&str, Interpreter)] = &[
    ("sh", POSIX_SHELL),
    ("applescript", OSASCRIPT),
    ("scpt", OSASCRIPT),
];

const GENERIC_ENTRIES: &[(&str, Interpreter)] = &[("sh", POSIX_SHELL)];

#[derive(Debug, Clone, Copy)]
pub struct DispatchTable {
    platform: Platform,
    entries: &'static [(&'static str, Interpreter)],
}

impl DispatchTable {
    pub const fn for_platform(platform: Platform) -> Self {
        let entries = match platform {
            Platform::Windows => WINDOWS_ENTRIES,
            Platform::MacOs => MACOS_ENTRIES,
            Platform::Generic => GENERIC_ENTRIES,
        };
        Self { platform, entries }
    }

    pub const fn current() -> Self {
        Self::for_platform(Platform::current())
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn extensions(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(ext, _)| *ext)
    }

    pub fn interpreter_for(&self, script: &Path) -> Option<&Interpreter> {
        let ext = script.extension()?.to_str()?;
        self.entries
            .iter()
            .find(|(candidate, _)| *candidate == ext)
            .map(|(_, interpreter)| interpreter)
    }

    pub fn command_for(&self, script: &Path) -> Option<StdCommand> {
        self.interpreter_for(script).map(|i| i.command(script))
    }
}

impl Default for DispatchTable {
    fn default() -> Self {
        Self::current()
    }
}
