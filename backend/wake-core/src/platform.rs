//! Host platform families that change how the display is woken and how
//! scripts are interpreted.

use std::fmt::{Display, Formatter, Result as FormatResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Windows,
    MacOs,
    /// Linux, the BSDs and anything else.
    Generic,
}

impl Platform {
    pub const fn current() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Generic
        }
    }
}

impl Display for Platform {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        let name = match self {
            Platform::Windows => "windows",
            Platform::MacOs => "macos",
            Platform::Generic => "generic",
        };
        formatter.write_str(name)
    }
}
