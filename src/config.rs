//! Run-wide settings decided once at startup.

/// Logging verbosity, constructed from the `--debug` and `--quiet`
/// flags and passed explicitly to whatever needs it.
///
/// Silent takes precedence over debug.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Suppress everything below error level.
    Silent,
    /// Normal operational output.
    Info,
    /// Per-file and per-object detail.
    Debug,
}

impl Verbosity {
    pub fn from_flags(debug: bool, quiet: bool) -> Self {
        if quiet {
            Verbosity::Silent
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Info
        }
    }

    /// Filter directive understood by tracing-subscriber.
    pub fn filter(self) -> &'static str {
        match self {
            Verbosity::Silent => "error",
            Verbosity::Info => "info",
            Verbosity::Debug => "debug",
        }
    }
}
