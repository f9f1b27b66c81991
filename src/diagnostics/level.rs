//! Diagnostic verbosity levels.

use std::fmt;
use std::str::FromStr;

/// Verbosity threshold for tracer diagnostics.
///
/// Levels are ordered from most to least chatty; a message is emitted when
/// its level is at or above the configured threshold. [`TraceLevel::None`]
/// silences all output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum TraceLevel {
    /// Per-call detail, including benign lookup misses.
    Debug = 0,
    /// Lifecycle events (table construction, teardown).
    Info = 1,
    /// Conditions that degrade tracking quality.
    Warning = 2,
    /// Conditions that lose tracking data.
    Error = 3,
    /// No output at all.
    None = 255,
}

impl TraceLevel {
    /// Display prefix for messages at this level.
    pub fn prefix(&self) -> &'static str {
        match self {
            TraceLevel::Debug => "debug",
            TraceLevel::Info => "info",
            TraceLevel::Warning => "warning",
            TraceLevel::Error => "error",
            TraceLevel::None => "none",
        }
    }

    pub(crate) fn from_u8(raw: u8) -> Self {
        match raw {
            0 => TraceLevel::Debug,
            1 => TraceLevel::Info,
            2 => TraceLevel::Warning,
            3 => TraceLevel::Error,
            _ => TraceLevel::None,
        }
    }
}

impl Default for TraceLevel {
    fn default() -> Self {
        TraceLevel::Error
    }
}

impl fmt::Display for TraceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.prefix())
    }
}

/// Returned when a level string is not one of
/// `debug|info|warning|error|none`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseLevelError;

impl fmt::Display for ParseLevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad("unrecognized trace level")
    }
}

impl std::error::Error for ParseLevelError {}

impl FromStr for TraceLevel {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("debug") {
            Ok(TraceLevel::Debug)
        } else if s.eq_ignore_ascii_case("info") {
            Ok(TraceLevel::Info)
        } else if s.eq_ignore_ascii_case("warning") {
            Ok(TraceLevel::Warning)
        } else if s.eq_ignore_ascii_case("error") {
            Ok(TraceLevel::Error)
        } else if s.eq_ignore_ascii_case("none") {
            Ok(TraceLevel::None)
        } else {
            Err(ParseLevelError)
        }
    }
}
