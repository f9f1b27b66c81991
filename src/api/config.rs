//! Tracer configuration.

use std::ffi::CStr;
use std::os::raw::c_char;

use crate::diagnostics::TraceLevel;
use crate::util::size::kb;

/// Configuration for the tracker.
///
/// Read once at lazy initialization. `from_env` runs underneath the
/// interception hooks, so it reads the environment through `getenv` and
/// parses in place without touching the heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceConfig {
    /// Capacity of the allocation table's backing mapping, in bytes
    /// (default: 16 KB).
    pub table_bytes: usize,

    /// Diagnostic verbosity threshold (default: error).
    pub level: TraceLevel,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            table_bytes: kb(16),
            level: TraceLevel::Error,
        }
    }
}

impl TraceConfig {
    /// Environment variable holding the table capacity in bytes.
    pub const TABLE_SIZE_VAR: &'static str = "ALLOCTRACE_TABLE_SIZE";

    /// Environment variable holding the diagnostic level
    /// (`debug|info|warning|error|none`).
    pub const LOG_LEVEL_VAR: &'static str = "ALLOCTRACE_LOG_LEVEL";

    /// Read configuration from the environment.
    ///
    /// Unset or malformed values fall back to the defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(value) = getenv(b"ALLOCTRACE_TABLE_SIZE\0") {
            if let Ok(bytes) = value.parse::<usize>() {
                config.table_bytes = bytes;
            }
        }
        if let Some(value) = getenv(b"ALLOCTRACE_LOG_LEVEL\0") {
            if let Ok(level) = value.parse::<TraceLevel>() {
                config.level = level;
            }
        }
        config
    }

    /// Builder pattern: set the table capacity in bytes.
    pub fn with_table_bytes(mut self, bytes: usize) -> Self {
        self.table_bytes = bytes;
        self
    }

    /// Builder pattern: set the diagnostic level.
    pub fn with_level(mut self, level: TraceLevel) -> Self {
        self.level = level;
        self
    }
}

/// Environment lookup that never touches the heap.
///
/// `name` must be nul-terminated. The returned slice borrows the process
/// environment and should be consumed before any call that mutates it.
fn getenv(name: &[u8]) -> Option<&'static str> {
    debug_assert!(name.ends_with(&[0]));
    // SAFETY: `name` is nul-terminated; getenv returns null or a pointer
    // into the environment block.
    let raw = unsafe { libc::getenv(name.as_ptr() as *const c_char) };
    if raw.is_null() {
        return None;
    }
    // SAFETY: non-null getenv results point at a nul-terminated string.
    unsafe { CStr::from_ptr(raw) }.to_str().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TraceConfig::default();
        assert_eq!(config.table_bytes, kb(16));
        assert_eq!(config.level, TraceLevel::Error);
    }

    #[test]
    fn test_builders() {
        let config = TraceConfig::default()
            .with_table_bytes(kb(64))
            .with_level(TraceLevel::Debug);
        assert_eq!(config.table_bytes, kb(64));
        assert_eq!(config.level, TraceLevel::Debug);
    }

    // One test for all environment manipulation: the variables are process
    // globals and the test harness runs tests concurrently.
    #[test]
    fn test_from_env() {
        std::env::remove_var(TraceConfig::TABLE_SIZE_VAR);
        std::env::remove_var(TraceConfig::LOG_LEVEL_VAR);
        assert_eq!(TraceConfig::from_env(), TraceConfig::default());

        std::env::set_var(TraceConfig::TABLE_SIZE_VAR, "65536");
        std::env::set_var(TraceConfig::LOG_LEVEL_VAR, "info");
        let config = TraceConfig::from_env();
        assert_eq!(config.table_bytes, 65536);
        assert_eq!(config.level, TraceLevel::Info);

        std::env::set_var(TraceConfig::TABLE_SIZE_VAR, "not-a-number");
        std::env::set_var(TraceConfig::LOG_LEVEL_VAR, "loud");
        let config = TraceConfig::from_env();
        assert_eq!(config.table_bytes, kb(16));
        assert_eq!(config.level, TraceLevel::Error);

        std::env::remove_var(TraceConfig::TABLE_SIZE_VAR);
        std::env::remove_var(TraceConfig::LOG_LEVEL_VAR);
    }
}
