//! Tracer diagnostics.
//!
//! The tracker reports its own health (table construction failures, dropped
//! records) through a small leveled printer so that a failing tracker is
//! visible without ever disturbing the traced program. The threshold comes
//! from configuration (`ALLOCTRACE_LOG_LEVEL`); the default only surfaces
//! lost tracking data.

pub mod emit;
pub mod level;

pub use emit::{is_suppressed, level, set_level, suppress};
pub use level::{ParseLevelError, TraceLevel};

macro_rules! trace_debug {
    ($($arg:tt)*) => {
        $crate::diagnostics::emit::emit(
            $crate::diagnostics::TraceLevel::Debug,
            format_args!($($arg)*),
        )
    };
}

macro_rules! trace_info {
    ($($arg:tt)*) => {
        $crate::diagnostics::emit::emit(
            $crate::diagnostics::TraceLevel::Info,
            format_args!($($arg)*),
        )
    };
}

macro_rules! trace_error {
    ($($arg:tt)*) => {
        $crate::diagnostics::emit::emit(
            $crate::diagnostics::TraceLevel::Error,
            format_args!($($arg)*),
        )
    };
}

pub(crate) use {trace_debug, trace_error, trace_info};
