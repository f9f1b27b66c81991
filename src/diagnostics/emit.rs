//! Diagnostic emission backend.
//!
//! A leveled printer to stderr. Message formatting stays on the stack, so
//! emission is safe inside the reentrancy-guarded hook sections. With the
//! `log` feature, messages are also forwarded to the log facade for
//! programs that already run a logger.

use std::fmt;
use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use super::level::TraceLevel;

/// Minimum level a message needs to be emitted.
static LEVEL: AtomicU8 = AtomicU8::new(TraceLevel::Error as u8);

/// Global flag to suppress diagnostic output (for testing).
static SUPPRESSED: AtomicBool = AtomicBool::new(false);

/// Set the emission threshold.
pub fn set_level(level: TraceLevel) {
    LEVEL.store(level as u8, Ordering::Relaxed);
}

/// Current emission threshold.
pub fn level() -> TraceLevel {
    TraceLevel::from_u8(LEVEL.load(Ordering::Relaxed))
}

/// Suppress all diagnostic output.
pub fn suppress(suppress: bool) {
    SUPPRESSED.store(suppress, Ordering::Relaxed);
}

/// Check if diagnostics are suppressed.
pub fn is_suppressed() -> bool {
    SUPPRESSED.load(Ordering::Relaxed)
}

/// Emit one message at `level`, subject to the threshold.
pub(crate) fn emit(message_level: TraceLevel, args: fmt::Arguments<'_>) {
    if message_level == TraceLevel::None || is_suppressed() || message_level < level() {
        return;
    }

    let mut stderr = std::io::stderr();
    let _ = writeln!(stderr, "[alloctrace] {}: {}", message_level.prefix(), args);

    #[cfg(feature = "log")]
    forward_to_log(message_level, args);
}

/// Mirror a message onto the log facade.
#[cfg(feature = "log")]
fn forward_to_log(message_level: TraceLevel, args: fmt::Arguments<'_>) {
    match message_level {
        TraceLevel::Debug => log::debug!("{}", args),
        TraceLevel::Info => log::info!("{}", args),
        TraceLevel::Warning => log::warn!("{}", args),
        TraceLevel::Error => log::error!("{}", args),
        TraceLevel::None => {}
    }
}
