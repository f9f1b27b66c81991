//! Tracker lifecycle status.

use std::fmt;

/// Construction state of the process-wide tracker.
///
/// Anything other than `Ready` means traced calls pass straight through to
/// the real allocator without bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceStatus {
    /// Table construction has not been attempted yet.
    Uninitialized,
    /// The table is mapped and tracking can proceed.
    Ready,
    /// The configured capacity cannot hold the table metadata.
    SizeInvalid,
    /// The operating system refused the backing mapping.
    MappingFailed,
}

impl TraceStatus {
    /// Whether this status permits tracking.
    pub fn is_ready(&self) -> bool {
        matches!(self, TraceStatus::Ready)
    }
}

impl fmt::Display for TraceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TraceStatus::Uninitialized => "allocation table not yet constructed",
            TraceStatus::Ready => "ready",
            TraceStatus::SizeInvalid => "configured table size cannot hold table metadata",
            TraceStatus::MappingFailed => "backing mapping could not be obtained",
        };
        f.pad(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_ready_is_ready() {
        assert!(TraceStatus::Ready.is_ready());
        assert!(!TraceStatus::Uninitialized.is_ready());
        assert!(!TraceStatus::SizeInvalid.is_ready());
        assert!(!TraceStatus::MappingFailed.is_ready());
    }
}
