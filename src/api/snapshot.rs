//! Point-in-time table usage snapshots.

use std::fmt;

use crate::util::size::format_bytes;

/// Usage snapshot of the allocation table.
///
/// Derived from the table's fixed capacity and current population when
/// requested; never stored. `free + used == total` holds for both bytes
/// and entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CapacitySnapshot {
    /// Bytes of record storage.
    pub total_bytes: usize,

    /// Bytes not holding a live record.
    pub free_bytes: usize,

    /// Records the storage can hold.
    pub total_entries: usize,

    /// Record slots still free.
    pub free_entries: usize,
}

impl CapacitySnapshot {
    /// Bytes occupied by live records.
    pub fn used_bytes(&self) -> usize {
        self.total_bytes - self.free_bytes
    }

    /// Number of live records.
    pub fn used_entries(&self) -> usize {
        self.total_entries - self.free_entries
    }
}

impl fmt::Display for CapacitySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Allocation table usage:")?;
        writeln!(
            f,
            "  Entries: {} / {}",
            self.used_entries(),
            self.total_entries
        )?;
        write!(
            f,
            "  Bytes:   {} / {}",
            format_bytes(self.used_bytes()),
            format_bytes(self.total_bytes)
        )
    }
}
