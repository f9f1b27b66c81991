//! The allocation table and its record types.
//!
//! A fixed-capacity, out-of-band record store: one entry per currently-live
//! traced block, held in an anonymous mapping that never touches the traced
//! allocator. Insert appends, removal compacts forward, enumeration walks
//! insertion order.

mod map;
mod record;
mod region;

pub use map::{AllocationTable, RECORD_BYTES};
pub use record::{AllocationRecord, Chunk};

use std::error::Error;
use std::fmt;

/// Errors produced by table construction, teardown, and mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableError {
    /// The requested capacity cannot hold the table metadata.
    SizeInvalid,
    /// The operating system refused the backing mapping.
    MappingFailed,
    /// The backing mapping could not be released.
    UnmapFailed,
    /// No room for one more record.
    TableFull,
    /// No live record matches the given address.
    NotFound,
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TableError::SizeInvalid => "capacity too small for table metadata",
            TableError::MappingFailed => "backing mapping could not be obtained",
            TableError::UnmapFailed => "backing mapping could not be released",
            TableError::TableFull => "no space left for another record",
            TableError::NotFound => "address is not tracked",
        };
        f.pad(text)
    }
}

impl Error for TableError {}
