//! # alloctrace
//!
//! Live heap-allocation tracking for leak and usage analysis: every call
//! through the process allocator is intercepted and recorded — address,
//! size, and a fixed-depth backtrace — in an out-of-band table, without
//! changing anything the traced program observes.
//!
//! ## How it works
//!
//! - Every entry point invokes the real allocator first, unconditionally,
//!   and returns exactly its result; tracking is a side channel.
//! - Live records sit in a fixed-capacity table mapped straight from the
//!   operating system, so the tracker never depends on the allocator it
//!   instruments and never grows.
//! - A reentrancy guard (per-hook suppression flags plus a depth bound)
//!   keeps the tracker's own bookkeeping from tracing itself.
//! - The table is built lazily on the first traced call, sized from
//!   `ALLOCTRACE_TABLE_SIZE` (default 16 KB); on construction failure
//!   tracking degrades to pure pass-through.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use alloctrace::TracingAllocator;
//!
//! #[global_allocator]
//! static ALLOC: TracingAllocator = TracingAllocator::system();
//!
//! fn main() {
//!     let data = vec![0u8; 4096];
//!     ALLOC.tracer().for_each(|record| {
//!         eprintln!("{:#x}: {} bytes", record.chunk.address, record.chunk.size);
//!         true
//!     });
//!     drop(data);
//! }
//! ```
//!
//! Embedders that own their allocation flow can drive a [`Tracer`]
//! directly and plug in their own [`RealAllocator`].
//!
//! ## Concurrency
//!
//! The tracker carries **no synchronization** over its table, guard, or
//! status: concurrent allocator traffic can race on table compaction and
//! the guard's depth counter. See the note on [`Tracer`].

pub mod api;
pub mod diagnostics;
pub mod intercept;
pub mod table;

mod core;
#[allow(dead_code)]
mod util;

// Re-export the public surface at the crate root for convenience
pub use crate::api::config::TraceConfig;
pub use crate::api::snapshot::CapacitySnapshot;
pub use crate::api::tracer::Tracer;
pub use crate::core::backtrace::{Backtrace, BACKTRACE_DEPTH};
pub use crate::core::status::TraceStatus;
pub use crate::diagnostics::TraceLevel;
pub use crate::intercept::global::TracingAllocator;
pub use crate::intercept::real::{RealAllocator, SystemMalloc};
pub use crate::table::{AllocationRecord, AllocationTable, Chunk, TableError};
