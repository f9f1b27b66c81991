//! The tracer: interception entry points and lifecycle.

use std::cell::{Cell, UnsafeCell};

use crate::api::config::TraceConfig;
use crate::api::snapshot::CapacitySnapshot;
use crate::core::guard::{HookKind, ReentrancyGuard};
use crate::core::status::TraceStatus;
use crate::diagnostics::{self, trace_debug, trace_error, trace_info};
use crate::intercept::real::{RealAllocator, SystemMalloc};
use crate::table::{AllocationRecord, AllocationTable, TableError};

/// Process-wide allocation tracker.
///
/// One explicit value owns everything the tracker mutates — status, the
/// reentrancy guard, the cached configuration, and the allocation table —
/// instead of scattering that state across globals. The real allocator is
/// injected at construction and invoked unconditionally by every entry
/// point; tracking is a side channel that never changes what the caller
/// observes.
///
/// The table is built lazily on the first traced call, sized from
/// [`TraceConfig`]; while construction keeps failing, every entry point
/// degrades to a pure pass-through.
///
/// # Concurrency
///
/// `Tracer` is `Sync` so it can back a `static` (required for
/// `#[global_allocator]`), but none of its state is synchronized:
/// concurrent traced calls can race on table compaction and on the guard's
/// depth counter. This is a known gap — a production deployment needs
/// mutual exclusion around every table mutation and the guard state,
/// scoped tightly enough not to serialize the traced program's allocator
/// traffic.
pub struct Tracer<A = SystemMalloc> {
    real: A,
    status: Cell<TraceStatus>,
    active: Cell<bool>,
    fault_reported: Cell<bool>,
    config: Cell<Option<TraceConfig>>,
    guard: ReentrancyGuard,
    table: UnsafeCell<Option<AllocationTable>>,
}

// SAFETY: asserted so the tracer can back a global allocator; the interior
// state is deliberately unsynchronized (see the type-level note).
unsafe impl<A: Sync> Sync for Tracer<A> {}

impl Tracer<SystemMalloc> {
    /// Tracker over the process C allocator.
    pub const fn system() -> Self {
        Self::with_allocator(SystemMalloc)
    }
}

impl Default for Tracer<SystemMalloc> {
    fn default() -> Self {
        Self::system()
    }
}

impl<A: RealAllocator> Tracer<A> {
    /// Tracker over an explicit real allocator.
    ///
    /// Configuration is read from the environment on the first traced
    /// call.
    pub const fn with_allocator(real: A) -> Self {
        Self {
            real,
            status: Cell::new(TraceStatus::Uninitialized),
            active: Cell::new(false),
            fault_reported: Cell::new(false),
            config: Cell::new(None),
            guard: ReentrancyGuard::new(),
            table: UnsafeCell::new(None),
        }
    }

    /// Tracker with explicit configuration; the environment is not read.
    ///
    /// The diagnostic level is only adopted from environment-sourced
    /// configuration — callers passing a config here set the level through
    /// [`diagnostics::set_level`] themselves.
    pub const fn with_config(real: A, config: TraceConfig) -> Self {
        Self {
            real,
            status: Cell::new(TraceStatus::Uninitialized),
            active: Cell::new(false),
            fault_reported: Cell::new(false),
            config: Cell::new(Some(config)),
            guard: ReentrancyGuard::new(),
            table: UnsafeCell::new(None),
        }
    }

    /// The injected real allocator.
    pub fn real(&self) -> &A {
        &self.real
    }

    /// Current lifecycle status.
    pub fn status(&self) -> TraceStatus {
        self.status.get()
    }

    /// Whether traced calls are currently recorded.
    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    /// Stop recording; traced calls pass straight through.
    pub fn disable(&self) {
        self.active.set(false);
    }

    /// Resume recording, provided the table is ready.
    pub fn enable(&self) {
        if self.status.get().is_ready() {
            self.active.set(true);
        }
    }

    //
    // Entry points
    //

    /// Intercepted allocate: `size` bytes, null on failure.
    pub fn allocate(&self, size: usize) -> *mut u8 {
        let ptr = self.real.allocate(size);
        self.ensure_ready();
        self.record_allocation(HookKind::Allocate, ptr, size);
        ptr
    }

    /// Intercepted free; no-op on null.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or a live block obtained from this tracer's real
    /// allocator.
    pub unsafe fn free(&self, ptr: *mut u8) {
        self.real.free(ptr);
        self.ensure_ready();
        self.record_deallocation(HookKind::Free, ptr);
    }

    /// Intercepted zero-allocate: `count * element_size` zeroed bytes,
    /// null on failure.
    pub fn allocate_zeroed(&self, count: usize, element_size: usize) -> *mut u8 {
        let ptr = self.real.allocate_zeroed(count, element_size);
        self.ensure_ready();
        self.record_allocation(
            HookKind::ZeroAllocate,
            ptr,
            count.saturating_mul(element_size),
        );
        ptr
    }

    /// Intercepted resize.
    ///
    /// A null `ptr` behaves as allocate, `new_size == 0` behaves as free;
    /// otherwise the record follows the real allocator: same returned
    /// address updates the stored size in place, a different address
    /// retires the old record and starts a fresh one.
    ///
    /// # Safety
    ///
    /// `ptr` must be null or a live block obtained from this tracer's real
    /// allocator.
    pub unsafe fn resize(&self, ptr: *mut u8, new_size: usize) -> *mut u8 {
        let new_ptr = self.real.resize(ptr, new_size);
        self.ensure_ready();
        self.record_resize(ptr, new_ptr, new_size);
        new_ptr
    }

    //
    // Consumer-facing enumeration
    //

    /// Visit every live record in insertion order.
    ///
    /// The visitor returns `false` to stop early. No-op until the table
    /// exists.
    pub fn for_each<F>(&self, visitor: F)
    where
        F: FnMut(&AllocationRecord) -> bool,
    {
        self.with_table_ref(|table| table.for_each(visitor));
    }

    /// Visit live records whose address lies in `[low, high]` inclusive,
    /// in table order.
    pub fn for_each_in_range<F>(&self, low: usize, high: usize, visitor: F)
    where
        F: FnMut(&AllocationRecord) -> bool,
    {
        self.with_table_ref(|table| table.for_each_in_range(low, high, visitor));
    }

    /// Point-in-time usage snapshot, once the table exists.
    pub fn capacity(&self) -> Option<CapacitySnapshot> {
        self.with_table_ref(AllocationTable::capacity)
    }

    /// Drop every record without releasing the table.
    pub fn clear(&self) {
        self.with_table(AllocationTable::clear);
    }

    /// Tear down the table and return to `Uninitialized`.
    ///
    /// The process-wide tracker normally lives as long as the process;
    /// this exists for embedders that own their tracer. The next traced
    /// call rebuilds the table.
    pub fn teardown(&self) -> Result<(), TableError> {
        self.active.set(false);
        self.status.set(TraceStatus::Uninitialized);
        // SAFETY: see the concurrency note on the type.
        match unsafe { (*self.table.get()).take() } {
            Some(table) => table.destroy(),
            None => Ok(()),
        }
    }

    //
    // Lifecycle
    //

    /// Lazily build the table; retried on every traced call until ready.
    fn ensure_ready(&self) {
        if self.status.get().is_ready() {
            return;
        }
        let config = match self.config.get() {
            Some(config) => config,
            None => {
                let config = TraceConfig::from_env();
                diagnostics::set_level(config.level);
                self.config.set(Some(config));
                config
            }
        };
        match AllocationTable::create(config.table_bytes) {
            Ok(table) => {
                let snapshot = table.capacity();
                // SAFETY: see the concurrency note on the type.
                unsafe { *self.table.get() = Some(table) };
                self.status.set(TraceStatus::Ready);
                self.active.set(true);
                trace_info!(
                    "allocation table ready: {} entries in {} bytes",
                    snapshot.total_entries,
                    config.table_bytes
                );
            }
            Err(TableError::SizeInvalid) => self.fail(TraceStatus::SizeInvalid),
            Err(_) => self.fail(TraceStatus::MappingFailed),
        }
    }

    fn fail(&self, status: TraceStatus) {
        self.status.set(status);
        self.active.set(false);
        if !self.fault_reported.get() {
            self.fault_reported.set(true);
            trace_error!("allocation tracking disabled: {}", status);
        }
    }

    //
    // Bookkeeping
    //

    fn record_allocation(&self, kind: HookKind, ptr: *mut u8, size: usize) {
        if !self.active.get() || ptr.is_null() || size == 0 {
            return;
        }
        let Some(_section) = self.guard.enter(kind) else {
            return;
        };
        let record = AllocationRecord::capture(ptr as usize, size);
        self.with_table(|table| {
            if let Err(err) = table.insert(record) {
                trace_error!("could not record allocation at {:#x}: {}", ptr as usize, err);
            }
        });
    }

    fn record_deallocation(&self, kind: HookKind, ptr: *mut u8) {
        if !self.active.get() || ptr.is_null() {
            return;
        }
        let Some(_section) = self.guard.enter(kind) else {
            return;
        };
        self.with_table(|table| {
            if let Err(err) = table.remove(ptr as usize) {
                trace_debug!("free of untracked address {:#x}: {}", ptr as usize, err);
            }
        });
    }

    fn record_resize(&self, old_ptr: *mut u8, new_ptr: *mut u8, new_size: usize) {
        if !self.active.get() {
            return;
        }
        if old_ptr.is_null() {
            self.record_allocation(HookKind::Allocate, new_ptr, new_size);
            return;
        }
        if new_size == 0 {
            self.record_deallocation(HookKind::Free, old_ptr);
            return;
        }
        if new_ptr.is_null() {
            // Real resize failed; the old block is still live, keep its record.
            return;
        }
        let Some(_section) = self.guard.enter(HookKind::Resize) else {
            return;
        };
        self.with_table(|table| {
            if new_ptr == old_ptr {
                // Moved nowhere: only the size changed.
                if let Some(record) = table.search_mut(old_ptr as usize) {
                    record.chunk.size = new_size;
                }
                return;
            }
            if let Err(err) = table.remove(old_ptr as usize) {
                trace_debug!(
                    "resize of untracked address {:#x}: {}",
                    old_ptr as usize,
                    err
                );
            }
            let record = AllocationRecord::capture(new_ptr as usize, new_size);
            if let Err(err) = table.insert(record) {
                trace_error!(
                    "could not record resized allocation at {:#x}: {}",
                    new_ptr as usize,
                    err
                );
            }
        });
    }

    //
    // Table access
    //

    fn with_table<R>(&self, f: impl FnOnce(&mut AllocationTable) -> R) -> Option<R> {
        // SAFETY: see the concurrency note on the type; the reference never
        // escapes the closure.
        unsafe { (*self.table.get()).as_mut() }.map(f)
    }

    fn with_table_ref<R>(&self, f: impl FnOnce(&AllocationTable) -> R) -> Option<R> {
        // SAFETY: as in `with_table`.
        unsafe { (*self.table.get()).as_ref() }.map(f)
    }
}
