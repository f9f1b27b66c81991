//! Global-allocator adapter.
//!
//! Installing the tracer as the Rust global allocator routes the whole
//! program's heap traffic through the interception entry points:
//!
//! ```rust,ignore
//! use alloctrace::TracingAllocator;
//!
//! #[global_allocator]
//! static ALLOC: TracingAllocator = TracingAllocator::system();
//! ```
//!
//! The malloc family guarantees `max_align_t` alignment; layouts above
//! that are served by over-allocating and stashing the base pointer just
//! below the aligned address.

use std::alloc::{GlobalAlloc, Layout};
use std::cmp;
use std::mem;
use std::ptr;

use crate::api::tracer::Tracer;
use crate::intercept::real::{RealAllocator, SystemMalloc};

/// Largest alignment the malloc family guarantees.
const MALLOC_ALIGN: usize = mem::align_of::<libc::max_align_t>();

/// `GlobalAlloc` front end over a [`Tracer`].
pub struct TracingAllocator<A = SystemMalloc> {
    tracer: Tracer<A>,
}

impl TracingAllocator<SystemMalloc> {
    /// Adapter over the process C allocator.
    pub const fn system() -> Self {
        Self {
            tracer: Tracer::system(),
        }
    }
}

impl<A: RealAllocator> TracingAllocator<A> {
    /// Adapter over an explicit real allocator.
    pub const fn with_allocator(real: A) -> Self {
        Self {
            tracer: Tracer::with_allocator(real),
        }
    }

    /// The tracer behind this allocator, for status and enumeration.
    pub fn tracer(&self) -> &Tracer<A> {
        &self.tracer
    }
}

unsafe impl<A: RealAllocator> GlobalAlloc for TracingAllocator<A> {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        if layout.align() <= MALLOC_ALIGN {
            return self.tracer.allocate(layout.size());
        }
        alloc_overaligned(&self.tracer, layout)
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        if layout.align() <= MALLOC_ALIGN {
            self.tracer.free(ptr);
            return;
        }
        let base = (ptr as *mut *mut u8).sub(1).read();
        self.tracer.free(base);
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        if layout.align() <= MALLOC_ALIGN {
            return self.tracer.allocate_zeroed(layout.size(), 1);
        }
        let ptr = alloc_overaligned(&self.tracer, layout);
        if !ptr.is_null() {
            ptr::write_bytes(ptr, 0, layout.size());
        }
        ptr
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        if layout.align() <= MALLOC_ALIGN {
            return self.tracer.resize(ptr, new_size);
        }
        // Over-aligned blocks cannot be resized in place.
        let new_layout = Layout::from_size_align_unchecked(new_size, layout.align());
        let new_ptr = self.alloc(new_layout);
        if !new_ptr.is_null() {
            ptr::copy_nonoverlapping(ptr, new_ptr, cmp::min(layout.size(), new_size));
            self.dealloc(ptr, layout);
        }
        new_ptr
    }
}

/// Serve an alignment beyond the malloc guarantee.
///
/// Over-allocates by the alignment plus one pointer, aligns past the base,
/// and stashes the base pointer in the word below the returned address so
/// `dealloc` can recover it. The table records the base allocation.
unsafe fn alloc_overaligned<A: RealAllocator>(tracer: &Tracer<A>, layout: Layout) -> *mut u8 {
    let total = layout.size() + layout.align() + mem::size_of::<*mut u8>();
    let base = tracer.allocate(total);
    if base.is_null() {
        return ptr::null_mut();
    }
    let start = base as usize + mem::size_of::<*mut u8>();
    let aligned = (start + layout.align() - 1) & !(layout.align() - 1);
    (aligned as *mut *mut u8).sub(1).write(base);
    aligned as *mut u8
}
