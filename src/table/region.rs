//! Anonymous memory mappings backing the allocation table.
//!
//! The table must never borrow from the allocator it observes, so its
//! storage comes straight from the operating system.

use std::mem;
use std::ptr::{self, NonNull};

use crate::table::TableError;

/// A private anonymous read/write mapping.
pub(crate) struct MappedRegion {
    ptr: NonNull<u8>,
    len: usize,
}

impl MappedRegion {
    /// Map `len` bytes of zeroed memory.
    pub(crate) fn map(len: usize) -> Result<Self, TableError> {
        // SAFETY: anonymous private mapping; no fd, no fixed address.
        let raw = unsafe {
            libc::mmap(
                ptr::null_mut(),
                len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
                -1,
                0,
            )
        };
        if raw == libc::MAP_FAILED {
            return Err(TableError::MappingFailed);
        }
        match NonNull::new(raw as *mut u8) {
            Some(ptr) => Ok(Self { ptr, len }),
            None => Err(TableError::MappingFailed),
        }
    }

    /// Explicitly release the mapping.
    pub(crate) fn unmap(self) -> Result<(), TableError> {
        let (ptr, len) = (self.ptr, self.len);
        mem::forget(self);
        // SAFETY: exact address and length handed out by `map`.
        let ret = unsafe { libc::munmap(ptr.as_ptr() as *mut libc::c_void, len) };
        if ret == -1 {
            Err(TableError::UnmapFailed)
        } else {
            Ok(())
        }
    }

    pub(crate) fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.len
    }
}

impl Drop for MappedRegion {
    fn drop(&mut self) {
        // Failure is unreportable here; the explicit path is `unmap`.
        // SAFETY: exact address and length handed out by `map`.
        unsafe {
            libc::munmap(self.ptr.as_ptr() as *mut libc::c_void, self.len);
        }
    }
}
