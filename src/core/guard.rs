//! Reentrancy protection for the tracking hooks.
//!
//! Bookkeeping (table mutation, backtrace capture, diagnostics) may itself
//! reach the allocator, and that traffic must not re-enter the tracking
//! path. Two independent defenses: a suppression flag per hook kind, set
//! for the duration of that kind's handler, and a global depth counter that
//! abandons tracking once nesting exceeds a fixed bound.

use std::cell::Cell;

/// Nesting bound past which tracking is abandoned.
pub(crate) const MAX_HOOK_DEPTH: u8 = 8;

/// The four intercepted allocator operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HookKind {
    Allocate,
    Free,
    ZeroAllocate,
    Resize,
}

impl HookKind {
    pub(crate) const COUNT: usize = 4;

    fn index(self) -> usize {
        self as usize
    }
}

/// Per-kind suppression flags plus the call-depth counter.
///
/// Interior-mutable so it can sit behind the shared tracer reference; like
/// the rest of the tracer state it carries no synchronization (see the
/// concurrency note on [`crate::Tracer`]).
pub(crate) struct ReentrancyGuard {
    suppressed: [Cell<bool>; HookKind::COUNT],
    depth: Cell<u8>,
}

impl ReentrancyGuard {
    pub(crate) const fn new() -> Self {
        Self {
            suppressed: [
                Cell::new(false),
                Cell::new(false),
                Cell::new(false),
                Cell::new(false),
            ],
            depth: Cell::new(0),
        }
    }

    /// Open a tracking section for `kind`.
    ///
    /// Returns `None` when this kind is already live on the call stack or
    /// the nesting bound is exceeded; the caller must then skip bookkeeping
    /// entirely (the real operation has already run).
    pub(crate) fn enter(&self, kind: HookKind) -> Option<HookSection<'_>> {
        if self.suppressed[kind.index()].get() || self.depth.get() > MAX_HOOK_DEPTH {
            return None;
        }
        self.suppressed[kind.index()].set(true);
        self.depth.set(self.depth.get() + 1);
        Some(HookSection { guard: self, kind })
    }

    #[cfg(test)]
    fn depth(&self) -> u8 {
        self.depth.get()
    }
}

/// One live tracking section.
///
/// Dropping it releases the suppression flag and the depth slot, on every
/// exit path.
pub(crate) struct HookSection<'a> {
    guard: &'a ReentrancyGuard,
    kind: HookKind,
}

impl Drop for HookSection<'_> {
    fn drop(&mut self) {
        self.guard.suppressed[self.kind.index()].set(false);
        self.guard.depth.set(self.guard.depth.get() - 1);
    }
}
