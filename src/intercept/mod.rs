//! Allocator interception surfaces.
//!
//! [`real`] defines the injected real-allocator dependency; [`global`]
//! adapts the tracer to `std::alloc::GlobalAlloc` so a program can route
//! all of its heap traffic through the tracker.

pub mod global;
pub mod real;
