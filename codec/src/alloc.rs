//! Pluggable memory provider for encode and decode work.
//!
//! # Overview
//!
//! Most buffers produced by this crate are handed to the caller and must be independent of
//! every other allocation. Some work, however, only needs memory for the duration of a single
//! call (for example, the intermediate ASCII produced by a text encoder). An [`Allocator`]
//! exposes both modes so that callers can trade allocation churn for buffer reuse.
//!
//! # Warning
//!
//! A scratch buffer handed to [`Allocator::with_scratch`] may be shared with every other
//! scratch request on the same thread and may still contain bytes written by a previous
//! call. Never copy sensitive data into it unless the allocator wipes it (see the zeroing
//! allocator in `bytecraft-utils`), and never let data escape the closure without copying it.

use bytes::BytesMut;

/// Provider of buffers for serialization and encoding.
pub trait Allocator {
    /// Allocates a zeroed buffer of exactly `len` bytes that does not alias any other
    /// allocation.
    fn allocate_unique(&self, len: usize) -> BytesMut;

    /// Runs `f` with a buffer of at least `min_len` bytes that is only valid for the duration
    /// of the call.
    ///
    /// The buffer may be reused by the next call and its initial contents are unspecified.
    fn with_scratch<R>(&self, min_len: usize, f: impl FnOnce(&mut [u8]) -> R) -> R;
}

/// Allocator that always returns fresh, independent buffers.
///
/// This is the default strategy everywhere an allocator is optional.
#[derive(Clone, Copy, Debug, Default)]
pub struct Unique;

impl Allocator for Unique {
    fn allocate_unique(&self, len: usize) -> BytesMut {
        BytesMut::zeroed(len)
    }

    fn with_scratch<R>(&self, min_len: usize, f: impl FnOnce(&mut [u8]) -> R) -> R {
        let mut buf = vec![0u8; min_len];
        f(&mut buf)
    }
}

impl<A: Allocator + ?Sized> Allocator for &A {
    fn allocate_unique(&self, len: usize) -> BytesMut {
        (**self).allocate_unique(len)
    }

    fn with_scratch<R>(&self, min_len: usize, f: impl FnOnce(&mut [u8]) -> R) -> R {
        (**self).with_scratch(min_len, f)
    }
}
