//! Allocators that reuse or wipe scratch memory.
//!
//! # Warning
//!
//! [`Shared`] hands the same thread-local buffer to every scratch request on a thread. Data
//! written into it by one call is visible to the next one until overwritten. Wrap it in
//! [`Zeroing`] when scratch buffers may hold secrets.

use crate::{thread_local::Cached, thread_local_cache};
use bytecraft_codec::{Allocator, Unique};
use bytes::BytesMut;
use zeroize::Zeroize;

thread_local_cache!(static SCRATCH: Vec<u8>);

/// Allocator that serves scratch requests from one reusable buffer per thread.
///
/// The buffer must be set up with [`Shared::reserve`]. Requests larger than the reserved
/// buffer, requests made while the buffer is already in use (nested calls), and requests on
/// threads without a reserved buffer fall back to a fresh allocation.
///
/// Unique allocations are always fresh.
#[derive(Clone, Copy, Debug, Default)]
pub struct Shared;

impl Shared {
    /// Replaces the scratch buffer of the current thread with a zeroed buffer of `len` bytes.
    ///
    /// A `len` of zero discards the buffer. Returns false (and changes nothing) if called from
    /// within a scratch request on the same thread.
    pub fn reserve(len: usize) -> bool {
        let buf = (len > 0).then(|| vec![0u8; len]);
        Cached::store(&SCRATCH, buf).is_ok()
    }

    /// Discards the scratch buffer of the current thread.
    pub fn discard() -> bool {
        Self::reserve(0)
    }

    /// Length of the scratch buffer reserved on the current thread, if any.
    pub fn reserved() -> Option<usize> {
        SCRATCH.with(|cell| cell.borrow().1.as_ref().map(Vec::len))
    }
}

impl Allocator for Shared {
    fn allocate_unique(&self, len: usize) -> BytesMut {
        Unique.allocate_unique(len)
    }

    fn with_scratch<R>(&self, min_len: usize, f: impl FnOnce(&mut [u8]) -> R) -> R {
        match Cached::take(&SCRATCH) {
            Some(mut buf) if buf.len() >= min_len => f(&mut buf[..min_len]),
            _ => Unique.with_scratch(min_len, f),
        }
    }
}

/// Wipes a buffer when dropped, including during unwinding.
struct Wipe<'a>(&'a mut [u8]);

impl Drop for Wipe<'_> {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// Allocator that zero-fills every scratch buffer once the request completes.
///
/// Unique allocations are handed to the caller and are not tracked.
#[derive(Clone, Copy, Debug, Default)]
pub struct Zeroing<A = Shared> {
    inner: A,
}

impl<A: Allocator> Zeroing<A> {
    /// Wraps `inner`.
    pub fn new(inner: A) -> Self {
        Self { inner }
    }

    /// Returns the wrapped allocator.
    pub fn into_inner(self) -> A {
        self.inner
    }
}

impl<A: Allocator> Allocator for Zeroing<A> {
    fn allocate_unique(&self, len: usize) -> BytesMut {
        self.inner.allocate_unique(len)
    }

    fn with_scratch<R>(&self, min_len: usize, f: impl FnOnce(&mut [u8]) -> R) -> R {
        self.inner.with_scratch(min_len, |buf| {
            let wipe = Wipe(buf);
            f(&mut *wipe.0)
        })
    }
}
