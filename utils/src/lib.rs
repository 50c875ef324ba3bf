//! Queue, allocate and encode raw bytes.
//!
//! This crate complements `bytecraft-codec` with the pieces that sit around a binary format
//! rather than inside it:
//! - [`ByteQueue`]: a FIFO of byte chunks.
//! - [`scratch`]: allocators that reuse ([`Shared`]) or wipe ([`Zeroing`]) scratch memory.
//! - [`encoding`]: hex, base32, base64 and base-N text encodings.

pub mod encoding;
pub mod queue;
pub mod scratch;
pub mod thread_local;

pub use queue::ByteQueue;
pub use scratch::{Shared, Zeroing};
pub use thread_local::Cached;
