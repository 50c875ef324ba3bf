//! Read and write raw binary data.
//!
//! # Overview
//!
//! Two complementary types cover both directions:
//! - [`Serializer`] queues fixed-length parts and writes them into a single buffer once the
//!   total length is known.
//! - [`Deserializer`] reads values off a bounds-checked cursor over untrusted input.
//!
//! Numbers are unsigned integers (8 to 64 bits) and IEEE-754 floats (32 and 64 bits). Every
//! method is explicit about byte order: unsuffixed methods are big-endian and `_le` methods
//! are little-endian. Booleans are a single `0x00`/`0x01` byte. Variable-length values are
//! preceded by a [`LengthPrefix`] chosen by the format author.
//!
//! # Example
//!
//! ```
//! use bytecraft_codec::{Deserializer, Error, LengthPrefix, Serialize, Serializer};
//!
//! struct Item {
//!     id: u32,
//!     name: String,
//!     score: Option<f64>,
//! }
//!
//! impl Serialize for Item {
//!     fn serialize(&self, s: &mut Serializer) -> Result<(), Error> {
//!         s.u32(self.id);
//!         s.prefixed_utf8(LengthPrefix::U16, &self.name)?;
//!         s.option(self.score, |s, score| {
//!             s.f64_le(score);
//!             Ok(())
//!         })?;
//!         Ok(())
//!     }
//! }
//!
//! let item = Item { id: 7, name: "seven".into(), score: Some(0.5) };
//! let buf = Serializer::to_bytes(&item).unwrap();
//!
//! let mut d = Deserializer::new(buf.freeze());
//! assert_eq!(d.u32().unwrap(), 7);
//! assert_eq!(d.prefixed_utf8(LengthPrefix::U16, ..=64).unwrap(), "seven");
//! assert_eq!(d.option(|d| d.f64_le()).unwrap(), Some(0.5));
//! assert_eq!(d.bytes_available(), 0);
//! ```

pub mod alloc;
pub mod buffer;
pub mod config;
pub mod deserializer;
pub mod error;
pub mod primitive;
pub mod serializer;

// Re-export main types and traits
pub use alloc::{Allocator, Unique};
pub use config::{LengthPrefix, RangeCfg};
pub use deserializer::{Checkpoint, Deserializer};
pub use error::Error;
pub use primitive::{Endian, Primitive};
pub use serializer::{Context, Prefix, Serialize, Serializer};
