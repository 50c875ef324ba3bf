//! Deserialize values incrementally from an asynchronous byte source.
//!
//! # Overview
//!
//! A [`StreamDeserializer`] sits between a [`Source`] of byte chunks and a parse closure that
//! reads from a [`bytecraft_codec::Deserializer`]. Bytes are only pulled from the source when
//! the buffered data is not enough: either because the caller declared a minimum length up
//! front or because the closure reported that it ran out of data ([`Interrupt::NeedMoreBytes`]).
//! In the latter case the cursor is rewound and the closure retried once more data arrived.
//!
//! # Example
//!
//! ```
//! use bytecraft_stream::{mocks, StreamDeserializer};
//! use futures::executor::block_on;
//!
//! let source = mocks::chunks([vec![0x03], vec![b'f', b'o', b'o', 0x02, 0x03]]);
//! let mut stream = StreamDeserializer::new(source);
//! block_on(async {
//!     let text = stream
//!         .deserialize(|d, _| {
//!             let len = d.u8()? as usize;
//!             Ok(d.utf8(len)?)
//!         }, 0)
//!         .await
//!         .unwrap();
//!     assert_eq!(text, "foo");
//!     assert_eq!(stream.deserialize(|d, _| Ok(d.u16()?), 2).await.unwrap(), 0x0203);
//!     assert!(stream.ended().await.unwrap());
//! });
//! ```

use bytecraft_codec::Error as CodecError;
use thiserror::Error;

pub mod deserializer;
pub mod mocks;
pub mod source;

pub use deserializer::{Interrupt, Requirement, StreamDeserializer};
pub use source::{ChunkStream, Reader, Source};

/// Errors that can occur when deserializing from a stream.
#[derive(Error, Debug)]
pub enum Error {
    #[error("end of stream: {required} bytes required, {available} available")]
    EndOfStream { required: usize, available: usize },
    #[error("required too large: {0} > {1}")]
    RequiredTooLarge(usize, usize),
    #[error("source canceled: {0}")]
    Canceled(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unable to decode: {0}")]
    Codec(CodecError),
}

impl From<CodecError> for Error {
    fn from(value: CodecError) -> Self {
        Self::Codec(value)
    }
}

/// Configuration for a [`StreamDeserializer`].
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum number of bytes a single call may require to be buffered.
    ///
    /// Bounds the memory a peer can make us hold by announcing a large length.
    pub max_required: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_required: usize::MAX,
        }
    }
}
