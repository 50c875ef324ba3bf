//! Asynchronous sources of byte chunks.

use crate::Error;
use bytes::{Bytes, BytesMut};
use futures::{
    io::{AsyncRead, AsyncReadExt as _},
    Stream, StreamExt as _,
};
use std::future::Future;

/// Pull-based source of byte chunks.
///
/// A source is read by one consumer at a time: [`crate::StreamDeserializer`] takes it by value
/// and hands it back through [`crate::StreamDeserializer::release_lock`].
pub trait Source: Send {
    /// Reads the next chunk, or `None` once the source has ended.
    ///
    /// Chunks may be empty. Reading from a canceled source fails with [`Error::Canceled`].
    fn read(&mut self) -> impl Future<Output = Result<Option<Bytes>, Error>> + Send;

    /// Cancels the source. Every subsequent read fails.
    fn cancel(&mut self, reason: &str);
}

/// [`Source`] over a [`Stream`] of chunks.
pub struct ChunkStream<St> {
    stream: Option<St>,
    canceled: String,
}

impl<St> ChunkStream<St> {
    /// Wraps `stream`.
    pub fn new(stream: St) -> Self {
        Self {
            stream: Some(stream),
            canceled: String::new(),
        }
    }
}

impl<St, B> Source for ChunkStream<St>
where
    St: Stream<Item = B> + Unpin + Send,
    B: Into<Bytes>,
{
    async fn read(&mut self) -> Result<Option<Bytes>, Error> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| Error::Canceled(self.canceled.clone()))?;
        Ok(stream.next().await.map(Into::into))
    }

    fn cancel(&mut self, reason: &str) {
        self.stream = None;
        self.canceled = reason.to_owned();
    }
}

/// Default number of bytes requested from an [`AsyncRead`] per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

/// [`Source`] over an [`AsyncRead`].
///
/// Each read requests up to `chunk_size` bytes. A read of zero bytes ends the source.
pub struct Reader<R> {
    reader: Option<R>,
    chunk_size: usize,
    canceled: String,
}

impl<R> Reader<R> {
    /// Wraps `reader` with the default chunk size.
    pub fn new(reader: R) -> Self {
        Self::with_chunk_size(reader, DEFAULT_CHUNK_SIZE)
    }

    /// Wraps `reader`, requesting up to `chunk_size` bytes per read.
    pub fn with_chunk_size(reader: R, chunk_size: usize) -> Self {
        Self {
            reader: Some(reader),
            chunk_size: chunk_size.max(1),
            canceled: String::new(),
        }
    }
}

impl<R: AsyncRead + Unpin + Send> Source for Reader<R> {
    async fn read(&mut self) -> Result<Option<Bytes>, Error> {
        let reader = self
            .reader
            .as_mut()
            .ok_or_else(|| Error::Canceled(self.canceled.clone()))?;
        let mut buf = BytesMut::zeroed(self.chunk_size);
        let len = reader.read(&mut buf).await?;
        if len == 0 {
            return Ok(None);
        }
        buf.truncate(len);
        Ok(Some(buf.freeze()))
    }

    fn cancel(&mut self, reason: &str) {
        self.reader = None;
        self.canceled = reason.to_owned();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytecraft_macros::test_async;
    use futures::{io::Cursor, stream};

    #[test_async]
    async fn test_chunk_stream() {
        let mut source = ChunkStream::new(stream::iter(vec![vec![1u8, 2], vec![], vec![3]]));
        assert_eq!(source.read().await.unwrap(), Some(Bytes::from_static(&[1, 2])));
        assert_eq!(source.read().await.unwrap(), Some(Bytes::new()));
        assert_eq!(source.read().await.unwrap(), Some(Bytes::from_static(&[3])));
        assert_eq!(source.read().await.unwrap(), None);
    }

    #[test_async]
    async fn test_chunk_stream_cancel() {
        let mut source = ChunkStream::new(stream::iter(vec![Bytes::from_static(&[1])]));
        source.cancel("done");
        assert!(matches!(source.read().await, Err(Error::Canceled(reason)) if reason == "done"));
    }

    #[test_async]
    async fn test_reader() {
        let mut source = Reader::with_chunk_size(Cursor::new(vec![1u8, 2, 3, 4, 5]), 2);
        assert_eq!(source.read().await.unwrap(), Some(Bytes::from_static(&[1, 2])));
        assert_eq!(source.read().await.unwrap(), Some(Bytes::from_static(&[3, 4])));
        assert_eq!(source.read().await.unwrap(), Some(Bytes::from_static(&[5])));
        assert_eq!(source.read().await.unwrap(), None);
    }

    #[test_async]
    async fn test_reader_cancel() {
        let mut source = Reader::new(Cursor::new(vec![1u8]));
        source.cancel("stop");
        assert!(matches!(source.read().await, Err(Error::Canceled(reason)) if reason == "stop"));
    }
}
