//! In-memory sources for tests and benchmarks.

use crate::{Error, Source};
use bytes::Bytes;
use futures::{channel::mpsc, StreamExt as _};

enum Message {
    Chunk(Bytes),
    Abort(String),
}

/// Creates a source fed by the returned [`Sender`].
///
/// Dropping the sender ends the source.
pub fn channel() -> (Sender, ChannelSource) {
    let (tx, rx) = mpsc::unbounded();
    (
        Sender { tx },
        ChannelSource {
            rx,
            canceled: None,
            reads: 0,
        },
    )
}

/// Creates a source that yields `chunks` in order and then ends.
pub fn chunks<I, B>(chunks: I) -> ChannelSource
where
    I: IntoIterator<Item = B>,
    B: Into<Bytes>,
{
    let (sender, source) = channel();
    for chunk in chunks {
        sender.send(chunk);
    }
    source
}

/// Producing half of [`channel`].
pub struct Sender {
    tx: mpsc::UnboundedSender<Message>,
}

impl Sender {
    /// Queues `chunk`. Returns false if the source was dropped or canceled.
    pub fn send(&self, chunk: impl Into<Bytes>) -> bool {
        self.tx.unbounded_send(Message::Chunk(chunk.into())).is_ok()
    }

    /// Fails the source with [`Error::Canceled`] once queued chunks have been read.
    pub fn abort(self, reason: &str) {
        let _ = self.tx.unbounded_send(Message::Abort(reason.to_owned()));
    }
}

/// Consuming half of [`channel`].
pub struct ChannelSource {
    rx: mpsc::UnboundedReceiver<Message>,
    canceled: Option<String>,
    reads: usize,
}

impl ChannelSource {
    /// Number of reads issued so far.
    pub fn reads(&self) -> usize {
        self.reads
    }
}

impl Source for ChannelSource {
    async fn read(&mut self) -> Result<Option<Bytes>, Error> {
        if let Some(reason) = &self.canceled {
            return Err(Error::Canceled(reason.clone()));
        }
        self.reads += 1;
        match self.rx.next().await {
            Some(Message::Chunk(chunk)) => Ok(Some(chunk)),
            Some(Message::Abort(reason)) => {
                self.canceled = Some(reason.clone());
                Err(Error::Canceled(reason))
            }
            None => Ok(None),
        }
    }

    fn cancel(&mut self, reason: &str) {
        self.canceled = Some(reason.to_owned());
        self.rx.close();
    }
}
