//! Retry a parse closure over a growing buffer until enough bytes have arrived.

use crate::{Config, Error, Source};
use bytecraft_codec::{Deserializer, Error as CodecError};
use bytes::Bytes;
use tracing::{debug, trace, warn};

/// Reason a parse closure stopped before producing a value.
#[derive(Debug)]
pub enum Interrupt {
    /// The buffer ran out. At least this many more bytes are needed to make progress.
    ///
    /// Zero is treated as one: a retry always waits for at least one more byte.
    NeedMoreBytes(usize),
    /// The bytes are malformed. More data would not help.
    Fatal(CodecError),
}

impl From<CodecError> for Interrupt {
    fn from(value: CodecError) -> Self {
        match value {
            CodecError::EndOfData { needed, available } => {
                Self::NeedMoreBytes(needed.saturating_sub(available).max(1))
            }
            other => Self::Fatal(other),
        }
    }
}

/// Minimum number of buffered bytes required before the next parse attempt.
///
/// Handed to the parse closure so it can raise the bar once it has learned how much it needs
/// (for example after reading a length prefix).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Requirement(usize);

impl Requirement {
    /// Sets the number of bytes required before the next attempt.
    pub fn set(&mut self, len: usize) {
        self.0 = len;
    }

    /// Returns the number of bytes required before the next attempt.
    pub fn get(&self) -> usize {
        self.0
    }
}

/// Deserializes values from a [`Source`], pulling chunks only when the buffer runs short.
pub struct StreamDeserializer<S: Source> {
    source: S,
    cfg: Config,

    deserializer: Option<Deserializer>,
    pending: Vec<Bytes>,
    pending_len: usize,
    ended: bool,
}

impl<S: Source> StreamDeserializer<S> {
    /// Takes exclusive ownership of `source` until [`Self::release_lock`] is called.
    pub fn new(source: S) -> Self {
        Self::with_config(source, Config::default())
    }

    /// Like [`Self::new`] with an explicit [`Config`].
    pub fn with_config(source: S, cfg: Config) -> Self {
        Self {
            source,
            cfg,
            deserializer: None,
            pending: Vec::new(),
            pending_len: 0,
            ended: false,
        }
    }

    /// Number of bytes read from the source and not yet consumed by a parse.
    pub fn buffered(&self) -> usize {
        self.deserializer
            .as_ref()
            .map_or(0, Deserializer::bytes_available)
            + self.pending_len
    }

    /// Runs `parse` once at least `required` bytes are buffered and returns its value.
    ///
    /// If `parse` fails with [`Interrupt::NeedMoreBytes`], the cursor is rewound to where the
    /// attempt started, more chunks are pulled and `parse` is called again. The next attempt
    /// waits for whichever is larger: the [`Requirement`] (which `parse` may raise) or the
    /// buffered bytes plus the reported shortfall. An [`Interrupt::Fatal`] also rewinds the
    /// cursor and is returned as [`Error::Codec`] without retrying.
    ///
    /// Fails with [`Error::EndOfStream`] once the source has ended and the buffered bytes are
    /// not enough. Dropping the returned future before it completes loses no data: chunks
    /// already read are kept for the next call.
    pub async fn deserialize<T, F>(&mut self, mut parse: F, required: usize) -> Result<T, Error>
    where
        F: FnMut(&mut Deserializer, &mut Requirement) -> Result<T, Interrupt>,
    {
        self.flush();
        let mut requirement = Requirement(required);
        loop {
            let required = requirement.get();
            if required > self.cfg.max_required {
                return Err(Error::RequiredTooLarge(required, self.cfg.max_required));
            }
            if self.buffered() < required {
                self.fill(required).await?;
            }

            let mut empty = Deserializer::default();
            let deserializer = self.deserializer.as_mut().unwrap_or(&mut empty);
            let checkpoint = deserializer.checkpoint();
            let interrupt = match parse(deserializer, &mut requirement) {
                Ok(value) => return Ok(value),
                Err(interrupt) => interrupt,
            };
            deserializer.restore(checkpoint)?;

            let additional = match interrupt {
                Interrupt::NeedMoreBytes(additional) => additional,
                Interrupt::Fatal(err) => return Err(err.into()),
            };
            let buffered = deserializer.bytes_available();
            let target = requirement
                .get()
                .max(buffered.saturating_add(additional.max(1)));
            if self.ended {
                return Err(Error::EndOfStream {
                    required: target,
                    available: buffered,
                });
            }
            debug!(buffered, additional, required = target, "retrying parse");
            requirement.set(target);
        }
    }

    /// Returns true once the source has ended and every buffered byte has been consumed.
    ///
    /// If nothing is buffered and the source has not yet reported its end, a single chunk is
    /// read to find out.
    pub async fn ended(&mut self) -> Result<bool, Error> {
        self.flush();
        if self.buffered() > 0 {
            return Ok(false);
        }
        if !self.ended {
            let chunk = self.source.read().await?;
            self.accept(chunk);
            self.flush();
        }
        Ok(self.ended && self.buffered() == 0)
    }

    /// Cancels the underlying source. Pending and future pulls fail with [`Error::Canceled`].
    pub fn cancel(&mut self, reason: &str) {
        warn!(reason, buffered = self.buffered(), "canceling source");
        self.source.cancel(reason);
    }

    /// Gives the source back, along with the unconsumed buffer (if any bytes were ever read).
    pub fn release_lock(mut self) -> (S, Option<Deserializer>) {
        self.flush();
        (self.source, self.deserializer)
    }

    /// Pulls chunks until `required` bytes are buffered or the source ends.
    async fn fill(&mut self, required: usize) -> Result<(), Error> {
        while !self.ended && self.buffered() < required {
            let chunk = match self.source.read().await {
                Ok(chunk) => chunk,
                Err(err) => {
                    self.flush();
                    return Err(err);
                }
            };
            self.accept(chunk);
        }
        self.flush();

        let available = self.buffered();
        if available < required {
            return Err(Error::EndOfStream {
                required,
                available,
            });
        }
        Ok(())
    }

    fn accept(&mut self, chunk: Option<Bytes>) {
        let Some(chunk) = chunk else {
            debug!(buffered = self.buffered(), "source ended");
            self.ended = true;
            return;
        };
        trace!(
            received = chunk.len(),
            buffered = self.buffered(),
            "pulled chunk"
        );
        if !chunk.is_empty() {
            self.pending_len += chunk.len();
            self.pending.push(chunk);
        }
    }

    /// Moves pending chunks into the deserializer in a single batch.
    fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        self.deserializer
            .get_or_insert_with(Deserializer::default)
            .push(&self.pending);
        self.pending.clear();
        self.pending_len = 0;
    }
}
