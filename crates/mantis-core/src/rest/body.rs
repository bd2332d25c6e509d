//! Request bodies that can be replayed across attempts.
//!
//! A [`BodySource`] names where the bytes come from; building a request
//! classifies it into a [`Body`] with a known-or-unknown length and, for every
//! accepted source, a replay capability that produces a fresh reader with
//! byte-identical content.

use serde::Serialize;
use std::fmt;
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::sync::{Arc, Mutex, PoisonError};

/// Reader installed as a request body.
pub type BodyReader = Box<dyn Read + Send>;

/// Produces a fresh reader over the same content.
pub type ReplayFn = Box<dyn Fn() -> io::Result<BodyReader> + Send + Sync>;

/// Readable and rewindable stream.
pub trait SeekRead: Read + Seek + Send {}

impl<T: Read + Seek + Send> SeekRead for T {}

/// A value that serializes itself into body bytes.
pub trait EncodeBody {
    fn encode(&self) -> io::Result<Vec<u8>>;
}

/// Serializes the wrapped value as JSON.
pub struct Json<T>(pub T);

impl<T: Serialize> EncodeBody for Json<T> {
    fn encode(&self) -> io::Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.0)?)
    }
}

/// Where a request body comes from.
pub enum BodySource {
    /// No body.
    Empty,
    /// Fixed bytes.
    Bytes(Vec<u8>),
    /// Fixed text, sent as UTF-8.
    Text(String),
    /// Fixed characters, sent as UTF-8.
    Chars(Vec<char>),
    /// A value encoded once when the request is built.
    Encoded(Box<dyn EncodeBody>),
    /// A stream that can rewind; used directly and sought back to the start on replay.
    Seekable(Box<dyn SeekRead>),
    /// A factory of fresh readers; called once for the first body and again on every replay.
    Factory(ReplayFn),
    /// A one-shot stream, buffered fully in memory when the request is built.
    /// Only meant for small bodies.
    Stream(BodyReader),
    /// A one-shot stream that must not be buffered (pipe, socket). Never replayable.
    Unbounded(BodyReader),
}

impl BodySource {
    pub fn encoded(value: impl EncodeBody + 'static) -> Self {
        BodySource::Encoded(Box::new(value))
    }

    pub fn json<T: Serialize + 'static>(value: T) -> Self {
        BodySource::Encoded(Box::new(Json(value)))
    }

    pub fn seekable(stream: impl Read + Seek + Send + 'static) -> Self {
        BodySource::Seekable(Box::new(stream))
    }

    pub fn factory<F>(f: F) -> Self
    where
        F: Fn() -> io::Result<BodyReader> + Send + Sync + 'static,
    {
        BodySource::Factory(Box::new(f))
    }

    pub fn stream(reader: impl Read + Send + 'static) -> Self {
        BodySource::Stream(Box::new(reader))
    }

    pub fn unbounded(reader: impl Read + Send + 'static) -> Self {
        BodySource::Unbounded(Box::new(reader))
    }
}

impl From<Vec<u8>> for BodySource {
    fn from(v: Vec<u8>) -> Self {
        BodySource::Bytes(v)
    }
}

impl From<&[u8]> for BodySource {
    fn from(v: &[u8]) -> Self {
        BodySource::Bytes(v.to_vec())
    }
}

impl From<String> for BodySource {
    fn from(s: String) -> Self {
        BodySource::Text(s)
    }
}

impl From<&str> for BodySource {
    fn from(s: &str) -> Self {
        BodySource::Text(s.to_string())
    }
}

impl From<Vec<char>> for BodySource {
    fn from(c: Vec<char>) -> Self {
        BodySource::Chars(c)
    }
}

impl<T: Into<BodySource>> From<Option<T>> for BodySource {
    fn from(v: Option<T>) -> Self {
        v.map_or(BodySource::Empty, Into::into)
    }
}

impl fmt::Debug for BodySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            BodySource::Empty => "Empty",
            BodySource::Bytes(_) => "Bytes",
            BodySource::Text(_) => "Text",
            BodySource::Chars(_) => "Chars",
            BodySource::Encoded(_) => "Encoded",
            BodySource::Seekable(_) => "Seekable",
            BodySource::Factory(_) => "Factory",
            BodySource::Stream(_) => "Stream",
            BodySource::Unbounded(_) => "Unbounded",
        };
        f.write_str(kind)
    }
}

/// Failure to turn a [`BodySource`] into a [`Body`].
#[derive(Debug, thiserror::Error)]
pub enum BodyError {
    #[error("body is not replayable")]
    NotReplayable,
    #[error("could not encode body: {0}")]
    Encode(#[source] io::Error),
    #[error("could not prepare body: {0}")]
    Io(#[source] io::Error),
}

/// A request body: the current reader, its length if known, and how to
/// produce it again.
pub struct Body {
    reader: Option<BodyReader>,
    replay: Option<ReplayFn>,
    len: Option<u64>,
    consumed: bool,
}

impl Body {
    /// No body at all.
    pub fn empty() -> Self {
        Self {
            reader: None,
            replay: None,
            len: Some(0),
            consumed: false,
        }
    }

    /// A one-shot body without replay capability. Requesters that retry
    /// refuse it unless `len` is `Some(0)`.
    pub fn one_shot(reader: impl Read + Send + 'static, len: Option<u64>) -> Self {
        Self {
            reader: Some(Box::new(reader)),
            replay: None,
            len,
            consumed: false,
        }
    }

    /// A body with an explicit replay capability.
    pub fn with_replay(reader: BodyReader, len: Option<u64>, replay: ReplayFn) -> Self {
        Self {
            reader: Some(reader),
            replay: Some(replay),
            len,
            consumed: false,
        }
    }

    /// Classifies `source` into a replayable body.
    pub fn from_source(source: BodySource) -> Result<Self, BodyError> {
        match source {
            BodySource::Empty => Ok(Self::empty()),
            BodySource::Bytes(b) => Ok(Self::fixed(b)),
            BodySource::Text(s) => Ok(Self::fixed(s.into_bytes())),
            BodySource::Chars(c) => Ok(Self::fixed(c.into_iter().collect::<String>().into_bytes())),
            BodySource::Encoded(e) => e.encode().map(Self::fixed).map_err(BodyError::Encode),
            BodySource::Seekable(s) => Self::seekable(s).map_err(BodyError::Io),
            BodySource::Factory(f) => {
                let first = f().map_err(BodyError::Io)?;
                Ok(Self::with_replay(first, None, f))
            }
            BodySource::Stream(mut r) => {
                let mut buf = Vec::new();
                r.read_to_end(&mut buf).map_err(BodyError::Io)?;
                Ok(Self::fixed(buf))
            }
            BodySource::Unbounded(_) => Err(BodyError::NotReplayable),
        }
    }

    /// In-memory bytes; every replay re-wraps the same shared buffer.
    fn fixed(bytes: Vec<u8>) -> Self {
        if bytes.is_empty() {
            return Self::empty();
        }
        let len = bytes.len() as u64;
        let shared: Arc<[u8]> = bytes.into();
        let first = Box::new(Cursor::new(Arc::clone(&shared)));
        Self::with_replay(
            first,
            Some(len),
            Box::new(move || Ok(Box::new(Cursor::new(Arc::clone(&shared))) as BodyReader)),
        )
    }

    /// A rewindable stream, read from its start; replay seeks back to zero.
    fn seekable(mut stream: Box<dyn SeekRead>) -> io::Result<Self> {
        let end = stream.seek(SeekFrom::End(0))?;
        stream.seek(SeekFrom::Start(0))?;
        let shared = Arc::new(Mutex::new(stream));
        let first = Box::new(SharedStream(Arc::clone(&shared)));
        Ok(Self::with_replay(
            first,
            Some(end),
            Box::new(move || {
                shared
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .seek(SeekFrom::Start(0))?;
                Ok(Box::new(SharedStream(Arc::clone(&shared))) as BodyReader)
            }),
        ))
    }

    /// Content length, if known. `Some(0)` for an empty body.
    pub fn content_length(&self) -> Option<u64> {
        if self.reader.is_none() {
            return Some(0);
        }
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.reader.is_none() || self.len == Some(0)
    }

    /// True when the body can be sent again: it has a replay capability or
    /// there is nothing to send.
    pub fn is_replayable(&self) -> bool {
        self.replay.is_some() || self.is_empty()
    }

    /// True once the current reader has been read from.
    pub fn is_consumed(&self) -> bool {
        self.consumed
    }

    /// Drops the current reader and installs a fresh one from the replay
    /// capability. A failure to produce the fresh reader is deferred: the
    /// body then fails every read with that error.
    pub fn replay(&mut self) {
        let Some(replay) = &self.replay else {
            return;
        };
        if self.reader.take().is_none() {
            return;
        }
        self.consumed = false;
        self.reader = Some(match replay() {
            Ok(reader) => reader,
            Err(e) => {
                tracing::debug!("body replay failed, deferring error to next read: {}", e);
                Box::new(FailingReader::new(e))
            }
        });
    }
}

impl Default for Body {
    fn default() -> Self {
        Self::empty()
    }
}

impl Read for Body {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.reader {
            Some(r) => {
                self.consumed = true;
                r.read(buf)
            }
            None => Ok(0),
        }
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Body")
            .field("len", &self.content_length())
            .field("replayable", &self.replay.is_some())
            .finish()
    }
}

/// Reader over a stream shared with the body's replay capability.
struct SharedStream(Arc<Mutex<Box<dyn SeekRead>>>);

impl Read for SharedStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).read(buf)
    }
}

/// Fails every read with the same error.
struct FailingReader {
    kind: io::ErrorKind,
    message: String,
}

impl FailingReader {
    fn new(err: io::Error) -> Self {
        // `Interrupted` would make `read_to_end` spin forever.
        let kind = match err.kind() {
            io::ErrorKind::Interrupted => io::ErrorKind::Other,
            k => k,
        };
        Self {
            kind,
            message: err.to_string(),
        }
    }
}

impl Read for FailingReader {
    fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(self.kind, self.message.clone()))
    }
}
