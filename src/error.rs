//! Error taxonomy shared by every component in this crate.
//!
//! The source tool reports a 32-bit status code on every call; here that
//! collapses to a typed [`ErrorKind`] so that callers can distinguish
//! `TimedOut` / `Closed` / `Fatal` without string matching. Queues and the
//! block pool depend on this distinction to choose a retry policy.

use std::fmt;
use std::io;

pub type Result<T> = std::result::Result<T, Error>;

/// The kind of failure that occurred.
#[derive(Debug)]
pub enum ErrorKind {
    /// A required argument was null, empty, or otherwise nonsensical.
    InvalidArgument(String),
    /// A bounded queue's push/pop elapsed its timeout without progress.
    TimedOut,
    /// Push into, or pop from, a sealed queue.
    Closed,
    /// A producer observed that the writer side has poisoned the pool.
    PipelineClosed,
    /// The sink rejected bytes (disk full, broken pipe, ...).
    SpaceExhausted,
    /// A 2na payload exceeded 65535 bases.
    OverLength,
    /// A lookup was asked for a key beyond the store's maximum key.
    NoSuchKey,
    /// The 2na search compiler rejected an expression.
    InvalidQuery(String),
    /// The process-wide cancellation flag was observed non-zero.
    Cancelled,
    /// Any unexpected system-call failure.
    Io(io::Error),
    /// Anything else that doesn't fit the taxonomy above.
    Fatal(String),
}

/// An error produced by this crate, carrying an [`ErrorKind`] plus whatever
/// component-specific context was available at the point of failure.
#[derive(Debug)]
pub struct Error {
    kind: Box<ErrorKind>,
    context: Option<String>,
}

impl Error {
    #[inline]
    pub fn new(kind: ErrorKind) -> Self {
        Error {
            kind: Box::new(kind),
            context: None,
        }
    }

    /// Attaches a human-readable location (component + failing call) to
    /// the error, the way the source tool's `ErrMsg()` calls do.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    #[inline]
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    #[inline]
    pub fn into_kind(self) -> ErrorKind {
        *self.kind
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::new(ErrorKind::InvalidArgument(msg.into()))
    }

    pub fn timed_out() -> Self {
        Error::new(ErrorKind::TimedOut)
    }

    pub fn closed() -> Self {
        Error::new(ErrorKind::Closed)
    }

    pub fn pipeline_closed() -> Self {
        Error::new(ErrorKind::PipelineClosed)
    }

    pub fn space_exhausted() -> Self {
        Error::new(ErrorKind::SpaceExhausted)
    }

    pub fn over_length() -> Self {
        Error::new(ErrorKind::OverLength)
    }

    pub fn no_such_key() -> Self {
        Error::new(ErrorKind::NoSuchKey)
    }

    pub fn invalid_query(msg: impl Into<String>) -> Self {
        Error::new(ErrorKind::InvalidQuery(msg.into()))
    }

    pub fn cancelled() -> Self {
        Error::new(ErrorKind::Cancelled)
    }

    pub fn fatal(msg: impl Into<String>) -> Self {
        Error::new(ErrorKind::Fatal(msg.into()))
    }

    /// True for the outcome a retry loop recovers from locally (`spec.md` §7).
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::TimedOut)
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Error {
        Error::new(ErrorKind::Io(e))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind() {
            ErrorKind::InvalidArgument(m) => write!(f, "invalid argument: {}", m)?,
            ErrorKind::TimedOut => write!(f, "timed out")?,
            ErrorKind::Closed => write!(f, "queue closed")?,
            ErrorKind::PipelineClosed => write!(f, "pipeline closed (writer poisoned the pool)")?,
            ErrorKind::SpaceExhausted => write!(f, "sink rejected bytes (space exhausted)")?,
            ErrorKind::OverLength => write!(f, "payload exceeds 65535 bases")?,
            ErrorKind::NoSuchKey => write!(f, "key beyond max_key")?,
            ErrorKind::InvalidQuery(m) => write!(f, "invalid query: {}", m)?,
            ErrorKind::Cancelled => write!(f, "cancelled")?,
            ErrorKind::Io(e) => write!(f, "io error: {}", e)?,
            ErrorKind::Fatal(m) => write!(f, "fatal: {}", m)?,
        }
        if let Some(ctx) = &self.context {
            write!(f, " ({})", ctx)?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self.kind() {
            ErrorKind::Io(e) => Some(e),
            _ => None,
        }
    }
}
