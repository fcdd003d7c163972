use std::fmt;
use std::time::Duration;

/// Normalized failure classes for store operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    /// The store answered with a non-success HTTP status.
    Status,
    /// A throttled request that was still throttled after the retry ceiling.
    Throttled,
    /// DNS, TLS, socket or timeout failure before a status was received.
    Transport,
    /// The response body could not be decoded into the expected shape.
    Decode,
}

impl StoreErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Throttled => "throttled",
            Self::Transport => "transport",
            Self::Decode => "decode",
        }
    }
}

/// Typed store failure with human-readable details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    pub kind: StoreErrorKind,
    pub message: String,
    pub status: Option<u16>,
    /// Server-suggested delay from a `Retry-After` header.
    pub retry_after: Option<Duration>,
    /// Attempts spent before this error became terminal. Zero until the retry layer sets it.
    pub attempts: u32,
}

impl StoreError {
    pub fn new(kind: StoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            retry_after: None,
            attempts: 0,
        }
    }

    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Status, message).with_status(status)
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_retry_after(mut self, retry_after: Option<Duration>) -> Self {
        self.retry_after = retry_after;
        self
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    /// True for throttling that outlasted the retry policy. A later run may succeed.
    pub fn is_transient(&self) -> bool {
        self.kind == StoreErrorKind::Throttled
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error", self.kind.as_str())?;
        if let Some(status) = self.status {
            write!(f, " (HTTP {status})")?;
        }
        if self.attempts > 1 {
            write!(f, " after {} attempts", self.attempts)?;
        }
        write!(f, ": {}", self.message)
    }
}

impl std::error::Error for StoreError {}
