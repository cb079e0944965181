//! Error types for request-head acquisition and parsing.

use std::io;

use thiserror::Error;

/// Errors surfaced before a request context exists.
///
/// These cover the wire-level head only; once a head has parsed, failures
/// are either context-construction errors (mapped to `401`/`500`) or
/// handler business.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Request head grew past the permitted size.
    #[error("request head of {size} bytes exceeds {max} byte limit")]
    HeadTooLarge {
        /// Bytes accumulated so far.
        size: usize,
        /// Permitted maximum.
        max: usize,
    },
    /// Connection closed before the head terminator arrived.
    #[error("connection closed mid request head")]
    TruncatedHead,
    /// Head bytes did not form a valid request line and header block.
    #[error("malformed request head: {message}")]
    MalformedHead {
        /// What failed to parse.
        message: String,
    },
    /// Protocol version outside HTTP/1.x.
    #[error("unsupported protocol version {version}")]
    UnsupportedVersion {
        /// The version token received.
        version: String,
    },
    /// IO failure while reading the head.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl DispatchError {
    /// Status code answered for this error before closing the connection.
    pub fn status(&self) -> u16 {
        match self {
            Self::HeadTooLarge { .. } => 431,
            Self::UnsupportedVersion { .. } => 505,
            Self::TruncatedHead | Self::MalformedHead { .. } | Self::Io(_) => 400,
        }
    }

    /// Creates a malformed-head error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedHead {
            message: message.into(),
        }
    }
}
