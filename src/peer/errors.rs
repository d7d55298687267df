// src/peer/errors.rs

use thiserror::Error;

/// Failures a caller of the peer can observe. Malformed inbound messages and
/// orphan responses never show up here: the dispatcher logs and drops those
/// without surfacing anything.
#[derive(Debug, Error)]
pub enum PeerError {
    /// The remote peer answered with an error Response. The display text is
    /// the remote reason; the code travels alongside as a structured field.
    #[error("{reason}")]
    Remote { code: Option<i64>, reason: String },

    #[error("peer closed")]
    PeerClosed,

    /// A request id was registered twice. The original map silently
    /// overwrote the first entry, orphaning its caller forever; we refuse
    /// the second registration instead.
    #[error("request id {0} is already awaiting a response")]
    DuplicateRequestId(u64),

    #[error("request method must be a non-empty string")]
    InvalidMethod,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("response channel closed")]
    ResponseChannelClosed,
}

impl PeerError {
    /// Machine-readable code of a remote error, when the remote sent one.
    pub fn remote_code(&self) -> Option<i64> {
        match self {
            PeerError::Remote { code, .. } => *code,
            _ => None,
        }
    }
}
