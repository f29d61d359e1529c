//! Crate-wide error type.

pub mod context;

use thiserror::Error;

/// Result type for scheduler operations.
pub type SchedResult<T> = Result<T, SchedError>;

/// Top-level error type. Module-local error types (the DIS codec's error
/// enum, `schd_error` reason codes) convert into this at module boundaries;
/// within the cycle engine itself, placement/simulation failures are
/// accumulated as data (`schd_error` lists), not propagated as `Err`.
#[derive(Error, Debug)]
pub enum SchedError {
    /// Wire framing violated the `PKTV1` contract (bad magic, negative
    /// length, short read). Fatal to the connection per §4.A/§7.
    #[error("framing error: {0}")]
    Framing(String),

    /// Authentication or encryption handshake failed.
    #[error("auth error: {0}")]
    Auth(String),

    /// Typed-value codec error, carrying the DIS-style reason code.
    #[error("codec error: {0:?}")]
    Codec(crate::codec::DisError),

    /// The server connection's circuit breaker rejected the call.
    #[error("server unreachable: {0}")]
    ServerUnreachable(String),

    /// A batch-status record failed validation and was ignored (not fatal
    /// to the cycle, but surfaced so the caller can log it per §4.C).
    #[error("ignored record: {0}")]
    IgnoredRecord(String),

    /// Configuration could not be resolved (bad token, missing file).
    #[error("config error: {0}")]
    Config(String),

    /// Generic invariant violation / internal bug surfaced as a typed error
    /// rather than a panic.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for SchedError {
    fn from(err: std::io::Error) -> Self {
        SchedError::Framing(err.to_string())
    }
}

impl From<crate::codec::DisError> for SchedError {
    fn from(err: crate::codec::DisError) -> Self {
        SchedError::Codec(err)
    }
}
