//! Error taxonomy for hearthq.
//!
//! Every error carries a stable machine-readable token that the HTTP
//! layer places in the `X-Error` response header. Tokens are part of
//! the wire contract and must never change once released.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("topic does not exist")]
    TopicDoesNotExist,

    #[error("topic already exists")]
    TopicAlreadyExists,

    #[error("invalid topic")]
    InvalidTopic,

    #[error("invalid header sizes")]
    InvalidHeaderSizes,

    #[error("invalid message id")]
    InvalidMessageId,

    #[error("invalid message limit")]
    InvalidMessageLimit,

    #[error("invalid body: missing")]
    InvalidBodyMissing,

    #[error("invalid body: json")]
    InvalidBodyJson,

    #[error("no content")]
    NoContent,

    #[error("short write")]
    ShortWrite,

    #[error("integrity error: {0}")]
    Integrity(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// The stable token reported in the `X-Error` header.
    ///
    /// Integrity failures are internal to the broker and surface on
    /// the wire as plain `io`; the variant stays distinct so the logs
    /// can tell a corrupted segment from a transient I/O fault.
    pub fn token(&self) -> &'static str {
        match self {
            Error::TopicDoesNotExist => "topic-does-not-exist",
            Error::TopicAlreadyExists => "topic-already-exists",
            Error::InvalidTopic => "invalid-topic",
            Error::InvalidHeaderSizes => "invalid-header-sizes",
            Error::InvalidMessageId => "invalid-message-id",
            Error::InvalidMessageLimit => "invalid-message-limit",
            Error::InvalidBodyMissing => "invalid-body-missing",
            Error::InvalidBodyJson => "invalid-body-json",
            Error::NoContent => "no-content",
            Error::ShortWrite => "short-write",
            Error::Integrity(_) | Error::Io(_) => "io",
        }
    }

    /// True for errors caused by the request rather than the broker.
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            Error::ShortWrite | Error::Integrity(_) | Error::Io(_)
        )
    }
}
