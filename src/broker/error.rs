use thiserror::Error;

/// Errors surfaced by core broker operations. Everything else
/// (creation conflicts, publish-to-missing-stream, unknown ack ids) is
/// a plain boolean or an infallible mutation.
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("no such stream: {0}")]
    NoSuchStream(String),
    #[error("no such group: {0}")]
    NoSuchGroup(String),
}
