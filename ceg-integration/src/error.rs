use thiserror::Error;

/// Transport-level errors shared across every protocol implementation in
/// this crate. Concerns specific to one integration (eg/ extraction-model
/// response shapes) get their own error enum in the owning crate and
/// `#[from]` this one at the boundary.
#[derive(Debug, Error)]
pub enum SocketError {
    #[error("error subscribing / fetching from {entity}: {error}")]
    Subscribe { entity: String, error: String },

    #[error("http request build error: {0}")]
    HttpBuild(#[from] reqwest::Error),

    #[error("failed to deserialise binary response: {error}, payload: {}", String::from_utf8_lossy(payload))]
    DeserialiseBinary {
        error: serde_json::Error,
        payload: Vec<u8>,
    },

    #[error("sink/stream terminated unexpectedly: {0}")]
    Terminated(String),
}

/// Marker implemented by error types whose occurrence should never trigger
/// a retry (eg/ dropped receiver on an internal channel).
pub trait Unrecoverable {
    fn is_unrecoverable(&self) -> bool;
}

impl<T> Unrecoverable for tokio::sync::mpsc::error::SendError<T> {
    fn is_unrecoverable(&self) -> bool {
        true
    }
}
