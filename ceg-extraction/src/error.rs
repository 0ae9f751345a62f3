use thiserror::Error;

/// Failure surface for the Extraction Client (§4.C, §7). `Transient` is
/// retried by the caller with backoff; `Fatal` aborts the batch and disables
/// remote extraction for the run.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("transient extraction failure: {0}")]
    Transient(String),

    #[error("fatal extraction failure: {0}")]
    Fatal(String),
}

impl From<ceg_integration::SocketError> for ExtractionError {
    fn from(error: ceg_integration::SocketError) -> Self {
        ExtractionError::Transient(error.to_string())
    }
}
