use thiserror::Error;

/// Ingestion failure surface (§7). Transient/malformed/fatal mirror the
/// policy table exactly: transient retries, malformed records are skipped,
/// fatal disables the source for the run.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("transient transport error on source {source}: {message}")]
    Transient { source: String, message: String },

    #[error("malformed record from source {source}: {message}")]
    Malformed { source: String, message: String },

    #[error("fatal source error on {source}: {message}")]
    Fatal { source: String, message: String },

    #[error("cursor persistence error: {0}")]
    CursorPersist(String),
}

impl IngestError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, IngestError::Fatal { .. })
    }
}

impl From<ceg_core::source::SourceError> for IngestError {
    fn from(error: ceg_core::source::SourceError) -> Self {
        match error {
            ceg_core::source::SourceError::Transient { source, message } => IngestError::Transient {
                source: source.to_string(),
                message,
            },
            ceg_core::source::SourceError::Authentication { source, message } => IngestError::Fatal {
                source: source.to_string(),
                message,
            },
            ceg_core::source::SourceError::MalformedRecord { source, message } => {
                IngestError::Malformed {
                    source: source.to_string(),
                    message,
                }
            }
        }
    }
}
