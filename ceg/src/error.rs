use thiserror::Error;

/// Aggregated failure surface for the orchestrator (§4.L, §7). Every
/// downstream crate's error enum folds in here via `#[from]`, matching the
/// teacher's pattern of one top-level error type at the composition root.
#[derive(Debug, Error)]
pub enum CegError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Ingest(#[from] ceg_data::IngestError),

    #[error(transparent)]
    Extraction(#[from] ceg_extraction::ExtractionError),

    #[error(transparent)]
    Link(#[from] ceg_linker::LinkError),

    #[error(transparent)]
    Graph(#[from] ceg_graph::GraphError),

    #[error(transparent)]
    Watch(#[from] ceg_watch::WatchError),

    #[error(transparent)]
    Store(#[from] ceg_core::store::StoreError),

    #[error(transparent)]
    Core(#[from] ceg_core::CoreError),

    #[error("shutdown requested")]
    Cancelled,
}

impl CegError {
    /// Maps an error to the CLI exit code contract (§6): `1` configuration
    /// error, `2` fatal source/transport error, everything else surfaced as
    /// `2` too since it reaches the caller only when the orchestrator could
    /// not continue past it.
    pub fn exit_code(&self) -> i32 {
        match self {
            CegError::Config(_) => 1,
            CegError::Cancelled => 130,
            _ => 2,
        }
    }
}
