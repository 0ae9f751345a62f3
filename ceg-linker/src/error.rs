use thiserror::Error;

/// Failure surface for the Instrument Linker (§4.D, §7). A linker miss is
/// not an error the caller propagates — it proceeds company-only — so this
/// enum only covers genuine failures of the resolution machinery itself.
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("exchange search request failed: {0}")]
    ExchangeSearch(String),

    #[error("alias table persistence error: {0}")]
    AliasPersist(String),
}
