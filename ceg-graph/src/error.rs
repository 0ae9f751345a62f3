use ceg_core::impact::MarketDataError;
use ceg_core::store::StoreError;
use thiserror::Error;

/// Failure surface for the event-extraction → graph-write pipeline (§7,
/// §4.I: "must tolerate partial failures").
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("market data error: {0}")]
    MarketData(#[from] MarketDataError),

    #[error("graph store error after retries: {0}")]
    Store(#[from] StoreError),
}
