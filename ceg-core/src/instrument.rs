use derive_more::Display;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// A tradable security, identified by `exchange:symbol` (§3). Shared across
/// the graph; never mutated after first creation except for `traded`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[display("{exchange}:{symbol}")]
pub struct Instrument {
    pub exchange: SmolStr,
    pub symbol: SmolStr,
    pub isin: Option<SmolStr>,
    pub primary_board: Option<SmolStr>,
    pub traded: bool,
    pub market: SmolStr,
    pub security_type: SecurityType,
}

impl Instrument {
    /// The stable id used to key graph upserts: `exchange:symbol`.
    pub fn id(&self) -> String {
        format!("{}:{}", self.exchange, self.symbol)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display)]
pub enum SecurityType {
    Equity,
    Bond,
    Etf,
    Depositary,
    Other,
}

/// An issuer, linked to at most one primary [`Instrument`] (§3).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Company {
    pub id: SmolStr,
    pub display_name: String,
    pub primary_instrument: Option<SmolStr>,
    /// True for central banks, ministries and other regulatory bodies
    /// (§4.D): these are never treated as linkable companies.
    pub is_regulatory_body: bool,
}
