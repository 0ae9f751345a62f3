//! Instrument Linker (§4.D): maps free-text company mentions to exchange
//! tickers via a four-tier resolution pipeline, learning new aliases as it
//! goes.

pub mod alias;
pub mod error;
pub mod exchange;
pub mod fuzzy;
pub mod normalize;
pub mod regulatory;
pub mod resolver;

pub use alias::AliasTable;
pub use error::LinkError;
pub use exchange::ExchangeSearchClient;
pub use resolver::{InstrumentLinker, LinkResult, LinkTier, SecurityIndex};
