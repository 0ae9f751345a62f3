use smol_str::SmolStr;
use std::sync::Arc;
use tracing::debug;

use crate::alias::AliasTable;
use crate::exchange::ExchangeSearchClient;
use crate::fuzzy::{combined_similarity, fuzzy_confidence, FUZZY_ACCEPT_THRESHOLD};
use crate::normalize::{direct_ticker_candidate, normalize};
use crate::regulatory::is_regulatory_mention;

/// In-memory view of the security index, queried by tiers 1 and 4 of the
/// Instrument Linker (§4.D). Backed by whatever already loaded the
/// instrument universe for the run; kept separate from the exchange's live
/// search endpoint (tier 3), which is a network call.
pub trait SecurityIndex: Send + Sync {
    /// Tier 1: does `ticker` exist verbatim in the index?
    fn lookup_ticker(&self, ticker: &str) -> Option<SmolStr>;

    /// Tier 4: all `(ticker, display_name)` pairs to fuzzy-match against.
    fn all_securities(&self) -> Vec<(SmolStr, String)>;
}

/// Which tier resolved a mention, carried through for diagnostics and for
/// the scenario-S2 test (§8: "tier 2 used, exchange not called").
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LinkTier {
    DirectTicker,
    AliasLookup,
    ExchangeSearch,
    FuzzyMatch,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinkResult {
    pub ticker: SmolStr,
    pub confidence: f64,
    pub tier: LinkTier,
}

/// Four-tier company-mention resolver (§4.D), short-circuiting on first
/// success: direct ticker (1.0) → alias lookup (0.95) → exchange live
/// search (score-dependent, learns the alias on success) → fuzzy match
/// (`similarity * 0.9`).
pub struct InstrumentLinker {
    security_index: Arc<dyn SecurityIndex>,
    alias_table: AliasTable,
    exchange_client: Option<ExchangeSearchClient>,
}

impl InstrumentLinker {
    pub fn new(security_index: Arc<dyn SecurityIndex>, alias_table: AliasTable) -> Self {
        Self {
            security_index,
            alias_table,
            exchange_client: None,
        }
    }

    pub fn with_exchange_client(mut self, client: ExchangeSearchClient) -> Self {
        self.exchange_client = Some(client);
        self
    }

    /// Load a previously persisted learned-alias file into this linker's
    /// table, if present (§6 "Persisted state": learned-alias store).
    pub fn load_learned_aliases(&self, path: &std::path::Path) -> Result<(), crate::error::LinkError> {
        self.alias_table.load_learned(path)
    }

    /// Flush the learned-alias table to its configured persistence path
    /// (§5: "flush to disk is separate and non-blocking"). A no-op when the
    /// table was never given a persistence path.
    pub fn flush_aliases(&self) -> Result<(), crate::error::LinkError> {
        self.alias_table.flush()
    }

    /// Resolve `mention` to an instrument ticker, or `None` if this mention
    /// is a regulatory-body reference (classified `REGULATORY`, never a
    /// linkable company, §4.D) or no tier produces a match.
    pub async fn resolve(&self, mention: &str) -> Option<LinkResult> {
        if is_regulatory_mention(mention) {
            debug!(mention, "mention classified as regulatory body, not linked");
            return None;
        }

        if let Some(ticker) = direct_ticker_candidate(mention) {
            if let Some(resolved) = self.security_index.lookup_ticker(ticker) {
                return Some(LinkResult {
                    ticker: resolved,
                    confidence: 1.0,
                    tier: LinkTier::DirectTicker,
                });
            }
        }

        if let Some(ticker) = self.alias_table.resolve(mention) {
            return Some(LinkResult {
                ticker,
                confidence: 0.95,
                tier: LinkTier::AliasLookup,
            });
        }

        if let Some(client) = &self.exchange_client {
            match client.best_match(mention).await {
                Ok(Some((candidate, score))) => {
                    self.alias_table.learn(mention, candidate.ticker.clone());
                    return Some(LinkResult {
                        ticker: candidate.ticker,
                        confidence: (score as f64 / 100.0).clamp(0.0, 1.0),
                        tier: LinkTier::ExchangeSearch,
                    });
                }
                Ok(None) => {}
                Err(error) => {
                    debug!(mention, %error, "exchange search failed, falling through to fuzzy match");
                }
            }
        }

        let normalized_mention = normalize(mention);
        let best = self
            .security_index
            .all_securities()
            .into_iter()
            .map(|(ticker, name)| (ticker, combined_similarity(&normalized_mention, &normalize(&name))))
            .max_by(|(_, a), (_, b)| a.total_cmp(b));

        best.filter(|(_, similarity)| *similarity >= FUZZY_ACCEPT_THRESHOLD)
            .map(|(ticker, similarity)| LinkResult {
                ticker,
                confidence: fuzzy_confidence(similarity),
                tier: LinkTier::FuzzyMatch,
            })
    }
}
