use ceg_integration::http::public::PublicNoHeaders;
use ceg_integration::http::rest::{RestClient, RestRequest};
use ceg_integration::http::HttpParser;
use ceg_integration::rate_limit::{Priority, RateLimiter};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::time::Duration;

use crate::error::LinkError;

/// A single candidate returned by the exchange's security-search endpoint,
/// scored by tier 3 of the Instrument Linker (§4.D).
#[derive(Debug, Clone, Deserialize)]
pub struct SecurityCandidate {
    pub ticker: SmolStr,
    pub short_name: String,
    pub long_name: String,
    pub is_traded: bool,
    pub is_equity: bool,
    pub primary_board: Option<SmolStr>,
    pub isin: Option<SmolStr>,
}

/// Boards treated as "primary" for the allow-list bonus (§4.D (d)).
pub const PRIMARY_BOARD_ALLOW_LIST: &[&str] = &["TQBR", "SMAL", "EQBR"];

/// Tier-3 score threshold: the highest-scoring candidate must clear this to
/// be accepted (§4.D: "choose top score ≥ 50").
pub const EXCHANGE_SCORE_ACCEPT: i32 = 50;

impl SecurityCandidate {
    /// Score this candidate against the raw mention per §4.D tier 3:
    /// substring containment in short/long name (+50/+30), is-traded (+20),
    /// is-equity (+15), primary-board in the allow-list (+10), ISIN present
    /// (+25).
    pub fn score(&self, mention: &str) -> i32 {
        let needle = mention.to_lowercase();
        let mut score = 0;

        if self.short_name.to_lowercase().contains(&needle) {
            score += 50;
        } else if self.long_name.to_lowercase().contains(&needle) {
            score += 30;
        }
        if self.is_traded {
            score += 20;
        }
        if self.is_equity {
            score += 15;
        }
        if self
            .primary_board
            .as_deref()
            .is_some_and(|board| PRIMARY_BOARD_ALLOW_LIST.contains(&board))
        {
            score += 10;
        }
        if self.isin.is_some() {
            score += 25;
        }

        score
    }
}

#[derive(Debug, Serialize)]
struct SearchQuery<'a> {
    q: &'a str,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    candidates: Vec<SecurityCandidate>,
}

#[derive(Debug, Deserialize)]
struct ExchangeApiError {
    message: String,
}

struct SecuritySearchRequest<'a> {
    query: SearchQuery<'a>,
}

impl<'a> RestRequest for SecuritySearchRequest<'a> {
    type Response = SearchResponse;
    type QueryParams = SearchQuery<'a>;
    type Body = ();

    fn path(&self) -> std::borrow::Cow<'static, str> {
        std::borrow::Cow::Borrowed("/v1/securities/search")
    }

    fn method() -> reqwest::Method {
        reqwest::Method::GET
    }

    fn query_params(&self) -> Option<&Self::QueryParams> {
        Some(&self.query)
    }

    fn timeout() -> Duration {
        // §5: exchange search network calls carry a 30s per-call timeout.
        Duration::from_secs(30)
    }

    fn priority() -> Priority {
        Priority::Low
    }
}

#[derive(Debug, Copy, Clone)]
struct ExchangeParser;

impl HttpParser for ExchangeParser {
    type ApiError = ExchangeApiError;
    type OutputError = LinkError;

    fn parse_api_error(&self, _status: StatusCode, error: Self::ApiError) -> Self::OutputError {
        LinkError::ExchangeSearch(error.message)
    }
}

/// Client for the exchange's live security-search endpoint (§4.D tier 3).
#[derive(Debug)]
pub struct ExchangeSearchClient {
    rest: RestClient<PublicNoHeaders, ExchangeParser>,
}

impl ExchangeSearchClient {
    pub fn new(base_url: url::Url, requests_per_interval: usize, interval: Duration) -> Self {
        let rate_limiter = RateLimiter::new(requests_per_interval, interval);
        Self {
            rest: RestClient::new(base_url, PublicNoHeaders, ExchangeParser, rate_limiter),
        }
    }

    /// Query the exchange for candidates matching `mention`, returning the
    /// best-scoring one if its score clears [`EXCHANGE_SCORE_ACCEPT`].
    pub async fn best_match(&self, mention: &str) -> Result<Option<(SecurityCandidate, i32)>, LinkError> {
        let response = self
            .rest
            .execute(SecuritySearchRequest {
                query: SearchQuery { q: mention },
            })
            .await?;

        let best = response
            .candidates
            .into_iter()
            .map(|candidate| {
                let score = candidate.score(mention);
                (candidate, score)
            })
            .max_by_key(|(_, score)| *score);

        Ok(best.filter(|(_, score)| *score >= EXCHANGE_SCORE_ACCEPT))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate() -> SecurityCandidate {
        SecurityCandidate {
            ticker: SmolStr::new("GMKN"),
            short_name: "Norilsk Nickel".to_string(),
            long_name: "MMC Norilsk Nickel PJSC".to_string(),
            is_traded: true,
            is_equity: true,
            primary_board: Some(SmolStr::new("TQBR")),
            isin: Some(SmolStr::new("RU0007288411")),
        }
    }

    #[test]
    fn full_match_scores_above_threshold() {
        let score = candidate().score("Norilsk Nickel");
        assert_eq!(score, 50 + 20 + 15 + 10 + 25);
        assert!(score >= EXCHANGE_SCORE_ACCEPT);
    }

    #[test]
    fn long_name_only_match_scores_lower_but_can_still_pass() {
        let score = candidate().score("MMC Norilsk Nickel");
        assert!(score >= EXCHANGE_SCORE_ACCEPT);
    }

    #[test]
    fn no_substring_match_scores_below_threshold() {
        let score = candidate().score("Sberbank");
        assert!(score < EXCHANGE_SCORE_ACCEPT);
    }
}
