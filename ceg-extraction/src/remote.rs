use async_trait::async_trait;
use ceg_core::extraction::Extraction;
use ceg_integration::http::public::PublicNoHeaders;
use ceg_integration::http::rest::{RestClient, RestRequest};
use ceg_integration::http::HttpParser;
use ceg_integration::rate_limit::{Priority, RateLimiter};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::client::{ExtractionClient, ExtractionRequest};
use crate::error::ExtractionError;

#[derive(Debug, Serialize)]
struct RemoteItem<'a> {
    id: &'a str,
    text: &'a str,
    source: &'a str,
    timestamp: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize)]
struct ExtractBody<'a> {
    items: Vec<RemoteItem<'a>>,
}

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    extractions: Vec<Extraction>,
}

#[derive(Debug, Deserialize)]
struct RemoteApiError {
    message: String,
}

struct ExtractBatchRequest<'a> {
    body: ExtractBody<'a>,
}

impl<'a> RestRequest for ExtractBatchRequest<'a> {
    type Response = ExtractResponse;
    type QueryParams = ();
    type Body = ExtractBody<'a>;

    fn path(&self) -> std::borrow::Cow<'static, str> {
        std::borrow::Cow::Borrowed("/v1/extract")
    }

    fn method() -> reqwest::Method {
        reqwest::Method::POST
    }

    fn body(&self) -> Option<&Self::Body> {
        Some(&self.body)
    }

    fn timeout() -> Duration {
        // §5: extraction network calls carry a 60s per-call timeout.
        Duration::from_secs(60)
    }

    fn priority() -> Priority {
        Priority::Normal
    }
}

#[derive(Debug, Copy, Clone)]
struct ExtractionParser;

impl HttpParser for ExtractionParser {
    type ApiError = RemoteApiError;
    type OutputError = ExtractionError;

    fn parse_api_error(&self, status: StatusCode, error: Self::ApiError) -> Self::OutputError {
        if status.is_client_error() && status != StatusCode::TOO_MANY_REQUESTS {
            ExtractionError::Fatal(error.message)
        } else {
            ExtractionError::Transient(error.message)
        }
    }
}

/// Remote-LLM backed [`ExtractionClient`], calling a batch extraction
/// endpoint via a rate-limited [`RestClient`] (§4.C).
#[derive(Debug)]
pub struct RemoteExtractionClient {
    rest: RestClient<PublicNoHeaders, ExtractionParser>,
}

impl RemoteExtractionClient {
    pub fn new(base_url: url::Url, requests_per_interval: usize, interval: Duration) -> Self {
        let rate_limiter = RateLimiter::new(requests_per_interval, interval);
        Self {
            rest: RestClient::new(base_url, PublicNoHeaders, ExtractionParser, rate_limiter),
        }
    }
}

#[async_trait]
impl ExtractionClient for RemoteExtractionClient {
    fn supports_batch(&self) -> bool {
        true
    }

    async fn extract_batch(
        &self,
        requests: &[ExtractionRequest],
    ) -> Result<Vec<Extraction>, ExtractionError> {
        if requests.is_empty() {
            return Ok(Vec::new());
        }

        let items = requests
            .iter()
            .map(|request| RemoteItem {
                id: request.id.as_str(),
                text: request.text.as_str(),
                source: request.source.as_str(),
                timestamp: request.timestamp,
            })
            .collect();

        let response = self
            .rest
            .execute(ExtractBatchRequest {
                body: ExtractBody { items },
            })
            .await?;

        if response.extractions.len() != requests.len() {
            return Err(ExtractionError::Transient(format!(
                "expected {} extractions, got {}",
                requests.len(),
                response.extractions.len()
            )));
        }

        Ok(response.extractions)
    }
}
