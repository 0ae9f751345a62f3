use super::{BuildStrategy, HttpParser};
use crate::error::SocketError;
use crate::rate_limit::{Priority, RateLimiter};
use serde::{Serialize, de::DeserializeOwned};
use std::time::Duration;
use tracing::debug;

const DEFAULT_HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Http REST request executable by a [`RestClient`].
pub trait RestRequest {
    type Response: DeserializeOwned;
    type QueryParams: Serialize;
    type Body: Serialize;

    fn path(&self) -> std::borrow::Cow<'static, str>;
    fn method() -> reqwest::Method;

    fn query_params(&self) -> Option<&Self::QueryParams> {
        None
    }

    fn body(&self) -> Option<&Self::Body> {
        None
    }

    fn timeout() -> Duration {
        DEFAULT_HTTP_REQUEST_TIMEOUT
    }

    fn priority() -> Priority {
        Priority::Normal
    }
}

/// Generic, rate-limited REST client parameterised by a [`BuildStrategy`]
/// (how to authenticate/shape the outgoing request) and an [`HttpParser`]
/// (how to interpret the response), used for both the extraction model
/// client and exchange instrument search (§4.B, §7.Extraction Client,
/// §7.Instrument Linker).
#[derive(Debug, Clone)]
pub struct RestClient<Strategy, Parser> {
    http_client: reqwest::Client,
    base_url: url::Url,
    strategy: Strategy,
    parser: Parser,
    rate_limiter: RateLimiter,
}

impl<Strategy, Parser> RestClient<Strategy, Parser>
where
    Strategy: BuildStrategy,
    Parser: HttpParser,
{
    pub fn new(
        base_url: url::Url,
        strategy: Strategy,
        parser: Parser,
        rate_limiter: RateLimiter,
    ) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            base_url,
            strategy,
            parser,
            rate_limiter,
        }
    }

    pub async fn execute<Request>(
        &self,
        request: Request,
    ) -> Result<Request::Response, Parser::OutputError>
    where
        Request: RestRequest,
    {
        self.rate_limiter.acquire(Request::priority()).await;

        let url = self
            .base_url
            .join(&request.path())
            .map_err(|error| SocketError::Subscribe {
                entity: request.path().to_string(),
                error: error.to_string(),
            })?;

        let mut builder = self
            .http_client
            .request(Request::method(), url)
            .timeout(Request::timeout());

        if let Some(query_params) = request.query_params() {
            builder = builder.query(query_params);
        }

        if let Some(body) = request.body() {
            builder = builder.json(body);
        }

        let built = self.strategy.build(request, builder)?;

        debug!(method = %built.method(), url = %built.url(), "sending rest request");

        let response = self
            .http_client
            .execute(built)
            .await
            .map_err(SocketError::from)?;

        let status = response.status();
        if status.as_u16() == 429 {
            self.rate_limiter.report_violation().await;
        }

        let payload = response.bytes().await.map_err(SocketError::from)?;

        self.parser.parse::<Request::Response>(status, &payload)
    }
}
