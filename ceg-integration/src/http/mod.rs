use self::rest::RestRequest;
use crate::error::SocketError;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::error;

/// Defines an abstract [`RestRequest`] executable by a configurable [`rest::RestClient`].
pub mod rest;

/// A no-authentication [`BuildStrategy`] for public endpoints (extraction
/// model calls, exchange instrument search).
pub mod public;

/// [`RestRequest`] build strategy for the API being interacted with.
///
/// An authenticated API adds its signing / API-key headers here before the
/// request is built; a public API just forwards the builder unchanged.
pub trait BuildStrategy {
    fn build<Request>(
        &self,
        request: Request,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::Request, SocketError>
    where
        Request: RestRequest;
}

/// Used by a [`rest::RestClient`] to deserialise [`RestRequest::Response`],
/// and upon failure parse the API-specific error body returned by the server.
pub trait HttpParser {
    type ApiError: DeserializeOwned;
    type OutputError: From<SocketError>;

    fn parse<Response>(
        &self,
        status: StatusCode,
        payload: &[u8],
    ) -> Result<Response, Self::OutputError>
    where
        Response: DeserializeOwned,
    {
        let parse_ok_error = match serde_json::from_slice::<Response>(payload) {
            Ok(response) => return Ok(response),
            Err(serde_error) => serde_error,
        };

        let parse_api_error_error = match serde_json::from_slice::<Self::ApiError>(payload) {
            Ok(api_error) => return Err(self.parse_api_error(status, api_error)),
            Err(serde_error) => serde_error,
        };

        error!(
            status_code = ?status,
            ?parse_ok_error,
            ?parse_api_error_error,
            response_body = %String::from_utf8_lossy(payload),
            "error deserializing HTTP response"
        );

        Err(Self::OutputError::from(SocketError::DeserialiseBinary {
            error: parse_ok_error,
            payload: payload.to_vec(),
        }))
    }

    fn parse_api_error(&self, status: StatusCode, error: Self::ApiError) -> Self::OutputError;
}
