//! Single egress point for all network calls.
//!
//! Every request leaves through [`ApiClient`]: the bearer credential is
//! attached when present, and every response passes through one
//! interception path that parses the failure envelope and applies the
//! authorization policy. A 401 clears the token store only when the body
//! carries the server's invalid-token marker; any other 401 leaves the
//! session intact.

use std::sync::Arc;
use std::time::Duration;

use quarry_api_models::ErrorEnvelope;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::multipart::Form;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::error::{ClientError, ClientResult};
use crate::token::TokenStore;

/// Correlation header attached to every outgoing request.
pub const HEADER_REQUEST_ID: &str = "x-request-id";
/// Scheme prefix for the `Authorization` header.
const BEARER_PREFIX: &str = "Bearer ";
/// Default per-request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Configured HTTP pipeline shared by all data-access components.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    tokens: Arc<TokenStore>,
}

impl ApiClient {
    /// Build a client against `base_url` with a bounded request timeout.
    ///
    /// # Errors
    ///
    /// Fails when the underlying HTTP client cannot be constructed.
    pub fn new(base_url: Url, timeout: Duration, tokens: Arc<TokenStore>) -> ClientResult<Self> {
        let mut default_headers = HeaderMap::new();
        let request_id = HeaderValue::from_str(&Uuid::new_v4().to_string()).map_err(|_| {
            ClientError::unexpected_format("generated request id contains invalid characters")
        })?;
        default_headers.insert(HEADER_REQUEST_ID, request_id);

        let http = Client::builder()
            .timeout(timeout)
            .default_headers(default_headers)
            .build()
            .map_err(|err| ClientError::Network {
                detail: format!("failed to build HTTP client: {err}"),
            })?;

        Ok(Self {
            http,
            base_url,
            tokens,
        })
    }

    /// Same as [`ApiClient::new`] with the default timeout.
    ///
    /// # Errors
    ///
    /// Fails when the underlying HTTP client cannot be constructed.
    pub fn with_default_timeout(base_url: Url, tokens: Arc<TokenStore>) -> ClientResult<Self> {
        Self::new(
            base_url,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            tokens,
        )
    }

    /// The token store this client reads from and, on confirmed
    /// invalid-token responses, clears.
    #[must_use]
    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    fn url(&self, path: &str) -> ClientResult<Url> {
        self.base_url.join(path).map_err(|err| {
            ClientError::unexpected_format(format!("invalid request path '{path}': {err}"))
        })
    }

    /// Normalize a stored credential into an `Authorization` value.
    /// Values already carrying the scheme pass through unchanged.
    fn bearer_value(token: &str) -> String {
        if token.starts_with(BEARER_PREFIX) {
            token.to_string()
        } else {
            format!("{BEARER_PREFIX}{token}")
        }
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.tokens.get() {
            Some(token) => builder.header(reqwest::header::AUTHORIZATION, Self::bearer_value(&token)),
            None => builder,
        }
    }

    /// `GET {path}` decoding the success body as JSON.
    ///
    /// # Errors
    ///
    /// Propagates network, envelope-derived, and decode failures.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let builder = self.http.get(self.url(path)?);
        let response = self.execute(builder).await?;
        Self::decode(response).await
    }

    /// `POST {path}` with a JSON body, decoding the success body as JSON.
    ///
    /// # Errors
    ///
    /// Propagates network, envelope-derived, and decode failures.
    pub async fn post_json<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let builder = self.http.post(self.url(path)?).json(body);
        let response = self.execute(builder).await?;
        Self::decode(response).await
    }

    /// `POST {path}` with a multipart body, decoding the success body as
    /// JSON. Progress tracking is the caller's concern: build the form
    /// with a counting part (see the upload controller).
    ///
    /// # Errors
    ///
    /// Propagates network, envelope-derived, and decode failures.
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: Form,
    ) -> ClientResult<T> {
        let builder = self.http.post(self.url(path)?).multipart(form);
        let response = self.execute(builder).await?;
        Self::decode(response).await
    }

    /// `DELETE {path}`, discarding any success body.
    ///
    /// # Errors
    ///
    /// Propagates network and envelope-derived failures.
    pub async fn delete(&self, path: &str) -> ClientResult<()> {
        let builder = self.http.delete(self.url(path)?);
        let _ = self.execute(builder).await?;
        Ok(())
    }

    async fn execute(&self, builder: RequestBuilder) -> ClientResult<Response> {
        let response = self.authorize(builder).send().await?;
        self.intercept(response).await
    }

    /// Uniform response policy: successes pass through; failures are
    /// collapsed into the error taxonomy, clearing the session only on
    /// the server's explicit invalid-token signal.
    async fn intercept(&self, response: Response) -> ClientResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let bytes = response.bytes().await.unwrap_or_default();
        let envelope = serde_json::from_slice::<ErrorEnvelope>(&bytes).unwrap_or_default();

        if status == StatusCode::UNAUTHORIZED && envelope.signals_invalid_token() {
            tracing::info!("server reported invalid credential; clearing session");
            self.tokens.clear();
            return Err(ClientError::SessionExpired);
        }

        let fallback = format!("request failed with status {status}");
        Err(ClientError::Api {
            status: status.as_u16(),
            message: envelope.message(&fallback),
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|err| {
            ClientError::unexpected_format(format!("failed to decode response body: {err}"))
        })
    }
}
