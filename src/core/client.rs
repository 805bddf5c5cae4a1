//! The gateway client and its request/response calls.
//!
//! Every call is a single HTTP request with no retry and no response-schema
//! validation; non-success statuses and connection failures surface as
//! [`ClientError`] at the call site. Streaming calls hand the response body
//! to [`ChatStream`] and return before the first chunk arrives.

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::api::{ChatRequest, ChatResponse, HealthStatus, ModelsResponse};
use crate::core::chat_stream::ChatStream;
use crate::error::ClientError;
use crate::utils::url::{construct_api_url, normalize_base_url};

/// Base URL the FeatherGate gateway listens on out of the box.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/v1";

/// Client for one gateway. Holds only the base URL and the HTTP session;
/// calls are independent and the client can be shared across tasks. Cloning
/// is cheap and reuses the underlying connection pool.
#[derive(Clone, Debug)]
pub struct FeatherGateClient {
    client: reqwest::Client,
    base_url: String,
}

impl FeatherGateClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Builds a client on an existing `reqwest::Client`, for callers that
    /// configure their own timeouts or share a session across gateways.
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: normalize_base_url(&base_url.into()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends a non-streaming completion request and returns the body as
    /// opaque JSON. The `stream` flag on the request is forced off.
    pub async fn chat(&self, mut request: ChatRequest) -> Result<ChatResponse, ClientError> {
        request.stream = false;
        let response = self.post_chat(&request).await?;
        Ok(response.json::<ChatResponse>().await?)
    }

    /// Sends a streaming completion request and returns the chunk stream.
    ///
    /// HTTP and status failures surface here, before any chunk is read.
    /// Dropping the returned stream early closes the connection.
    pub async fn chat_stream(&self, mut request: ChatRequest) -> Result<ChatStream, ClientError> {
        request.stream = true;
        let response = self.post_chat(&request).await?;
        Ok(ChatStream::new(response))
    }

    /// Lists the models the gateway routes to.
    pub async fn list_models(&self) -> Result<ModelsResponse, ClientError> {
        self.get_json("models").await
    }

    /// Asks the gateway whether it is alive.
    pub async fn health_check(&self) -> Result<HealthStatus, ClientError> {
        self.get_json("health").await
    }

    async fn post_chat(&self, request: &ChatRequest) -> Result<reqwest::Response, ClientError> {
        let url = construct_api_url(&self.base_url, "chat/completions");
        debug!(model = %request.model, stream = request.stream, "sending chat completion request");
        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;
        check_status(response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ClientError> {
        let url = construct_api_url(&self.base_url, endpoint);
        debug!(%url, "sending GET request");
        let response = self
            .client
            .get(url)
            .header("Content-Type", "application/json")
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.json::<T>().await?)
    }
}

impl Default for FeatherGateClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

/// Turns a non-success response into `ClientError::Status`, keeping the
/// body text for the caller.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<no body>".to_string());
    Err(ClientError::Status { status, body })
}
