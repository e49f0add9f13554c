use crate::domains::auth::state_types::SessionStore;
use crate::infra::config::ConsoleConfig;
use crate::infra::errors::{ConsoleError, ConsoleResult};

use futures::StreamExt;
use futures::stream::BoxStream;
use log::{debug, info, warn};
use marathon_core::api::routes::v1;
use marathon_core::api::types::ApiResponse;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use std::time::Duration;

/// Raw byte chunks of a streamed download.
pub type ByteStream = BoxStream<'static, ConsoleResult<Vec<u8>>>;

/// API client with session-backed authentication
#[derive(Clone)]
pub struct ApiClient {
    pub(crate) client: Client,
    base_url: String,
    session: SessionStore,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("has_token", &self.session.token().is_some())
            .finish()
    }
}

/// Normalize a user-supplied server URL.
///
/// Adds `http://` when no scheme is present, trims trailing slashes and drops
/// a trailing `/api/v1` so route constants can be appended verbatim.
pub fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    let with_scheme =
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            trimmed.to_string()
        } else {
            format!("http://{}", trimmed)
        };
    let normalized = with_scheme
        .strip_suffix(v1::ROOT)
        .map(str::to_string)
        .unwrap_or(with_scheme);
    if normalized != raw {
        debug!(
            "[ApiClient] Normalized base URL from '{}' to '{}'",
            raw, normalized
        );
    }
    normalized
}

impl ApiClient {
    /// Create a new API client
    pub fn new(
        config: &ConsoleConfig,
        session: SessionStore,
    ) -> ConsoleResult<Self> {
        let base_url = normalize_base_url(&config.server_url);
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| {
                ConsoleError::Config(format!(
                    "Failed to create HTTP client: {e}"
                ))
            })?;

        info!(
            "[ApiClient] Creating new API client with base URL: {}",
            base_url
        );

        Ok(Self {
            client,
            base_url,
            session,
        })
    }

    /// Build an absolute URL from a route constant
    pub fn build_url(&self, path: impl AsRef<str>) -> String {
        let p = path.as_ref();
        if p.starts_with("http://") || p.starts_with("https://") {
            return p.to_string();
        }
        format!("{}/{}", self.base_url, p.trim_start_matches('/'))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Attach the bearer token, if any
    pub fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.session.token() {
            Some(token) => builder.bearer_auth(token.as_str()),
            None => builder,
        }
    }

    /// Send a request and screen out auth and status failures.
    ///
    /// A 401 invalidates the session here, once, before the error travels
    /// back to the caller.
    async fn send(&self, request: RequestBuilder) -> ConsoleResult<Response> {
        let response = request.send().await?;

        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::UNAUTHORIZED => {
                if self.session.invalidate() {
                    warn!("[ApiClient] Session rejected by server, logging out");
                }
                Err(ConsoleError::Unauthorized)
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(ConsoleError::api(
                    Some(status.as_u16()),
                    failure_message(&body),
                ))
            }
        }
    }

    /// Execute a request and decode the `{success, data}` envelope
    pub async fn execute_envelope<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> ConsoleResult<ApiResponse<T>> {
        let response = self.send(request).await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Err(ConsoleError::Decode(
                "Empty response from server (204 No Content)".to_string(),
            ));
        }
        Ok(response.json::<ApiResponse<T>>().await?)
    }

    async fn execute_request<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> ConsoleResult<T> {
        Ok(self.execute_envelope(request).await?.into_data()?)
    }

    /// Make an authenticated GET request returning the unwrapped payload
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> ConsoleResult<T> {
        let request = self.authorize(self.client.get(self.build_url(path)));
        self.execute_request(request).await
    }

    /// Make an authenticated GET request returning the whole envelope
    pub async fn get_envelope<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> ConsoleResult<ApiResponse<T>> {
        let request = self.authorize(self.client.get(self.build_url(path)));
        self.execute_envelope(request).await
    }

    /// Make an authenticated PUT request
    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ConsoleResult<T> {
        let request = self
            .authorize(self.client.put(self.build_url(path)))
            .json(body);
        self.execute_request(request).await
    }

    /// POST to a public endpoint whose response is not data-enveloped
    pub async fn post_public<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ConsoleResult<T> {
        let request = self.client.post(self.build_url(path)).json(body);
        let response = self.send(request).await?;
        Ok(response.json::<T>().await?)
    }

    /// Authenticated GET streaming the raw body
    pub async fn get_stream(&self, path: &str) -> ConsoleResult<ByteStream> {
        let request = self.authorize(self.client.get(self.build_url(path)));
        let response = self.send(request).await?;
        Ok(response
            .bytes_stream()
            .map(|chunk| {
                chunk.map(|bytes| bytes.to_vec()).map_err(ConsoleError::from)
            })
            .boxed())
    }
}

/// Best-effort extraction of a human-readable reason from an error body.
fn failure_message(body: &str) -> String {
    if let Ok(envelope) =
        serde_json::from_str::<ApiResponse<serde_json::Value>>(body)
        && let Some(reason) = envelope.failure_reason()
    {
        return reason.to_string();
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "Unknown error".to_string()
    } else {
        trimmed.to_string()
    }
}
