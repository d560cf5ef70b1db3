//! HTTP client for a remote `ccbrowse serve` instance

use crate::error::{CoreError, CoreResult};
use crate::models::{
    FavoriteResponse, Session, SessionId, SessionsResponse, TranscriptResponse,
};
use crate::source::SessionSource;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Session source backed by the ccbrowse JSON API
#[derive(Debug, Clone)]
pub struct HttpSessionSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSessionSource {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Create a client for `base_url` (e.g. `http://127.0.0.1:8765`)
    pub fn new(base_url: &str, timeout: Duration) -> CoreResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoreError::InvalidConfig {
                message: format!("cannot build HTTP client: {}", e),
            })?;
        Ok(Self::with_client(client, base_url))
    }

    /// Reuse an existing `reqwest::Client`
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    fn session_url(&self, id: &SessionId, suffix: &str) -> String {
        self.url(&format!(
            "/sessions/{}{}",
            urlencoding::encode(id.as_str()),
            suffix
        ))
    }

    async fn send(&self, request: RequestBuilder, url: &str) -> CoreResult<Response> {
        let response = request.send().await.map_err(|source| CoreError::Http {
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            debug!(url, status = status.as_u16(), "Request rejected");
            return Err(CoreError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> CoreResult<T> {
        let response = self.send(self.client.get(url), url).await?;
        response.json().await.map_err(|source| CoreError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

impl SessionSource for HttpSessionSource {
    async fn list_sessions(&self, limit: usize) -> CoreResult<Vec<Session>> {
        let url = format!("{}?limit={}", self.url("/sessions"), limit);
        let body: SessionsResponse = self.get_json(&url).await?;
        Ok(body.sessions)
    }

    async fn transcript(&self, id: &SessionId) -> CoreResult<TranscriptResponse> {
        self.get_json(&self.session_url(id, "")).await
    }

    async fn session_html(&self, id: &SessionId) -> CoreResult<String> {
        let url = self.session_url(id, "/html");
        let response = self.send(self.client.get(&url), &url).await?;
        response
            .text()
            .await
            .map_err(|source| CoreError::Decode { url, source })
    }

    async fn delete_session(&self, id: &SessionId) -> CoreResult<()> {
        let url = self.session_url(id, "");
        self.send(self.client.delete(&url), &url).await?;
        Ok(())
    }

    async fn toggle_favorite(&self, id: &SessionId) -> CoreResult<bool> {
        let url = self.session_url(id, "/favorite");
        let response = self.send(self.client.post(&url), &url).await?;
        let body: FavoriteResponse = response
            .json()
            .await
            .map_err(|source| CoreError::Decode { url, source })?;
        Ok(body.is_favorite)
    }
}
