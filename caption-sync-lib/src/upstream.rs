//! HTTP access to the video platform
//!
//! Every outbound request goes through [`UpstreamClient`], which bounds the
//! wait and folds transport failures, timeouts and non-2xx statuses into
//! [`CaptionError::UpstreamUnavailable`]. Response bodies never end up in
//! error text.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CaptionError, Result};
use crate::types::VideoId;

/// Upstream platform configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Scheme and host of the platform; the watch page is `{base_url}/watch?v={id}`
    pub base_url: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// User-Agent header sent with every request
    pub user_agent: String,

    /// Accept-Language header; steers the page toward English track names
    pub accept_language: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.youtube.com".to_string(),
            timeout_secs: 10,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36".to_string(),
            accept_language: "en-US,en;q=0.9".to_string(),
        }
    }
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Canonical watch page URL for a video
    pub fn watch_url(&self, video_id: &VideoId) -> String {
        format!("{}/watch?v={}", self.base_url.trim_end_matches('/'), video_id)
    }
}

/// Thin wrapper around a shared `reqwest::Client`
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    config: UpstreamConfig,
}

impl UpstreamClient {
    pub fn new(config: UpstreamConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| {
                CaptionError::UpstreamUnavailable(format!("failed to build HTTP client: {}", e))
            })?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &UpstreamConfig {
        &self.config
    }

    /// GET a URL and return its body as text.
    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        let response = self
            .http
            .get(url)
            .header(reqwest::header::ACCEPT_LANGUAGE, &self.config.accept_language)
            .send()
            .await
            .map_err(|e| CaptionError::UpstreamUnavailable(describe(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CaptionError::UpstreamUnavailable(format!(
                "upstream returned HTTP {}",
                status.as_u16()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| CaptionError::UpstreamUnavailable(describe(&e)))
    }
}

/// Summarise a transport error without echoing URLs that may carry
/// signed query parameters.
fn describe(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        "request timed out".to_string()
    } else if err.is_connect() {
        "connection failed".to_string()
    } else if err.is_body() || err.is_decode() {
        "failed to read response body".to_string()
    } else {
        "request failed".to_string()
    }
}
