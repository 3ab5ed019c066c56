//! Transport seam between the client and the network.
//!
//! Mirrors the host request-manager contract: a GET request goes in,
//! the raw JSON body comes back as a string. The client is generic
//! over [`Transport`] so list operations can be exercised against
//! canned responses.

use std::future::Future;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, REFERER};
use reqwest::Client;

use crate::config::SourceConfig;
use crate::error::SourceError;
use crate::ratelimit::RateLimiter;

/// Issues a GET request and returns the response body.
pub trait Transport: Send + Sync {
    fn get(
        &self,
        url: &str,
        query: &[(String, String)],
    ) -> impl Future<Output = Result<String, SourceError>> + Send;
}

/// Rate-limited reqwest transport with the headers MangaDex expects.
///
/// No retry or backoff here; transport failures surface unmodified.
pub struct HttpTransport {
    http: Client,
    limiter: RateLimiter,
}

impl HttpTransport {
    pub fn new(config: &SourceConfig) -> Result<Self, SourceError> {
        let mut headers = HeaderMap::new();
        headers.insert(REFERER, HeaderValue::from_static("https://mangadex.org/"));

        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            limiter: RateLimiter::per_second(config.requests_per_second),
        })
    }
}

impl Transport for HttpTransport {
    async fn get(&self, url: &str, query: &[(String, String)]) -> Result<String, SourceError> {
        self.limiter.acquire().await;
        tracing::debug!(url, "GET");

        let resp = self.http.get(url).query(query).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), url, "MangaDex API error");
            return Err(SourceError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(resp.text().await?)
    }
}
