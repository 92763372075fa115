use std::time::Duration;

use rand::seq::SliceRandom;
use reqwest::{Client, StatusCode, Url};
use tracing::debug;

use super::error::LookupError;
use super::types::ProfileResponse;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:120.0) Gecko/20100101 Firefox/120.0",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 14_4 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.0 Mobile/15E148 Safari/604.1",
];

/// A single, non-retrying profile fetch. Retries live one level up.
pub trait ProfileSource {
    async fn fetch_profile(&self, username: &str) -> Result<ProfileResponse, LookupError>;
}

pub struct HttpProfileClient {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
}

impl HttpProfileClient {
    /// Build a client for `base_url`; every request is bounded by `request_timeout`.
    ///
    /// Fails with [`LookupError::InvalidEndpoint`] unless `base_url` is an
    /// absolute `http` or `https` URL.
    pub fn new(
        base_url: String,
        api_key: Option<String>,
        request_timeout: Duration,
    ) -> Result<Self, LookupError> {
        let base_url = parse_endpoint(&base_url)?;
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(request_timeout)
            .build()?;
        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    fn user_agent() -> &'static str {
        USER_AGENTS
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(USER_AGENTS[0])
    }
}

fn parse_endpoint(raw: &str) -> Result<Url, LookupError> {
    let invalid = |reason: String| LookupError::InvalidEndpoint {
        url: raw.to_string(),
        reason,
    };
    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(invalid(format!("unsupported scheme `{other}`"))),
    }
}

impl ProfileSource for HttpProfileClient {
    async fn fetch_profile(&self, username: &str) -> Result<ProfileResponse, LookupError> {
        let mut request = self
            .client
            .get(self.base_url.clone())
            .query(&[("username", username)])
            .header("accept", "application/json, text/plain, */*")
            .header("user-agent", Self::user_agent());
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        debug!(%username, status = status.as_u16(), "profile response");

        if status == StatusCode::NOT_FOUND {
            return Err(LookupError::NotFound);
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(LookupError::RateLimited { retry_after });
        }

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(LookupError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        serde_json::from_str::<ProfileResponse>(&body)
            .map_err(|e| LookupError::InvalidPayload(e.to_string()))
    }
}
