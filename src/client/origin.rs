//! reqwest-backed origin client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;

use super::{ImageFetcher, origin_url};
use crate::banner::{BannerSettings, BannerTarget};
use crate::error::FetchError;

/// HTTP client for the banner rendering origin
pub struct OriginClient {
    http: HttpClient,
    origin_base: String,
    timeout: Duration,
}

impl OriginClient {
    /// Create a client with the configured deadline and browser user agent
    pub fn new(settings: &BannerSettings) -> Result<Self, FetchError> {
        let http = HttpClient::builder()
            .timeout(settings.fetch_timeout)
            .user_agent(settings.user_agent.as_str())
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(Self {
            http,
            origin_base: settings.origin_base.clone(),
            timeout: settings.fetch_timeout,
        })
    }
}

#[async_trait]
impl ImageFetcher for OriginClient {
    async fn fetch(&self, target: &BannerTarget) -> Result<Vec<u8>, FetchError> {
        let url = origin_url(&self.origin_base, target);
        log::debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::from_reqwest(e, self.timeout))?;

        if bytes.is_empty() {
            return Err(FetchError::EmptyBody);
        }

        Ok(bytes.to_vec())
    }
}
