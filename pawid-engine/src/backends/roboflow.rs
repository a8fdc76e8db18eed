//! Roboflow Classification Client
//!
//! Posts the base64-encoded image to the hosted classification endpoint and returns
//! the JSON response untouched; shape handling belongs to the normalizer.
//!
//! # API Reference
//! - Endpoint: `POST {base_url}/{model_id}?api_key=...`
//! - Body: base64 image, `Content-Type: application/x-www-form-urlencoded`
//! - Responses seen in the wild: `{"predictions": [...], "top": ..., "confidence": ...}`
//!   for single-label models, `{"predictions": {"label": {"confidence": ..}}}` for
//!   multi-label models

use super::{BackendError, ClassificationBackend};
use crate::error::ConfigError;
use crate::image::ImageInput;
use crate::types::Category;
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use pawid_common::config::{RoboflowConfig, TomlConfig};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde_json::Value;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Upstream error bodies are logged up to this many characters
const MAX_LOGGED_BODY: usize = 200;

/// Roboflow client bound to one model
pub struct RoboflowClient {
    /// HTTP client for API requests (shared across categories)
    http_client: Client,
    /// Roboflow API key
    api_key: String,
    /// Model identifier, e.g. `dog-breeds/3`
    model_id: String,
    /// Endpoint base URL without trailing slash
    base_url: String,
    /// Request timeout, reported in timeout errors
    timeout: Duration,
    /// Client-side rate limiter (shared across categories)
    rate_limiter: Arc<DefaultDirectRateLimiter>,
    /// "Roboflow:<model_id>"
    name: String,
}

impl RoboflowClient {
    /// Create a client from shared parts
    pub fn new(
        http_client: Client,
        rate_limiter: Arc<DefaultDirectRateLimiter>,
        config: &RoboflowConfig,
        api_key: impl Into<String>,
        model_id: impl Into<String>,
    ) -> Self {
        let model_id = model_id.into();
        Self {
            http_client,
            api_key: api_key.into(),
            name: format!("Roboflow:{}", model_id),
            model_id,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(config.timeout_secs),
            rate_limiter,
        }
    }

    /// Full endpoint URL without the API key
    pub fn endpoint(&self) -> String {
        format!("{}/{}", self.base_url, self.model_id)
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }
}

#[async_trait]
impl ClassificationBackend for RoboflowClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn classify(&self, image: &ImageInput) -> Result<Value, BackendError> {
        self.rate_limiter.until_ready().await;

        debug!(
            model_id = %self.model_id,
            image_bytes = image.len(),
            mime_type = image.mime_type(),
            "Querying Roboflow"
        );

        let response = self
            .http_client
            .post(self.endpoint())
            .query(&[("api_key", self.api_key.as_str())])
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(image.to_base64())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BackendError::Timeout(self.timeout)
                } else {
                    // without_url keeps the API key out of the message
                    BackendError::Transport(e.without_url().to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // The orchestrator logs the failure at warn
            debug!(
                model_id = %self.model_id,
                status = status.as_u16(),
                body = %body.chars().take(MAX_LOGGED_BODY).collect::<String>(),
                "Roboflow request failed"
            );
            return Err(BackendError::Status(status.as_u16()));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| BackendError::InvalidBody(e.without_url().to_string()))
    }
}

/// Build one Roboflow client per configured category, in configuration order
///
/// All clients share one HTTP connection pool and one rate limiter.
pub fn build_backends(
    config: &TomlConfig,
) -> Result<Vec<(Category, Arc<dyn ClassificationBackend>)>, ConfigError> {
    if config.categories.is_empty() {
        return Err(ConfigError::NoCategories);
    }

    let api_key = config
        .roboflow
        .api_key
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or(ConfigError::MissingApiKey)?;

    let per_second =
        NonZeroU32::new(config.roboflow.requests_per_second).ok_or(ConfigError::InvalidRateLimit)?;
    if config.roboflow.timeout_secs == 0 {
        return Err(ConfigError::InvalidTimeout);
    }
    let rate_limiter = Arc::new(RateLimiter::direct(Quota::per_second(per_second)));

    let http_client = Client::builder()
        .timeout(Duration::from_secs(config.roboflow.timeout_secs))
        .build()
        .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

    config
        .categories
        .iter()
        .map(|entry| {
            let model_id = entry.model_id.trim();
            if model_id.is_empty() {
                return Err(ConfigError::EmptyModelId(entry.category.clone()));
            }
            let client = RoboflowClient::new(
                http_client.clone(),
                Arc::clone(&rate_limiter),
                &config.roboflow,
                api_key,
                model_id,
            );
            Ok((
                Category::from(entry.category.as_str()),
                Arc::new(client) as Arc<dyn ClassificationBackend>,
            ))
        })
        .collect()
}
