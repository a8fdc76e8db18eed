//! Classification Orchestrator
//!
//! Drives one image through the engine:
//! 1. Validate the image (the only outright failure besides cancellation)
//! 2. Fan out one backend call per category, concurrently, each bounded by a timeout
//! 3. Wait for every call to settle (barrier, not race-to-first)
//! 4. Normalize each payload into a [`CategoryResult`]
//! 5. Select the ensemble winner, apply the decision policy, compose the [`Verdict`]
//!
//! # Error Handling
//! - Per-category error isolation: a failed or timed-out backend becomes a
//!   zero-confidence result and never aborts its siblings
//! - Every backend failed: an indeterminate verdict, distinguishable from "unknown"
//! - No retries at this layer

use crate::backends::{roboflow, BackendError, ClassificationBackend};
use crate::ensemble;
use crate::error::{ConfigError, EngineError, EngineResult};
use crate::image::{ImageInput, ImageLimits};
use crate::normalizer;
use crate::policy::{self, DecisionThresholds};
use crate::types::{BackendFailure, Category, CategoryResult, Verdict};
use futures::future::join_all;
use pawid_common::config::TomlConfig;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Orchestrator settings
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierConfig {
    pub thresholds: DecisionThresholds,
    pub image_limits: ImageLimits,
    /// Upper bound for each backend call
    pub call_timeout: Duration,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            thresholds: DecisionThresholds::default(),
            image_limits: ImageLimits::default(),
            call_timeout: Duration::from_secs(30),
        }
    }
}

impl ClassifierConfig {
    /// Validate and convert the bootstrap configuration
    pub fn from_toml(config: &TomlConfig) -> Result<Self, ConfigError> {
        if config.roboflow.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }
        Ok(Self {
            thresholds: DecisionThresholds::try_from(&config.thresholds)?,
            image_limits: ImageLimits::try_from(&config.image)?,
            call_timeout: Duration::from_secs(config.roboflow.timeout_secs),
        })
    }
}

/// A backend bound to the category it answers for
#[derive(Clone)]
pub struct RegisteredBackend {
    pub category: Category,
    pub backend: Arc<dyn ClassificationBackend>,
}

impl RegisteredBackend {
    pub fn new(category: Category, backend: Arc<dyn ClassificationBackend>) -> Self {
        Self { category, backend }
    }
}

impl From<(Category, Arc<dyn ClassificationBackend>)> for RegisteredBackend {
    fn from((category, backend): (Category, Arc<dyn ClassificationBackend>)) -> Self {
        Self::new(category, backend)
    }
}

/// Classification engine entry point
///
/// Holds no per-request state; one instance serves concurrent requests.
///
/// # Example
/// ```rust,ignore
/// let config = TomlConfig::load(None)?;
/// let classifier = Classifier::from_toml(&config)?;
///
/// let verdict = classifier.classify(std::fs::read("rex.jpg")?).await?;
/// println!("{}", serde_json::to_string(&verdict)?);
/// ```
pub struct Classifier {
    config: ClassifierConfig,
    /// Registration order is the ensemble tie-break priority
    backends: Vec<RegisteredBackend>,
}

impl Classifier {
    /// Create a classifier, validating configuration eagerly
    ///
    /// # Errors
    /// Invalid thresholds, a zero call timeout, an empty backend list, or a category
    /// registered twice.
    pub fn new(
        config: ClassifierConfig,
        backends: Vec<RegisteredBackend>,
    ) -> Result<Self, ConfigError> {
        config.thresholds.validate()?;
        if config.call_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout);
        }

        if backends.is_empty() {
            return Err(ConfigError::NoCategories);
        }

        let mut seen = HashSet::new();
        for registered in &backends {
            if !seen.insert(registered.category.clone()) {
                return Err(ConfigError::DuplicateCategory(registered.category.to_string()));
            }
        }

        info!(
            categories = ?backends.iter().map(|b| b.category.as_str()).collect::<Vec<_>>(),
            "Classifier initialized"
        );

        Ok(Self { config, backends })
    }

    /// Build a classifier with Roboflow backends from bootstrap configuration
    pub fn from_toml(config: &TomlConfig) -> Result<Self, ConfigError> {
        let classifier_config = ClassifierConfig::from_toml(config)?;
        let backends = roboflow::build_backends(config)?
            .into_iter()
            .map(RegisteredBackend::from)
            .collect();
        Self::new(classifier_config, backends)
    }

    /// Load bootstrap configuration (explicit path, `PAWID_CONFIG`, platform default)
    /// and build a classifier from it
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = TomlConfig::load(config_path)?;
        Self::from_toml(&config)
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Categories in priority order
    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.backends.iter().map(|b| &b.category)
    }

    /// Validate raw image bytes and classify them
    ///
    /// # Errors
    /// `EngineError::InvalidImage` if the image is rejected; no backend is called.
    pub async fn classify(&self, image_bytes: Vec<u8>) -> EngineResult<Verdict> {
        let image = ImageInput::from_bytes(image_bytes, &self.config.image_limits)?;
        Ok(self.classify_image(&image).await)
    }

    /// Decode a base64 image (optionally a `data:` URL) and classify it
    pub async fn classify_base64(&self, encoded: &str) -> EngineResult<Verdict> {
        let image = ImageInput::from_base64(encoded, &self.config.image_limits)?;
        Ok(self.classify_image(&image).await)
    }

    /// Classify, abandoning outstanding backend calls when `cancel` fires
    ///
    /// # Errors
    /// `EngineError::InvalidImage` before any call, or `EngineError::Cancelled`.
    pub async fn classify_with_cancellation(
        &self,
        image_bytes: Vec<u8>,
        cancel: &CancellationToken,
    ) -> EngineResult<Verdict> {
        let image = ImageInput::from_bytes(image_bytes, &self.config.image_limits)?;

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("Classification cancelled, dropping outstanding backend calls");
                Err(EngineError::Cancelled)
            }
            verdict = self.classify_image(&image) => Ok(verdict),
        }
    }

    /// Classify an already-validated image; never fails
    pub async fn classify_image(&self, image: &ImageInput) -> Verdict {
        let request_id = Uuid::new_v4();
        let span = info_span!(
            "classify",
            %request_id,
            image_bytes = image.len(),
            mime_type = image.mime_type()
        );

        async {
            let results = self.query_all(image).await;
            let verdict = self.compose(results);
            info!(indeterminate = verdict.indeterminate, "Classification complete: {}", verdict);
            verdict
        }
        .instrument(span)
        .await
    }

    /// Query every backend concurrently and wait for all of them
    async fn query_all(&self, image: &ImageInput) -> Vec<CategoryResult> {
        let futures = self
            .backends
            .iter()
            .map(|registered| self.query_one(registered, image));

        join_all(futures).await
    }

    /// One backend call, with its failure converted into a zero-confidence result
    async fn query_one(&self, registered: &RegisteredBackend, image: &ImageInput) -> CategoryResult {
        let category = registered.category.clone();
        let backend = registered.backend.name();

        let outcome = tokio::time::timeout(self.config.call_timeout, registered.backend.classify(image))
            .await
            .unwrap_or(Err(BackendError::Timeout(self.config.call_timeout)));

        match outcome {
            Ok(raw) => {
                let predictions = normalizer::normalize(&raw);
                debug!(
                    category = %category,
                    backend,
                    predictions = predictions.len(),
                    top_confidence = predictions.top_confidence(),
                    "Backend call succeeded"
                );
                CategoryResult::new(category, predictions)
            }
            Err(e) => {
                warn!(
                    category = %category,
                    backend,
                    error = %e,
                    "Backend call failed (per-category error isolation)"
                );
                CategoryResult::failed(category, e.to_string())
            }
        }
    }

    /// Ensemble selection and decision policy over settled results
    fn compose(&self, results: Vec<CategoryResult>) -> Verdict {
        if results.iter().all(CategoryResult::is_failure) {
            let failures: Vec<BackendFailure> = results
                .into_iter()
                .map(|r| BackendFailure {
                    category: r.category,
                    reason: r.failure.unwrap_or_default(),
                })
                .collect();
            warn!(failures = failures.len(), "Every classification backend failed");
            return Verdict::indeterminate(self.primary_category(), failures);
        }

        let Some(winner) = ensemble::select(results) else {
            return Verdict::indeterminate(self.primary_category(), Vec::new());
        };

        let decision = policy::decide(winner.predictions, &self.config.thresholds);
        Verdict::decided(
            winner.category,
            decision.is_unknown,
            decision.possible_mix,
            decision.predictions,
        )
    }

    /// Highest-priority category
    fn primary_category(&self) -> Category {
        // Safe: construction rejects an empty backend list
        self.backends[0].category.clone()
    }
}
