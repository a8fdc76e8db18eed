//! Classification backends
//!
//! A backend takes a validated image and returns whatever JSON its upstream model
//! produced. The engine never looks inside the error: any `Err` becomes a
//! zero-confidence category result.
//!
//! # Backends
//! - **roboflow** - Roboflow hosted classification REST API

pub mod roboflow;

use crate::image::ImageInput;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

pub use roboflow::RoboflowClient;

/// Image classification backend for one category
#[async_trait]
pub trait ClassificationBackend: Send + Sync {
    /// Backend identifier for logging (e.g. "Roboflow:dog-breeds/3")
    fn name(&self) -> &str;

    /// Classify an image and return the raw upstream payload
    ///
    /// # Errors
    /// Returns `BackendError` on transport failure, non-success status or
    /// an unparseable body. Callers isolate the failure per category.
    async fn classify(&self, image: &ImageInput) -> Result<Value, BackendError>;
}

/// Backend call failure
#[derive(Debug, Error)]
pub enum BackendError {
    /// Connection, DNS or TLS failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Upstream answered with a non-2xx status
    #[error("Upstream returned HTTP {0}")]
    Status(u16),

    /// Response body was not JSON
    #[error("Invalid response body: {0}")]
    InvalidBody(String),

    /// No answer within the per-call timeout
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// Anything else a custom backend wants to report
    #[error("{0}")]
    Other(String),
}
