//! Error types for pawid-engine
//!
//! Only two conditions fail a classification request outright: an invalid input
//! image and cancellation. Backend failures never surface here; they become
//! zero-confidence category results or an indeterminate verdict.

use thiserror::Error;

/// Named configuration failures, raised eagerly at engine construction
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No API key in the config file or `ROBOFLOW_API_KEY`
    #[error("Missing Roboflow API key (set roboflow.api_key or ROBOFLOW_API_KEY)")]
    MissingApiKey,

    /// No categories to query
    #[error("No classification categories configured")]
    NoCategories,

    /// Same category registered twice
    #[error("Category registered more than once: {0}")]
    DuplicateCategory(String),

    /// Category entry with a blank model id
    #[error("Empty model id for category: {0}")]
    EmptyModelId(String),

    /// Threshold outside 0.0-1.0 (or NaN)
    #[error("Threshold {name} out of range 0.0-1.0: {value}")]
    ThresholdOutOfRange { name: &'static str, value: f64 },

    /// `top_n` of zero would always return an empty list
    #[error("top_n must be at least 1")]
    InvalidTopN,

    /// min/max image size limits inconsistent
    #[error("Invalid image limits: min_bytes {min} > max_bytes {max}")]
    InvalidImageLimits { min: usize, max: usize },

    /// Requests-per-second of zero
    #[error("requests_per_second must be at least 1")]
    InvalidRateLimit,

    /// A zero timeout would fail every backend call
    #[error("Backend call timeout must be non-zero")]
    InvalidTimeout,

    /// HTTP client could not be built
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),

    /// Bootstrap config could not be loaded
    #[error("Common error: {0}")]
    Common(#[from] pawid_common::Error),
}

/// Input image rejected before any backend call
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImageError {
    /// No bytes at all
    #[error("No image provided")]
    Empty,

    /// Below the minimum size floor
    #[error("Image too small: {size} bytes (minimum {min})")]
    TooSmall { size: usize, min: usize },

    /// Above the upload limit
    #[error("Image too large: {size} bytes (maximum {max})")]
    TooLarge { size: usize, max: usize },

    /// Base64 payload could not be decoded
    #[error("Invalid base64 image data: {0}")]
    InvalidBase64(String),

    /// Bytes are not a recognized image format
    #[error("Unrecognized image format")]
    UnrecognizedFormat,
}

/// Classification request failures
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid image: {0}")]
    InvalidImage(#[from] ImageError),

    /// Caller cancelled the request; outstanding backend calls were dropped
    #[error("Classification cancelled")]
    Cancelled,
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
