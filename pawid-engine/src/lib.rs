//! pawid-engine - pet photo classification engine
//!
//! Reconciles heterogeneous image-classification backend outputs into one verdict:
//! species, likely breeds, and flags for "unknown" and "possible mixed breed".
//!
//! # Architecture
//! - **normalizer** - upstream JSON → sorted prediction set
//! - **ensemble** - per-category results → winning category
//! - **policy** - thresholds → unknown / mix flags, bounded top-N
//! - **orchestrator** - concurrent backend fan-out and verdict assembly
//! - **backends** - backend trait and the Roboflow REST client
//! - **image** - input image validation

pub mod backends;
pub mod ensemble;
pub mod error;
pub mod image;
pub mod normalizer;
pub mod orchestrator;
pub mod policy;
pub mod types;

pub use crate::backends::{BackendError, ClassificationBackend, RoboflowClient};
pub use crate::error::{ConfigError, EngineError, EngineResult, ImageError};
pub use crate::image::{ImageInput, ImageLimits};
pub use crate::orchestrator::{Classifier, ClassifierConfig, RegisteredBackend};
pub use crate::policy::DecisionThresholds;
pub use crate::types::{
    BackendFailure, Category, CategoryResult, Prediction, PredictionSet, Verdict, VerdictStatus,
};
