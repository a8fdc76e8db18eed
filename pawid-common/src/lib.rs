//! # PawID Common Library
//!
//! Shared code for the PawID classification services:
//! - Bootstrap configuration (TOML + environment overrides)
//! - Logging initialization
//! - Common error type

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
