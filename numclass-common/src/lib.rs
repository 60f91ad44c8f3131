//! # numclass Common Library
//!
//! Shared code for the number classification service:
//! - Number token validation
//! - Classifier (primality, perfection, Armstrong, parity, digit sum)
//! - Configuration loading
//! - Common error types

pub mod classify;
pub mod config;
pub mod error;
pub mod number;

pub use classify::{classify, ClassificationResult, Property, PENDING_FUN_FACT};
pub use config::{DeliveryPolicy, LoggingConfig, ResponseFormat, TomlConfig, TriviaConfig};
pub use error::{Error, Result};
pub use number::parse_number_token;
