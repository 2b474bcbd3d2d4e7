//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, attempts >= 1)
//! - Check the RPC endpoint is a usable http(s) URL
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AdapterConfig → Result<(), Vec<ValidationError>>

use thiserror::Error;
use url::Url;

use crate::config::schema::AdapterConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &AdapterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match Url::parse(&config.rpc.endpoint) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(ValidationError::new(
            "rpc.endpoint",
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new("rpc.endpoint", e.to_string())),
    }

    if config.rpc.max_retry_attempts == 0 {
        errors.push(ValidationError::new("rpc.max_retry_attempts", "must be at least 1"));
    }
    if config.rpc.request_timeout_ms == 0 {
        errors.push(ValidationError::new("rpc.request_timeout_ms", "must be greater than 0"));
    }
    if config.rpc.backoff_base_ms > config.rpc.backoff_cap_ms {
        errors.push(ValidationError::new(
            "rpc.backoff_base_ms",
            "must not exceed rpc.backoff_cap_ms",
        ));
    }
    if config.chain.max_blocks_per_scan == 0 {
        errors.push(ValidationError::new("chain.max_blocks_per_scan", "must be greater than 0"));
    }
    if config.currency.id.trim().is_empty() {
        errors.push(ValidationError::new("currency.id", "must not be empty"));
    }
    if config.currency.base_factor == 0 || !is_power_of_ten(config.currency.base_factor) {
        errors.push(ValidationError::new("currency.base_factor", "must be a power of 10"));
    }
    if config.wallet.withdrawal_ttl_secs == 0 {
        errors.push(ValidationError::new("wallet.withdrawal_ttl_secs", "must be greater than 0"));
    }
    if config.wallet.confirmation_retention_secs == 0 {
        errors.push(ValidationError::new(
            "wallet.confirmation_retention_secs",
            "must be greater than 0",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_power_of_ten(mut n: u64) -> bool {
    while n >= 10 && n % 10 == 0 {
        n /= 10;
    }
    n == 1
}
