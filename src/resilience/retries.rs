//! Retry logic.
//!
//! # Responsibilities
//! - Decide whether a failed attempt may be retried
//! - Compute the delay before the next attempt
//!
//! # Design Decisions
//! - Only transient failures are retried (transport, timeout, 5xx, 429)
//! - Request-side errors reported by the node propagate on the first attempt
//! - Bounded attempts; jittered backoff prevents thundering herd

use rand::Rng;
use std::time::Duration;

use crate::config::RpcConfig;

/// JSON-RPC "internal error" code.
pub const JSONRPC_INTERNAL_ERROR: i64 = -32603;

/// Bounded retry policy for node calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first.
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl RetryPolicy {
    pub fn from_config(config: &RpcConfig) -> Self {
        Self {
            max_attempts: config.max_retry_attempts.max(1),
            base_delay_ms: config.backoff_base_ms,
            max_delay_ms: config.backoff_cap_ms,
        }
    }

    /// Whether another attempt is allowed after `attempts` failed ones.
    pub fn should_retry(&self, attempts: u32, transient: bool) -> bool {
        transient && attempts < self.max_attempts
    }

    /// Delay to wait after `attempts` failed attempts.
    ///
    /// The base delay doubles with each failure up to `max_delay_ms`, then up
    /// to a tenth of that is added at random so clients that failed together
    /// do not retry together.
    pub fn delay(&self, attempts: u32) -> Duration {
        let Some(doublings) = attempts.checked_sub(1) else {
            return Duration::ZERO;
        };
        let ceiling = 1u64
            .checked_shl(doublings)
            .and_then(|factor| self.base_delay_ms.checked_mul(factor))
            .map_or(self.max_delay_ms, |ms| ms.min(self.max_delay_ms));

        let spread = ceiling / 10;
        let jitter = if spread == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=spread)
        };
        Duration::from_millis(ceiling.saturating_add(jitter))
    }
}

/// Whether an HTTP status indicates a transient node-side problem.
pub fn is_transient_status(status: u16) -> bool {
    status == 429 || (500..=599).contains(&status)
}

/// Whether an error code reported inside a JSON-RPC error object is transient.
///
/// Some gateways echo the HTTP status as the error code, so 5xx codes count
/// as server-side failures alongside the JSON-RPC internal error.
pub fn is_transient_code(code: i64) -> bool {
    code == JSONRPC_INTERNAL_ERROR || (500..=599).contains(&code)
}
