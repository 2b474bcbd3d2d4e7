//! JSON-RPC client for the ledger node.
//!
//! # Responsibilities
//! - Wrap every call in the JSON-RPC 2.0 envelope
//! - Enforce the per-call timeout (a timeout is a transient failure)
//! - Retry transient failures with exponential backoff and jitter
//! - Classify node answers into typed [`RpcError`]s

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::{sleep, timeout};
use url::Url;
use uuid::Uuid;

use crate::config::RpcConfig;
use crate::observability::metrics;
use crate::resilience::retries::{is_transient_status, RetryPolicy};
use crate::rpc::error::{RpcError, RpcResult};

/// Longest slice of an unparseable body kept in error messages.
const MAX_ERROR_BODY: usize = 256;

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    #[serde(default)]
    message: String,
}

/// Stateless JSON-RPC client.
#[derive(Clone)]
pub struct RpcClient {
    http: reqwest::Client,
    endpoint: Url,
    retry: RetryPolicy,
    timeout_duration: Duration,
}

impl RpcClient {
    /// Create a new client from the RPC section of the configuration.
    pub fn new(config: &RpcConfig) -> RpcResult<Self> {
        let endpoint: Url = config.endpoint.parse().map_err(|e| {
            RpcError::InvalidEndpoint(format!("'{}': {}", config.endpoint, e))
        })?;
        let timeout_duration = Duration::from_millis(config.request_timeout_ms);

        let http = reqwest::Client::builder()
            .timeout(timeout_duration)
            .no_proxy()
            .build()
            .map_err(|e| RpcError::InvalidEndpoint(e.to_string()))?;

        tracing::info!(
            endpoint = %endpoint,
            max_attempts = config.max_retry_attempts,
            timeout_ms = config.request_timeout_ms,
            "RPC client initialized"
        );

        Ok(Self {
            http,
            endpoint,
            retry: RetryPolicy::from_config(config),
            timeout_duration,
        })
    }

    /// Issue `method` with `params` and decode the `result` member.
    pub async fn call<P, R>(&self, method: &str, params: P) -> RpcResult<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let params = serde_json::to_value(params)
            .map_err(|e| RpcError::Malformed(format!("cannot encode params for {}: {}", method, e)))?;

        let mut attempts = 0;
        loop {
            attempts += 1;
            match self.call_once(method, &params).await {
                Ok(result) => {
                    metrics::record_rpc_request(method, "ok");
                    return serde_json::from_value(result)
                        .map_err(|e| RpcError::Malformed(format!("{}: {}", method, e)));
                }
                Err(e) if self.retry.should_retry(attempts, e.is_transient()) => {
                    let delay = self.retry.delay(attempts);
                    tracing::warn!(
                        method,
                        attempt = attempts,
                        delay = ?delay,
                        error = %e,
                        "Retrying RPC call"
                    );
                    metrics::record_rpc_retry(method);
                    sleep(delay).await;
                }
                Err(e) => {
                    let outcome = if e.is_transient() { "unavailable" } else { "error" };
                    metrics::record_rpc_request(method, outcome);
                    tracing::debug!(method, attempt = attempts, error = %e, "RPC call failed");
                    return Err(e);
                }
            }
        }
    }

    async fn call_once(&self, method: &str, params: &Value) -> RpcResult<Value> {
        let request = json!({
            "jsonrpc": "2.0",
            "id": Uuid::new_v4().to_string(),
            "method": method,
            "params": params,
        });

        match timeout(self.timeout_duration, self.exchange(&request)).await {
            Ok(result) => result,
            Err(_) => Err(RpcError::Unavailable(format!(
                "{} timed out after {}ms",
                method,
                self.timeout_duration.as_millis()
            ))),
        }
    }

    async fn exchange(&self, request: &Value) -> RpcResult<Value> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await
            .map_err(|e| RpcError::Unavailable(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RpcError::Unavailable(e.to_string()))?;

        if is_transient_status(status.as_u16()) {
            return Err(RpcError::Unavailable(format!("HTTP {}", status)));
        }

        let envelope: RpcResponse = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(RpcError::Node {
                    code: i64::from(status.as_u16()),
                    message: truncate(&body),
                })
            }
            Err(e) => return Err(RpcError::Malformed(e.to_string())),
        };

        if let Some(error) = envelope.error {
            return Err(RpcError::Node {
                code: error.code,
                message: error.message,
            });
        }

        match envelope.result {
            Some(result) => Ok(result),
            None if !status.is_success() => Err(RpcError::Node {
                code: i64::from(status.as_u16()),
                message: truncate(&body),
            }),
            None => Err(RpcError::Malformed(
                "response has neither result nor error".to_string(),
            )),
        }
    }

    /// Endpoint this client talks to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

fn truncate(body: &str) -> String {
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("max_attempts", &self.retry.max_attempts)
            .field("timeout", &self.timeout_duration)
            .finish()
    }
}
