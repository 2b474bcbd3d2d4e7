//! RPC error taxonomy.

use thiserror::Error;

use crate::resilience::retries::is_transient_code;

/// Errors returned by [`RpcClient`](crate::rpc::RpcClient).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RpcError {
    /// Network failure, timeout or a 5xx-equivalent answer.
    #[error("RPC unavailable: {0}")]
    Unavailable(String),

    /// Well-formed error object returned by the node.
    #[error("RPC error {code}: {message}")]
    Node { code: i64, message: String },

    /// The node answered with something that is not a valid response.
    #[error("Malformed RPC response: {0}")]
    Malformed(String),

    /// The endpoint URL or HTTP client could not be set up.
    #[error("Invalid RPC endpoint: {0}")]
    InvalidEndpoint(String),
}

impl RpcError {
    /// Whether the failure may succeed on a later attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            RpcError::Unavailable(_) => true,
            RpcError::Node { code, .. } => is_transient_code(*code),
            RpcError::Malformed(_) | RpcError::InvalidEndpoint(_) => false,
        }
    }
}

/// Result type for RPC operations.
pub type RpcResult<T> = Result<T, RpcError>;
