//! Ledger node RPC transport.
//!
//! # Data Flow
//! ```text
//! blockchain::client (typed ledger methods)
//!     → client.rs (JSON-RPC envelope, timeout, retry with backoff)
//!     → error.rs (Unavailable / Node / Malformed classification)
//! ```
//!
//! # Design Decisions
//! - Stateless: no caching, every call reflects current node state
//! - Transient failures retried with bounded, jittered backoff
//! - Request-side errors reported by the node propagate immediately

pub mod client;
pub mod error;

pub use client::RpcClient;
pub use error::{RpcError, RpcResult};
