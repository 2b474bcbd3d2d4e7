//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Node call:
//!     → rpc client enforces the per-call timeout
//!     → On failure: retries.rs (check if transient, wait a jittered
//!       doubling delay, try again)
//! ```

pub mod retries;

pub use retries::RetryPolicy;
