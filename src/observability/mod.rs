//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! rpc, deposits, wallet produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, gauges via the metrics facade)
//!
//! Consumers:
//!     → whatever subscriber / recorder the host installs
//! ```

pub mod logging;
pub mod metrics;
