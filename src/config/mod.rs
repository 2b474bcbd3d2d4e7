//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! TOML text owned by the host
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AdapterConfig (validated, immutable)
//!     → sections handed to rpc, scanner and wallet service
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::AdapterConfig;
pub use schema::{ChainConfig, CurrencyConfig, Network, ObservabilityConfig, RpcConfig, WalletConfig};
