//! Configuration schema definitions.
//!
//! Every option the adapter recognizes is enumerated here. Unknown keys are
//! rejected at parse time so typos in a host's config file surface early.

use serde::{Deserialize, Serialize};

/// Root configuration for the TON adapter.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct AdapterConfig {
    /// Ledger node RPC settings.
    pub rpc: RpcConfig,

    /// Chain parameters used by the block scanner.
    pub chain: ChainConfig,

    /// Currency handled by this adapter instance.
    pub currency: CurrencyConfig,

    /// Withdrawal settings.
    pub wallet: WalletConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Ledger node RPC configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RpcConfig {
    /// JSON-RPC endpoint URL.
    pub endpoint: String,

    /// Total attempts per call, including the first one.
    pub max_retry_attempts: u32,

    /// Base delay for exponential backoff.
    pub backoff_base_ms: u64,

    /// Upper bound for a single backoff delay.
    pub backoff_cap_ms: u64,

    /// Per-call timeout.
    pub request_timeout_ms: u64,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8081/jsonRPC".to_string(),
            max_retry_attempts: 3,
            backoff_base_ms: 200,
            backoff_cap_ms: 5_000,
            request_timeout_ms: 10_000,
        }
    }
}

/// Network the adapter talks to. Affects the canonical address form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
}

/// Chain parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChainConfig {
    pub network: Network,

    /// Blocks that must follow a block before it is scanned.
    pub finality_depth: u64,

    /// First height to scan when the host has no stored cursor.
    /// When unset the scanner starts at the current safe height.
    pub start_height: Option<u64>,

    /// Upper bound on blocks processed in one scan cycle.
    pub max_blocks_per_scan: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            network: Network::Mainnet,
            finality_depth: 6,
            start_height: None,
            max_blocks_per_scan: 100,
        }
    }
}

/// Currency metadata needed to translate amounts for the host.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CurrencyConfig {
    /// Host currency code.
    pub id: String,

    /// Minor units per whole coin (1 TON = 10^9 nanotons).
    pub base_factor: u64,

    /// Deposits below this amount (minor units) are ignored.
    pub min_deposit_amount: u64,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            id: "ton".to_string(),
            base_factor: 1_000_000_000,
            min_deposit_amount: 0,
        }
    }
}

/// Withdrawal configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct WalletConfig {
    /// Wallet contract subwallet id embedded in every message.
    pub subwallet_id: u32,

    /// Balance that must remain on the wallet to pay network fees.
    pub min_fee_reserve: u64,

    /// Lifetime of a signed message when the request carries no expiry.
    pub withdrawal_ttl_secs: u64,

    /// Extra time after expiry before an unseen transaction is declared failed.
    pub expiry_grace_secs: u64,

    /// How long a settled withdrawal stays in the confirmation tracker.
    pub confirmation_retention_secs: u64,

    /// Send withdrawals as bounceable messages.
    pub bounceable: bool,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            subwallet_id: 698_983_191,
            min_fee_reserve: 10_000_000,
            withdrawal_ttl_secs: 60,
            expiry_grace_secs: 120,
            confirmation_retention_secs: 86_400,
            bounceable: false,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
