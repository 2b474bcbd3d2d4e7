//! TON blockchain adapter core.
//!
//! Detects deposits to custodial addresses and signs, broadcasts and tracks
//! withdrawals for a host exchange platform.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────── TonAdapter ─────────────────────────┐
//!   host ────────▶│  deposits::BlockScanner        wallet::WalletService        │
//!  (HostBridge)   │      │                             │                        │
//!                 │      ▼                             ▼                        │
//!                 │  blockchain::Ledger ◀── blockchain::TransactionBuilder       │
//!                 │      │                  (AddressCodec, WalletSecret)        │
//!                 │      ▼                                                      │
//!                 │  rpc::RpcClient (timeout, retry, backoff) ─────────────────┼──▶ TON node
//!                 └─────────────────────────────────────────────────────────────┘
//! ```

pub mod adapter;
pub mod blockchain;
pub mod config;
pub mod deposits;
pub mod host;
pub mod observability;
pub mod resilience;
pub mod rpc;
pub mod wallet;

pub use adapter::{AdapterError, BlockchainAdapter, TonAdapter};
pub use config::AdapterConfig;
pub use deposits::{BlockScanner, DepositRecord, ScanReport};
pub use host::HostBridge;
pub use rpc::RpcClient;
pub use wallet::{WalletService, WithdrawalRequest};
