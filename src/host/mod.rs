//! Host platform bridge.
//!
//! # Data Flow
//! ```text
//! BlockScanner ──emit_deposit / cursor──▶ bridge.rs (HostBridge, implemented by the host)
//! DepositRecord / SignedTransaction ──▶ records.rs (host record shapes, decimal amounts)
//! ```

pub mod bridge;
pub mod records;

pub use bridge::{HostBridge, HostError};
pub use records::{amount_from_decimal, amount_to_decimal, AmountError, HostDeposit, HostWithdrawal};
