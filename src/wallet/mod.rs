//! Withdrawal subsystem.
//!
//! # Data Flow
//! ```text
//! WithdrawalRequest
//!     → service.rs (per-wallet lock held through broadcast)
//!         → balance check, seqno fetch, TransactionBuilder, Ledger::send_transaction
//!     → confirmation.rs (tracks broadcast ids until a terminal status)
//! ```

pub mod confirmation;
pub mod locks;
pub mod service;
pub mod types;

pub use confirmation::ConfirmationTracker;
pub use locks::WalletLocks;
pub use service::WalletService;
pub use types::{WalletAccount, WalletError, WalletResult, WithdrawalRequest};
