//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! address.rs (raw ⇄ canonical strings, pure)
//! wallet.rs (secret key material, one signing call at a time)
//!     → transaction.rs (validate, serialize, sign, derive id; pure)
//! client.rs (typed node methods over the rpc module)
//! ```
//!
//! # Security Constraints
//! - Secrets are passed in by the caller and wiped after signing
//! - Never log private keys or sensitive data

pub mod address;
pub mod client;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use address::{AddressCodec, AddressError, RawAddress};
pub use client::{Ledger, LedgerClient};
pub use transaction::{BuildError, TransactionBuilder, TransferMessage};
pub use types::{
    AccountState, Block, ConfirmationStatus, Height, SignedTransaction, TransactionId, Transfer,
    WalletId,
};
pub use wallet::WalletSecret;
