//! Deposit detection.
//!
//! # Data Flow
//! ```text
//! host cursor ──▶ cursor.rs (finality-gated advancement)
//! Ledger blocks ──▶ scanner.rs (extract, emit, commit) ──▶ HostBridge
//! ```

pub mod cursor;
pub mod scanner;
pub mod types;

pub use cursor::Cursor;
pub use scanner::{extract_deposits, BlockScanner, WatchedAddresses};
pub use types::{DepositKey, DepositRecord, ScanError, ScanReport, ScanResult};
