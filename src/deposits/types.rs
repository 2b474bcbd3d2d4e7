//! Deposit pipeline types.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::blockchain::types::Height;
use crate::host::HostError;
use crate::rpc::RpcError;

/// Idempotency key of a deposit: stable across scans and restarts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DepositKey {
    pub transaction_hash: String,
    pub operation_index: u32,
}

impl fmt::Display for DepositKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.transaction_hash, self.operation_index)
    }
}

/// A final incoming transfer to a watched address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositRecord {
    pub key: DepositKey,
    pub currency_id: String,
    /// Watched address exactly as the host supplied it.
    pub address: String,
    /// Sender in canonical form when it could be decoded.
    pub source_address: String,
    /// Amount in minor units.
    pub amount: u64,
    pub block_height: Height,
    pub comment: Option<String>,
}

/// Summary of one scan cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    /// Remote tip observed at the start of the cycle.
    pub tip: Height,
    /// First height processed in this cycle.
    pub from_height: Option<Height>,
    /// Cursor after the cycle (last processed height).
    pub cursor: Option<Height>,
    pub blocks_scanned: u64,
    pub deposits_emitted: usize,
}

impl ScanReport {
    pub(crate) fn record_block(&mut self, height: Height, deposits: usize) {
        self.from_height.get_or_insert(height);
        self.blocks_scanned += 1;
        self.deposits_emitted += deposits;
    }
}

/// Errors that end a scan cycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error(transparent)]
    Host(#[from] HostError),

    /// A height inside the unstable window was about to be processed.
    #[error("height {height} is inside the reorg window (tip {tip}, finality depth {finality_depth})")]
    ReorgWindowViolation {
        height: Height,
        tip: Height,
        finality_depth: u64,
    },

    /// Cursor advancement skipped or repeated a height.
    #[error("cursor expected height {expected}, got {actual}")]
    OutOfOrder { expected: Height, actual: Height },
}

impl ScanError {
    /// Invariant breaches halt scanning instead of being retried next cycle.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ScanError::ReorgWindowViolation { .. } | ScanError::OutOfOrder { .. }
        )
    }
}

/// Result type for scan operations.
pub type ScanResult<T> = Result<T, ScanError>;
