//! Withdrawal types and errors.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::blockchain::transaction::BuildError;
use crate::blockchain::types::{SignedTransaction, TransactionId, WalletId};
use crate::rpc::RpcError;

/// A custodial wallet known to the service. Holds no key material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletAccount {
    pub id: WalletId,
    /// On-chain address of the wallet contract.
    pub address: String,
}

/// Outgoing transfer requested by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalRequest {
    pub wallet_id: WalletId,
    pub destination_address: String,
    /// Amount in minor units.
    pub amount: u64,
    /// Sequence number the host expects; must match the chain when set.
    #[serde(default)]
    pub sequence_number: Option<u64>,
    /// Unix expiry of the signed message. Supplying it makes replays
    /// produce the same transaction id.
    #[serde(default)]
    pub expires_at: Option<u64>,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Errors raised by the wallet service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("unknown wallet '{0}'")]
    UnknownWallet(WalletId),

    #[error("insufficient balance: have {balance}, need {required}")]
    InsufficientBalance { balance: u64, required: u64 },

    #[error("stale sequence number: request has {requested}, chain has {current}")]
    StaleSequence { requested: u64, current: u64 },

    /// The node refused the transaction. Resubmit with a fresh sequence number.
    #[error("broadcast rejected ({code}): {message}")]
    BroadcastRejected { code: i64, message: String },

    /// The payload may have reached the node; poll before resubmitting.
    #[error("broadcast outcome unknown for {}: {reason}", .transaction.transaction_id)]
    BroadcastOutcomeUnknown {
        transaction: Box<SignedTransaction>,
        reason: String,
    },

    #[error("transaction {0} not confirmed within {1:?}")]
    ConfirmationTimeout(TransactionId, Duration),
}

/// Result type for wallet operations.
pub type WalletResult<T> = Result<T, WalletError>;
