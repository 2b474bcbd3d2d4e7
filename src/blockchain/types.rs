//! Chain-specific types.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Position of a block in the canonical chain.
pub type Height = u64;

/// Host-assigned identifier of a custodial wallet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WalletId(pub String);

impl From<&str> for WalletId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for WalletId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for WalletId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single value transfer inside a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub source_address: String,
    pub destination_address: String,
    /// Amount in minor units (nanotons).
    pub amount: u64,
    pub transaction_hash: String,
    pub block_height: Height,
    /// Position of the transfer inside its transaction.
    pub operation_index: u32,
    /// Optional text comment attached to the transfer.
    pub comment: Option<String>,
}

/// A block with its transfers in chain order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub height: Height,
    pub hash: String,
    pub transfers: Vec<Transfer>,
}

/// On-chain state of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountState {
    /// Balance in minor units.
    #[serde(deserialize_with = "amount_from_json")]
    pub balance: u64,
}

/// Deterministic identifier of a signed transaction (hex SHA-256 of its payload).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(pub String);

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TransactionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A chain-ready signed transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
    pub transaction_id: TransactionId,
    pub raw_payload: Vec<u8>,
    pub sequence_number: u64,
    /// Unix time after which the chain no longer accepts the message.
    pub expires_at: u64,
}

/// Transaction confirmation status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConfirmationStatus {
    /// Known to the node but not yet included.
    Pending,
    /// Included in a block.
    Confirmed { block_height: Height },
    /// Rejected, reverted or expired.
    Failed { reason: String },
    /// Not visible on the node.
    NotFound,
}

impl ConfirmationStatus {
    /// Confirmed and failed outcomes never change.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ConfirmationStatus::Confirmed { .. } | ConfirmationStatus::Failed { .. }
        )
    }
}

/// Accept amounts as JSON numbers or decimal strings.
pub(crate) fn amount_from_json<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Amount {
        Number(u64),
        Text(String),
    }

    match Amount::deserialize(deserializer)? {
        Amount::Number(n) => Ok(n),
        Amount::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid amount '{}'", s))),
    }
}
