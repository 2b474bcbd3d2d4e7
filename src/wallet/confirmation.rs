//! Confirmation tracking for broadcast transactions.
//!
//! # Rules
//! - A transaction this service broadcast (or the host re-registered after a
//!   restart) that the node cannot see yet is pending, until its expiry plus
//!   a grace period has passed
//! - Confirmed and failed outcomes are sticky; later polls never regress
//! - Transactions never tracked here report the node's view and are not stored
//! - Settled entries are dropped once the retention window has passed

use dashmap::DashMap;

use crate::blockchain::types::{ConfirmationStatus, SignedTransaction, TransactionId};

#[derive(Debug, Clone)]
struct Tracked {
    expires_at: u64,
    status: ConfirmationStatus,
    /// Unix time the status became terminal.
    settled_at: Option<u64>,
}

#[derive(Debug, Default)]
pub struct ConfirmationTracker {
    entries: DashMap<TransactionId, Tracked>,
    expiry_grace_secs: u64,
    retention_secs: u64,
}

impl ConfirmationTracker {
    pub fn new(expiry_grace_secs: u64, retention_secs: u64) -> Self {
        Self {
            entries: DashMap::new(),
            expiry_grace_secs,
            retention_secs,
        }
    }

    /// Start tracking a transaction. Existing entries are left untouched.
    pub fn track(&self, transaction: &SignedTransaction) {
        self.entries
            .entry(transaction.transaction_id.clone())
            .or_insert(Tracked {
                expires_at: transaction.expires_at,
                status: ConfirmationStatus::Pending,
                settled_at: None,
            });
    }

    /// Record that the node refused the transaction.
    pub fn reject(&self, transaction_id: &TransactionId, reason: String, now: u64) {
        self.entries.insert(
            transaction_id.clone(),
            Tracked {
                expires_at: 0,
                status: ConfirmationStatus::Failed { reason },
                settled_at: Some(now),
            },
        );
    }

    pub fn is_tracked(&self, transaction_id: &TransactionId) -> bool {
        self.entries.contains_key(transaction_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Terminal status already recorded for `transaction_id`.
    pub fn terminal(&self, transaction_id: &TransactionId) -> Option<ConfirmationStatus> {
        self.entries
            .get(transaction_id)
            .map(|entry| entry.status.clone())
            .filter(ConfirmationStatus::is_terminal)
    }

    /// Fold a fresh node observation into the tracked status.
    pub fn observe(
        &self,
        transaction_id: &TransactionId,
        observed: ConfirmationStatus,
        now: u64,
    ) -> ConfirmationStatus {
        let Some(mut entry) = self.entries.get_mut(transaction_id) else {
            return observed;
        };
        if entry.status.is_terminal() {
            return entry.status.clone();
        }

        let next = match observed {
            ConfirmationStatus::NotFound
                if now > entry.expires_at.saturating_add(self.expiry_grace_secs) =>
            {
                ConfirmationStatus::Failed {
                    reason: "expired before inclusion".to_string(),
                }
            }
            ConfirmationStatus::NotFound | ConfirmationStatus::Pending => ConfirmationStatus::Pending,
            terminal => terminal,
        };
        if next.is_terminal() {
            entry.settled_at = Some(now);
        }
        entry.status = next.clone();
        next
    }

    /// Drop entries settled more than the retention window ago.
    ///
    /// Returns the number of entries removed.
    pub fn prune(&self, now: u64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, tracked| match tracked.settled_at {
            Some(settled_at) => now.saturating_sub(settled_at) < self.retention_secs,
            None => true,
        });
        before.saturating_sub(self.entries.len())
    }
}
