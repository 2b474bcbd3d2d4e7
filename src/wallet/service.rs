//! Withdrawal orchestration.
//!
//! # Responsibilities
//! - Keep the directory of custodial wallets (addresses only)
//! - Serialize balance check → seqno → build → broadcast per wallet
//! - Track broadcast transactions until a terminal outcome
//!
//! # Design Decisions
//! - Broadcast failures are never retried here with stale inputs; the caller
//!   fetches a fresh sequence number and resubmits
//! - The send runs in its own task so a dropped caller cannot cut it short

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::time::{interval, timeout};

use crate::blockchain::client::Ledger;
use crate::blockchain::transaction::TransactionBuilder;
use crate::blockchain::types::{ConfirmationStatus, SignedTransaction, TransactionId, WalletId};
use crate::blockchain::wallet::WalletSecret;
use crate::config::WalletConfig;
use crate::observability::metrics;
use crate::resilience::retries::is_transient_code;
use crate::rpc::RpcError;
use crate::wallet::confirmation::ConfirmationTracker;
use crate::wallet::locks::WalletLocks;
use crate::wallet::types::{WalletAccount, WalletError, WalletResult, WithdrawalRequest};

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

pub struct WalletService {
    ledger: Arc<dyn Ledger>,
    builder: TransactionBuilder,
    config: WalletConfig,
    wallets: DashMap<WalletId, WalletAccount>,
    locks: WalletLocks,
    tracker: ConfirmationTracker,
}

impl WalletService {
    pub fn new(ledger: Arc<dyn Ledger>, builder: TransactionBuilder, config: WalletConfig) -> Self {
        let tracker = ConfirmationTracker::new(
            config.expiry_grace_secs,
            config.confirmation_retention_secs,
        );
        Self {
            ledger,
            builder,
            config,
            wallets: DashMap::new(),
            locks: WalletLocks::new(),
            tracker,
        }
    }

    /// Add or replace a wallet in the directory.
    pub fn register_wallet(&self, account: WalletAccount) {
        tracing::info!(wallet_id = %account.id, address = %account.address, "Wallet registered");
        self.wallets.insert(account.id.clone(), account);
    }

    fn account(&self, wallet_id: &WalletId) -> WalletResult<WalletAccount> {
        self.wallets
            .get(wallet_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| WalletError::UnknownWallet(wallet_id.clone()))
    }

    /// Current on-chain sequence counter of the wallet.
    pub async fn get_sequence_number(&self, wallet_id: &WalletId) -> WalletResult<u64> {
        let account = self.account(wallet_id)?;
        Ok(self.ledger.get_account_sequence(&account.address).await?)
    }

    /// On-chain balance of the wallet in minor units.
    pub async fn get_balance(&self, wallet_id: &WalletId) -> WalletResult<u64> {
        let account = self.account(wallet_id)?;
        Ok(self.ledger.get_account_state(&account.address).await?.balance)
    }

    /// Sign and broadcast a withdrawal.
    ///
    /// Holds the wallet's lock from the balance check until the node has
    /// answered the broadcast, so concurrent requests for one wallet never
    /// sign with the same sequence number.
    pub async fn submit_withdrawal(
        &self,
        request: WithdrawalRequest,
        secret: WalletSecret,
    ) -> WalletResult<SignedTransaction> {
        let account = self.account(&request.wallet_id)?;
        let lock = self.locks.for_wallet(&request.wallet_id);
        let _guard = lock.lock().await;

        let state = self.ledger.get_account_state(&account.address).await?;
        let required = request.amount.saturating_add(self.config.min_fee_reserve);
        if state.balance < required {
            tracing::warn!(
                wallet_id = %request.wallet_id,
                balance = state.balance,
                required,
                "Insufficient balance for withdrawal"
            );
            metrics::record_withdrawal("insufficient_balance");
            return Err(WalletError::InsufficientBalance {
                balance: state.balance,
                required,
            });
        }

        let sequence_number = self.ledger.get_account_sequence(&account.address).await?;
        if let Some(requested) = request.sequence_number {
            if requested != sequence_number {
                metrics::record_withdrawal("stale_sequence");
                return Err(WalletError::StaleSequence {
                    requested,
                    current: sequence_number,
                });
            }
        }

        let expires_at = request
            .expires_at
            .unwrap_or_else(|| unix_now() + self.config.withdrawal_ttl_secs);
        let transaction = self.builder.build_with_comment(
            secret,
            &request.destination_address,
            request.amount,
            sequence_number,
            expires_at,
            request.comment.as_deref(),
        )?;

        tracing::info!(
            wallet_id = %request.wallet_id,
            sequence_number,
            transaction_id = %transaction.transaction_id,
            amount = request.amount,
            "Broadcasting withdrawal"
        );
        self.broadcast(&transaction).await?;
        Ok(transaction)
    }

    /// Resume tracking a transaction broadcast before a restart.
    ///
    /// Nothing is sent. Later polls apply the expiry rule to it again, so a
    /// message that never reached the chain ends up failed instead of
    /// reporting not found forever.
    pub fn track(&self, transaction: &SignedTransaction) {
        self.tracker.track(transaction);
        tracing::debug!(
            transaction_id = %transaction.transaction_id,
            expires_at = transaction.expires_at,
            "Tracking withdrawal"
        );
    }

    /// Hand a signed transaction to the node without retrying rejections.
    pub async fn broadcast(&self, transaction: &SignedTransaction) -> WalletResult<()> {
        let pruned = self.tracker.prune(unix_now());
        if pruned > 0 {
            tracing::debug!(pruned, "Dropped settled withdrawals from tracker");
        }
        self.tracker.track(transaction);

        let ledger = Arc::clone(&self.ledger);
        let payload = transaction.raw_payload.clone();
        let send = tokio::spawn(async move { ledger.send_transaction(&payload).await });

        let unknown = |reason: String| {
            metrics::record_withdrawal("unknown");
            tracing::warn!(
                transaction_id = %transaction.transaction_id,
                reason = %reason,
                "Broadcast outcome unknown, poll before resubmitting"
            );
            WalletError::BroadcastOutcomeUnknown {
                transaction: Box::new(transaction.clone()),
                reason,
            }
        };

        match send.await {
            Ok(Ok(())) => {
                metrics::record_withdrawal("broadcast");
                Ok(())
            }
            Ok(Err(RpcError::Node { code, message })) if !is_transient_code(code) => {
                metrics::record_withdrawal("rejected");
                tracing::warn!(
                    transaction_id = %transaction.transaction_id,
                    code,
                    message = %message,
                    "Broadcast rejected by node"
                );
                self.tracker.reject(
                    &transaction.transaction_id,
                    format!("rejected: {}", message),
                    unix_now(),
                );
                Err(WalletError::BroadcastRejected { code, message })
            }
            Ok(Err(e)) => Err(unknown(e.to_string())),
            Err(e) => Err(unknown(e.to_string())),
        }
    }

    /// Current confirmation status of `transaction_id`.
    pub async fn poll_confirmation(
        &self,
        transaction_id: &TransactionId,
    ) -> WalletResult<ConfirmationStatus> {
        if let Some(status) = self.tracker.terminal(transaction_id) {
            return Ok(status);
        }

        let observed = self.ledger.get_transaction_status(transaction_id).await?;
        let status = self.tracker.observe(transaction_id, observed, unix_now());
        tracing::debug!(transaction_id = %transaction_id, status = ?status, "Polled confirmation");

        Ok(status)
    }

    /// Poll until a terminal status or until `max_wait` elapses.
    ///
    /// Transient RPC failures are logged and polling continues. Dropping the
    /// returned future stops polling.
    pub async fn wait_for_confirmation(
        &self,
        transaction_id: &TransactionId,
        poll_interval: Duration,
        max_wait: Duration,
    ) -> WalletResult<ConfirmationStatus> {
        let result = timeout(max_wait, async {
            let mut ticker = interval(poll_interval);

            loop {
                ticker.tick().await;

                match self.poll_confirmation(transaction_id).await {
                    Ok(status) if status.is_terminal() => return Ok(status),
                    Ok(status) => {
                        tracing::debug!(transaction_id = %transaction_id, status = ?status, "Waiting for confirmation");
                    }
                    Err(WalletError::Rpc(e)) if e.is_transient() => {
                        tracing::warn!(transaction_id = %transaction_id, error = %e, "Confirmation poll failed, retrying");
                    }
                    Err(e) => return Err(e),
                }
            }
        })
        .await;

        match result {
            Ok(status) => status,
            Err(_) => Err(WalletError::ConfirmationTimeout(
                transaction_id.clone(),
                max_wait,
            )),
        }
    }
}

impl std::fmt::Debug for WalletService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletService")
            .field("wallets", &self.wallets.len())
            .field("min_fee_reserve", &self.config.min_fee_reserve)
            .finish()
    }
}
