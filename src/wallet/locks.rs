//! Per-wallet mutual exclusion.
//!
//! Reading the sequence number, signing and broadcasting form one critical
//! section per wallet; different wallets never block each other.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::blockchain::types::WalletId;

#[derive(Debug, Default)]
pub struct WalletLocks {
    inner: DashMap<WalletId, Arc<Mutex<()>>>,
}

impl WalletLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock guarding `wallet_id`, created on first use.
    pub fn for_wallet(&self, wallet_id: &WalletId) -> Arc<Mutex<()>> {
        Arc::clone(&self.inner.entry(wallet_id.clone()).or_default())
    }
}
