//! Adapter facade handed to the host platform.
//!
//! # Responsibilities
//! - Wire config, RPC client, scanner and wallet service together
//! - Expose one object-safe capability trait per blockchain
//!
//! The host holds an `Arc<dyn BlockchainAdapter>` and never touches the
//! modules behind it directly.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::blockchain::address::{AddressCodec, AddressError};
use crate::blockchain::client::{Ledger, LedgerClient};
use crate::blockchain::transaction::{BuildError, TransactionBuilder};
use crate::blockchain::types::{ConfirmationStatus, SignedTransaction, TransactionId, WalletId};
use crate::blockchain::wallet::WalletSecret;
use crate::config::validation::validate_config;
use crate::config::{load_config, AdapterConfig, ConfigError};
use crate::deposits::{BlockScanner, ScanError, ScanReport};
use crate::host::{AmountError, HostBridge};
use crate::observability::logging::init_logging;
use crate::rpc::{RpcClient, RpcError};
use crate::wallet::{WalletAccount, WalletError, WalletService, WithdrawalRequest};

/// Any failure surfaced through [`BlockchainAdapter`].
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error(transparent)]
    Address(#[from] AddressError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Amount(#[from] AmountError),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Wallet(#[from] WalletError),
}

/// Capabilities a blockchain integration offers the host.
#[async_trait]
pub trait BlockchainAdapter: Send + Sync {
    /// Run one deposit scan cycle.
    async fn scan(&self) -> Result<ScanReport, AdapterError>;

    /// Sign and broadcast a withdrawal.
    async fn build_withdrawal(
        &self,
        request: WithdrawalRequest,
        secret: WalletSecret,
    ) -> Result<SignedTransaction, AdapterError>;

    async fn poll_withdrawal(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<ConfirmationStatus, AdapterError>;

    /// Re-register a withdrawal the host persisted before a restart so that
    /// polling it applies the expiry rule again. Nothing is broadcast.
    fn resume_withdrawal(&self, transaction: &SignedTransaction);

    /// Balance of a registered wallet in minor units.
    async fn get_balance(&self, wallet_id: &WalletId) -> Result<u64, AdapterError>;
}

/// TON implementation of [`BlockchainAdapter`].
#[derive(Debug)]
pub struct TonAdapter {
    scanner: BlockScanner,
    wallets: WalletService,
    codec: AddressCodec,
    config: AdapterConfig,
}

impl TonAdapter {
    /// Validate `config` and connect to the node named in `config.rpc`.
    pub fn new(config: AdapterConfig, host: Arc<dyn HostBridge>) -> Result<Self, AdapterError> {
        validate_config(&config).map_err(ConfigError::Validation)?;
        let rpc = RpcClient::new(&config.rpc)?;
        let ledger: Arc<dyn Ledger> = Arc::new(LedgerClient::new(rpc));
        Ok(Self::with_ledger(config, ledger, host))
    }

    /// Load `path`, install logging at the configured level and connect.
    pub fn from_file(path: &Path, host: Arc<dyn HostBridge>) -> Result<Self, AdapterError> {
        let config = load_config(path)?;
        init_logging(&config.observability.log_level);
        Self::new(config, host)
    }

    /// Build on top of an existing ledger implementation.
    pub fn with_ledger(
        config: AdapterConfig,
        ledger: Arc<dyn Ledger>,
        host: Arc<dyn HostBridge>,
    ) -> Self {
        let scan_codec = AddressCodec::new(config.chain.network, true);
        let send_codec = AddressCodec::new(config.chain.network, config.wallet.bounceable);

        let scanner = BlockScanner::new(
            Arc::clone(&ledger),
            host,
            scan_codec,
            &config.chain,
            config.currency.clone(),
        );
        let builder = TransactionBuilder::new(send_codec, &config.wallet);
        let wallets = WalletService::new(ledger, builder, config.wallet.clone());

        tracing::info!(
            network = ?config.chain.network,
            currency = %config.currency.id,
            finality_depth = config.chain.finality_depth,
            "TON adapter initialized"
        );

        Self {
            scanner,
            wallets,
            codec: scan_codec,
            config,
        }
    }

    /// Register a custodial wallet. The address is stored in canonical form.
    pub fn register_wallet(&self, id: WalletId, address: &str) -> Result<(), AdapterError> {
        let address = self.codec.normalize(address)?;
        self.wallets.register_wallet(WalletAccount { id, address });
        Ok(())
    }

    pub fn scanner(&self) -> &BlockScanner {
        &self.scanner
    }

    pub fn wallets(&self) -> &WalletService {
        &self.wallets
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }
}

#[async_trait]
impl BlockchainAdapter for TonAdapter {
    async fn scan(&self) -> Result<ScanReport, AdapterError> {
        Ok(self.scanner.scan().await?)
    }

    async fn build_withdrawal(
        &self,
        request: WithdrawalRequest,
        secret: WalletSecret,
    ) -> Result<SignedTransaction, AdapterError> {
        Ok(self.wallets.submit_withdrawal(request, secret).await?)
    }

    async fn poll_withdrawal(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<ConfirmationStatus, AdapterError> {
        Ok(self.wallets.poll_confirmation(transaction_id).await?)
    }

    fn resume_withdrawal(&self, transaction: &SignedTransaction) {
        self.wallets.track(transaction);
    }

    async fn get_balance(&self, wallet_id: &WalletId) -> Result<u64, AdapterError> {
        Ok(self.wallets.get_balance(wallet_id).await?)
    }
}
