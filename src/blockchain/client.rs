//! Typed ledger node surface.
//!
//! # Responsibilities
//! - Map ledger operations onto node RPC methods
//! - Decode node answers into chain types
//! - Provide health check for node connectivity
//!
//! [`Ledger`] is the seam the scanner and wallet service depend on;
//! [`LedgerClient`] is its production implementation over [`RpcClient`].

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Deserialize;
use serde_json::json;

use crate::blockchain::types::{
    amount_from_json, AccountState, Block, ConfirmationStatus, Height, TransactionId, Transfer,
};
use crate::rpc::{RpcClient, RpcError, RpcResult};

/// Node RPC method names.
pub mod methods {
    pub const GET_CHAIN_TIP: &str = "getChainTip";
    pub const GET_BLOCK: &str = "getBlock";
    pub const GET_ACCOUNT_STATE: &str = "getAccountState";
    pub const GET_ACCOUNT_SEQUENCE: &str = "getAccountSequence";
    pub const SEND_TRANSACTION: &str = "sendTransaction";
    pub const GET_TRANSACTION_STATUS: &str = "getTransactionStatus";
}

/// Read and write access to the ledger.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Height of the newest block known to the node.
    async fn chain_tip(&self) -> RpcResult<Height>;

    async fn get_block(&self, height: Height) -> RpcResult<Block>;

    async fn get_account_state(&self, address: &str) -> RpcResult<AccountState>;

    /// Current wallet sequence counter (seqno).
    async fn get_account_sequence(&self, address: &str) -> RpcResult<u64>;

    /// Hand a signed payload to the node for inclusion.
    async fn send_transaction(&self, raw_payload: &[u8]) -> RpcResult<()>;

    async fn get_transaction_status(
        &self,
        transaction_id: &TransactionId,
    ) -> RpcResult<ConfirmationStatus>;
}

#[derive(Debug, Deserialize)]
struct TipResponse {
    height: Height,
}

#[derive(Debug, Deserialize)]
struct BlockResponse {
    height: Height,
    hash: String,
    #[serde(default)]
    transfers: Vec<TransferResponse>,
}

#[derive(Debug, Deserialize)]
struct TransferResponse {
    source: String,
    destination: String,
    #[serde(deserialize_with = "amount_from_json")]
    amount: u64,
    transaction_hash: String,
    operation_index: u32,
    #[serde(default)]
    comment: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SequenceResponse {
    sequence: u64,
}

impl BlockResponse {
    fn into_block(self) -> Block {
        let height = self.height;
        Block {
            height,
            hash: self.hash,
            transfers: self
                .transfers
                .into_iter()
                .map(|t| Transfer {
                    source_address: t.source,
                    destination_address: t.destination,
                    amount: t.amount,
                    transaction_hash: t.transaction_hash,
                    block_height: height,
                    operation_index: t.operation_index,
                    comment: t.comment.filter(|c| !c.is_empty()),
                })
                .collect(),
        }
    }
}

/// Ledger access over the node's JSON-RPC endpoint.
#[derive(Debug, Clone)]
pub struct LedgerClient {
    rpc: RpcClient,
}

impl LedgerClient {
    pub fn new(rpc: RpcClient) -> Self {
        Self { rpc }
    }

    /// Check if the node is reachable and answers tip queries.
    pub async fn is_healthy(&self) -> bool {
        match self.chain_tip().await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(error = %e, endpoint = %self.rpc.endpoint(), "Ledger node unhealthy");
                false
            }
        }
    }
}

#[async_trait]
impl Ledger for LedgerClient {
    async fn chain_tip(&self) -> RpcResult<Height> {
        let tip: TipResponse = self.rpc.call(methods::GET_CHAIN_TIP, json!({})).await?;
        Ok(tip.height)
    }

    async fn get_block(&self, height: Height) -> RpcResult<Block> {
        let block: BlockResponse = self
            .rpc
            .call(methods::GET_BLOCK, json!({ "height": height }))
            .await?;
        if block.height != height {
            return Err(RpcError::Malformed(format!(
                "requested block {} but node returned {}",
                height, block.height
            )));
        }
        Ok(block.into_block())
    }

    async fn get_account_state(&self, address: &str) -> RpcResult<AccountState> {
        self.rpc
            .call(methods::GET_ACCOUNT_STATE, json!({ "address": address }))
            .await
    }

    async fn get_account_sequence(&self, address: &str) -> RpcResult<u64> {
        let seq: SequenceResponse = self
            .rpc
            .call(methods::GET_ACCOUNT_SEQUENCE, json!({ "address": address }))
            .await?;
        Ok(seq.sequence)
    }

    async fn send_transaction(&self, raw_payload: &[u8]) -> RpcResult<()> {
        let _: serde_json::Value = self
            .rpc
            .call(
                methods::SEND_TRANSACTION,
                json!({ "payload": STANDARD.encode(raw_payload) }),
            )
            .await?;
        Ok(())
    }

    async fn get_transaction_status(
        &self,
        transaction_id: &TransactionId,
    ) -> RpcResult<ConfirmationStatus> {
        self.rpc
            .call(
                methods::GET_TRANSACTION_STATUS,
                json!({ "transaction_id": transaction_id.0 }),
            )
            .await
    }
}
