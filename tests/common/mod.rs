//! Shared fixtures for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet, VecDeque};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

use ton_adapter::blockchain::{
    AccountState, AddressCodec, Block, ConfirmationStatus, Height, Ledger, RawAddress,
    TransactionId, TransferMessage, Transfer,
};
use ton_adapter::blockchain::transaction::transaction_id;
use ton_adapter::config::{Network, RpcConfig};
use ton_adapter::deposits::DepositRecord;
use ton_adapter::host::{HostBridge, HostError};
use ton_adapter::rpc::{RpcError, RpcResult};

/// Node error code used when the mock ledger refuses a transaction.
pub const REJECT_CODE: i64 = -32000;

pub fn codec() -> AddressCodec {
    AddressCodec::new(Network::Mainnet, true)
}

/// Canonical address with every hash byte set to `byte`.
pub fn address(byte: u8) -> String {
    codec().encode(&RawAddress::new(0, [byte; 32]))
}

pub fn transfer(destination: &str, amount: u64, tx: &str, index: u32) -> Transfer {
    Transfer {
        source_address: address(0xee),
        destination_address: destination.to_string(),
        amount,
        transaction_hash: tx.to_string(),
        block_height: 0,
        operation_index: index,
        comment: None,
    }
}

#[derive(Debug, Clone)]
struct MockWallet {
    public_key: [u8; 32],
    balance: u64,
    sequence: u64,
}

#[derive(Debug, Default)]
struct LedgerState {
    tip: Height,
    blocks: HashMap<Height, Block>,
    failing_heights: HashSet<Height>,
    /// (height, tip at request time) for every block request.
    block_requests: Vec<(Height, Height)>,
    wallets: HashMap<String, MockWallet>,
    statuses: HashMap<TransactionId, VecDeque<ConfirmationStatus>>,
    accepted: Vec<TransferMessage>,
}

/// In-memory ledger that behaves like a wallet contract: it only accepts a
/// correctly signed message carrying the current sequence number.
#[derive(Debug, Default)]
pub struct MockLedger {
    state: Mutex<LedgerState>,
    sends: AtomicUsize,
    send_unavailable: AtomicBool,
    send_delay_ms: AtomicUsize,
}

impl MockLedger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_tip(&self, tip: Height) {
        self.state.lock().unwrap().tip = tip;
    }

    /// Add a block; transfers get their `block_height` filled in.
    pub fn push_block(&self, height: Height, transfers: Vec<Transfer>) {
        let transfers = transfers
            .into_iter()
            .map(|t| Transfer {
                block_height: height,
                ..t
            })
            .collect();
        self.state.lock().unwrap().blocks.insert(
            height,
            Block {
                height,
                hash: format!("block-{}", height),
                transfers,
            },
        );
    }

    pub fn fail_height(&self, height: Height) {
        self.state.lock().unwrap().failing_heights.insert(height);
    }

    pub fn heal(&self) {
        self.state.lock().unwrap().failing_heights.clear();
    }

    pub fn block_requests(&self) -> Vec<(Height, Height)> {
        self.state.lock().unwrap().block_requests.clone()
    }

    pub fn add_wallet(&self, address: &str, public_key: [u8; 32], balance: u64, sequence: u64) {
        self.state.lock().unwrap().wallets.insert(
            address.to_string(),
            MockWallet {
                public_key,
                balance,
                sequence,
            },
        );
    }

    pub fn sequence_of(&self, address: &str) -> u64 {
        self.state.lock().unwrap().wallets[address].sequence
    }

    pub fn balance_of(&self, address: &str) -> u64 {
        self.state.lock().unwrap().wallets[address].balance
    }

    /// Statuses returned by successive polls; the last one repeats.
    pub fn script_status(&self, id: &TransactionId, statuses: Vec<ConfirmationStatus>) {
        self.state
            .lock()
            .unwrap()
            .statuses
            .insert(id.clone(), statuses.into());
    }

    pub fn send_count(&self) -> usize {
        self.sends.load(Ordering::SeqCst)
    }

    pub fn accepted(&self) -> Vec<TransferMessage> {
        self.state.lock().unwrap().accepted.clone()
    }

    pub fn set_send_unavailable(&self, unavailable: bool) {
        self.send_unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn set_send_delay(&self, delay: Duration) {
        self.send_delay_ms
            .store(delay.as_millis() as usize, Ordering::SeqCst);
    }
}

#[async_trait]
impl Ledger for MockLedger {
    async fn chain_tip(&self) -> RpcResult<Height> {
        Ok(self.state.lock().unwrap().tip)
    }

    async fn get_block(&self, height: Height) -> RpcResult<Block> {
        let mut state = self.state.lock().unwrap();
        let tip = state.tip;
        state.block_requests.push((height, tip));
        if state.failing_heights.contains(&height) {
            return Err(RpcError::Unavailable(format!("block {} unavailable", height)));
        }
        Ok(state.blocks.get(&height).cloned().unwrap_or(Block {
            height,
            hash: format!("block-{}", height),
            transfers: Vec::new(),
        }))
    }

    async fn get_account_state(&self, address: &str) -> RpcResult<AccountState> {
        let state = self.state.lock().unwrap();
        Ok(AccountState {
            balance: state.wallets.get(address).map_or(0, |w| w.balance),
        })
    }

    async fn get_account_sequence(&self, address: &str) -> RpcResult<u64> {
        let state = self.state.lock().unwrap();
        Ok(state.wallets.get(address).map_or(0, |w| w.sequence))
    }

    async fn send_transaction(&self, raw_payload: &[u8]) -> RpcResult<()> {
        let delay = self.send_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay as u64)).await;
        }
        self.sends.fetch_add(1, Ordering::SeqCst);
        if self.send_unavailable.load(Ordering::SeqCst) {
            return Err(RpcError::Unavailable("connection reset".to_string()));
        }

        let mut state = self.state.lock().unwrap();
        let found = state.wallets.iter().find_map(|(address, wallet)| {
            TransferMessage::verify(raw_payload, &wallet.public_key)
                .ok()
                .map(|message| (address.clone(), message))
        });
        let Some((address, message)) = found else {
            return Err(RpcError::Node {
                code: REJECT_CODE,
                message: "signature does not match any wallet".to_string(),
            });
        };

        let wallet = state.wallets.get_mut(&address).unwrap();
        if u64::from(message.sequence_number) != wallet.sequence {
            return Err(RpcError::Node {
                code: REJECT_CODE,
                message: format!(
                    "seqno mismatch: message {} wallet {}",
                    message.sequence_number, wallet.sequence
                ),
            });
        }
        wallet.sequence += 1;
        wallet.balance = wallet.balance.saturating_sub(message.amount);

        let id = transaction_id(raw_payload);
        state
            .statuses
            .entry(id)
            .or_insert_with(|| VecDeque::from(vec![ConfirmationStatus::Pending]));
        state.accepted.push(message);
        Ok(())
    }

    async fn get_transaction_status(
        &self,
        transaction_id: &TransactionId,
    ) -> RpcResult<ConfirmationStatus> {
        let mut state = self.state.lock().unwrap();
        let Some(queue) = state.statuses.get_mut(transaction_id) else {
            return Ok(ConfirmationStatus::NotFound);
        };
        if queue.len() > 1 {
            Ok(queue.pop_front().unwrap())
        } else {
            Ok(queue.front().cloned().unwrap_or(ConfirmationStatus::NotFound))
        }
    }
}

/// Host platform that keeps everything in memory.
#[derive(Debug, Default)]
pub struct MemoryHost {
    watched: Mutex<HashSet<String>>,
    cursor: Mutex<Option<Height>>,
    deposits: Mutex<Vec<DepositRecord>>,
    fail_emit_height: Mutex<Option<Height>>,
    saves: AtomicUsize,
}

impl MemoryHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn watch(&self, address: &str) {
        self.watched.lock().unwrap().insert(address.to_string());
    }

    pub fn set_cursor(&self, height: Option<Height>) {
        *self.cursor.lock().unwrap() = height;
    }

    pub fn cursor(&self) -> Option<Height> {
        *self.cursor.lock().unwrap()
    }

    pub fn deposits(&self) -> Vec<DepositRecord> {
        self.deposits.lock().unwrap().clone()
    }

    pub fn fail_emit_at(&self, height: Option<Height>) {
        *self.fail_emit_height.lock().unwrap() = height;
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HostBridge for MemoryHost {
    async fn watched_addresses(&self) -> Result<HashSet<String>, HostError> {
        Ok(self.watched.lock().unwrap().clone())
    }

    async fn load_cursor(&self) -> Result<Option<Height>, HostError> {
        Ok(*self.cursor.lock().unwrap())
    }

    async fn save_cursor(&self, height: Height) -> Result<(), HostError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        *self.cursor.lock().unwrap() = Some(height);
        Ok(())
    }

    async fn emit_deposit(&self, deposit: &DepositRecord) -> Result<(), HostError> {
        if *self.fail_emit_height.lock().unwrap() == Some(deposit.block_height) {
            return Err(HostError("deposit store unavailable".to_string()));
        }
        self.deposits.lock().unwrap().push(deposit.clone());
        Ok(())
    }
}

/// JSON-RPC success body answering `request`.
pub fn rpc_result(request: &Value, result: Value) -> String {
    json!({ "jsonrpc": "2.0", "id": request["id"], "result": result }).to_string()
}

/// JSON-RPC error body answering `request`.
pub fn rpc_error(request: &Value, code: i64, message: &str) -> String {
    json!({
        "jsonrpc": "2.0",
        "id": request["id"],
        "error": { "code": code, "message": message }
    })
    .to_string()
}

/// Start a programmable JSON-RPC node on an ephemeral port.
///
/// The handler receives the decoded request and returns an HTTP status and
/// raw body.
pub async fn start_rpc_node<F, Fut>(handler: F) -> SocketAddr
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let handler = Arc::new(handler);
    let app = Router::new().route(
        "/jsonRPC",
        post(move |Json(request): Json<Value>| {
            let handler = Arc::clone(&handler);
            async move {
                let (status, body) = handler(request).await;
                (
                    StatusCode::from_u16(status).unwrap_or(StatusCode::OK),
                    body,
                )
            }
        }),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    addr
}

pub fn rpc_config(addr: SocketAddr) -> RpcConfig {
    RpcConfig {
        endpoint: format!("http://{}/jsonRPC", addr),
        max_retry_attempts: 3,
        backoff_base_ms: 10,
        backoff_cap_ms: 50,
        request_timeout_ms: 1_000,
    }
}
