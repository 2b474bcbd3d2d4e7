//! Block scanner.
//!
//! # Responsibilities
//! - Walk final blocks in ascending height order
//! - Extract transfers to watched addresses as deposit records
//! - Persist the cursor through the host once a cycle completes
//!
//! # Data Flow
//! ```text
//! load_cursor → chain_tip → safe height = tip - finality_depth
//!     → for each height in (cursor, safe]: get_block → extract → emit_deposit
//!     → save_cursor
//! ```
//!
//! # Design Decisions
//! - A failure anywhere in a cycle abandons it without saving the cursor;
//!   the next cycle re-emits the same blocks and the host dedups on the key
//! - Cursor invariant breaches are fatal and stop [`BlockScanner::run`]

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use crate::blockchain::address::{AddressCodec, RawAddress};
use crate::blockchain::client::Ledger;
use crate::blockchain::types::{Block, Height};
use crate::config::{ChainConfig, CurrencyConfig};
use crate::deposits::cursor::Cursor;
use crate::deposits::types::{DepositKey, DepositRecord, ScanReport, ScanResult};
use crate::host::HostBridge;
use crate::observability::metrics;
use crate::rpc::RpcError;

/// Watched addresses keyed by decoded address, mapped to the host's string.
pub type WatchedAddresses = HashMap<RawAddress, String>;

/// Scans final blocks for deposits to watched addresses.
pub struct BlockScanner {
    ledger: Arc<dyn Ledger>,
    host: Arc<dyn HostBridge>,
    codec: AddressCodec,
    finality_depth: u64,
    start_height: Option<Height>,
    max_blocks: u64,
    currency: CurrencyConfig,
}

impl BlockScanner {
    pub fn new(
        ledger: Arc<dyn Ledger>,
        host: Arc<dyn HostBridge>,
        codec: AddressCodec,
        chain: &ChainConfig,
        currency: CurrencyConfig,
    ) -> Self {
        Self {
            ledger,
            host,
            codec,
            finality_depth: chain.finality_depth,
            start_height: chain.start_height,
            max_blocks: chain.max_blocks_per_scan.max(1),
            currency,
        }
    }

    /// Run one scan cycle.
    pub async fn scan(&self) -> ScanResult<ScanReport> {
        match self.run_cycle().await {
            Ok(report) => {
                metrics::record_scan_cycle("completed");
                Ok(report)
            }
            Err(e) if e.is_fatal() => {
                metrics::record_scan_cycle("halted");
                tracing::error!(error = %e, "Scan invariant violated, scanning must halt");
                Err(e)
            }
            Err(e) => {
                metrics::record_scan_cycle("abandoned");
                tracing::warn!(error = %e, "Abandoning scan cycle; cursor left unchanged");
                Err(e)
            }
        }
    }

    /// Scan every `interval` until a fatal error. Drop the future to stop.
    pub async fn run(&self, interval: Duration) -> ScanResult<()> {
        tracing::info!(
            finality_depth = self.finality_depth,
            max_blocks = self.max_blocks,
            "Starting block scanner"
        );

        loop {
            if let Err(e) = self.scan().await {
                if e.is_fatal() {
                    return Err(e);
                }
            }

            sleep(interval).await;
        }
    }

    async fn run_cycle(&self) -> ScanResult<ScanReport> {
        let watched = self.watched_addresses().await?;
        let stored = self.host.load_cursor().await?;
        let tip = self.ledger.chain_tip().await?;

        let mut report = ScanReport {
            tip,
            cursor: stored,
            ..ScanReport::default()
        };

        let Some(safe) = Cursor::new(stored, self.finality_depth).safe_height(tip) else {
            tracing::debug!(tip, finality_depth = self.finality_depth, "No final blocks yet");
            return Ok(report);
        };

        let initial = match stored {
            Some(height) => Some(height),
            None => match self.start_height {
                Some(start) => start.checked_sub(1),
                None => safe.checked_sub(1),
            },
        };
        let mut cursor = Cursor::new(initial, self.finality_depth);

        let from = cursor.next_height();
        if from > safe {
            // First run: pin the starting point so later cycles resume from it.
            if stored.is_none() {
                if let Some(height) = initial {
                    self.host.save_cursor(height).await?;
                    report.cursor = Some(height);
                }
            }
            return Ok(report);
        }
        let to = safe.min(from.saturating_add(self.max_blocks - 1));

        for height in from..=to {
            cursor.ensure_final(height, tip)?;

            let block = self.ledger.get_block(height).await?;
            if block.height != height {
                return Err(RpcError::Malformed(format!(
                    "requested block {} but got {}",
                    height, block.height
                ))
                .into());
            }

            let deposits = extract_deposits(&block, &watched, &self.codec, &self.currency);
            for deposit in &deposits {
                self.host.emit_deposit(deposit).await?;
                tracing::info!(
                    key = %deposit.key,
                    address = %deposit.address,
                    amount = deposit.amount,
                    height,
                    "Deposit detected"
                );
            }
            metrics::record_deposits_emitted(deposits.len());

            cursor.advance(height, tip)?;
            report.record_block(height, deposits.len());
        }

        if let Some(height) = cursor.last_processed() {
            self.host.save_cursor(height).await?;
            metrics::record_scan_height(height);
        }
        report.cursor = cursor.last_processed();

        tracing::info!(
            tip,
            from,
            to,
            deposits = report.deposits_emitted,
            "Scan cycle completed"
        );

        Ok(report)
    }

    async fn watched_addresses(&self) -> ScanResult<WatchedAddresses> {
        let addresses: HashSet<String> = self.host.watched_addresses().await?;
        let mut addresses: Vec<String> = addresses.into_iter().collect();
        addresses.sort();
        let mut watched: WatchedAddresses = HashMap::with_capacity(addresses.len());

        // Several forms of one account resolve to the first in sorted order.
        for address in addresses {
            match self.codec.decode(&address) {
                Ok(raw) => match watched.entry(raw) {
                    Entry::Vacant(slot) => {
                        slot.insert(address);
                    }
                    Entry::Occupied(kept) => {
                        tracing::warn!(
                            address = %address,
                            kept = %kept.get(),
                            "Watched address duplicates another form of the same account"
                        );
                    }
                },
                Err(e) => {
                    tracing::warn!(address = %address, error = %e, "Skipping invalid watched address");
                }
            }
        }

        Ok(watched)
    }
}

impl std::fmt::Debug for BlockScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockScanner")
            .field("finality_depth", &self.finality_depth)
            .field("start_height", &self.start_height)
            .field("max_blocks", &self.max_blocks)
            .finish()
    }
}

/// Deposits to watched addresses contained in `block`.
///
/// Transfers below the currency's minimum deposit amount and transfers whose
/// destination cannot be decoded are skipped.
pub fn extract_deposits(
    block: &Block,
    watched: &WatchedAddresses,
    codec: &AddressCodec,
    currency: &CurrencyConfig,
) -> Vec<DepositRecord> {
    block
        .transfers
        .iter()
        .filter(|t| t.amount > 0 && t.amount >= currency.min_deposit_amount)
        .filter_map(|t| {
            let destination = codec.decode(&t.destination_address).ok()?;
            let address = watched.get(&destination)?;
            let source_address = codec
                .normalize(&t.source_address)
                .unwrap_or_else(|_| t.source_address.clone());

            Some(DepositRecord {
                key: DepositKey {
                    transaction_hash: t.transaction_hash.clone(),
                    operation_index: t.operation_index,
                },
                currency_id: currency.id.clone(),
                address: address.clone(),
                source_address,
                amount: t.amount,
                block_height: block.height,
                comment: t.comment.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::types::Transfer;
    use crate::config::Network;

    fn codec() -> AddressCodec {
        AddressCodec::new(Network::Mainnet, true)
    }

    fn raw(byte: u8) -> RawAddress {
        RawAddress::new(0, [byte; 32])
    }

    fn transfer(destination: &RawAddress, amount: u64, index: u32) -> Transfer {
        Transfer {
            source_address: raw(0xee).to_string(),
            destination_address: destination.to_string(),
            amount,
            transaction_hash: "abc".to_string(),
            block_height: 10,
            operation_index: index,
            comment: None,
        }
    }

    #[test]
    fn test_extract_only_watched() {
        let watched_raw = raw(1);
        let friendly = codec().encode(&watched_raw);
        let watched: WatchedAddresses = [(watched_raw, friendly.clone())].into_iter().collect();

        let block = Block {
            height: 10,
            hash: "h".to_string(),
            transfers: vec![
                transfer(&watched_raw, 500, 0),
                transfer(&raw(2), 700, 1),
                transfer(&watched_raw, 300, 2),
            ],
        };

        let deposits = extract_deposits(&block, &watched, &codec(), &CurrencyConfig::default());
        assert_eq!(deposits.len(), 2);
        assert_eq!(deposits[0].address, friendly);
        assert_eq!(deposits[0].key.operation_index, 0);
        assert_eq!(deposits[1].key.operation_index, 2);
        assert_eq!(deposits[0].source_address, codec().encode(&raw(0xee)));
        assert_eq!(deposits[0].currency_id, "ton");
        assert_eq!(deposits[0].block_height, 10);
    }

    #[test]
    fn test_extract_respects_minimum() {
        let watched_raw = raw(1);
        let watched: WatchedAddresses =
            [(watched_raw, watched_raw.to_string())].into_iter().collect();
        let currency = CurrencyConfig {
            min_deposit_amount: 400,
            ..CurrencyConfig::default()
        };

        let block = Block {
            height: 10,
            hash: "h".to_string(),
            transfers: vec![
                transfer(&watched_raw, 399, 0),
                transfer(&watched_raw, 400, 1),
                transfer(&watched_raw, 0, 2),
            ],
        };

        let deposits = extract_deposits(&block, &watched, &codec(), &currency);
        assert_eq!(deposits.len(), 1);
        assert_eq!(deposits[0].amount, 400);
    }

    #[test]
    fn test_extract_matches_any_address_form() {
        let watched_raw = raw(3);
        let watched: WatchedAddresses =
            [(watched_raw, "host-form".to_string())].into_iter().collect();

        let mut t = transfer(&watched_raw, 10, 0);
        t.destination_address = AddressCodec::new(Network::Mainnet, false).encode(&watched_raw);
        let block = Block {
            height: 1,
            hash: "h".to_string(),
            transfers: vec![t],
        };

        let deposits = extract_deposits(&block, &watched, &codec(), &CurrencyConfig::default());
        assert_eq!(deposits.len(), 1);
        assert_eq!(deposits[0].address, "host-form");
    }
}
