//! Block scanner behaviour against an in-memory ledger and host.

use std::collections::HashSet;
use std::sync::Arc;

use ton_adapter::config::{ChainConfig, CurrencyConfig};
use ton_adapter::deposits::{BlockScanner, DepositKey, ScanError};
use ton_adapter::rpc::RpcError;

mod common;

use common::{MemoryHost, MockLedger};

fn chain(finality_depth: u64, start_height: Option<u64>) -> ChainConfig {
    ChainConfig {
        finality_depth,
        start_height,
        max_blocks_per_scan: 1_000,
        ..ChainConfig::default()
    }
}

fn scanner(
    ledger: &Arc<MockLedger>,
    host: &Arc<MemoryHost>,
    chain: ChainConfig,
    currency: CurrencyConfig,
) -> BlockScanner {
    BlockScanner::new(
        ledger.clone(),
        host.clone(),
        common::codec(),
        &chain,
        currency,
    )
}

fn keys(host: &MemoryHost) -> HashSet<DepositKey> {
    host.deposits().into_iter().map(|d| d.key).collect()
}

#[tokio::test]
async fn test_never_reads_inside_reorg_window() {
    let ledger = MockLedger::new();
    let host = MemoryHost::new();
    let watched = common::address(1);
    host.watch(&watched);
    for h in 0..=30 {
        ledger.push_block(h, vec![common::transfer(&watched, 10 + h, &format!("tx{}", h), 0)]);
    }

    let depth = 4;
    let scanner = scanner(&ledger, &host, chain(depth, Some(0)), CurrencyConfig::default());

    for tip in 0..=30 {
        ledger.set_tip(tip);
        let report = scanner.scan().await.unwrap();
        assert_eq!(report.cursor, tip.checked_sub(depth));
    }

    for (height, tip) in ledger.block_requests() {
        assert!(height + depth <= tip, "read height {} at tip {}", height, tip);
    }

    let heights: Vec<u64> = host.deposits().iter().map(|d| d.block_height).collect();
    assert_eq!(heights, (0..=26).collect::<Vec<_>>());
    assert_eq!(host.cursor(), Some(26));
}

#[tokio::test]
async fn test_nothing_final_below_depth() {
    let ledger = MockLedger::new();
    let host = MemoryHost::new();
    ledger.set_tip(2);

    let scanner = scanner(&ledger, &host, chain(3, Some(0)), CurrencyConfig::default());
    let report = scanner.scan().await.unwrap();

    assert_eq!(report.blocks_scanned, 0);
    assert_eq!(report.cursor, None);
    assert!(ledger.block_requests().is_empty());
    assert_eq!(host.save_count(), 0);
}

#[tokio::test]
async fn test_abandoned_cycle_keeps_cursor_and_rescans() {
    let ledger = MockLedger::new();
    let host = MemoryHost::new();
    let watched = common::address(1);
    host.watch(&watched);
    for h in [2, 5, 8] {
        ledger.push_block(h, vec![common::transfer(&watched, 1_000, &format!("tx{}", h), 1)]);
    }
    ledger.set_tip(13);
    ledger.fail_height(6);

    let scanner = scanner(&ledger, &host, chain(3, Some(0)), CurrencyConfig::default());

    let err = scanner.scan().await.unwrap_err();
    assert!(matches!(err, ScanError::Rpc(RpcError::Unavailable(_))));
    assert!(!err.is_fatal());
    assert_eq!(host.cursor(), None);
    assert_eq!(host.save_count(), 0);
    assert_eq!(host.deposits().len(), 2);

    ledger.heal();
    let report = scanner.scan().await.unwrap();
    assert_eq!(report.from_height, Some(0));
    assert_eq!(report.cursor, Some(10));
    assert_eq!(host.cursor(), Some(10));

    // Heights 2 and 5 were emitted twice; keys stay identical.
    assert_eq!(host.deposits().len(), 5);
    let expected: HashSet<DepositKey> = [2, 5, 8]
        .into_iter()
        .map(|h| DepositKey {
            transaction_hash: format!("tx{}", h),
            operation_index: 1,
        })
        .collect();
    assert_eq!(keys(&host), expected);
}

#[tokio::test]
async fn test_emit_failure_abandons_cycle() {
    let ledger = MockLedger::new();
    let host = MemoryHost::new();
    let watched = common::address(1);
    host.watch(&watched);
    host.set_cursor(Some(3));
    ledger.push_block(5, vec![common::transfer(&watched, 1_000, "tx5", 0)]);
    ledger.set_tip(20);
    host.fail_emit_at(Some(5));

    let scanner = scanner(&ledger, &host, chain(6, None), CurrencyConfig::default());

    let err = scanner.scan().await.unwrap_err();
    assert!(matches!(err, ScanError::Host(_)));
    assert_eq!(host.cursor(), Some(3));

    host.fail_emit_at(None);
    let report = scanner.scan().await.unwrap();
    assert_eq!(report.from_height, Some(4));
    assert_eq!(report.deposits_emitted, 1);
    assert_eq!(host.cursor(), Some(14));
}

#[tokio::test]
async fn test_fresh_start_includes_safe_height() {
    let ledger = MockLedger::new();
    let host = MemoryHost::new();
    let deposit_address = common::address(0x42);
    host.watch(&deposit_address);
    ledger.push_block(14, vec![common::transfer(&deposit_address, 5_000, "at-safe", 0)]);
    ledger.set_tip(20);

    let scanner = scanner(&ledger, &host, chain(6, None), CurrencyConfig::default());

    let report = scanner.scan().await.unwrap();
    assert_eq!(report.from_height, Some(14));
    assert_eq!(report.blocks_scanned, 1);
    assert_eq!(host.cursor(), Some(14));
    assert_eq!(ledger.block_requests(), vec![(14, 20)]);
    assert_eq!(host.deposits().len(), 1);
    assert_eq!(host.deposits()[0].block_height, 14);

    ledger.set_tip(22);
    let report = scanner.scan().await.unwrap();
    assert_eq!(report.from_height, Some(15));
    assert_eq!(report.blocks_scanned, 2);
    assert_eq!(host.cursor(), Some(16));
}

#[tokio::test]
async fn test_configured_start_height() {
    let ledger = MockLedger::new();
    let host = MemoryHost::new();
    ledger.set_tip(30);

    let scanner = scanner(&ledger, &host, chain(5, Some(20)), CurrencyConfig::default());
    let report = scanner.scan().await.unwrap();

    assert_eq!(report.from_height, Some(20));
    assert_eq!(report.cursor, Some(25));
}

#[tokio::test]
async fn test_max_blocks_per_cycle() {
    let ledger = MockLedger::new();
    let host = MemoryHost::new();
    ledger.set_tip(100);

    let mut config = chain(0, Some(0));
    config.max_blocks_per_scan = 10;
    let scanner = scanner(&ledger, &host, config, CurrencyConfig::default());

    let first = scanner.scan().await.unwrap();
    assert_eq!(first.blocks_scanned, 10);
    assert_eq!(first.cursor, Some(9));

    let second = scanner.scan().await.unwrap();
    assert_eq!(second.from_height, Some(10));
    assert_eq!(second.cursor, Some(19));
}

#[tokio::test]
async fn test_filters_unwatched_and_small_deposits() {
    let ledger = MockLedger::new();
    let host = MemoryHost::new();
    let watched = common::address(1);
    host.watch(&watched);
    host.watch("not-an-address");
    ledger.push_block(
        0,
        vec![
            common::transfer(&watched, 50, "a", 0),
            common::transfer(&watched, 500, "a", 1),
            common::transfer(&common::address(2), 900, "b", 0),
        ],
    );
    ledger.set_tip(0);

    let currency = CurrencyConfig {
        min_deposit_amount: 100,
        ..CurrencyConfig::default()
    };
    let scanner = scanner(&ledger, &host, chain(0, Some(0)), currency);
    scanner.scan().await.unwrap();

    let deposits = host.deposits();
    assert_eq!(deposits.len(), 1);
    assert_eq!(deposits[0].amount, 500);
    assert_eq!(deposits[0].address, watched);
    assert_eq!(deposits[0].key.to_string(), "a:1");
}

#[tokio::test]
async fn test_duplicate_watched_forms_resolve_deterministically() {
    let ledger = MockLedger::new();
    let host = MemoryHost::new();
    let friendly = common::address(0x33);
    let raw = common::codec().decode(&friendly).unwrap().to_string();
    host.watch(&friendly);
    host.watch(&raw);
    ledger.push_block(0, vec![common::transfer(&friendly, 700, "dup", 0)]);
    ledger.set_tip(0);

    let scanner = scanner(&ledger, &host, chain(0, Some(0)), CurrencyConfig::default());
    scanner.scan().await.unwrap();

    let deposits = host.deposits();
    assert_eq!(deposits.len(), 1);
    assert_eq!(deposits[0].address, raw.clone().min(friendly));
}
