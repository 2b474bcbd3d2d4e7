//! Metrics collection.
//!
//! # Metrics
//! - `ton_adapter_rpc_requests_total` (counter): calls by method, outcome
//! - `ton_adapter_rpc_retries_total` (counter): retried attempts by method
//! - `ton_adapter_scan_height` (gauge): last height the scanner committed
//! - `ton_adapter_scan_cycles_total` (counter): scan cycles by outcome
//! - `ton_adapter_deposits_emitted_total` (counter): deposit records handed to the host
//! - `ton_adapter_withdrawals_total` (counter): withdrawal submissions by outcome
//!
//! # Design Decisions
//! - Only the `metrics` facade is used; the host installs the recorder/exporter

use metrics::{counter, gauge};

pub fn record_rpc_request(method: &str, outcome: &'static str) {
    counter!(
        "ton_adapter_rpc_requests_total",
        "method" => method.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_rpc_retry(method: &str) {
    counter!("ton_adapter_rpc_retries_total", "method" => method.to_string()).increment(1);
}

pub fn record_scan_height(height: u64) {
    gauge!("ton_adapter_scan_height").set(height as f64);
}

pub fn record_scan_cycle(outcome: &'static str) {
    counter!("ton_adapter_scan_cycles_total", "outcome" => outcome).increment(1);
}

pub fn record_deposits_emitted(count: usize) {
    counter!("ton_adapter_deposits_emitted_total").increment(count as u64);
}

pub fn record_withdrawal(outcome: &'static str) {
    counter!("ton_adapter_withdrawals_total", "outcome" => outcome).increment(1);
}
