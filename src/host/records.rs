//! Host record shapes.
//!
//! The host stores amounts as decimal strings in whole coins; the adapter
//! works in minor units. `base_factor` converts between the two.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::blockchain::types::{ConfirmationStatus, Height, SignedTransaction, WalletId};
use crate::config::CurrencyConfig;
use crate::deposits::types::DepositRecord;
use crate::wallet::WithdrawalRequest;

/// Decimal amount conversion failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("invalid decimal amount '{0}'")]
    Invalid(String),

    #[error("amount '{0}' has more fractional digits than the currency allows")]
    TooPrecise(String),

    #[error("amount '{0}' is out of range")]
    Overflow(String),
}

fn decimals(base_factor: u64) -> usize {
    let mut digits = 0;
    let mut n = base_factor;
    while n >= 10 {
        n /= 10;
        digits += 1;
    }
    digits
}

/// Render minor units as a decimal string (`1500000000` → `"1.5"` for TON).
pub fn amount_to_decimal(amount: u64, base_factor: u64) -> String {
    let base_factor = base_factor.max(1);
    let whole = amount / base_factor;
    let fraction = amount % base_factor;
    if fraction == 0 {
        return whole.to_string();
    }
    let digits = decimals(base_factor);
    let fraction = format!("{:0width$}", fraction, width = digits);
    format!("{}.{}", whole, fraction.trim_end_matches('0'))
}

/// Parse a decimal string into minor units, rejecting lost precision.
pub fn amount_from_decimal(value: &str, base_factor: u64) -> Result<u64, AmountError> {
    let trimmed = value.trim();
    let (whole, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));
    let is_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty()) || !is_digits(whole) || !is_digits(fraction) {
        return Err(AmountError::Invalid(value.to_string()));
    }

    let digits = decimals(base_factor.max(1));
    let fraction = fraction.trim_end_matches('0');
    if fraction.len() > digits {
        return Err(AmountError::TooPrecise(value.to_string()));
    }

    let overflow = || AmountError::Overflow(value.to_string());
    let whole: u64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| overflow())?
    };
    let fraction: u64 = if fraction.is_empty() {
        0
    } else {
        format!("{:0<width$}", fraction, width = digits)
            .parse()
            .map_err(|_| overflow())?
    };

    whole
        .checked_mul(base_factor.max(1))
        .and_then(|w| w.checked_add(fraction))
        .ok_or_else(overflow)
}

/// Deposit in the shape the host stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostDeposit {
    pub currency_id: String,
    pub address: String,
    pub amount: String,
    pub txid: String,
    pub txout: u32,
    pub block_number: Height,
    pub from_addresses: Vec<String>,
    pub memo: Option<String>,
}

impl HostDeposit {
    pub fn from_record(record: &DepositRecord, currency: &CurrencyConfig) -> Self {
        Self {
            currency_id: record.currency_id.clone(),
            address: record.address.clone(),
            amount: amount_to_decimal(record.amount, currency.base_factor),
            txid: record.key.transaction_hash.clone(),
            txout: record.key.operation_index,
            block_number: record.block_height,
            from_addresses: vec![record.source_address.clone()],
            memo: record.comment.clone(),
        }
    }
}

/// Withdrawal status values understood by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostWithdrawalStatus {
    Pending,
    Succeed,
    Failed,
}

impl From<&ConfirmationStatus> for HostWithdrawalStatus {
    fn from(status: &ConfirmationStatus) -> Self {
        match status {
            ConfirmationStatus::Confirmed { .. } => HostWithdrawalStatus::Succeed,
            ConfirmationStatus::Failed { .. } => HostWithdrawalStatus::Failed,
            ConfirmationStatus::Pending | ConfirmationStatus::NotFound => {
                HostWithdrawalStatus::Pending
            }
        }
    }
}

/// Withdrawal in the shape the host stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostWithdrawal {
    pub currency_id: String,
    pub txid: String,
    pub to_address: String,
    pub amount: String,
    pub status: HostWithdrawalStatus,
}

impl HostWithdrawal {
    pub fn new(
        request: &WithdrawalRequest,
        transaction: &SignedTransaction,
        status: &ConfirmationStatus,
        currency: &CurrencyConfig,
    ) -> Self {
        Self {
            currency_id: currency.id.clone(),
            txid: transaction.transaction_id.0.clone(),
            to_address: request.destination_address.clone(),
            amount: amount_to_decimal(request.amount, currency.base_factor),
            status: status.into(),
        }
    }
}

/// Withdrawal order as the host submits it, with a decimal amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostWithdrawalOrder {
    pub wallet_id: String,
    pub to_address: String,
    pub amount: String,
    #[serde(default)]
    pub memo: Option<String>,
}

impl HostWithdrawalOrder {
    pub fn into_request(self, currency: &CurrencyConfig) -> Result<WithdrawalRequest, AmountError> {
        Ok(WithdrawalRequest {
            wallet_id: WalletId(self.wallet_id),
            destination_address: self.to_address,
            amount: amount_from_decimal(&self.amount, currency.base_factor)?,
            sequence_number: None,
            expires_at: None,
            comment: self.memo,
        })
    }
}
