//! Interface the host platform implements for the scanner.

use async_trait::async_trait;
use std::collections::HashSet;
use thiserror::Error;

use crate::blockchain::types::Height;
use crate::deposits::types::DepositRecord;

/// Failure reported by the host side of the bridge.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("host error: {0}")]
pub struct HostError(pub String);

/// Host collaborator consumed by the block scanner.
///
/// The host owns persistence. It must upsert deposits idempotently on
/// [`DepositRecord::key`], since a block may be emitted more than once
/// after an abandoned scan cycle.
#[async_trait]
pub trait HostBridge: Send + Sync {
    /// Canonical addresses whose incoming transfers count as deposits.
    async fn watched_addresses(&self) -> Result<HashSet<String>, HostError>;

    /// Last height the scanner committed, if any.
    async fn load_cursor(&self) -> Result<Option<Height>, HostError>;

    async fn save_cursor(&self, height: Height) -> Result<(), HostError>;

    async fn emit_deposit(&self, deposit: &DepositRecord) -> Result<(), HostError>;
}
