// (c) Cartesi and individual authors (see AUTHORS)
// SPDX-License-Identifier: Apache-2.0 (see LICENSE)

mod db;
mod sql;

use alloy_primitives::B256;
use app_core::inbox::SequencedMessage;
use thiserror::Error;

use crate::l1_emulator::{BlockId, L1Reader};

pub use db::Storage;

/// Durable sink for sequenced inbox messages.
///
/// The backend calls `durable_append` with exactly one message per freshly generated L1 block
/// and only logs the message after the call returned `Ok`. After an L1 reorg it calls `reload`
/// so the store can realign its state with the surviving ledger.
pub trait InboxStore: Send {
    fn durable_append(
        &mut self,
        messages: &[SequencedMessage],
        block: &BlockId,
    ) -> Result<(), PersistenceError>;

    /// Sequence number the next appended message must carry.
    fn next_sequence_number(&self) -> u64;

    fn reload(&mut self, l1: &dyn L1Reader) -> Result<(), ReloadError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMessage {
    pub message: SequencedMessage,
    pub block_hash: B256,
    // Set when the block the message was bound to is no longer part of the L1 ledger.
    pub orphaned: bool,
}

#[derive(Debug, Error)]
pub enum StorageOpenError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error(transparent)]
    Migration(#[from] rusqlite_migration::Error),
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error("cannot serialize inbox payload")]
    Serialize(#[from] serde_json::Error),
    #[error("non-contiguous sequence number: expected {expected}, got {got}")]
    NonContiguousSequence { expected: u64, got: u64 },
}

#[derive(Debug, Error)]
pub enum ReloadError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error("cannot decode persisted inbox payload")]
    Deserialize(#[from] serde_json::Error),
    #[error("persisted row has malformed {field}")]
    MalformedRow { field: &'static str },
}
