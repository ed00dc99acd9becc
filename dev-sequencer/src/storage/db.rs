// (c) Cartesi and individual authors (see AUTHORS)
// SPDX-License-Identifier: Apache-2.0 (see LICENSE)

use alloy_primitives::{Address, B256};
use app_core::inbox::{ChainBinding, SequencedMessage};
use rusqlite::{Connection, TransactionBehavior};
use rusqlite_migration::{M, Migrations};
use tracing::debug;

use super::sql::{
    InboxMessageInsert, InboxMessageRow, sql_count_live_messages, sql_delete_all_messages,
    sql_insert_inbox_messages_batch, sql_select_block_anchors,
    sql_select_inbox_messages_from_offset, sql_select_max_sequence_number, sql_update_orphaned,
};
use super::{InboxStore, PersistenceError, ReloadError, StorageOpenError, StoredMessage};
use crate::l1_emulator::{BlockId, L1Reader};

const MIGRATION_0001_SCHEMA: &str = include_str!("migrations/0001_schema.sql");

/// SQLite-backed inbox store.
pub struct Storage {
    conn: Connection,
    next_sequence_number: u64,
}

impl Storage {
    pub fn open(path: &str, synchronous: &str) -> std::result::Result<Self, StorageOpenError> {
        let conn = Self::open_connection_with_migrations(path, synchronous)?;
        let next_sequence_number = query_next_sequence_number(&conn)?;
        Ok(Self {
            conn,
            next_sequence_number,
        })
    }

    pub fn open_connection(
        path: &str,
        synchronous: &str,
    ) -> std::result::Result<Connection, StorageOpenError> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", synchronous)?;
        conn.pragma_update(None, "busy_timeout", 5000)?;
        Ok(conn)
    }

    pub fn open_connection_with_migrations(
        path: &str,
        synchronous: &str,
    ) -> std::result::Result<Connection, StorageOpenError> {
        let mut conn = Self::open_connection(path, synchronous)?;
        Self::run_migrations(&mut conn)?;
        Ok(conn)
    }

    pub fn run_migrations(conn: &mut Connection) -> std::result::Result<(), StorageOpenError> {
        Migrations::new(vec![M::up(MIGRATION_0001_SCHEMA)]).to_latest(conn)?;
        Ok(())
    }

    /// Drops every persisted message. The L1 ledger does not survive restarts, so messages
    /// from a previous run reference blocks that no longer exist.
    pub fn reset(&mut self) -> rusqlite::Result<()> {
        sql_delete_all_messages(&self.conn)?;
        self.next_sequence_number = 0;
        Ok(())
    }

    pub fn live_message_count(&self) -> rusqlite::Result<u64> {
        sql_count_live_messages(&self.conn).map(i64_to_u64)
    }

    pub fn load_messages_from(&self, offset: u64) -> Result<Vec<StoredMessage>, ReloadError> {
        let rows = sql_select_inbox_messages_from_offset(&self.conn, u64_to_i64(offset))?;
        rows.into_iter().map(decode_row).collect()
    }
}

impl InboxStore for Storage {
    fn durable_append(
        &mut self,
        messages: &[SequencedMessage],
        block: &BlockId,
    ) -> Result<(), PersistenceError> {
        if messages.is_empty() {
            return Ok(());
        }

        let mut next_expected = self.next_sequence_number;
        let mut rows = Vec::with_capacity(messages.len());
        for message in messages {
            if message.sequence_number != next_expected {
                return Err(PersistenceError::NonContiguousSequence {
                    expected: next_expected,
                    got: message.sequence_number,
                });
            }
            rows.push(InboxMessageInsert {
                sequence_number: u64_to_i64(message.sequence_number),
                sender: message.sender.to_vec(),
                block_number: u64_to_i64(block.height),
                block_hash: block.hash.to_vec(),
                block_timestamp: u64_to_i64(message.chain_binding.timestamp),
                kind: i64::from(message.kind()),
                payload: serde_json::to_string(&message.payload)?,
            });
            next_expected = next_expected.saturating_add(1);
        }

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        sql_insert_inbox_messages_batch(&tx, rows.as_slice())?;
        tx.commit()?;

        self.next_sequence_number = next_expected;
        Ok(())
    }

    fn next_sequence_number(&self) -> u64 {
        self.next_sequence_number
    }

    fn reload(&mut self, l1: &dyn L1Reader) -> Result<(), ReloadError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mut changed = 0_usize;
        for anchor in sql_select_block_anchors(&tx)? {
            let hash = decode_hash(anchor.block_hash.as_slice())?;
            let live = l1
                .block_id_for_height(i64_to_u64(anchor.block_number))
                .is_ok_and(|id| id.hash == hash);
            if live == anchor.orphaned {
                sql_update_orphaned(&tx, anchor.sequence_number, !live)?;
                changed = changed.saturating_add(1);
            }
        }
        let next_sequence_number = query_next_sequence_number(&tx)?;
        tx.commit()?;

        self.next_sequence_number = next_sequence_number;
        debug!(changed, next_sequence_number, "inbox store reloaded");
        Ok(())
    }
}

fn decode_row(row: InboxMessageRow) -> Result<StoredMessage, ReloadError> {
    if row.sender.len() != 20 {
        return Err(ReloadError::MalformedRow { field: "sender" });
    }
    let message = SequencedMessage::new(
        i64_to_u64(row.sequence_number),
        Address::from_slice(row.sender.as_slice()),
        ChainBinding {
            block_number: i64_to_u64(row.block_number),
            timestamp: i64_to_u64(row.block_timestamp),
        },
        serde_json::from_str(row.payload.as_str())?,
    );
    Ok(StoredMessage {
        message,
        block_hash: decode_hash(row.block_hash.as_slice())?,
        orphaned: row.orphaned,
    })
}

fn decode_hash(bytes: &[u8]) -> Result<B256, ReloadError> {
    if bytes.len() != 32 {
        return Err(ReloadError::MalformedRow {
            field: "block_hash",
        });
    }
    Ok(B256::from_slice(bytes))
}

fn query_next_sequence_number(conn: &Connection) -> rusqlite::Result<u64> {
    let value = sql_select_max_sequence_number(conn)?;
    Ok(match value {
        Some(last) => i64_to_u64(last).saturating_add(1),
        None => 0,
    })
}

fn u64_to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn i64_to_u64(value: i64) -> u64 {
    value.max(0) as u64
}
