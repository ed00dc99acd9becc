// (c) Cartesi and individual authors (see AUTHORS)
// SPDX-License-Identifier: Apache-2.0 (see LICENSE)

use rusqlite::{Connection, Result, Row, Transaction, params};

const SQL_SELECT_MAX_SEQUENCE_NUMBER: &str = "SELECT MAX(sequence_number) FROM inbox_messages";
const SQL_SELECT_INBOX_MESSAGES_FROM_OFFSET: &str = "SELECT sequence_number, sender, block_number, block_hash, block_timestamp, payload, orphaned \
     FROM inbox_messages WHERE sequence_number >= ?1 ORDER BY sequence_number ASC";
const SQL_SELECT_BLOCK_ANCHORS: &str =
    "SELECT sequence_number, block_number, block_hash, orphaned FROM inbox_messages";
const SQL_INSERT_INBOX_MESSAGE: &str = "INSERT INTO inbox_messages \
     (sequence_number, sender, block_number, block_hash, block_timestamp, kind, payload) \
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)";
const SQL_UPDATE_ORPHANED: &str =
    "UPDATE inbox_messages SET orphaned = ?2 WHERE sequence_number = ?1";
const SQL_COUNT_LIVE_MESSAGES: &str = "SELECT COUNT(*) FROM inbox_messages WHERE orphaned = 0";
const SQL_DELETE_ALL_MESSAGES: &str = "DELETE FROM inbox_messages";

#[derive(Debug, Clone)]
pub(super) struct InboxMessageInsert {
    pub sequence_number: i64,
    pub sender: Vec<u8>,
    pub block_number: i64,
    pub block_hash: Vec<u8>,
    pub block_timestamp: i64,
    pub kind: i64,
    pub payload: String,
}

#[derive(Debug, Clone)]
pub(super) struct InboxMessageRow {
    pub sequence_number: i64,
    pub sender: Vec<u8>,
    pub block_number: i64,
    pub block_hash: Vec<u8>,
    pub block_timestamp: i64,
    pub payload: String,
    pub orphaned: bool,
}

#[derive(Debug, Clone)]
pub(super) struct BlockAnchorRow {
    pub sequence_number: i64,
    pub block_number: i64,
    pub block_hash: Vec<u8>,
    pub orphaned: bool,
}

pub(super) fn sql_select_max_sequence_number(conn: &Connection) -> Result<Option<i64>> {
    conn.query_row(SQL_SELECT_MAX_SEQUENCE_NUMBER, [], |row| row.get(0))
}

pub(super) fn sql_count_live_messages(conn: &Connection) -> Result<i64> {
    conn.query_row(SQL_COUNT_LIVE_MESSAGES, [], |row| row.get(0))
}

pub(super) fn sql_insert_inbox_messages_batch(
    tx: &Transaction<'_>,
    rows: &[InboxMessageInsert],
) -> Result<()> {
    if rows.is_empty() {
        return Ok(());
    }

    let mut stmt = tx.prepare_cached(SQL_INSERT_INBOX_MESSAGE)?;
    for row in rows {
        stmt.execute(params![
            row.sequence_number,
            row.sender.as_slice(),
            row.block_number,
            row.block_hash.as_slice(),
            row.block_timestamp,
            row.kind,
            row.payload.as_str(),
        ])?;
    }
    Ok(())
}

pub(super) fn sql_select_inbox_messages_from_offset(
    conn: &Connection,
    offset: i64,
) -> Result<Vec<InboxMessageRow>> {
    let mut stmt = conn.prepare_cached(SQL_SELECT_INBOX_MESSAGES_FROM_OFFSET)?;
    let mapped = stmt.query_map(params![offset], convert_row_to_inbox_message_row)?;
    mapped.collect()
}

pub(super) fn sql_select_block_anchors(tx: &Transaction<'_>) -> Result<Vec<BlockAnchorRow>> {
    let mut stmt = tx.prepare_cached(SQL_SELECT_BLOCK_ANCHORS)?;
    let mapped = stmt.query_map([], convert_row_to_block_anchor_row)?;
    mapped.collect()
}

pub(super) fn sql_update_orphaned(
    tx: &Transaction<'_>,
    sequence_number: i64,
    orphaned: bool,
) -> Result<usize> {
    tx.execute(SQL_UPDATE_ORPHANED, params![sequence_number, orphaned])
}

pub(super) fn sql_delete_all_messages(conn: &Connection) -> Result<usize> {
    conn.execute(SQL_DELETE_ALL_MESSAGES, [])
}

fn convert_row_to_inbox_message_row(row: &Row<'_>) -> Result<InboxMessageRow> {
    Ok(InboxMessageRow {
        sequence_number: row.get(0)?,
        sender: row.get(1)?,
        block_number: row.get(2)?,
        block_hash: row.get(3)?,
        block_timestamp: row.get(4)?,
        payload: row.get(5)?,
        orphaned: row.get(6)?,
    })
}

fn convert_row_to_block_anchor_row(row: &Row<'_>) -> Result<BlockAnchorRow> {
    Ok(BlockAnchorRow {
        sequence_number: row.get(0)?,
        block_number: row.get(1)?,
        block_hash: row.get(2)?,
        orphaned: row.get(3)?,
    })
}
