// (c) Cartesi and individual authors (see AUTHORS)
// SPDX-License-Identifier: Apache-2.0 (see LICENSE)

use std::sync::{Mutex, MutexGuard};

use alloy_primitives::{Address, B256};
use app_core::encoding::MessageEncoder;
use app_core::inbox::SequencedMessage;
use app_core::message::InboxPayload;
use app_core::transaction::{SenderRecovery, SignedTransaction};
use tracing::{debug, info};

use super::BackendError;
use crate::l1_emulator::{BlockId, ChainEmulator, L1Block, L1Error, L1Reader};
use crate::storage::InboxStore;

/// Pending-pool view. The emulation has no pending pool, so none is ever produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSnapshot {
    pub messages: Vec<SequencedMessage>,
}

/// Single writer for the emulated L1 ledger and the inbox log.
///
/// Every operation takes the backend lock for its whole duration, so the order of accepted
/// messages is the order in which callers completed `add_message` or
/// `submit_signed_transaction`.
pub struct SequencerBackend<S, R, E> {
    state: Mutex<BackendState<S>>,
    recovery: R,
    encoder: E,
}

struct BackendState<S> {
    l1: ChainEmulator,
    store: S,
    msg_count: u64,
    messages: Vec<SequencedMessage>,
}

impl<S, R, E> SequencerBackend<S, R, E>
where
    S: InboxStore,
    R: SenderRecovery,
    E: MessageEncoder,
{
    /// The sequence counter continues from `store.next_sequence_number()`. The in-memory log
    /// only holds messages accepted by this instance.
    pub fn new(store: S, l1: ChainEmulator, recovery: R, encoder: E) -> Self {
        let msg_count = store.next_sequence_number();
        Self {
            state: Mutex::new(BackendState {
                l1,
                store,
                msg_count,
                messages: Vec::new(),
            }),
            recovery,
            encoder,
        }
    }

    pub fn submit_signed_transaction(
        &self,
        tx: &SignedTransaction,
    ) -> Result<SequencedMessage, BackendError> {
        let mut state = self.lock();
        let sender = self
            .recovery
            .recover_sender(tx)
            .map_err(|source| BackendError::InvalidSignature { source })?;
        let payload = self
            .encoder
            .wrap(tx)
            .map_err(|source| BackendError::Encoding { source })?;

        debug!(
            nonce = tx.transaction.nonce,
            gas_limit = tx.transaction.gas_limit,
            gas_price = %tx.transaction.gas_price,
            from = %sender,
            "received transaction"
        );
        state.accept(payload, sender)
    }

    /// Accepts a message with an explicit sender, bypassing signature recovery. Used for
    /// chain initialization and deposits.
    pub fn add_message(
        &self,
        payload: InboxPayload,
        sender: Address,
    ) -> Result<SequencedMessage, BackendError> {
        self.lock().accept(payload, sender)
    }

    /// Truncates the L1 ledger above `target_height` and asks the store to reload.
    ///
    /// The inbox log is left untouched. If the reload fails the ledger stays truncated.
    pub fn reorg(&self, target_height: u64) -> Result<(), BackendError> {
        let mut state = self.lock();
        let BackendState { l1, store, .. } = &mut *state;

        let removed = l1.reorg(target_height);
        info!(target_height, removed, frontier = l1.frontier(), "l1 reorg");
        store
            .reload(&*l1)
            .map_err(|source| BackendError::Reload { source })
    }

    pub fn pending_transaction_count(&self, _address: Address) -> Option<u64> {
        let _state = self.lock();
        None
    }

    pub fn pending_snapshot(&self) -> Option<PendingSnapshot> {
        let _state = self.lock();
        None
    }

    /// Copy of every message accepted so far, in sequence order.
    pub fn snapshot_messages(&self) -> Vec<SequencedMessage> {
        self.lock().messages.clone()
    }

    pub fn message_count(&self) -> u64 {
        self.lock().msg_count
    }

    pub fn block_id_for_height(&self, height: u64) -> Result<BlockId, L1Error> {
        self.lock().l1.block_id_for_height(height)
    }

    pub fn timestamp_for_hash(&self, hash: &B256) -> Result<u64, L1Error> {
        self.lock().l1.timestamp_for_hash(hash)
    }

    pub fn l1_block(&self, height: u64) -> Result<L1Block, L1Error> {
        self.lock().l1.block(height)
    }

    pub fn l1_frontier(&self) -> u64 {
        self.lock().l1.frontier()
    }

    fn lock(&self) -> MutexGuard<'_, BackendState<S>> {
        self.state
            .lock()
            .expect("sequencer backend state mutex poisoned")
    }
}

impl<S: InboxStore> BackendState<S> {
    fn accept(
        &mut self,
        payload: InboxPayload,
        sender: Address,
    ) -> Result<SequencedMessage, BackendError> {
        let block = self.l1.generate_block();
        let message =
            SequencedMessage::new(self.msg_count, sender, block.chain_binding(), payload);

        if let Err(source) = self
            .store
            .durable_append(std::slice::from_ref(&message), &block.id)
        {
            self.l1.discard_block(&block);
            return Err(BackendError::Persistence { source });
        }

        debug!(
            sequence_number = message.sequence_number,
            block_number = block.id.height,
            kind = message.kind(),
            sender = %sender,
            "inbox message accepted"
        );
        self.messages.push(message.clone());
        self.msg_count = self.msg_count.saturating_add(1);
        Ok(message)
    }
}
