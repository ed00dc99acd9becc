// (c) Cartesi and individual authors (see AUTHORS)
// SPDX-License-Identifier: Apache-2.0 (see LICENSE)

use std::collections::{BTreeMap, HashMap};
use std::time::{SystemTime, UNIX_EPOCH};

use alloy_primitives::B256;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use super::{BlockId, L1Block, L1Error};

/// Read-only view of the emulated base layer.
pub trait L1Reader {
    fn block_id_for_height(&self, height: u64) -> Result<BlockId, L1Error>;

    fn timestamp_for_hash(&self, hash: &B256) -> Result<u64, L1Error>;
}

/// Ledger of emulated L1 blocks, indexed by height and by hash.
///
/// The emulator has no lock of its own. Mutating operations are crate-private and only
/// reached through `SequencerBackend`, which holds its lock around every call.
#[derive(Debug)]
pub struct ChainEmulator {
    blocks_by_height: BTreeMap<u64, L1Block>,
    blocks_by_hash: HashMap<B256, L1Block>,
    // Next height handed out by `generate_block`. Not rolled back by `reorg`.
    frontier: u64,
    rng: StdRng,
}

impl ChainEmulator {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Block hashes are drawn from a generator seeded with `seed`, so two emulators with the
    /// same seed produce the same hash sequence.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        let mut emulator = Self {
            blocks_by_height: BTreeMap::new(),
            blocks_by_hash: HashMap::new(),
            frontier: 0,
            rng,
        };
        emulator.initialize();
        emulator
    }

    fn initialize(&mut self) {
        let genesis = self.new_block(0);
        self.insert_block(genesis);
        self.frontier = 1;
    }

    pub(crate) fn generate_block(&mut self) -> L1Block {
        let block = self.new_block(self.frontier);
        self.insert_block(block);
        self.frontier = self.frontier.saturating_add(1);
        block
    }

    /// Takes back `block` if it is still the most recently generated one, restoring the
    /// frontier it was generated at. Returns whether anything was removed.
    pub(crate) fn discard_block(&mut self, block: &L1Block) -> bool {
        let height = block.id.height;
        if self.frontier != height.saturating_add(1)
            || self.blocks_by_height.get(&height) != Some(block)
        {
            return false;
        }
        self.blocks_by_height.remove(&height);
        self.blocks_by_hash.remove(&block.id.hash);
        self.frontier = height;
        true
    }

    /// Drops every block above `target_height` from both indices and returns how many
    /// were removed.
    pub(crate) fn reorg(&mut self, target_height: u64) -> usize {
        let Some(first_removed) = target_height.checked_add(1) else {
            return 0;
        };
        let removed = self.blocks_by_height.split_off(&first_removed);
        for block in removed.values() {
            self.blocks_by_hash.remove(&block.id.hash);
        }
        removed.len()
    }

    pub fn block(&self, height: u64) -> Result<L1Block, L1Error> {
        self.blocks_by_height
            .get(&height)
            .copied()
            .ok_or(L1Error::HeightNotFound { height })
    }

    pub fn frontier(&self) -> u64 {
        self.frontier
    }

    pub fn latest_block(&self) -> Option<L1Block> {
        self.blocks_by_height
            .last_key_value()
            .map(|(_, block)| *block)
    }

    pub fn len(&self) -> usize {
        self.blocks_by_height.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks_by_height.is_empty()
    }

    fn new_block(&mut self, height: u64) -> L1Block {
        L1Block {
            id: BlockId {
                height,
                hash: self.fresh_hash(),
            },
            timestamp: now_unix_secs(),
        }
    }

    fn fresh_hash(&mut self) -> B256 {
        loop {
            let mut bytes = [0_u8; 32];
            self.rng.fill_bytes(&mut bytes);
            let hash = B256::from(bytes);
            if !self.blocks_by_hash.contains_key(&hash) {
                return hash;
            }
        }
    }

    fn insert_block(&mut self, block: L1Block) {
        if let Some(replaced) = self.blocks_by_height.insert(block.id.height, block) {
            self.blocks_by_hash.remove(&replaced.id.hash);
        }
        self.blocks_by_hash.insert(block.id.hash, block);
    }
}

impl Default for ChainEmulator {
    fn default() -> Self {
        Self::new()
    }
}

impl L1Reader for ChainEmulator {
    fn block_id_for_height(&self, height: u64) -> Result<BlockId, L1Error> {
        self.block(height).map(|block| block.id)
    }

    fn timestamp_for_hash(&self, hash: &B256) -> Result<u64, L1Error> {
        self.blocks_by_hash
            .get(hash)
            .map(|block| block.timestamp)
            .ok_or(L1Error::HashNotFound { hash: *hash })
    }
}

fn now_unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::{ChainEmulator, L1Reader};
    use crate::l1_emulator::L1Error;

    fn assert_indices_agree(l1: &ChainEmulator) {
        assert_eq!(l1.blocks_by_height.len(), l1.blocks_by_hash.len());
        for (height, block) in &l1.blocks_by_height {
            assert_eq!(*height, block.id.height);
            assert_eq!(l1.blocks_by_hash.get(&block.id.hash), Some(block));
        }
    }

    #[test]
    fn genesis_is_the_only_block_after_construction() {
        let l1 = ChainEmulator::with_seed(1);

        assert_eq!(l1.len(), 1);
        assert_eq!(l1.frontier(), 1);
        let genesis = l1.block_id_for_height(0).expect("genesis block");
        assert_eq!(genesis.height, 0);
        assert_eq!(
            l1.block_id_for_height(1),
            Err(L1Error::HeightNotFound { height: 1 })
        );
        assert_indices_agree(&l1);
    }

    #[test]
    fn generated_blocks_extend_the_frontier_contiguously() {
        let mut l1 = ChainEmulator::with_seed(2);

        let heights: Vec<u64> = (0..5).map(|_| l1.generate_block().id.height).collect();

        assert_eq!(heights, vec![1, 2, 3, 4, 5]);
        assert_eq!(l1.frontier(), 6);
        assert_eq!(l1.len(), 6);
        assert_eq!(l1.latest_block().map(|block| block.id.height), Some(5));
        assert_indices_agree(&l1);
    }

    #[test]
    fn height_and_hash_lookups_agree() {
        let mut l1 = ChainEmulator::with_seed(3);
        let block = l1.generate_block();

        let id = l1.block_id_for_height(block.id.height).expect("lookup by height");
        let timestamp = l1.timestamp_for_hash(&id.hash).expect("lookup by hash");

        assert_eq!(id, block.id);
        assert_eq!(timestamp, block.timestamp);
    }

    #[test]
    fn reorg_removes_blocks_above_target_from_both_indices() {
        let mut l1 = ChainEmulator::with_seed(4);
        let blocks: Vec<_> = (0..4).map(|_| l1.generate_block()).collect();

        let removed = l1.reorg(2);

        assert_eq!(removed, 2);
        assert_eq!(l1.len(), 3);
        assert!(l1.block_id_for_height(2).is_ok());
        for block in &blocks[2..] {
            assert!(l1.block_id_for_height(block.id.height).is_err());
            assert!(
                l1.timestamp_for_hash(&block.id.hash)
                    .expect_err("orphaned hash")
                    .is_not_found()
            );
        }
        assert_indices_agree(&l1);
    }

    #[test]
    fn reorg_at_or_above_tip_is_a_noop() {
        let mut l1 = ChainEmulator::with_seed(5);
        l1.generate_block();
        l1.generate_block();

        assert_eq!(l1.reorg(2), 0);
        assert_eq!(l1.reorg(10), 0);
        assert_eq!(l1.reorg(u64::MAX), 0);
        assert_eq!(l1.len(), 3);
        assert_indices_agree(&l1);
    }

    #[test]
    fn reorg_keeps_frontier_so_next_block_leaves_a_gap() {
        let mut l1 = ChainEmulator::with_seed(6);
        for _ in 0..3 {
            l1.generate_block();
        }
        assert_eq!(l1.frontier(), 4);

        l1.reorg(1);
        let next = l1.generate_block();

        assert_eq!(next.id.height, 4);
        assert!(l1.block_id_for_height(2).is_err());
        assert!(l1.block_id_for_height(3).is_err());
        assert_eq!(l1.len(), 3);
        assert_indices_agree(&l1);
    }

    #[test]
    fn discarding_the_tip_restores_frontier_and_indices() {
        let mut l1 = ChainEmulator::with_seed(8);
        let first = l1.generate_block();
        let second = l1.generate_block();

        assert!(!l1.discard_block(&first), "only the tip can be discarded");
        assert!(l1.discard_block(&second));

        assert_eq!(l1.frontier(), 2);
        assert_eq!(l1.len(), 2);
        assert!(l1.block_id_for_height(2).is_err());
        assert!(l1.timestamp_for_hash(&second.id.hash).is_err());
        assert_indices_agree(&l1);
        assert_eq!(l1.generate_block().id.height, 2);
    }

    #[test]
    fn same_seed_yields_same_hashes() {
        let mut a = ChainEmulator::with_seed(7);
        let mut b = ChainEmulator::with_seed(7);

        assert_eq!(a.block_id_for_height(0), b.block_id_for_height(0));
        assert_eq!(a.generate_block().id, b.generate_block().id);
    }
}
