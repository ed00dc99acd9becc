// (c) Cartesi and individual authors (see AUTHORS)
// SPDX-License-Identifier: Apache-2.0 (see LICENSE)

use alloy_primitives::B256;
use app_core::inbox::ChainBinding;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct BlockId {
    pub height: u64,
    pub hash: B256,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct L1Block {
    pub id: BlockId,
    // Unix seconds.
    pub timestamp: u64,
}

impl L1Block {
    pub fn chain_binding(&self) -> ChainBinding {
        ChainBinding {
            block_number: self.id.height,
            timestamp: self.timestamp,
        }
    }
}
