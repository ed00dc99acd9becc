// (c) Cartesi and individual authors (see AUTHORS)
// SPDX-License-Identifier: Apache-2.0 (see LICENSE)

use alloy_primitives::B256;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum L1Error {
    #[error("no l1 block at height {height}")]
    HeightNotFound { height: u64 },
    #[error("no l1 block with hash {hash}")]
    HashNotFound { hash: B256 },
}

impl L1Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::HeightNotFound { .. } | Self::HashNotFound { .. })
    }
}
