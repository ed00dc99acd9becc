// (c) Cartesi and individual authors (see AUTHORS)
// SPDX-License-Identifier: Apache-2.0 (see LICENSE)

//! In-memory stand-in for the base layer: a volatile ledger of emulated blocks, one per
//! accepted inbox message, that can be truncated to simulate a fork.

mod emulator;
mod error;
mod types;

pub use emulator::{ChainEmulator, L1Reader};
pub use error::L1Error;
pub use types::{BlockId, L1Block};
