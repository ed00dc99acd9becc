// (c) Cartesi and individual authors (see AUTHORS)
// SPDX-License-Identifier: Apache-2.0 (see LICENSE)

mod error;
mod sequencer;

pub use error::BackendError;
pub use sequencer::{PendingSnapshot, SequencerBackend};
