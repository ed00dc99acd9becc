// (c) Cartesi and individual authors (see AUTHORS)
// SPDX-License-Identifier: Apache-2.0 (see LICENSE)

//! Development sequencer: an emulated L1 chain plus a durable, ordered inbox.
//!
//! Flow: API -> backend (signature recovery, encoding) -> L1 block -> SQLite -> inbox log.
//! The backend lock is the single point that defines message order.
pub mod api;
pub mod backend;
pub mod demo;
pub mod l1_emulator;
pub mod storage;
