// (c) Cartesi and individual authors (see AUTHORS)
// SPDX-License-Identifier: Apache-2.0 (see LICENSE)

//! Types shared between the dev sequencer and its clients.
//!
//! A client submits a [`transaction::SignedTransaction`]; the sequencer recovers its sender,
//! wraps it into an [`message::InboxPayload`] and stamps it into a
//! [`inbox::SequencedMessage`].
pub mod encoding;
pub mod inbox;
pub mod message;
pub mod transaction;
