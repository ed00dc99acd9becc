// (c) Cartesi and individual authors (see AUTHORS)
// SPDX-License-Identifier: Apache-2.0 (see LICENSE)

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::message::InboxPayload;

/// L1 position an inbox message was bound to when it was accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainBinding {
    pub block_number: u64,
    pub timestamp: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequencedMessage {
    pub sequence_number: u64,
    pub sender: Address,
    pub chain_binding: ChainBinding,
    pub payload: InboxPayload,
}

impl SequencedMessage {
    pub fn new(
        sequence_number: u64,
        sender: Address,
        chain_binding: ChainBinding,
        payload: InboxPayload,
    ) -> Self {
        Self {
            sequence_number,
            sender,
            chain_binding,
            payload,
        }
    }

    pub fn kind(&self) -> u8 {
        self.payload.kind()
    }
}

/// Flat export of an inbox log, replayable by an execution engine test harness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboxTestVector {
    pub inbox: Vec<SequencedMessage>,
}

impl InboxTestVector {
    pub fn new(inbox: Vec<SequencedMessage>) -> Self {
        Self { inbox }
    }

    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec_pretty(self)
    }

    pub fn from_json(data: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(data)
    }
}

#[cfg(test)]
mod tests {
    use super::{ChainBinding, InboxTestVector, SequencedMessage};
    use crate::message::{ChainParams, InboxPayload};
    use alloy_primitives::{Address, U256};

    fn sample_log() -> Vec<SequencedMessage> {
        let rollup = Address::from_slice(&[0xee; 20]);
        vec![
            SequencedMessage::new(
                0,
                rollup,
                ChainBinding {
                    block_number: 1,
                    timestamp: 1_700_000_000,
                },
                InboxPayload::init(Address::from_slice(&[0x01; 20]), ChainParams::default()),
            ),
            SequencedMessage::new(
                1,
                rollup,
                ChainBinding {
                    block_number: 2,
                    timestamp: 1_700_000_001,
                },
                InboxPayload::eth_deposit(Address::from_slice(&[0x02; 20]), U256::from(7_u64)),
            ),
        ]
    }

    #[test]
    fn test_vector_keeps_log_order() {
        let log = sample_log();
        let data = InboxTestVector::new(log.clone())
            .to_json()
            .expect("encode test vector");

        let value: serde_json::Value = serde_json::from_slice(&data).expect("parse json");
        let inbox = value["inbox"].as_array().expect("inbox array");
        assert_eq!(inbox.len(), 2);
        assert_eq!(inbox[0]["sequence_number"], 0);
        assert_eq!(inbox[0]["payload"]["type"], "init");
        assert_eq!(inbox[1]["chain_binding"]["block_number"], 2);

        let decoded = InboxTestVector::from_json(&data).expect("decode test vector");
        assert_eq!(decoded.inbox, log);
    }
}
