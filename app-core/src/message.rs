// (c) Cartesi and individual authors (see AUTHORS)
// SPDX-License-Identifier: Apache-2.0 (see LICENSE)

use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

pub const ETH_DEPOSIT_KIND: u8 = 0;
pub const L2_MESSAGE_KIND: u8 = 3;
pub const INIT_KIND: u8 = 4;

const DEFAULT_STAKE_REQUIREMENT: u64 = 10;
const DEFAULT_GRACE_PERIOD_TICKS: u64 = 13_000 * 2;
const DEFAULT_MAX_EXECUTION_STEPS: u64 = 10_000_000_000;
const DEFAULT_ARB_GAS_SPEED_LIMIT_PER_TICK: u64 = 200_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainParams {
    pub stake_requirement: U256,
    pub stake_token: Address,
    pub grace_period_ticks: U256,
    pub max_execution_steps: u64,
    pub arb_gas_speed_limit_per_tick: u64,
}

impl Default for ChainParams {
    fn default() -> Self {
        Self {
            stake_requirement: U256::from(DEFAULT_STAKE_REQUIREMENT),
            stake_token: Address::ZERO,
            grace_period_ticks: U256::from(DEFAULT_GRACE_PERIOD_TICKS),
            max_execution_steps: DEFAULT_MAX_EXECUTION_STEPS,
            arb_gas_speed_limit_per_tick: DEFAULT_ARB_GAS_SPEED_LIMIT_PER_TICK,
        }
    }
}

/// Application message carried by one inbox entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboxPayload {
    Init {
        chain_params: ChainParams,
        owner: Address,
    },
    EthDeposit {
        dest: Address,
        value: U256,
    },
    // Opaque to the sequencer; see `encoding::L2MessageEncoder` for the layout of
    // wrapped signed transactions.
    L2Message {
        data: Bytes,
    },
}

impl InboxPayload {
    pub fn kind(&self) -> u8 {
        match self {
            Self::Init { .. } => INIT_KIND,
            Self::EthDeposit { .. } => ETH_DEPOSIT_KIND,
            Self::L2Message { .. } => L2_MESSAGE_KIND,
        }
    }

    pub fn init(owner: Address, chain_params: ChainParams) -> Self {
        Self::Init {
            chain_params,
            owner,
        }
    }

    pub fn eth_deposit(dest: Address, value: U256) -> Self {
        Self::EthDeposit { dest, value }
    }
}

#[cfg(test)]
mod tests {
    use super::{ChainParams, InboxPayload};
    use alloy_primitives::{Address, U256};

    #[test]
    fn kinds_follow_inbox_message_type_codes() {
        let owner = Address::from_slice(&[0x01; 20]);
        assert_eq!(InboxPayload::init(owner, ChainParams::default()).kind(), 4);
        assert_eq!(
            InboxPayload::eth_deposit(owner, U256::from(1_u64)).kind(),
            0
        );
        assert_eq!(
            InboxPayload::L2Message {
                data: vec![0xaa].into()
            }
            .kind(),
            3
        );
    }

    #[test]
    fn payload_json_is_tagged_by_type() {
        let dest = Address::from_slice(&[0x02; 20]);
        let payload = InboxPayload::eth_deposit(dest, U256::from(5_u64));
        let value = serde_json::to_value(&payload).expect("serialize payload");
        assert_eq!(value["type"], "eth_deposit");

        let decoded: InboxPayload = serde_json::from_value(value).expect("deserialize payload");
        assert_eq!(decoded, payload);
    }
}
