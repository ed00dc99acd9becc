// (c) Cartesi and individual authors (see AUTHORS)
// SPDX-License-Identifier: Apache-2.0 (see LICENSE)

//! Development accounts and chain bootstrap messages.

use alloy_primitives::{Address, B256, Signature, U256};
use alloy_sol_types::{Eip712Domain, SolStruct};
use app_core::encoding::MessageEncoder;
use app_core::message::{ChainParams, InboxPayload};
use app_core::transaction::{L2Transaction, SenderRecovery, SignedTransaction};
use k256::ecdsa::SigningKey;
use k256::ecdsa::signature::hazmat::PrehashSigner;
use thiserror::Error;
use tracing::info;

use crate::backend::{BackendError, SequencerBackend};
use crate::storage::InboxStore;

pub const DEV_PRIVATE_KEYS: [&str; 10] = [
    "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
    "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d",
    "0x5de4111afa1a4b94908f83103eb1f1706367c2e68ca870fc3fb9a804cdab365a",
    "0x7c852118294e51e653712a81e05800f419141751be58f605c371e15141b007a6",
    "0x47e179ec197488593b187f80a00eb0da91f1b9d0b13f8733639f19c30a34926a",
    "0x8b3a350cf5c34c9194ca85829a2df0ec3153be0318b5e2d3348e872092edffba",
    "0x92db14e403b83dfe3df233f83dfa3a0d7096f21ca9b0d6d6b8d88b2b4ec1564e",
    "0x4bbbf85ce3377467afe5d46f804f221813b2bb87f24d81f60f1fcdbf7cbf4356",
    "0xdbda1821b80551c9d65939329250298aa3472ba22feea921c0cf5d620ea67b97",
    "0x2a871d0798f97d79848a013d4936a73bf4cc922c825d33c1cf7073dff6d409c6",
];

const WEI_PER_ETH: u64 = 1_000_000_000_000_000_000;

#[derive(Debug, Error)]
pub enum DemoError {
    #[error("invalid dev private key {index}: {reason}")]
    InvalidKey { index: usize, reason: String },
    #[error("cannot sign transaction")]
    Signing {
        #[source]
        source: k256::ecdsa::Error,
    },
}

#[derive(Debug, Clone)]
pub struct DemoAccount {
    pub address: Address,
    pub private_key: B256,
    pub signing_key: SigningKey,
}

pub fn default_deposit() -> U256 {
    U256::from(100_u64) * U256::from(WEI_PER_ETH)
}

pub fn wei_to_eth(value: U256) -> U256 {
    value / U256::from(WEI_PER_ETH)
}

/// The first `count` well-known development accounts (at most ten).
pub fn dev_accounts(count: usize) -> Result<Vec<DemoAccount>, DemoError> {
    DEV_PRIVATE_KEYS
        .iter()
        .take(count)
        .enumerate()
        .map(|(index, key_hex)| parse_dev_account(index, key_hex))
        .collect()
}

fn parse_dev_account(index: usize, key_hex: &str) -> Result<DemoAccount, DemoError> {
    let bytes = alloy_primitives::hex::decode(key_hex).map_err(|err| DemoError::InvalidKey {
        index,
        reason: err.to_string(),
    })?;
    let signing_key = SigningKey::from_slice(&bytes).map_err(|err| DemoError::InvalidKey {
        index,
        reason: err.to_string(),
    })?;
    Ok(DemoAccount {
        address: address_from_signing_key(&signing_key),
        private_key: B256::from_slice(&bytes),
        signing_key,
    })
}

pub fn address_from_signing_key(signing_key: &SigningKey) -> Address {
    let verifying = signing_key.verifying_key().to_encoded_point(false);
    Address::from_raw_public_key(&verifying.as_bytes()[1..])
}

/// Signs `transaction` over its EIP-712 hash, choosing the parity that recovers the signer.
pub fn sign_transaction(
    domain: &Eip712Domain,
    transaction: L2Transaction,
    signing_key: &SigningKey,
) -> Result<SignedTransaction, DemoError> {
    let hash = transaction.eip712_signing_hash(domain);
    let k256_sig = signing_key
        .sign_prehash(hash.as_slice())
        .map_err(|source| DemoError::Signing { source })?;

    let sender = address_from_signing_key(signing_key);
    let signature = [false, true]
        .into_iter()
        .map(|parity| Signature::from_signature_and_parity(k256_sig, parity))
        .find(|candidate| {
            candidate
                .recover_address_from_prehash(&hash)
                .is_ok_and(|value| value == sender)
        })
        .ok_or(DemoError::Signing {
            source: k256::ecdsa::Error::new(),
        })?;

    Ok(SignedTransaction::new(transaction, signature))
}

/// Sequences the chain init message, sent by the rollup itself.
pub fn initialize_chain<S, R, E>(
    backend: &SequencerBackend<S, R, E>,
    rollup_address: Address,
    owner: Address,
    chain_params: ChainParams,
) -> Result<(), BackendError>
where
    S: InboxStore,
    R: SenderRecovery,
    E: MessageEncoder,
{
    let accepted = backend.add_message(InboxPayload::init(owner, chain_params), rollup_address)?;
    info!(
        sequence_number = accepted.sequence_number,
        owner = %owner,
        rollup = %rollup_address,
        "chain initialized"
    );
    Ok(())
}

/// Sequences one deposit of `amount` per account.
pub fn fund_accounts<S, R, E>(
    backend: &SequencerBackend<S, R, E>,
    accounts: &[DemoAccount],
    amount: U256,
    rollup_address: Address,
) -> Result<(), BackendError>
where
    S: InboxStore,
    R: SenderRecovery,
    E: MessageEncoder,
{
    for account in accounts {
        backend.add_message(
            InboxPayload::eth_deposit(account.address, amount),
            rollup_address,
        )?;
    }
    info!(accounts = accounts.len(), amount = %amount, "demo accounts funded");
    Ok(())
}
