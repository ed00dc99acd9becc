// (c) Cartesi and individual authors (see AUTHORS)
// SPDX-License-Identifier: Apache-2.0 (see LICENSE)

use alloy_primitives::{Address, B256, Signature};
use alloy_sol_types::{Eip712Domain, SolStruct, sol};
use serde::{Deserialize, Serialize};
use thiserror::Error;

sol! {
    #[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
    struct L2Transaction {
        uint64 nonce;
        uint256 gas_price;
        uint64 gas_limit;
        address to;
        uint256 value;
        bytes data;
    }
}

#[derive(Debug, Clone)]
pub struct SignedTransaction {
    pub transaction: L2Transaction,
    pub signature: Signature,
}

impl SignedTransaction {
    pub const SIGNATURE_BYTES: usize = 65;

    pub fn new(transaction: L2Transaction, signature: Signature) -> Self {
        Self {
            transaction,
            signature,
        }
    }

    pub fn signing_hash(&self, domain: &Eip712Domain) -> B256 {
        self.transaction.eip712_signing_hash(domain)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignerError {
    #[error("invalid signature: {reason}")]
    InvalidSignature { reason: String },
}

pub trait SenderRecovery: Send + Sync {
    fn recover_sender(&self, tx: &SignedTransaction) -> Result<Address, SignerError>;
}

/// Recovers senders from signatures over the EIP-712 hash of the transaction struct.
#[derive(Debug, Clone)]
pub struct Eip712Signer {
    domain: Eip712Domain,
}

impl Eip712Signer {
    pub fn new(domain: Eip712Domain) -> Self {
        Self { domain }
    }
}

impl SenderRecovery for Eip712Signer {
    fn recover_sender(&self, tx: &SignedTransaction) -> Result<Address, SignerError> {
        let hash = tx.signing_hash(&self.domain);
        tx.signature
            .recover_address_from_prehash(&hash)
            .map_err(|err| SignerError::InvalidSignature {
                reason: err.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::{Eip712Signer, L2Transaction, SenderRecovery, SignedTransaction};
    use alloy_primitives::{Address, Signature, U256};
    use alloy_sol_types::{Eip712Domain, SolStruct};
    use k256::ecdsa::SigningKey;
    use k256::ecdsa::signature::hazmat::PrehashSigner;

    fn test_domain() -> Eip712Domain {
        Eip712Domain {
            name: Some("ArbitrumDevChain".to_string().into()),
            version: Some("1".to_string().into()),
            chain_id: Some(U256::from(1_u64)),
            verifying_contract: Some(Address::from_slice(&[0x42; 20])),
            salt: None,
        }
    }

    fn sample_transaction(nonce: u64) -> L2Transaction {
        L2Transaction {
            nonce,
            gas_price: U256::from(1_u64),
            gas_limit: 21_000,
            to: Address::from_slice(&[0x99; 20]),
            value: U256::from(1_000_u64),
            data: vec![0xde, 0xad].into(),
        }
    }

    fn address_from_signing_key(signing_key: &SigningKey) -> Address {
        let verifying = signing_key.verifying_key().to_encoded_point(false);
        Address::from_raw_public_key(&verifying.as_bytes()[1..])
    }

    fn sign(domain: &Eip712Domain, tx: &L2Transaction, signing_key: &SigningKey) -> Signature {
        let hash = tx.eip712_signing_hash(domain);
        let k256_sig = signing_key
            .sign_prehash(hash.as_slice())
            .expect("sign transaction hash");
        let sender = address_from_signing_key(signing_key);
        [false, true]
            .into_iter()
            .map(|parity| Signature::from_signature_and_parity(k256_sig, parity))
            .find(|candidate| {
                candidate
                    .recover_address_from_prehash(&hash)
                    .map(|value| value == sender)
                    .unwrap_or(false)
            })
            .expect("recoverable parity for signature")
    }

    #[test]
    fn recovers_signing_key_address() {
        let domain = test_domain();
        let signing_key = SigningKey::from_bytes((&[7_u8; 32]).into()).expect("signing key");
        let tx = sample_transaction(0);
        let signature = sign(&domain, &tx, &signing_key);

        let signer = Eip712Signer::new(domain);
        let sender = signer
            .recover_sender(&SignedTransaction::new(tx, signature))
            .expect("recover sender");
        assert_eq!(sender, address_from_signing_key(&signing_key));
    }

    #[test]
    fn tampered_transaction_does_not_recover_signer() {
        let domain = test_domain();
        let signing_key = SigningKey::from_bytes((&[9_u8; 32]).into()).expect("signing key");
        let signature = sign(&domain, &sample_transaction(0), &signing_key);

        let signer = Eip712Signer::new(domain);
        let recovered = signer.recover_sender(&SignedTransaction::new(sample_transaction(1), signature));
        assert_ne!(recovered.ok(), Some(address_from_signing_key(&signing_key)));
    }

    #[test]
    fn domain_is_part_of_the_signed_hash() {
        let domain = test_domain();
        let signing_key = SigningKey::from_bytes((&[3_u8; 32]).into()).expect("signing key");
        let tx = sample_transaction(4);
        let signature = sign(&domain, &tx, &signing_key);

        let mut other_domain = test_domain();
        other_domain.chain_id = Some(U256::from(2_u64));
        let recovered = Eip712Signer::new(other_domain)
            .recover_sender(&SignedTransaction::new(tx, signature));
        assert_ne!(recovered.ok(), Some(address_from_signing_key(&signing_key)));
    }
}
