// (c) Cartesi and individual authors (see AUTHORS)
// SPDX-License-Identifier: Apache-2.0 (see LICENSE)

use alloy_primitives::{Address, U256};
use ssz::{Decode, Encode};
use ssz_derive::{Decode, Encode};
use thiserror::Error;

use crate::message::InboxPayload;
use crate::transaction::SignedTransaction;

pub const COMPRESSED_SIGNED_TX_SUBTYPE: u8 = 7;
pub const DEFAULT_MAX_CALLDATA_BYTES: usize = 128 * 1024;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodingError {
    #[error("transaction calldata too large: max {max} bytes, got {got} bytes")]
    PayloadTooLarge { max: usize, got: usize },
    #[error("unknown l2 message subtype {0}")]
    UnknownSubtype(u8),
    #[error("cannot decode l2 message: {reason}")]
    Decode { reason: String },
}

pub trait MessageEncoder: Send + Sync {
    fn wrap(&self, tx: &SignedTransaction) -> Result<InboxPayload, EncodingError>;
}

/// Signed transaction as carried inside an `L2Message` payload.
#[derive(PartialEq, Eq, Debug, Encode, Decode, Clone)]
pub struct CompressedTx {
    pub nonce: u64,
    pub gas_price: U256,
    pub gas_limit: u64,
    pub to: Address,
    pub value: U256,
    pub data: Vec<u8>,
    pub signature: Vec<u8>,
}

impl CompressedTx {
    pub fn from_signed(tx: &SignedTransaction) -> Self {
        let inner = &tx.transaction;
        Self {
            nonce: inner.nonce,
            gas_price: inner.gas_price,
            gas_limit: inner.gas_limit,
            to: inner.to,
            value: inner.value,
            data: inner.data.to_vec(),
            signature: tx.signature.as_bytes().to_vec(),
        }
    }
}

/// Wraps signed transactions as `[subtype][ssz(CompressedTx)]`.
#[derive(Debug, Clone, Copy)]
pub struct L2MessageEncoder {
    max_calldata_bytes: usize,
}

impl L2MessageEncoder {
    pub fn new(max_calldata_bytes: usize) -> Self {
        Self { max_calldata_bytes }
    }

    pub fn decode(data: &[u8]) -> Result<CompressedTx, EncodingError> {
        let Some((&subtype, body)) = data.split_first() else {
            return Err(EncodingError::Decode {
                reason: "empty l2 message".to_string(),
            });
        };
        if subtype != COMPRESSED_SIGNED_TX_SUBTYPE {
            return Err(EncodingError::UnknownSubtype(subtype));
        }
        CompressedTx::from_ssz_bytes(body).map_err(|err| EncodingError::Decode {
            reason: format!("{err:?}"),
        })
    }
}

impl Default for L2MessageEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CALLDATA_BYTES)
    }
}

impl MessageEncoder for L2MessageEncoder {
    fn wrap(&self, tx: &SignedTransaction) -> Result<InboxPayload, EncodingError> {
        let calldata_len = tx.transaction.data.len();
        if calldata_len > self.max_calldata_bytes {
            return Err(EncodingError::PayloadTooLarge {
                max: self.max_calldata_bytes,
                got: calldata_len,
            });
        }

        let body = CompressedTx::from_signed(tx).as_ssz_bytes();
        let mut data = Vec::with_capacity(1 + body.len());
        data.push(COMPRESSED_SIGNED_TX_SUBTYPE);
        data.extend_from_slice(&body);
        Ok(InboxPayload::L2Message { data: data.into() })
    }
}

#[cfg(test)]
mod tests {
    use super::{EncodingError, L2MessageEncoder, MessageEncoder};
    use crate::message::InboxPayload;
    use crate::transaction::{L2Transaction, SignedTransaction};
    use alloy_primitives::{Address, Signature, U256};

    fn signed_with_calldata(len: usize) -> SignedTransaction {
        SignedTransaction::new(
            L2Transaction {
                nonce: 3,
                gas_price: U256::from(2_u64),
                gas_limit: 50_000,
                to: Address::from_slice(&[0x10; 20]),
                value: U256::from(42_u64),
                data: vec![0xab; len].into(),
            },
            Signature::test_signature(),
        )
    }

    #[test]
    fn wrapped_transaction_decodes_back() {
        let tx = signed_with_calldata(4);
        let payload = L2MessageEncoder::default().wrap(&tx).expect("wrap tx");
        let InboxPayload::L2Message { data } = payload else {
            panic!("expected l2 message payload");
        };

        let decoded = L2MessageEncoder::decode(&data).expect("decode l2 message");
        assert_eq!(decoded.nonce, 3);
        assert_eq!(decoded.to, Address::from_slice(&[0x10; 20]));
        assert_eq!(decoded.data, vec![0xab; 4]);
        assert_eq!(decoded.signature, Signature::test_signature().as_bytes().to_vec());
    }

    #[test]
    fn oversized_calldata_is_rejected() {
        let err = L2MessageEncoder::new(8)
            .wrap(&signed_with_calldata(9))
            .expect_err("calldata above limit");
        assert_eq!(err, EncodingError::PayloadTooLarge { max: 8, got: 9 });
    }

    #[test]
    fn decode_rejects_unknown_subtype() {
        let err = L2MessageEncoder::decode(&[0x01, 0x02]).expect_err("unknown subtype");
        assert_eq!(err, EncodingError::UnknownSubtype(0x01));
    }
}
