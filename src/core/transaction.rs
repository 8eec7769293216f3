//! Transaction handling
//!
//! Builds legacy (type 0) Ethereum transactions and signs them with EIP-155
//! replay protection:
//! - Signing payload: `rlp([nonce, gasPrice, gas, to, value, data, chainId, 0, 0])`
//! - Signed form: `rlp([nonce, gasPrice, gas, to, value, data, v, r, s])`
//!   with `v = recovery_id + chainId * 2 + 35`

use crate::core::rlp::{self, RlpItem};
use crate::crypto::{KeyError, KeyPair, Signature};
use alloy_primitives::{keccak256, Address, Bytes, B256};

/// Hash of a submitted transaction
pub type TxHash = B256;

/// An unsigned transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRequest {
    pub nonce: u64,
    /// Gas price in wei
    pub gas_price: u128,
    pub gas_limit: u64,
    /// Recipient; `None` creates a contract
    pub to: Option<Address>,
    /// Value in wei
    pub value: u128,
    pub data: Bytes,
    pub chain_id: u64,
}

impl TransactionRequest {
    /// A contract-creation transaction carrying `init_code`
    pub fn deployment(init_code: Bytes) -> Self {
        Self {
            nonce: 0,
            gas_price: 0,
            gas_limit: 0,
            to: None,
            value: 0,
            data: init_code,
            chain_id: 1,
        }
    }

    pub fn is_deployment(&self) -> bool {
        self.to.is_none()
    }

    fn base_fields(&self) -> Vec<RlpItem> {
        vec![
            RlpItem::uint(self.nonce as u128),
            RlpItem::uint(self.gas_price),
            RlpItem::uint(self.gas_limit as u128),
            match &self.to {
                Some(to) => RlpItem::bytes(to.as_slice()),
                None => RlpItem::bytes(&[]),
            },
            RlpItem::uint(self.value),
            RlpItem::bytes(&self.data),
        ]
    }

    /// The EIP-155 payload whose hash is signed
    pub fn signing_payload(&self) -> Vec<u8> {
        let mut fields = self.base_fields();
        fields.push(RlpItem::uint(self.chain_id as u128));
        fields.push(RlpItem::uint(0));
        fields.push(RlpItem::uint(0));
        rlp::encode(&RlpItem::List(fields))
    }

    pub fn signing_hash(&self) -> B256 {
        keccak256(&self.signing_payload())
    }

    /// Sign the transaction with the given key
    pub fn sign(self, key_pair: &KeyPair) -> Result<SignedTransaction, KeyError> {
        let signature = key_pair.sign_hash(&self.signing_hash())?;
        Ok(SignedTransaction::new(self, key_pair.address(), signature))
    }
}

/// A signed, submittable transaction
#[derive(Debug, Clone)]
pub struct SignedTransaction {
    pub request: TransactionRequest,
    pub from: Address,
    pub signature: Signature,
    /// RLP-encoded signed transaction, as sent with `eth_sendRawTransaction`
    pub raw: Bytes,
    pub hash: TxHash,
}

impl SignedTransaction {
    fn new(request: TransactionRequest, from: Address, signature: Signature) -> Self {
        let v = signature.recovery_id as u128 + request.chain_id as u128 * 2 + 35;
        let mut fields = request.base_fields();
        fields.push(RlpItem::uint(v));
        fields.push(RlpItem::uint_bytes(&signature.r));
        fields.push(RlpItem::uint_bytes(&signature.s));
        let raw = Bytes::from(rlp::encode(&RlpItem::List(fields)));
        let hash = keccak256(&raw);

        Self {
            request,
            from,
            signature,
            raw,
            hash,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::tests::{generate, recover_address};
    use alloy_primitives::{address, hex};

    /// The example transaction from EIP-155
    fn eip155_example() -> (TransactionRequest, KeyPair) {
        let request = TransactionRequest {
            nonce: 9,
            gas_price: 20_000_000_000,
            gas_limit: 21_000,
            to: Some(address!("3535353535353535353535353535353535353535")),
            value: 1_000_000_000_000_000_000,
            data: Bytes::new(),
            chain_id: 1,
        };
        let key = KeyPair::from_private_key_hex(
            "4646464646464646464646464646464646464646464646464646464646464646",
        )
        .unwrap();
        (request, key)
    }

    #[test]
    fn test_eip155_signing_payload() {
        let (request, _) = eip155_example();
        assert_eq!(
            hex::encode(request.signing_payload()),
            "ec098504a817c800825208943535353535353535353535353535353535353535880de0b6b3a764000080018080"
        );
        assert_eq!(
            hex::encode(request.signing_hash()),
            "daf5a779ae972f972197303d7b574746c7ef83eadac0f2791ad23db92e4c8e53"
        );
    }

    #[test]
    fn test_eip155_signed_transaction() {
        let (request, key) = eip155_example();
        let signed = request.sign(&key).unwrap();

        assert_eq!(
            hex::encode(&signed.raw),
            "f86c098504a817c800825208943535353535353535353535353535353535353535880de0b6b3a76400008025a028ef61340bd939bc2195fe537567866003e1a15d3c71ff63e1590620aa636276a067cbe9d8997f761aecb703304b3800ccf555c9f3dc64214b297fb1966a3b6d83"
        );
    }

    #[test]
    fn test_signature_recovers_sender() {
        let key = generate();
        let request = TransactionRequest {
            nonce: 3,
            gas_price: 1_000,
            gas_limit: 90_000,
            chain_id: 31337,
            ..TransactionRequest::deployment(Bytes::from_static(&[0x60, 0x80, 0x60, 0x40]))
        };
        let hash = request.signing_hash();
        let signed = request.sign(&key).unwrap();

        assert_eq!(signed.from, key.address());
        assert_eq!(recover_address(&hash, &signed.signature), key.address());
        assert!(signed.request.is_deployment());
    }

    #[test]
    fn test_tx_hash_parse_and_display() {
        let text = "0x88df016429689c079f3b2f6ad39fa052532c56795b733da78a91ebe6a713944b";
        let hash: TxHash = text.parse().unwrap();
        assert_eq!(hash.to_string(), text);
        assert!("0x1234".parse::<TxHash>().is_err());
    }
}
