//! Binary wire encoding of account transactions.
//!
//! All integers are big-endian. Layout:
//!
//! ```text
//! header      = sender(32) nonce(u64) energy(u64) payload_size(u32) expiry(u64)
//! transfer    = 3  to(32) amount(u64)
//! with memo   = 22 to(32) memo_len(u16) memo amount(u64)
//! register    = 21 data_len(u16) data
//! update      = 2  amount(u64) index(u64) subindex(u64)
//!                  name_len(u16) name param_len(u16) param
//! signatures  = n_creds(u8) { cred(u8) n_keys(u8) { key(u8) len(u16) sig } }
//! block item  = 0 signatures header payload
//! ```

use super::types::{Payload, SignedTransaction, TransactionHeader};
use crate::wallet::SignatureMap;

/// Size of the fixed header in bytes.
pub const HEADER_SIZE: usize = 32 + 8 + 8 + 4 + 8;

/// Block item tag for account transactions.
const ACCOUNT_TRANSACTION_TAG: u8 = 0;

/// Version prefix used when submitting block items.
const BLOCK_ITEM_VERSION: u8 = 0;

pub fn encode_payload(payload: &Payload) -> Vec<u8> {
    let mut out = vec![payload.kind().tag()];
    match payload {
        Payload::Transfer { to, amount, memo } => {
            out.extend_from_slice(to.as_bytes());
            if let Some(memo) = memo {
                put_u16_prefixed(&mut out, memo);
            }
            out.extend_from_slice(&amount.micro_ccd().to_be_bytes());
        }
        Payload::RegisterData { data } => {
            put_u16_prefixed(&mut out, data);
        }
        Payload::ContractCall {
            contract,
            receive_name,
            amount,
            parameter,
            ..
        } => {
            out.extend_from_slice(&amount.micro_ccd().to_be_bytes());
            out.extend_from_slice(&contract.index.to_be_bytes());
            out.extend_from_slice(&contract.subindex.to_be_bytes());
            put_u16_prefixed(&mut out, receive_name.as_bytes());
            put_u16_prefixed(&mut out, parameter);
        }
    }
    out
}

pub fn encode_header(header: &TransactionHeader, payload_size: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_SIZE);
    out.extend_from_slice(header.sender.as_bytes());
    out.extend_from_slice(&header.nonce.to_be_bytes());
    out.extend_from_slice(&header.energy.to_be_bytes());
    out.extend_from_slice(&payload_size.to_be_bytes());
    out.extend_from_slice(&header.expiry.epoch_seconds().to_be_bytes());
    out
}

/// Header followed by payload, the unsigned form handed to wallets.
pub fn encode_account_transaction(header: &TransactionHeader, payload: &Payload) -> Vec<u8> {
    let payload_bytes = encode_payload(payload);
    // Payload lengths are bounded by validation well below u32::MAX.
    let mut out = encode_header(header, payload_bytes.len() as u32);
    out.extend_from_slice(&payload_bytes);
    out
}

pub fn encode_signatures(signatures: &SignatureMap) -> Vec<u8> {
    let mut out = vec![signatures.len() as u8];
    for (cred, keys) in signatures {
        out.push(*cred);
        out.push(keys.len() as u8);
        for (key, sig) in keys {
            out.push(*key);
            put_u16_prefixed(&mut out, sig);
        }
    }
    out
}

pub fn encode_block_item(signed: &SignedTransaction) -> Vec<u8> {
    let mut out = vec![ACCOUNT_TRANSACTION_TAG];
    out.extend_from_slice(&encode_signatures(&signed.signatures));
    out.extend_from_slice(signed.transaction.bytes());
    out
}

pub fn encode_versioned_block_item(signed: &SignedTransaction) -> Vec<u8> {
    let mut out = vec![BLOCK_ITEM_VERSION];
    out.extend_from_slice(&encode_block_item(signed));
    out
}

fn put_u16_prefixed(out: &mut Vec<u8>, bytes: &[u8]) {
    out.extend_from_slice(&(bytes.len() as u16).to_be_bytes());
    out.extend_from_slice(bytes);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::AccountAddress;
    use crate::amount::CcdAmount;
    use crate::transaction::types::{ContractAddress, PreparedTransaction, TransactionExpiry};
    use std::collections::BTreeMap;

    fn header(nonce: u64, energy: u64) -> TransactionHeader {
        TransactionHeader {
            sender: AccountAddress::from_bytes([1u8; 32]),
            nonce,
            energy,
            expiry: TransactionExpiry::from_epoch_seconds(1_700_000_000),
        }
    }

    #[test]
    fn test_header_layout() {
        let bytes = encode_header(&header(7, 300), 41);
        assert_eq!(bytes.len(), HEADER_SIZE);
        assert_eq!(&bytes[..32], &[1u8; 32]);
        assert_eq!(&bytes[32..40], &7u64.to_be_bytes());
        assert_eq!(&bytes[40..48], &300u64.to_be_bytes());
        assert_eq!(&bytes[48..52], &41u32.to_be_bytes());
        assert_eq!(&bytes[52..60], &1_700_000_000u64.to_be_bytes());
    }

    #[test]
    fn test_transfer_payload() {
        let payload = Payload::Transfer {
            to: AccountAddress::from_bytes([2u8; 32]),
            amount: CcdAmount::from_micro_ccd(1_500_000),
            memo: None,
        };
        let bytes = encode_payload(&payload);
        assert_eq!(bytes.len(), 1 + 32 + 8);
        assert_eq!(bytes[0], 3);
        assert_eq!(&bytes[33..], &1_500_000u64.to_be_bytes());
    }

    #[test]
    fn test_transfer_with_memo_payload() {
        let payload = Payload::Transfer {
            to: AccountAddress::from_bytes([2u8; 32]),
            amount: CcdAmount::from_micro_ccd(5),
            memo: Some(b"hi".to_vec()),
        };
        let bytes = encode_payload(&payload);
        assert_eq!(bytes[0], 22);
        assert_eq!(&bytes[33..35], &2u16.to_be_bytes());
        assert_eq!(&bytes[35..37], b"hi");
        assert_eq!(&bytes[37..], &5u64.to_be_bytes());
    }

    #[test]
    fn test_update_payload() {
        let payload = Payload::ContractCall {
            contract: ContractAddress {
                index: 9,
                subindex: 0,
            },
            receive_name: "c.m".to_string(),
            amount: CcdAmount::ZERO,
            max_energy: 30_000,
            parameter: b"{}".to_vec(),
        };
        let bytes = encode_payload(&payload);
        assert_eq!(bytes[0], 2);
        assert_eq!(&bytes[9..17], &9u64.to_be_bytes());
        assert_eq!(&bytes[25..27], &3u16.to_be_bytes());
        assert_eq!(&bytes[27..30], b"c.m");
        assert_eq!(&bytes[30..32], &2u16.to_be_bytes());
        assert_eq!(bytes.len(), 34);
    }

    #[test]
    fn test_payload_size_in_header_matches() {
        let payload = Payload::RegisterData {
            data: vec![0xab; 10],
        };
        let prepared = PreparedTransaction::new(header(1, 700), payload);
        let bytes = prepared.bytes();
        let declared = u32::from_be_bytes(bytes[48..52].try_into().unwrap()) as usize;
        assert_eq!(declared, bytes.len() - HEADER_SIZE);
        assert_eq!(bytes[HEADER_SIZE], 21);
    }

    #[test]
    fn test_signature_map_layout() {
        let mut keys = BTreeMap::new();
        keys.insert(0u8, vec![0xee; 64]);
        let mut signatures = SignatureMap::new();
        signatures.insert(0u8, keys);

        let bytes = encode_signatures(&signatures);
        assert_eq!(&bytes[..4], &[1, 0, 1, 0]);
        assert_eq!(&bytes[4..6], &64u16.to_be_bytes());
        assert_eq!(bytes.len(), 6 + 64);
    }
}
