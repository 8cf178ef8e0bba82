//! Transaction module split into types, encoding, validation and builder

pub mod builder;
pub mod encoding;
pub mod types;
pub mod validation;

pub use builder::{ContractCall, TransactionBuilder};
pub use types::*;
pub use validation::{decode_hex_data, decode_memo};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::AccountAddress;
    use crate::amount::CcdAmount;
    use crate::crypto::{verify_signature, AccountSigner};
    use crate::wallet::parse_wallet_export_value;
    use serde_json::json;

    const SECRET: &str = "9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60";

    fn prepared() -> PreparedTransaction {
        TransactionBuilder::new(AccountAddress::from_bytes([8u8; 32]), 3)
            .expiry(TransactionExpiry::from_epoch_seconds(1_800_000_000))
            .transfer(
                AccountAddress::from_bytes([9u8; 32]),
                CcdAmount::from_micro_ccd(10),
                None,
            )
            .unwrap()
    }

    #[test]
    fn test_signed_transaction_signatures_verify() {
        let export = parse_wallet_export_value(&json!({
            "address": AccountAddress::from_bytes([8u8; 32]).to_string(),
            "accountKeys": { "keys": { "0": { "keys": { "0": { "signKey": SECRET } } } } }
        }))
        .unwrap();
        let signer = export.signer().unwrap();

        let tx = prepared();
        let signatures = signer.sign_digest(&tx.sign_digest());
        let signed = SignedTransaction::new(tx.clone(), signatures);

        let public = AccountSigner::from_secret_hex(SECRET)
            .unwrap()
            .public_key_bytes();
        let sig = &signed.signatures[&0u8][&0u8];
        assert!(verify_signature(&public, &tx.sign_digest(), sig).is_ok());
    }

    #[test]
    fn test_block_item_and_hash() {
        let signer = AccountSigner::generate();
        let tx = prepared();
        let mut signatures = crate::wallet::SignatureMap::new();
        signatures
            .entry(0)
            .or_default()
            .insert(0, signer.sign(&tx.sign_digest()).to_vec());
        let signed = SignedTransaction::new(tx.clone(), signatures);

        let item = signed.block_item_bytes();
        // version, tag, 1 credential, cred 0, 1 key, key 0, u16 length, 64 byte signature
        assert_eq!(item[0], 0);
        assert_eq!(item[1], 0);
        assert_eq!(item.len(), 2 + 1 + 2 + 1 + 2 + 64 + tx.bytes().len());
        assert!(item.ends_with(tx.bytes()));
        assert_eq!(signed.hash_str().len(), 64);
        assert_eq!(signed.hash(), signed.clone().hash());
    }
}
