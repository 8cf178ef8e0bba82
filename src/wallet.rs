//! Wallet export parsing
//!
//! A wallet export is the JSON blob a Concordium wallet produces when the
//! user exports an account. We need its `address` and, when present, the
//! account's sign keys:
//!
//! ```json
//! {
//!   "type": "concordium-browser-wallet-account",
//!   "value": {
//!     "address": "3kBx...",
//!     "accountKeys": {
//!       "keys": { "0": { "keys": { "0": { "signKey": "..", "verifyKey": ".." } } } },
//!       "threshold": 1
//!     }
//!   }
//! }
//! ```
//!
//! A bare `{"address": "..."}` object is accepted as well.

use crate::address::AccountAddress;
use crate::crypto::AccountSigner;
use crate::error::{MedShareError, Result};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Signatures keyed by credential index, then key index.
pub type SignatureMap = BTreeMap<u8, BTreeMap<u8, Vec<u8>>>;

#[derive(Debug, Clone)]
pub struct WalletExport {
    pub address: AccountAddress,
    keys: Vec<AccountKey>,
}

#[derive(Debug, Clone)]
struct AccountKey {
    credential_index: u8,
    key_index: u8,
    signer: AccountSigner,
}

/// Signing capability built from the keys in a wallet export.
#[derive(Debug, Clone)]
pub struct TransactionSigner {
    keys: Vec<AccountKey>,
}

impl TransactionSigner {
    /// Signs `digest` with every key, producing the per-credential map the
    /// node expects alongside the transaction.
    pub fn sign_digest(&self, digest: &[u8]) -> SignatureMap {
        let mut signatures = SignatureMap::new();
        for key in &self.keys {
            signatures
                .entry(key.credential_index)
                .or_default()
                .insert(key.key_index, key.signer.sign(digest).to_vec());
        }
        signatures
    }

    pub fn key_count(&self) -> usize {
        self.keys.len()
    }
}

impl WalletExport {
    /// Returns a signer when the export carried at least one sign key.
    pub fn signer(&self) -> Option<TransactionSigner> {
        if self.keys.is_empty() {
            None
        } else {
            Some(TransactionSigner {
                keys: self.keys.clone(),
            })
        }
    }

    pub fn has_keys(&self) -> bool {
        !self.keys.is_empty()
    }
}

/// Parses a wallet export given as JSON text.
pub fn parse_wallet_export(raw: &str) -> Result<WalletExport> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| MedShareError::WalletExport(format!("not valid JSON ({})", e)))?;
    parse_wallet_export_value(&value)
}

/// Parses a wallet export that may arrive either as a JSON string holding the
/// export or as the already decoded object.
pub fn parse_wallet_export_value(value: &Value) -> Result<WalletExport> {
    let root = match value {
        Value::String(raw) => return parse_wallet_export(raw),
        Value::Object(map) => map,
        _ => {
            return Err(MedShareError::WalletExport(
                "expected a JSON object".to_string(),
            ))
        }
    };

    let inner = root.get("value").and_then(Value::as_object);
    let address_str = root
        .get("address")
        .or_else(|| inner.and_then(|v| v.get("address")))
        .and_then(Value::as_str)
        .ok_or_else(|| MedShareError::WalletExport("missing address".to_string()))?;

    let address = AccountAddress::parse(address_str)
        .map_err(|_| MedShareError::WalletExport("invalid wallet address format".to_string()))?;

    let key_source = inner
        .and_then(|v| v.get("accountKeys"))
        .or_else(|| root.get("accountKeys"))
        .and_then(Value::as_object);

    let keys = match key_source {
        Some(account_keys) => parse_account_keys(account_keys)?,
        None => Vec::new(),
    };

    Ok(WalletExport { address, keys })
}

fn parse_account_keys(account_keys: &Map<String, Value>) -> Result<Vec<AccountKey>> {
    let mut keys = Vec::new();

    let Some(credentials) = account_keys.get("keys").and_then(Value::as_object) else {
        return Ok(keys);
    };

    for (cred_idx, credential) in credentials {
        let credential_index = parse_index(cred_idx, "credential")?;
        let Some(cred_keys) = credential.get("keys").and_then(Value::as_object) else {
            continue;
        };

        for (key_idx, key) in cred_keys {
            let key_index = parse_index(key_idx, "key")?;
            let Some(sign_key) = key.get("signKey").and_then(Value::as_str) else {
                continue;
            };

            let signer = AccountSigner::from_secret_hex(sign_key).map_err(|_| {
                MedShareError::WalletExport(format!(
                    "malformed sign key at credential {} key {}",
                    credential_index, key_index
                ))
            })?;

            if let Some(verify_key) = key.get("verifyKey").and_then(Value::as_str) {
                if !verify_key.eq_ignore_ascii_case(&hex::encode(signer.public_key_bytes())) {
                    return Err(MedShareError::WalletExport(format!(
                        "sign key does not match verify key at credential {} key {}",
                        credential_index, key_index
                    )));
                }
            }

            keys.push(AccountKey {
                credential_index,
                key_index,
                signer,
            });
        }
    }

    Ok(keys)
}

fn parse_index(raw: &str, what: &str) -> Result<u8> {
    raw.parse()
        .map_err(|_| MedShareError::WalletExport(format!("invalid {} index '{}'", what, raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::verify_signature;
    use serde_json::json;

    const SECRET: &str = "9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60";
    const PUBLIC: &str = "d75a980182b10ab7d54bfed3c964073a0ee172f3daa62325af021a68f707511a";

    fn address() -> AccountAddress {
        AccountAddress::from_bytes([5u8; 32])
    }

    #[test]
    fn test_bare_address() {
        let raw = json!({ "address": address().to_string() }).to_string();
        let export = parse_wallet_export(&raw).unwrap();
        assert_eq!(export.address, address());
        assert!(!export.has_keys());
        assert!(export.signer().is_none());
    }

    #[test]
    fn test_browser_wallet_format_with_keys() {
        let raw = json!({
            "type": "concordium-browser-wallet-account",
            "v": 0,
            "value": {
                "address": address().to_string(),
                "accountKeys": {
                    "keys": { "0": { "keys": { "0": { "signKey": SECRET, "verifyKey": PUBLIC } } } },
                    "threshold": 1
                }
            }
        });

        let export = parse_wallet_export_value(&raw).unwrap();
        let signer = export.signer().unwrap();
        assert_eq!(signer.key_count(), 1);

        let signatures = signer.sign_digest(b"digest");
        let sig = &signatures[&0u8][&0u8];
        let public = hex::decode(PUBLIC).unwrap();
        assert!(verify_signature(&public, b"digest", sig).is_ok());
    }

    #[test]
    fn test_export_as_json_string_value() {
        let inner = json!({ "address": address().to_string() }).to_string();
        let export = parse_wallet_export_value(&Value::String(inner)).unwrap();
        assert_eq!(export.address, address());
    }

    #[test]
    fn test_malformed_json() {
        let err = parse_wallet_export("{not json").unwrap_err();
        assert!(matches!(err, MedShareError::WalletExport(_)));
        assert!(err.to_string().contains("not valid JSON"));
    }

    #[test]
    fn test_missing_address() {
        let err = parse_wallet_export(r#"{"value": {}}"#).unwrap_err();
        assert!(err.to_string().contains("missing address"));
        assert!(parse_wallet_export("[]").is_err());
        assert!(parse_wallet_export("42").is_err());
    }

    #[test]
    fn test_invalid_address() {
        let err = parse_wallet_export(r#"{"address": "not-an-address"}"#).unwrap_err();
        assert!(err.to_string().contains("invalid wallet address"));
    }

    #[test]
    fn test_mismatched_verify_key() {
        let raw = json!({
            "value": {
                "address": address().to_string(),
                "accountKeys": {
                    "keys": { "0": { "keys": { "0": { "signKey": SECRET, "verifyKey": "00".repeat(32) } } } }
                }
            }
        });
        let err = parse_wallet_export_value(&raw).unwrap_err();
        assert!(err.to_string().contains("does not match"));
    }

    #[test]
    fn test_bad_sign_key() {
        let raw = json!({
            "address": address().to_string(),
            "accountKeys": { "keys": { "0": { "keys": { "1": { "signKey": "abcd" } } } } }
        });
        let err = parse_wallet_export_value(&raw).unwrap_err();
        assert!(err.to_string().contains("malformed sign key"));
    }
}
