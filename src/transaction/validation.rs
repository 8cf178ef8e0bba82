//! Payload limits and decoding of user supplied memo/data fields.

use super::types::Payload;
use crate::error::{MedShareError, Result};

/// Maximum memo size in bytes.
pub const MAX_MEMO_SIZE: usize = 256;

/// Maximum RegisterData blob size in bytes.
pub const MAX_REGISTERED_DATA_SIZE: usize = 256;

/// Maximum serialized contract parameter size in bytes.
pub const MAX_PARAMETER_SIZE: usize = 65_535;

/// Maximum receive name length (`<contract>.<method>`).
pub const MAX_RECEIVE_NAME_SIZE: usize = 100;

/// Decodes a memo: `0x`-prefixed strings are hex, anything else is taken
/// as its UTF-8 bytes.
pub fn decode_memo(memo: &str) -> Result<Vec<u8>> {
    match memo.strip_prefix("0x") {
        Some(hex_part) => hex::decode(hex_part)
            .map_err(|e| MedShareError::Validation(format!("Invalid hex memo: {}", e))),
        None => Ok(memo.as_bytes().to_vec()),
    }
}

/// Decodes a hex blob, with or without a `0x` prefix.
pub fn decode_hex_data(data: &str) -> Result<Vec<u8>> {
    let hex_part = data.strip_prefix("0x").unwrap_or(data);
    hex::decode(hex_part).map_err(|e| MedShareError::Validation(format!("Data must be hex: {}", e)))
}

/// Check a payload against the size limits the chain enforces.
pub fn validate_payload(payload: &Payload) -> Result<()> {
    match payload {
        Payload::Transfer { memo, .. } => {
            if let Some(memo) = memo {
                if memo.len() > MAX_MEMO_SIZE {
                    return Err(MedShareError::Validation(format!(
                        "Memo too large: {} bytes (max: {})",
                        memo.len(),
                        MAX_MEMO_SIZE
                    )));
                }
            }
        }
        Payload::RegisterData { data } => {
            if data.is_empty() {
                return Err(MedShareError::Validation(
                    "Registered data cannot be empty".to_string(),
                ));
            }
            if data.len() > MAX_REGISTERED_DATA_SIZE {
                return Err(MedShareError::Validation(format!(
                    "Registered data too large: {} bytes (max: {})",
                    data.len(),
                    MAX_REGISTERED_DATA_SIZE
                )));
            }
        }
        Payload::ContractCall {
            receive_name,
            max_energy,
            parameter,
            ..
        } => {
            let valid_name = receive_name
                .split_once('.')
                .map(|(contract, method)| !contract.is_empty() && !method.is_empty())
                .unwrap_or(false);
            if !valid_name || receive_name.len() > MAX_RECEIVE_NAME_SIZE {
                return Err(MedShareError::Validation(format!(
                    "Invalid receive name '{}'",
                    receive_name
                )));
            }
            if *max_energy == 0 {
                return Err(MedShareError::Validation(
                    "Energy ceiling must be positive".to_string(),
                ));
            }
            if parameter.len() > MAX_PARAMETER_SIZE {
                return Err(MedShareError::Validation(format!(
                    "Contract parameter too large: {} bytes (max: {})",
                    parameter.len(),
                    MAX_PARAMETER_SIZE
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::AccountAddress;
    use crate::amount::CcdAmount;
    use crate::transaction::types::ContractAddress;

    #[test]
    fn test_decode_memo() {
        assert_eq!(decode_memo("0x6869").unwrap(), b"hi".to_vec());
        assert_eq!(decode_memo("for the clinic").unwrap(), b"for the clinic".to_vec());
        assert!(decode_memo("0xzz").is_err());
    }

    #[test]
    fn test_decode_hex_data() {
        assert_eq!(decode_hex_data("deadbeef").unwrap(), vec![0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(decode_hex_data("0x01").unwrap(), vec![1]);
        assert!(decode_hex_data("abc").is_err());
    }

    #[test]
    fn test_memo_limit() {
        let payload = Payload::Transfer {
            to: AccountAddress::from_bytes([0; 32]),
            amount: CcdAmount::from_micro_ccd(1),
            memo: Some(vec![0; MAX_MEMO_SIZE + 1]),
        };
        assert!(validate_payload(&payload).is_err());
    }

    #[test]
    fn test_register_data_limits() {
        assert!(validate_payload(&Payload::RegisterData { data: vec![] }).is_err());
        assert!(validate_payload(&Payload::RegisterData {
            data: vec![1; MAX_REGISTERED_DATA_SIZE]
        })
        .is_ok());
        assert!(validate_payload(&Payload::RegisterData {
            data: vec![1; MAX_REGISTERED_DATA_SIZE + 1]
        })
        .is_err());
    }

    #[test]
    fn test_receive_name_rules() {
        let call = |name: &str| Payload::ContractCall {
            contract: ContractAddress {
                index: 1,
                subindex: 0,
            },
            receive_name: name.to_string(),
            amount: CcdAmount::ZERO,
            max_energy: 1000,
            parameter: vec![],
        };
        assert!(validate_payload(&call("consent.give")).is_ok());
        assert!(validate_payload(&call("consent")).is_err());
        assert!(validate_payload(&call(".give")).is_err());
        assert!(validate_payload(&call("consent.")).is_err());
    }
}
