//! Concordium account addresses
//!
//! An account address is 32 bytes rendered as Base58Check with version byte
//! `1`, which always yields a 50 character string.

use crate::error::{MedShareError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Base58Check version byte for account addresses.
pub const ACCOUNT_ADDRESS_VERSION: u8 = 1;

/// Raw address length in bytes.
pub const ACCOUNT_ADDRESS_SIZE: usize = 32;

const MIN_ENCODED_LEN: usize = 50;
const MAX_ENCODED_LEN: usize = 52;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountAddress([u8; ACCOUNT_ADDRESS_SIZE]);

impl AccountAddress {
    pub fn from_bytes(bytes: [u8; ACCOUNT_ADDRESS_SIZE]) -> Self {
        AccountAddress(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ACCOUNT_ADDRESS_SIZE] {
        &self.0
    }

    /// Decodes a Base58Check address, verifying pattern, checksum, version
    /// byte and payload length.
    pub fn parse(s: &str) -> Result<Self> {
        if !matches_address_pattern(s) {
            return Err(MedShareError::Validation(format!(
                "Invalid account address format: '{}'",
                s
            )));
        }

        let decoded = bs58::decode(s)
            .with_check(None)
            .into_vec()
            .map_err(|e| MedShareError::Validation(format!("Invalid account address: {}", e)))?;

        let (version, payload) = decoded
            .split_first()
            .ok_or_else(|| MedShareError::Validation("Empty account address".to_string()))?;

        if *version != ACCOUNT_ADDRESS_VERSION {
            return Err(MedShareError::Validation(format!(
                "Unexpected address version byte {}",
                version
            )));
        }

        let bytes: [u8; ACCOUNT_ADDRESS_SIZE] = payload.try_into().map_err(|_| {
            MedShareError::Validation(format!(
                "Account address must be {} bytes, got {}",
                ACCOUNT_ADDRESS_SIZE,
                payload.len()
            ))
        })?;

        Ok(AccountAddress(bytes))
    }

    /// Normalized Base58Check form.
    pub fn to_base58(&self) -> String {
        let mut versioned = Vec::with_capacity(ACCOUNT_ADDRESS_SIZE + 1);
        versioned.push(ACCOUNT_ADDRESS_VERSION);
        versioned.extend_from_slice(&self.0);
        bs58::encode(versioned).with_check().into_string()
    }
}

/// Alphabet and length check equivalent to `^[1-9A-HJ-NP-Za-km-z]{50,52}$`.
pub fn matches_address_pattern(s: &str) -> bool {
    (MIN_ENCODED_LEN..=MAX_ENCODED_LEN).contains(&s.len())
        && s.chars().all(|c| match c {
            '1'..='9' => true,
            'A'..='H' | 'J'..='N' | 'P'..='Z' => true,
            'a'..='k' | 'm'..='z' => true,
            _ => false,
        })
}

/// True if `s` is a well-formed account address.
pub fn is_valid_account_address(s: &str) -> bool {
    AccountAddress::parse(s).is_ok()
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl fmt::Debug for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "AccountAddress({})", self.to_base58())
    }
}

impl FromStr for AccountAddress {
    type Err = MedShareError;

    fn from_str(s: &str) -> Result<Self> {
        AccountAddress::parse(s)
    }
}

impl Serialize for AccountAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base58())
    }
}

impl<'de> Deserialize<'de> for AccountAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        AccountAddress::parse(&s).map_err(serde::de::Error::custom)
    }
}
