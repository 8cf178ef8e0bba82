//! Cryptographic primitives for MedShare account signing (Ed25519)

use crate::error::MedShareError;
use ed25519_dalek::{
    Signature, Signer, SigningKey, Verifier, VerifyingKey, PUBLIC_KEY_LENGTH, SECRET_KEY_LENGTH,
    SIGNATURE_LENGTH,
};
use rand::rngs::OsRng;
use std::fmt;

/// Signs transaction digests on behalf of one account key.
///
/// `Debug` deliberately omits the secret half.
#[derive(Clone)]
pub struct AccountSigner {
    signing_key: SigningKey,
}

impl AccountSigner {
    /// Generates a new random key using the OS random number generator.
    pub fn generate() -> Self {
        AccountSigner {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Creates a signer from raw secret key bytes.
    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self, MedShareError> {
        let secret: [u8; SECRET_KEY_LENGTH] = bytes.try_into().map_err(|_| {
            MedShareError::Crypto(format!(
                "Secret key must be {} bytes, got {}",
                SECRET_KEY_LENGTH,
                bytes.len()
            ))
        })?;
        Ok(AccountSigner {
            signing_key: SigningKey::from_bytes(&secret),
        })
    }

    /// Creates a signer from a hex encoded secret key, as found in wallet exports.
    pub fn from_secret_hex(hex_str: &str) -> Result<Self, MedShareError> {
        let bytes = hex::decode(hex_str.trim())
            .map_err(|e| MedShareError::Crypto(format!("Invalid hex secret key: {}", e)))?;
        Self::from_secret_bytes(&bytes)
    }

    pub fn public_key_bytes(&self) -> [u8; PUBLIC_KEY_LENGTH] {
        self.signing_key.verifying_key().to_bytes()
    }

    pub fn sign(&self, message: &[u8]) -> [u8; SIGNATURE_LENGTH] {
        self.signing_key.sign(message).to_bytes()
    }
}

impl fmt::Debug for AccountSigner {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("AccountSigner")
            .field("public_key", &hex::encode(self.public_key_bytes()))
            .finish()
    }
}

/// Verifies an Ed25519 signature given raw public key, message and signature bytes.
pub fn verify_signature(
    public_key_bytes: &[u8],
    message: &[u8],
    signature_bytes: &[u8],
) -> Result<(), MedShareError> {
    let public_key: [u8; PUBLIC_KEY_LENGTH] = public_key_bytes.try_into().map_err(|_| {
        MedShareError::Crypto(format!(
            "Public key must be exactly {} bytes, got {}",
            PUBLIC_KEY_LENGTH,
            public_key_bytes.len()
        ))
    })?;
    if signature_bytes.len() != SIGNATURE_LENGTH {
        return Err(MedShareError::Crypto(format!(
            "Signature must be exactly {} bytes, got {}",
            SIGNATURE_LENGTH,
            signature_bytes.len()
        )));
    }

    let verifying_key = VerifyingKey::from_bytes(&public_key)
        .map_err(|e| MedShareError::Crypto(format!("Invalid public key: {}", e)))?;
    let signature = Signature::from_slice(signature_bytes)
        .map_err(|e| MedShareError::Crypto(format!("Invalid signature: {}", e)))?;

    verifying_key
        .verify(message, &signature)
        .map_err(|_| MedShareError::Crypto("Signature verification failed".to_string()))
}
