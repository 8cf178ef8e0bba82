//! Password hashing, token issuing and registration input rules.

use crate::error::{MedShareError, Result};
use crate::users::User;
use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::Utc;
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Token payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// User id.
    pub id: String,
    pub email: String,
    pub iat: u64,
    pub exp: u64,
}

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| MedShareError::Crypto(format!("Failed to hash password: {}", e)))
}

/// False for a wrong password and for a hash that cannot be parsed.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Issues and verifies HS256 tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        TokenService {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn issue(&self, user: &User) -> Result<String> {
        let now = Utc::now().timestamp().max(0) as u64;
        let claims = Claims {
            id: user.id.clone(),
            email: user.email.clone(),
            iat: now,
            exp: now.saturating_add(self.ttl.as_secs()),
        };
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| MedShareError::Crypto(format!("Failed to sign token: {}", e)))
    }

    pub fn verify(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => MedShareError::InvalidToken("token expired".to_string()),
                _ => MedShareError::InvalidToken(e.to_string()),
            })
    }
}

/// Same rule as `^[^\s@]+@[^\s@]+\.[^\s@]+$`.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    let clean = |s: &str| !s.is_empty() && !s.chars().any(|c| c == '@' || c.is_whitespace());
    if !clean(local) || !clean(domain) {
        return false;
    }
    // A dot with at least one character on each side.
    let chars: Vec<char> = domain.chars().collect();
    chars.len() >= 3 && chars[1..chars.len() - 1].contains(&'.')
}

/// Checks a registration request; the message is returned to the client.
pub fn validate_registration(email: &str, password: &str, name: &str) -> Result<()> {
    if email.trim().is_empty() || password.is_empty() || name.trim().is_empty() {
        return Err(MedShareError::Validation(
            "Email, password, and name are required".to_string(),
        ));
    }
    if !is_valid_email(email.trim()) {
        return Err(MedShareError::Validation("Invalid email format".to_string()));
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(MedShareError::Validation(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}
