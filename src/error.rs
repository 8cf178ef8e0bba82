//! Error types for MedShare

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MedShareError {
    #[error("{0}")]
    Validation(String),
    #[error("User already exists")]
    UserExists,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Access denied. No token provided.")]
    MissingToken,
    #[error("Invalid token: {0}")]
    InvalidToken(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Invalid wallet export: {0}")]
    WalletExport(String),
    #[error("Could not resolve account nonce: {0}")]
    NonceUnavailable(String),
    #[error("Node error: {0}")]
    Node(String),
    #[error("Database error: {0}")]
    Database(String),
    #[error("Cryptographic error: {0}")]
    Crypto(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl MedShareError {
    /// True for failures caused by the caller's input rather than by the
    /// server or one of its collaborators.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            MedShareError::Validation(_)
                | MedShareError::UserExists
                | MedShareError::InvalidCredentials
                | MedShareError::MissingToken
                | MedShareError::InvalidToken(_)
                | MedShareError::NotFound(_)
                | MedShareError::WalletExport(_)
        )
    }
}

impl From<reqwest::Error> for MedShareError {
    fn from(err: reqwest::Error) -> Self {
        MedShareError::Node(err.to_string())
    }
}

impl From<std::io::Error> for MedShareError {
    fn from(err: std::io::Error) -> Self {
        MedShareError::Internal(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, MedShareError>;
