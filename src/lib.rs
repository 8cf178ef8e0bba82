//! MedShare - medical data sharing and donations on Concordium
//!
//! # Architecture
//!
//! The crate is organized into logical modules:
//!
//! ## Accounts
//! - [`users`] - User records and the repository abstraction
//! - [`auth`] - Password hashing, tokens and registration rules
//! - [`persistence`] - SQLite user repository
//!
//! ## Concordium Primitives
//! - [`address`] - Base58Check account addresses
//! - [`amount`] - CCD / microCCD amounts
//! - [`crypto`] - Ed25519 signing and verification
//! - [`wallet`] - Wallet export parsing and transaction signing
//!
//! ## Transactions
//! - [`transaction`] - Payloads, headers, builder and wire encoding
//! - [`formatter`] - API views of prepared transactions
//! - [`nonce`] - Next-nonce resolution
//! - [`chain`] - Node client trait, HTTP and mock implementations
//!
//! ## Integration
//! - [`api`] - REST API (feature `api`)
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types
//! - [`logging`] - Tracing subscriber setup

#![forbid(unsafe_code)]

// ============================================================================
// Accounts
// ============================================================================
pub mod auth;
pub mod persistence;
pub mod users;

// ============================================================================
// Concordium Primitives
// ============================================================================
pub mod address;
pub mod amount;
pub mod crypto;
pub mod wallet;

// ============================================================================
// Transactions
// ============================================================================
pub mod chain;
pub mod formatter;
pub mod nonce;
pub mod transaction;

// ============================================================================
// Integration
// ============================================================================
#[cfg(feature = "api")]
pub mod api;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;
pub mod logging;
