//! Configuration management for MedShare
//!
//! Settings come from an optional `config.toml`, fall back to defaults when
//! the file is absent, and are then overridden by environment variables
//! (`PORT`, `DATABASE_PATH`, `CONCORDIUM_NODE_URL`, `JWT_SECRET`,
//! `JWT_EXPIRATION`).

use crate::error::{MedShareError, Result};
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

const DEFAULT_CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub chain: ChainConfig,
    #[serde(default)]
    pub contract: ContractConfig,
    #[serde(default)]
    pub donation: DonationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserStoreBackend {
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_user_store")]
    pub backend: UserStoreBackend,
    #[serde(default = "default_db_path")]
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub jwt_secret: String,
    /// Token lifetime in humantime notation, e.g. `24h` or `30m`.
    #[serde(default = "default_token_ttl")]
    pub token_ttl: String,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChainBackend {
    Node,
    Mock,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
    #[serde(default = "default_chain_backend")]
    pub backend: ChainBackend,
    #[serde(default = "default_node_url")]
    pub node_url: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_expiry_minutes")]
    pub expiry_minutes: u64,
    /// CCD credited to accounts the mock backend opens on first use.
    #[serde(default = "default_mock_opening_balance")]
    pub mock_opening_balance_ccd: u64,
}

/// Coordinates of the consent-registry smart contract.
#[derive(Debug, Clone, Deserialize)]
pub struct ContractConfig {
    #[serde(default = "default_contract_index")]
    pub index: u64,
    #[serde(default)]
    pub subindex: u64,
    #[serde(default = "default_contract_name")]
    pub name: String,
    #[serde(default = "default_consent_method")]
    pub consent_method: String,
    #[serde(default = "default_max_energy")]
    pub max_energy: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DonationConfig {
    /// Recipient used when a donation request omits `toAddress`.
    #[serde(default)]
    pub default_recipient: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: default_user_store(),
            path: default_db_path(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl: default_token_ttl(),
        }
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            backend: default_chain_backend(),
            node_url: default_node_url(),
            request_timeout_secs: default_request_timeout(),
            expiry_minutes: default_expiry_minutes(),
            mock_opening_balance_ccd: default_mock_opening_balance(),
        }
    }
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            index: default_contract_index(),
            subindex: 0,
            name: default_contract_name(),
            consent_method: default_consent_method(),
            max_energy: default_max_energy(),
        }
    }
}

impl AuthConfig {
    pub fn token_ttl(&self) -> Result<Duration> {
        humantime::parse_duration(&self.token_ttl).map_err(|e| {
            MedShareError::Config(format!("Invalid token lifetime '{}': {}", self.token_ttl, e))
        })
    }
}

impl ChainConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl ContractConfig {
    /// Fully qualified receive name, `<contract>.<method>`.
    pub fn consent_receive_name(&self) -> String {
        format!("{}.{}", self.name, self.consent_method)
    }
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| MedShareError::Config(format!("Invalid config: {}", e)))
    }

    /// Applies overrides from a variable lookup. Split out from
    /// `apply_env` so tests can feed a fixed map instead of the process env.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| MedShareError::Config(format!("Invalid PORT '{}'", port)))?;
        }
        if let Some(path) = lookup("DATABASE_PATH") {
            self.database.path = path;
            self.database.backend = UserStoreBackend::Sqlite;
        }
        if let Some(url) = lookup("CONCORDIUM_NODE_URL") {
            self.chain.node_url = url;
        }
        if let Some(secret) = lookup("JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Some(ttl) = lookup("JWT_EXPIRATION") {
            self.auth.token_ttl = ttl;
        }
        Ok(())
    }

    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Validate critical values
    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.is_empty() {
            return Err(MedShareError::Config(
                "auth.jwt_secret (or JWT_SECRET) must be set".to_string(),
            ));
        }
        self.auth.token_ttl()?;

        if self.chain.backend == ChainBackend::Node
            && !(self.chain.node_url.starts_with("http://")
                || self.chain.node_url.starts_with("https://"))
        {
            return Err(MedShareError::Config(format!(
                "chain.node_url must be an http(s) URL, got '{}'",
                self.chain.node_url
            )));
        }

        if self.database.backend == UserStoreBackend::Sqlite && self.database.path.is_empty() {
            return Err(MedShareError::Config(
                "database.path must be set for the sqlite backend".to_string(),
            ));
        }

        if self.contract.max_energy == 0 {
            return Err(MedShareError::Config(
                "contract.max_energy must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

/// Loads `path` (or `config.toml` in the working directory when `None`),
/// applies environment overrides and validates the result.
///
/// Only a missing default file falls back to built-in defaults; an explicit
/// path that cannot be read is an error.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config_str = match path {
        Some(path) => fs::read_to_string(path).map_err(|e| {
            MedShareError::Config(format!("Cannot read config file {}: {}", path.display(), e))
        })?,
        None => match fs::read_to_string(DEFAULT_CONFIG_FILE) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
            Err(e) => {
                return Err(MedShareError::Config(format!(
                    "Cannot read config file {}: {}",
                    DEFAULT_CONFIG_FILE, e
                )))
            }
        },
    };

    // Provide sane defaults when the file is absent
    let mut config = if config_str.trim().is_empty() {
        Config::from_toml_str("")?
    } else {
        Config::from_toml_str(&config_str)?
    };

    config.apply_env()?;
    config.validate()?;
    Ok(config)
}

fn default_port() -> u16 {
    5000
}

fn default_user_store() -> UserStoreBackend {
    UserStoreBackend::Memory
}

fn default_db_path() -> String {
    "medshare.db".to_string()
}

fn default_token_ttl() -> String {
    "24h".to_string()
}

fn default_chain_backend() -> ChainBackend {
    ChainBackend::Node
}

fn default_node_url() -> String {
    "https://wallet-proxy.testnet.concordium.com".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

fn default_expiry_minutes() -> u64 {
    60
}

fn default_mock_opening_balance() -> u64 {
    1_000
}

fn default_contract_index() -> u64 {
    0
}

fn default_contract_name() -> String {
    "medshare_consent".to_string()
}

fn default_consent_method() -> String {
    "give_consent".to_string()
}

fn default_max_energy() -> u64 {
    30_000
}
