//! Access to the Concordium node.
//!
//! Handlers only see the `ChainClient` trait. `HttpChainClient` talks to a
//! wallet-proxy style JSON API; `MockChainClient` keeps accounts in memory
//! and is used by tests and the `mock` chain backend.

pub mod http;
pub mod mock;

use crate::address::AccountAddress;
use crate::amount::CcdAmount;
use crate::error::Result;
use crate::transaction::SignedTransaction;
use async_trait::async_trait;
use serde::Serialize;

pub use http::HttpChainClient;
pub use mock::MockChainClient;

/// Finalized state of an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountInfo {
    pub address: AccountAddress,
    pub balance: CcdAmount,
    pub next_nonce: u64,
}

/// One entry of an account's transaction history.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: u64,
    pub block_time: Option<f64>,
    pub transaction_hash: Option<String>,
    pub kind: String,
    pub outcome: String,
    pub description: Option<String>,
}

#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Short identifier used in logs and the health endpoint.
    fn name(&self) -> &'static str;

    /// Succeeds when the node answers at all.
    async fn check_connection(&self) -> Result<()>;

    /// The nonce the node expects on the account's next transaction.
    async fn next_account_nonce(&self, address: &AccountAddress) -> Result<u64>;

    /// `None` when the node does not know the account.
    async fn account_info(&self, address: &AccountAddress) -> Result<Option<AccountInfo>>;

    /// Most recent transactions first.
    async fn transaction_history(
        &self,
        address: &AccountAddress,
        limit: u32,
    ) -> Result<Vec<HistoryEntry>>;

    /// Submits a signed transaction and returns its hash as hex.
    async fn submit_transaction(&self, transaction: &SignedTransaction) -> Result<String>;
}
