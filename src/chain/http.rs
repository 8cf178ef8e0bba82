//! `ChainClient` backed by a wallet-proxy style HTTP API.
//!
//! Endpoints used, relative to the configured base URL:
//!
//! - `GET  /v0/accNonce/{address}`: `{"nonce": 5, "allFinal": true}`
//! - `GET  /v0/accBalance/{address}`: `{"finalizedBalance": {"accountAmount": "..", "accountNonce": 5}}`
//! - `GET  /v1/accTransactions/{address}?limit=N&order=descending`
//! - `GET  /v0/health`: reachability only
//! - `PUT  /v0/submitTransfer`: `{"signatures": {..}, "transaction": "<hex>"}`

use super::{AccountInfo, ChainClient, HistoryEntry};
use crate::address::AccountAddress;
use crate::amount::CcdAmount;
use crate::error::{MedShareError, Result};
use crate::transaction::SignedTransaction;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

pub struct HttpChainClient {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct NonceResponse {
    nonce: u64,
    #[serde(rename = "allFinal", default)]
    all_final: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BalanceResponse {
    finalized_balance: Option<BalanceEntry>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BalanceEntry {
    account_amount: String,
    account_nonce: u64,
}

#[derive(Deserialize)]
struct HistoryResponse {
    #[serde(default)]
    transactions: Vec<RawHistoryEntry>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawHistoryEntry {
    id: u64,
    block_time: Option<f64>,
    transaction_hash: Option<String>,
    details: RawHistoryDetails,
}

#[derive(Deserialize)]
struct RawHistoryDetails {
    #[serde(rename = "type")]
    kind: String,
    outcome: String,
    description: Option<String>,
}

#[derive(Serialize)]
struct SubmitRequest {
    signatures: BTreeMap<String, BTreeMap<String, String>>,
    transaction: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitResponse {
    submission_id: String,
}

impl HttpChainClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MedShareError::Node(format!("Failed to build HTTP client: {}", e)))?;
        Ok(HttpChainClient {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<Option<T>> {
        let response = self.client.get(self.url(path)).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.json().await?)),
            status => Err(MedShareError::Node(format!("GET {} returned {}", path, status))),
        }
    }
}

#[async_trait]
impl ChainClient for HttpChainClient {
    fn name(&self) -> &'static str {
        "node"
    }

    async fn check_connection(&self) -> Result<()> {
        let response = self.client.get(self.url("/v0/health")).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(MedShareError::Node(format!("GET /v0/health returned {}", status)))
        }
    }

    async fn next_account_nonce(&self, address: &AccountAddress) -> Result<u64> {
        let path = format!("/v0/accNonce/{}", address);
        let response: NonceResponse = self
            .get_json(&path)
            .await?
            .ok_or_else(|| MedShareError::Node(format!("Account {} not found", address)))?;
        if !response.all_final {
            tracing::debug!(account = %address, "account has non-finalized transactions");
        }
        Ok(response.nonce)
    }

    async fn account_info(&self, address: &AccountAddress) -> Result<Option<AccountInfo>> {
        let path = format!("/v0/accBalance/{}", address);
        let Some(response) = self.get_json::<BalanceResponse>(&path).await? else {
            return Ok(None);
        };
        let Some(balance) = response.finalized_balance else {
            return Ok(None);
        };

        let micro_ccd: u64 = balance.account_amount.parse().map_err(|_| {
            MedShareError::Node(format!(
                "Unparseable account amount '{}'",
                balance.account_amount
            ))
        })?;

        Ok(Some(AccountInfo {
            address: *address,
            balance: CcdAmount::from_micro_ccd(micro_ccd),
            next_nonce: balance.account_nonce,
        }))
    }

    async fn transaction_history(
        &self,
        address: &AccountAddress,
        limit: u32,
    ) -> Result<Vec<HistoryEntry>> {
        let path = format!(
            "/v1/accTransactions/{}?limit={}&order=descending",
            address, limit
        );
        let response: HistoryResponse = match self.get_json(&path).await? {
            Some(r) => r,
            None => return Ok(Vec::new()),
        };

        Ok(response
            .transactions
            .into_iter()
            .map(|raw| HistoryEntry {
                id: raw.id,
                block_time: raw.block_time,
                transaction_hash: raw.transaction_hash,
                kind: raw.details.kind,
                outcome: raw.details.outcome,
                description: raw.details.description,
            })
            .collect())
    }

    async fn submit_transaction(&self, transaction: &SignedTransaction) -> Result<String> {
        let signatures = transaction
            .signatures
            .iter()
            .map(|(cred, keys)| {
                let keys = keys
                    .iter()
                    .map(|(key, sig)| (key.to_string(), hex::encode(sig)))
                    .collect();
                (cred.to_string(), keys)
            })
            .collect();

        let body = SubmitRequest {
            signatures,
            transaction: transaction.transaction.bytes_hex(),
        };

        let response = self
            .client
            .put(self.url("/v0/submitTransfer"))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MedShareError::Node(format!(
                "Transaction submission returned {}",
                status
            )));
        }

        let submitted: SubmitResponse = response.json().await?;
        Ok(submitted.submission_id)
    }
}
