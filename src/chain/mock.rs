//! In-memory `ChainClient` used by tests and the `mock` chain backend.

use super::{AccountInfo, ChainClient, HistoryEntry};
use crate::address::AccountAddress;
use crate::amount::CcdAmount;
use crate::error::{MedShareError, Result};
use crate::transaction::{Payload, SignedTransaction};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone)]
struct MockAccount {
    balance: CcdAmount,
    next_nonce: u64,
    history: Vec<HistoryEntry>,
}

#[derive(Default)]
pub struct MockChainClient {
    accounts: RwLock<HashMap<AccountAddress, MockAccount>>,
    submitted: Mutex<Vec<SignedTransaction>>,
    fallback_nonce: bool,
    opening_balance: Option<CcdAmount>,
    unreachable: AtomicBool,
}

/// Next nonce of an account that has never transacted.
pub const FIRST_NONCE: u64 = 1;

impl MockChainClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an account with a balance and its next expected nonce.
    pub fn with_account(self, address: AccountAddress, balance: CcdAmount, next_nonce: u64) -> Self {
        self.accounts.write().insert(
            address,
            MockAccount {
                balance,
                next_nonce,
                history: Vec::new(),
            },
        );
        self
    }

    /// Opt-in: answer nonce queries that would fail with a time-derived
    /// guess instead of an error. The guess has no relation to what a real
    /// node expects.
    pub fn with_fallback_nonce(mut self) -> Self {
        self.fallback_nonce = true;
        self
    }

    /// Opens unknown accounts on first use with `balance` and nonce
    /// `FIRST_NONCE`, so any well-formed address can transact.
    pub fn with_open_accounts(mut self, balance: CcdAmount) -> Self {
        self.opening_balance = Some(balance);
        self
    }

    /// Makes every query fail as if the node could not be reached.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Transactions accepted so far, oldest first.
    pub fn submitted(&self) -> Vec<SignedTransaction> {
        self.submitted.lock().clone()
    }

    fn check_reachable(&self) -> Result<()> {
        if self.unreachable.load(Ordering::SeqCst) {
            Err(MedShareError::Node("mock node unreachable".to_string()))
        } else {
            Ok(())
        }
    }

    fn open_account(&self, address: &AccountAddress) {
        let Some(balance) = self.opening_balance else {
            return;
        };
        let mut accounts = self.accounts.write();
        if !accounts.contains_key(address) {
            tracing::debug!(account = %address, "opening mock account");
            accounts.insert(
                *address,
                MockAccount {
                    balance,
                    next_nonce: FIRST_NONCE,
                    history: Vec::new(),
                },
            );
        }
    }

    fn guessed_nonce() -> u64 {
        (Utc::now().timestamp_millis().max(0) as u64) % 1_000_000
    }
}

#[async_trait]
impl ChainClient for MockChainClient {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn check_connection(&self) -> Result<()> {
        self.check_reachable()
    }

    async fn next_account_nonce(&self, address: &AccountAddress) -> Result<u64> {
        let result = self.check_reachable().and_then(|_| {
            self.open_account(address);
            self.accounts
                .read()
                .get(address)
                .map(|account| account.next_nonce)
                .ok_or_else(|| MedShareError::Node(format!("Account {} not found", address)))
        });

        match result {
            Err(e) if self.fallback_nonce => {
                let guess = Self::guessed_nonce();
                tracing::warn!(account = %address, error = %e, nonce = guess, "using fallback nonce");
                Ok(guess)
            }
            other => other,
        }
    }

    async fn account_info(&self, address: &AccountAddress) -> Result<Option<AccountInfo>> {
        self.check_reachable()?;
        self.open_account(address);
        Ok(self.accounts.read().get(address).map(|account| AccountInfo {
            address: *address,
            balance: account.balance,
            next_nonce: account.next_nonce,
        }))
    }

    async fn transaction_history(
        &self,
        address: &AccountAddress,
        limit: u32,
    ) -> Result<Vec<HistoryEntry>> {
        self.check_reachable()?;
        Ok(self
            .accounts
            .read()
            .get(address)
            .map(|account| {
                account
                    .history
                    .iter()
                    .rev()
                    .take(limit as usize)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn submit_transaction(&self, transaction: &SignedTransaction) -> Result<String> {
        self.check_reachable()?;
        let header = &transaction.transaction.header;
        let hash = transaction.hash_str();
        self.open_account(&header.sender);
        if let Payload::Transfer { to, .. } = &transaction.transaction.payload {
            self.open_account(to);
        }

        let mut accounts = self.accounts.write();
        let sender = accounts
            .get_mut(&header.sender)
            .ok_or_else(|| MedShareError::Node(format!("Account {} not found", header.sender)))?;

        if header.nonce != sender.next_nonce {
            return Err(MedShareError::Node(format!(
                "Nonce mismatch: expected {}, got {}",
                sender.next_nonce, header.nonce
            )));
        }

        let transferred = match &transaction.transaction.payload {
            Payload::Transfer { to, amount, .. } => Some((*to, *amount)),
            _ => None,
        };

        if let Some((_, amount)) = transferred {
            let remaining = sender
                .balance
                .micro_ccd()
                .checked_sub(amount.micro_ccd())
                .ok_or_else(|| MedShareError::Node("Insufficient balance".to_string()))?;
            sender.balance = CcdAmount::from_micro_ccd(remaining);
        }

        sender.next_nonce += 1;
        let id = sender.history.len() as u64 + 1;
        sender.history.push(HistoryEntry {
            id,
            block_time: Some(Utc::now().timestamp() as f64),
            transaction_hash: Some(hash.clone()),
            kind: transaction.transaction.kind().as_str().to_string(),
            outcome: "success".to_string(),
            description: None,
        });

        if let Some((to, amount)) = transferred {
            if let Some(recipient) = accounts.get_mut(&to) {
                recipient.balance =
                    CcdAmount::from_micro_ccd(recipient.balance.micro_ccd().saturating_add(amount.micro_ccd()));
            }
        }
        drop(accounts);

        self.submitted.lock().push(transaction.clone());
        Ok(hash)
    }
}
