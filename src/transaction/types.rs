/// Transaction types for MedShare
use crate::address::AccountAddress;
use crate::amount::CcdAmount;
use crate::transaction::encoding;
use crate::wallet::SignatureMap;
use chrono::Utc;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Static energy estimate for a simple transfer (with or without memo).
pub const TRANSFER_ENERGY: u64 = 300;

/// Static energy estimate for a RegisterData transaction.
pub const REGISTER_DATA_ENERGY: u64 = 700;

/// Default expiry horizon for prepared transactions.
pub const DEFAULT_EXPIRY_MINUTES: u64 = 60;

/// Absolute transaction expiry in seconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct TransactionExpiry(u64);

impl TransactionExpiry {
    pub fn from_epoch_seconds(seconds: u64) -> Self {
        TransactionExpiry(seconds)
    }

    pub fn minutes_from_now(minutes: u64) -> Self {
        let now = Utc::now().timestamp().max(0) as u64;
        TransactionExpiry(now.saturating_add(minutes.saturating_mul(60)))
    }

    pub fn epoch_seconds(&self) -> u64 {
        self.0
    }
}

impl Default for TransactionExpiry {
    fn default() -> Self {
        Self::minutes_from_now(DEFAULT_EXPIRY_MINUTES)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ContractAddress {
    pub index: u64,
    pub subindex: u64,
}

impl std::fmt::Display for ContractAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "<{},{}>", self.index, self.subindex)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionHeader {
    pub sender: AccountAddress,
    pub nonce: u64,
    /// Energy the sender is willing to pay for.
    pub energy: u64,
    pub expiry: TransactionExpiry,
}

/// What the transaction does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Transfer {
        to: AccountAddress,
        amount: CcdAmount,
        memo: Option<Vec<u8>>,
    },
    RegisterData {
        data: Vec<u8>,
    },
    ContractCall {
        contract: ContractAddress,
        receive_name: String,
        amount: CcdAmount,
        max_energy: u64,
        parameter: Vec<u8>,
    },
}

/// Wire-level transaction kind; the discriminant is the payload tag byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TransactionKind {
    Update = 2,
    Transfer = 3,
    RegisterData = 21,
    TransferWithMemo = 22,
}

impl TransactionKind {
    pub fn tag(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TransactionKind::Update => "update",
            TransactionKind::Transfer => "transfer",
            TransactionKind::RegisterData => "registerData",
            TransactionKind::TransferWithMemo => "transferWithMemo",
        }
    }
}

impl Payload {
    pub fn kind(&self) -> TransactionKind {
        match self {
            Payload::Transfer { memo: None, .. } => TransactionKind::Transfer,
            Payload::Transfer { memo: Some(_), .. } => TransactionKind::TransferWithMemo,
            Payload::RegisterData { .. } => TransactionKind::RegisterData,
            Payload::ContractCall { .. } => TransactionKind::Update,
        }
    }

    /// Energy estimate per operation kind. This is a fixed table, not a
    /// function of payload size; contract calls use their own ceiling.
    pub fn estimated_energy(&self) -> u64 {
        match self {
            Payload::Transfer { .. } => TRANSFER_ENERGY,
            Payload::RegisterData { .. } => REGISTER_DATA_ENERGY,
            Payload::ContractCall { max_energy, .. } => *max_energy,
        }
    }
}

/// Header + payload + their serialized form. Built per request and never
/// persisted.
#[derive(Debug, Clone)]
pub struct PreparedTransaction {
    pub header: TransactionHeader,
    pub payload: Payload,
    bytes: Vec<u8>,
}

impl PreparedTransaction {
    pub(crate) fn new(header: TransactionHeader, payload: Payload) -> Self {
        let bytes = encoding::encode_account_transaction(&header, &payload);
        PreparedTransaction {
            header,
            payload,
            bytes,
        }
    }

    /// Serialized header followed by the serialized payload.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn bytes_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    /// SHA-256 of the serialized transaction; the message account keys sign.
    pub fn sign_digest(&self) -> [u8; 32] {
        Sha256::digest(&self.bytes).into()
    }

    pub fn estimated_energy(&self) -> u64 {
        self.header.energy
    }

    pub fn kind(&self) -> TransactionKind {
        self.payload.kind()
    }
}

/// A prepared transaction together with the account signatures over its
/// sign digest.
#[derive(Debug, Clone)]
pub struct SignedTransaction {
    pub transaction: PreparedTransaction,
    pub signatures: SignatureMap,
}

impl SignedTransaction {
    pub fn new(transaction: PreparedTransaction, signatures: SignatureMap) -> Self {
        SignedTransaction {
            transaction,
            signatures,
        }
    }

    /// Versioned block item bytes, ready for submission.
    pub fn block_item_bytes(&self) -> Vec<u8> {
        encoding::encode_versioned_block_item(self)
    }

    /// Transaction hash as the node reports it: SHA-256 of the unversioned
    /// block item.
    pub fn hash(&self) -> [u8; 32] {
        Sha256::digest(encoding::encode_block_item(self)).into()
    }

    pub fn hash_str(&self) -> String {
        hex::encode(self.hash())
    }
}
