//! Assembles header and payload into a `PreparedTransaction`.
//!
//! The builder only serializes: it never signs or transmits.

use super::types::{
    ContractAddress, Payload, PreparedTransaction, TransactionExpiry, TransactionHeader,
};
use super::validation::validate_payload;
use crate::address::AccountAddress;
use crate::amount::CcdAmount;
use crate::error::{MedShareError, Result};
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    sender: AccountAddress,
    nonce: u64,
    expiry: TransactionExpiry,
}

/// Inputs for a smart contract update call.
#[derive(Debug, Clone)]
pub struct ContractCall {
    pub contract: ContractAddress,
    pub receive_name: String,
    pub max_energy: u64,
    pub amount: CcdAmount,
    pub parameter: Vec<u8>,
}

impl ContractCall {
    /// Builds a call whose parameter is `params` serialized as JSON.
    pub fn with_json_parameter<P: Serialize>(
        contract: ContractAddress,
        receive_name: impl Into<String>,
        max_energy: u64,
        params: &P,
    ) -> Result<Self> {
        let parameter = serde_json::to_vec(params).map_err(|e| {
            MedShareError::Validation(format!("Unserializable contract parameter: {}", e))
        })?;
        Ok(ContractCall {
            contract,
            receive_name: receive_name.into(),
            max_energy,
            amount: CcdAmount::ZERO,
            parameter,
        })
    }
}

impl TransactionBuilder {
    /// Starts a builder with the default 60 minute expiry.
    pub fn new(sender: AccountAddress, nonce: u64) -> Self {
        TransactionBuilder {
            sender,
            nonce,
            expiry: TransactionExpiry::default(),
        }
    }

    pub fn expiry(mut self, expiry: TransactionExpiry) -> Self {
        self.expiry = expiry;
        self
    }

    pub fn expires_in_minutes(self, minutes: u64) -> Self {
        self.expiry(TransactionExpiry::minutes_from_now(minutes))
    }

    pub fn transfer(
        self,
        to: AccountAddress,
        amount: CcdAmount,
        memo: Option<Vec<u8>>,
    ) -> Result<PreparedTransaction> {
        self.build(Payload::Transfer { to, amount, memo })
    }

    pub fn register_data(self, data: Vec<u8>) -> Result<PreparedTransaction> {
        self.build(Payload::RegisterData { data })
    }

    pub fn contract_call(self, call: ContractCall) -> Result<PreparedTransaction> {
        self.build(Payload::ContractCall {
            contract: call.contract,
            receive_name: call.receive_name,
            amount: call.amount,
            max_energy: call.max_energy,
            parameter: call.parameter,
        })
    }

    pub fn build(self, payload: Payload) -> Result<PreparedTransaction> {
        validate_payload(&payload)?;

        let header = TransactionHeader {
            sender: self.sender,
            nonce: self.nonce,
            energy: payload.estimated_energy(),
            expiry: self.expiry,
        };

        Ok(PreparedTransaction::new(header, payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::encoding::HEADER_SIZE;
    use crate::transaction::types::{
        TransactionKind, DEFAULT_EXPIRY_MINUTES, REGISTER_DATA_ENERGY, TRANSFER_ENERGY,
    };
    use chrono::Utc;
    use serde_json::json;

    fn sender() -> AccountAddress {
        AccountAddress::from_bytes([3u8; 32])
    }

    fn recipient() -> AccountAddress {
        AccountAddress::from_bytes([4u8; 32])
    }

    #[test]
    fn test_default_expiry_is_an_hour_out() {
        let before = Utc::now().timestamp() as u64;
        let tx = TransactionBuilder::new(sender(), 1)
            .transfer(recipient(), CcdAmount::from_micro_ccd(1), None)
            .unwrap();
        let expiry = tx.header.expiry.epoch_seconds();
        let horizon = DEFAULT_EXPIRY_MINUTES * 60;
        assert!(expiry >= before + horizon);
        assert!(expiry <= before + horizon + 5);
    }

    #[test]
    fn test_transfer_header() {
        let tx = TransactionBuilder::new(sender(), 42)
            .expiry(TransactionExpiry::from_epoch_seconds(100))
            .transfer(recipient(), CcdAmount::from_micro_ccd(2_000_000), None)
            .unwrap();

        assert_eq!(tx.header.sender, sender());
        assert_eq!(tx.header.nonce, 42);
        assert_eq!(tx.header.energy, TRANSFER_ENERGY);
        assert_eq!(tx.kind(), TransactionKind::Transfer);
        assert_eq!(tx.bytes().len(), HEADER_SIZE + 41);
        assert_eq!(tx.bytes_hex().len(), tx.bytes().len() * 2);
    }

    #[test]
    fn test_memo_switches_kind() {
        let tx = TransactionBuilder::new(sender(), 1)
            .transfer(recipient(), CcdAmount::from_micro_ccd(1), Some(b"thanks".to_vec()))
            .unwrap();
        assert_eq!(tx.kind(), TransactionKind::TransferWithMemo);
        assert_eq!(tx.estimated_energy(), TRANSFER_ENERGY);
    }

    #[test]
    fn test_register_data() {
        let tx = TransactionBuilder::new(sender(), 5)
            .register_data(vec![0xca, 0xfe])
            .unwrap();
        assert_eq!(tx.kind(), TransactionKind::RegisterData);
        assert_eq!(tx.estimated_energy(), REGISTER_DATA_ENERGY);
        assert!(TransactionBuilder::new(sender(), 5)
            .register_data(vec![])
            .is_err());
    }

    #[test]
    fn test_contract_call_uses_energy_ceiling() {
        let call = ContractCall::with_json_parameter(
            ContractAddress {
                index: 7,
                subindex: 0,
            },
            "medshare_consent.give_consent",
            12_345,
            &json!({ "fileName": "scan.pdf" }),
        )
        .unwrap();
        let tx = TransactionBuilder::new(sender(), 9).contract_call(call).unwrap();
        assert_eq!(tx.kind(), TransactionKind::Update);
        assert_eq!(tx.estimated_energy(), 12_345);
    }

    #[test]
    fn test_sign_digest_depends_on_nonce() {
        let build = |nonce| {
            TransactionBuilder::new(sender(), nonce)
                .expiry(TransactionExpiry::from_epoch_seconds(1))
                .register_data(vec![1])
                .unwrap()
        };
        assert_eq!(build(1).sign_digest(), build(1).sign_digest());
        assert_ne!(build(1).sign_digest(), build(2).sign_digest());
    }
}
