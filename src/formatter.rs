//! Turns prepared transactions into API responses.
//!
//! Every integer that can exceed 2^53 is rendered as a decimal string so
//! JavaScript clients do not lose precision.

use crate::amount::CcdAmount;
use crate::transaction::{Payload, PreparedTransaction};
use serde::Serialize;

/// Fee reported to clients; the node computes the real fee from energy.
const REPORTED_FEE: &str = "0";

const DEFAULT_DATA_TYPE: &str = "medical-record";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionEnvelope {
    /// Hex of the serialized header and payload.
    pub bytes: String,
    /// Hex of the digest the account keys must sign.
    pub hash: String,
    pub estimated_energy: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreparedResponse<D: Serialize> {
    pub transaction: TransactionEnvelope,
    pub transaction_details: D,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationDetails {
    pub from: String,
    pub to: String,
    pub amount: String,
    pub amount_micro_ccd: String,
    pub fee: String,
    pub memo: Option<String>,
    pub cause: Option<String>,
    pub expiry: String,
    pub nonce: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataRegistrationDetails {
    pub account: String,
    pub data_length: usize,
    pub data_type: String,
    pub fee: String,
    pub expiry: String,
    pub nonce: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsentDetails {
    pub account: String,
    pub contract: String,
    pub receive_name: String,
    pub file_name: String,
    pub max_energy: String,
    pub fee: String,
    pub expiry: String,
    pub nonce: String,
}

pub fn envelope(tx: &PreparedTransaction) -> TransactionEnvelope {
    TransactionEnvelope {
        bytes: tx.bytes_hex(),
        hash: hex::encode(tx.sign_digest()),
        estimated_energy: tx.estimated_energy().to_string(),
    }
}

/// Response for a prepared donation. `memo` is echoed as the caller sent it.
pub fn donation_response(
    tx: &PreparedTransaction,
    memo: Option<String>,
    cause: Option<String>,
) -> PreparedResponse<DonationDetails> {
    let (to, amount) = match &tx.payload {
        Payload::Transfer { to, amount, .. } => (to.to_string(), *amount),
        _ => (String::new(), CcdAmount::ZERO),
    };

    PreparedResponse {
        transaction: envelope(tx),
        transaction_details: DonationDetails {
            from: tx.header.sender.to_string(),
            to,
            amount: amount.to_ccd_string(),
            amount_micro_ccd: amount.micro_ccd().to_string(),
            fee: REPORTED_FEE.to_string(),
            memo,
            cause,
            expiry: tx.header.expiry.epoch_seconds().to_string(),
            nonce: tx.header.nonce.to_string(),
        },
        message: "Transaction prepared. Use Concordium Wallet to sign and submit.".to_string(),
    }
}

pub fn data_registration_response(
    tx: &PreparedTransaction,
    data_type: Option<String>,
) -> PreparedResponse<DataRegistrationDetails> {
    let data_length = match &tx.payload {
        Payload::RegisterData { data } => data.len(),
        _ => 0,
    };

    PreparedResponse {
        transaction: envelope(tx),
        transaction_details: DataRegistrationDetails {
            account: tx.header.sender.to_string(),
            data_length,
            data_type: data_type.unwrap_or_else(|| DEFAULT_DATA_TYPE.to_string()),
            fee: REPORTED_FEE.to_string(),
            expiry: tx.header.expiry.epoch_seconds().to_string(),
            nonce: tx.header.nonce.to_string(),
        },
        message: "Register data transaction prepared. Use Concordium Wallet to sign and submit."
            .to_string(),
    }
}

pub fn consent_details(tx: &PreparedTransaction, file_name: &str) -> ConsentDetails {
    let (contract, receive_name, max_energy) = match &tx.payload {
        Payload::ContractCall {
            contract,
            receive_name,
            max_energy,
            ..
        } => (contract.to_string(), receive_name.clone(), *max_energy),
        _ => (String::new(), String::new(), 0),
    };

    ConsentDetails {
        account: tx.header.sender.to_string(),
        contract,
        receive_name,
        file_name: file_name.to_string(),
        max_energy: max_energy.to_string(),
        fee: REPORTED_FEE.to_string(),
        expiry: tx.header.expiry.epoch_seconds().to_string(),
        nonce: tx.header.nonce.to_string(),
    }
}

/// Outcome of a consent request: either submitted on the caller's behalf or
/// handed back for signing in the wallet.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsentResponse {
    pub success: bool,
    pub needs_wallet_signing: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction: Option<TransactionEnvelope>,
    pub transaction_details: ConsentDetails,
    pub message: String,
}

pub fn consent_submitted(tx: &PreparedTransaction, file_name: &str, hash: String) -> ConsentResponse {
    ConsentResponse {
        success: true,
        needs_wallet_signing: false,
        transaction_hash: Some(hash),
        transaction: None,
        transaction_details: consent_details(tx, file_name),
        message: "Consent recorded on the blockchain".to_string(),
    }
}

pub fn consent_unsigned(tx: &PreparedTransaction, file_name: &str) -> ConsentResponse {
    ConsentResponse {
        success: true,
        needs_wallet_signing: true,
        transaction_hash: None,
        transaction: Some(envelope(tx)),
        transaction_details: consent_details(tx, file_name),
        message: "Consent transaction prepared. Use Concordium Wallet to sign and submit."
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::AccountAddress;
    use crate::transaction::{TransactionBuilder, TransactionExpiry};

    fn builder(nonce: u64) -> TransactionBuilder {
        TransactionBuilder::new(AccountAddress::from_bytes([1; 32]), nonce)
            .expiry(TransactionExpiry::from_epoch_seconds(1_900_000_000))
    }

    #[test]
    fn test_donation_response_fields_are_strings() {
        let tx = builder(u64::MAX)
            .transfer(
                AccountAddress::from_bytes([2; 32]),
                CcdAmount::from_micro_ccd(2_500_000),
                Some(b"thanks".to_vec()),
            )
            .unwrap();
        let response = donation_response(&tx, Some("thanks".into()), Some("cancer-research".into()));
        let json = serde_json::to_value(&response).unwrap();

        let details = &json["transactionDetails"];
        assert_eq!(details["amount"], "2.5");
        assert_eq!(details["amountMicroCcd"], "2500000");
        assert_eq!(details["nonce"], u64::MAX.to_string());
        assert_eq!(details["expiry"], "1900000000");
        assert_eq!(details["fee"], "0");
        assert_eq!(details["memo"], "thanks");
        assert_eq!(json["transaction"]["estimatedEnergy"], "300");
        assert_eq!(json["transaction"]["bytes"], tx.bytes_hex());
        assert_eq!(json["transaction"]["hash"].as_str().unwrap().len(), 64);
    }

    #[test]
    fn test_data_registration_defaults() {
        let tx = builder(3).register_data(vec![1, 2, 3]).unwrap();
        let response = data_registration_response(&tx, None);
        assert_eq!(response.transaction_details.data_length, 3);
        assert_eq!(response.transaction_details.data_type, "medical-record");
        assert_eq!(response.transaction.estimated_energy, "700");
    }

    #[test]
    fn test_consent_responses() {
        let call = crate::transaction::ContractCall::with_json_parameter(
            crate::transaction::ContractAddress { index: 7, subindex: 0 },
            "medshare_consent.give_consent",
            30_000,
            &serde_json::json!({"fileName": "scan.pdf"}),
        )
        .unwrap();
        let tx = builder(1).contract_call(call).unwrap();

        let unsigned = serde_json::to_value(consent_unsigned(&tx, "scan.pdf")).unwrap();
        assert_eq!(unsigned["needsWalletSigning"], true);
        assert!(unsigned.get("transactionHash").is_none());
        assert_eq!(unsigned["transactionDetails"]["contract"], "<7,0>");
        assert_eq!(unsigned["transaction"]["estimatedEnergy"], "30000");

        let submitted = serde_json::to_value(consent_submitted(&tx, "scan.pdf", "ab".into())).unwrap();
        assert_eq!(submitted["transactionHash"], "ab");
        assert!(submitted.get("transaction").is_none());
    }
}
