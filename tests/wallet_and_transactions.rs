//! Integration tests for wallet exports and the transaction pipeline

use medshare::address::AccountAddress;
use medshare::amount::CcdAmount;
use medshare::chain::{ChainClient, MockChainClient};
use medshare::config::{load_config, ChainBackend, UserStoreBackend};
use medshare::crypto::{verify_signature, AccountSigner};
use medshare::nonce::resolve_next_nonce;
use medshare::transaction::{SignedTransaction, TransactionBuilder, TransactionKind};
use medshare::users::{NewUser, UserRepository};
use medshare::wallet::parse_wallet_export;
use serde_json::json;
use std::io::Write;
use tempfile::TempDir;

const SIGN_KEY: &str = "4ccd089b28ff96da9db6c346ec114e0f5b8a319f35aba624da8cf6ed4fb8a6fb";

/// Helper to build a wallet export carrying a single sign key
fn create_test_export(address: AccountAddress) -> (String, AccountSigner) {
    let signer = AccountSigner::from_secret_hex(SIGN_KEY).unwrap();
    let export = json!({
        "type": "concordium-browser-wallet-account",
        "value": {
            "address": address.to_string(),
            "accountKeys": {
                "keys": { "0": { "keys": { "0": {
                    "signKey": SIGN_KEY,
                    "verifyKey": hex::encode(signer.public_key_bytes())
                } } } },
                "threshold": 1
            }
        }
    });
    (export.to_string(), signer)
}

fn alice() -> AccountAddress {
    AccountAddress::from_bytes([0xa1; 32])
}

fn bob() -> AccountAddress {
    AccountAddress::from_bytes([0xb0; 32])
}

#[test]
fn test_address_text_form_is_stable() -> Result<(), Box<dyn std::error::Error>> {
    let text = alice().to_string();
    assert_eq!(text.len(), 50);

    let reparsed = AccountAddress::parse(&text)?;
    assert_eq!(reparsed, alice());
    assert_eq!(reparsed.to_string(), text);

    // Flipping one character breaks the checksum.
    let mut corrupted: Vec<char> = text.chars().collect();
    corrupted[10] = if corrupted[10] == 'a' { 'b' } else { 'a' };
    let corrupted: String = corrupted.into_iter().collect();
    assert!(AccountAddress::parse(&corrupted).is_err());

    Ok(())
}

#[tokio::test]
async fn test_signed_transfer_through_mock_chain() -> Result<(), Box<dyn std::error::Error>> {
    let chain = MockChainClient::new()
        .with_account(alice(), CcdAmount::from_ccd(5)?, 0)
        .with_account(bob(), CcdAmount::ZERO, 0);

    let (raw_export, signer) = create_test_export(alice());
    let export = parse_wallet_export(&raw_export)?;
    assert_eq!(export.address, alice());
    let tx_signer = export.signer().ok_or("export should carry keys")?;

    let nonce = resolve_next_nonce(&chain, &export.address).await?;
    let tx = TransactionBuilder::new(export.address, nonce).transfer(
        bob(),
        CcdAmount::from_ccd_str("1.25")?,
        Some(b"gift".to_vec()),
    )?;
    assert_eq!(tx.kind(), TransactionKind::TransferWithMemo);

    let digest = tx.sign_digest();
    let signatures = tx_signer.sign_digest(&digest);
    verify_signature(&signer.public_key_bytes(), &digest, &signatures[&0u8][&0u8])?;

    let signed = SignedTransaction::new(tx, signatures);
    let hash = chain.submit_transaction(&signed).await?;
    assert_eq!(hash, signed.hash_str());

    let alice_info = chain.account_info(&alice()).await?.ok_or("alice missing")?;
    let bob_info = chain.account_info(&bob()).await?.ok_or("bob missing")?;
    assert_eq!(alice_info.balance.to_ccd_string(), "3.75");
    assert_eq!(alice_info.next_nonce, 1);
    assert_eq!(bob_info.balance.to_ccd_string(), "1.25");

    // Replaying the same nonce is rejected.
    assert!(chain.submit_transaction(&signed).await.is_err());

    let history = chain.transaction_history(&alice(), 10).await?;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].transaction_hash.as_deref(), Some(hash.as_str()));

    Ok(())
}

#[test]
fn test_sqlite_backend_from_config_file() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("users.db");
    let config_path = temp_dir.path().join("config.toml");

    let mut file = std::fs::File::create(&config_path)?;
    writeln!(
        file,
        "[auth]\njwt_secret = \"file-secret\"\ntoken_ttl = \"30m\"\n\n[database]\nbackend = \"sqlite\"\npath = \"{}\"\n\n[chain]\nbackend = \"mock\"",
        db_path.display()
    )?;

    let config = load_config(Some(&config_path))?;
    assert_eq!(config.database.backend, UserStoreBackend::Sqlite);
    assert_eq!(config.chain.backend, ChainBackend::Mock);
    assert_eq!(config.auth.token_ttl()?.as_secs(), 1800);

    let state = medshare::api::AppState::from_config(&config)?;
    let user = state.users.create(NewUser {
        email: "file@example.com".to_string(),
        password_hash: "$argon2id$stub".to_string(),
        name: "File".to_string(),
    })?;
    drop(state);

    let reopened = medshare::persistence::SqliteUserRepository::open(
        db_path.to_str().ok_or("non-utf8 path")?,
    )?;
    assert_eq!(
        reopened.find_by_id(&user.id)?.map(|u| u.email),
        Some("file@example.com".to_string())
    );

    Ok(())
}
