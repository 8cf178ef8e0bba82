//! Next-nonce resolution for transaction senders.

use crate::address::AccountAddress;
use crate::chain::ChainClient;
use crate::error::{MedShareError, Result};

/// Asks the node for `sender`'s next nonce.
///
/// Failures surface as `NonceUnavailable`; no guessed value is ever
/// substituted here. A stale or guessed nonce makes the node reject the
/// transaction after the user has already signed it.
pub async fn resolve_next_nonce(client: &dyn ChainClient, sender: &AccountAddress) -> Result<u64> {
    match client.next_account_nonce(sender).await {
        Ok(nonce) => {
            tracing::debug!(account = %sender, nonce, backend = client.name(), "resolved nonce");
            Ok(nonce)
        }
        Err(e) => {
            tracing::warn!(account = %sender, error = %e, backend = client.name(), "nonce query failed");
            Err(MedShareError::NonceUnavailable(e.to_string()))
        }
    }
}
