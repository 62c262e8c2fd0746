use dd_wallet_client::WalletProvider;
use tracing::{debug, warn};

use crate::error::SessionError;

/// Queries the wallet's chain id and compares it with `expected`.
///
/// On mismatch nothing may be bound to the contract; the caller stops.
pub async fn ensure_expected_chain<P>(provider: &P, expected: u64) -> Result<u64, SessionError>
where
    P: WalletProvider + ?Sized,
{
    let actual = provider.chain_id().await.map_err(SessionError::read)?;
    if actual != expected {
        warn!(expected, actual, "wallet is on the wrong network");
        return Err(SessionError::WrongNetwork { expected, actual });
    }
    debug!(chain_id = actual, "network check passed");
    Ok(actual)
}
