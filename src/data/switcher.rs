use std::time::Duration;

use crate::data::types::NetworkConfig;
use crate::data::wallet::{Wallet, WalletError};

/// Ask the wallet to move to `network`, adding the chain first if the wallet
/// does not know it.
///
/// Waits `settle` after the request before reading the active chain back, since
/// some wallets report the new chain asynchronously. Returns the chain id the
/// wallet reports afterwards, or `None` on any failure. Never returns an error.
pub async fn switch_network(
    wallet: &Wallet,
    network: &NetworkConfig,
    settle: Duration,
) -> Option<u64> {
    log::info!(
        "switching to {} ({})",
        network.name,
        network.chain_id_hex()
    );

    match request_switch(wallet, network, settle).await {
        Ok(chain_id) => {
            log::info!("switched to {}, wallet reports chain {chain_id}", network.name);
            Some(chain_id)
        }
        Err(e) => {
            log::warn!("failed to switch to {}: {e}", network.name);
            None
        }
    }
}

async fn request_switch(
    wallet: &Wallet,
    network: &NetworkConfig,
    settle: Duration,
) -> Result<u64, WalletError> {
    match wallet.switch_chain(&network.chain_id_hex()).await {
        Ok(()) => {}
        Err(e) if e.is_unrecognized_chain() => {
            log::info!("adding {} to wallet", network.name);
            wallet.add_chain(&network.add_chain_params()).await?;
        }
        Err(e) => return Err(e),
    }

    tokio::time::sleep(settle).await;
    wallet.chain_id().await
}
