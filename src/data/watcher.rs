use std::time::Duration;

use alloy::primitives::Address;
use tokio::sync::mpsc;

use crate::data::wallet::Wallet;
use crate::events::AppEvent;

/// Polls the wallet for chain and account changes and reports them as
/// `ChainChanged` / `AccountsChanged` events. One watcher per connection.
pub struct WalletWatcher {
    shutdown_tx: Option<mpsc::UnboundedSender<()>>,
}

impl WalletWatcher {
    /// Start watching. `chain_id` and `accounts` are the values already known
    /// at connect time, so only later changes are reported.
    pub fn spawn(
        wallet: Wallet,
        chain_id: u64,
        accounts: Vec<Address>,
        interval: Duration,
        event_tx: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        let (shutdown_tx, mut shutdown_rx) = mpsc::unbounded_channel::<()>();

        tokio::spawn(async move {
            let mut last_chain = chain_id;
            let mut last_accounts = accounts;
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = shutdown_rx.recv() => return,
                }

                match wallet.chain_id().await {
                    Ok(id) if id != last_chain => {
                        log::info!("chain changed: {last_chain} -> {id}");
                        last_chain = id;
                        if event_tx.send(AppEvent::ChainChanged(id)).is_err() {
                            return;
                        }
                    }
                    Ok(_) => {}
                    Err(e) => log::debug!("chain poll failed: {e}"),
                }

                match wallet.accounts().await {
                    Ok(accounts) if accounts != last_accounts => {
                        log::info!("accounts changed: {} exposed", accounts.len());
                        last_accounts = accounts.clone();
                        if event_tx.send(AppEvent::AccountsChanged(accounts)).is_err() {
                            return;
                        }
                    }
                    Ok(_) => {}
                    Err(e) => log::debug!("accounts poll failed: {e}"),
                }
            }
        });

        Self {
            shutdown_tx: Some(shutdown_tx),
        }
    }

    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for WalletWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}
