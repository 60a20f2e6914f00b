pub mod contract;
pub mod networks;
pub mod switcher;
pub mod types;
pub mod wallet;
pub mod watcher;

#[cfg(test)]
pub mod testing;

use std::time::Duration;

use alloy::primitives::{Address, U256};
use tokio::sync::mpsc;

use crate::data::contract::GmContract;
use crate::data::types::{FeeQuote, TxOutcome};
use crate::data::wallet::{Wallet, WalletError};
use crate::events::{AppEvent, GmProgress};

/// The connection context handed to every wallet task.
///
/// Exists only while connected, so the account is defined exactly when a
/// session is. `generation` changes whenever the context does (connect, chain
/// change, account change) and lets the app drop reads issued under an old one.
#[derive(Debug, Clone)]
pub struct Session {
    pub wallet: Wallet,
    pub account: Address,
    pub chain_id: u64,
    pub generation: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct Timings {
    /// Wait after a switch request before reading the chain back.
    pub settle: Duration,
    /// Receipt polling interval while a greeting is pending.
    pub receipt_poll: Duration,
}

/// USD value of `wei` at `price` (both 18-decimal fixed point).
fn usd_value(wei: U256, price: U256) -> U256 {
    wei.saturating_mul(price) / U256::from(10u64).pow(U256::from(18))
}

/// Runs wallet work in background tasks and reports back through `AppEvent`s.
pub struct GmService {
    event_tx: mpsc::UnboundedSender<AppEvent>,
    timings: Timings,
}

impl GmService {
    pub fn new(event_tx: mpsc::UnboundedSender<AppEvent>, timings: Timings) -> Self {
        Self { event_tx, timings }
    }

    pub fn event_tx(&self) -> mpsc::UnboundedSender<AppEvent> {
        self.event_tx.clone()
    }

    /// Read the active chain, then ask the wallet for accounts.
    pub fn connect(&self, wallet: Wallet) {
        let tx = self.event_tx.clone();

        tokio::spawn(async move {
            let result = async {
                let chain_id = wallet.chain_id().await?;
                let account = wallet.request_accounts().await?;
                let accounts = wallet.accounts().await.unwrap_or_else(|_| vec![account]);
                Ok::<_, WalletError>((chain_id, account, accounts))
            }
            .await;

            let event = match result {
                Ok((chain_id, account, accounts)) => {
                    log::info!("connected {account} on chain {chain_id}");
                    AppEvent::WalletConnected {
                        wallet,
                        account,
                        accounts,
                        chain_id,
                    }
                }
                Err(e) => {
                    log::error!("connect failed: {e}");
                    AppEvent::ConnectFailed(e.to_string())
                }
            };
            let _ = tx.send(event);
        });
    }

    pub fn switch_network(&self, wallet: Wallet, card: usize) {
        let Some(network) = networks::networks().get(card) else {
            return;
        };
        let tx = self.event_tx.clone();
        let settle = self.timings.settle;

        tokio::spawn(async move {
            let chain_id = switcher::switch_network(&wallet, network, settle).await;
            let _ = tx.send(AppEvent::NetworkSwitched { card, chain_id });
        });
    }

    /// Read the greeting fee, then the USD quote on a best-effort basis.
    pub fn fetch_fee(&self, session: &Session, card: usize) {
        let Some(network) = networks::networks().get(card) else {
            return;
        };
        let contract = GmContract::new(session.wallet.clone(), network.contract_address);
        let generation = session.generation;
        let tx = self.event_tx.clone();

        tokio::spawn(async move {
            log::info!("fetching fee for {}", network.name);
            let result = match contract.fee().await {
                Ok(fee) => {
                    let usd = match contract.fee_in_usd().await {
                        Ok(usd) => Some(usd),
                        Err(e) => {
                            log::debug!("{} has no USD quote: {e}", network.name);
                            // Derive it from the native token's reference price.
                            contract
                                .reference_price()
                                .await
                                .ok()
                                .map(|price| usd_value(fee, price))
                        }
                    };
                    Ok(FeeQuote { fee, usd })
                }
                Err(e) => {
                    log::warn!("fee fetch failed for {}: {e}", network.name);
                    Err(e.to_string())
                }
            };
            let _ = tx.send(AppEvent::FeeLoaded {
                card,
                generation,
                result,
            });
        });
    }

    pub fn refresh_stats(&self, session: &Session, card: usize) {
        let Some(network) = networks::networks().get(card) else {
            return;
        };
        let contract = GmContract::new(session.wallet.clone(), network.contract_address);
        let account = session.account;
        let generation = session.generation;
        let tx = self.event_tx.clone();

        tokio::spawn(async move {
            let result = contract
                .user_stats(account)
                .await
                .map_err(|e| {
                    log::warn!("stats update failed for {}: {e}", network.name);
                    e.to_string()
                });
            let _ = tx.send(AppEvent::StatsLoaded {
                card,
                generation,
                result,
            });
        });
    }

    /// Check funds, then pay the current fee into `sayGM()` and follow the
    /// transaction until it is mined.
    pub fn say_gm(&self, session: &Session, card: usize) {
        let Some(network) = networks::networks().get(card) else {
            return;
        };
        let contract = GmContract::new(session.wallet.clone(), network.contract_address);
        let account = session.account;
        let tx = self.event_tx.clone();
        let poll = self.timings.receipt_poll;

        tokio::spawn(async move {
            let report = |progress: GmProgress| {
                let _ = tx.send(AppEvent::Gm { card, progress });
            };

            match contract.check_funds(account).await {
                Ok(check) if check.sufficient => {}
                Ok(check) => {
                    report(GmProgress::InsufficientFunds(Some(check)));
                    return;
                }
                Err(e) => {
                    // An unreadable balance counts as not enough to send.
                    log::error!("balance check failed on {}: {e}", network.name);
                    report(GmProgress::InsufficientFunds(None));
                    return;
                }
            }

            report(GmProgress::Sending);
            let sent = async {
                // The fee may have moved since the funds check.
                let fee = contract.fee().await?;
                log::info!("sending GM on {} with fee {fee}", network.name);
                contract.say_gm(account, fee).await
            }
            .await;

            let hash = match sent {
                Ok(hash) => hash,
                Err(e) => {
                    log::error!("GM failed on {}: {e}", network.name);
                    report(GmProgress::Failed(e.to_string()));
                    return;
                }
            };
            log::info!("tx sent on {}: {hash}", network.name);
            report(GmProgress::Sent(hash));

            match contract.wait_for_receipt(hash, poll).await {
                Ok(TxOutcome::Confirmed(hash)) => {
                    log::info!("GM confirmed on {}", network.name);
                    report(GmProgress::Confirmed(hash));
                }
                Ok(TxOutcome::Reverted(hash)) => {
                    log::warn!("GM reverted on {}: {hash}", network.name);
                    report(GmProgress::Reverted(hash));
                }
                Err(e) => {
                    log::error!("receipt lookup failed on {}: {e}", network.name);
                    report(GmProgress::Failed(e.to_string()));
                }
            }
        });
    }
}
