use std::time::Duration;

use alloy::primitives::Address;
use crossterm::event::{Event, EventStream, KeyCode, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use ratatui::prelude::*;
use ratatui::widgets::*;
use tokio::sync::mpsc;

use crate::components::Component;
use crate::components::alert::Alert;
use crate::components::cards::{CardGrid, PLACEHOLDER};
use crate::components::header::Header;
use crate::components::help::HelpOverlay;
use crate::components::status_bar::StatusBar;
use crate::data::types::FeeQuote;
use crate::data::wallet::Wallet;
use crate::data::watcher::WalletWatcher;
use crate::data::{GmService, Session, networks};
use crate::events::{AppEvent, GmProgress};
use crate::theme::THEME;
use crate::utils;

const SWITCH_FIRST: &str = "Switch network first!";

#[derive(Debug, Clone, Copy)]
pub struct AppOptions {
    pub tick_rate: Duration,
    pub watch_interval: Duration,
    pub auto_connect: bool,
}

pub struct App {
    // Components
    header: Header,
    cards: CardGrid,
    status_bar: StatusBar,
    help: HelpOverlay,
    alert: Alert,

    // Data
    service: GmService,
    event_rx: mpsc::UnboundedReceiver<AppEvent>,
    /// The configured wallet endpoint. `None` means no wallet is available.
    wallet: Option<Wallet>,
    session: Option<Session>,
    watcher: Option<WalletWatcher>,
    generation: u64,

    // State
    should_quit: bool,
    options: AppOptions,
}

impl App {
    pub fn new(
        service: GmService,
        event_rx: mpsc::UnboundedReceiver<AppEvent>,
        wallet: Option<Wallet>,
        options: AppOptions,
    ) -> Self {
        Self {
            header: Header::new(),
            cards: CardGrid::new(networks::networks()),
            status_bar: StatusBar::new(),
            help: HelpOverlay::new(),
            alert: Alert::new(),
            service,
            event_rx,
            wallet,
            session: None,
            watcher: None,
            generation: 0,
            should_quit: false,
            options,
        }
    }

    pub fn select_card(&mut self, index: usize) {
        self.cards.select(index);
    }

    pub async fn run(&mut self, mut terminal: ratatui::DefaultTerminal) -> color_eyre::Result<()> {
        if self.options.auto_connect {
            self.connect();
        }

        let mut interval = tokio::time::interval(self.options.tick_rate);
        let mut events = EventStream::new();

        while !self.should_quit {
            tokio::select! {
                _ = interval.tick() => {
                    terminal.draw(|frame| self.render(frame))?;
                }
                Some(Ok(event)) = events.next() => {
                    self.handle_terminal_event(event);
                }
                Some(app_event) = self.event_rx.recv() => {
                    self.handle_app_event(app_event);
                }
            }
        }

        if let Some(mut watcher) = self.watcher.take() {
            watcher.stop();
        }
        Ok(())
    }

    fn render(&mut self, frame: &mut Frame) {
        let area = frame.area();

        frame.render_widget(
            Block::default().style(Style::default().bg(THEME.bg)),
            area,
        );

        // Layout: header (1) | cards (fill) | status bar (1)
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(area);

        self.header.render(frame, chunks[0]);
        self.cards.render(frame, chunks[1]);
        self.status_bar.render(frame, chunks[2]);

        // Overlays (rendered on top)
        self.help.render(frame, area);
        self.alert.render(frame, area);
    }

    fn handle_terminal_event(&mut self, event: Event) {
        let Event::Key(key) = event else {
            return;
        };
        // Only handle key press events (not release/repeat) for cross-platform compat
        if key.kind != KeyEventKind::Press {
            return;
        }

        if self.alert.handle_key(key) || self.help.handle_key(key) {
            return;
        }

        match key.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
                return;
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
                return;
            }
            KeyCode::Char('?') => {
                self.help.toggle();
                return;
            }
            KeyCode::Char('c') => {
                self.handle_app_event(AppEvent::Connect);
                return;
            }
            KeyCode::Char('d') => {
                self.handle_app_event(AppEvent::Disconnect);
                return;
            }
            KeyCode::Esc => {
                self.status_bar.error_message = None;
                self.status_bar.info_message = None;
                return;
            }
            _ => {}
        }

        if let Some(event) = self.cards.handle_key(key) {
            self.handle_app_event(event);
        }
    }

    fn handle_app_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Connect => self.connect(),
            AppEvent::Disconnect => self.disconnect(),
            AppEvent::SwitchNetwork(card) => self.switch_network(card),
            AppEvent::CheckFee(card) => self.check_fee(card),
            AppEvent::SayGm(card) => self.say_gm(card),
            AppEvent::RefreshStats => self.refresh_stats(),
            AppEvent::ShowTxLink(card) => self.show_tx_link(card),

            AppEvent::WalletConnected {
                wallet,
                account,
                accounts,
                chain_id,
            } => self.on_connected(wallet, account, accounts, chain_id),
            AppEvent::ConnectFailed(msg) => {
                self.header.connecting = false;
                self.alert.show(format!("Connection error: {msg}"));
            }
            AppEvent::ChainChanged(chain_id) => {
                if self.apply_chain(chain_id) {
                    self.refresh_stats();
                }
            }
            AppEvent::AccountsChanged(accounts) => self.on_accounts_changed(accounts),

            AppEvent::NetworkSwitched { card, chain_id } => {
                self.on_network_switched(card, chain_id)
            }
            AppEvent::FeeLoaded {
                card,
                generation,
                result,
            } => self.on_fee_loaded(card, generation, result),
            AppEvent::StatsLoaded {
                card,
                generation,
                result,
            } => {
                if generation != self.generation {
                    log::debug!("dropping stale stats for card {card}");
                    return;
                }
                let Some(c) = self.cards.get_mut(card) else {
                    return;
                };
                match result {
                    Ok(stats) => {
                        c.streak = stats.streak.to_string();
                        c.total = stats.total.to_string();
                        c.set_status("Stats loaded ✅");
                    }
                    Err(_) => c.set_status("Stats error"),
                }
            }
            AppEvent::Gm { card, progress } => self.on_gm_progress(card, progress),
        }
    }

    // --- Wallet connector ---

    fn connect(&mut self) {
        if self.session.is_some() || self.header.connecting {
            return;
        }
        let Some(wallet) = self.wallet.clone() else {
            log::warn!("connect requested but no wallet endpoint is configured");
            self.alert
                .show("No wallet found! Start a wallet with a local RPC endpoint (e.g. Frame) and pass --wallet-url.");
            return;
        };
        self.header.connecting = true;
        self.service.connect(wallet);
    }

    fn on_connected(&mut self, wallet: Wallet, account: Address, accounts: Vec<Address>, chain_id: u64) {
        self.header.connecting = false;
        self.generation += 1;
        self.session = Some(Session {
            wallet: wallet.clone(),
            account,
            chain_id,
            generation: self.generation,
        });

        self.header.account = Some(account);
        self.header.chain_id = Some(chain_id);
        self.status_bar.connected = true;
        self.status_bar.info(format!("Connected {}", utils::truncate_address(&account)));
        self.cards.enable_actions();
        self.cards.set_active_chain(Some(chain_id));

        // Replacing the old watcher drops it, which stops its task.
        self.watcher = Some(WalletWatcher::spawn(
            wallet,
            chain_id,
            accounts,
            self.options.watch_interval,
            self.service.event_tx(),
        ));
        self.status_bar.watching = true;

        self.refresh_stats();
    }

    fn disconnect(&mut self) {
        if let Some(mut watcher) = self.watcher.take() {
            watcher.stop();
        }
        if self.session.take().is_some() {
            log::info!("disconnected");
        }
        self.generation += 1;

        self.header.account = None;
        self.header.chain_id = None;
        self.header.connecting = false;
        self.status_bar.connected = false;
        self.status_bar.watching = false;
        self.status_bar.info_message = None;
        self.cards.reset_all();
    }

    /// Adopt `chain_id` as the active chain. Returns whether it changed.
    fn apply_chain(&mut self, chain_id: u64) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if session.chain_id == chain_id {
            return false;
        }
        log::info!("active chain {} -> {chain_id}", session.chain_id);
        self.generation += 1;
        session.chain_id = chain_id;
        session.generation = self.generation;
        self.header.chain_id = Some(chain_id);
        self.cards.set_active_chain(Some(chain_id));
        self.cards.abandon_reads();
        true
    }

    fn on_accounts_changed(&mut self, accounts: Vec<Address>) {
        let Some(first) = accounts.first().copied() else {
            self.disconnect();
            return;
        };
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.account != first {
            self.generation += 1;
            session.account = first;
            session.generation = self.generation;
            self.header.account = Some(first);
            self.cards.abandon_reads();
        }
        self.refresh_stats();
    }

    // --- Card handlers ---

    fn switch_network(&mut self, card: usize) {
        let Some(session) = &self.session else {
            self.status_bar.error("Connect a wallet first");
            return;
        };
        let Some(c) = self.cards.get_mut(card) else {
            return;
        };
        if c.switching {
            return;
        }
        c.switching = true;
        c.set_status("Switching network...");
        self.service.switch_network(session.wallet.clone(), card);
    }

    fn on_network_switched(&mut self, card: usize, chain_id: Option<u64>) {
        if let Some(c) = self.cards.get_mut(card) {
            c.switching = false;
            c.set_status(if chain_id.is_some() {
                "Network switched ✅"
            } else {
                "Network switch failed ❌"
            });
        }
        if let Some(chain_id) = chain_id {
            self.apply_chain(chain_id);
            self.refresh_stats();
        }
    }

    fn check_fee(&mut self, card: usize) {
        let Some(session) = &self.session else {
            return;
        };
        let Some(c) = self.cards.get_mut(card) else {
            return;
        };
        if !c.actions_enabled || c.fetching_fee {
            return;
        }
        if session.chain_id != c.network.chain_id {
            c.set_status(SWITCH_FIRST);
            return;
        }
        c.fetching_fee = true;
        c.set_status("Loading fee...");
        self.service.fetch_fee(session, card);
    }

    fn on_fee_loaded(&mut self, card: usize, generation: u64, result: Result<FeeQuote, String>) {
        // Context changes already released the guard.
        if generation != self.generation {
            log::debug!("dropping stale fee for card {card}");
            return;
        }
        let Some(c) = self.cards.get_mut(card) else {
            return;
        };
        c.fetching_fee = false;
        match result {
            Ok(quote) => {
                c.fee = utils::format_ether(quote.fee);
                c.fee_usd = quote
                    .usd
                    .map(utils::format_usd)
                    .unwrap_or_else(|| PLACEHOLDER.to_string());
                c.set_status("Fee loaded ✅");
            }
            Err(msg) => {
                c.set_status(format!("Error: {msg}"));
                c.fee = "Error".to_string();
            }
        }
    }

    fn say_gm(&mut self, card: usize) {
        let Some(session) = &self.session else {
            return;
        };
        let Some(c) = self.cards.get_mut(card) else {
            return;
        };
        if !c.actions_enabled || c.sending {
            return;
        }
        if session.chain_id != c.network.chain_id {
            c.set_status(SWITCH_FIRST);
            return;
        }
        c.sending = true;
        c.set_status("Checking balance...");
        self.service.say_gm(session, card);
    }

    fn on_gm_progress(&mut self, card: usize, progress: GmProgress) {
        let Some(c) = self.cards.get_mut(card) else {
            return;
        };
        if progress.is_final() {
            c.sending = false;
        }
        let name = c.network.name;
        match progress {
            GmProgress::InsufficientFunds(check) => {
                c.set_status("Insufficient funds ❌");
                c.tx_status = "Add more funds to your wallet".to_string();
                let currency = c.network.currency;
                self.status_bar.error(match check {
                    Some(check) => format!(
                        "{name}: need {} {currency} but have {} {currency}",
                        utils::format_ether(check.fee),
                        utils::format_ether(check.balance),
                    ),
                    None => format!("{name}: could not read balance"),
                });
            }
            GmProgress::Sending => c.set_status("Sending GM..."),
            GmProgress::Sent(hash) => {
                c.last_tx = Some(hash);
                c.tx_status = format!("Tx sent: {hash}");
            }
            GmProgress::Confirmed(hash) => {
                c.last_tx = Some(hash);
                c.set_status("GM sent ✅");
                c.tx_status = format!("Confirmed: {hash}");
                self.status_bar
                    .info(format!("GM confirmed on {name} at {}", utils::clock_time()));
                self.refresh_stats();
            }
            GmProgress::Reverted(hash) => {
                c.last_tx = Some(hash);
                c.set_status("Tx failed ❌");
                c.tx_status = format!("Reverted: {hash}");
            }
            GmProgress::Failed(msg) => {
                c.set_status("Tx failed ❌");
                c.tx_status = format!("Error: {msg}");
            }
        }
    }

    /// Reload streak and totals for the card on the active chain.
    fn refresh_stats(&mut self) {
        let Some(session) = &self.session else {
            return;
        };
        if let Some(card) = self.cards.index_of_chain(session.chain_id) {
            self.service.refresh_stats(session, card);
        }
    }

    fn show_tx_link(&mut self, card: usize) {
        let Some(c) = self.cards.get(card) else {
            return;
        };
        match c.last_tx {
            Some(hash) => {
                let url = c.network.explorer_tx_url(&hash);
                log::info!("{}: {url} ({})", c.network.name, utils::truncate_hash(&hash));
                self.status_bar.info(url);
            }
            None => self
                .status_bar
                .info(format!("No transaction on {} yet", c.network.name)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Timings;
    use crate::data::contract::selectors;
    use crate::data::testing::MockWallet;
    use alloy::primitives::{B256, U256};
    use serde_json::{Value, json};

    const BASE: usize = 0;
    const CELO: usize = 1;
    const OPTIMISM: usize = 2;

    fn account() -> Address {
        Address::repeat_byte(0x01)
    }

    fn app_with(wallet: Option<Wallet>) -> App {
        let (tx, rx) = mpsc::unbounded_channel();
        let timings = Timings {
            settle: Duration::ZERO,
            receipt_poll: Duration::ZERO,
        };
        App::new(
            GmService::new(tx, timings),
            rx,
            wallet,
            AppOptions {
                tick_rate: Duration::from_millis(100),
                watch_interval: Duration::from_secs(3600),
                auto_connect: false,
            },
        )
    }

    /// A wallet on `chain_hex` exposing one account, with stats scripted.
    fn mock_on(chain_hex: &str) -> MockWallet {
        let mock = MockWallet::new();
        mock.respond("eth_chainId", json!(chain_hex));
        mock.respond("eth_requestAccounts", json!([account()]));
        mock.respond("eth_accounts", json!([account()]));
        mock.respond_call(selectors::GET_USER_STATS, &[U256::from(3), U256::from(12), U256::ZERO]);
        mock
    }

    /// Handle events until one matching `pred` has been handled.
    async fn pump_until(app: &mut App, pred: impl Fn(&AppEvent) -> bool) {
        loop {
            let event = tokio::time::timeout(Duration::from_secs(5), app.event_rx.recv())
                .await
                .expect("timed out waiting for event")
                .expect("event channel closed");
            let done = pred(&event);
            app.handle_app_event(event);
            if done {
                break;
            }
        }
    }

    async fn connected(mock: &MockWallet) -> App {
        let mut app = app_with(Some(mock.wallet()));
        app.handle_app_event(AppEvent::Connect);
        pump_until(&mut app, |e| matches!(e, AppEvent::WalletConnected { .. })).await;
        pump_until(&mut app, |e| matches!(e, AppEvent::StatsLoaded { .. })).await;
        app
    }

    #[tokio::test]
    async fn test_connect_without_wallet_alerts() {
        let mut app = app_with(None);
        app.handle_app_event(AppEvent::Connect);

        assert!(app.alert.message.as_ref().unwrap().contains("No wallet found"));
        assert!(app.session.is_none());
        assert!(!app.header.connecting);
        assert!(app.cards.cards.iter().all(|c| !c.actions_enabled));
    }

    #[tokio::test]
    async fn test_connect_failure_alerts() {
        let mock = MockWallet::new();
        mock.respond("eth_chainId", json!("0xa"));
        mock.fail("eth_requestAccounts", 4001, "User rejected the request.");

        let mut app = app_with(Some(mock.wallet()));
        app.handle_app_event(AppEvent::Connect);
        pump_until(&mut app, |e| matches!(e, AppEvent::ConnectFailed(_))).await;

        assert_eq!(
            app.alert.message.as_deref(),
            Some("Connection error: User rejected the request.")
        );
        assert!(app.session.is_none());
        assert!(!app.header.connecting);
    }

    #[tokio::test]
    async fn test_connect_stores_session_and_loads_stats() {
        let mock = mock_on("0xa");
        let app = connected(&mock).await;

        let session = app.session.as_ref().unwrap();
        assert_eq!(session.chain_id, 10);
        assert_eq!(session.account, account());
        assert!(app.watcher.is_some());
        assert!(app.cards.cards.iter().all(|c| c.actions_enabled));

        let op = app.cards.get(OPTIMISM).unwrap();
        assert!(op.active);
        assert_eq!(op.streak, "3");
        assert_eq!(op.total, "12");
        assert!(!app.cards.get(BASE).unwrap().active);
    }

    #[tokio::test]
    async fn test_check_fee_on_optimism() {
        let mock = mock_on("0xa");
        mock.respond_call(selectors::GET_GM_FEE, &[U256::from(100_000_000_000_000u64)]);
        mock.respond_call(selectors::GET_FEE_IN_USD, &[U256::from(250_000_000_000_000_000u128)]);
        let mut app = connected(&mock).await;

        app.handle_app_event(AppEvent::CheckFee(OPTIMISM));
        assert_eq!(app.cards.get(OPTIMISM).unwrap().status, "Loading fee...");
        pump_until(&mut app, |e| matches!(e, AppEvent::FeeLoaded { .. })).await;

        let calls = mock.eth_calls_with(selectors::GET_GM_FEE);
        assert_eq!(calls.len(), 1);
        let to: Address = serde_json::from_value(calls[0]["to"].clone()).unwrap();
        assert_eq!(to, networks::by_id("optimism").unwrap().contract_address);

        let card = app.cards.get(OPTIMISM).unwrap();
        assert_eq!(card.fee, "0.0001");
        assert_eq!(card.fee_usd, "$0.25");
        assert_eq!(card.status, "Fee loaded ✅");
        assert!(!card.fetching_fee);
    }

    #[tokio::test]
    async fn test_check_fee_error_is_reported_inline() {
        let mock = mock_on("0xa");
        mock.fail_call(selectors::GET_GM_FEE, "execution reverted");
        let mut app = connected(&mock).await;

        app.handle_app_event(AppEvent::CheckFee(OPTIMISM));
        pump_until(&mut app, |e| matches!(e, AppEvent::FeeLoaded { .. })).await;

        let card = app.cards.get(OPTIMISM).unwrap();
        assert_eq!(card.status, "Error: execution reverted");
        assert_eq!(card.fee, "Error");
        assert!(!card.fetching_fee);
    }

    #[tokio::test]
    async fn test_check_fee_twice_is_guarded() {
        let mock = mock_on("0xa");
        mock.respond_call(selectors::GET_GM_FEE, &[U256::from(1)]);
        let mut app = connected(&mock).await;

        app.handle_app_event(AppEvent::CheckFee(OPTIMISM));
        app.handle_app_event(AppEvent::CheckFee(OPTIMISM));
        pump_until(&mut app, |e| matches!(e, AppEvent::FeeLoaded { .. })).await;

        assert_eq!(mock.eth_calls_with(selectors::GET_GM_FEE).len(), 1);
    }

    #[tokio::test]
    async fn test_wrong_chain_requires_switch() {
        let mock = mock_on("0x2105");
        mock.respond_call(selectors::GET_GM_FEE, &[U256::from(1)]);
        let mut app = connected(&mock).await;

        app.handle_app_event(AppEvent::CheckFee(OPTIMISM));
        assert_eq!(app.cards.get(OPTIMISM).unwrap().status, SWITCH_FIRST);
        assert!(!app.cards.get(OPTIMISM).unwrap().fetching_fee);

        app.handle_app_event(AppEvent::SayGm(CELO));
        assert_eq!(app.cards.get(CELO).unwrap().status, SWITCH_FIRST);
        assert!(!app.cards.get(CELO).unwrap().sending);

        tokio::task::yield_now().await;
        assert!(mock.eth_calls_with(selectors::GET_GM_FEE).is_empty());
        assert!(mock.calls_to("eth_getBalance").is_empty());
        assert!(mock.calls_to("eth_sendTransaction").is_empty());
    }

    #[tokio::test]
    async fn test_insufficient_funds_never_sends() {
        let mock = mock_on("0xa");
        mock.respond("eth_getBalance", json!(U256::from(99)));
        mock.respond_call(selectors::GET_GM_FEE, &[U256::from(100)]);
        let mut app = connected(&mock).await;

        app.handle_app_event(AppEvent::SayGm(OPTIMISM));
        assert_eq!(app.cards.get(OPTIMISM).unwrap().status, "Checking balance...");
        pump_until(&mut app, |e| {
            matches!(e, AppEvent::Gm { progress, .. } if progress.is_final())
        })
        .await;

        let card = app.cards.get(OPTIMISM).unwrap();
        assert_eq!(card.status, "Insufficient funds ❌");
        assert_eq!(card.tx_status, "Add more funds to your wallet");
        assert!(!card.sending);
        assert!(mock.calls_to("eth_sendTransaction").is_empty());
    }

    #[tokio::test]
    async fn test_say_gm_pays_fee_and_confirms() {
        let mock = mock_on("0xa");
        let hash = B256::repeat_byte(0x42);
        mock.respond("eth_getBalance", json!(U256::from(10_000)));
        mock.respond_call(selectors::GET_GM_FEE, &[U256::from(100)]);
        mock.respond("eth_sendTransaction", json!(hash));
        mock.respond(
            "eth_getTransactionReceipt",
            json!({ "transactionHash": hash, "blockNumber": "0x1", "status": "0x1" }),
        );
        let mut app = connected(&mock).await;

        app.handle_app_event(AppEvent::SayGm(OPTIMISM));
        pump_until(&mut app, |e| {
            matches!(e, AppEvent::Gm { progress, .. } if progress.is_final())
        })
        .await;

        let card = app.cards.get(OPTIMISM).unwrap();
        assert_eq!(card.status, "GM sent ✅");
        assert_eq!(card.tx_status, format!("Confirmed: {hash}"));
        assert_eq!(card.last_tx, Some(hash));
        assert!(!card.sending);

        let sends = mock.calls_to("eth_sendTransaction");
        assert_eq!(sends.len(), 1);
        let tx = &sends[0][0];
        let value: U256 = serde_json::from_value(tx["value"].clone()).unwrap();
        let from: Address = serde_json::from_value(tx["from"].clone()).unwrap();
        assert_eq!(value, U256::from(100));
        assert_eq!(from, account());

        // Stats are reloaded after confirmation.
        pump_until(&mut app, |e| matches!(e, AppEvent::StatsLoaded { .. })).await;
        assert_eq!(mock.eth_calls_with(selectors::GET_USER_STATS).len(), 2);
    }

    #[tokio::test]
    async fn test_rejected_transaction_reports_error() {
        let mock = mock_on("0xa");
        mock.respond("eth_getBalance", json!(U256::from(10_000)));
        mock.respond_call(selectors::GET_GM_FEE, &[U256::from(100)]);
        mock.fail("eth_sendTransaction", 4001, "User denied transaction signature.");
        let mut app = connected(&mock).await;

        app.handle_app_event(AppEvent::SayGm(OPTIMISM));
        pump_until(&mut app, |e| {
            matches!(e, AppEvent::Gm { progress, .. } if progress.is_final())
        })
        .await;

        let card = app.cards.get(OPTIMISM).unwrap();
        assert_eq!(card.status, "Tx failed ❌");
        assert_eq!(card.tx_status, "Error: User denied transaction signature.");
        assert!(!card.sending);
    }

    #[tokio::test]
    async fn test_disconnect_resets_cards() {
        let mock = mock_on("0xa");
        mock.respond_call(selectors::GET_GM_FEE, &[U256::from(100_000_000_000_000u64)]);
        let mut app = connected(&mock).await;
        app.handle_app_event(AppEvent::CheckFee(OPTIMISM));
        pump_until(&mut app, |e| matches!(e, AppEvent::FeeLoaded { .. })).await;
        assert_eq!(app.cards.get(OPTIMISM).unwrap().fee, "0.0001");

        app.handle_app_event(AppEvent::Disconnect);

        assert!(app.session.is_none());
        assert!(app.watcher.is_none());
        assert!(app.header.account.is_none());
        assert!(!app.header.connecting);
        for card in &app.cards.cards {
            assert_eq!(card.status, PLACEHOLDER);
            assert_eq!(card.fee, PLACEHOLDER);
            assert_eq!(card.streak, PLACEHOLDER);
            assert_eq!(card.total, PLACEHOLDER);
            assert_eq!(card.tx_status, PLACEHOLDER);
            assert!(!card.active);
            assert!(!card.actions_enabled);
        }

        // The connect control is usable again.
        app.handle_app_event(AppEvent::Connect);
        assert!(app.header.connecting);
        pump_until(&mut app, |e| matches!(e, AppEvent::WalletConnected { .. })).await;
        assert_eq!(mock.calls_to("eth_requestAccounts").len(), 2);
    }

    #[tokio::test]
    async fn test_switch_adds_unknown_chain() {
        let mock = mock_on("0x2105");
        let mut app = connected(&mock).await;

        mock.fail("wallet_switchEthereumChain", 4902, "Unrecognized chain ID");
        mock.respond("wallet_addEthereumChain", Value::Null);
        mock.respond("eth_chainId", json!("0xa4ec"));

        app.handle_app_event(AppEvent::SwitchNetwork(CELO));
        assert_eq!(app.cards.get(CELO).unwrap().status, "Switching network...");
        pump_until(&mut app, |e| matches!(e, AppEvent::NetworkSwitched { .. })).await;

        let adds = mock.calls_to("wallet_addEthereumChain");
        assert_eq!(adds.len(), 1);
        assert_eq!(adds[0][0]["rpcUrls"], json!(["https://forno.celo.org"]));
        assert_eq!(adds[0][0]["nativeCurrency"]["symbol"], "CELO");

        let card = app.cards.get(CELO).unwrap();
        assert_eq!(card.status, "Network switched ✅");
        assert!(card.active);
        assert!(!card.switching);
        assert!(!app.cards.get(BASE).unwrap().active);
        assert_eq!(app.session.as_ref().unwrap().chain_id, 42220);
    }

    #[tokio::test]
    async fn test_switch_failure_is_inline() {
        let mock = mock_on("0x2105");
        let mut app = connected(&mock).await;
        mock.fail("wallet_switchEthereumChain", 4001, "User rejected the request.");

        app.handle_app_event(AppEvent::SwitchNetwork(OPTIMISM));
        pump_until(&mut app, |e| matches!(e, AppEvent::NetworkSwitched { .. })).await;

        let card = app.cards.get(OPTIMISM).unwrap();
        assert_eq!(card.status, "Network switch failed ❌");
        assert!(!card.switching);
        assert_eq!(app.session.as_ref().unwrap().chain_id, 8453);
    }

    #[tokio::test]
    async fn test_stale_fee_is_dropped_after_chain_change() {
        let mock = mock_on("0xa");
        mock.respond_call(selectors::GET_GM_FEE, &[U256::from(1)]);
        let mut app = connected(&mock).await;

        app.handle_app_event(AppEvent::CheckFee(OPTIMISM));
        app.handle_app_event(AppEvent::ChainChanged(8453));
        pump_until(&mut app, |e| matches!(e, AppEvent::FeeLoaded { .. })).await;

        let card = app.cards.get(OPTIMISM).unwrap();
        assert_eq!(card.fee, PLACEHOLDER);
        assert!(!card.fetching_fee);
        assert!(!card.active);
        assert!(app.cards.get(BASE).unwrap().active);
    }

    #[tokio::test]
    async fn test_stale_fee_keeps_newer_read_guarded() {
        let mock = mock_on("0xa");
        mock.respond_call(selectors::GET_GM_FEE, &[U256::from(100_000_000_000_000u64)]);
        let mut app = connected(&mock).await;
        let old_generation = app.generation;

        app.handle_app_event(AppEvent::ChainChanged(8453));
        app.handle_app_event(AppEvent::ChainChanged(10));
        app.handle_app_event(AppEvent::CheckFee(OPTIMISM));
        assert!(app.cards.get(OPTIMISM).unwrap().fetching_fee);

        app.handle_app_event(AppEvent::FeeLoaded {
            card: OPTIMISM,
            generation: old_generation,
            result: Ok(FeeQuote {
                fee: U256::from(1),
                usd: None,
            }),
        });
        let card = app.cards.get(OPTIMISM).unwrap();
        assert!(card.fetching_fee);
        assert_eq!(card.fee, PLACEHOLDER);

        // A second press is still refused while the current read runs.
        app.handle_app_event(AppEvent::CheckFee(OPTIMISM));
        pump_until(&mut app, |e| matches!(e, AppEvent::FeeLoaded { .. })).await;

        let card = app.cards.get(OPTIMISM).unwrap();
        assert_eq!(card.fee, "0.0001");
        assert!(!card.fetching_fee);
        assert_eq!(mock.eth_calls_with(selectors::GET_GM_FEE).len(), 1);
    }

    #[tokio::test]
    async fn test_unchanged_chain_does_not_reload_stats() {
        let mock = mock_on("0x2105");
        let mut app = connected(&mock).await;
        mock.respond("wallet_switchEthereumChain", Value::Null);
        mock.respond("eth_chainId", json!("0xa"));

        app.handle_app_event(AppEvent::SwitchNetwork(OPTIMISM));
        pump_until(&mut app, |e| matches!(e, AppEvent::NetworkSwitched { .. })).await;
        pump_until(&mut app, |e| matches!(e, AppEvent::StatsLoaded { .. })).await;
        assert_eq!(mock.eth_calls_with(selectors::GET_USER_STATS).len(), 2);

        // The watcher reports the chain the app already switched to.
        app.handle_app_event(AppEvent::ChainChanged(10));
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(app.event_rx.try_recv().is_err());
        assert_eq!(mock.eth_calls_with(selectors::GET_USER_STATS).len(), 2);
    }

    #[tokio::test]
    async fn test_say_gm_twice_is_guarded() {
        let mock = mock_on("0xa");
        mock.respond("eth_getBalance", json!(U256::from(99)));
        mock.respond_call(selectors::GET_GM_FEE, &[U256::from(100)]);
        let mut app = connected(&mock).await;

        app.handle_app_event(AppEvent::SayGm(OPTIMISM));
        app.handle_app_event(AppEvent::SayGm(OPTIMISM));
        pump_until(&mut app, |e| {
            matches!(e, AppEvent::Gm { progress, .. } if progress.is_final())
        })
        .await;

        assert_eq!(mock.calls_to("eth_getBalance").len(), 1);
        assert!(!app.cards.get(OPTIMISM).unwrap().sending);
    }

    #[tokio::test]
    async fn test_switch_twice_is_guarded() {
        let mock = mock_on("0x2105");
        let mut app = connected(&mock).await;
        mock.respond("wallet_switchEthereumChain", Value::Null);
        mock.respond("eth_chainId", json!("0xa"));

        app.handle_app_event(AppEvent::SwitchNetwork(OPTIMISM));
        app.handle_app_event(AppEvent::SwitchNetwork(OPTIMISM));
        pump_until(&mut app, |e| matches!(e, AppEvent::NetworkSwitched { .. })).await;

        assert_eq!(mock.calls_to("wallet_switchEthereumChain").len(), 1);
        assert!(!app.cards.get(OPTIMISM).unwrap().switching);
    }

    #[tokio::test]
    async fn test_usd_fee_falls_back_to_reference_price() {
        let mock = mock_on("0xa4ec");
        mock.respond_call(selectors::GET_GM_FEE, &[U256::from(500_000_000_000_000_000u64)]);
        mock.fail_call(selectors::GET_FEE_IN_USD, "execution reverted");
        mock.respond_call(selectors::GET_CELO_PRICE, &[U256::from(600_000_000_000_000_000u64)]);
        let mut app = connected(&mock).await;

        app.handle_app_event(AppEvent::CheckFee(CELO));
        pump_until(&mut app, |e| matches!(e, AppEvent::FeeLoaded { .. })).await;

        let card = app.cards.get(CELO).unwrap();
        assert_eq!(card.fee, "0.5");
        assert_eq!(card.fee_usd, "$0.30");
        assert_eq!(card.status, "Fee loaded ✅");
        assert_eq!(mock.eth_calls_with(selectors::GET_CELO_PRICE).len(), 1);
    }

    #[tokio::test]
    async fn test_fee_loads_without_any_usd_quote() {
        let mock = mock_on("0xa4ec");
        mock.respond_call(selectors::GET_GM_FEE, &[U256::from(500_000_000_000_000_000u64)]);
        mock.fail_call(selectors::GET_FEE_IN_USD, "execution reverted");
        mock.fail_call(selectors::GET_CELO_PRICE, "execution reverted");
        let mut app = connected(&mock).await;

        app.handle_app_event(AppEvent::CheckFee(CELO));
        pump_until(&mut app, |e| matches!(e, AppEvent::FeeLoaded { .. })).await;

        let card = app.cards.get(CELO).unwrap();
        assert_eq!(card.fee, "0.5");
        assert_eq!(card.fee_usd, PLACEHOLDER);
        assert_eq!(card.status, "Fee loaded ✅");
        assert!(!card.fetching_fee);
    }

    #[tokio::test]
    async fn test_tiny_fee_is_not_shown_as_zero() {
        let mock = mock_on("0xa");
        mock.respond_call(selectors::GET_GM_FEE, &[U256::from(500_000_000_000u64)]);
        let mut app = connected(&mock).await;

        app.handle_app_event(AppEvent::CheckFee(OPTIMISM));
        pump_until(&mut app, |e| matches!(e, AppEvent::FeeLoaded { .. })).await;

        assert_eq!(app.cards.get(OPTIMISM).unwrap().fee, "0.0000005");
    }

    #[tokio::test]
    async fn test_unreadable_balance_counts_as_insufficient() {
        let mock = mock_on("0xa");
        mock.fail("eth_getBalance", -32000, "header not found");
        mock.respond_call(selectors::GET_GM_FEE, &[U256::from(100)]);
        let mut app = connected(&mock).await;

        app.handle_app_event(AppEvent::SayGm(OPTIMISM));
        pump_until(&mut app, |e| {
            matches!(e, AppEvent::Gm { progress, .. } if progress.is_final())
        })
        .await;

        let card = app.cards.get(OPTIMISM).unwrap();
        assert_eq!(card.status, "Insufficient funds ❌");
        assert_eq!(card.tx_status, "Add more funds to your wallet");
        assert!(!card.sending);
        assert!(mock.calls_to("eth_sendTransaction").is_empty());
        assert_eq!(
            app.status_bar.error_message.as_deref(),
            Some("Optimism: could not read balance")
        );
    }

    #[tokio::test]
    async fn test_empty_accounts_disconnects() {
        let mock = mock_on("0xa");
        let mut app = connected(&mock).await;

        app.handle_app_event(AppEvent::AccountsChanged(vec![]));

        assert!(app.session.is_none());
        assert!(!app.status_bar.connected);
        assert!(app.cards.cards.iter().all(|c| c.status == PLACEHOLDER));
    }

    #[tokio::test]
    async fn test_account_change_updates_session() {
        let mock = mock_on("0xa");
        let mut app = connected(&mock).await;
        let other = Address::repeat_byte(0x02);

        app.handle_app_event(AppEvent::AccountsChanged(vec![other]));
        assert_eq!(app.session.as_ref().unwrap().account, other);
        assert_eq!(app.header.account, Some(other));

        pump_until(&mut app, |e| matches!(e, AppEvent::StatsLoaded { .. })).await;
        let last = mock.eth_calls_with(selectors::GET_USER_STATS).pop().unwrap();
        let input = last["input"].as_str().unwrap().to_lowercase();
        assert!(input.ends_with(&alloy::primitives::hex::encode(other)));
    }

    #[tokio::test]
    async fn test_actions_require_connection() {
        let mock = mock_on("0xa");
        let mut app = app_with(Some(mock.wallet()));

        app.handle_app_event(AppEvent::CheckFee(OPTIMISM));
        app.handle_app_event(AppEvent::SayGm(OPTIMISM));
        app.handle_app_event(AppEvent::SwitchNetwork(OPTIMISM));

        tokio::task::yield_now().await;
        assert!(mock.calls_to("eth_call").is_empty());
        assert!(mock.calls_to("wallet_switchEthereumChain").is_empty());
        assert_eq!(app.cards.get(OPTIMISM).unwrap().status, PLACEHOLDER);
    }

    #[tokio::test]
    async fn test_tx_link() {
        let mut app = app_with(None);
        app.handle_app_event(AppEvent::ShowTxLink(BASE));
        assert_eq!(
            app.status_bar.info_message.as_deref(),
            Some("No transaction on Base yet")
        );

        let hash = B256::repeat_byte(0x42);
        app.cards.get_mut(BASE).unwrap().last_tx = Some(hash);
        app.handle_app_event(AppEvent::ShowTxLink(BASE));
        assert_eq!(
            app.status_bar.info_message.as_deref(),
            Some(format!("https://basescan.org/tx/{hash}").as_str())
        );
    }
}
