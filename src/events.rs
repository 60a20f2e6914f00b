use alloy::primitives::{Address, B256};

use crate::data::types::{FeeQuote, FundsCheck, UserStats};
use crate::data::wallet::Wallet;

/// Stages of a `sayGM()` submission, reported back to the card that started it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GmProgress {
    /// `None` when the balance or fee could not be read.
    InsufficientFunds(Option<FundsCheck>),
    Sending,
    Sent(B256),
    Confirmed(B256),
    Reverted(B256),
    Failed(String),
}

impl GmProgress {
    /// Whether this stage ends the submission.
    pub fn is_final(&self) -> bool {
        !matches!(self, GmProgress::Sending | GmProgress::Sent(_))
    }
}

/// Events flowing into the main loop: user intents from key handlers and
/// results from background wallet tasks.
#[derive(Debug)]
pub enum AppEvent {
    // Intents
    Connect,
    Disconnect,
    SwitchNetwork(usize),
    CheckFee(usize),
    SayGm(usize),
    RefreshStats,
    ShowTxLink(usize),

    // Wallet notifications
    WalletConnected {
        wallet: Wallet,
        account: Address,
        accounts: Vec<Address>,
        chain_id: u64,
    },
    ConnectFailed(String),
    ChainChanged(u64),
    AccountsChanged(Vec<Address>),

    // Results. `generation` identifies the connection context a read was issued under.
    NetworkSwitched {
        card: usize,
        chain_id: Option<u64>,
    },
    FeeLoaded {
        card: usize,
        generation: u64,
        result: Result<FeeQuote, String>,
    },
    StatsLoaded {
        card: usize,
        generation: u64,
        result: Result<UserStats, String>,
    },
    Gm {
        card: usize,
        progress: GmProgress,
    },
}
