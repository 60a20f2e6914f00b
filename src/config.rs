use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::data::Timings;

#[derive(Parser, Debug)]
#[command(name = "gm-tui", about = "Say GM on Base, Celo and Optimism from the terminal")]
pub struct Config {
    /// Wallet JSON-RPC endpoint (EIP-1193 over HTTP, e.g. Frame at http://127.0.0.1:1248).
    /// Without one, connecting reports that no wallet was found.
    #[arg(short, long, env = "GM_WALLET_URL")]
    pub wallet_url: Option<String>,

    /// Connect to the wallet on startup
    #[arg(short, long)]
    pub connect: bool,

    /// Network card selected on startup (base, celo, optimism)
    #[arg(short, long, default_value = "base")]
    pub network: String,

    /// Delay after a network switch before reading the chain back
    #[arg(long, default_value = "1000")]
    pub settle_ms: u64,

    /// Interval for polling the wallet for chain and account changes
    #[arg(long, default_value = "1000")]
    pub watch_interval_ms: u64,

    /// Interval for polling a pending transaction's receipt
    #[arg(long, default_value = "2000")]
    pub receipt_poll_ms: u64,

    /// Tick rate in milliseconds for UI refresh
    #[arg(long, default_value = "100")]
    pub tick_rate_ms: u64,

    /// Log file (default: <cache dir>/gm-tui/gm-tui.log). Filter with RUST_LOG.
    #[arg(long, env = "GM_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

impl Config {
    pub fn timings(&self) -> Timings {
        Timings {
            settle: Duration::from_millis(self.settle_ms),
            receipt_poll: Duration::from_millis(self.receipt_poll_ms),
        }
    }

    pub fn log_path(&self) -> Option<PathBuf> {
        self.log_file
            .clone()
            .or_else(|| dirs::cache_dir().map(|dir| dir.join("gm-tui").join("gm-tui.log")))
    }
}
