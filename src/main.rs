mod app;
mod components;
mod config;
mod data;
mod events;
mod theme;
mod utils;

use std::fs::{self, OpenOptions};
use std::path::Path;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use env_logger::Env;
use tokio::sync::mpsc;

use crate::app::{App, AppOptions};
use crate::config::Config;
use crate::data::wallet::Wallet;
use crate::data::{GmService, networks};

/// The terminal belongs to the UI, so logs go to a file.
fn init_logging(path: Option<&Path>) -> Result<()> {
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("info"));
    match path {
        Some(path) => {
            if let Some(dir) = path.parent() {
                fs::create_dir_all(dir)
                    .wrap_err_with(|| format!("creating log directory {}", dir.display()))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .wrap_err_with(|| format!("opening log file {}", path.display()))?;
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        None => {
            builder.filter_level(log::LevelFilter::Off);
        }
    }
    builder.init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let config = Config::parse();
    init_logging(config.log_path().as_deref())?;

    let selected = match networks::index_of(&config.network) {
        Some(index) => index,
        None => {
            eprintln!("Unknown network '{}', starting on Base", config.network);
            0
        }
    };

    let wallet = config.wallet_url.as_deref().map(Wallet::http);
    match &config.wallet_url {
        Some(url) => log::info!("wallet endpoint {url}"),
        None => log::info!("no wallet endpoint configured"),
    }

    // Create event channel
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let service = GmService::new(event_tx, config.timings());

    let mut app = App::new(
        service,
        event_rx,
        wallet,
        AppOptions {
            tick_rate: std::time::Duration::from_millis(config.tick_rate_ms),
            watch_interval: std::time::Duration::from_millis(config.watch_interval_ms),
            auto_connect: config.connect,
        },
    );
    app.select_card(selected);

    // Initialize terminal
    let terminal = ratatui::init();
    let result = app.run(terminal).await;

    // Restore terminal
    ratatui::restore();

    result
}
