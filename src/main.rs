//! Roadwatch - live BC highway events and weather with closure notifications.
//!
//! This is the main entry point of roadwatch, which keeps an eye on a small set
//! of cities and highways and reports new road closures as they appear.
//!
//! # Overview
//!
//! Every few minutes, roadwatch fetches the forecast of each configured city
//! from Open-Meteo and the events of each configured highway from the DriveBC
//! Open511 API. Events of all highways are merged, deduplicated and cached, then
//! classified per highway as Alert, Notice or Clear. Each newly observed
//! closure raises one notification for the whole session.
//!
//! # Configuration
//!
//! See the [`config`] module for the YAML format. Values can be overridden with
//! environment variables prefixed with `ROADWATCH_`:
//!
//! ```bash
//! export ROADWATCH_OPEN511__URL="https://api.open511.gov.bc.ca"
//! export ROADWATCH_REFRESH__INTERVAL=120
//! ```
//!
//! # Usage
//!
//! ```bash
//! roadwatch --config config.yaml
//! roadwatch --list-highways
//! ```
//!
//! On unix, sending `SIGHUP` reloads the cities and highways from the
//! configuration file and triggers an immediate refresh.
//!
//! # Architecture
//!
//! - [`alerts`] - Highway classification, closure deduplication and notification board
//! - [`config`] - YAML configuration with environment variable overrides
//! - [`http`] - Shared JSON request handling
//! - [`open511`] - Open511 client, event normalization and multi-highway aggregation
//! - [`refresher`] - Periodic refresh loop driving the pipeline
//! - [`utils`] - Clock and highway-set fingerprint
//! - [`weather`] - Open-Meteo client
//!
//! # Environment Variables
//!
//! - `RUST_LOG` - Controls logging level (default: `info`)

use clap::Parser;
use env_logger::Env;
use log::{error, info};
use tokio::sync::watch;

use crate::{config::Config, open511::Highway, refresher::Refresher};

mod alerts;
mod config;
mod http;
mod open511;
mod refresher;
mod utils;
mod weather;

/// Command-line arguments of roadwatch.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the YAML configuration file.
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Print the highway catalog and exit.
    #[arg(long)]
    list_highways: bool,
}

#[tokio::main]
async fn main() {
    // Put logger at info level by default
    let env = Env::default().filter_or("RUST_LOG", "info");
    env_logger::init_from_env(env);

    let args = Args::parse();

    if args.list_highways {
        for highway in Highway::catalog() {
            println!("{}", highway);
        }
        return;
    }

    info!("Starting roadwatch {}...", env!("CARGO_PKG_VERSION"));

    let config = match Config::load(&args.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load config file: {:#}", e);
            return;
        }
    };

    let (settings_tx, settings_rx) = watch::channel(config.settings.clone());
    let refresher = Refresher::from_config(&config);

    #[cfg(unix)]
    spawn_reload_task(args.config.clone(), settings_tx);
    #[cfg(not(unix))]
    drop(settings_tx);

    tokio::select! {
        _ = refresher.run(settings_rx) => {}
        _ = tokio::signal::ctrl_c() => info!("Stopping roadwatch"),
    }
}

/// Reloads the user settings from the configuration file on `SIGHUP`.
///
/// Only the cities and highways are reloaded, other values need a restart.
#[cfg(unix)]
fn spawn_reload_task(config_path: String, settings_tx: watch::Sender<config::UserSettings>) {
    use tokio::signal::unix::{SignalKind, signal};

    tokio::spawn(async move {
        let mut hangup = match signal(SignalKind::hangup()) {
            Ok(hangup) => hangup,
            Err(e) => {
                error!("unable to listen to SIGHUP, settings reload disabled: {}", e);
                return;
            }
        };

        while hangup.recv().await.is_some() {
            info!("reloading settings from {}", config_path);
            match Config::load(&config_path) {
                Ok(config) => {
                    settings_tx.send_if_modified(|settings| {
                        if *settings == config.settings {
                            info!("settings unchanged");
                            return false;
                        }
                        *settings = config.settings;
                        true
                    });
                }
                Err(e) => error!("failed to reload config file, keeping settings: {:#}", e),
            }
        }
    });
}
