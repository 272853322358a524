use std::sync::{Arc, Mutex};

use color_eyre::Result;
use tokio_util::sync::CancellationToken;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use vrbridge::actuate;
use vrbridge::config::BridgeConfig;
use vrbridge::engine::{EngineContext, SharedEngine};
use vrbridge::focus::{self, FocusWatcher};
use vrbridge::relay;

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let config = BridgeConfig::load_or_default();
    config.log_summary();

    let engine: SharedEngine = Arc::new(Mutex::new(EngineContext::new(config.channel_settings())));
    let actuator = actuate::default_actuator();
    let cancel = CancellationToken::new();

    let oracle = focus::oracle_for(config.target_window_title.as_deref());
    let focus_rx = FocusWatcher::spawn(oracle, engine.clone(), actuator.clone(), cancel.clone());

    let server_cancel = cancel.clone();
    let server = tokio::spawn(async move {
        relay::run(&config, engine, actuator, focus_rx, server_cancel).await
    });

    tokio::signal::ctrl_c().await?;
    info!("shutdown requested, stopping relay");
    cancel.cancel();
    server.await??;

    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}
