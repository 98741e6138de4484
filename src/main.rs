mod config;
mod crypto;
mod error;
mod identity;
mod menu;
mod network;

use crate::config::{ClientConfig, DISCOVERY_AS_LOCALHOST};
use crate::identity::{FileSystemWallet, ensure_identity};
use crate::menu::Dispatcher;
use crate::network::Gateway;

use anyhow::Context;
use std::io;

async fn run(config: ClientConfig) -> anyhow::Result<()> {
    let wallet = FileSystemWallet::open(&config.wallet_dir).context("Failed to create wallet")?;
    log::debug!(
        "wallet {} holds {:?}",
        wallet.dir().display(),
        wallet.list().unwrap_or_default()
    );

    if ensure_identity(&wallet, &config).context("Failed to populate wallet contents")? {
        log::info!("added {} to wallet", config.user_label());
    }

    let gateway = Gateway::connect(
        &wallet,
        &config.user_label(),
        &config.connection_profile_path(),
        config.discovery_as_localhost,
    )
    .await
    .context("Failed to connect to gateway")?;

    let network = gateway
        .network(&config.channel)
        .with_context(|| format!("Failed to get network {}", config.channel))?;
    let contract = network.contract(&config.chaincode);
    log::info!(
        "using chaincode {} on channel {}",
        config.chaincode,
        config.channel
    );

    let stdin = io::stdin();
    let mut dispatcher = Dispatcher::new(&contract, stdin.lock(), io::stdout());
    dispatcher.run().await.context("Menu terminated")?;

    Ok(())
}

fn main() -> anyhow::Result<()> {
    // SAFETY: no other threads exist yet; the runtime is built afterwards.
    unsafe {
        std::env::set_var(DISCOVERY_AS_LOCALHOST, "true");
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = ClientConfig::from_env();
    log::info!("starting client for {} ({})", config.org, config.msp_id());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start runtime")?;
    runtime.block_on(run(config))
}
