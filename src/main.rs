mod bot;
mod catalog;
mod config;
mod models;
mod scrapers;
mod services;

use anyhow::Context;
use bot::{CarBot, ChatApi, TelegramClient};
use config::Config;
use scrapers::{build_http_client, Aggregator};
use services::{health, keep_alive, Supervisor};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("🚗 Car Scout - antiqcar.ru / antarmotors.ru catalog bot");

    let config = Config::from_env()?;

    // Shared scraping session and chat client, passed down explicitly
    let http = build_http_client(&config)?;
    let aggregator = Aggregator::for_sites(http)?;
    let chat: Arc<dyn ChatApi> = Arc::new(TelegramClient::new(&config.bot_token)?);
    let bot = Arc::new(CarBot::new(chat, aggregator, &config));

    let mut supervisor = Supervisor::new();

    let port = config.port;
    supervisor.spawn("health-server", move |token| health::serve(port, token));

    let ping_client = keep_alive::build_client()?;
    let ping_urls = config.keep_alive_urls.clone();
    let ping_interval = config.keep_alive_interval;
    supervisor.spawn("keep-alive", move |token| {
        keep_alive::run(ping_client.clone(), ping_urls.clone(), ping_interval, token)
    });

    let mut polling = tokio::spawn(Arc::clone(&bot).run(supervisor.token()));

    let polling_done = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl-C")?;
            info!("Ctrl-C received, shutting down");
            false
        }
        result = &mut polling => {
            match result {
                Ok(Ok(())) => info!("Polling loop finished"),
                Ok(Err(e)) => error!(error = %format!("{e:#}"), "Polling loop failed"),
                Err(e) => error!(error = %e, "Polling loop panicked"),
            }
            true
        }
    };

    supervisor.shutdown().await;
    if !polling_done {
        polling.await.context("Polling task panicked")??;
    }

    info!("Bye");
    Ok(())
}
