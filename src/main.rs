mod api;
mod config;
mod console;
mod controller;
mod debounce;
mod selection;
mod types;
mod view;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::api::HttpBackend;
use crate::controller::{Command, QuoteController};

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.parse().unwrap_or_default()),
        )
        .with_target(false)
        .init();

    tracing::info!(
        backend = %config.backend_url,
        debounce_ms = config.quote_debounce_ms,
        ordering = ?config.quote_ordering,
        "bridge-quoter starting"
    );

    let backend = HttpBackend::new(&config.backend_url, config.request_timeout())
        .with_context(|| format!("invalid BACKEND_URL {}", config.backend_url))?;

    let controller = QuoteController::new(
        Arc::new(backend),
        console::TerminalView::new(),
        config.controller_settings(),
    );
    let (handle, controller_task) = controller.spawn();
    handle.send(Command::LoadChains);

    console::run_stdin(&config, handle).await;

    controller_task.await.context("quote controller task panicked")?;
    tracing::info!("bridge-quoter stopped");

    Ok(())
}
