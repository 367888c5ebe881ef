use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::Serialize;

use crate::controller::{ControllerSettings, ResponseOrdering};

#[derive(Debug, Clone, Serialize)]
pub struct Config {
    pub backend_url: String,
    pub request_timeout_secs: u64,

    pub quote_debounce_ms: u64,
    pub default_from_chain: String,
    pub quick_chains: Vec<String>,
    pub quote_ordering: ResponseOrdering,

    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let quote_ordering = env_or("QUOTE_ORDERING", "arrival")
            .parse::<ResponseOrdering>()
            .map_err(|e| anyhow!(e))
            .context("invalid QUOTE_ORDERING")?;

        Ok(Self {
            backend_url: env_or("BACKEND_URL", "http://localhost:5000"),
            request_timeout_secs: parse_env("REQUEST_TIMEOUT_SECS", "15")?,

            quote_debounce_ms: parse_env("QUOTE_DEBOUNCE_MS", "500")?,
            default_from_chain: env_or("DEFAULT_FROM_CHAIN", "flare"),
            quick_chains: parse_list(&env_or("QUICK_CHAINS", "ethereum,polygon,arbitrum")),
            quote_ordering,

            log_level: env_or("LOG_LEVEL", "info"),
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            debounce: Duration::from_millis(self.quote_debounce_ms),
            default_from_chain: self.default_from_chain.clone(),
            ordering: self.quote_ordering,
        }
    }

    pub fn is_quick_chain(&self, chain: &str) -> bool {
        self.quick_chains.iter().any(|c| c == chain)
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env(key: &str, default: &str) -> Result<u64> {
    let raw = env_or(key, default);
    raw.trim()
        .parse()
        .with_context(|| format!("invalid integer for {key}: {raw}"))
}

pub(crate) fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}
