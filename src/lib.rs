//! The Calypso "vedette" aggregation proxy.
//!
//! This library crate implements a small HTTP proxy that sits in front of a
//! DSpace-style repository API ("Calypso") and answers one question for the
//! front end: which items are currently featured, and what promotional
//! imagery do they carry? The upstream API scatters that information across
//! three lookups -- a discovery search, then each item's bundle list, then the
//! featured bundle's bitstreams -- so the interesting part of this crate is
//! the fan-out that runs the per-item lookups concurrently and degrades
//! gracefully when individual items misbehave.
//!
//! The common codebase is compiled into three different executables:
//! `vedette-proxy-serve` (a plain HTTP server, useful locally and in
//! containers), `vedette-proxy-lambda` (the same router behind AWS API
//! Gateway's "proxy event" framework), and `vedette-proxy-oneshot` (run one
//! aggregation from the command line, no server involved).

use anyhow::Result;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

pub mod config;
pub mod present;
pub mod routes;
pub mod upstream;
pub mod vedette;

use config::Config;
use upstream::Upstream;

pub struct Services {
    config: Config,
    upstream: Upstream,
}

impl Services {
    /// Create the state object for the proxy, reading the configuration from
    /// the environment and installing the global logging subscriber. This is
    /// what the executables call; tests use [`Services::with_config`] so that
    /// they can point the proxy at a stub upstream without touching global
    /// state.
    pub fn init() -> Result<Self> {
        let config = Config::from_env()?;
        init_logging(&config)?;
        Self::with_config(config)
    }

    /// Create the state object from an explicit configuration, with no
    /// logging side effects.
    pub fn with_config(config: Config) -> Result<Self> {
        let upstream = Upstream::new()?;
        Ok(Services { config, upstream })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn upstream(&self) -> &Upstream {
        &self.upstream
    }

    /// Fetch the featured items for an optional scope, building the upstream
    /// query URL from the configuration. Shuffling and truncation are left to
    /// the HTTP layer; this returns the items in upstream page order.
    pub async fn featured_items(
        &self,
        scope: Option<&str>,
    ) -> std::result::Result<Vec<vedette::FeaturedItem>, vedette::FeaturedPageError> {
        let url = self.config.search_url(scope);
        vedette::fetch_featured_items(&self.upstream, &url, scope).await
    }
}

/// Install the global tracing subscriber. When a log file is configured we
/// append to it without ANSI escapes; otherwise events go to stderr. The
/// filter honors `RUST_LOG` and defaults to `info`.
fn init_logging(config: &Config) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match config.log_path.as_deref() {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;

            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }

        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }

    Ok(())
}
