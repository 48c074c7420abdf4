//! Proxy configuration.
//!
//! Everything configurable lives in one explicit struct that is handed to
//! [`crate::Services`] at startup -- no implicit globals. Values come from the
//! environment, with defaults matching the historical deployment (upstream on
//! `localhost:8080/server`, proxy on port 3000, errors appended to
//! `logs/error.log` when a log path is given).

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

/// The discovery-search query for globally featured items.
const DEFAULT_GLOBAL_QUERY: &str = "/api/discover/search/objects?query=calypso%2Evedette%3Atrue";

/// The discovery-search query for items featured within one scope; the scope
/// id is appended as an extra query parameter.
const DEFAULT_SCOPED_QUERY: &str =
    "/api/discover/search/objects?query=calypso%2Escopevedette%3Atrue";

#[derive(Debug, Clone)]
pub struct Config {
    /// Port the HTTP server binds to.
    pub port: u16,

    /// Base URL of the Calypso (DSpace) REST API, without a trailing slash.
    pub upstream_base_url: String,

    /// The single front-end origin allowed by the CORS layer.
    pub frontend_origin: String,

    /// Optional log file; events go to stderr when unset.
    pub log_path: Option<PathBuf>,

    /// Path-and-query for the global featured-items search.
    pub global_query: String,

    /// Path-and-query for the scoped featured-items search.
    pub scoped_query: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 3000,
            upstream_base_url: "http://localhost:8080/server".to_owned(),
            frontend_origin: "http://localhost:4000".to_owned(),
            log_path: None,
            global_query: DEFAULT_GLOBAL_QUERY.to_owned(),
            scoped_query: DEFAULT_SCOPED_QUERY.to_owned(),
        }
    }
}

impl Config {
    /// Read the configuration from `VEDETTE_*` environment variables, falling
    /// back to the defaults above for anything unset.
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();

        if let Ok(port) = env::var("VEDETTE_PORT") {
            config.port = port
                .parse()
                .with_context(|| format!("illegal VEDETTE_PORT value `{port}`"))?;
        }

        if let Ok(url) = env::var("VEDETTE_UPSTREAM_URL") {
            config.upstream_base_url = url.trim_end_matches('/').to_owned();
        }

        if let Ok(origin) = env::var("VEDETTE_FRONTEND_ORIGIN") {
            config.frontend_origin = origin;
        }

        if let Ok(path) = env::var("VEDETTE_LOG_PATH") {
            if !path.is_empty() {
                config.log_path = Some(PathBuf::from(path));
            }
        }

        if let Ok(q) = env::var("VEDETTE_QUERY_GLOBAL") {
            config.global_query = q;
        }

        if let Ok(q) = env::var("VEDETTE_QUERY_SCOPED") {
            config.scoped_query = q;
        }

        Ok(config)
    }

    /// Build the upstream discovery-search URL for an optional scope. The
    /// scope id is passed through untouched; validating it is the upstream's
    /// business.
    pub fn search_url(&self, scope: Option<&str>) -> String {
        match scope {
            None => format!("{}{}", self.upstream_base_url, self.global_query),
            Some(scope) => format!(
                "{}{}&scope={}",
                self.upstream_base_url, self.scoped_query, scope
            ),
        }
    }
}
