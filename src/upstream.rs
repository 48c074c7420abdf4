//! The HTTP client side of the proxy.
//!
//! A thin wrapper around a shared `reqwest::Client`: one GET per call, parse
//! the body as JSON into whatever shape the caller expects. There are
//! deliberately no retries and no timeout beyond the transport defaults; how
//! a failure is handled (degrade the item, or fail the page) is decided by
//! the caller, so the error here just records what happened and to which URL.

use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("GET {url}: request failed")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("GET {url}: upstream answered HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("GET {url}: unparseable JSON body")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

pub struct Upstream {
    http: reqwest::Client,
}

impl Upstream {
    pub fn new() -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().build()?;
        Ok(Upstream { http })
    }

    /// Issue one GET and deserialize the JSON response. Any non-2xx status is
    /// an error; we never look at error bodies.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, UpstreamError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|source| UpstreamError::Transport {
                url: url.to_owned(),
                source,
            })?;

        let status = response.status();

        if !status.is_success() {
            return Err(UpstreamError::Status {
                url: url.to_owned(),
                status,
            });
        }

        response
            .json()
            .await
            .map_err(|source| UpstreamError::Decode {
                url: url.to_owned(),
                source,
            })
    }
}
