//! Configuration for the Canopy client.
//!
//! The configuration is an explicitly constructed, immutable object passed
//! into the client at construction time, never ambient globals. Invalid
//! values fail at startup, not at first call.

use crate::error::{CanopyError, CanopyResult};
use url::Url;

pub const DEFAULT_APP_URL: &str = "https://app.canopy.so";
pub const DEFAULT_API_URL: &str = "https://api.canopy.so/graphql";
pub const DEFAULT_DOCS_URL: &str = "https://docs.canopy.so";

/// Configuration for the Canopy client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the app server (authentication + branch management).
    pub app_url: Url,
    /// URL of the GraphQL content API.
    pub api_url: Url,
    /// Base URL of the developer docs search.
    pub docs_url: Url,
}

impl ClientConfig {
    /// Hosted defaults. Infallible because the default URLs are known-good.
    pub fn hosted() -> Self {
        Self {
            app_url: Url::parse(DEFAULT_APP_URL).expect("default app url"),
            api_url: Url::parse(DEFAULT_API_URL).expect("default api url"),
            docs_url: Url::parse(DEFAULT_DOCS_URL).expect("default docs url"),
        }
    }

    /// Read configuration from `CANOPY_APP_URL`, `CANOPY_API_URL` and
    /// `CANOPY_DOCS_URL`, falling back to the hosted defaults. A present
    /// but unparseable value is a hard error.
    pub fn from_env() -> CanopyResult<Self> {
        Ok(Self {
            app_url: env_url("CANOPY_APP_URL", DEFAULT_APP_URL)?,
            api_url: env_url("CANOPY_API_URL", DEFAULT_API_URL)?,
            docs_url: env_url("CANOPY_DOCS_URL", DEFAULT_DOCS_URL)?,
        })
    }
}

fn env_url(name: &str, default: &str) -> CanopyResult<Url> {
    let raw = std::env::var(name).unwrap_or_else(|_| default.to_string());
    Url::parse(&raw).map_err(|e| CanopyError::Config(format!("{} is not a valid url: {}", name, e)))
}
