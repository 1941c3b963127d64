//! Per-call context and credential resolution.
//!
//! Every tool invocation carries an opaque caller credential. It reaches us
//! either as an `Authorization: Bearer ...` header or, for deployments that
//! front this server with their own proxy, as a dedicated
//! `x-canopy-mcp-token` header with no prefix. Resolution is purely local
//! and short-circuits before any network call.

use canopy_sdk::{CanopyError, CanopyResult};
use std::collections::HashMap;

/// The dedicated credential header used by proxied deployments.
pub const MCP_TOKEN_HEADER: &str = "x-canopy-mcp-token";

/// Inbound context for a single tool call: a header map keyed
/// case-insensitively (names are lowercased on insert, since callers send
/// both `authorization` and `Authorization`).
#[derive(Debug, Clone, Default)]
pub struct ToolContext {
    headers: HashMap<String, String>,
}

impl ToolContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_headers<I, K, V>(headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let headers = headers
            .into_iter()
            .map(|(name, value)| (name.as_ref().to_ascii_lowercase(), value.into()))
            .collect();
        Self { headers }
    }

    /// This context with per-call headers layered on top (per-call wins).
    pub fn merged(&self, overrides: Option<&HashMap<String, String>>) -> Self {
        let mut merged = self.clone();
        if let Some(overrides) = overrides {
            for (name, value) in overrides {
                merged
                    .headers
                    .insert(name.to_ascii_lowercase(), value.clone());
            }
        }
        merged
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Extract the caller's opaque MCP token.
    ///
    /// The dedicated header wins; otherwise the authorization header is
    /// used with its `Bearer ` prefix stripped.
    pub fn credential(&self) -> CanopyResult<String> {
        if let Some(token) = self.header(MCP_TOKEN_HEADER) {
            if !token.is_empty() {
                return Ok(token.to_string());
            }
        }

        let authorization = self
            .header("authorization")
            .ok_or(CanopyError::MissingCredential)?;
        let token = match authorization.split_once(' ') {
            Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
            _ => authorization.trim(),
        };
        if token.is_empty() {
            return Err(CanopyError::MissingCredential);
        }
        Ok(token.to_string())
    }
}
