// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! URL utilities.
//!
//! Workers are keyed by the normalized form of a URL and dial its
//! `host:port` form. A URL failing either derivation is skipped with a
//! warning; it never takes the process down.

use ::url::{ParseError, Url};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UrlError {
    #[error("invalid url: {0}")]
    Parse(#[from] ParseError),

    #[error("url has no host: {0}")]
    MissingHost(String),

    #[error("no default port for scheme `{0}`")]
    UnknownScheme(String),
}

/// Reduce a URL to `scheme://host`, dropping everything after the
/// authority. An explicitly non-default port is kept, so
/// `http://x.onion:8080/a` and `http://x.onion/b` are distinct identities.
pub fn normalize(raw: &str) -> Result<String, UrlError> {
    let parsed = Url::parse(raw)?;
    let host = parsed.host_str().ok_or_else(|| UrlError::MissingHost(raw.to_string()))?;
    Ok(match parsed.port() {
        Some(port) => format!("{}://{}:{}", parsed.scheme(), host, port),
        None => format!("{}://{}", parsed.scheme(), host),
    })
}

/// Derive the `host:port` dial target, defaulting the port from the scheme
/// (`http` → 80, `https` → 443).
pub fn host_port(raw: &str) -> Result<String, UrlError> {
    let parsed = Url::parse(raw)?;
    let host = parsed.host_str().ok_or_else(|| UrlError::MissingHost(raw.to_string()))?;
    let port = parsed
        .port_or_known_default()
        .ok_or_else(|| UrlError::UnknownScheme(parsed.scheme().to_string()))?;
    Ok(format!("{host}:{port}"))
}

#[cfg(test)]
#[path = "url_tests.rs"]
mod tests;
