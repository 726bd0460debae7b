// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use core::time::Duration;
use reqwest::ClientBuilder;
use std::error::Error;

/// Number of characters of a response body kept for diagnostics.
pub const MAX_DIAGNOSTIC_BODY_CHARS: usize = 500;

/// Creates a reqwest client builder using rustls as the TLS implementation.
fn create_reqwest_client_builder() -> ClientBuilder {
    reqwest::Client::builder().use_rustls_tls()
}

/// Builds a reqwest client with optional proxy configuration and timeout.
pub fn build_client(
    proxy_url: Option<&str>,
    timeout: Duration,
) -> Result<reqwest::Client, Box<dyn Error>> {
    let mut builder = create_reqwest_client_builder().timeout(timeout);
    if let Some(proxy) = proxy_url {
        builder = builder.proxy(reqwest::Proxy::https(proxy)?);
    }
    Ok(builder.build()?)
}

/// Same as [`build_client`], but falls back to a proxy-less client when the proxy can't be
/// parsed so that a bad proxy setting never stops collection.
pub fn build_client_or_default(proxy_url: Option<&str>, timeout: Duration) -> reqwest::Client {
    build_client(proxy_url, timeout).unwrap_or_else(|e| {
        tracing::error!("Unable to parse proxy configuration: {e}, no proxy will be used");
        create_reqwest_client_builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default()
    })
}

/// Keeps at most [`MAX_DIAGNOSTIC_BODY_CHARS`] characters of a response body for logging.
pub fn truncate_body(body: &str) -> String {
    match body.char_indices().nth(MAX_DIAGNOSTIC_BODY_CHARS) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

/// Strips the query string so URLs can be logged without leaking filters or secrets.
pub fn display_url(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}
