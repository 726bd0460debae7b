// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use core::time::Duration;
use reqwest::{header, StatusCode};
use serde_json::Value;
use tracing::{debug, info};

use crate::config::SourceSpec;
use crate::http_utils::{build_client_or_default, display_url, truncate_body};
use crate::token::{AuthError, TokenProvider};

pub const FETCH_TIMEOUT: Duration = Duration::from_secs(45);

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Could not obtain SAP token: {0}")]
    Auth(#[from] AuthError),

    #[error("Network error while fetching {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} while fetching {url}: {body}")]
    Status {
        url: String,
        status: StatusCode,
        body: String,
    },

    #[error("Failed to decode JSON from {url}: {source}. Response: {body}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
        body: String,
    },
}

#[async_trait]
pub trait SourceFetcher {
    /// Retrieves the raw JSON payload of one source. An empty object or list is a valid payload
    /// meaning there is nothing to process.
    async fn fetch(&self, source: &SourceSpec) -> Result<Value, FetchError>;
}

/// Fetches SAP Cloud ALM endpoints, acquiring a fresh token for every request.
#[derive(Debug, Clone)]
pub struct SapAlmFetcher {
    client: reqwest::Client,
    token_provider: TokenProvider,
}

impl SapAlmFetcher {
    #[must_use]
    pub fn new(token_provider: TokenProvider, https_proxy: Option<&str>) -> Self {
        Self::with_timeout(token_provider, https_proxy, FETCH_TIMEOUT)
    }

    /// Same as [`SapAlmFetcher::new`] with a custom bound on each source request.
    #[must_use]
    pub fn with_timeout(
        token_provider: TokenProvider,
        https_proxy: Option<&str>,
        timeout: Duration,
    ) -> Self {
        SapAlmFetcher {
            client: build_client_or_default(https_proxy, timeout),
            token_provider,
        }
    }

    async fn get_payload(&self, endpoint: &str) -> Result<Value, FetchError> {
        let url = display_url(endpoint).to_string();
        let credential = self.token_provider.acquire().await?;

        let response = self
            .client
            .get(endpoint)
            .bearer_auth(&credential.token)
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|source| FetchError::Network {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|source| FetchError::Network {
            url: url.clone(),
            source,
        })?;
        if !status.is_success() {
            return Err(FetchError::Status {
                url,
                status,
                body: truncate_body(&body),
            });
        }

        let payload: Value = serde_json::from_str(&body).map_err(|source| FetchError::Decode {
            url: url.clone(),
            source,
            body: truncate_body(&body),
        })?;

        info!("Received data from SAP API (Status: {status}). URL: {url}");
        log_payload_shape(&payload);
        Ok(payload)
    }
}

#[async_trait]
impl SourceFetcher for SapAlmFetcher {
    async fn fetch(&self, source: &SourceSpec) -> Result<Value, FetchError> {
        info!("Fetching data from SAP API: {}", display_url(&source.endpoint));
        self.get_payload(&source.endpoint).await
    }
}

fn log_payload_shape(payload: &Value) {
    match payload {
        Value::Object(map) => match map.get("resourceLogs") {
            Some(Value::Array(resource_logs)) => {
                debug!("Payload contains {} resourceLog(s)", resource_logs.len());
            }
            _ => debug!("Payload is an object without a 'resourceLogs' list"),
        },
        Value::Array(items) => debug!("Payload is a list with {} item(s)", items.len()),
        _ => debug!("Payload is neither an object nor a list"),
    }
}
