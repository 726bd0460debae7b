// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! OAuth2 client-credentials exchange against the SAP token endpoint.
//!
//! A fresh token is requested for every fetch; nothing is cached between calls.

use core::time::Duration;
use std::time::Instant;

use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use crate::config::AuthConfig;
use crate::http_utils::{build_client_or_default, truncate_body};

pub const TOKEN_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("SAP auth configuration key '{0}' not found in section [sap_auth]")]
    MissingConfig(&'static str),

    #[error("Network error while requesting SAP token: {0}")]
    Network(#[source] reqwest::Error),

    #[error("HTTP {status} while requesting SAP token: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Failed to decode SAP token response: {source}. Response: {body}")]
    Decode {
        #[source]
        source: serde_json::Error,
        body: String,
    },

    #[error("access_token missing from SAP token response")]
    MissingToken,
}

/// Short-lived bearer credential.
#[derive(Clone)]
pub struct Credential {
    pub token: String,
    pub obtained_at: Instant,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("obtained_at", &self.obtained_at)
            .finish()
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TokenProvider {
    client: reqwest::Client,
    auth: AuthConfig,
}

impl TokenProvider {
    #[must_use]
    pub fn new(auth: AuthConfig, https_proxy: Option<&str>) -> Self {
        TokenProvider {
            client: build_client_or_default(https_proxy, TOKEN_TIMEOUT),
            auth,
        }
    }

    /// Exchanges the configured client id/secret for an access token. No retries.
    ///
    /// Failures are returned to the caller, not logged.
    pub async fn acquire(&self) -> Result<Credential, AuthError> {
        debug!("Requesting SAP access token");
        let token_url = required(&self.auth.token_url, "token_url")?;
        let client_id = required(&self.auth.client_id, "client_id")?;
        let client_secret = required(&self.auth.client_secret, "client_secret")?;

        let response = self
            .client
            .post(token_url)
            .basic_auth(client_id, Some(client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(AuthError::Network)?;

        let status = response.status();
        let body = response.text().await.map_err(AuthError::Network)?;
        if !status.is_success() {
            return Err(AuthError::Status {
                status,
                body: truncate_body(&body),
            });
        }

        let token_response: TokenResponse =
            serde_json::from_str(&body).map_err(|source| AuthError::Decode {
                source,
                body: truncate_body(&body),
            })?;

        match token_response.access_token {
            Some(token) if !token.is_empty() => {
                debug!("SAP access token obtained");
                Ok(Credential {
                    token,
                    obtained_at: Instant::now(),
                })
            }
            _ => Err(AuthError::MissingToken),
        }
    }
}

fn required<'a>(value: &'a Option<String>, key: &'static str) -> Result<&'a str, AuthError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(AuthError::MissingConfig(key))
}
