// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Collector configuration.
//!
//! Sources are applied in the following order (later sources override earlier):
//!
//! 1. **Defaults** - hard-coded below
//! 2. **YAML file** - `/app/config.yaml`, or the path in `SAP_ALM_CONFIG_PATH`
//! 3. **Environment variables** - `SAP_ALM_<SECTION>__<KEY>`, e.g. `SAP_ALM_DATADOG__API_KEY`
//!
//! ```yaml
//! sap_auth:
//!   token_url: https://tenant.authentication.eu10.hana.ondemand.com/oauth/token
//!   client_id: my-client
//!   client_secret: my-secret
//! datadog:
//!   api_key: xxxxx
//!   log_url: https://http-intake.logs.datadoghq.com/api/v2/logs
//!   env_tag: env:prod
//! sap_endpoints:
//!   integration_exceptions: https://tenant.alm.cloud.sap/api/logs?...
//!   jobs: https://tenant.alm.cloud.sap/api/jobs?...
//! general:
//!   collection_interval_seconds: 300
//! logging:
//!   log_level: info
//! ```
//!
//! Only the endpoint mapping is validated at load time. Missing auth or intake keys are reported by
//! the component that first needs them, so a partially configured collector still starts.

pub mod log_level;

use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    providers::{Env, Format, Yaml},
    Figment,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::error;

use crate::config::log_level::LogLevel;
use crate::transform::SourceKind;

pub const DEFAULT_CONFIG_PATH: &str = "/app/config.yaml";
pub const CONFIG_PATH_ENV_VAR: &str = "SAP_ALM_CONFIG_PATH";
pub const ENV_PREFIX: &str = "SAP_ALM_";
pub const DEFAULT_ENV_TAG: &str = "env:not_set";

const DEFAULT_COLLECTION_INTERVAL_SECS: u64 = 300;
const DEFAULT_SOURCE_PAUSE_SECS: u64 = 2;
const DEFAULT_SCOPE_PAUSE_MILLIS: u64 = 500;
const DEFAULT_FAULT_COOLDOWN_SECS: u64 = 60;

#[derive(Debug, thiserror::Error, PartialEq)]
#[allow(clippy::module_name_repetitions)]
pub enum ConfigError {
    #[error("Section [{0}] not found in configuration, nothing to collect")]
    MissingSection(&'static str),

    #[error("Section [{0}] is empty in configuration, nothing to collect")]
    EmptySection(&'static str),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("collection_interval_seconds must be greater than zero")]
    InvalidInterval,
}

/// Client-credentials settings for the SAP token endpoint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub token_url: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

/// Datadog logs intake settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct IntakeConfig {
    pub api_key: Option<String>,
    pub log_url: Option<String>,
    pub env_tag: String,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        IntakeConfig {
            api_key: None,
            log_url: None,
            env_tag: DEFAULT_ENV_TAG.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
struct GeneralSection {
    collection_interval_seconds: u64,
    source_pause_seconds: u64,
    scope_pause_millis: u64,
    fault_cooldown_seconds: u64,
    https_proxy: Option<String>,
}

impl Default for GeneralSection {
    fn default() -> Self {
        GeneralSection {
            collection_interval_seconds: DEFAULT_COLLECTION_INTERVAL_SECS,
            source_pause_seconds: DEFAULT_SOURCE_PAUSE_SECS,
            scope_pause_millis: DEFAULT_SCOPE_PAUSE_MILLIS,
            fault_cooldown_seconds: DEFAULT_FAULT_COOLDOWN_SECS,
            https_proxy: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
struct LoggingSection {
    log_level: Option<Value>,
}

/// Shape of the configuration file before validation.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    sap_auth: AuthConfig,
    datadog: IntakeConfig,
    sap_endpoints: Option<BTreeMap<String, String>>,
    general: GeneralSection,
    logging: LoggingSection,
}

/// One configured SAP Cloud ALM log endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
    pub identifier: String,
    pub endpoint: String,
    /// Resolved once from the identifier when the configuration is loaded.
    pub kind: SourceKind,
}

impl SourceSpec {
    #[must_use]
    pub fn new(identifier: impl Into<String>, endpoint: impl Into<String>) -> Self {
        let identifier = identifier.into();
        let kind = SourceKind::from_identifier(&identifier);
        SourceSpec {
            identifier,
            endpoint: endpoint.into(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub auth: AuthConfig,
    pub intake: IntakeConfig,
    /// Sources in identifier order.
    pub sources: Vec<SourceSpec>,
    pub collection_interval: Duration,
    /// Pause after each source, throttles requests to SAP.
    pub source_pause: Duration,
    /// Pause after each scopeLogs batch, throttles requests to the intake.
    pub scope_pause: Duration,
    /// Wait after an unexpected fault in a cycle before resuming the loop.
    pub fault_cooldown: Duration,
    pub https_proxy: Option<String>,
    pub log_level: LogLevel,
    /// Non-fatal problems found while loading, reported by [`Config::log_warnings`] once logging
    /// is set up.
    pub warnings: Vec<String>,
}

impl Config {
    /// Loads the configuration from the path in `SAP_ALM_CONFIG_PATH`, or
    /// [`DEFAULT_CONFIG_PATH`], merged with `SAP_ALM_` environment variables.
    pub fn new() -> Result<Config, ConfigError> {
        Self::load(&config_path())
    }

    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        let figment = Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));
        Self::from_figment(&figment)
    }

    pub fn from_figment(figment: &Figment) -> Result<Config, ConfigError> {
        let file_config: FileConfig = figment
            .extract()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        let endpoints = file_config
            .sap_endpoints
            .ok_or(ConfigError::MissingSection("sap_endpoints"))?;
        if endpoints.is_empty() {
            return Err(ConfigError::EmptySection("sap_endpoints"));
        }
        let sources = endpoints
            .into_iter()
            .map(|(identifier, endpoint)| SourceSpec::new(identifier, endpoint.trim()))
            .collect();

        let general = file_config.general;
        if general.collection_interval_seconds == 0 {
            return Err(ConfigError::InvalidInterval);
        }

        let mut warnings = Vec::new();
        let log_level = match file_config.logging.log_level {
            Some(value) => LogLevel::from_value(&value).unwrap_or_else(|e| {
                warnings.push(format!("{e}, using default log level"));
                LogLevel::default()
            }),
            None => LogLevel::default(),
        };

        let https_proxy = general
            .https_proxy
            .filter(|p| !p.trim().is_empty())
            .or_else(|| env::var("HTTPS_PROXY").ok());

        Ok(Config {
            auth: file_config.sap_auth,
            intake: file_config.datadog,
            sources,
            collection_interval: Duration::from_secs(general.collection_interval_seconds),
            source_pause: Duration::from_secs(general.source_pause_seconds),
            scope_pause: Duration::from_millis(general.scope_pause_millis),
            fault_cooldown: Duration::from_secs(general.fault_cooldown_seconds),
            https_proxy,
            log_level,
            warnings,
        })
    }

    pub fn log_warnings(&self) {
        for warning in &self.warnings {
            error!("{warning}");
        }
    }
}

#[must_use]
pub fn config_path() -> PathBuf {
    env::var(CONFIG_PATH_ENV_VAR)
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
}
