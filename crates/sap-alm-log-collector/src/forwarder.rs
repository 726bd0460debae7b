// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Ships transformed records to the Datadog logs intake, one document per request.

use async_trait::async_trait;
use core::time::Duration;
use reqwest::{header, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error};

use crate::config::IntakeConfig;
use crate::http_utils::{build_client_or_default, truncate_body};
use crate::resource::ResourceAttributes;
use crate::SERVICE_NAME;

pub const FORWARD_TIMEOUT: Duration = Duration::from_secs(15);

const DDSOURCE_PREFIX: &str = "sap_cloud_alm_";

#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    #[error("Datadog configuration key '{0}' not found in section [datadog]")]
    MissingConfig(&'static str),

    #[error("Network error while sending '{source_identifier}' to Datadog: {source}")]
    Network {
        source_identifier: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} from Datadog for '{source_identifier}': {body}")]
    Status {
        source_identifier: String,
        status: StatusCode,
        body: String,
    },
}

/// One document ready to be shipped. Built per record and never kept.
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardUnit {
    pub message: Value,
    pub tags: Vec<String>,
    pub source_identifier: String,
}

impl ForwardUnit {
    #[must_use]
    pub fn new(
        message: Value,
        attributes: &ResourceAttributes,
        source_identifier: &str,
        env_tag: &str,
    ) -> Self {
        ForwardUnit {
            message,
            tags: build_tags(env_tag, source_identifier, attributes),
            source_identifier: source_identifier.to_string(),
        }
    }
}

/// Tags in a stable order: the environment tag, `source:<id>`, then one
/// `resource_<key>:<value>` per resource attribute in extraction order.
#[must_use]
pub fn build_tags(
    env_tag: &str,
    source_identifier: &str,
    attributes: &ResourceAttributes,
) -> Vec<String> {
    let mut tags = Vec::with_capacity(attributes.len() + 2);
    tags.push(env_tag.to_string());
    tags.push(format!("source:{source_identifier}"));
    tags.extend(
        attributes
            .iter()
            .map(|(key, value)| {
                format!(
                    "resource_{}:{}",
                    normalize_tag_key(key),
                    normalize_tag_value(value)
                )
            }),
    );
    tags
}

/// Datadog tag keys can't contain dots. Commas would split the `ddtags` list.
fn normalize_tag_key(key: &str) -> String {
    key.replace(['.', ','], "_")
}

/// A comma in a value would start a new entry in `ddtags`.
fn normalize_tag_value(value: &str) -> String {
    value.replace(',', "_")
}

/// Intake log envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntakeLog<'a> {
    #[serde(rename(serialize = "ddsource"))]
    pub source: String,
    #[serde(rename(serialize = "ddtags"))]
    pub tags: String,
    pub hostname: &'a str,
    pub service: &'a str,
    pub message: &'a Value,
}

impl<'a> IntakeLog<'a> {
    #[must_use]
    pub fn from_unit(unit: &'a ForwardUnit, hostname: &'a str) -> Self {
        IntakeLog {
            source: format!("{DDSOURCE_PREFIX}{}", unit.source_identifier),
            tags: unit.tags.join(","),
            hostname,
            service: SERVICE_NAME,
            message: &unit.message,
        }
    }
}

#[async_trait]
pub trait LogForwarder {
    /// Delivers one unit. A failure only concerns that unit.
    async fn forward(&self, unit: &ForwardUnit) -> Result<(), ForwardError>;
}

#[derive(Debug, Clone)]
pub struct DatadogLogForwarder {
    client: reqwest::Client,
    intake: IntakeConfig,
    hostname: String,
}

impl DatadogLogForwarder {
    #[must_use]
    pub fn new(intake: IntakeConfig, hostname: String, https_proxy: Option<&str>) -> Self {
        DatadogLogForwarder {
            client: build_client_or_default(https_proxy, FORWARD_TIMEOUT),
            intake,
            hostname,
        }
    }

    async fn send(&self, unit: &ForwardUnit) -> Result<(), ForwardError> {
        let api_key = required(&self.intake.api_key, "api_key")?;
        let log_url = required(&self.intake.log_url, "log_url")?;

        let network_error = |source| ForwardError::Network {
            source_identifier: unit.source_identifier.clone(),
            source,
        };

        let response = self
            .client
            .post(log_url)
            .header(header::CONTENT_TYPE, "application/json")
            .header("DD-API-KEY", api_key)
            .json(&IntakeLog::from_unit(unit, &self.hostname))
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        if status.is_success() {
            debug!(
                "Sent '{}' payload to Datadog (Status: {status})",
                unit.source_identifier
            );
            return Ok(());
        }
        if status == StatusCode::FORBIDDEN {
            error!("Request was denied by Datadog: Access denied. Please verify that your API key is valid.");
        }
        let body = response.text().await.unwrap_or_default();
        Err(ForwardError::Status {
            source_identifier: unit.source_identifier.clone(),
            status,
            body: truncate_body(&body),
        })
    }
}

#[async_trait]
impl LogForwarder for DatadogLogForwarder {
    async fn forward(&self, unit: &ForwardUnit) -> Result<(), ForwardError> {
        self.send(unit).await
    }
}

fn required<'a>(value: &'a Option<String>, key: &'static str) -> Result<&'a str, ForwardError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(ForwardError::MissingConfig(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use duplicate::duplicate_item;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn intake(url: &str) -> IntakeConfig {
        IntakeConfig {
            api_key: Some("dd-key".to_string()),
            log_url: Some(format!("{url}/api/v2/logs")),
            env_tag: "env:test".to_string(),
        }
    }

    #[test]
    fn test_build_tags_order() {
        let attributes =
            ResourceAttributes::from_iter([("sap.system.id", "S4H"), ("tenant", "t1")]);
        assert_eq!(
            build_tags("env:prod", "jobs", &attributes),
            vec![
                "env:prod",
                "source:jobs",
                "resource_sap_system_id:S4H",
                "resource_tenant:t1"
            ]
        );
    }

    #[test]
    fn test_build_tags_without_attributes() {
        assert_eq!(
            build_tags("env:prod", "jobs", &ResourceAttributes::new()),
            vec!["env:prod", "source:jobs"]
        );
    }

    #[duplicate_item(
        test_name                       key                       expected;
        [test_normalize_plain]          ["tenant"]                ["tenant"];
        [test_normalize_single_dot]     ["service.name"]          ["service_name"];
        [test_normalize_many_dots]      ["sap.cloud.alm.system"]  ["sap_cloud_alm_system"];
    )]
    #[test]
    fn test_name() {
        assert_eq!(normalize_tag_key(key), expected);
    }

    #[test]
    fn test_build_tags_value_with_comma_stays_one_tag() {
        let attributes = ResourceAttributes::from_iter([("sap.note", "a,env:prod")]);
        let unit = ForwardUnit::new(json!({}), &attributes, "jobs", "env:test");
        let log = IntakeLog::from_unit(&unit, "pod-1");

        assert_eq!(log.tags, "env:test,source:jobs,resource_sap_note:a_env:prod");
        let tags: Vec<&str> = log.tags.split(',').collect();
        assert_eq!(tags.len(), 3);
        assert_eq!(tags.iter().filter(|t| t.starts_with("env:")).count(), 1);
    }

    #[test]
    fn test_build_tags_key_with_comma() {
        let attributes = ResourceAttributes::from_iter([("odd,key", "v")]);
        assert_eq!(
            build_tags("env:test", "jobs", &attributes),
            vec!["env:test", "source:jobs", "resource_odd_key:v"]
        );
    }

    #[test]
    fn test_intake_log_serialization() {
        let unit = ForwardUnit::new(
            json!({"traceId": "abc"}),
            &ResourceAttributes::from_iter([("sap.system.id", "S4H")]),
            "jobs",
            "env:prod",
        );
        let body = serde_json::to_value(IntakeLog::from_unit(&unit, "pod-1")).unwrap();
        assert_eq!(
            body,
            json!({
                "ddsource": "sap_cloud_alm_jobs",
                "ddtags": "env:prod,source:jobs,resource_sap_system_id:S4H",
                "hostname": "pod-1",
                "service": "sap-alm-log-collector",
                "message": {"traceId": "abc"}
            })
        );
    }

    #[tokio::test]
    async fn test_forward_string_message() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v2/logs")
            .match_header("DD-API-KEY", "dd-key")
            .match_header("Content-Type", "application/json")
            .match_body(Matcher::Json(json!({
                "ddsource": "sap_cloud_alm_integration_exceptions",
                "ddtags": "env:test,source:integration_exceptions",
                "hostname": "pod-1",
                "service": "sap-alm-log-collector",
                "message": "<Error/>"
            })))
            .with_status(202)
            .create_async()
            .await;

        let forwarder = DatadogLogForwarder::new(intake(&server.url()), "pod-1".to_string(), None);
        let unit = ForwardUnit::new(
            json!("<Error/>"),
            &ResourceAttributes::new(),
            "integration_exceptions",
            "env:test",
        );
        forwarder.forward(&unit).await.expect("forward should succeed");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_forward_http_error() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/api/v2/logs")
            .with_status(403)
            .with_body("forbidden")
            .create_async()
            .await;

        let forwarder = DatadogLogForwarder::new(intake(&server.url()), "pod-1".to_string(), None);
        let unit = ForwardUnit::new(json!({}), &ResourceAttributes::new(), "jobs", "env:test");
        match forwarder.forward(&unit).await {
            Err(ForwardError::Status { status, body, .. }) => {
                assert_eq!(status, StatusCode::FORBIDDEN);
                assert_eq!(body, "forbidden");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_forward_network_error() {
        let forwarder =
            DatadogLogForwarder::new(intake("http://127.0.0.1:1"), "pod-1".to_string(), None);
        let unit = ForwardUnit::new(json!({}), &ResourceAttributes::new(), "jobs", "env:test");
        assert!(matches!(
            forwarder.forward(&unit).await,
            Err(ForwardError::Network { .. })
        ));
    }

    #[tokio::test]
    async fn test_forward_missing_config() {
        let forwarder = DatadogLogForwarder::new(
            IntakeConfig {
                api_key: None,
                log_url: Some("http://127.0.0.1:1/api/v2/logs".to_string()),
                env_tag: "env:test".to_string(),
            },
            "pod-1".to_string(),
            None,
        );
        let unit = ForwardUnit::new(json!({}), &ResourceAttributes::new(), "jobs", "env:test");
        assert!(matches!(
            forwarder.forward(&unit).await,
            Err(ForwardError::MissingConfig("api_key"))
        ));

        let forwarder = DatadogLogForwarder::new(
            IntakeConfig {
                api_key: Some("dd-key".to_string()),
                ..IntakeConfig::default()
            },
            "pod-1".to_string(),
            None,
        );
        assert!(matches!(
            forwarder.forward(&unit).await,
            Err(ForwardError::MissingConfig("log_url"))
        ));
    }
}
