// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Shared setup for collection cycle tests

use std::time::Duration;

use mockito::{Mock, ServerGuard};
use sap_alm_log_collector::{
    config::{AuthConfig, IntakeConfig, SourceSpec},
    fetcher::{SapAlmFetcher, FETCH_TIMEOUT},
    forwarder::DatadogLogForwarder,
    scheduler::{CollectionScheduler, SchedulerSettings},
    token::TokenProvider,
};
use serde_json::{json, Value};

pub type Scheduler = CollectionScheduler<SapAlmFetcher, DatadogLogForwarder>;

pub async fn mock_token(server: &mut ServerGuard) -> Mock {
    server
        .mock("POST", "/oauth/token")
        .with_status(200)
        .with_body(r#"{"access_token":"tok-123","expires_in":3600}"#)
        .create_async()
        .await
}

pub async fn mock_source(server: &mut ServerGuard, path: &str, status: usize, body: &str) -> Mock {
    server
        .mock("GET", path)
        .match_header("authorization", "Bearer tok-123")
        .with_status(status)
        .with_body(body)
        .create_async()
        .await
}

/// Builds a scheduler whose SAP side lives on `sap` and whose intake lives on `intake`.
pub fn scheduler(sap: &ServerGuard, intake: &ServerGuard, sources: &[(&str, &str)]) -> Scheduler {
    scheduler_with_fetch_timeout(sap, intake, sources, FETCH_TIMEOUT)
}

pub fn scheduler_with_fetch_timeout(
    sap: &ServerGuard,
    intake: &ServerGuard,
    sources: &[(&str, &str)],
    fetch_timeout: Duration,
) -> Scheduler {
    let auth = AuthConfig {
        token_url: Some(format!("{}/oauth/token", sap.url())),
        client_id: Some("client".to_string()),
        client_secret: Some("secret".to_string()),
    };
    let intake_config = IntakeConfig {
        api_key: Some("dd-key".to_string()),
        log_url: Some(format!("{}/api/v2/logs", intake.url())),
        env_tag: "env:test".to_string(),
    };
    let sources = sources
        .iter()
        .map(|(id, endpoint)| SourceSpec::new(*id, *endpoint))
        .collect();

    CollectionScheduler::new(
        sources,
        SapAlmFetcher::with_timeout(TokenProvider::new(auth, None), None, fetch_timeout),
        DatadogLogForwarder::new(intake_config, "pod-1".to_string(), None),
        SchedulerSettings {
            interval: Duration::from_secs(300),
            source_pause: Duration::ZERO,
            scope_pause: Duration::ZERO,
            fault_cooldown: Duration::from_secs(60),
            env_tag: "env:test".to_string(),
        },
    )
}

/// Two resources, three scopes, five records; records 1 and 4 carry an `ERROR_CONTEXT`.
pub fn otlp_payload() -> Value {
    json!({"resourceLogs": [
        {
            "resource": {"attributes": [
                {"key": "sap.system.id", "value": {"stringValue": "S4H"}},
                {"key": "sap.client", "value": {"intValue": "100"}}
            ]},
            "scopeLogs": [
                {"scope": {"name": "alm"}, "logRecords": [
                    {"traceId": "1", "attributes": [
                        {"key": "ERROR_CONTEXT", "value": {"stringValue": "<Error><Id>1</Id></Error>"}}
                    ]},
                    {"traceId": "2", "attributes": [
                        {"key": "STATUS", "value": {"stringValue": "OK"}}
                    ]}
                ]},
                {"logRecords": [
                    {"timeUnixNano": "1717000000000000000", "attributes": []}
                ]}
            ]
        },
        {
            "resource": {"attributes": [{"key": "tenant", "value": {"stringValue": "t2"}}]},
            "scopeLogs": [
                {"logRecords": [
                    {"traceId": "4", "attributes": [
                        {"key": "ERROR_CONTEXT", "value": {"stringValue": "<Error><Id>4</Id></Error>"}}
                    ]},
                    {"traceId": "5"}
                ]}
            ]
        }
    ]})
}
