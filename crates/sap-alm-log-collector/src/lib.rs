// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! SAP Cloud ALM log collector.
//!
//! Polls every configured SAP Cloud ALM log endpoint on a fixed cadence, walks the OTLP-shaped
//! `resourceLogs -> scopeLogs -> logRecords` tree of each payload and ships every record that
//! survives its source's transform to the Datadog logs intake.
//!
//! ```text
//!   CollectionScheduler
//!         │ per source, per cycle
//!         v
//!   SourceFetcher ──> TokenProvider
//!         │
//!         v
//!   traverse ──> ResourceAttributes
//!         │
//!         v
//!   SourceKind::transform (PassThrough | EmbeddedContext)
//!         │
//!         v
//!   LogForwarder ──> Datadog logs intake
//! ```

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod config;
pub mod fetcher;
pub mod forwarder;
pub mod hostname;
pub mod http_utils;
pub mod logger;
pub mod resource;
pub mod scheduler;
pub mod token;
pub mod transform;
pub mod traversal;

/// Service name attached to every document sent to the intake.
pub const SERVICE_NAME: &str = "sap-alm-log-collector";
