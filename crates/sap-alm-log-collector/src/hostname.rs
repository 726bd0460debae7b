// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Hostname detection for the intake envelope.

use std::env;
use tracing::warn;

/// Hostname used when neither `DD_HOSTNAME` nor `HOSTNAME` is set.
pub const FALLBACK_HOSTNAME: &str = "k8s-pod-unknown";

/// Resolves the host identifier reported with every forwarded document.
///
/// 1. `DD_HOSTNAME` (explicit override)
/// 2. `HOSTNAME` (set by Kubernetes for the pod)
/// 3. [`FALLBACK_HOSTNAME`]
#[must_use]
pub fn get_hostname() -> String {
    resolve_hostname(
        env::var("DD_HOSTNAME").ok().as_deref(),
        env::var("HOSTNAME").ok().as_deref(),
    )
}

fn resolve_hostname(dd_hostname: Option<&str>, hostname: Option<&str>) -> String {
    if let Some(name) = dd_hostname.map(str::trim).filter(|h| !h.is_empty()) {
        return name.to_string();
    }
    if let Some(name) = hostname.map(str::trim).filter(|h| !h.is_empty()) {
        return name.to_string();
    }
    warn!("Could not determine hostname, using '{FALLBACK_HOSTNAME}'");
    FALLBACK_HOSTNAME.to_string()
}
