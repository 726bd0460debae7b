// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Per-record transform strategies.
//!
//! - **PassThrough**: the whole log record is forwarded untouched.
//! - **EmbeddedContext**: only the XML document carried by the `ERROR_CONTEXT` attribute is
//!   forwarded. Records without it are dropped.
//!
//! The strategy is picked once per source, from its identifier, when the configuration is loaded.

use serde_json::Value;

/// Case-insensitive marker that selects [`SourceKind::EmbeddedContext`] for a source identifier.
pub const EMBEDDED_CONTEXT_MARKER: &str = "exception";

/// Record attribute holding the embedded XML document.
pub const ERROR_CONTEXT_ATTRIBUTE: &str = "ERROR_CONTEXT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceKind {
    #[default]
    PassThrough,
    EmbeddedContext,
}

impl SourceKind {
    #[must_use]
    pub fn from_identifier(identifier: &str) -> Self {
        if identifier
            .to_lowercase()
            .contains(EMBEDDED_CONTEXT_MARKER)
        {
            SourceKind::EmbeddedContext
        } else {
            SourceKind::PassThrough
        }
    }

    /// Returns the message to forward for `record`, or `None` when the record is filtered out.
    ///
    /// Pure: performs no I/O and always gives the same answer for the same record.
    #[must_use]
    pub fn transform(self, record: &Value) -> Option<Value> {
        match self {
            SourceKind::PassThrough => Some(record.clone()),
            SourceKind::EmbeddedContext => {
                find_error_context(record).map(|xml| Value::String(xml.to_string()))
            }
        }
    }
}

/// Looks up the string payload of the `ERROR_CONTEXT` entry in the record's `attributes`.
fn find_error_context(record: &Value) -> Option<&str> {
    record
        .get("attributes")?
        .as_array()?
        .iter()
        .find(|attribute| {
            attribute.get("key").and_then(Value::as_str) == Some(ERROR_CONTEXT_ATTRIBUTE)
        })?
        .get("value")?
        .as_object()?
        .values()
        .find_map(Value::as_str)
}

/// Short identifier of a record for diagnostics: its trace id, else one of its timestamps.
#[must_use]
pub fn record_id(record: &Value) -> String {
    ["traceId", "timeUnixNano", "observedTimeUnixNano"]
        .iter()
        .find_map(|field| match record.get(field) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
        .unwrap_or_else(|| "unknown".to_string())
}
