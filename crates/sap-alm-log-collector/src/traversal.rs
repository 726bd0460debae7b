// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Walks the `resourceLogs -> scopeLogs -> logRecords` tree of a payload.
//!
//! The payload is kept as a loosely typed [`serde_json::Value`]. Every level is type-checked and a
//! wrong shape only prunes that branch: siblings are still visited and the problem is returned as a
//! [`TraversalError`] for the caller to log.

use serde_json::Value;

use crate::resource::{extract_resource_attributes, ResourceAttributes};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TraversalError {
    #[error("payload is not a JSON object with 'resourceLogs' (got {0})")]
    UnexpectedPayload(&'static str),

    #[error("'{path}' is not a list (got {found})")]
    NotAList { path: String, found: &'static str },

    #[error("'{path}' is not an object (got {found})")]
    NotAnObject { path: String, found: &'static str },
}

/// The records of one `scopeLogs` entry.
#[derive(Debug, Default, PartialEq)]
pub struct ScopeBatch<'a> {
    pub records: Vec<&'a Value>,
}

/// One `resourceLogs` entry: its attributes and the record batches beneath it.
#[derive(Debug, Default, PartialEq)]
pub struct ResourceBatch<'a> {
    pub attributes: ResourceAttributes,
    pub scopes: Vec<ScopeBatch<'a>>,
}

#[derive(Debug, Default, PartialEq)]
pub struct Traversal<'a> {
    pub resources: Vec<ResourceBatch<'a>>,
    pub errors: Vec<TraversalError>,
}

impl Traversal<'_> {
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.resources
            .iter()
            .flat_map(|r| r.scopes.iter())
            .map(|s| s.records.len())
            .sum()
    }
}

/// Returns `true` for `{}`, `[]` and `null`: nothing to process this cycle.
#[must_use]
pub fn is_empty_payload(payload: &Value) -> bool {
    match payload {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

/// Collects every log record of a payload, grouped by resource and scope. Never fails.
#[must_use]
pub fn traverse(payload: &Value) -> Traversal<'_> {
    let mut traversal = Traversal::default();

    let Some(resource_logs) = payload.get("resourceLogs") else {
        traversal
            .errors
            .push(TraversalError::UnexpectedPayload(type_name(payload)));
        return traversal;
    };
    let Some(resource_logs) = as_list(resource_logs, "resourceLogs", &mut traversal.errors) else {
        return traversal;
    };

    for (r, resource_entry) in resource_logs.iter().enumerate() {
        let path = format!("resourceLogs[{r}]");
        if !is_object(resource_entry, &path, &mut traversal.errors) {
            continue;
        }

        let mut batch = ResourceBatch {
            attributes: extract_resource_attributes(resource_entry),
            scopes: Vec::new(),
        };

        let scope_path = format!("{path}.scopeLogs");
        let scope_logs = resource_entry
            .get("scopeLogs")
            .and_then(|s| as_list(s, &scope_path, &mut traversal.errors));
        for (s, scope_entry) in scope_logs.into_iter().flatten().enumerate() {
            let path = format!("{scope_path}[{s}]");
            if !is_object(scope_entry, &path, &mut traversal.errors) {
                continue;
            }
            let records_path = format!("{path}.logRecords");
            let records = scope_entry
                .get("logRecords")
                .and_then(|l| as_list(l, &records_path, &mut traversal.errors));
            if let Some(records) = records {
                batch.scopes.push(ScopeBatch {
                    records: records.iter().collect(),
                });
            }
        }

        traversal.resources.push(batch);
    }

    traversal
}

fn as_list<'a>(
    value: &'a Value,
    path: &str,
    errors: &mut Vec<TraversalError>,
) -> Option<&'a Vec<Value>> {
    let list = value.as_array();
    if list.is_none() {
        errors.push(TraversalError::NotAList {
            path: path.to_string(),
            found: type_name(value),
        });
    }
    list
}

fn is_object(value: &Value, path: &str, errors: &mut Vec<TraversalError>) -> bool {
    if value.is_object() {
        return true;
    }
    errors.push(TraversalError::NotAnObject {
        path: path.to_string(),
        found: type_name(value),
    });
    false
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}
