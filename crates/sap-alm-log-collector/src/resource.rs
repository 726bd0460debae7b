// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Resource attribute extraction.
//!
//! OTLP JSON encodes attribute values as one-of wrappers:
//!
//! ```json
//! {"key": "sap.system.id", "value": {"stringValue": "S4H"}}
//! {"key": "sap.client", "value": {"intValue": "100"}}
//! ```
//!
//! Only scalar wrappers are kept. Arrays, key/value lists and anything malformed are skipped.

use serde_json::Value;

/// Flat, insertion-ordered mapping of resource attribute key to its value rendered as a string.
///
/// Built once per `resourceLogs` entry and shared read-only by every record beneath it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceAttributes {
    entries: Vec<(String, String)>,
}

impl ResourceAttributes {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value, replacing in place the value of an existing key so the first-seen order is
    /// kept.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    #[cfg(test)]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ResourceAttributes {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut attributes = ResourceAttributes::new();
        for (k, v) in iter {
            attributes.insert(k, v);
        }
        attributes
    }
}

/// Derives the attribute set of one `resourceLogs` entry from `resource.attributes`.
///
/// Never fails: a missing or malformed block yields an empty set.
#[must_use]
pub fn extract_resource_attributes(resource_logs: &Value) -> ResourceAttributes {
    resource_logs
        .get("resource")
        .and_then(|resource| resource.get("attributes"))
        .and_then(Value::as_array)
        .map(|attributes| {
            attributes
                .iter()
                .filter_map(|attribute| {
                    let key = attribute.get("key")?.as_str()?;
                    let value = attribute.get("value").and_then(scalar_value)?;
                    Some((key, value))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Renders the first scalar field of a one-of value wrapper as a string. Fields are visited in
/// document order (`serde_json` is built with `preserve_order`).
#[must_use]
pub fn scalar_value(wrapper: &Value) -> Option<String> {
    wrapper.as_object()?.values().find_map(|v| match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_string_attribute() {
        let entry = json!({"resource":{"attributes":[{"key":"k1","value":{"stringValue":"v1"}}]}});
        let attributes = extract_resource_attributes(&entry);
        assert_eq!(attributes, ResourceAttributes::from_iter([("k1", "v1")]));
    }

    #[test]
    fn test_extract_empty_resource() {
        assert!(extract_resource_attributes(&json!({"resource":{}})).is_empty());
        assert!(extract_resource_attributes(&json!({})).is_empty());
        assert!(extract_resource_attributes(&json!({"resource":{"attributes":"nope"}})).is_empty());
        assert!(extract_resource_attributes(&json!([])).is_empty());
    }

    #[test]
    fn test_extract_scalars_and_skip_the_rest() {
        let entry = json!({"resource":{"attributes":[
            {"key":"sap.system.id","value":{"stringValue":"S4H"}},
            {"key":"sap.client","value":{"intValue":100}},
            {"key":"ratio","value":{"doubleValue":0.5}},
            {"key":"prod","value":{"boolValue":true}},
            {"key":"list","value":{"arrayValue":{"values":[]}}},
            {"key":"nothing","value":{}},
            {"value":{"stringValue":"orphan"}},
            {"key":42,"value":{"stringValue":"bad key"}},
            "not an object",
            {"key":"no_value"}
        ]}});
        let attributes = extract_resource_attributes(&entry);
        let collected: Vec<(&str, &str)> = attributes.iter().collect();
        assert_eq!(
            collected,
            vec![
                ("sap.system.id", "S4H"),
                ("sap.client", "100"),
                ("ratio", "0.5"),
                ("prod", "true"),
            ]
        );
    }

    #[test]
    fn test_duplicate_key_keeps_first_position() {
        let mut attributes = ResourceAttributes::new();
        attributes.insert("a", "1");
        attributes.insert("b", "2");
        attributes.insert("a", "3");
        let collected: Vec<(&str, &str)> = attributes.iter().collect();
        assert_eq!(collected, vec![("a", "3"), ("b", "2")]);
        assert_eq!(attributes.get("a"), Some("3"));
        assert_eq!(attributes.len(), 2);
    }

    #[test]
    fn test_scalar_value_follows_document_order() {
        let wrapper: Value = serde_json::from_str(r#"{"stringValue":"z","boolValue":true}"#).unwrap();
        assert_eq!(scalar_value(&wrapper), Some("z".to_string()));
        let wrapper: Value = serde_json::from_str(r#"{"boolValue":true,"stringValue":"z"}"#).unwrap();
        assert_eq!(scalar_value(&wrapper), Some("true".to_string()));
    }
}
