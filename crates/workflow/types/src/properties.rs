//! Observability properties carried inside every payload

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Reserved JSON field that holds [`ObservabilityProperties`] in every payload
pub const OBSERVABILITY_FIELD: &str = "observableProperties";

/// String-keyed map of opaque values embedded in request and response payloads.
///
/// Trace context is written here as ordinary data so it survives
/// serialization, persistence and replay on another worker. Keys are kept
/// ordered so serialized payloads are byte-stable.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObservabilityProperties(BTreeMap<String, Value>);

impl ObservabilityProperties {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Read the properties out of a raw payload.
    ///
    /// Missing or malformed fields yield an empty map.
    pub fn from_payload(payload: &Value) -> Self {
        payload
            .get(OBSERVABILITY_FIELD)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// String value for `key`; non-string values are treated as absent
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Value)> for ObservabilityProperties {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_payload() {
        let payload = json!({
            "name": "secretA",
            "observableProperties": { "traceparent": "00-abc", "custom": 7 }
        });
        let props = ObservabilityProperties::from_payload(&payload);
        assert_eq!(props.get_str("traceparent"), Some("00-abc"));
        assert_eq!(props.get_str("custom"), None);
        assert_eq!(props.get("custom"), Some(&json!(7)));
    }

    #[test]
    fn test_from_payload_missing_or_malformed() {
        assert!(ObservabilityProperties::from_payload(&json!({})).is_empty());
        assert!(
            ObservabilityProperties::from_payload(&json!({ "observableProperties": [1, 2] }))
                .is_empty()
        );
    }

    #[test]
    fn test_serializes_as_plain_object() {
        let mut props = ObservabilityProperties::new();
        props.insert("b", "2");
        props.insert("a", "1");
        assert_eq!(
            serde_json::to_string(&props).unwrap(),
            r#"{"a":"1","b":"2"}"#
        );
    }
}
