//! Extractor boundary payloads.
//!
//! Fact extractors (LLM-backed or rule-based) report facts as loosely typed
//! JSON. `ExtractedFact::from_value` projects one payload entry into the typed
//! shape the rest of the system works with.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::fact::{ChildFact, ValueMap};
use crate::errors::ExtractorError;

/// One fact as reported by an extractor, before run/scope metadata is attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFact {
    pub node_type: String,
    #[serde(default)]
    pub attributes: ValueMap,
    #[serde(default)]
    pub children: Vec<ChildFact>,
    #[serde(default)]
    pub references: ValueMap,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    #[serde(default)]
    pub snippet: Option<String>,
}

fn default_confidence() -> f64 {
    1.0
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractorTelemetry {
    pub latency_ms: u64,
    pub input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
    pub model: Option<String>,
}

/// Everything an extractor returns for one fragment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FactExtraction {
    pub facts: Vec<ExtractedFact>,
    #[serde(default)]
    pub telemetry: ExtractorTelemetry,
}

impl FactExtraction {
    /// Project a raw `{facts: [...], telemetry: {...}}` payload.
    pub fn from_value(value: &Value) -> Result<Self, ExtractorError> {
        let obj = value
            .as_object()
            .ok_or_else(|| ExtractorError::MalformedPayload("payload is not an object".into()))?;
        let facts = match obj.get("facts") {
            Some(Value::Array(items)) => items
                .iter()
                .map(ExtractedFact::from_value)
                .collect::<Result<Vec<_>, _>>()?,
            Some(Value::Null) | None => Vec::new(),
            Some(_) => {
                return Err(ExtractorError::MalformedPayload(
                    "`facts` must be an array".into(),
                ))
            }
        };
        let telemetry = match obj.get("telemetry") {
            Some(t @ Value::Object(_)) => serde_json::from_value(t.clone())
                .map_err(|e| ExtractorError::MalformedPayload(format!("telemetry: {e}")))?,
            _ => ExtractorTelemetry::default(),
        };
        Ok(Self { facts, telemetry })
    }
}

impl ExtractedFact {
    pub fn new(node_type: impl Into<String>) -> Self {
        Self {
            node_type: node_type.into(),
            attributes: ValueMap::new(),
            children: Vec::new(),
            references: ValueMap::new(),
            confidence: 1.0,
            snippet: None,
        }
    }

    /// Project one loosely typed fact entry.
    ///
    /// The node type is read from `node_type` (or `type`). Children may be
    /// full objects or attribute summaries given as a list of key names.
    /// Confidence defaults to 1.0 and is clamped into [0, 1].
    pub fn from_value(value: &Value) -> Result<Self, ExtractorError> {
        let obj = value
            .as_object()
            .ok_or_else(|| ExtractorError::MalformedPayload("fact is not an object".into()))?;
        let node_type = node_type_of(obj)?;
        let attributes = value_map(obj, "attributes")?;
        let references = value_map(obj, "references")?;

        let children = match obj.get("children") {
            Some(Value::Array(items)) => items
                .iter()
                .map(child_from_value)
                .collect::<Result<Vec<_>, _>>()?,
            Some(Value::Null) | None => Vec::new(),
            Some(_) => {
                return Err(ExtractorError::MalformedPayload(format!(
                    "`children` of {node_type} must be an array"
                )))
            }
        };

        let confidence = obj
            .get("confidence")
            .and_then(Value::as_f64)
            .unwrap_or(1.0)
            .clamp(0.0, 1.0);
        let snippet = obj.get("snippet").and_then(Value::as_str).map(str::to_string);

        Ok(Self {
            node_type,
            attributes,
            children,
            references,
            confidence,
            snippet,
        })
    }
}

fn node_type_of(obj: &Map<String, Value>) -> Result<String, ExtractorError> {
    obj.get("node_type")
        .or_else(|| obj.get("type"))
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
        .ok_or_else(|| ExtractorError::MalformedPayload("missing node_type".into()))
}

fn value_map(obj: &Map<String, Value>, key: &str) -> Result<ValueMap, ExtractorError> {
    match obj.get(key) {
        Some(Value::Object(map)) => Ok(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()),
        // Attribute summaries: a bare list of key names.
        Some(Value::Array(keys)) => keys
            .iter()
            .map(|k| {
                k.as_str()
                    .map(|s| (s.to_string(), Value::Null))
                    .ok_or_else(|| {
                        ExtractorError::MalformedPayload(format!("`{key}` entries must be strings"))
                    })
            })
            .collect(),
        Some(Value::Null) | None => Ok(ValueMap::new()),
        Some(_) => Err(ExtractorError::MalformedPayload(format!(
            "`{key}` must be an object"
        ))),
    }
}

fn child_from_value(value: &Value) -> Result<ChildFact, ExtractorError> {
    let obj = value
        .as_object()
        .ok_or_else(|| ExtractorError::MalformedPayload("child is not an object".into()))?;
    Ok(ChildFact {
        node_type: node_type_of(obj)?,
        attributes: value_map(obj, "attributes")?,
        references: value_map(obj, "references")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn projects_full_payload() {
        let raw = json!({
            "node_type": "Pax",
            "attributes": {"PaxID": "PAX1", "PTC": "ADT"},
            "references": {"ContactInfoRefID": "CI1"},
            "children": [
                {"node_type": "Individual", "attributes": {"Surname": "DOE"}},
                {"type": "LoyaltyProgramAccount", "attributes": ["AccountNumber"]}
            ],
            "confidence": 1.7
        });
        let fact = ExtractedFact::from_value(&raw).unwrap();
        assert_eq!(fact.node_type, "Pax");
        assert_eq!(fact.attributes.len(), 2);
        assert_eq!(fact.children.len(), 2);
        assert_eq!(fact.children[1].attributes.get("AccountNumber"), Some(&Value::Null));
        assert_eq!(fact.confidence, 1.0);
    }

    #[test]
    fn rejects_missing_node_type() {
        let err = ExtractedFact::from_value(&json!({"attributes": {}})).unwrap_err();
        assert!(matches!(err, ExtractorError::MalformedPayload(_)));
    }

    #[test]
    fn extraction_without_facts_is_empty() {
        let extraction = FactExtraction::from_value(&json!({"telemetry": {"latency_ms": 12}})).unwrap();
        assert!(extraction.facts.is_empty());
        assert_eq!(extraction.telemetry.latency_ms, 12);
    }
}
