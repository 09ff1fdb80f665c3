//! Facts: structured records extracted from one XML fragment.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::scope::Scope;

/// Tagged-value map used at the extractor boundary.
pub type ValueMap = BTreeMap<String, Value>;

/// A child element summarized inside its parent fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildFact {
    pub node_type: String,
    #[serde(default)]
    pub attributes: ValueMap,
    #[serde(default)]
    pub references: ValueMap,
}

impl ChildFact {
    pub fn new(node_type: impl Into<String>) -> Self {
        Self {
            node_type: node_type.into(),
            attributes: ValueMap::new(),
            references: ValueMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_reference(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.references.insert(key.into(), value.into());
        self
    }
}

/// A structured record extracted from one fragment. Immutable once persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fact {
    pub id: String,
    pub run_id: String,
    pub spec_version: String,
    pub message_root: String,
    pub airline_code: Option<String>,
    pub section_path: String,
    pub node_type: String,
    /// Position in document order of extraction, monotonic across the run.
    pub ordinal: u32,
    pub attributes: ValueMap,
    pub children: Vec<ChildFact>,
    pub references: ValueMap,
    /// Extractor-reported confidence in [0, 1].
    pub confidence: f64,
    pub snippet: Option<String>,
    pub masked: bool,
    pub created_at: DateTime<Utc>,
}

impl Fact {
    /// Create an empty fact at `section_path` within `scope`.
    pub fn new(
        id: impl Into<String>,
        run_id: impl Into<String>,
        scope: &Scope,
        section_path: impl Into<String>,
        node_type: impl Into<String>,
        ordinal: u32,
    ) -> Self {
        Self {
            id: id.into(),
            run_id: run_id.into(),
            spec_version: scope.spec_version.clone(),
            message_root: scope.message_root.clone(),
            airline_code: scope.airline_code.clone(),
            section_path: section_path.into(),
            node_type: node_type.into(),
            ordinal,
            attributes: ValueMap::new(),
            children: Vec::new(),
            references: ValueMap::new(),
            confidence: 1.0,
            snippet: None,
            masked: false,
            created_at: Utc::now(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_reference(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.references.insert(key.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: ChildFact) -> Self {
        self.children.push(child);
        self
    }

    pub fn scope(&self) -> Scope {
        Scope {
            spec_version: self.spec_version.clone(),
            message_root: self.message_root.clone(),
            airline_code: self.airline_code.clone(),
        }
    }

    pub fn attribute_keys(&self) -> BTreeSet<&str> {
        self.attributes.keys().map(String::as_str).collect()
    }

    pub fn reference_keys(&self) -> BTreeSet<&str> {
        self.references.keys().map(String::as_str).collect()
    }

    /// Distinct child node types, regardless of repetition.
    pub fn child_types(&self) -> BTreeSet<&str> {
        self.children.iter().map(|c| c.node_type.as_str()).collect()
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// True when `field` is present and carries a usable value.
    pub fn has_resolved_reference(&self, field: &str) -> bool {
        self.references
            .get(field)
            .is_some_and(|v| !is_broken_reference(v))
    }
}

/// A reference value is broken when it is null, an empty string, or an empty list.
pub fn is_broken_reference(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_types_ignore_repetition() {
        let scope = Scope::new("21.3", "AirShoppingRS");
        let fact = Fact::new("f1", "r1", &scope, "AirShoppingRS/Response/Offer", "Offer", 0)
            .with_child(ChildFact::new("OfferItem"))
            .with_child(ChildFact::new("OfferItem"))
            .with_child(ChildFact::new("Price"));
        assert_eq!(fact.child_types().len(), 2);
    }

    #[test]
    fn broken_references() {
        assert!(is_broken_reference(&Value::Null));
        assert!(is_broken_reference(&Value::String("  ".into())));
        assert!(is_broken_reference(&Value::Array(vec![])));
        assert!(!is_broken_reference(&Value::String("PAX1".into())));
    }
}
