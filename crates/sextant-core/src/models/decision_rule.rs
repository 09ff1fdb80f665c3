//! Decision rules: the typed structural summary a pattern matches against.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Structural requirements for one distinct child node type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildDescriptor {
    pub node_type: String,
    pub required_attributes: Vec<String>,
    pub reference_fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChildStructure {
    pub has_children: bool,
    /// One descriptor per distinct child node type, sorted by node type.
    pub child_structures: Vec<ChildDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedRelationship {
    pub reference_field: String,
    /// True when at least one observed example lacked the reference or held it broken.
    pub expected_broken: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionRule {
    pub node_type: String,
    pub must_have_attributes: Vec<String>,
    pub optional_attributes: Vec<String>,
    pub child_structure: ChildStructure,
    pub reference_patterns: Vec<String>,
    pub expected_relationships: Vec<ExpectedRelationship>,
}

impl DecisionRule {
    /// An empty rule for `node_type`.
    pub fn new(node_type: impl Into<String>) -> Self {
        Self {
            node_type: node_type.into(),
            must_have_attributes: Vec::new(),
            optional_attributes: Vec::new(),
            child_structure: ChildStructure::default(),
            reference_patterns: Vec::new(),
            expected_relationships: Vec::new(),
        }
    }

    /// Sort every list and collapse duplicates. Child descriptors sharing a
    /// node type are folded into one entry.
    pub fn canonicalize(&mut self) {
        sort_dedup(&mut self.must_have_attributes);
        sort_dedup(&mut self.optional_attributes);
        sort_dedup(&mut self.reference_patterns);

        let mut merged: Vec<ChildDescriptor> = Vec::new();
        let mut children = std::mem::take(&mut self.child_structure.child_structures);
        children.sort_by(|a, b| a.node_type.cmp(&b.node_type));
        for child in children {
            match merged.last_mut() {
                Some(last) if last.node_type == child.node_type => {
                    last.required_attributes.extend(child.required_attributes);
                    last.reference_fields.extend(child.reference_fields);
                }
                _ => merged.push(child),
            }
        }
        for child in &mut merged {
            sort_dedup(&mut child.required_attributes);
            sort_dedup(&mut child.reference_fields);
        }
        if !merged.is_empty() {
            self.child_structure.has_children = true;
        }
        self.child_structure.child_structures = merged;

        self.expected_relationships
            .sort_by(|a, b| a.reference_field.cmp(&b.reference_field));
        self.expected_relationships.dedup_by(|next, kept| {
            if next.reference_field == kept.reference_field {
                kept.expected_broken |= next.expected_broken;
                true
            } else {
                false
            }
        });
    }

    pub fn has_children(&self) -> bool {
        self.child_structure.has_children
    }

    pub fn child_types(&self) -> BTreeSet<&str> {
        self.child_structure
            .child_structures
            .iter()
            .map(|c| c.node_type.as_str())
            .collect()
    }

    pub fn is_expected_broken(&self, reference_field: &str) -> bool {
        self.expected_relationships
            .iter()
            .any(|r| r.reference_field == reference_field && r.expected_broken)
    }
}

fn sort_dedup(values: &mut Vec<String>) {
    values.sort();
    values.dedup();
}
