//! Decision-rule derivation from a homogeneous fact group.

use std::collections::{BTreeMap, BTreeSet};

use sextant_core::errors::SynthesisError;
use sextant_core::models::{
    is_broken_reference, ChildDescriptor, ChildStructure, DecisionRule, ExpectedRelationship, Fact,
};

/// Derive the rule shared by `facts`. All facts must carry the same node
/// type; the caller checks scope and path.
pub fn derive_rule(facts: &[&Fact]) -> Result<DecisionRule, SynthesisError> {
    let first = facts.first().ok_or(SynthesisError::EmptyGroup)?;
    if let Some(other) = facts.iter().find(|f| f.node_type != first.node_type) {
        return Err(SynthesisError::MixedGroup {
            field: "node_type",
            expected: first.node_type.clone(),
            found: other.node_type.clone(),
        });
    }

    let mut common: BTreeSet<&str> = first.attribute_keys();
    let mut all: BTreeSet<&str> = BTreeSet::new();
    let mut references: BTreeSet<&str> = BTreeSet::new();
    let mut has_children = false;
    let mut children: BTreeMap<&str, (BTreeSet<&str>, BTreeSet<&str>)> = BTreeMap::new();

    for fact in facts {
        let keys = fact.attribute_keys();
        common = common.intersection(&keys).copied().collect();
        all.extend(keys);
        references.extend(fact.reference_keys());
        has_children |= fact.has_children();
        for child in &fact.children {
            let (attrs, refs) = children.entry(child.node_type.as_str()).or_default();
            attrs.extend(child.attributes.keys().map(String::as_str));
            refs.extend(child.references.keys().map(String::as_str));
        }
    }

    let expected_relationships = references
        .iter()
        .map(|field| ExpectedRelationship {
            reference_field: field.to_string(),
            expected_broken: facts.iter().any(|f| {
                f.references
                    .get(*field)
                    .map_or(true, is_broken_reference)
            }),
        })
        .collect();

    let mut rule = DecisionRule {
        node_type: first.node_type.clone(),
        must_have_attributes: common.iter().map(|s| s.to_string()).collect(),
        optional_attributes: all.difference(&common).map(|s| s.to_string()).collect(),
        child_structure: ChildStructure {
            has_children,
            child_structures: children
                .into_iter()
                .map(|(node_type, (attrs, refs))| ChildDescriptor {
                    node_type: node_type.to_string(),
                    required_attributes: attrs.into_iter().map(str::to_string).collect(),
                    reference_fields: refs.into_iter().map(str::to_string).collect(),
                })
                .collect(),
        },
        reference_patterns: references.iter().map(|s| s.to_string()).collect(),
        expected_relationships,
    };
    rule.canonicalize();
    Ok(rule)
}
