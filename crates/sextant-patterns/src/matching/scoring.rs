//! Structural scoring of a fact against one decision rule.

use serde::Serialize;
use sextant_core::models::{DecisionRule, Fact};

const ATTRIBUTE_WEIGHT: f64 = 0.6;
const CHILD_WEIGHT: f64 = 0.4;

/// Relationship penalty settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PenaltyPolicy {
    pub per_relationship: f64,
    pub cap: f64,
}

/// How a score was reached, for callers that explain verdicts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub pattern_id: String,
    pub score: f64,
    pub node_type_matched: bool,
    pub attribute_coverage: f64,
    pub child_coverage: f64,
    pub base: f64,
    pub penalty: f64,
    pub missing_attributes: Vec<String>,
    pub missing_child_types: Vec<String>,
    pub penalized_relationships: Vec<String>,
}

/// Score `fact` against `rule`.
///
/// `attr` is the share of `must_have_attributes` present (1.0 when none);
/// `child` the share of rule child types present (1.0 when none). A rule
/// without children scores `attr`, otherwise `0.6 attr + 0.4 child`. Each
/// rule reference that is missing or broken in the fact, and not expected to
/// be broken, costs `per_relationship` up to `cap`.
pub fn score(pattern_id: &str, fact: &Fact, rule: &DecisionRule, policy: PenaltyPolicy) -> ScoreBreakdown {
    if fact.node_type != rule.node_type {
        return ScoreBreakdown {
            pattern_id: pattern_id.to_string(),
            score: 0.0,
            node_type_matched: false,
            attribute_coverage: 0.0,
            child_coverage: 0.0,
            base: 0.0,
            penalty: 0.0,
            missing_attributes: rule.must_have_attributes.clone(),
            missing_child_types: rule.child_types().into_iter().map(str::to_string).collect(),
            penalized_relationships: Vec::new(),
        };
    }

    let missing_attributes: Vec<String> = rule
        .must_have_attributes
        .iter()
        .filter(|key| !fact.attributes.contains_key(key.as_str()))
        .cloned()
        .collect();
    let attribute_coverage = coverage(rule.must_have_attributes.len(), missing_attributes.len());

    let fact_children = fact.child_types();
    let rule_children = rule.child_types();
    let missing_child_types: Vec<String> = rule_children
        .iter()
        .filter(|t| !fact_children.contains(*t))
        .map(|t| t.to_string())
        .collect();
    let child_coverage = coverage(rule_children.len(), missing_child_types.len());

    let base = if rule.has_children() {
        ATTRIBUTE_WEIGHT * attribute_coverage + CHILD_WEIGHT * child_coverage
    } else {
        attribute_coverage
    };

    let penalized_relationships: Vec<String> = rule
        .reference_patterns
        .iter()
        .filter(|field| !fact.has_resolved_reference(field) && !rule.is_expected_broken(field))
        .cloned()
        .collect();
    let penalty = (penalized_relationships.len() as f64 * policy.per_relationship).min(policy.cap);

    ScoreBreakdown {
        pattern_id: pattern_id.to_string(),
        score: (base - penalty).clamp(0.0, 1.0),
        node_type_matched: true,
        attribute_coverage,
        child_coverage,
        base,
        penalty,
        missing_attributes,
        missing_child_types,
        penalized_relationships,
    }
}

fn coverage(total: usize, missing: usize) -> f64 {
    if total == 0 {
        1.0
    } else {
        (total - missing) as f64 / total as f64
    }
}
