//! Content-addressed signatures for decision rules.

use serde::Serialize;
use sextant_core::errors::SynthesisError;
use sextant_core::models::DecisionRule;

#[derive(Serialize)]
struct SignatureInput<'a> {
    spec_version: &'a str,
    section_path: &'a str,
    decision_rule: &'a DecisionRule,
}

/// BLAKE3 hex digest of the canonical JSON of `(spec_version, section_path,
/// rule)`. `section_path` must already be normalized.
pub fn signature_hash(
    spec_version: &str,
    section_path: &str,
    rule: &DecisionRule,
) -> Result<String, SynthesisError> {
    let mut canonical = rule.clone();
    canonical.canonicalize();
    let json = serde_json::to_vec(&SignatureInput {
        spec_version,
        section_path,
        decision_rule: &canonical,
    })
    .map_err(|e| SynthesisError::Canonicalization(e.to_string()))?;
    Ok(blake3::hash(&json).to_hex().to_string())
}
