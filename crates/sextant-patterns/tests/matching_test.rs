//! Match engine verdicts and candidate selection.

use chrono::{Duration, Utc};
use proptest::prelude::*;
use sextant_core::config::MatchingConfig;
use sextant_core::errors::MatchError;
use sextant_core::models::{ChildDescriptor, DecisionRule, Fact, Pattern, Scope, Verdict};
use sextant_core::traits::PatternRepository;
use sextant_core::PathNormalizer;
use sextant_patterns::MatchEngine;
use sextant_storage::DatabaseManager;

const PAX_PATH: &str = "OrderViewRS/Response/DataLists/PaxList/Pax";

fn scope() -> Scope {
    Scope::new("21.3", "OrderViewRS")
}

fn engine() -> MatchEngine {
    MatchEngine::new(PathNormalizer::default(), &MatchingConfig::default())
}

fn rule(attrs: &[&str]) -> DecisionRule {
    let mut rule = DecisionRule::new("Pax");
    rule.must_have_attributes = attrs.iter().map(|s| s.to_string()).collect();
    rule
}

fn pattern(id: &str, airline: Option<&str>, rule: DecisionRule, times_seen: u64) -> Pattern {
    let now = Utc::now();
    Pattern {
        id: id.into(),
        spec_version: "21.3".into(),
        message_root: "OrderViewRS".into(),
        airline_code: airline.map(str::to_string),
        section_path: PAX_PATH.into(),
        decision_rule: rule,
        signature_hash: format!("sig-{id}"),
        times_seen,
        examples: Vec::new(),
        superseded_by: None,
        created_at: now,
        last_seen_at: now,
    }
}

fn fact(attrs: &[&str]) -> Fact {
    attrs.iter().fold(
        Fact::new("f1", "run-1", &scope(), PAX_PATH, "Pax", 0),
        |f, key| f.with_attribute(*key, "v"),
    )
}

#[test]
fn empty_library_is_new_pattern() {
    let outcome = engine().evaluate(&fact(&["PaxID"]), &[]).unwrap();
    assert_eq!(outcome.verdict, Verdict::NewPattern);
    assert_eq!(outcome.pattern_id, None);
    assert_eq!(outcome.confidence, 0.0);
}

#[test]
fn verdict_bands_follow_attribute_coverage() {
    let p = pattern("p1", None, rule(&["A", "B", "C", "D", "E", "F", "G", "H", "I", "J"]), 1);
    let cases: [(&[&str], Verdict); 5] = [
        (&["A", "B", "C", "D", "E", "F", "G", "H", "I", "J"], Verdict::ExactMatch),
        (&["A", "B", "C", "D", "E", "F", "G", "H", "I"], Verdict::HighMatch),
        (&["A", "B", "C", "D", "E", "F", "G", "H"], Verdict::PartialMatch),
        (&["A", "B", "C", "D", "E", "F"], Verdict::LowMatch),
        (&["A", "B", "C", "D", "E"], Verdict::NoMatch),
    ];
    for (present, expected) in cases {
        let outcome = engine().evaluate(&fact(present), std::slice::from_ref(&p)).unwrap();
        assert_eq!(outcome.verdict, expected, "{} attributes", present.len());
        assert_eq!(outcome.pattern_id.is_some(), expected.is_match());
    }
}

#[test]
fn breakdown_lists_missing_pieces() {
    let mut r = rule(&["PaxID", "PTC"]);
    r.child_structure.has_children = true;
    r.child_structure.child_structures = vec![ChildDescriptor {
        node_type: "Individual".into(),
        required_attributes: vec![],
        reference_fields: vec![],
    }];
    let outcome = engine()
        .evaluate(&fact(&["PaxID"]), &[pattern("p1", None, r, 1)])
        .unwrap();
    let best = outcome.best.unwrap();
    assert_eq!(best.missing_attributes, vec!["PTC"]);
    assert_eq!(best.missing_child_types, vec!["Individual"]);
    assert!((best.score - 0.3).abs() < 1e-9);
    assert_eq!(outcome.verdict, Verdict::NoMatch);
}

#[test]
fn equal_scores_prefer_more_sightings_then_airline() {
    let generic_busy = pattern("g", None, rule(&["PaxID"]), 5);
    let airline_quiet = pattern("lh", Some("LH"), rule(&["PaxID"]), 2);
    let mut f = fact(&["PaxID"]);
    f.airline_code = Some("LH".into());

    let outcome = engine()
        .evaluate(&f, &[airline_quiet.clone(), generic_busy.clone()])
        .unwrap();
    assert_eq!(outcome.pattern_id.as_deref(), Some("g"));

    let mut airline_equal = airline_quiet;
    airline_equal.times_seen = 5;
    airline_equal.last_seen_at = generic_busy.last_seen_at;
    let outcome = engine().evaluate(&f, &[generic_busy, airline_equal]).unwrap();
    assert_eq!(outcome.pattern_id.as_deref(), Some("lh"));
}

#[test]
fn recency_breaks_ties_on_equal_sightings() {
    let mut older = pattern("a", None, rule(&["PaxID"]), 3);
    older.last_seen_at = Utc::now() - Duration::hours(1);
    let newer = pattern("b", None, rule(&["PaxID"]), 3);
    let outcome = engine().evaluate(&fact(&["PaxID"]), &[older, newer]).unwrap();
    assert_eq!(outcome.pattern_id.as_deref(), Some("b"));
}

#[test]
fn foreign_airline_candidate_is_rejected() {
    let p = pattern("ba", Some("BA"), rule(&["PaxID"]), 1);
    let err = engine().evaluate(&fact(&["PaxID"]), &[p]).unwrap_err();
    assert!(matches!(err, MatchError::CandidateOutOfScope { .. }));
}

#[test]
fn superseded_candidates_are_ignored() {
    let mut p = pattern("old", None, rule(&["PaxID"]), 1);
    p.superseded_by = Some("new".into());
    let outcome = engine().evaluate(&fact(&["PaxID"]), &[p]).unwrap();
    assert_eq!(outcome.verdict, Verdict::NewPattern);
}

#[test]
fn identify_loads_airline_and_generic_candidates() {
    let db = DatabaseManager::open_in_memory().unwrap();
    db.write(|s| {
        s.create_pattern(&pattern("g", None, rule(&["PaxID", "PTC"]), 1))?;
        s.create_pattern(&pattern("lh", Some("LH"), rule(&["PaxID"]), 1))?;
        s.create_pattern(&pattern("ba", Some("BA"), rule(&["PaxID"]), 9))
    })
    .unwrap();

    let mut f = fact(&["PaxID"]);
    f.airline_code = Some("LH".into());
    let outcome = db.read(|s| engine().identify(s, &f)).unwrap();
    assert_eq!(outcome.candidates_considered, 2);
    assert_eq!(outcome.pattern_id.as_deref(), Some("lh"));
    assert_eq!(outcome.verdict, Verdict::ExactMatch);
}

proptest! {
    #[test]
    fn matching_twice_gives_the_same_result(
        present in prop::collection::vec(any::<bool>(), 6),
        required in prop::collection::vec(any::<bool>(), 6),
    ) {
        let names = ["A", "B", "C", "D", "E", "F"];
        let rule_attrs: Vec<&str> = names.iter().zip(&required).filter(|(_, r)| **r).map(|(n, _)| *n).collect();
        let fact_attrs: Vec<&str> = names.iter().zip(&present).filter(|(_, p)| **p).map(|(n, _)| *n).collect();
        let library = vec![
            pattern("p1", None, rule(&rule_attrs), 2),
            pattern("p2", None, rule(&fact_attrs), 1),
        ];
        let f = fact(&fact_attrs);
        let first = engine().evaluate(&f, &library).unwrap();
        let second = engine().evaluate(&f, &library).unwrap();
        prop_assert_eq!(first, second);
    }
}
