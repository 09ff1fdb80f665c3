//! Repository behaviour through DatabaseManager units of work.

use chrono::{Duration, Utc};
use serde_json::json;
use sextant_core::errors::StorageError;
use sextant_core::models::{
    ChildFact, DecisionRule, ExampleRef, Fact, Pattern, PatternMatch, Run, RunCounters,
    RunFailure, RunKind, RunStatus, Scope, Verdict,
};
use sextant_core::traits::{
    AirlineFilter, FactRepository, MatchRepository, PatternQuery, PatternRepository,
    RunRepository,
};
use sextant_storage::DatabaseManager;

fn scope() -> Scope {
    Scope::new("21.3", "OrderViewRS")
}

fn pattern(id: &str, scope: &Scope, path: &str, signature: &str, times_seen: u64) -> Pattern {
    let now = Utc::now();
    let mut rule = DecisionRule::new(path.rsplit('/').next().unwrap_or(path));
    rule.must_have_attributes = vec!["PaxID".into()];
    Pattern {
        id: id.into(),
        spec_version: scope.spec_version.clone(),
        message_root: scope.message_root.clone(),
        airline_code: scope.airline_code.clone(),
        section_path: path.into(),
        decision_rule: rule,
        signature_hash: signature.into(),
        times_seen,
        examples: Vec::new(),
        superseded_by: None,
        created_at: now,
        last_seen_at: now,
    }
}

fn seed_run(db: &DatabaseManager, id: &str, kind: RunKind) {
    db.write(|s| s.create_run(&Run::start(id, kind, scope())))
        .unwrap();
}

#[test]
fn pattern_round_trip() {
    let db = DatabaseManager::open_in_memory().unwrap();
    let p = pattern("p1", &scope(), "OrderViewRS/Response/DataLists/PaxList", "sig-1", 1);
    db.write(|s| s.create_pattern(&p)).unwrap();

    let loaded = db.read(|s| s.get_pattern("p1")).unwrap().unwrap();
    assert_eq!(loaded.id, "p1");
    assert_eq!(loaded.decision_rule, p.decision_rule);
    assert_eq!(loaded.signature_hash, "sig-1");
    assert_eq!(loaded.airline_code, None);
    assert!(loaded.is_active());
    assert!(db.read(|s| s.get_pattern("missing")).unwrap().is_none());
}

#[test]
fn duplicate_signature_in_scope_is_unique_violation() {
    let db = DatabaseManager::open_in_memory().unwrap();
    let path = "OrderViewRS/Response/DataLists/PaxList";
    db.write(|s| s.create_pattern(&pattern("p1", &scope(), path, "sig", 1)))
        .unwrap();

    let err = db
        .write(|s| s.create_pattern(&pattern("p2", &scope(), path, "sig", 1)))
        .unwrap_err();
    assert!(err.is_unique_violation(), "got {err:?}");

    // Same signature under another airline is a different partition.
    db.write(|s| s.create_pattern(&pattern("p3", &scope().with_airline("LH"), path, "sig", 1)))
        .unwrap();
}

#[test]
fn find_by_signature_respects_airline_partition() {
    let db = DatabaseManager::open_in_memory().unwrap();
    let path = "OrderViewRS/Response/DataLists/PaxList";
    db.write(|s| {
        s.create_pattern(&pattern("generic", &scope(), path, "sig", 1))?;
        s.create_pattern(&pattern("lh", &scope().with_airline("LH"), path, "sig", 1))
    })
    .unwrap();

    let found = db
        .read(|s| s.find_by_signature(&scope().with_airline("LH"), "sig"))
        .unwrap()
        .unwrap();
    assert_eq!(found.id, "lh");
    let found = db.read(|s| s.find_by_signature(&scope(), "sig")).unwrap().unwrap();
    assert_eq!(found.id, "generic");
    assert!(db
        .read(|s| s.find_by_signature(&scope().with_airline("BA"), "sig"))
        .unwrap()
        .is_none());
}

#[test]
fn listing_puts_airline_patterns_first_then_times_seen() {
    let db = DatabaseManager::open_in_memory().unwrap();
    let path = "OrderViewRS/Response/DataLists/PaxList";
    db.write(|s| {
        s.create_pattern(&pattern("g-busy", &scope(), path, "a", 9))?;
        s.create_pattern(&pattern("g-quiet", &scope(), path, "b", 2))?;
        s.create_pattern(&pattern("lh", &scope().with_airline("LH"), path, "c", 1))?;
        s.create_pattern(&pattern("ba", &scope().with_airline("BA"), path, "d", 50))
    })
    .unwrap();

    let query = PatternQuery::in_scope(&scope())
        .airline(AirlineFilter::ExactOrGeneric("LH".into()))
        .section_path(path);
    let ids: Vec<String> = db
        .read(|s| s.list_patterns(&query))
        .unwrap()
        .into_iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(ids, vec!["lh", "g-busy", "g-quiet"]);

    let limited = db.read(|s| s.list_patterns(&query.clone().limit(2))).unwrap();
    assert_eq!(limited.len(), 2);
}

#[test]
fn superseded_patterns_are_hidden_by_default() {
    let db = DatabaseManager::open_in_memory().unwrap();
    let path = "OrderViewRS/Response/DataLists";
    db.write(|s| {
        s.create_pattern(&pattern("old", &scope(), path, "a", 1))?;
        s.create_pattern(&pattern("new", &scope(), path, "b", 1))?;
        s.mark_superseded(&["old".to_string(), "new".to_string()], "new")
    })
    .unwrap();

    let active = db
        .read(|s| s.list_patterns(&PatternQuery::in_scope(&scope())))
        .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, "new");

    let all = db
        .read(|s| s.list_patterns(&PatternQuery::in_scope(&scope()).include_superseded()))
        .unwrap();
    assert_eq!(all.len(), 2);
    let old = all.iter().find(|p| p.id == "old").unwrap();
    assert_eq!(old.superseded_by.as_deref(), Some("new"));
}

#[test]
fn increment_times_seen_trims_example_ring() {
    let db = DatabaseManager::open_in_memory().unwrap();
    let path = "OrderViewRS/Response/DataLists/PaxList";
    db.write(|s| s.create_pattern(&pattern("p1", &scope(), path, "sig", 1)))
        .unwrap();

    let base = Utc::now();
    let mut last = None;
    for i in 0..4 {
        let example = ExampleRef {
            fact_id: format!("f{i}"),
            timestamp: base + Duration::seconds(i),
        };
        last = Some(db.write(|s| s.increment_times_seen("p1", &example, 2)).unwrap());
    }
    let updated = last.unwrap();
    assert_eq!(updated.times_seen, 5);
    let ids: Vec<_> = updated.examples.iter().map(|e| e.fact_id.as_str()).collect();
    assert_eq!(ids, vec!["f2", "f3"]);

    let reloaded = db.read(|s| s.get_pattern("p1")).unwrap().unwrap();
    assert_eq!(reloaded.times_seen, 5);
    assert_eq!(reloaded.examples.len(), 2);

    let err = db
        .write(|s| {
            s.increment_times_seen(
                "missing",
                &ExampleRef { fact_id: "f".into(), timestamp: base },
                2,
            )
        })
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound { entity: "pattern", .. }));
}

#[test]
fn facts_round_trip_in_ordinal_order() {
    let db = DatabaseManager::open_in_memory().unwrap();
    seed_run(&db, "run-1", RunKind::Extract);

    let path = "OrderViewRS/Response/DataLists/PaxList";
    let facts = vec![
        Fact::new("f2", "run-1", &scope(), path, "PaxList", 2),
        Fact::new("f0", "run-1", &scope(), path, "PaxList", 0)
            .with_attribute("PTC", "ADT")
            .with_reference("PaxRefID", json!("PAX1"))
            .with_child(ChildFact::new("Pax").with_attribute("PaxID", "PAX1")),
        Fact::new("f1", "run-1", &scope(), path, "PaxList", 1),
    ];
    let written = db.write(|s| s.create_facts(&facts)).unwrap();
    assert_eq!(written, 3);

    let listed = db.read(|s| s.list_facts_by_run("run-1")).unwrap();
    let ordinals: Vec<u32> = listed.iter().map(|f| f.ordinal).collect();
    assert_eq!(ordinals, vec![0, 1, 2]);

    let first = &listed[0];
    assert_eq!(first.attributes.get("PTC"), Some(&json!("ADT")));
    assert_eq!(first.references.get("PaxRefID"), Some(&json!("PAX1")));
    assert_eq!(first.children.len(), 1);
    assert_eq!(first.children[0].node_type, "Pax");
    assert!(!first.masked);
}

#[test]
fn deleting_a_pattern_keeps_matches_with_null_pattern() {
    let db = DatabaseManager::open_in_memory().unwrap();
    seed_run(&db, "run-1", RunKind::Identify);
    let path = "OrderViewRS/Response/DataLists/PaxList";
    db.write(|s| {
        s.create_pattern(&pattern("p1", &scope(), path, "sig", 1))?;
        s.create_fact(&Fact::new("f1", "run-1", &scope(), path, "PaxList", 0))?;
        s.create_match(&PatternMatch {
            id: "m1".into(),
            run_id: "run-1".into(),
            fact_id: "f1".into(),
            pattern_id: Some("p1".into()),
            confidence: 0.97,
            verdict: Verdict::ExactMatch,
            created_at: Utc::now(),
        })
    })
    .unwrap();
    assert_eq!(db.read(|s| s.count_matches_for_pattern("p1")).unwrap(), 1);

    let deleted = db.write(|s| s.delete_patterns(&["p1".to_string()])).unwrap();
    assert_eq!(deleted, 1);

    let matches = db.read(|s| s.list_matches_by_run("run-1")).unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].pattern_id, None);
    assert_eq!(matches[0].verdict, Verdict::ExactMatch);
}

#[test]
fn batch_matches_list_in_insertion_order() {
    let db = DatabaseManager::open_in_memory().unwrap();
    seed_run(&db, "run-1", RunKind::Identify);
    let path = "OrderViewRS/Response/DataLists/PaxList";
    let facts: Vec<Fact> = (0..3)
        .map(|i| Fact::new(format!("f{i}"), "run-1", &scope(), path, "PaxList", i))
        .collect();
    let verdicts = [Verdict::NewPattern, Verdict::LowMatch, Verdict::NoMatch];
    let matches: Vec<PatternMatch> = facts
        .iter()
        .zip(verdicts)
        .rev()
        .map(|(f, verdict)| PatternMatch {
            id: format!("m-{}", f.id),
            run_id: "run-1".into(),
            fact_id: f.id.clone(),
            pattern_id: None,
            confidence: 0.0,
            verdict,
            created_at: Utc::now(),
        })
        .collect();

    let written = db
        .write(|s| {
            s.create_facts(&facts)?;
            s.create_matches(&matches)
        })
        .unwrap();
    assert_eq!(written, 3);

    let listed = db.read(|s| s.list_matches_by_run("run-1")).unwrap();
    let ids: Vec<&str> = listed.iter().map(|m| m.fact_id.as_str()).collect();
    assert_eq!(ids, vec!["f2", "f1", "f0"]);
    assert_eq!(listed[0].verdict, Verdict::NoMatch);
}

#[test]
fn failed_unit_of_work_rolls_back() {
    let db = DatabaseManager::open_in_memory().unwrap();
    let path = "OrderViewRS/Response/DataLists/PaxList";
    let result: Result<(), StorageError> = db.write(|s| {
        s.create_pattern(&pattern("p1", &scope(), path, "sig", 1))?;
        Err(StorageError::DbBusy {
            message: "forced".into(),
        })
    });
    assert!(result.is_err());
    assert!(db.read(|s| s.get_pattern("p1")).unwrap().is_none());
}

#[test]
fn run_lifecycle_and_failures() {
    let db = DatabaseManager::open_in_memory().unwrap();
    seed_run(&db, "run-1", RunKind::Extract);

    let loaded = db.read(|s| s.get_run("run-1")).unwrap().unwrap();
    assert_eq!(loaded.status, RunStatus::Running);
    assert_eq!(loaded.kind, RunKind::Extract);
    assert!(loaded.completed_at.is_none());

    db.write(|s| {
        s.record_failure(&RunFailure {
            run_id: "run-1".into(),
            kind: "oversize".into(),
            section_path: "OrderViewRS/Response/DataLists/PaxList".into(),
            detail: "too big".into(),
            created_at: Utc::now(),
        })?;
        let counters = RunCounters {
            fragments: 3,
            facts: 2,
            failures: 1,
            ..RunCounters::default()
        };
        s.finish_run("run-1", RunStatus::Completed, &counters, None)
    })
    .unwrap();

    let finished = db.read(|s| s.get_run("run-1")).unwrap().unwrap();
    assert_eq!(finished.status, RunStatus::Completed);
    assert_eq!(finished.counters.facts, 2);
    assert_eq!(finished.counters.failures, 1);
    assert!(finished.completed_at.is_some());

    let failures = db.read(|s| s.list_failures("run-1")).unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].kind, "oversize");

    let err = db
        .write(|s| s.finish_run("nope", RunStatus::Failed, &RunCounters::default(), Some("x")))
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound { entity: "run", .. }));
}
