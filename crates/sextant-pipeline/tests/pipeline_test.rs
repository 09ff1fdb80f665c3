//! End-to-end runs over an in-memory database.

use std::sync::{Arc, Mutex};

use sextant_core::errors::{ExtractorError, PipelineError};
use sextant_core::events::types::{RunCompletedEvent, RunFailedEvent, RunStartedEvent};
use sextant_core::events::{EventDispatcher, SextantEventHandler};
use sextant_core::models::{
    FactExtraction, FragmentDescriptor, ResolutionStrategy, RunStatus, Scope, Verdict,
};
use sextant_core::traits::{
    Cancellable, CancellationToken, FactExtractor, FactRepository, MatchRepository, PatternQuery,
    PatternRepository, RunRepository,
};
use sextant_core::SextantConfig;
use sextant_pipeline::{LearnRequest, LearnSource, Pipeline};
use sextant_storage::DatabaseManager;

const PAX_PATH: &str = "AirShoppingRS/Response/DataLists/PaxList/Pax";
const LIST_PATH: &str = "AirShoppingRS/Response/DataLists/PaxList";

const DOC: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<IATA_AirShoppingRS xmlns="http://www.iata.org/IATA/2015/00/2019.2/IATA_AirShoppingRS">
  <Response>
    <DataLists>
      <PaxList>
        <Pax><PaxID>PAX1</PaxID><PTC>ADT</PTC></Pax>
        <Pax><PaxID>PAX2</PaxID><PTC>CHD</PTC></Pax>
      </PaxList>
    </DataLists>
  </Response>
</IATA_AirShoppingRS>"#;

fn scope() -> Scope {
    Scope::new("21.3", "AirShoppingRS")
}

fn pipeline_with(config: SextantConfig) -> Pipeline {
    let db = Arc::new(DatabaseManager::open_in_memory().unwrap());
    Pipeline::new(db, config)
}

fn pipeline() -> Pipeline {
    pipeline_with(SextantConfig::default())
}

fn targets(paths: &[&str]) -> Vec<String> {
    paths.iter().map(|p| p.to_string()).collect()
}

fn extract(p: &Pipeline, doc: &str, paths: &[&str]) -> String {
    let result = p
        .run_extraction(&scope(), &targets(paths), [doc.as_bytes()], &CancellationToken::new())
        .unwrap();
    result.data.run_id
}

#[test]
fn extraction_persists_facts_in_document_order() {
    let p = pipeline();
    let result = p
        .run_extraction(&scope(), &targets(&[PAX_PATH]), [DOC.as_bytes()], &CancellationToken::new())
        .unwrap();
    assert!(result.is_clean());
    assert_eq!(result.data.counters.fragments, 2);
    assert_eq!(result.data.counters.facts, 2);

    let facts = p
        .database()
        .read(|s| s.list_facts_by_run(&result.data.run_id))
        .unwrap();
    assert_eq!(facts.len(), 2);
    assert_eq!(facts[0].ordinal, 0);
    assert_eq!(facts[1].ordinal, 1);
    assert_eq!(facts[0].section_path, PAX_PATH);
    assert_eq!(facts[0].node_type, "Pax");
    assert_eq!(facts[0].attributes.get("PaxID"), Some(&serde_json::json!("PAX1")));
    assert_eq!(facts[1].attributes.get("PTC"), Some(&serde_json::json!("CHD")));

    let run = p.database().read(|s| s.get_run(&result.data.run_id)).unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.counters.facts, 2);
}

#[test]
fn ordinals_continue_across_documents() {
    let p = pipeline();
    let result = p
        .run_extraction(
            &scope(),
            &targets(&[PAX_PATH]),
            [DOC.as_bytes(), DOC.as_bytes()],
            &CancellationToken::new(),
        )
        .unwrap();
    let facts = p
        .database()
        .read(|s| s.list_facts_by_run(&result.data.run_id))
        .unwrap();
    let ordinals: Vec<u32> = facts.iter().map(|f| f.ordinal).collect();
    assert_eq!(ordinals, vec![0, 1, 2, 3]);
}

#[test]
fn pii_is_masked_before_persistence() {
    let doc = r#"<AirShoppingRS><Response><DataLists><PaxList>
        <Pax><PaxID>PAX1</PaxID><EmailAddressText>jane.doe@example.com</EmailAddressText></Pax>
    </PaxList></DataLists></Response></AirShoppingRS>"#;
    let p = pipeline();
    let run_id = extract(&p, doc, &[PAX_PATH]);

    let facts = p.database().read(|s| s.list_facts_by_run(&run_id)).unwrap();
    assert_eq!(facts.len(), 1);
    assert!(facts[0].masked);
    assert_eq!(
        facts[0].attributes.get("EmailAddressText"),
        Some(&serde_json::json!("[EMAIL]"))
    );
    let snippet = facts[0].snippet.as_deref().unwrap();
    assert!(!snippet.contains("jane.doe"));
    assert!(snippet.contains("<EmailAddressText>"));
}

#[test]
fn oversize_fragments_are_recorded_and_skipped() {
    let doc = r#"<AirShoppingRS><Response><DataLists><PaxList>
        <Pax><PTC>ADT</PTC></Pax>
        <Pax><PaxID>PAX2</PaxID><PTC>CHD</PTC><Birthdate>2015-04-01</Birthdate></Pax>
    </PaxList></DataLists></Response></AirShoppingRS>"#;
    let mut config = SextantConfig::default();
    config.extraction.max_fragment_bytes = Some(40);
    let p = pipeline_with(config);

    let result = p
        .run_extraction(&scope(), &targets(&[PAX_PATH]), [doc.as_bytes()], &CancellationToken::new())
        .unwrap();
    assert_eq!(result.data.counters.facts, 1);
    assert_eq!(result.data.counters.failures, 1);
    assert_eq!(result.error_count(), 1);
    assert_eq!(result.errors_of_kind("oversize").count(), 1);

    let failures = p
        .database()
        .read(|s| s.list_failures(&result.data.run_id))
        .unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].kind, "oversize");
    assert_eq!(failures[0].section_path, PAX_PATH);
}

#[test]
fn fragment_crossing_the_limit_on_its_closing_tag_is_not_persisted() {
    // Each Pax in DOC is 44 bytes, 38 before `</Pax>`.
    let mut config = SextantConfig::default();
    config.extraction.max_fragment_bytes = Some(40);
    let p = pipeline_with(config);

    let result = p
        .run_extraction(&scope(), &targets(&[PAX_PATH]), [DOC.as_bytes()], &CancellationToken::new())
        .unwrap();
    assert_eq!(result.data.counters.facts, 0);
    assert_eq!(result.errors_of_kind("oversize").count(), 2);
    let facts = p
        .database()
        .read(|s| s.list_facts_by_run(&result.data.run_id))
        .unwrap();
    assert!(facts.is_empty());
}

struct OfflineExtractor;

impl FactExtractor for OfflineExtractor {
    fn name(&self) -> &str {
        "offline"
    }

    fn extract(&self, _fragment: &FragmentDescriptor) -> Result<FactExtraction, ExtractorError> {
        Err(ExtractorError::Unavailable("model endpoint down".into()))
    }
}

#[test]
fn extractor_failures_do_not_fail_the_run() {
    let p = pipeline().with_fact_extractor(Arc::new(OfflineExtractor));
    let result = p
        .run_extraction(&scope(), &targets(&[PAX_PATH]), [DOC.as_bytes()], &CancellationToken::new())
        .unwrap();
    assert_eq!(result.data.counters.facts, 0);
    assert_eq!(result.data.counters.failures, 2);
    assert_eq!(result.errors_of_kind("extractor").count(), 2);

    let failures = p
        .database()
        .read(|s| s.list_failures(&result.data.run_id))
        .unwrap();
    assert!(failures.iter().all(|f| f.kind == "extractor"));
    let run = p.database().read(|s| s.get_run(&result.data.run_id)).unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Completed);
}

#[derive(Default)]
struct Lifecycle {
    started: Mutex<Vec<String>>,
    completed: Mutex<Vec<String>>,
    failed: Mutex<Vec<(String, &'static str)>>,
}

impl SextantEventHandler for Lifecycle {
    fn on_run_started(&self, event: &RunStartedEvent) {
        self.started.lock().unwrap().push(event.run_id.clone());
    }
    fn on_run_completed(&self, event: &RunCompletedEvent) {
        self.completed.lock().unwrap().push(event.run_id.clone());
    }
    fn on_run_failed(&self, event: &RunFailedEvent) {
        self.failed
            .lock()
            .unwrap()
            .push((event.run_id.clone(), event.error_code));
    }
}

fn observed() -> (Pipeline, Arc<Lifecycle>) {
    let lifecycle = Arc::new(Lifecycle::default());
    let mut events = EventDispatcher::new();
    events.register(lifecycle.clone());
    (pipeline().with_events(events), lifecycle)
}

#[test]
fn malformed_document_fails_the_run() {
    let (p, lifecycle) = observed();
    let doc = "<AirShoppingRS><Response><DataLists><PaxList><Pax><PaxID>1</PTC></Pax>";
    let err = p
        .run_extraction(&scope(), &targets(&[PAX_PATH]), [doc.as_bytes()], &CancellationToken::new())
        .unwrap_err();
    assert!(matches!(err, PipelineError::Parse(_)), "got {err:?}");

    let failed = lifecycle.failed.lock().unwrap().clone();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].1, "PARSE_ERROR");
    let run = p.database().read(|s| s.get_run(&failed[0].0)).unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Failed);
    assert!(run.error.is_some());
    assert!(lifecycle.completed.lock().unwrap().is_empty());
}

#[test]
fn cancelled_run_is_marked_failed() {
    let (p, lifecycle) = observed();
    let token = CancellationToken::new();
    token.cancel();
    let err = p
        .run_extraction(&scope(), &targets(&[PAX_PATH]), [DOC.as_bytes()], &token)
        .unwrap_err();
    assert!(matches!(err, PipelineError::Cancelled));
    let failed = lifecycle.failed.lock().unwrap().clone();
    assert_eq!(failed[0].1, "CANCELLED");
}

#[test]
fn identify_then_learn_then_identify_again() {
    let (p, lifecycle) = observed();
    let first_extract = extract(&p, DOC, &[PAX_PATH]);

    let identify = p.run_identify(&first_extract, &CancellationToken::new()).unwrap();
    assert_eq!(identify.data.matches.len(), 2);
    assert!(identify.data.matches.iter().all(|m| m.verdict == Verdict::NewPattern));
    assert_eq!(identify.data.new_pattern_fact_ids.len(), 2);

    let learn = p
        .run_learn(
            &LearnRequest::new(LearnSource::NewPatternsOf(identify.data.run_id.clone())),
            &CancellationToken::new(),
        )
        .unwrap();
    assert_eq!(learn.data.created_pattern_ids.len(), 1);
    assert_eq!(learn.data.counters.patterns, 1);
    assert_eq!(learn.data.counters.facts, 2);

    let pattern = p
        .database()
        .read(|s| s.get_pattern(&learn.data.created_pattern_ids[0]))
        .unwrap()
        .unwrap();
    assert_eq!(pattern.section_path, PAX_PATH);
    assert_eq!(pattern.times_seen, 1);
    assert_eq!(pattern.decision_rule.must_have_attributes, vec!["PTC", "PaxID"]);

    let second_extract = extract(&p, DOC, &[PAX_PATH]);
    let again = p.run_identify(&second_extract, &CancellationToken::new()).unwrap();
    assert!(again.data.matches.iter().all(|m| m.verdict == Verdict::ExactMatch));
    assert!(again
        .data
        .matches
        .iter()
        .all(|m| m.pattern_id.as_deref() == Some(pattern.id.as_str())));
    assert_eq!(again.data.counters.matches, 2);

    let stored = p
        .database()
        .read(|s| s.list_matches_by_run(&again.data.run_id))
        .unwrap();
    assert_eq!(stored.len(), 2);

    // extract, identify, learn, extract, identify
    assert_eq!(lifecycle.started.lock().unwrap().len(), 5);
    assert_eq!(lifecycle.completed.lock().unwrap().len(), 5);
}

#[test]
fn learning_a_parent_with_replace_drops_child_patterns() {
    let p = pipeline();
    let pax_run = extract(&p, DOC, &[PAX_PATH]);
    p.run_learn(
        &LearnRequest::new(LearnSource::FactsOf(pax_run)),
        &CancellationToken::new(),
    )
    .unwrap();
    let before = p
        .database()
        .read(|s| s.list_patterns(&PatternQuery::in_scope(&scope()).section_path(PAX_PATH)))
        .unwrap();
    assert_eq!(before.len(), 1);

    let list_run = extract(&p, DOC, &[LIST_PATH]);
    let learn = p
        .run_learn(
            &LearnRequest::new(LearnSource::FactsOf(list_run))
                .resolve_with(ResolutionStrategy::Replace),
            &CancellationToken::new(),
        )
        .unwrap();
    assert_eq!(learn.data.conflicts.len(), 1);
    assert_eq!(learn.data.resolutions.len(), 1);
    assert_eq!(learn.data.resolutions[0].affected_pattern_ids, vec![before[0].id.clone()]);

    let after = p
        .database()
        .read(|s| s.list_patterns(&PatternQuery::in_scope(&scope()).section_path(PAX_PATH)))
        .unwrap();
    assert!(after.is_empty());
    let parents = p
        .database()
        .read(|s| s.list_patterns(&PatternQuery::in_scope(&scope()).section_path(LIST_PATH)))
        .unwrap();
    assert_eq!(parents.len(), 1);
}

#[test]
fn learning_without_a_strategy_only_reports_conflicts() {
    let p = pipeline();
    let pax_run = extract(&p, DOC, &[PAX_PATH]);
    p.run_learn(&LearnRequest::new(LearnSource::FactsOf(pax_run)), &CancellationToken::new())
        .unwrap();

    let list_run = extract(&p, DOC, &[LIST_PATH]);
    let learn = p
        .run_learn(&LearnRequest::new(LearnSource::FactsOf(list_run)), &CancellationToken::new())
        .unwrap();
    assert_eq!(learn.data.conflicts.len(), 1);
    assert!(learn.data.resolutions.is_empty());

    let all = p
        .database()
        .read(|s| s.list_patterns(&PatternQuery::in_scope(&scope())))
        .unwrap();
    assert_eq!(all.len(), 2);
}

#[test]
fn identify_of_unknown_run_is_not_found() {
    let p = pipeline();
    let err = p.run_identify("missing", &CancellationToken::new()).unwrap_err();
    assert!(matches!(err, PipelineError::Storage(_)));
}
