//! Extraction run: documents to masked, persisted facts.

use std::io::BufRead;

use chrono::Utc;
use sextant_core::errors::{FragmentError, PipelineError, PipelineResult};
use sextant_core::events::types::{FragmentExtractedEvent, FragmentOversizeEvent};
use sextant_core::models::{ExtractedFact, Fact, FragmentDescriptor, RunFailure, RunKind, Scope};
use sextant_core::traits::{CancellationToken, FactRepository, RunRepository};
use sextant_extract::{Emission, StreamingSubtreeExtractor};

use crate::pipeline::Pipeline;
use crate::reports::ExtractionReport;
use crate::runs::RunTracker;

/// Facts and failures waiting for the next batch write.
#[derive(Default)]
struct Pending {
    facts: Vec<Fact>,
    failures: Vec<RunFailure>,
}

impl Pipeline {
    /// Walk `documents` in order, extracting every fragment under
    /// `target_paths`. Fragment-level failures are recorded and skipped; a
    /// malformed document fails the whole run.
    pub fn run_extraction<I, R>(
        &self,
        scope: &Scope,
        target_paths: &[String],
        documents: I,
        cancel: &CancellationToken,
    ) -> Result<PipelineResult<ExtractionReport>, PipelineError>
    where
        I: IntoIterator<Item = R>,
        R: BufRead,
    {
        let mut tracker = RunTracker::begin(
            &self.db,
            &self.events,
            RunKind::Extract,
            scope,
            cancel,
            self.timeout_secs(),
        )?;
        let mut result = PipelineResult::new(ExtractionReport {
            run_id: tracker.run_id.clone(),
            ..ExtractionReport::default()
        });

        match self.extract_documents(scope, target_paths, documents, &mut tracker, &mut result) {
            Ok(()) => {
                let processed = tracker.counters.fragments;
                result.data.counters = tracker.complete(processed)?;
                Ok(result)
            }
            Err(e) => Err(tracker.fail(e)),
        }
    }

    fn extract_documents<I, R>(
        &self,
        scope: &Scope,
        target_paths: &[String],
        documents: I,
        tracker: &mut RunTracker<'_>,
        result: &mut PipelineResult<ExtractionReport>,
    ) -> Result<(), PipelineError>
    where
        I: IntoIterator<Item = R>,
        R: BufRead,
    {
        let config = &self.config.extraction;
        let batch_size = config.effective_batch_size();
        let mut extractor = StreamingSubtreeExtractor::for_paths(
            target_paths.iter().map(String::as_str),
            scope,
            config,
        );
        let mut pending = Pending::default();
        let mut next_fact_ordinal: u32 = 0;
        let token = tracker.token.clone();
        let run_id = tracker.run_id.clone();

        for (index, document) in documents.into_iter().enumerate() {
            let outcome = extractor.extract(document, &token, |emission| {
                match emission {
                    Emission::Fragment(fragment) => {
                        tracker.counters.fragments += 1;
                        self.events.emit_fragment_extracted(&FragmentExtractedEvent {
                            run_id: run_id.clone(),
                            path: fragment.path.clone(),
                            ordinal: fragment.ordinal,
                            byte_size: fragment.byte_size,
                        });
                        self.process_fragment(
                            scope,
                            &run_id,
                            &fragment,
                            &mut next_fact_ordinal,
                            &mut pending,
                            result,
                        );
                    }
                    Emission::Oversize { path, size, limit } => {
                        tracing::warn!(path = %path, size, limit, "oversize fragment skipped");
                        self.events.emit_fragment_oversize(&FragmentOversizeEvent {
                            run_id: run_id.clone(),
                            path: path.clone(),
                            size,
                            limit,
                        });
                        record(&run_id, FragmentError::Oversize { path, size, limit }, &mut pending, result);
                    }
                }
                if pending.facts.len() >= batch_size {
                    self.flush(&mut pending, tracker, result)?;
                }
                Ok::<(), PipelineError>(())
            })?;

            tracing::debug!(
                document = index,
                elements = outcome.elements,
                fragments = outcome.fragments,
                oversize = outcome.oversize,
                duration_ms = outcome.duration_ms,
                "document walked"
            );
            if let Some(interruption) = outcome.interrupted {
                return Err(tracker.interrupted(interruption));
            }
        }

        self.flush(&mut pending, tracker, result)
    }

    /// Extract, mask and queue the facts of one fragment. Extractor and
    /// masking problems are recorded, never raised.
    fn process_fragment(
        &self,
        scope: &Scope,
        run_id: &str,
        fragment: &FragmentDescriptor,
        next_fact_ordinal: &mut u32,
        pending: &mut Pending,
        result: &mut PipelineResult<ExtractionReport>,
    ) {
        let extraction = match self.fact_extractor.extract(fragment) {
            Ok(extraction) => extraction,
            Err(e) => {
                tracing::warn!(
                    path = %fragment.path,
                    extractor = self.fact_extractor.name(),
                    error = %e,
                    "fact extraction failed"
                );
                let error = FragmentError::Extractor {
                    path: fragment.path.clone(),
                    message: e.to_string(),
                };
                record(run_id, error, pending, result);
                return;
            }
        };
        tracing::debug!(
            path = %fragment.path,
            facts = extraction.facts.len(),
            latency_ms = extraction.telemetry.latency_ms,
            "fragment extracted"
        );

        for extracted in extraction.facts {
            let mut fact = self.build_fact(scope, run_id, fragment, extracted, *next_fact_ordinal);
            *next_fact_ordinal += 1;

            // Truncated snippets are expected to fall back; a complete one
            // that does not parse is worth recording.
            let truncated = is_truncated(&fact, fragment);
            let report = self.masking.mask_fact(&mut fact);
            if report.fallback && !truncated {
                let error = FragmentError::Masking {
                    path: fragment.path.clone(),
                    message: "snippet was not well-formed XML; masked as plain text".into(),
                };
                record(run_id, error, pending, result);
            } else if report.fallback {
                tracing::debug!(path = %fragment.path, "truncated snippet masked as plain text");
            }
            pending.facts.push(fact);
        }
    }

    fn build_fact(
        &self,
        scope: &Scope,
        run_id: &str,
        fragment: &FragmentDescriptor,
        extracted: ExtractedFact,
        ordinal: u32,
    ) -> Fact {
        let max_snippet = self.config.extraction.effective_max_snippet_length();
        let snippet = extracted
            .snippet
            .unwrap_or_else(|| fragment.markup.clone())
            .chars()
            .take(max_snippet)
            .collect();
        Fact {
            id: uuid::Uuid::new_v4().to_string(),
            run_id: run_id.to_string(),
            spec_version: scope.spec_version.clone(),
            message_root: scope.message_root.clone(),
            airline_code: scope.airline_code.clone(),
            section_path: self.normalizer.normalize(&fragment.path),
            node_type: extracted.node_type,
            ordinal,
            attributes: extracted.attributes,
            children: extracted.children,
            references: extracted.references,
            confidence: extracted.confidence.clamp(0.0, 1.0),
            snippet: Some(snippet),
            masked: false,
            created_at: Utc::now(),
        }
    }

    /// Persist queued facts and failures in one unit of work.
    fn flush(
        &self,
        pending: &mut Pending,
        tracker: &mut RunTracker<'_>,
        result: &mut PipelineResult<ExtractionReport>,
    ) -> Result<(), PipelineError> {
        if pending.facts.is_empty() && pending.failures.is_empty() {
            return Ok(());
        }
        let started = std::time::Instant::now();
        let written = self.db.write(|s| {
            let written = s.create_facts(&pending.facts)?;
            for failure in &pending.failures {
                s.record_failure(failure)?;
            }
            Ok::<_, PipelineError>(written)
        })?;
        tracker.counters.facts += written as u64;
        tracker.counters.failures += pending.failures.len() as u64;
        result
            .data
            .fact_ids
            .extend(pending.facts.iter().map(|f| f.id.clone()));
        tracing::debug!(
            facts = written,
            failures = pending.failures.len(),
            batch_write_time = started.elapsed().as_millis() as u64,
            "batch written"
        );
        pending.facts.clear();
        pending.failures.clear();
        Ok(())
    }
}

fn is_truncated(fact: &Fact, fragment: &FragmentDescriptor) -> bool {
    fact.snippet
        .as_ref()
        .is_some_and(|snippet| snippet.len() < fragment.markup.len())
}

fn record(
    run_id: &str,
    error: FragmentError,
    pending: &mut Pending,
    result: &mut PipelineResult<ExtractionReport>,
) {
    pending.failures.push(RunFailure {
        run_id: run_id.to_string(),
        kind: error.kind().to_string(),
        section_path: error.path().to_string(),
        detail: error.to_string(),
        created_at: Utc::now(),
    });
    result.add_error(error);
}
