//! Pipeline: shared collaborators for every run kind.

use std::sync::Arc;

use sextant_core::events::EventDispatcher;
use sextant_core::traits::FactExtractor;
use sextant_core::{PathNormalizer, SextantConfig};
use sextant_extract::RuleBasedFactExtractor;
use sextant_patterns::{ConflictDetector, MatchEngine, PatternSynthesizer};
use sextant_privacy::PIIMaskingEngine;
use sextant_storage::{DatabaseManager, ScopeLocks};

/// Entry point for extraction, identify and learn runs. Pipelines sharing
/// one [`ScopeLocks`] coordinate identify and learn runs on the same scope.
pub struct Pipeline {
    pub(crate) db: Arc<DatabaseManager>,
    pub(crate) config: SextantConfig,
    pub(crate) events: EventDispatcher,
    pub(crate) locks: ScopeLocks,
    pub(crate) fact_extractor: Arc<dyn FactExtractor>,
    pub(crate) masking: PIIMaskingEngine,
    pub(crate) normalizer: PathNormalizer,
}

impl Pipeline {
    /// A pipeline using the rule-based fact extractor.
    pub fn new(db: Arc<DatabaseManager>, config: SextantConfig) -> Self {
        let extractor = RuleBasedFactExtractor::new(config.extraction.effective_max_snippet_length());
        Self {
            masking: PIIMaskingEngine::new(&config.privacy),
            normalizer: PathNormalizer::from_config(&config.extraction),
            fact_extractor: Arc::new(extractor),
            events: EventDispatcher::default(),
            locks: ScopeLocks::new(),
            db,
            config,
        }
    }

    pub fn with_fact_extractor(mut self, extractor: Arc<dyn FactExtractor>) -> Self {
        self.fact_extractor = extractor;
        self
    }

    pub fn with_events(mut self, events: EventDispatcher) -> Self {
        self.events = events;
        self
    }

    /// Share a lock table with other pipelines over the same database.
    pub fn with_locks(mut self, locks: ScopeLocks) -> Self {
        self.locks = locks;
        self
    }

    pub fn database(&self) -> &DatabaseManager {
        &self.db
    }

    pub fn config(&self) -> &SextantConfig {
        &self.config
    }

    pub fn locks(&self) -> &ScopeLocks {
        &self.locks
    }

    pub(crate) fn match_engine(&self) -> MatchEngine {
        MatchEngine::new(self.normalizer.clone(), &self.config.matching)
    }

    pub(crate) fn synthesizer(&self) -> PatternSynthesizer {
        PatternSynthesizer::new(self.normalizer.clone(), &self.config.synthesis)
            .with_events(self.events.clone())
    }

    pub(crate) fn conflict_detector(&self) -> ConflictDetector {
        ConflictDetector::new(self.normalizer.clone()).with_events(self.events.clone())
    }

    pub(crate) fn timeout_secs(&self) -> u64 {
        self.config.pipeline.effective_run_timeout_secs()
    }
}
