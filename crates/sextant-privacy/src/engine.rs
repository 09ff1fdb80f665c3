use regex::Regex;
use serde::Serialize;
use sextant_core::config::PrivacyConfig;
use sextant_core::models::Fact;

use crate::degradation::{DegradationEvent, DegradationTracker};
use crate::patterns::{self, Detector};

/// One replaced span. Offsets are byte offsets into the text that was
/// scanned. For `mask_xml` that is the unescaped text node, CDATA section or
/// attribute value holding the match, not the surrounding markup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
    pub category: String,
    pub detector: String,
    pub start: usize,
    pub end: usize,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MaskOutcome {
    pub text: String,
    pub masking_applied: bool,
    /// In document order. Offsets are local to each scanned value, see
    /// [`Detection`].
    pub detections: Vec<Detection>,
    pub failures: Vec<DegradationEvent>,
    /// XML masking could not parse the input and masked it as plain text.
    pub fallback: bool,
}

/// Summary of masking one fact in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FactMaskReport {
    pub changed: bool,
    pub detections: usize,
    pub fallback: bool,
    pub failures: Vec<DegradationEvent>,
}

struct ActiveDetector {
    name: String,
    category: String,
    regex: Regex,
    replacement: String,
    confidence: f64,
}

/// Masks PII in text, JSON payloads, XML markup and whole facts.
///
/// Detectors run in catalog order; overlapping matches are resolved by start
/// offset, then length, then confidence. Replacement tokens never match a
/// detector, so masking is idempotent.
pub struct PIIMaskingEngine {
    enabled: bool,
    detectors: Vec<ActiveDetector>,
    degradation: DegradationTracker,
}

impl PIIMaskingEngine {
    /// Engine over the built-in catalog.
    pub fn new(config: &PrivacyConfig) -> Self {
        Self::with_catalog(patterns::pii::catalog(), config)
    }

    pub fn with_catalog(catalog: Vec<Detector>, config: &PrivacyConfig) -> Self {
        let min_confidence = config.effective_min_confidence();
        let mut degradation = DegradationTracker::new();
        let mut detectors = Vec::with_capacity(catalog.len());

        for detector in catalog {
            let forced_on = config.enabled_detectors.iter().any(|n| *n == detector.name);
            let forced_off = config.disabled_detectors.iter().any(|n| *n == detector.name);
            let active = forced_on || (detector.enabled_by_default && !forced_off);
            if !active {
                continue;
            }
            let confidence = config
                .category_confidence
                .get(&detector.category)
                .copied()
                .unwrap_or(detector.confidence);
            if confidence < min_confidence {
                tracing::debug!(
                    detector = %detector.name,
                    confidence,
                    min_confidence,
                    "detector below confidence floor"
                );
                continue;
            }
            let Some(regex) = detector.regex else {
                degradation.record_failure(&detector.name, &detector.category, "regex compilation failed");
                continue;
            };
            detectors.push(ActiveDetector {
                name: detector.name,
                category: detector.category,
                regex,
                replacement: detector.replacement,
                confidence,
            });
        }

        Self {
            enabled: config.effective_enabled(),
            detectors,
            degradation,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn active_detectors(&self) -> impl Iterator<Item = &str> {
        self.detectors.iter().map(|d| d.name.as_str())
    }

    pub fn degradation(&self) -> &DegradationTracker {
        &self.degradation
    }

    /// Mask plain text.
    pub fn mask_text(&self, text: &str) -> MaskOutcome {
        let raw = patterns::scan(text, self.detectors.iter().map(|d| (&d.regex, d.confidence)));
        let mut masked = text.to_string();
        let mut detections = Vec::with_capacity(raw.len());
        let mut delta: isize = 0;

        for m in &raw {
            let detector = &self.detectors[m.detector];
            let start = (m.start as isize + delta) as usize;
            let end = (m.end as isize + delta) as usize;
            masked.replace_range(start..end, &detector.replacement);
            delta += detector.replacement.len() as isize - (m.end - m.start) as isize;
            detections.push(Detection {
                category: detector.category.clone(),
                detector: detector.name.clone(),
                start: m.start,
                end: m.end,
                confidence: m.confidence,
            });
        }

        MaskOutcome {
            masking_applied: !detections.is_empty(),
            text: masked,
            detections,
            failures: self.degradation.events().to_vec(),
            fallback: false,
        }
    }

    /// Mask every value of a fact in place. Keys and node types are never
    /// touched; the snippet is masked XML-aware.
    pub fn mask_fact(&self, fact: &mut Fact) -> FactMaskReport {
        let mut report = FactMaskReport {
            failures: self.degradation.events().to_vec(),
            ..FactMaskReport::default()
        };
        if !self.enabled {
            return report;
        }

        report.detections += self.mask_map(&mut fact.attributes);
        report.detections += self.mask_map(&mut fact.references);
        for child in &mut fact.children {
            report.detections += self.mask_map(&mut child.attributes);
            report.detections += self.mask_map(&mut child.references);
        }
        if let Some(snippet) = fact.snippet.as_mut() {
            let outcome = self.mask_xml(snippet);
            report.fallback = outcome.fallback;
            if outcome.masking_applied {
                report.detections += outcome.detections.len();
                *snippet = outcome.text;
            }
        }

        report.changed = report.detections > 0;
        if report.changed {
            fact.masked = true;
            tracing::debug!(
                fact_id = %fact.id,
                detections = report.detections,
                "fact masked"
            );
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> PIIMaskingEngine {
        PIIMaskingEngine::new(&PrivacyConfig::default())
    }

    #[test]
    fn clean_text_unchanged() {
        let out = engine().mask_text("Offer OF1 for PAX1 on flight AA100");
        assert!(!out.masking_applied);
        assert_eq!(out.text, "Offer OF1 for PAX1 on flight AA100");
    }

    #[test]
    fn multiple_instances_replaced_without_drift() {
        let out = engine().mask_text("a@b.com then c@d.org and e@f.net");
        assert_eq!(out.text, "[EMAIL] then [EMAIL] and [EMAIL]");
        assert_eq!(out.detections.len(), 3);
        assert_eq!((out.detections[1].start, out.detections[1].end), (13, 20));
    }

    #[test]
    fn bare_nine_digit_needs_opt_in() {
        let text = "ref 123456789";
        assert!(!engine().mask_text(text).masking_applied);

        let config = PrivacyConfig {
            enabled_detectors: vec!["bare_nine_digit".into()],
            min_confidence: Some(0.3),
            ..PrivacyConfig::default()
        };
        let out = PIIMaskingEngine::new(&config).mask_text(text);
        assert_eq!(out.text, "ref [ID_NUMBER]");
    }
}
