//! Detector catalog and raw scanning.

pub mod pii;

use regex::Regex;

/// One PII detector.
#[derive(Debug, Clone)]
pub struct Detector {
    pub name: String,
    pub category: String,
    /// `None` when the pattern failed to compile.
    pub regex: Option<Regex>,
    pub replacement: String,
    pub confidence: f64,
    pub enabled_by_default: bool,
}

impl Detector {
    /// Compile a detector from a pattern string. A bad pattern yields a
    /// detector with no regex, which the engine records as degraded.
    pub fn new(
        name: &str,
        category: &str,
        pattern: &str,
        replacement: &str,
        confidence: f64,
    ) -> Self {
        Self {
            name: name.to_string(),
            category: category.to_string(),
            regex: Regex::new(pattern).ok(),
            replacement: replacement.to_string(),
            confidence,
            enabled_by_default: true,
        }
    }

    pub fn disabled_by_default(mut self) -> Self {
        self.enabled_by_default = false;
        self
    }
}

/// A match before overlap resolution.
#[derive(Debug, Clone)]
pub struct RawMatch {
    /// Index of the detector in the active list.
    pub detector: usize,
    pub start: usize,
    pub end: usize,
    pub confidence: f64,
}

impl RawMatch {
    fn len(&self) -> usize {
        self.end - self.start
    }
}

/// Collect every match of every detector, sorted by start; ties prefer the
/// longer match, then the higher confidence.
pub fn scan<'a>(text: &str, detectors: impl IntoIterator<Item = (&'a Regex, f64)>) -> Vec<RawMatch> {
    let mut matches = Vec::new();
    for (idx, (regex, confidence)) in detectors.into_iter().enumerate() {
        for m in regex.find_iter(text) {
            if m.start() == m.end() {
                continue;
            }
            matches.push(RawMatch {
                detector: idx,
                start: m.start(),
                end: m.end(),
                confidence,
            });
        }
    }
    matches.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then_with(|| b.len().cmp(&a.len()))
            .then_with(|| b.confidence.total_cmp(&a.confidence))
            .then_with(|| a.detector.cmp(&b.detector))
    });
    drop_overlaps(matches)
}

/// Keep each match that starts at or after the end of the last kept one.
fn drop_overlaps(sorted: Vec<RawMatch>) -> Vec<RawMatch> {
    let mut kept: Vec<RawMatch> = Vec::with_capacity(sorted.len());
    for m in sorted {
        match kept.last() {
            Some(last) if m.start < last.end => {}
            _ => kept.push(m),
        }
    }
    kept
}
