//! Section-path normalization.
//!
//! Paths are `/`-separated element local names. Namespace prefixes are
//! dropped from every segment, and a configured prefix token (`IATA_` by
//! default) is stripped from the root segment only, so `IATA_AirShoppingRS/...`
//! and `AirShoppingRS/...` address the same section.

use crate::config::ExtractionConfig;

#[derive(Debug, Clone)]
pub struct PathNormalizer {
    root_prefixes: Vec<String>,
}

impl Default for PathNormalizer {
    fn default() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }
}

impl PathNormalizer {
    pub fn new(root_prefixes: Vec<String>) -> Self {
        Self { root_prefixes }
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new(config.effective_root_prefixes())
    }

    /// Normalize a full path.
    pub fn normalize(&self, path: &str) -> String {
        let mut out = String::with_capacity(path.len());
        for (i, segment) in segments(path).enumerate() {
            if i == 0 {
                out.push_str(self.normalize_root(local_name(segment)));
            } else {
                out.push('/');
                out.push_str(local_name(segment));
            }
        }
        out
    }

    /// Normalize an element name known to sit at the document root.
    pub fn normalize_root<'a>(&self, name: &'a str) -> &'a str {
        let name = local_name(name);
        self.root_prefixes
            .iter()
            .find_map(|prefix| {
                name.strip_prefix(prefix.as_str())
                    .filter(|rest| !rest.is_empty())
            })
            .unwrap_or(name)
    }

    /// True when `ancestor` is a strict prefix of `descendant`, segment-wise,
    /// after normalizing both.
    pub fn is_strict_ancestor(&self, ancestor: &str, descendant: &str) -> bool {
        let a = self.normalize(ancestor);
        let d = self.normalize(descendant);
        let a: Vec<&str> = segments(&a).collect();
        let d: Vec<&str> = segments(&d).collect();
        a.len() < d.len() && d.starts_with(&a)
    }
}

/// Non-empty segments of `path`.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Strip a namespace prefix: `ns:Pax` becomes `Pax`.
pub fn local_name(name: &str) -> &str {
    match name.rfind(':') {
        Some(idx) => &name[idx + 1..],
        None => name,
    }
}
