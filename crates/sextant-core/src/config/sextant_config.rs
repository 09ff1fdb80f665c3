//! Top-level Sextant configuration with layered resolution.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{ExtractionConfig, MatchingConfig, PipelineConfig, PrivacyConfig, SynthesisConfig};
use crate::errors::ConfigError;

/// Project config file name, looked up in the project root.
pub const PROJECT_CONFIG_FILE: &str = "sextant.toml";

/// Top-level configuration aggregating all sub-configs.
///
/// Resolution order (highest priority first):
/// 1. Environment variables (`SEXTANT_*`)
/// 2. Project config (`sextant.toml` in project root)
/// 3. User config (`~/.sextant/config.toml`)
/// 4. Compiled defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SextantConfig {
    pub extraction: ExtractionConfig,
    pub matching: MatchingConfig,
    pub synthesis: SynthesisConfig,
    pub privacy: PrivacyConfig,
    pub pipeline: PipelineConfig,
}

impl SextantConfig {
    /// Load configuration with layered resolution rooted at `root`.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(user_config_path) = Self::user_config_path() {
            if user_config_path.exists() {
                match Self::merge_toml_file(&mut config, &user_config_path) {
                    Ok(()) => {}
                    Err(e @ ConfigError::ParseError { .. }) => return Err(e),
                    Err(e) => {
                        tracing::warn!(error = %e, "ignoring unreadable user config");
                    }
                }
            }
        }

        let project_config_path = root.join(PROJECT_CONFIG_FILE);
        if project_config_path.exists() {
            Self::merge_toml_file(&mut config, &project_config_path)?;
        }

        Self::apply_env_overrides(&mut config)?;
        Self::validate(&config)?;

        Ok(config)
    }

    /// Load configuration from a TOML string (for testing).
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate the configuration values.
    pub fn validate(config: &SextantConfig) -> Result<(), ConfigError> {
        let m = &config.matching;
        let thresholds = [
            ("matching.exact_threshold", m.effective_exact_threshold()),
            ("matching.high_threshold", m.effective_high_threshold()),
            ("matching.partial_threshold", m.effective_partial_threshold()),
            ("matching.low_floor", m.effective_low_floor()),
        ];
        for (field, value) in thresholds {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ValidationFailed {
                    field: field.to_string(),
                    message: "must be between 0.0 and 1.0".to_string(),
                });
            }
        }
        for pair in thresholds.windows(2) {
            if pair[0].1 <= pair[1].1 {
                return Err(ConfigError::ValidationFailed {
                    field: pair[1].0.to_string(),
                    message: format!("must be lower than {}", pair[0].0),
                });
            }
        }
        if m.effective_candidate_top_k() == 0 {
            return Err(ConfigError::ValidationFailed {
                field: "matching.candidate_top_k".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if m.effective_relationship_penalty() < 0.0 || m.effective_max_relationship_penalty() < 0.0
        {
            return Err(ConfigError::ValidationFailed {
                field: "matching.relationship_penalty".to_string(),
                message: "penalties must not be negative".to_string(),
            });
        }
        if config.extraction.effective_max_fragment_bytes() == 0 {
            return Err(ConfigError::ValidationFailed {
                field: "extraction.max_fragment_bytes".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if config.extraction.effective_batch_size() == 0 {
            return Err(ConfigError::ValidationFailed {
                field: "extraction.batch_size".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if config.synthesis.effective_max_examples() == 0 {
            return Err(ConfigError::ValidationFailed {
                field: "synthesis.max_examples".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&config.privacy.effective_min_confidence()) {
            return Err(ConfigError::ValidationFailed {
                field: "privacy.min_confidence".to_string(),
                message: "must be between 0.0 and 1.0".to_string(),
            });
        }
        if config.pipeline.effective_workers() == 0 {
            return Err(ConfigError::ValidationFailed {
                field: "pipeline.workers".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }

    /// Returns the user config path: `~/.sextant/config.toml`.
    fn user_config_path() -> Option<PathBuf> {
        home_dir().map(|h| h.join(".sextant").join("config.toml"))
    }

    /// Merge a TOML file into the existing config.
    /// Unknown keys are silently ignored (forward-compatible).
    fn merge_toml_file(config: &mut SextantConfig, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        let file_config: SextantConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        Self::merge(config, &file_config);
        Ok(())
    }

    /// Merge `other` into `base`, where `other` values override `base` values
    /// only when `other` has a value.
    fn merge(base: &mut SextantConfig, other: &SextantConfig) {
        // Extraction
        if other.extraction.max_fragment_bytes.is_some() {
            base.extraction.max_fragment_bytes = other.extraction.max_fragment_bytes;
        }
        if !other.extraction.root_prefixes.is_empty() {
            base.extraction.root_prefixes = other.extraction.root_prefixes.clone();
        }
        if other.extraction.max_snippet_length.is_some() {
            base.extraction.max_snippet_length = other.extraction.max_snippet_length;
        }
        if other.extraction.batch_size.is_some() {
            base.extraction.batch_size = other.extraction.batch_size;
        }

        // Matching
        if other.matching.exact_threshold.is_some() {
            base.matching.exact_threshold = other.matching.exact_threshold;
        }
        if other.matching.high_threshold.is_some() {
            base.matching.high_threshold = other.matching.high_threshold;
        }
        if other.matching.partial_threshold.is_some() {
            base.matching.partial_threshold = other.matching.partial_threshold;
        }
        if other.matching.low_floor.is_some() {
            base.matching.low_floor = other.matching.low_floor;
        }
        if other.matching.candidate_top_k.is_some() {
            base.matching.candidate_top_k = other.matching.candidate_top_k;
        }
        if other.matching.relationship_penalty.is_some() {
            base.matching.relationship_penalty = other.matching.relationship_penalty;
        }
        if other.matching.max_relationship_penalty.is_some() {
            base.matching.max_relationship_penalty = other.matching.max_relationship_penalty;
        }

        // Synthesis
        if other.synthesis.max_examples.is_some() {
            base.synthesis.max_examples = other.synthesis.max_examples;
        }

        // Privacy
        if other.privacy.enabled.is_some() {
            base.privacy.enabled = other.privacy.enabled;
        }
        if other.privacy.min_confidence.is_some() {
            base.privacy.min_confidence = other.privacy.min_confidence;
        }
        if !other.privacy.enabled_detectors.is_empty() {
            base.privacy.enabled_detectors = other.privacy.enabled_detectors.clone();
        }
        if !other.privacy.disabled_detectors.is_empty() {
            base.privacy.disabled_detectors = other.privacy.disabled_detectors.clone();
        }
        if !other.privacy.category_confidence.is_empty() {
            base.privacy.category_confidence = other.privacy.category_confidence.clone();
        }

        // Pipeline
        if other.pipeline.workers.is_some() {
            base.pipeline.workers = other.pipeline.workers;
        }
        if other.pipeline.run_timeout_secs.is_some() {
            base.pipeline.run_timeout_secs = other.pipeline.run_timeout_secs;
        }
    }

    /// Apply `SEXTANT_<SECTION>_<FIELD>` overrides. A set but unparseable
    /// variable is an error rather than a silent fallback.
    fn apply_env_overrides(config: &mut SextantConfig) -> Result<(), ConfigError> {
        let e = &mut config.extraction;
        env_override("SEXTANT_EXTRACTION_MAX_FRAGMENT_BYTES", &mut e.max_fragment_bytes)?;
        env_override("SEXTANT_EXTRACTION_BATCH_SIZE", &mut e.batch_size)?;
        env_override("SEXTANT_EXTRACTION_MAX_SNIPPET_LENGTH", &mut e.max_snippet_length)?;

        let m = &mut config.matching;
        env_override("SEXTANT_MATCHING_CANDIDATE_TOP_K", &mut m.candidate_top_k)?;
        env_override("SEXTANT_MATCHING_LOW_FLOOR", &mut m.low_floor)?;

        env_override("SEXTANT_PRIVACY_ENABLED", &mut config.privacy.enabled)?;

        let p = &mut config.pipeline;
        env_override("SEXTANT_PIPELINE_WORKERS", &mut p.workers)?;
        env_override("SEXTANT_PIPELINE_RUN_TIMEOUT_SECS", &mut p.run_timeout_secs)?;
        Ok(())
    }

    /// Serialize the config back to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            path: "<serialization>".to_string(),
            message: e.to_string(),
        })
    }
}

fn env_override<T: std::str::FromStr>(var: &str, slot: &mut Option<T>) -> Result<(), ConfigError> {
    let Ok(raw) = std::env::var(var) else {
        return Ok(());
    };
    let parsed = raw.trim().parse::<T>().map_err(|_| ConfigError::InvalidEnvValue {
        var: var.to_string(),
        value: raw.clone(),
        expected: std::any::type_name::<T>(),
    })?;
    *slot = Some(parsed);
    Ok(())
}

/// Cross-platform home directory resolution.
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}
