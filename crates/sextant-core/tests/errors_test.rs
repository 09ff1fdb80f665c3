//! Error taxonomy: codes and conversions.

use sextant_core::errors::{
    ConfigError, FragmentError, ParseError, PipelineError, PipelineResult, SextantErrorCode,
    StorageError, SynthesisError,
};

#[test]
fn test_error_codes_are_stable() {
    let parse = ParseError::Malformed {
        position: 42,
        message: "mismatched end tag".into(),
    };
    assert_eq!(parse.error_code(), "PARSE_ERROR");

    let oversize = FragmentError::Oversize {
        path: "AirShoppingRS/Response/Offer".into(),
        size: 2048,
        limit: 1024,
    };
    assert_eq!(oversize.error_code(), "OVERSIZE_FRAGMENT");
    assert_eq!(oversize.kind(), "oversize");
    assert_eq!(oversize.path(), "AirShoppingRS/Response/Offer");

    let unique = StorageError::UniqueViolation {
        constraint: "idx_patterns_signature".into(),
    };
    assert!(unique.is_unique_violation());
    assert_eq!(unique.error_code(), "UNIQUE_VIOLATION");
}

#[test]
fn test_coded_string_prefixes_code() {
    let err = ConfigError::ValidationFailed {
        field: "matching.low_floor".into(),
        message: "must be between 0.0 and 1.0".into(),
    };
    let coded = err.coded_string();
    assert!(coded.starts_with("[CONFIG_ERROR] "));
    assert!(coded.contains("matching.low_floor"));
}

#[test]
fn test_pipeline_error_keeps_inner_code() {
    let storage = StorageError::DbBusy {
        message: "locked".into(),
    };
    let synthesis: SynthesisError = storage.into();
    let pipeline: PipelineError = synthesis.into();
    assert_eq!(pipeline.error_code(), "DB_BUSY");

    let pipeline: PipelineError = ParseError::UnexpectedEof { open_elements: 2 }.into();
    assert_eq!(pipeline.error_code(), "PARSE_ERROR");
    assert_eq!(PipelineError::Timeout { timeout_secs: 5 }.error_code(), "TIMEOUT");
}

#[test]
fn test_pipeline_result_collects_fragment_errors() {
    let mut result: PipelineResult<usize> = PipelineResult::new(3);
    assert!(result.is_clean());
    result.add_error(FragmentError::Extractor {
        path: "OrderViewRS/Response/Order".into(),
        message: "payload missing node_type".into(),
    });
    assert!(!result.is_clean());
    assert_eq!(result.error_count(), 1);
    assert_eq!(result.data, 3);
}
