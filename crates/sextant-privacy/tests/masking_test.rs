//! Masking engine behaviour across text, payloads, XML and facts.

use std::collections::HashMap;

use serde_json::json;
use sextant_core::config::PrivacyConfig;
use sextant_core::models::{ChildFact, Fact};
use sextant_core::Scope;
use sextant_privacy::{Detector, PIIMaskingEngine};

fn engine() -> PIIMaskingEngine {
    PIIMaskingEngine::new(&PrivacyConfig::default())
}

#[test]
fn test_mixed_categories_in_one_string() {
    let out = engine().mask_text("Card 4111 1111 1111 1111, mail jo@air.example, tel +447700900123");
    assert_eq!(out.text, "Card [PAYMENT_CARD], mail [EMAIL], tel [PHONE]");
    let categories: Vec<_> = out.detections.iter().map(|d| d.category.as_str()).collect();
    assert_eq!(categories, vec!["financial", "contact", "contact"]);
}

#[test]
fn test_detections_report_original_offsets() {
    let text = "x jo@air.example y jo@air.example";
    let out = engine().mask_text(text);
    for d in &out.detections {
        assert_eq!(&text[d.start..d.end], "jo@air.example");
    }
}

#[test]
fn test_disabled_detector_is_skipped() {
    let config = PrivacyConfig {
        disabled_detectors: vec!["email".into()],
        ..PrivacyConfig::default()
    };
    let engine = PIIMaskingEngine::new(&config);
    assert!(!engine.active_detectors().any(|n| n == "email"));
    let out = engine.mask_text("jo@air.example");
    assert!(!out.masking_applied);
}

#[test]
fn test_category_confidence_below_floor_disables() {
    let mut category_confidence = HashMap::new();
    category_confidence.insert("travel_document".to_string(), 0.2);
    let config = PrivacyConfig {
        category_confidence,
        ..PrivacyConfig::default()
    };
    let engine = PIIMaskingEngine::new(&config);
    assert!(!engine.active_detectors().any(|n| n == "passport"));
    assert!(!engine.mask_text("doc X1234567").masking_applied);
    assert!(PIIMaskingEngine::new(&PrivacyConfig::default())
        .mask_text("doc X1234567")
        .masking_applied);
}

#[test]
fn test_bad_regex_degrades_instead_of_failing() {
    let catalog = vec![
        Detector::new("broken", "custom", "(unclosed", "[X]", 0.9),
        Detector::new("email", "contact", r"[a-z]+@[a-z]+\.[a-z]{2,}", "[EMAIL]", 0.9),
    ];
    let engine = PIIMaskingEngine::with_catalog(catalog, &PrivacyConfig::default());
    assert!(engine.degradation().has_failures());
    assert_eq!(engine.degradation().events()[0].detector, "broken");

    let out = engine.mask_text("write to jo@air.example");
    assert_eq!(out.text, "write to [EMAIL]");
    assert_eq!(out.failures.len(), 1);
}

#[test]
fn test_xml_masking_keeps_names_and_structure() {
    let markup = r#"<ns:Pax xmlns:ns="urn:iata"><ns:Individual><ns:Surname>DOE</ns:Surname></ns:Individual><ns:ContactInfo><ns:EmailAddress><ns:EmailAddressText>jane.doe@mail.example</ns:EmailAddressText></ns:EmailAddress></ns:ContactInfo><ns:IdentityDoc IdentityDocID="P12345678"/></ns:Pax>"#;
    let out = engine().mask_xml(markup);
    assert!(out.masking_applied);
    assert!(!out.fallback);
    assert!(out.text.contains("<ns:EmailAddressText>[EMAIL]</ns:EmailAddressText>"));
    assert!(out.text.contains(r#"<ns:IdentityDoc IdentityDocID="[PASSPORT]"/>"#));
    assert!(out.text.contains(r#"<ns:Pax xmlns:ns="urn:iata">"#));
    assert!(out.text.contains("<ns:Surname>DOE</ns:Surname>"));
}

#[test]
fn test_xml_without_pii_is_byte_identical() {
    let markup = "<Pax>\n  <PaxID>PAX1</PaxID>\n  <PTC>ADT</PTC>\n</Pax>";
    let out = engine().mask_xml(markup);
    assert!(!out.masking_applied);
    assert_eq!(out.text, markup);
}

#[test]
fn test_cdata_masked() {
    let out = engine().mask_xml("<Remark><![CDATA[call +15551234567 now]]></Remark>");
    assert_eq!(out.text, "<Remark><![CDATA[call [PHONE] now]]></Remark>");
}

#[test]
fn test_mask_fact_sets_masked_flag() {
    let scope = Scope::new("21.3", "OrderViewRS").with_airline("XX");
    let mut fact = Fact::new("f1", "r1", &scope, "OrderViewRS/Response/DataLists/ContactInfoList/ContactInfo", "ContactInfo", 0)
        .with_attribute("ContactInfoID", "CI1")
        .with_attribute("EmailAddress", json!({"EmailAddressText": "jane@mail.example"}))
        .with_child(ChildFact::new("Phone").with_attribute("PhoneNumber", "+15551234567"));
    fact.snippet = Some("<ContactInfo><EmailAddressText>jane@mail.example</EmailAddressText>".into());

    let report = engine().mask_fact(&mut fact);
    assert!(report.changed);
    assert!(fact.masked);
    assert_eq!(report.detections, 3);
    assert!(report.fallback);
    assert_eq!(fact.attributes["ContactInfoID"], json!("CI1"));
    assert_eq!(fact.attributes["EmailAddress"], json!({"EmailAddressText": "[EMAIL]"}));
    assert_eq!(fact.children[0].attributes["PhoneNumber"], json!("[PHONE]"));
    assert!(!fact.snippet.as_deref().unwrap().contains("jane@"));
}

#[test]
fn test_clean_fact_not_flagged() {
    let scope = Scope::new("21.3", "AirShoppingRS");
    let mut fact = Fact::new("f1", "r1", &scope, "AirShoppingRS/Response/DataLists/PaxList/Pax", "Pax", 0)
        .with_attribute("PaxID", "PAX1")
        .with_attribute("PTC", "ADT");
    let report = engine().mask_fact(&mut fact);
    assert!(!report.changed);
    assert!(!fact.masked);
}

#[test]
fn test_disabled_engine_leaves_fact_alone() {
    let config = PrivacyConfig {
        enabled: Some(false),
        ..PrivacyConfig::default()
    };
    let scope = Scope::new("21.3", "OrderViewRS");
    let mut fact = Fact::new("f1", "r1", &scope, "OrderViewRS/Response", "Response", 0)
        .with_attribute("Email", "jane@mail.example");
    let report = PIIMaskingEngine::new(&config).mask_fact(&mut fact);
    assert!(!report.changed);
    assert_eq!(fact.attributes["Email"], json!("jane@mail.example"));
}
