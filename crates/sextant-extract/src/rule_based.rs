//! Deterministic fact extraction straight from fragment markup.
//!
//! Used when no model-backed extractor is configured. The root element becomes
//! the fact: its attributes and text-only children become attributes,
//! `*RefID`/`*RefIDs` names become references, and each structured child
//! becomes a child fact.

use std::time::Instant;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::Value;
use sextant_core::errors::ExtractorError;
use sextant_core::models::{
    ChildFact, ExtractedFact, ExtractorTelemetry, FactExtraction, FragmentDescriptor, ValueMap,
};
use sextant_core::traits::FactExtractor;

const DEFAULT_SNIPPET_LENGTH: usize = 500;

#[derive(Debug, Clone)]
pub struct RuleBasedFactExtractor {
    max_snippet_length: usize,
}

impl Default for RuleBasedFactExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_SNIPPET_LENGTH)
    }
}

impl RuleBasedFactExtractor {
    pub fn new(max_snippet_length: usize) -> Self {
        Self { max_snippet_length }
    }
}

impl FactExtractor for RuleBasedFactExtractor {
    fn name(&self) -> &str {
        "rule-based"
    }

    fn extract(&self, fragment: &FragmentDescriptor) -> Result<FactExtraction, ExtractorError> {
        let started = Instant::now();
        let tree = ElementTree::parse(&fragment.markup)?;
        let root = tree
            .nodes
            .first()
            .ok_or_else(|| ExtractorError::InvalidFragment("fragment has no element".into()))?;

        let mut fact = ExtractedFact::new(root.name.clone());
        for (key, value) in &root.attributes {
            insert_field(&mut fact.attributes, &mut fact.references, key, value);
        }
        for &child_idx in &root.children {
            let child = &tree.nodes[child_idx];
            if tree.is_leaf(child_idx) {
                insert_field(&mut fact.attributes, &mut fact.references, &child.name, &child.text);
            } else {
                fact.children.push(tree.child_fact(child_idx));
            }
        }
        fact.snippet = Some(fragment.markup.chars().take(self.max_snippet_length).collect());

        Ok(FactExtraction {
            facts: vec![fact],
            telemetry: ExtractorTelemetry {
                latency_ms: started.elapsed().as_millis() as u64,
                input_tokens: None,
                output_tokens: None,
                model: None,
            },
        })
    }
}

fn is_reference_name(name: &str) -> bool {
    name.ends_with("RefID") || name.ends_with("RefIDs")
}

/// Route `key` to references or attributes. Repeated keys collect into a list.
fn insert_field(attributes: &mut ValueMap, references: &mut ValueMap, key: &str, raw: &str) {
    let value = if key.ends_with("RefIDs") {
        Value::Array(
            raw.split_whitespace()
                .map(|id| Value::String(id.to_string()))
                .collect(),
        )
    } else {
        Value::String(raw.trim().to_string())
    };
    let target = if is_reference_name(key) {
        references
    } else {
        attributes
    };
    match target.get_mut(key) {
        Some(Value::Array(items)) if !key.ends_with("RefIDs") => items.push(value),
        Some(existing) => {
            let previous = std::mem::take(existing);
            *existing = Value::Array(vec![previous, value]);
        }
        None => {
            target.insert(key.to_string(), value);
        }
    }
}

#[derive(Debug)]
struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<usize>,
}

/// Flat arena of the fragment's elements; index 0 is the root.
struct ElementTree {
    nodes: Vec<Element>,
}

impl ElementTree {
    fn parse(markup: &str) -> Result<Self, ExtractorError> {
        let mut reader = Reader::from_str(markup);
        reader.config_mut().trim_text(true);
        let mut nodes: Vec<Element> = Vec::new();
        let mut open: Vec<usize> = Vec::new();

        loop {
            let event = reader
                .read_event()
                .map_err(|e| ExtractorError::InvalidFragment(e.to_string()))?;
            match event {
                Event::Start(ref start) => {
                    let idx = push_element(&mut nodes, &open, start)?;
                    open.push(idx);
                }
                Event::Empty(ref start) => {
                    push_element(&mut nodes, &open, start)?;
                }
                Event::End(_) => {
                    open.pop();
                }
                Event::Text(text) => {
                    if let Some(&idx) = open.last() {
                        let text = text
                            .unescape()
                            .map_err(|e| ExtractorError::InvalidFragment(e.to_string()))?;
                        nodes[idx].text.push_str(&text);
                    }
                }
                Event::CData(cdata) => {
                    if let Some(&idx) = open.last() {
                        nodes[idx].text.push_str(&String::from_utf8_lossy(&cdata));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }
        Ok(Self { nodes })
    }

    fn is_leaf(&self, idx: usize) -> bool {
        self.nodes[idx].children.is_empty()
    }

    fn child_fact(&self, idx: usize) -> ChildFact {
        let node = &self.nodes[idx];
        let mut child = ChildFact::new(node.name.clone());
        for (key, value) in &node.attributes {
            insert_field(&mut child.attributes, &mut child.references, key, value);
        }
        for &grandchild in &node.children {
            let g = &self.nodes[grandchild];
            if self.is_leaf(grandchild) {
                insert_field(&mut child.attributes, &mut child.references, &g.name, &g.text);
            } else {
                // Deeper structure is summarized as presence only.
                child
                    .attributes
                    .entry(g.name.clone())
                    .or_insert(Value::Null);
            }
        }
        child
    }
}

fn push_element(
    nodes: &mut Vec<Element>,
    open: &[usize],
    start: &BytesStart<'_>,
) -> Result<usize, ExtractorError> {
    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| ExtractorError::InvalidFragment(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        if key == "xmlns" || attr.key.as_ref().starts_with(b"xmlns:") {
            continue;
        }
        let value = attr
            .unescape_value()
            .map_err(|e| ExtractorError::InvalidFragment(e.to_string()))?
            .into_owned();
        attributes.push((key, value));
    }
    let idx = nodes.len();
    nodes.push(Element {
        name,
        attributes,
        text: String::new(),
        children: Vec::new(),
    });
    if let Some(&parent) = open.last() {
        nodes[parent].children.push(idx);
    }
    Ok(idx)
}
