//! XML-aware masking: text, CDATA and attribute values are masked, element
//! and attribute names are copied through unchanged.

use quick_xml::events::{BytesCData, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::engine::{Detection, MaskOutcome, PIIMaskingEngine};

impl PIIMaskingEngine {
    /// Mask markup. Input that does not parse is masked as plain text and
    /// the outcome carries `fallback = true`.
    ///
    /// Each node and attribute value is scanned on its own, so detection
    /// offsets are relative to the unescaped value they were found in. On
    /// fallback they are relative to `markup`.
    pub fn mask_xml(&self, markup: &str) -> MaskOutcome {
        match self.try_mask_xml(markup) {
            Ok((text, detections)) => MaskOutcome {
                masking_applied: !detections.is_empty(),
                text: if detections.is_empty() {
                    markup.to_string()
                } else {
                    text
                },
                detections,
                failures: self.degradation().events().to_vec(),
                fallback: false,
            },
            Err(reason) => {
                tracing::warn!(reason = %reason, "markup not parseable, masking as plain text");
                let mut outcome = self.mask_text(markup);
                outcome.fallback = true;
                outcome
            }
        }
    }

    fn try_mask_xml(&self, markup: &str) -> Result<(String, Vec<Detection>), String> {
        let mut reader = Reader::from_str(markup);
        let mut writer = Writer::new(Vec::with_capacity(markup.len()));
        let mut detections = Vec::new();
        let mut depth: usize = 0;

        loop {
            let event = reader.read_event().map_err(|e| e.to_string())?;
            let written = match event {
                Event::Start(start) => {
                    depth += 1;
                    match self.mask_element(&start, &mut detections)? {
                        Some(masked) => writer.write_event(Event::Start(masked)),
                        None => writer.write_event(Event::Start(start)),
                    }
                }
                Event::Empty(start) => match self.mask_element(&start, &mut detections)? {
                    Some(masked) => writer.write_event(Event::Empty(masked)),
                    None => writer.write_event(Event::Empty(start)),
                },
                Event::End(end) => {
                    depth = depth
                        .checked_sub(1)
                        .ok_or_else(|| "end tag without an open element".to_string())?;
                    writer.write_event(Event::End(end))
                }
                Event::Text(text) => {
                    let raw = text.unescape().map_err(|e| e.to_string())?;
                    let outcome = self.mask_text(&raw);
                    if outcome.masking_applied {
                        detections.extend(outcome.detections);
                        writer.write_event(Event::Text(BytesText::new(&outcome.text)))
                    } else {
                        writer.write_event(Event::Text(text))
                    }
                }
                Event::CData(cdata) => {
                    let raw = std::str::from_utf8(&cdata).map_err(|e| e.to_string())?;
                    let outcome = self.mask_text(raw);
                    if outcome.masking_applied {
                        detections.extend(outcome.detections);
                        writer.write_event(Event::CData(BytesCData::new(outcome.text)))
                    } else {
                        writer.write_event(Event::CData(cdata))
                    }
                }
                Event::Eof => break,
                other => writer.write_event(other),
            };
            written.map_err(|e| e.to_string())?;
        }

        if depth != 0 {
            return Err(format!("{depth} element(s) left open"));
        }
        let text = String::from_utf8(writer.into_inner()).map_err(|e| e.to_string())?;
        Ok((text, detections))
    }

    /// A copy of `start` with masked attribute values, or `None` when no value changed.
    fn mask_element(
        &self,
        start: &BytesStart<'_>,
        detections: &mut Vec<Detection>,
    ) -> Result<Option<BytesStart<'static>>, String> {
        let mut values: Vec<(String, String, bool)> = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| e.to_string())?;
            let key = std::str::from_utf8(attr.key.as_ref())
                .map_err(|e| e.to_string())?
                .to_string();
            let value = attr.unescape_value().map_err(|e| e.to_string())?;
            let outcome = self.mask_text(&value);
            if outcome.masking_applied {
                detections.extend(outcome.detections);
                values.push((key, outcome.text, true));
            } else {
                values.push((key, value.into_owned(), false));
            }
        }
        if !values.iter().any(|(_, _, changed)| *changed) {
            return Ok(None);
        }

        let name = std::str::from_utf8(start.name().as_ref())
            .map_err(|e| e.to_string())?
            .to_string();
        let mut masked = BytesStart::new(name);
        for (key, value, _) in &values {
            masked.push_attribute((key.as_str(), value.as_str()));
        }
        Ok(Some(masked))
    }
}

#[cfg(test)]
mod tests {
    use sextant_core::config::PrivacyConfig;

    use crate::PIIMaskingEngine;

    #[test]
    fn attribute_values_masked_names_kept() {
        let engine = PIIMaskingEngine::new(&PrivacyConfig::default());
        let out = engine.mask_xml(r#"<Contact Email="jane@example.com" Type="home"><Phone>+15551234567</Phone></Contact>"#);
        assert!(out.masking_applied);
        assert!(!out.fallback);
        assert_eq!(
            out.text,
            r#"<Contact Email="[EMAIL]" Type="home"><Phone>[PHONE]</Phone></Contact>"#
        );
    }

    #[test]
    fn detection_offsets_are_local_to_the_value() {
        let engine = PIIMaskingEngine::new(&PrivacyConfig::default());
        let out = engine.mask_xml(
            r#"<Contact Email="jane@example.com"><Note>mail &amp; jane@example.com</Note></Contact>"#,
        );
        assert_eq!(out.detections.len(), 2);
        assert_eq!((out.detections[0].start, out.detections[0].end), (0, 16));
        assert_eq!((out.detections[1].start, out.detections[1].end), (7, 23));
    }

    #[test]
    fn truncated_markup_falls_back() {
        let engine = PIIMaskingEngine::new(&PrivacyConfig::default());
        let out = engine.mask_xml("<Contact><Email>jane@example.com</Email><Pho");
        assert!(out.fallback);
        assert!(out.text.contains("[EMAIL]"));
    }
}
