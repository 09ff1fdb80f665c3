//! Masking of structured payloads: string leaves only, keys untouched.

use serde_json::Value;
use sextant_core::models::ValueMap;

use crate::engine::PIIMaskingEngine;

impl PIIMaskingEngine {
    /// Mask every string leaf under `value`. Returns the number of detections.
    pub fn mask_value(&self, value: &mut Value) -> usize {
        let mut detections = 0;
        let mut stack: Vec<&mut Value> = vec![value];
        while let Some(node) = stack.pop() {
            match node {
                Value::String(s) => detections += self.mask_string(s),
                Value::Array(items) => stack.extend(items.iter_mut()),
                Value::Object(map) => stack.extend(map.values_mut()),
                Value::Null | Value::Bool(_) | Value::Number(_) => {}
            }
        }
        detections
    }

    /// Mask every value of a fact field map.
    pub fn mask_map(&self, map: &mut ValueMap) -> usize {
        map.values_mut().map(|v| self.mask_value(v)).sum()
    }

    fn mask_string(&self, s: &mut String) -> usize {
        let outcome = self.mask_text(s);
        if outcome.masking_applied {
            *s = outcome.text;
        }
        outcome.detections.len()
    }
}
