//! StreamingSubtreeExtractor: one pass over a document, capturing target
//! subtrees as re-serialized markup.
//!
//! Memory is bounded by the open-element stack plus a single capture buffer.
//! `quick-xml` does not resynchronize after a reader error, so any malformed
//! input is fatal to the whole document.

use std::io::BufRead;
use std::time::Instant;

use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};
use sextant_core::config::ExtractionConfig;
use sextant_core::errors::{FragmentError, ParseError};
use sextant_core::models::FragmentDescriptor;
use sextant_core::path::PathNormalizer;
use sextant_core::traits::{CancellationToken, Interruption};
use sextant_core::types::SegmentVec;
use sextant_core::Scope;

use crate::hasher::hash_fragment;
use crate::trie::{PathTrie, TargetDescriptor, TrieNodeId};

/// What the walk hands to the caller, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Emission {
    Fragment(FragmentDescriptor),
    /// A capture exceeded the size guard and was abandoned.
    Oversize { path: String, size: u64, limit: u64 },
}

impl Emission {
    pub fn path(&self) -> &str {
        match self {
            Self::Fragment(f) => &f.path,
            Self::Oversize { path, .. } => path,
        }
    }

    /// The fragment-level error recorded for an oversize emission.
    pub fn as_error(&self) -> Option<FragmentError> {
        match self {
            Self::Fragment(_) => None,
            Self::Oversize { path, size, limit } => Some(FragmentError::Oversize {
                path: path.clone(),
                size: *size,
                limit: *limit,
            }),
        }
    }
}

/// Summary of one document walk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkOutcome {
    pub elements: u64,
    pub fragments: u64,
    pub oversize: u64,
    pub duration_ms: u64,
    /// Set when the walk stopped early on cancellation or deadline.
    pub interrupted: Option<Interruption>,
}

struct Frame {
    name: String,
    node: Option<TrieNodeId>,
}

struct Capture {
    /// Stack depth of the captured root's parent.
    depth: usize,
    root_element: String,
    path: String,
    writer: Writer<Vec<u8>>,
    descendants: usize,
    abandoned: bool,
}

impl Capture {
    fn write(&mut self, event: Event<'_>, position: u64) -> Result<(), ParseError> {
        if self.abandoned {
            return Ok(());
        }
        self.writer
            .write_event(event)
            .map_err(|e| ParseError::Malformed {
                position,
                message: format!("re-serializing capture: {e}"),
            })
    }

    fn len(&self) -> usize {
        self.writer.get_ref().len()
    }
}

/// Extraction session over one scope. Ordinals keep increasing across every
/// document walked with the same session.
pub struct StreamingSubtreeExtractor {
    trie: PathTrie,
    normalizer: PathNormalizer,
    max_fragment_bytes: u64,
    next_ordinal: u32,
}

impl StreamingSubtreeExtractor {
    pub fn new(
        targets: impl IntoIterator<Item = TargetDescriptor>,
        scope: &Scope,
        config: &ExtractionConfig,
    ) -> Self {
        Self {
            trie: PathTrie::build(targets, scope),
            normalizer: PathNormalizer::from_config(config),
            max_fragment_bytes: config.effective_max_fragment_bytes(),
            next_ordinal: 0,
        }
    }

    /// Convenience: targets given as raw paths.
    pub fn for_paths<'a>(
        paths: impl IntoIterator<Item = &'a str>,
        scope: &Scope,
        config: &ExtractionConfig,
    ) -> Self {
        let normalizer = PathNormalizer::from_config(config);
        let targets: Vec<_> = paths
            .into_iter()
            .map(|p| TargetDescriptor::new(&normalizer, p))
            .collect();
        Self::new(targets, scope, config)
    }

    pub fn target_count(&self) -> usize {
        self.trie.len()
    }

    /// Walk `reader`, handing every fragment or oversize record to `on_emit`
    /// in document order. Errors from `on_emit` stop the walk and are
    /// returned as-is.
    pub fn extract<R, E, F>(
        &mut self,
        reader: R,
        cancel: &CancellationToken,
        mut on_emit: F,
    ) -> Result<WalkOutcome, E>
    where
        R: BufRead,
        E: From<ParseError>,
        F: FnMut(Emission) -> Result<(), E>,
    {
        let started = Instant::now();
        let mut outcome = WalkOutcome::default();
        let mut xml = Reader::from_reader(reader);
        xml.config_mut().trim_text(false);
        xml.config_mut().check_end_names = true;

        let mut buf = Vec::new();
        let mut stack: SegmentVec<Frame> = SegmentVec::new();
        let mut capture: Option<Capture> = None;

        loop {
            if let Some(interruption) = cancel.interruption() {
                tracing::warn!(?interruption, elements = outcome.elements, "extraction interrupted");
                outcome.interrupted = Some(interruption);
                break;
            }

            let event = match xml.read_event_into(&mut buf) {
                Ok(event) => event,
                Err(e) => {
                    return Err(ParseError::Malformed {
                        position: xml.buffer_position() as u64,
                        message: e.to_string(),
                    }
                    .into())
                }
            };
            let position = xml.buffer_position() as u64;

            match event {
                Event::Start(ref start) => {
                    outcome.elements += 1;
                    let name = self.element_name(start, stack.is_empty(), position)?;
                    let node = self.advance(stack.last(), &name);

                    if let Some(open) = capture.as_mut() {
                        open.descendants += 1;
                        open.write(event.borrow(), position)?;
                        self.guard_size(open, &mut outcome, &mut on_emit)?;
                    } else if let Some(path) = self.terminal_path(node) {
                        let mut open = self.open_capture(stack.len(), &name, path);
                        open.write(event.borrow(), position)?;
                        self.guard_size(&mut open, &mut outcome, &mut on_emit)?;
                        capture = Some(open);
                    }
                    stack.push(Frame { name, node });
                }
                Event::Empty(ref start) => {
                    outcome.elements += 1;
                    let name = self.element_name(start, stack.is_empty(), position)?;
                    let node = self.advance(stack.last(), &name);

                    if let Some(open) = capture.as_mut() {
                        open.descendants += 1;
                        open.write(event.borrow(), position)?;
                        self.guard_size(open, &mut outcome, &mut on_emit)?;
                    } else if let Some(path) = self.terminal_path(node) {
                        let mut open = self.open_capture(stack.len(), &name, path);
                        open.write(event.borrow(), position)?;
                        self.guard_size(&mut open, &mut outcome, &mut on_emit)?;
                        stack.push(Frame { name, node });
                        self.close_capture(open, &stack, position, &mut outcome, &mut on_emit)?;
                        stack.pop();
                    }
                }
                Event::End(_) => {
                    let closes_capture = capture
                        .as_ref()
                        .is_some_and(|open| open.depth + 1 == stack.len());
                    if let Some(open) = capture.as_mut() {
                        open.write(event.borrow(), position)?;
                        self.guard_size(open, &mut outcome, &mut on_emit)?;
                    }
                    if closes_capture {
                        if let Some(open) = capture.take() {
                            self.close_capture(open, &stack, position, &mut outcome, &mut on_emit)?;
                        }
                    }
                    if stack.pop().is_none() {
                        return Err(ParseError::Malformed {
                            position,
                            message: "end tag without an open element".to_string(),
                        }
                        .into());
                    }
                }
                Event::Eof => {
                    if !stack.is_empty() {
                        return Err(ParseError::UnexpectedEof {
                            open_elements: stack.len(),
                        }
                        .into());
                    }
                    break;
                }
                other => {
                    if let Some(open) = capture.as_mut() {
                        open.write(other.borrow(), position)?;
                        self.guard_size(open, &mut outcome, &mut on_emit)?;
                    }
                }
            }
            buf.clear();
        }

        outcome.duration_ms = started.elapsed().as_millis() as u64;
        tracing::debug!(
            fragments = outcome.fragments,
            oversize = outcome.oversize,
            elements = outcome.elements,
            duration_ms = outcome.duration_ms,
            "document walk finished"
        );
        Ok(outcome)
    }

    /// Walk a whole document and collect every emission.
    pub fn extract_all<R: BufRead>(
        &mut self,
        reader: R,
        cancel: &CancellationToken,
    ) -> Result<(Vec<Emission>, WalkOutcome), ParseError> {
        let mut emissions = Vec::new();
        let outcome = self.extract(reader, cancel, |e| {
            emissions.push(e);
            Ok::<(), ParseError>(())
        })?;
        Ok((emissions, outcome))
    }

    fn element_name(
        &self,
        start: &BytesStart<'_>,
        is_root: bool,
        position: u64,
    ) -> Result<String, ParseError> {
        let local = start.local_name();
        let name =
            std::str::from_utf8(local.as_ref()).map_err(|_| ParseError::InvalidName { position })?;
        Ok(if is_root {
            self.normalizer.normalize_root(name).to_string()
        } else {
            name.to_string()
        })
    }

    fn advance(&self, parent: Option<&Frame>, name: &str) -> Option<TrieNodeId> {
        match parent {
            None => self.trie.step(PathTrie::ROOT, name),
            Some(frame) => frame.node.and_then(|n| self.trie.step(n, name)),
        }
    }

    fn terminal_path(&self, node: Option<TrieNodeId>) -> Option<String> {
        node.and_then(|n| self.trie.terminal(n))
            .map(|target| target.path.clone())
    }

    fn open_capture(&self, depth: usize, name: &str, path: String) -> Capture {
        tracing::trace!(path = %path, "capture opened");
        Capture {
            depth,
            root_element: name.to_string(),
            path,
            writer: Writer::new(Vec::new()),
            descendants: 0,
            abandoned: false,
        }
    }

    fn guard_size<E, F>(
        &self,
        open: &mut Capture,
        outcome: &mut WalkOutcome,
        on_emit: &mut F,
    ) -> Result<(), E>
    where
        F: FnMut(Emission) -> Result<(), E>,
    {
        if open.abandoned || open.len() as u64 <= self.max_fragment_bytes {
            return Ok(());
        }
        let size = open.len() as u64;
        open.abandoned = true;
        open.writer = Writer::new(Vec::new());
        outcome.oversize += 1;
        tracing::warn!(
            path = %open.path,
            size,
            limit = self.max_fragment_bytes,
            "fragment over size limit, skipped"
        );
        on_emit(Emission::Oversize {
            path: open.path.clone(),
            size,
            limit: self.max_fragment_bytes,
        })
    }

    /// Emit the finished capture. `stack` still holds the captured root as
    /// its last frame.
    fn close_capture<E, F>(
        &mut self,
        open: Capture,
        stack: &[Frame],
        position: u64,
        outcome: &mut WalkOutcome,
        on_emit: &mut F,
    ) -> Result<(), E>
    where
        E: From<ParseError>,
        F: FnMut(Emission) -> Result<(), E>,
    {
        if open.abandoned {
            return Ok(());
        }
        let confirmed = self
            .trie
            .lookup(stack.iter().map(|f| f.name.as_str()))
            .is_some_and(|target| target.path == open.path);
        if !confirmed {
            tracing::debug!(path = %open.path, "ancestor path not confirmed, capture dropped");
            return Ok(());
        }

        let bytes = open.writer.into_inner();
        let content_hash = hash_fragment(&bytes);
        let byte_size = bytes.len();
        let markup = String::from_utf8(bytes).map_err(|_| ParseError::Malformed {
            position,
            message: format!("fragment at {} is not valid UTF-8", open.path),
        })?;

        let ordinal = self.next_ordinal;
        self.next_ordinal = self.next_ordinal.saturating_add(1);
        outcome.fragments += 1;
        tracing::debug!(path = %open.path, ordinal, byte_size, "fragment captured");

        on_emit(Emission::Fragment(FragmentDescriptor {
            root_element: open.root_element,
            markup,
            byte_size,
            path: open.path,
            descendant_count: open.descendants,
            ordinal,
            content_hash,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(paths: &[&str]) -> StreamingSubtreeExtractor {
        StreamingSubtreeExtractor::for_paths(
            paths.iter().copied(),
            &Scope::new("21.3", "AirShoppingRS"),
            &ExtractionConfig::default(),
        )
    }

    #[test]
    fn self_closing_target_is_captured() {
        let mut ex = session(&["AirShoppingRS/Response/Marker"]);
        let doc = "<AirShoppingRS><Response><Marker Code=\"X\"/></Response></AirShoppingRS>";
        let (emissions, _) = ex
            .extract_all(doc.as_bytes(), &CancellationToken::new())
            .unwrap();
        assert_eq!(emissions.len(), 1);
        match &emissions[0] {
            Emission::Fragment(f) => {
                assert_eq!(f.root_element, "Marker");
                assert_eq!(f.descendant_count, 0);
                assert_eq!(f.markup, "<Marker Code=\"X\"/>");
            }
            other => panic!("unexpected emission {other:?}"),
        }
    }

    #[test]
    fn nested_targets_belong_to_outer_capture() {
        let mut ex = session(&["AirShoppingRS/Response/DataLists", "AirShoppingRS/Response/DataLists/PaxList"]);
        let doc = "<AirShoppingRS><Response><DataLists><PaxList><Pax/></PaxList></DataLists></Response></AirShoppingRS>";
        let (emissions, outcome) = ex
            .extract_all(doc.as_bytes(), &CancellationToken::new())
            .unwrap();
        assert_eq!(outcome.fragments, 1);
        assert_eq!(emissions[0].path(), "AirShoppingRS/Response/DataLists");
    }

    #[test]
    fn unterminated_document_fails() {
        let mut ex = session(&["AirShoppingRS/Response"]);
        let err = ex
            .extract_all("<AirShoppingRS><Response>".as_bytes(), &CancellationToken::new())
            .unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedEof { open_elements: 2 }));
    }
}
