//! PathTrie: target section paths keyed segment by segment.
//!
//! Built once per extraction session. Each open element advances one step
//! from its parent's node, so a lookup costs O(1) per element and O(depth)
//! per full path.

use rustc_hash::FxHashMap;
use sextant_core::path::{segments, PathNormalizer};
use sextant_core::Scope;

/// A section the extractor should capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetDescriptor {
    /// Restricts the target to one spec version; `None` applies to all.
    pub spec_version: Option<String>,
    /// Restricts the target to one message root; `None` applies to all.
    pub message_root: Option<String>,
    /// Local name of the element at the end of `path`.
    pub element: String,
    /// Normalized section path.
    pub path: String,
}

impl TargetDescriptor {
    /// A target applicable to every spec version and message root.
    pub fn new(normalizer: &PathNormalizer, path: &str) -> Self {
        let path = normalizer.normalize(path);
        let element = segments(&path).last().unwrap_or_default().to_string();
        Self {
            spec_version: None,
            message_root: None,
            element,
            path,
        }
    }

    pub fn for_scope(mut self, scope: &Scope) -> Self {
        self.spec_version = Some(scope.spec_version.clone());
        self.message_root = Some(scope.message_root.clone());
        self
    }

    pub fn applies_to(&self, scope: &Scope) -> bool {
        self.spec_version
            .as_deref()
            .map_or(true, |v| v == scope.spec_version)
            && self
                .message_root
                .as_deref()
                .map_or(true, |r| r == scope.message_root)
    }
}

pub type TrieNodeId = usize;

#[derive(Debug, Default)]
struct TrieNode {
    children: FxHashMap<String, TrieNodeId>,
    /// Index into `PathTrie::targets` when a target ends here.
    terminal: Option<usize>,
}

/// Arena-backed trie over normalized path segments.
#[derive(Debug)]
pub struct PathTrie {
    nodes: Vec<TrieNode>,
    targets: Vec<TargetDescriptor>,
}

impl PathTrie {
    pub const ROOT: TrieNodeId = 0;

    pub fn new() -> Self {
        Self {
            nodes: vec![TrieNode::default()],
            targets: Vec::new(),
        }
    }

    /// Build a trie from the targets applicable to `scope`.
    pub fn build(targets: impl IntoIterator<Item = TargetDescriptor>, scope: &Scope) -> Self {
        let mut trie = Self::new();
        for target in targets.into_iter().filter(|t| t.applies_to(scope)) {
            trie.insert(target);
        }
        trie
    }

    /// Insert a target. A duplicate path keeps the first descriptor.
    pub fn insert(&mut self, target: TargetDescriptor) {
        let mut node = Self::ROOT;
        for segment in segments(&target.path) {
            node = match self.nodes[node].children.get(segment) {
                Some(&next) => next,
                None => {
                    let next = self.nodes.len();
                    self.nodes.push(TrieNode::default());
                    self.nodes[node].children.insert(segment.to_string(), next);
                    next
                }
            };
        }
        if node == Self::ROOT || self.nodes[node].terminal.is_some() {
            return;
        }
        self.nodes[node].terminal = Some(self.targets.len());
        self.targets.push(target);
    }

    /// Advance one segment from `node`.
    #[inline]
    pub fn step(&self, node: TrieNodeId, segment: &str) -> Option<TrieNodeId> {
        self.nodes.get(node)?.children.get(segment).copied()
    }

    /// The target ending at `node`, if any.
    #[inline]
    pub fn terminal(&self, node: TrieNodeId) -> Option<&TargetDescriptor> {
        self.nodes
            .get(node)?
            .terminal
            .and_then(|idx| self.targets.get(idx))
    }

    /// Walk a full path of already-normalized segments.
    pub fn lookup<'a>(&self, path: impl IntoIterator<Item = &'a str>) -> Option<&TargetDescriptor> {
        let mut node = Self::ROOT;
        for segment in path {
            node = self.step(node, segment)?;
        }
        self.terminal(node)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

impl Default for PathTrie {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(path: &str) -> TargetDescriptor {
        TargetDescriptor::new(&PathNormalizer::default(), path)
    }

    #[test]
    fn lookup_hits_only_terminals() {
        let scope = Scope::new("21.3", "AirShoppingRS");
        let trie = PathTrie::build(
            [
                target("IATA_AirShoppingRS/Response/DataLists/PaxList/Pax"),
                target("AirShoppingRS/Response/OffersGroup/CarrierOffers/Offer"),
            ],
            &scope,
        );
        assert_eq!(trie.len(), 2);
        let hit = trie
            .lookup("AirShoppingRS/Response/DataLists/PaxList/Pax".split('/'))
            .unwrap();
        assert_eq!(hit.element, "Pax");
        assert!(trie.lookup("AirShoppingRS/Response/DataLists".split('/')).is_none());
        assert!(trie.lookup("AirShoppingRS/Response/Nope".split('/')).is_none());
    }

    #[test]
    fn inapplicable_targets_are_skipped() {
        let shopping = Scope::new("21.3", "AirShoppingRS");
        let order = Scope::new("21.3", "OrderViewRS");
        let t = target("OrderViewRS/Response/Order").for_scope(&order);
        let trie = PathTrie::build([t], &shopping);
        assert!(trie.is_empty());
    }

    #[test]
    fn duplicate_paths_keep_one_target() {
        let mut trie = PathTrie::new();
        trie.insert(target("A/B"));
        trie.insert(target("A/B"));
        assert_eq!(trie.len(), 1);
    }
}
