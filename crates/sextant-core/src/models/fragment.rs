use serde::{Deserialize, Serialize};

/// A captured subtree handed to fact extractors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentDescriptor {
    /// Local name of the captured root element.
    pub root_element: String,
    /// Re-serialized markup of the whole subtree.
    pub markup: String,
    pub byte_size: usize,
    /// Normalized path of the root element.
    pub path: String,
    /// Element count below the root (the root itself excluded).
    pub descendant_count: usize,
    pub ordinal: u32,
    /// xxh3 digest of `markup`.
    pub content_hash: u64,
}
