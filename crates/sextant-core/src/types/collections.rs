//! Collection aliases used across the workspace.

pub use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

/// Path segments; NDC section paths rarely exceed eight levels.
pub type SegmentVec<T> = SmallVec<[T; 8]>;
