pub mod collections;

pub use collections::{FxHashMap, FxHashSet, SegmentVec};
