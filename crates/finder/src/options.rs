//! Search configuration
//!
//! Two layers:
//! - `FinderConfig`: defaults for a finder, deserializable from any serde format
//! - `SearchOptions`: per-call overrides (`None` = use the finder's default)

use serde::{Deserialize, Serialize};

/// How many iframe boundaries a search may cross.
///
/// Serialized as `null` (unbounded) or an unsigned integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Option<usize>", into = "Option<usize>")]
pub enum MaxDepth {
    #[default]
    Unbounded,
    Limited(usize),
}

impl MaxDepth {
    /// True when a document at `depth` lies beyond the limit.
    ///
    /// The root sits at depth 0, so `Limited(0)` still searches the root.
    pub fn exceeded_by(self, depth: usize) -> bool {
        match self {
            MaxDepth::Unbounded => false,
            MaxDepth::Limited(max) => depth > max,
        }
    }
}

impl From<usize> for MaxDepth {
    fn from(max: usize) -> Self {
        MaxDepth::Limited(max)
    }
}

impl From<Option<usize>> for MaxDepth {
    fn from(max: Option<usize>) -> Self {
        max.map_or(MaxDepth::Unbounded, MaxDepth::Limited)
    }
}

impl From<MaxDepth> for Option<usize> {
    fn from(depth: MaxDepth) -> Self {
        match depth {
            MaxDepth::Unbounded => None,
            MaxDepth::Limited(max) => Some(max),
        }
    }
}

/// Finder-wide defaults
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinderConfig {
    pub max_depth: MaxDepth,
}

/// Per-call options
#[derive(Debug, Clone)]
pub struct SearchOptions<D> {
    /// Where the search starts; the finder's top-level document when `None`
    pub root_document: Option<D>,
    /// Falls back to `FinderConfig::max_depth` when `None`
    pub max_depth: Option<MaxDepth>,
}

impl<D> SearchOptions<D> {
    pub fn new() -> Self {
        Self {
            root_document: None,
            max_depth: None,
        }
    }

    pub fn root_document(mut self, document: D) -> Self {
        self.root_document = Some(document);
        self
    }

    /// Allow at most `max_depth` iframe boundaries to be crossed
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(MaxDepth::Limited(max_depth));
        self
    }

    pub fn unbounded(mut self) -> Self {
        self.max_depth = Some(MaxDepth::Unbounded);
        self
    }
}

// Manual impl: no `D: Default` bound
impl<D> Default for SearchOptions<D> {
    fn default() -> Self {
        Self::new()
    }
}
