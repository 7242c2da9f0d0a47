//! Cross-document frame finder
//!
//! Finds `<iframe>` elements, or any element matching a CSS selector,
//! across a tree of nested documents: each iframe may host its own
//! document, which may host more iframes.
//!
//! ## Search rules
//!
//! - The starting document is depth 0; `MaxDepth::Limited(n)` allows `n`
//!   iframe boundaries to be crossed.
//! - First-match searches check a whole document before entering any of its
//!   iframes, so a match among a document's own iframes beats deeper ones.
//! - All-match searches return results in pre-order.
//! - An iframe whose document is missing or cross-origin is skipped; it
//!   never aborts the search.
//!
//! ```ignore
//! let mut service = DomService::new();
//! service.parse_cdp_json(&snapshot)?;
//! let finder = FrameFinder::new(service.top_document()?);
//!
//! let editor = finder.find_iframe_by_id("editor", SearchOptions::new());
//! let buttons = finder.find_all_elements("form button", SearchOptions::new().max_depth(2))?;
//! ```

pub mod finder;
pub mod options;
pub mod traverse;

pub use finder::FrameFinder;
pub use options::{FinderConfig, MaxDepth, SearchOptions};
pub use traverse::{all_matches, first_match, nested_document};
