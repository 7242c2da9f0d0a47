//! DOM snapshot host
//!
//! Arena-backed DOM snapshots built from CDP, nested frame documents
//! included, exposed through the read-only `Document` / `Element` traits
//! that cross-document searches run on.
//!
//! ## Core Design
//!
//! ```text
//! CDP JSON → DomService → DomArena (owned, all frames)
//!                             ↓
//!              DocumentRef / ElementRef (borrowed handles)
//!                             ↓
//!                 Document / Element traits
//! ```
//!
//! Nested documents are only reachable through `Element::content_document`,
//! which enforces the same-origin policy against the top-level document.

pub mod arena;
pub mod error;
pub mod host;
pub mod selector;
pub mod service;
pub mod types;

pub use arena::DomArena;
pub use error::{DomError, Result};
pub use host::{Document, DocumentRef, Element, ElementRef};
pub use selector::Selector;
pub use service::DomService;
pub use types::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_service_has_no_document() {
        let service = DomService::new();
        assert!(service.arena().is_empty());
        assert!(matches!(service.top_document(), Err(DomError::CdpError(_))));
    }
}
