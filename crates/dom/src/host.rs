//! Host traits: the read-only DOM primitives a cross-document search needs
//!
//! ```text
//! Document ──iframes()──────────────▶ [Element]
//!          ──query_selector[_all]()─▶ [Element]
//! Element  ──content_document()─────▶ Ok(Some(Document)) | Ok(None) | Err(access)
//! ```
//!
//! The arena snapshot implements them through `DocumentRef` / `ElementRef`,
//! cheap `Copy` handles borrowing a `DomArena`. Any other host (a live
//! browser binding, a test double) only has to implement the two traits.

use crate::arena::DomArena;
use crate::error::{DomError, Result};
use crate::selector::Selector;
use crate::types::{DomNode, NodeId};
use std::fmt;

/// One document of the host's document tree
pub trait Document: Clone {
    type Element: Element<Document = Self>;

    /// `<iframe>` elements of this document, in document order.
    /// Iframes inside nested documents are not included.
    fn iframes(&self) -> Vec<Self::Element>;

    /// First element of this document matching `selector`
    fn query_selector(&self, selector: &Selector) -> Option<Self::Element> {
        self.query_selector_all(selector).into_iter().next()
    }

    /// Every element of this document matching `selector`, in document order
    fn query_selector_all(&self, selector: &Selector) -> Vec<Self::Element>;
}

/// One element of a document
pub trait Element: Clone {
    type Document;

    fn tag_name(&self) -> &str;

    fn attribute(&self, name: &str) -> Option<&str>;

    fn id(&self) -> Option<&str> {
        self.attribute("id")
    }

    fn name(&self) -> Option<&str> {
        self.attribute("name")
    }

    /// The document hosted by this element.
    ///
    /// `Ok(None)` when there is none (not an iframe, nothing loaded yet);
    /// `Err` when the host refuses access, typically `CrossOriginAccess`.
    fn content_document(&self) -> Result<Option<Self::Document>>;
}

/// Handle to a document node inside an arena
#[derive(Clone, Copy)]
pub struct DocumentRef<'a> {
    arena: &'a DomArena,
    node_id: NodeId,
    node: &'a DomNode,
}

/// Handle to an element node inside an arena
#[derive(Clone, Copy)]
pub struct ElementRef<'a> {
    arena: &'a DomArena,
    node_id: NodeId,
    node: &'a DomNode,
}

impl<'a> DocumentRef<'a> {
    pub fn new(arena: &'a DomArena, node_id: NodeId) -> Result<Self> {
        let node = arena.get(node_id)?;
        if !node.is_document() {
            return Err(DomError::InvalidNodeType {
                expected: "Document".to_string(),
                actual: format!("{:?}", node.node_type),
            });
        }
        Ok(Self {
            arena,
            node_id,
            node,
        })
    }

    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    pub fn node(&self) -> &'a DomNode {
        self.node
    }

    pub fn url(&self) -> Option<&'a str> {
        self.node.document_url.as_deref()
    }

    /// Elements of this document for which `predicate` holds, in document order
    fn collect<F>(&self, mut predicate: F) -> Vec<ElementRef<'a>>
    where
        F: FnMut(NodeId, &DomNode) -> bool,
    {
        let arena = self.arena;
        let found = arena.find_in_document(self.node_id, |id, node| predicate(id, node));
        match found {
            Ok(ids) => ids
                .into_iter()
                .filter_map(|id| ElementRef::new(arena, id).ok())
                .collect(),
            Err(err) => {
                tracing::warn!(document = self.node_id, %err, "Broken document tree");
                Vec::new()
            }
        }
    }
}

impl<'a> ElementRef<'a> {
    pub fn new(arena: &'a DomArena, node_id: NodeId) -> Result<Self> {
        let node = arena.get(node_id)?;
        if !node.is_element() {
            return Err(DomError::InvalidNodeType {
                expected: "Element".to_string(),
                actual: format!("{:?}", node.node_type),
            });
        }
        Ok(Self {
            arena,
            node_id,
            node,
        })
    }

    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    pub fn node(&self) -> &'a DomNode {
        self.node
    }

    /// The document this element belongs to
    pub fn owner_document(&self) -> Result<DocumentRef<'a>> {
        let document_id = self.arena.owner_document(self.node_id)?;
        DocumentRef::new(self.arena, document_id)
    }
}

impl<'a> Document for DocumentRef<'a> {
    type Element = ElementRef<'a>;

    fn iframes(&self) -> Vec<ElementRef<'a>> {
        self.collect(|_, node| node.is_iframe())
    }

    fn query_selector(&self, selector: &Selector) -> Option<ElementRef<'a>> {
        let arena = self.arena;
        let mut stack = vec![self.node_id];

        while let Some(node_id) = stack.pop() {
            let node = arena.get(node_id).ok()?;
            if selector.matches(arena, node_id) {
                return ElementRef::new(arena, node_id).ok();
            }
            stack.extend(node.children_ids.iter().rev());
        }

        None
    }

    fn query_selector_all(&self, selector: &Selector) -> Vec<ElementRef<'a>> {
        let arena = self.arena;
        self.collect(|id, _| selector.matches(arena, id))
    }
}

impl<'a> Element for ElementRef<'a> {
    type Document = DocumentRef<'a>;

    fn tag_name(&self) -> &str {
        &self.node.node_name
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.node.attr(name)
    }

    fn content_document(&self) -> Result<Option<DocumentRef<'a>>> {
        let Some(document_id) = self.node.content_document_id else {
            return Ok(None);
        };

        let origin = self.arena.origin(document_id);
        match (self.arena.top_origin(), origin) {
            (Some(top), Some(origin)) if top == origin => {
                DocumentRef::new(self.arena, document_id).map(Some)
            }
            _ => Err(DomError::CrossOriginAccess {
                frame_id: self.node.frame_id.clone(),
                origin: origin
                    .map(|o| o.ascii_serialization())
                    .unwrap_or_else(|| "unresolved".to_string()),
            }),
        }
    }
}

impl PartialEq for DocumentRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.arena, other.arena) && self.node_id == other.node_id
    }
}

impl Eq for DocumentRef<'_> {}

impl PartialEq for ElementRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.arena, other.arena) && self.node_id == other.node_id
    }
}

impl Eq for ElementRef<'_> {}

// Hand-written so debugging a handle doesn't dump the whole arena
impl fmt::Debug for DocumentRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentRef")
            .field("node_id", &self.node_id)
            .field("url", &self.url())
            .finish()
    }
}

impl fmt::Debug for ElementRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementRef")
            .field("node_id", &self.node_id)
            .field("tag", &self.node.node_name)
            .field("id", &self.node.attr("id"))
            .finish()
    }
}
