//! Arena-based DOM tree storage
//!
//! One arena holds the top-level document *and* every nested document
//! reachable through `contentDocument`. Document boundaries are kept by
//! construction: a nested document is linked through its iframe's
//! `content_document_id`, never through `children_ids`, so a plain
//! children walk can't leak into another document.
//!
//! ## Memory Layout
//!
//! ```text
//! Arena: Vec<DomNode>
//!        [Doc0][HTML][IFRAME]...[Doc1][HTML]...
//!         ↑ 4-byte index, not 8-byte pointer
//! ```

use crate::error::{DomError, Result};
use crate::types::{DomNode, NodeId, NodeType};
use ahash::AHashMap;
use url::{Origin, Url};

/// Arena allocator for DOM nodes
///
/// Design:
/// - Single Vec<DomNode> for sequential allocation
/// - HashMap for backend_node_id → NodeId lookup (CDP uses backend IDs)
/// - No Rc/Arc: use indices everywhere
#[derive(Debug)]
pub struct DomArena {
    /// All nodes stored sequentially (cache-friendly)
    nodes: Vec<DomNode>,

    /// Backend node ID → NodeId lookup (for CDP integration)
    backend_id_map: AHashMap<u32, NodeId>,

    /// Document node → effective origin, filled by `resolve_origins`
    origins: AHashMap<NodeId, Origin>,

    /// Root node ID (if set)
    root_id: Option<NodeId>,
}

impl DomArena {
    /// Create a new empty arena
    pub fn new() -> Self {
        Self::with_capacity(1024) // Pre-allocate for typical page
    }

    /// Create arena with specific capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            backend_id_map: AHashMap::with_capacity(capacity),
            origins: AHashMap::new(),
            root_id: None,
        }
    }

    /// Add a node to the arena, returns its ID
    pub fn add_node(&mut self, node: DomNode) -> NodeId {
        let node_id = self.nodes.len() as NodeId;
        self.backend_id_map.insert(node.backend_node_id, node_id);
        self.nodes.push(node);
        node_id
    }

    /// Get node by ID (immutable)
    pub fn get(&self, node_id: NodeId) -> Result<&DomNode> {
        self.nodes
            .get(node_id as usize)
            .ok_or(DomError::NodeNotFound(node_id))
    }

    /// Get node by ID (mutable)
    pub fn get_mut(&mut self, node_id: NodeId) -> Result<&mut DomNode> {
        self.nodes
            .get_mut(node_id as usize)
            .ok_or(DomError::NodeNotFound(node_id))
    }

    /// Get node by backend node ID (from CDP)
    pub fn get_by_backend_id(&self, backend_id: u32) -> Result<&DomNode> {
        let node_id = self
            .backend_id_map
            .get(&backend_id)
            .ok_or(DomError::NodeNotFound(backend_id))?;
        self.get(*node_id)
    }

    /// Get node ID by backend node ID
    pub fn get_node_id_by_backend(&self, backend_id: u32) -> Option<NodeId> {
        self.backend_id_map.get(&backend_id).copied()
    }

    /// Set root node. The root must be a document.
    pub fn set_root(&mut self, node_id: NodeId) -> Result<()> {
        let node = self.get(node_id)?;
        if !node.is_document() {
            return Err(DomError::InvalidNodeType {
                expected: "Document".to_string(),
                actual: format!("{:?}", node.node_type),
            });
        }
        self.root_id = Some(node_id);
        Ok(())
    }

    /// Get root node ID
    pub fn root_id(&self) -> Option<NodeId> {
        self.root_id
    }

    /// Get root node
    pub fn root(&self) -> Result<&DomNode> {
        let root_id = self
            .root_id
            .ok_or_else(|| DomError::CdpError("No root node set".to_string()))?;
        self.get(root_id)
    }

    /// Total number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if arena is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterator over all node IDs
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(|i| i as NodeId)
    }

    /// Traverse tree depth-first (iterative, no recursion)
    ///
    /// Follows `children_ids` only, so content documents and shadow roots
    /// are never entered.
    pub fn traverse_df<F>(&self, start_id: NodeId, mut visit: F) -> Result<()>
    where
        F: FnMut(NodeId, &DomNode) -> Result<()>,
    {
        let mut stack = vec![start_id];

        while let Some(node_id) = stack.pop() {
            let node = self.get(node_id)?;
            visit(node_id, node)?;

            // Push children in reverse order (so they're visited left-to-right)
            for &child_id in node.children_ids.iter().rev() {
                stack.push(child_id);
            }
        }

        Ok(())
    }

    /// Elements of one document matching `predicate`, in document order
    pub fn find_in_document<F>(&self, document_id: NodeId, mut predicate: F) -> Result<Vec<NodeId>>
    where
        F: FnMut(NodeId, &DomNode) -> bool,
    {
        let mut found = Vec::new();
        self.traverse_df(document_id, |node_id, node| {
            if node.is_element() && predicate(node_id, node) {
                found.push(node_id);
            }
            Ok(())
        })?;
        Ok(found)
    }

    /// The document a node belongs to (a document owns itself)
    pub fn owner_document(&self, node_id: NodeId) -> Result<NodeId> {
        let mut current = node_id;
        loop {
            let node = self.get(current)?;
            if node.is_document() {
                return Ok(current);
            }
            current = node.parent_id.ok_or_else(|| {
                DomError::CdpError(format!("Node {} has no owner document", node_id))
            })?;
        }
    }

    /// Compute the effective origin of every document in the arena.
    ///
    /// Must run after the tree is complete; `DomService` does this once per parse.
    pub fn resolve_origins(&mut self) -> Result<()> {
        self.origins.clear();
        let documents: Vec<NodeId> = self
            .node_ids()
            .filter(|&id| self.nodes[id as usize].node_type == NodeType::Document)
            .collect();

        for document_id in documents {
            self.resolve_origin(document_id)?;
        }
        Ok(())
    }

    fn resolve_origin(&mut self, document_id: NodeId) -> Result<Origin> {
        if let Some(origin) = self.origins.get(&document_id) {
            return Ok(origin.clone());
        }

        let node = self.get(document_id)?;
        let own = node.document_url.as_deref().and_then(url_origin);
        let host_frame = node.parent_id;

        // about:blank and friends inherit from the document embedding them
        let origin = match (own, host_frame) {
            (Some(origin), _) => origin,
            (None, Some(frame_id)) => {
                let owner = self.owner_document(frame_id)?;
                self.resolve_origin(owner)?
            }
            (None, None) => Origin::new_opaque(),
        };

        self.origins.insert(document_id, origin.clone());
        Ok(origin)
    }

    /// Effective origin of a document, once resolved
    pub fn origin(&self, document_id: NodeId) -> Option<&Origin> {
        self.origins.get(&document_id)
    }

    /// Origin of the top-level document: the origin searches run as
    pub fn top_origin(&self) -> Option<&Origin> {
        self.root_id.and_then(|root| self.origin(root))
    }

    /// Clear arena (reuse allocation)
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.backend_id_map.clear();
        self.origins.clear();
        self.root_id = None;
    }
}

impl Default for DomArena {
    fn default() -> Self {
        Self::new()
    }
}

/// Origin carried by a document URL, `None` when it inherits its embedder's.
fn url_origin(url: &str) -> Option<Origin> {
    if url.is_empty() || url.starts_with("about:blank") || url.starts_with("about:srcdoc") {
        return None;
    }
    Some(
        Url::parse(url)
            .map(|parsed| parsed.origin())
            .unwrap_or_else(|_| Origin::new_opaque()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(arena: &mut DomArena, backend_id: u32, name: &str) -> NodeId {
        arena.add_node(DomNode::new(
            backend_id,
            backend_id,
            NodeType::Element,
            name.to_string(),
        ))
    }

    fn document(arena: &mut DomArena, backend_id: u32, url: Option<&str>) -> NodeId {
        let mut doc = DomNode::new(
            backend_id,
            backend_id,
            NodeType::Document,
            "#document".to_string(),
        );
        doc.document_url = url.map(String::from);
        arena.add_node(doc)
    }

    fn append(arena: &mut DomArena, parent: NodeId, child: NodeId) {
        arena.get_mut(child).unwrap().parent_id = Some(parent);
        arena.get_mut(parent).unwrap().children_ids.push(child);
    }

    fn embed(arena: &mut DomArena, iframe: NodeId, doc: NodeId) {
        arena.get_mut(doc).unwrap().parent_id = Some(iframe);
        arena.get_mut(iframe).unwrap().content_document_id = Some(doc);
    }

    #[test]
    fn test_arena_basic() {
        let mut arena = DomArena::new();
        let id = element(&mut arena, 100, "div");
        assert_eq!(id, 0);

        let retrieved = arena.get(id).unwrap();
        assert_eq!(retrieved.node_name, "div");
        assert_eq!(retrieved.backend_node_id, 100);
        assert!(matches!(arena.get(7), Err(DomError::NodeNotFound(7))));
    }

    #[test]
    fn test_backend_lookup() {
        let mut arena = DomArena::new();
        element(&mut arena, 100, "div");

        let found = arena.get_by_backend_id(100).unwrap();
        assert_eq!(found.node_name, "div");
        assert_eq!(arena.get_node_id_by_backend(100), Some(0));
        assert_eq!(arena.get_node_id_by_backend(101), None);
    }

    #[test]
    fn test_set_root_requires_document() {
        let mut arena = DomArena::new();
        let div = element(&mut arena, 1, "div");
        let doc = document(&mut arena, 2, None);

        assert!(matches!(
            arena.set_root(div),
            Err(DomError::InvalidNodeType { .. })
        ));
        arena.set_root(doc).unwrap();
        assert_eq!(arena.root_id(), Some(doc));
    }

    #[test]
    fn test_traverse_df_stays_in_document() {
        let mut arena = DomArena::new();

        // doc -> div -> [span, iframe -> doc2 -> p]
        let doc = document(&mut arena, 1, Some("https://a.test/"));
        let div = element(&mut arena, 2, "div");
        let span = element(&mut arena, 3, "span");
        let iframe = element(&mut arena, 4, "iframe");
        let doc2 = document(&mut arena, 5, Some("https://a.test/inner"));
        let p = element(&mut arena, 6, "p");

        append(&mut arena, doc, div);
        append(&mut arena, div, span);
        append(&mut arena, div, iframe);
        embed(&mut arena, iframe, doc2);
        append(&mut arena, doc2, p);

        let mut visited = Vec::new();
        arena
            .traverse_df(doc, |_, node| {
                visited.push(node.node_name.clone());
                Ok(())
            })
            .unwrap();
        assert_eq!(visited, vec!["#document", "div", "span", "iframe"]);

        let elements = arena.find_in_document(doc2, |_, _| true).unwrap();
        assert_eq!(elements, vec![p]);

        assert_eq!(arena.owner_document(p).unwrap(), doc2);
        assert_eq!(arena.owner_document(iframe).unwrap(), doc);
        assert_eq!(arena.owner_document(doc2).unwrap(), doc2);
    }

    #[test]
    fn test_origins_inherit_for_blank_documents() {
        let mut arena = DomArena::new();

        let top = document(&mut arena, 1, Some("https://a.test/page"));
        let html = element(&mut arena, 2, "html");
        let blank_frame = element(&mut arena, 3, "iframe");
        let blank = document(&mut arena, 4, Some("about:blank"));
        let foreign_frame = element(&mut arena, 5, "iframe");
        let foreign = document(&mut arena, 6, Some("https://b.test/"));
        let data_frame = element(&mut arena, 7, "iframe");
        let data = document(&mut arena, 8, Some("data:text/html,<p>hi</p>"));

        append(&mut arena, top, html);
        for (frame, doc) in [(blank_frame, blank), (foreign_frame, foreign), (data_frame, data)] {
            append(&mut arena, html, frame);
            embed(&mut arena, frame, doc);
        }
        arena.set_root(top).unwrap();
        arena.resolve_origins().unwrap();

        let top_origin = arena.top_origin().unwrap();
        assert_eq!(arena.origin(blank), Some(top_origin));
        assert_ne!(arena.origin(foreign), Some(top_origin));
        assert_ne!(arena.origin(data), Some(top_origin));
    }
}
