//! DOM Service - Main entry point for DOM snapshots
//!
//! This handles:
//! - CDP integration (parsing `DOM.getDocument` responses)
//! - DOM tree construction, nested frame documents included
//! - Origin resolution for the same-origin policy
//! - Handing out document/element handles for searches

use crate::arena::DomArena;
use crate::error::{DomError, Result};
use crate::host::{DocumentRef, ElementRef};
use crate::types::*;
use serde_json::Value;
use smallvec::SmallVec;
use std::collections::HashMap;

/// Main DOM service
pub struct DomService {
    arena: DomArena,
}

impl DomService {
    /// Create new DOM service
    pub fn new() -> Self {
        Self {
            arena: DomArena::new(),
        }
    }

    /// Get reference to internal arena
    pub fn arena(&self) -> &DomArena {
        &self.arena
    }

    /// Parse raw CDP JSON text (the `result` of `DOM.getDocument`)
    pub fn parse_cdp_json(&mut self, json: &str) -> Result<DocumentRef<'_>> {
        let response: Value = serde_json::from_str(json)?;
        self.parse_cdp_dom_tree(&response)?;
        self.top_document()
    }

    /// Parse CDP DOM tree response and build arena
    ///
    /// Input format matches CDP's `DOM.getDocument { depth: -1, pierce: true }`
    /// response:
    /// ```json
    /// {
    ///   "root": {
    ///     "nodeId": 1,
    ///     "backendNodeId": 1,
    ///     "nodeType": 9,
    ///     "nodeName": "#document",
    ///     "documentURL": "https://example.com/",
    ///     "children": [...]
    ///   }
    /// }
    /// ```
    ///
    /// Iframe elements carry their nested document under `contentDocument`.
    pub fn parse_cdp_dom_tree(&mut self, cdp_response: &Value) -> Result<NodeId> {
        let root = cdp_response
            .get("root")
            .ok_or_else(|| DomError::CdpError("Missing 'root' in CDP response".to_string()))?;

        self.arena.clear();
        let root_id = self.parse_node(root, None)?;
        self.arena.set_root(root_id)?;
        self.arena.resolve_origins()?;

        tracing::debug!(nodes = self.arena.len(), "Parsed CDP DOM tree");
        Ok(root_id)
    }

    /// Recursively parse a CDP node
    fn parse_node(&mut self, cdp_node: &Value, parent_id: Option<NodeId>) -> Result<NodeId> {
        let node_id = id_field(cdp_node, "nodeId")?;
        let backend_node_id = id_field(cdp_node, "backendNodeId")?;

        let node_type_val = cdp_node["nodeType"]
            .as_u64()
            .ok_or_else(|| DomError::CdpError("Missing nodeType".to_string()))?
            as u8;

        let node_type =
            NodeType::from_u8(node_type_val).ok_or_else(|| DomError::InvalidNodeType {
                expected: "valid NodeType".to_string(),
                actual: format!("{}", node_type_val),
            })?;

        let node_name = cdp_node["nodeName"].as_str().unwrap_or("").to_string();

        let node_value = cdp_node["nodeValue"].as_str().unwrap_or("").to_string();

        // Attributes come flattened: [name0, value0, name1, value1, ...]
        let mut attributes = HashMap::new();
        if let Some(attrs) = cdp_node["attributes"].as_array() {
            for pair in attrs.chunks_exact(2) {
                if let (Some(key), Some(value)) = (pair[0].as_str(), pair[1].as_str()) {
                    attributes.insert(key.to_string(), value.to_string());
                }
            }
        }

        let mut node = DomNode::new(node_id, backend_node_id, node_type, node_name);

        node.node_value = node_value;
        node.attributes = attributes;
        node.parent_id = parent_id;
        node.frame_id = cdp_node["frameId"].as_str().map(String::from);
        if node_type == NodeType::Document {
            node.document_url = cdp_node["documentURL"].as_str().map(String::from);
        }

        if let Some(shadow_type) = cdp_node.get("shadowRootType").and_then(|v| v.as_str()) {
            node.shadow_root_type = match shadow_type {
                "user-agent" => Some(ShadowRootType::UserAgent),
                "open" => Some(ShadowRootType::Open),
                "closed" => Some(ShadowRootType::Closed),
                _ => None,
            };
        }

        let current_node_id = self.arena.add_node(node);

        if let Some(children) = cdp_node["children"].as_array() {
            let mut child_ids = SmallVec::new();

            for child in children {
                let child_id = self.parse_node(child, Some(current_node_id))?;
                child_ids.push(child_id);
            }

            self.arena.get_mut(current_node_id)?.children_ids = child_ids;
        }

        // Nested frame document: linked, not a child
        if let Some(content_doc) = cdp_node.get("contentDocument") {
            let doc_id = self.parse_node(content_doc, Some(current_node_id))?;
            if !self.arena.get(doc_id)?.is_document() {
                return Err(DomError::InvalidNodeType {
                    expected: "Document".to_string(),
                    actual: format!("{:?}", self.arena.get(doc_id)?.node_type),
                });
            }
            self.arena.get_mut(current_node_id)?.content_document_id = Some(doc_id);
        }

        if let Some(shadow_roots) = cdp_node["shadowRoots"].as_array() {
            let mut shadow_ids = SmallVec::new();

            for shadow in shadow_roots {
                let shadow_id = self.parse_node(shadow, Some(current_node_id))?;
                shadow_ids.push(shadow_id);
            }

            self.arena.get_mut(current_node_id)?.shadow_root_ids = Some(shadow_ids);
        }

        Ok(current_node_id)
    }

    /// The top-level document: the default starting point of every search
    pub fn top_document(&self) -> Result<DocumentRef<'_>> {
        let root_id = self
            .arena
            .root_id()
            .ok_or_else(|| DomError::CdpError("No root node set".to_string()))?;
        DocumentRef::new(&self.arena, root_id)
    }

    /// Element handle for a CDP backend node id
    pub fn element_by_backend_id(&self, backend_id: u32) -> Result<ElementRef<'_>> {
        let node_id = self
            .arena
            .get_node_id_by_backend(backend_id)
            .ok_or(DomError::NodeNotFound(backend_id))?;
        ElementRef::new(&self.arena, node_id)
    }
}

/// Read a CDP id; ids are u32 on the wire, anything wider is malformed
fn id_field(cdp_node: &Value, field: &str) -> Result<u32> {
    let raw = cdp_node[field]
        .as_u64()
        .ok_or_else(|| DomError::CdpError(format!("Missing {}", field)))?;
    u32::try_from(raw)
        .map_err(|_| DomError::CdpError(format!("{} out of range: {}", field, raw)))
}

impl Default for DomService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{Document, Element};

    #[test]
    fn test_parse_simple_dom() {
        let cdp_json = serde_json::json!({
            "root": {
                "nodeId": 1,
                "backendNodeId": 1,
                "nodeType": 9,
                "nodeName": "#document",
                "nodeValue": "",
                "documentURL": "https://example.com/",
                "children": [{
                    "nodeId": 2,
                    "backendNodeId": 2,
                    "nodeType": 1,
                    "nodeName": "HTML",
                    "nodeValue": "",
                    "attributes": ["lang", "en", "dangling"]
                }]
            }
        });

        let mut service = DomService::new();
        let root_id = service.parse_cdp_dom_tree(&cdp_json).unwrap();

        assert_eq!(root_id, 0);
        assert_eq!(service.arena().len(), 2);

        let html = service.element_by_backend_id(2).unwrap();
        assert_eq!(html.attribute("lang"), Some("en"));
        assert_eq!(html.node().attributes.len(), 1);
        assert_eq!(
            service.top_document().unwrap().url(),
            Some("https://example.com/")
        );
    }

    #[test]
    fn test_parse_content_document() {
        let cdp_json = serde_json::json!({
            "root": {
                "nodeId": 1, "backendNodeId": 1, "nodeType": 9, "nodeName": "#document",
                "documentURL": "https://example.com/",
                "children": [{
                    "nodeId": 2, "backendNodeId": 2, "nodeType": 1, "nodeName": "IFRAME",
                    "frameId": "F1",
                    "attributes": ["name", "child"],
                    "contentDocument": {
                        "nodeId": 3, "backendNodeId": 3, "nodeType": 9, "nodeName": "#document",
                        "documentURL": "https://example.com/child",
                        "children": [{
                            "nodeId": 4, "backendNodeId": 4, "nodeType": 1, "nodeName": "P"
                        }]
                    }
                }]
            }
        });

        let mut service = DomService::new();
        service.parse_cdp_dom_tree(&cdp_json).unwrap();

        let iframe = service.element_by_backend_id(2).unwrap();
        assert!(iframe.node().children_ids.is_empty());
        assert_eq!(iframe.node().frame_id.as_deref(), Some("F1"));

        let child = iframe.content_document().unwrap().unwrap();
        assert_eq!(child.url(), Some("https://example.com/child"));
        assert_eq!(child.node().parent_id, Some(iframe.node_id()));
        assert!(child.iframes().is_empty());
    }

    #[test]
    fn test_parse_errors() {
        let mut service = DomService::new();

        let missing_root = serde_json::json!({ "node": {} });
        assert!(matches!(
            service.parse_cdp_dom_tree(&missing_root),
            Err(DomError::CdpError(_))
        ));

        let bad_type = serde_json::json!({
            "root": { "nodeId": 1, "backendNodeId": 1, "nodeType": 42, "nodeName": "?" }
        });
        assert!(matches!(
            service.parse_cdp_dom_tree(&bad_type),
            Err(DomError::InvalidNodeType { .. })
        ));

        let element_root = serde_json::json!({
            "root": { "nodeId": 1, "backendNodeId": 1, "nodeType": 1, "nodeName": "DIV" }
        });
        assert!(service.parse_cdp_dom_tree(&element_root).is_err());

        assert!(matches!(
            service.parse_cdp_json("{ not json"),
            Err(DomError::ParseError(_))
        ));
    }

    #[test]
    fn test_parse_rejects_oversized_ids() {
        let mut service = DomService::new();
        let oversized = u64::from(u32::MAX) + 1;

        let wide_node_id = serde_json::json!({
            "root": {
                "nodeId": oversized,
                "backendNodeId": 1,
                "nodeType": 9,
                "nodeName": "#document"
            }
        });
        assert!(matches!(
            service.parse_cdp_dom_tree(&wide_node_id),
            Err(DomError::CdpError(ref msg)) if msg.contains("nodeId out of range")
        ));

        let wide_backend_id = serde_json::json!({
            "root": {
                "nodeId": 1,
                "backendNodeId": oversized,
                "nodeType": 9,
                "nodeName": "#document"
            }
        });
        assert!(matches!(
            service.parse_cdp_dom_tree(&wide_backend_id),
            Err(DomError::CdpError(ref msg)) if msg.contains("backendNodeId out of range")
        ));

        let max = serde_json::json!({
            "root": {
                "nodeId": u32::MAX,
                "backendNodeId": u32::MAX,
                "nodeType": 9,
                "nodeName": "#document"
            }
        });
        service.parse_cdp_dom_tree(&max).unwrap();
        assert!(service.element_by_backend_id(u32::MAX).is_err());
        assert_eq!(service.arena().get_node_id_by_backend(u32::MAX), Some(0));
    }

    #[test]
    fn test_parse_cdp_json_text() {
        let mut service = DomService::new();
        let top = service
            .parse_cdp_json(
                r##"{"root": {"nodeId": 1, "backendNodeId": 7, "nodeType": 9,
                    "nodeName": "#document", "documentURL": "https://example.com/"}}"##,
            )
            .unwrap();

        assert_eq!(top.node().backend_node_id, 7);
    }
}
