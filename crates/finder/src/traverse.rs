//! Recursive cross-document traversal
//!
//! Pull-based: documents are read through the host traits as the walk
//! reaches them, nothing is materialised up front.
//!
//! ```text
//! first_match(doc, depth):
//!     depth > max          → None
//!     pass 1: local(doc)   → Some(hit)? return it
//!     pass 2: for iframe in doc.iframes():
//!                 nested_document(iframe)? → first_match(nested, depth + 1)
//! ```
//!
//! Pass 1 finishing before pass 2 starts is what makes a match among a
//! document's own iframes beat anything found further down.

use crate::options::MaxDepth;
use dom::{Document, Element};

/// The descent step: the iframe's document, or `None` when this branch has
/// to be skipped. Errors end here and never reach the caller.
///
/// Cross-origin refusals are routine and logged at debug; any other host
/// error means a broken snapshot and is logged at warn.
pub fn nested_document<E: Element>(iframe: &E) -> Option<E::Document> {
    match iframe.content_document() {
        Ok(Some(document)) => Some(document),
        Ok(None) => {
            tracing::trace!(id = ?iframe.id(), "Skipping iframe without a document");
            None
        }
        Err(err) if err.is_access_violation() => {
            tracing::debug!(id = ?iframe.id(), %err, "Skipping inaccessible iframe");
            None
        }
        Err(err) => {
            tracing::warn!(id = ?iframe.id(), %err, "Skipping iframe with unreadable document");
            None
        }
    }
}

/// Depth-first search for the first element `local` reports, preferring
/// hits in the current document over hits in any nested one.
pub fn first_match<D, F>(document: &D, max_depth: MaxDepth, local: &F) -> Option<D::Element>
where
    D: Document,
    F: Fn(&D) -> Option<D::Element>,
{
    first_match_at(document, 0, max_depth, local)
}

fn first_match_at<D, F>(
    document: &D,
    depth: usize,
    max_depth: MaxDepth,
    local: &F,
) -> Option<D::Element>
where
    D: Document,
    F: Fn(&D) -> Option<D::Element>,
{
    if max_depth.exceeded_by(depth) {
        tracing::trace!(depth, "Depth limit reached");
        return None;
    }

    if let Some(found) = local(document) {
        return Some(found);
    }

    document.iframes().into_iter().find_map(|iframe| {
        let nested = nested_document(&iframe)?;
        first_match_at(&nested, depth + 1, max_depth, local)
    })
}

/// Every element `local` reports, across the whole reachable tree, in
/// pre-order: a document's own matches, then each nested document's
/// matches in iframe order.
pub fn all_matches<D, F>(document: &D, max_depth: MaxDepth, local: &F) -> Vec<D::Element>
where
    D: Document,
    F: Fn(&D) -> Vec<D::Element>,
{
    let mut found = Vec::new();
    all_matches_at(document, 0, max_depth, local, &mut found);
    found
}

fn all_matches_at<D, F>(
    document: &D,
    depth: usize,
    max_depth: MaxDepth,
    local: &F,
    found: &mut Vec<D::Element>,
) where
    D: Document,
    F: Fn(&D) -> Vec<D::Element>,
{
    if max_depth.exceeded_by(depth) {
        tracing::trace!(depth, "Depth limit reached");
        return;
    }

    found.extend(local(document));

    for iframe in document.iframes() {
        if let Some(nested) = nested_document(&iframe) {
            all_matches_at(&nested, depth + 1, max_depth, local, found);
        }
    }
}
