//! Frame Finder - public entry points
//!
//! Each operation is a thin specialization of the traversal in
//! `crate::traverse`: it picks the local check, resolves options against the
//! finder's defaults and runs one synchronous walk.

use crate::options::{FinderConfig, MaxDepth, SearchOptions};
use crate::traverse::{all_matches, first_match};
use dom::{Document, Element, Result, Selector};

/// Cross-document search over a host document tree
#[derive(Debug, Clone)]
pub struct FrameFinder<D> {
    top_document: D,
    config: FinderConfig,
}

impl<D: Document> FrameFinder<D> {
    /// Finder whose searches start at `top_document` unless told otherwise
    pub fn new(top_document: D) -> Self {
        Self::with_config(top_document, FinderConfig::default())
    }

    pub fn with_config(top_document: D, config: FinderConfig) -> Self {
        Self {
            top_document,
            config,
        }
    }

    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    pub fn top_document(&self) -> &D {
        &self.top_document
    }

    fn resolve(&self, options: SearchOptions<D>) -> (D, MaxDepth) {
        let root = options
            .root_document
            .unwrap_or_else(|| self.top_document.clone());
        (root, options.max_depth.unwrap_or(self.config.max_depth))
    }

    /// First iframe, across nested documents, whose `id` attribute is `id`
    pub fn find_iframe_by_id(&self, id: &str, options: SearchOptions<D>) -> Option<D::Element> {
        let found = self.find_iframe(|iframe| iframe.id() == Some(id), options);
        tracing::debug!(id, found = found.is_some(), "find_iframe_by_id");
        found
    }

    /// First iframe, across nested documents, whose `name` attribute is `name`
    pub fn find_iframe_by_name(&self, name: &str, options: SearchOptions<D>) -> Option<D::Element> {
        let found = self.find_iframe(|iframe| iframe.name() == Some(name), options);
        tracing::debug!(name, found = found.is_some(), "find_iframe_by_name");
        found
    }

    /// First iframe, across nested documents, satisfying `predicate`.
    ///
    /// Iframes of a document are all tested before any of them is entered,
    /// so among direct iframes the earliest match in document order wins.
    pub fn find_iframe<P>(&self, predicate: P, options: SearchOptions<D>) -> Option<D::Element>
    where
        P: Fn(&D::Element) -> bool,
    {
        let (root, max_depth) = self.resolve(options);
        first_match(&root, max_depth, &|document: &D| {
            document.iframes().into_iter().find(|iframe| predicate(iframe))
        })
    }

    /// Iframes of a single document satisfying `predicate`.
    ///
    /// Single level only: iframes inside nested documents are never
    /// considered, whatever the predicate.
    pub fn find_all_iframes<P>(&self, predicate: P, root_document: Option<D>) -> Vec<D::Element>
    where
        P: Fn(&D::Element) -> bool,
    {
        let root = root_document.unwrap_or_else(|| self.top_document.clone());
        let found: Vec<_> = root
            .iframes()
            .into_iter()
            .filter(|iframe| predicate(iframe))
            .collect();
        tracing::debug!(count = found.len(), "find_all_iframes");
        found
    }

    /// First element matching `selector`, searching each document with its
    /// own query before descending into its iframes.
    ///
    /// Fails only when `selector` does not parse.
    pub fn find_element(
        &self,
        selector: &str,
        options: SearchOptions<D>,
    ) -> Result<Option<D::Element>> {
        let selector = Selector::parse(selector)?;
        let (root, max_depth) = self.resolve(options);

        let found = first_match(&root, max_depth, &|document: &D| {
            document.query_selector(&selector)
        });
        tracing::debug!(%selector, found = found.is_some(), "find_element");
        Ok(found)
    }

    /// Every element matching `selector` across nested documents, in
    /// pre-order: a document's matches first, then each nested document's
    /// in iframe order.
    ///
    /// Fails only when `selector` does not parse.
    pub fn find_all_elements(
        &self,
        selector: &str,
        options: SearchOptions<D>,
    ) -> Result<Vec<D::Element>> {
        let selector = Selector::parse(selector)?;
        let (root, max_depth) = self.resolve(options);

        let found = all_matches(&root, max_depth, &|document: &D| {
            document.query_selector_all(&selector)
        });
        tracing::debug!(%selector, count = found.len(), "find_all_elements");
        Ok(found)
    }
}
