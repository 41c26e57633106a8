//! Read-only view over one page snapshot.
//!
//! Every heuristic in the engine runs against a [`Dom`]. Node ids are only valid for
//! the snapshot epoch that produced them.

mod builder;

pub use builder::SnapshotBuilder;

use formsense_common::protocol::{NodeId, PageSnapshot, QueryMatch, SnapshotNode};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct Dom {
    snapshot: PageSnapshot,
    index: HashMap<NodeId, usize>,
    /// Element and text ids in document (pre-order) order.
    order: Vec<NodeId>,
}

impl Dom {
    pub fn new(snapshot: PageSnapshot) -> Self {
        let index: HashMap<NodeId, usize> = snapshot
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id, i))
            .collect();

        let mut order = Vec::with_capacity(snapshot.nodes.len());
        let mut stack: Vec<NodeId> = snapshot
            .nodes
            .iter()
            .filter(|n| n.parent.is_none_or(|p| !index.contains_key(&p)))
            .map(|n| n.id)
            .rev()
            .collect();
        while let Some(id) = stack.pop() {
            order.push(id);
            if let Some(&i) = index.get(&id) {
                stack.extend(snapshot.nodes[i].children.iter().rev().copied());
            }
        }

        Self {
            snapshot,
            index,
            order,
        }
    }

    pub fn epoch(&self) -> u64 {
        self.snapshot.epoch
    }

    pub fn url(&self) -> &str {
        &self.snapshot.url
    }

    pub fn len(&self) -> usize {
        self.snapshot.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&SnapshotNode> {
        self.index.get(&id).map(|&i| &self.snapshot.nodes[i])
    }

    /// All element nodes in document order.
    pub fn elements(&self) -> impl Iterator<Item = &SnapshotNode> {
        self.order
            .iter()
            .filter_map(|&id| self.node(id))
            .filter(|n| n.is_element())
    }

    pub fn parent(&self, id: NodeId) -> Option<&SnapshotNode> {
        self.node(id)?.parent.and_then(|p| self.node(p))
    }

    /// Ancestors from the parent up to the root.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            dom: self,
            next: self.node(id).and_then(|n| n.parent),
        }
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &SnapshotNode> {
        self.node(id)
            .map(|n| n.children.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(|&c| self.node(c))
    }

    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = &SnapshotNode> {
        self.children(id).filter(|n| n.is_element())
    }

    /// Descendants of `id` (excluding itself) in document order.
    pub fn descendants(&self, id: NodeId) -> Vec<&SnapshotNode> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self
            .node(id)
            .map(|n| n.children.iter().rev().copied().collect())
            .unwrap_or_default();
        while let Some(next) = stack.pop() {
            if let Some(node) = self.node(next) {
                out.push(node);
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    /// True when `node` is `ancestor` or lies inside it.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        node == ancestor || self.ancestors(node).any(|a| a.id == ancestor)
    }

    /// Concatenated character data of every text node under `id`.
    pub fn text_content(&self, id: NodeId) -> String {
        match self.node(id) {
            Some(n) if n.is_text() => n.text.clone(),
            Some(_) => self
                .descendants(id)
                .into_iter()
                .filter(|n| n.is_text())
                .map(|n| n.text.as_str())
                .collect(),
            None => String::new(),
        }
    }

    /// Whitespace-collapsed text content.
    pub fn text(&self, id: NodeId) -> String {
        collapse_whitespace(&self.text_content(id))
    }

    /// Text of the node's direct text children only.
    pub fn own_text(&self, id: NodeId) -> String {
        let raw: String = self
            .children(id)
            .filter(|n| n.is_text())
            .map(|n| n.text.as_str())
            .collect();
        collapse_whitespace(&raw)
    }

    /// First element whose attribute equals `value` exactly.
    pub fn find_by_attr(&self, name: &str, value: &str) -> Option<&SnapshotNode> {
        self.elements().find(|n| n.attr(name) == Some(value))
    }

    /// Result of the `index`-th query sent with the snapshot request.
    pub fn query_match(&self, index: usize) -> Option<&QueryMatch> {
        self.snapshot.query_matches.get(index)
    }

    pub fn snapshot(&self) -> &PageSnapshot {
        &self.snapshot
    }
}

pub struct Ancestors<'a> {
    dom: &'a Dom,
    next: Option<NodeId>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a SnapshotNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.dom.node(self.next?)?;
        self.next = node.parent;
        Some(node)
    }
}

/// Trim and collapse runs of whitespace to single spaces.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize text for comparison (lowercase, trim, collapse whitespace).
pub fn normalize_text(text: &str) -> String {
    collapse_whitespace(&text.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (Dom, NodeId, NodeId, NodeId) {
        let mut b = SnapshotBuilder::new();
        let body = b.body();
        let form = b.element(body, "form", &[("id", "f")]);
        let label = b.text_element(form, "label", &[("for", "em")], "  Email\n address ");
        let input = b.element(form, "input", &[("id", "em")]);
        (Dom::new(b.build()), form, label, input)
    }

    #[test]
    fn test_document_order_and_ancestors() {
        let (dom, form, label, input) = sample();
        let tags: Vec<&str> = dom.elements().map(|n| n.tag.as_str()).collect();
        assert_eq!(tags, vec!["body", "form", "label", "input"]);

        let ancestors: Vec<NodeId> = dom.ancestors(input).map(|n| n.id).collect();
        assert_eq!(ancestors, vec![form, dom.elements().next().unwrap().id]);
        assert!(dom.contains(form, label));
        assert!(!dom.contains(label, form));
    }

    #[test]
    fn test_text_helpers() {
        let (dom, form, label, _) = sample();
        assert_eq!(dom.text(label), "Email address");
        assert_eq!(dom.text(form), "Email address");
        assert_eq!(dom.own_text(form), "");
        assert_eq!(normalize_text("  Full\tNAME "), "full name");
    }

    #[test]
    fn test_out_of_order_children_follow_tree() {
        let mut b = SnapshotBuilder::new();
        let body = b.body();
        let first = b.element(body, "div", &[]);
        let second = b.element(body, "div", &[]);
        let nested = b.element(first, "span", &[]);
        let dom = Dom::new(b.build());

        let ids: Vec<NodeId> = dom.elements().map(|n| n.id).collect();
        assert_eq!(ids, vec![body, first, nested, second]);
    }
}
