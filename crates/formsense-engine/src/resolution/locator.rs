//! Diagnostic locators (XPath and CSS) for snapshot nodes.

use crate::dom::Dom;
use formsense_common::protocol::{NodeId, SnapshotNode};
use regex::Regex;
use std::sync::LazyLock;

static CSS_IDENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]*$").unwrap());

/// Elements from the node up to, but excluding, `<body>`; outermost first.
fn path_below_body<'a>(dom: &'a Dom, node: &'a SnapshotNode) -> Vec<&'a SnapshotNode> {
    let mut path: Vec<&SnapshotNode> = std::iter::once(node)
        .chain(dom.ancestors(node.id))
        .take_while(|n| n.tag != "body")
        .collect();
    path.reverse();
    path
}

/// 1-based position among same-tag element siblings.
fn same_tag_position(dom: &Dom, node: &SnapshotNode) -> usize {
    match node.parent {
        Some(parent) => {
            dom.element_children(parent)
                .take_while(|s| s.id != node.id)
                .filter(|s| s.tag == node.tag)
                .count()
                + 1
        }
        None => 1,
    }
}

/// `//*[@id="..."]` for nodes with a usable id, else a positional path from `<body>`.
pub fn xpath(dom: &Dom, id: NodeId) -> String {
    let Some(node) = dom.node(id) else {
        return String::new();
    };
    if let Some(el_id) = node.non_empty_attr("id")
        && !el_id.contains('"')
    {
        return format!("//*[@id=\"{}\"]", el_id);
    }
    if node.tag == "body" {
        return "//body".to_string();
    }

    let segments: Vec<String> = path_below_body(dom, node)
        .into_iter()
        .map(|n| match same_tag_position(dom, n) {
            1 => n.tag.clone(),
            pos => format!("{}[{}]", n.tag, pos),
        })
        .collect();
    format!("//body/{}", segments.join("/"))
}

/// `#id`, `tag[name="..."]` or an `nth-of-type` path from `body`.
pub fn css_selector(dom: &Dom, id: NodeId) -> String {
    let Some(node) = dom.node(id) else {
        return String::new();
    };
    if let Some(el_id) = node.non_empty_attr("id")
        && CSS_IDENT.is_match(el_id)
    {
        return format!("#{}", el_id);
    }
    if let Some(name) = node.non_empty_attr("name") {
        return format!("{}[name=\"{}\"]", node.tag, escape_css_string(name));
    }
    if node.tag == "body" {
        return "body".to_string();
    }

    let segments: Vec<String> = path_below_body(dom, node)
        .into_iter()
        .map(|n| format!("{}:nth-of-type({})", n.tag, same_tag_position(dom, n)))
        .collect();
    format!("body > {}", segments.join(" > "))
}

pub fn escape_css_string(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
