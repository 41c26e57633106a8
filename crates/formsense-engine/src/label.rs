//! Human-readable label text for a form control.

use crate::classify::is_form_control;
use crate::dom::{Dom, collapse_whitespace};
use formsense_common::protocol::{NodeId, SnapshotNode};

/// Resolve the label of a control. First non-empty source wins:
/// 1. `<label for=id>`
/// 2. enclosing `<label>`, minus the control's own text
/// 3. the parent's other children that are not (and do not hold) controls
/// 4. `aria-label`
/// 5. `aria-labelledby`, joining the referenced elements' text
/// 6. `placeholder`
/// 7. `name`, then `id`
///
/// Returns an empty string for unlabeled controls.
pub fn resolve_label(dom: &Dom, id: NodeId) -> String {
    let Some(node) = dom.node(id) else {
        return String::new();
    };

    [
        label_for(dom, node),
        enclosing_label(dom, node),
        sibling_text(dom, node),
    ]
    .into_iter()
    .find(|text| !text.is_empty())
    .or_else(|| node.non_empty_attr("aria-label").map(collapse_whitespace))
    .or_else(|| labelled_by(dom, node))
    .or_else(|| {
        ["placeholder", "name", "id"]
            .into_iter()
            .filter_map(|attr| node.non_empty_attr(attr))
            .map(collapse_whitespace)
            .next()
    })
    .unwrap_or_default()
}

fn labelled_by(dom: &Dom, node: &SnapshotNode) -> Option<String> {
    let ids = node.non_empty_attr("aria-labelledby")?;
    let parts: Vec<String> = ids
        .split_whitespace()
        .filter_map(|id| dom.find_by_attr("id", id))
        .map(|e| dom.text_content(e.id))
        .collect();
    Some(collapse_whitespace(&parts.join(" "))).filter(|text| !text.is_empty())
}

fn label_for(dom: &Dom, node: &SnapshotNode) -> String {
    let Some(control_id) = node.non_empty_attr("id") else {
        return String::new();
    };
    dom.elements()
        .find(|e| e.tag == "label" && e.attr("for") == Some(control_id))
        .map(|label| dom.text(label.id))
        .unwrap_or_default()
}

fn enclosing_label(dom: &Dom, node: &SnapshotNode) -> String {
    let Some(label) = dom.ancestors(node.id).find(|a| a.tag == "label") else {
        return String::new();
    };
    let raw: String = dom
        .descendants(label.id)
        .into_iter()
        .filter(|n| n.is_text() && !dom.contains(node.id, n.id))
        .map(|n| n.text.as_str())
        .collect();
    collapse_whitespace(&raw)
}

fn sibling_text(dom: &Dom, node: &SnapshotNode) -> String {
    let Some(parent) = node.parent else {
        return String::new();
    };
    let parts: Vec<String> = dom
        .children(parent)
        .filter(|c| c.id != node.id)
        .filter(|c| c.is_text() || !holds_control(dom, c))
        .map(|c| dom.text_content(c.id))
        .collect();
    collapse_whitespace(&parts.join(" "))
}

fn holds_control(dom: &Dom, node: &SnapshotNode) -> bool {
    is_form_control(node) || dom.descendants(node.id).into_iter().any(is_form_control)
}
