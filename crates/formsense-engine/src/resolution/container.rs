//! Field sections: the smallest ancestor that groups a label with its controls.

use crate::classify::is_form_control;
use crate::dom::Dom;
use crate::visibility::is_visible;
use formsense_common::protocol::{NodeId, SnapshotNode};

/// Class names used by form frameworks for one label/control group.
const FORM_GROUP_CLASSES: &[&str] = &[
    "form-group",
    "form-field",
    "form-item",
    "form-row",
    "field",
    "input-group",
];

/// Google Forms question wrappers.
const QUESTION_CONTAINER_CLASSES: &[&str] = &[
    "Qr7Oae",
    "geS5n",
    "freebirdFormviewerComponentsQuestionBaseRoot",
];

/// Upper bound on element children for the text-plus-control rule.
pub const DEFAULT_MAX_SECTION_CHILDREN: usize = 15;

pub fn is_explicit_group(node: &SnapshotNode) -> bool {
    matches!(node.tag.as_str(), "form" | "fieldset")
        || matches!(node.role(), Some("group") | Some("radiogroup"))
        || FORM_GROUP_CLASSES.iter().any(|c| node.has_class(c))
}

pub fn is_question_container(node: &SnapshotNode) -> bool {
    QUESTION_CONTAINER_CLASSES.iter().any(|c| node.has_class(c))
        || node.role() == Some("listitem")
        || node
            .attr("class")
            .is_some_and(|c| c.to_lowercase().contains("question"))
}

fn holds_control(dom: &Dom, id: NodeId) -> bool {
    dom.descendants(id).into_iter().any(is_form_control)
}

/// Walks up from `id` (itself included) and returns the first node that is an
/// explicit group, a question container, or a small text-bearing node holding a
/// control. Falls back to the nearest ancestor holding any control, then the parent.
pub fn common_container(dom: &Dom, id: NodeId, max_children: usize) -> Option<NodeId> {
    let node = dom.node(id)?;
    let chain = std::iter::once(node).chain(dom.ancestors(id));

    let mut nearest_with_control = None;
    for candidate in chain {
        if !candidate.is_element() {
            continue;
        }
        let has_control = holds_control(dom, candidate.id);
        if has_control && nearest_with_control.is_none() {
            nearest_with_control = Some(candidate.id);
        }
        if is_explicit_group(candidate) || is_question_container(candidate) {
            return Some(candidate.id);
        }
        if has_control
            && !dom.text(candidate.id).is_empty()
            && dom.element_children(candidate.id).count() < max_children
        {
            return Some(candidate.id);
        }
    }

    nearest_with_control.or(node.parent)
}

/// Visible form controls inside `container`, in document order.
pub fn section_controls(dom: &Dom, container: NodeId) -> Vec<&SnapshotNode> {
    dom.descendants(container)
        .into_iter()
        .filter(|n| is_form_control(n) && is_visible(n))
        .collect()
}
