//! Radio groups and member choice.

use crate::classify::classify;
use crate::dom::{Dom, normalize_text};
use crate::label::resolve_label;
use formsense_common::protocol::{FieldType, NodeId, SnapshotNode};
use formsense_common::result::MatchMethod;

fn is_radio(node: &SnapshotNode) -> bool {
    classify(node) == FieldType::Radio
}

/// Members of the group `id` belongs to, in document order.
///
/// Native radios group by `name` within their form (or the whole document when
/// formless). ARIA radios and unnamed inputs group by the nearest
/// `role=radiogroup` or `<form>` ancestor.
pub fn radio_group(dom: &Dom, id: NodeId) -> Vec<NodeId> {
    let Some(node) = dom.node(id) else {
        return Vec::new();
    };

    if node.tag == "input"
        && let Some(name) = node.non_empty_attr("name")
    {
        let form = dom.ancestors(id).find(|a| a.tag == "form").map(|f| f.id);
        return dom
            .elements()
            .filter(|n| n.tag == "input" && is_radio(n) && n.attr("name") == Some(name))
            .filter(|n| form.is_none_or(|f| dom.contains(f, n.id)))
            .map(|n| n.id)
            .collect();
    }

    match dom
        .ancestors(id)
        .find(|a| a.role() == Some("radiogroup") || a.tag == "form")
    {
        Some(scope) => radios_within(dom, scope.id),
        None => vec![id],
    }
}

/// Radio controls below `scope`, in document order.
pub fn radios_within(dom: &Dom, scope: NodeId) -> Vec<NodeId> {
    dom.descendants(scope)
        .into_iter()
        .filter(|n| is_radio(n))
        .map(|n| n.id)
        .collect()
}

/// Submitted value of a member: `value`, then `data-value`, then its label.
pub fn member_value(dom: &Dom, id: NodeId) -> String {
    dom.node(id)
        .and_then(|n| n.non_empty_attr("value").or_else(|| n.non_empty_attr("data-value")))
        .map(str::to_string)
        .unwrap_or_else(|| resolve_label(dom, id))
}

/// Pick the member to check. Tried in order, case-insensitive:
/// `value`/`data-value` equality, label containment, nearby text containment.
/// An empty or unmatched value selects the first member.
pub fn choose_member(
    dom: &Dom,
    group: &[NodeId],
    value: Option<&str>,
) -> Option<(NodeId, MatchMethod)> {
    let first = *group.first()?;
    let Some(wanted) = value.map(normalize_text).filter(|v| !v.is_empty()) else {
        return Some((first, MatchMethod::RadioDefaultFirst));
    };

    let by_value = group.iter().copied().find(|&m| {
        dom.node(m).is_some_and(|n| {
            ["value", "data-value"]
                .iter()
                .any(|attr| n.attr(attr).is_some_and(|v| normalize_text(v) == wanted))
        })
    });
    if let Some(m) = by_value {
        return Some((m, MatchMethod::RadioValueMatch));
    }

    if let Some(m) = group
        .iter()
        .copied()
        .find(|&m| normalize_text(&resolve_label(dom, m)).contains(&wanted))
    {
        return Some((m, MatchMethod::RadioLabelMatch));
    }

    if let Some(m) = group
        .iter()
        .copied()
        .find(|&m| normalize_text(&nearby_text(dom, group, m)).contains(&wanted))
    {
        return Some((m, MatchMethod::RadioContainerTextMatch));
    }

    Some((first, MatchMethod::RadioDefaultFirst))
}

/// Text of the highest ancestor of `member` that holds no other group member.
fn nearby_text(dom: &Dom, group: &[NodeId], member: NodeId) -> String {
    let mut widest = None;
    for ancestor in dom.ancestors(member) {
        if group
            .iter()
            .any(|&other| other != member && dom.contains(ancestor.id, other))
        {
            break;
        }
        widest = Some(ancestor.id);
    }
    widest.map(|id| dom.text(id)).unwrap_or_default()
}
