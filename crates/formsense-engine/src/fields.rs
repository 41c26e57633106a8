//! Field detection and mapping: one `FieldMetadata` per visible field.

use crate::classify::{classify, is_form_control, is_heading, is_label_like};
use crate::config::ExampleValues;
use crate::dom::Dom;
use crate::interaction::{member_value, radio_group, select_options};
use crate::label::resolve_label;
use crate::resolution::locator::{css_selector, escape_css_string, xpath};
use crate::visibility::is_visible;
use formsense_common::protocol::{FieldMetadata, FieldType, NodeId, OptionEntry, SnapshotNode};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// "phone" anywhere, "tel" only as its own word (not "hotel", "telegram").
static PHONE_HINT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"phone|(?:^|[^a-z])tel(?:[^a-z]|$)").unwrap());

/// Visible fields in document order, paired with the node they were read from.
/// A radio group yields one field, anchored on its first member.
pub fn scan(dom: &Dom) -> Vec<(NodeId, FieldMetadata)> {
    let mut grouped: HashSet<NodeId> = HashSet::new();
    let mut fields = Vec::new();

    for node in dom.elements() {
        if grouped.contains(&node.id) || !is_form_control(node) || !is_visible(node) {
            continue;
        }
        if classify(node) == FieldType::Radio {
            let group = radio_group(dom, node.id);
            grouped.extend(group.iter().copied());
            fields.push((node.id, radio_field(dom, node, &group)));
        } else {
            fields.push((node.id, control_field(dom, node)));
        }
    }
    fields
}

pub fn detect(dom: &Dom) -> Vec<FieldMetadata> {
    scan(dom).into_iter().map(|(_, field)| field).collect()
}

/// Detected fields with a locator and a suggested value.
pub fn map(dom: &Dom, examples: &ExampleValues) -> Vec<FieldMetadata> {
    scan(dom)
        .into_iter()
        .map(|(id, mut field)| {
            field.xpath = Some(xpath(dom, id));
            field.example = Some(example_value(&field, examples));
            field
        })
        .collect()
}

fn is_required(node: &SnapshotNode) -> bool {
    node.attr("required").is_some() || node.attr("aria-required") == Some("true")
}

fn attr_string(node: &SnapshotNode, name: &str) -> String {
    node.attr(name).unwrap_or_default().to_string()
}

fn control_field(dom: &Dom, node: &SnapshotNode) -> FieldMetadata {
    let field_type = classify(node);
    let options = if field_type == FieldType::Select {
        select_options(dom, node)
    } else {
        Vec::new()
    };
    FieldMetadata {
        label: resolve_label(dom, node.id),
        name: attr_string(node, "name"),
        id: attr_string(node, "id"),
        field_type,
        required: is_required(node),
        placeholder: attr_string(node, "placeholder"),
        options,
        radio_options: Vec::new(),
        selector: css_selector(dom, node.id),
        xpath: None,
        example: None,
    }
}

fn radio_field(dom: &Dom, first: &SnapshotNode, group: &[NodeId]) -> FieldMetadata {
    let name = attr_string(first, "name");
    let container = lowest_common_ancestor(dom, group);

    let radio_options = group
        .iter()
        .map(|&m| {
            let value = member_value(dom, m);
            let text = Some(resolve_label(dom, m))
                .filter(|l| !l.is_empty())
                .unwrap_or_else(|| value.clone());
            OptionEntry::new(value, text)
        })
        .collect();

    let selector = if !name.is_empty() && first.tag == "input" {
        format!("input[type=\"radio\"][name=\"{}\"]", escape_css_string(&name))
    } else {
        container
            .map(|c| css_selector(dom, c))
            .unwrap_or_else(|| css_selector(dom, first.id))
    };

    FieldMetadata {
        label: container
            .map(|c| group_label(dom, c, group))
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| name.clone()),
        name,
        id: String::new(),
        field_type: FieldType::Radio,
        required: group
            .iter()
            .filter_map(|&m| dom.node(m))
            .any(is_required),
        placeholder: String::new(),
        options: Vec::new(),
        radio_options,
        selector,
        xpath: None,
        example: None,
    }
}

/// Deepest element that contains every member.
fn lowest_common_ancestor(dom: &Dom, group: &[NodeId]) -> Option<NodeId> {
    let (&first, rest) = group.split_first()?;
    dom.ancestors(first)
        .find(|a| rest.iter().all(|&m| dom.contains(a.id, m)))
        .map(|a| a.id)
}

/// Group caption: `aria-label`, then a legend or heading, then the closest
/// text-owning label-like element before the first member.
fn group_label(dom: &Dom, container: NodeId, group: &[NodeId]) -> String {
    if let Some(aria) = dom.node(container).and_then(|c| c.non_empty_attr("aria-label")) {
        return aria.trim().to_string();
    }

    let inside = dom.descendants(container);

    if let Some(caption) = inside
        .iter()
        .filter(|n| n.tag == "legend" || is_heading(n))
        .map(|n| dom.text(n.id))
        .find(|t| !t.is_empty())
    {
        return caption;
    }

    let Some(&first) = group.first() else {
        return String::new();
    };
    inside
        .iter()
        .take_while(|n| n.id != first)
        .filter(|n| is_label_like(n) && n.attr("for").is_none())
        .filter(|n| !group.iter().any(|&m| dom.contains(n.id, m)))
        .map(|n| dom.own_text(n.id))
        .filter(|t| !t.is_empty())
        .last()
        .unwrap_or_default()
}

/// Suggested value for a field, by type first and then label keywords.
pub fn example_value(field: &FieldMetadata, examples: &ExampleValues) -> String {
    match &field.field_type {
        FieldType::Checkbox => return examples.checkbox.clone(),
        FieldType::Radio => {
            if let Some(first) = field.radio_options.first() {
                return first.text.clone();
            }
        }
        FieldType::Select => {
            if let Some(option) = field
                .options
                .iter()
                .find(|o| !o.value.trim().is_empty() && !o.text.trim().is_empty())
            {
                return option.text.clone();
            }
        }
        FieldType::Input(kind) => match kind.as_str() {
            "number" | "range" => return examples.number.clone(),
            "date" => return examples.date.clone(),
            "email" => return examples.email.clone(),
            "tel" => return examples.phone.clone(),
            _ => {}
        },
        _ => {}
    }

    let hint = format!("{} {}", field.label, field.name).to_lowercase();
    if hint.contains("email") {
        examples.email.clone()
    } else if PHONE_HINT.is_match(&hint) {
        examples.phone.clone()
    } else if hint.contains("address") {
        examples.address.clone()
    } else if hint.contains("name") {
        examples.name.clone()
    } else {
        examples.text.clone()
    }
}
