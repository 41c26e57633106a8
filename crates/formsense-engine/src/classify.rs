use formsense_common::protocol::{FieldType, SnapshotNode};

/// Input types that never take a value from the user.
const NON_FIELD_INPUT_TYPES: &[&str] = &["hidden", "submit", "button", "reset", "image"];

/// Elements whose text may name a nearby control.
const LABEL_LIKE_TAGS: &[&str] = &[
    "label", "h1", "h2", "h3", "h4", "h5", "h6", "p", "span", "div", "legend",
];

pub fn classify(node: &SnapshotNode) -> FieldType {
    if !node.is_element() {
        return FieldType::Unknown;
    }
    match node.tag.as_str() {
        "select" => FieldType::Select,
        "textarea" => FieldType::Textarea,
        "input" => FieldType::from(node.attr("type").unwrap_or("text").trim().to_string()),
        _ => match node.role() {
            Some("radio") => FieldType::Radio,
            Some("checkbox") => FieldType::Checkbox,
            _ if is_content_editable(node) => FieldType::ContentEditable,
            Some("textbox") => FieldType::ContentEditable,
            _ => FieldType::Unknown,
        },
    }
}

fn is_content_editable(node: &SnapshotNode) -> bool {
    node.attr("contenteditable")
        .is_some_and(|v| v.is_empty() || v.eq_ignore_ascii_case("true"))
}

/// A control that accepts user input.
pub fn is_form_control(node: &SnapshotNode) -> bool {
    if !node.is_element() {
        return false;
    }
    match node.tag.as_str() {
        "input" => {
            let kind = node.attr("type").unwrap_or("text").to_ascii_lowercase();
            !NON_FIELD_INPUT_TYPES.contains(&kind.as_str())
        }
        "select" | "textarea" => true,
        _ => classify(node) != FieldType::Unknown,
    }
}

/// Text-entry inputs and textareas.
pub fn is_plain_text_field(node: &SnapshotNode) -> bool {
    is_form_control(node) && classify(node).is_plain_text()
}

/// Radio buttons and checkboxes, native or ARIA.
pub fn is_choice_control(node: &SnapshotNode) -> bool {
    is_form_control(node) && classify(node).is_choice()
}

pub fn is_label_like(node: &SnapshotNode) -> bool {
    node.is_element() && (LABEL_LIKE_TAGS.contains(&node.tag.as_str()) || is_heading(node))
}

pub fn is_heading(node: &SnapshotNode) -> bool {
    matches!(node.tag.as_str(), "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
        || node.role() == Some("heading")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::SnapshotBuilder;

    fn classify_one(tag: &str, attrs: &[(&str, &str)]) -> (FieldType, bool) {
        let mut b = SnapshotBuilder::new();
        let body = b.body();
        let id = b.element(body, tag, attrs);
        let snap = b.build();
        let node = &snap.nodes[id as usize];
        (classify(node), is_form_control(node))
    }

    #[test]
    fn test_native_controls() {
        assert_eq!(classify_one("select", &[]), (FieldType::Select, true));
        assert_eq!(classify_one("textarea", &[]), (FieldType::Textarea, true));
        assert_eq!(classify_one("input", &[]), (FieldType::Text, true));
        assert_eq!(
            classify_one("input", &[("type", "checkbox")]),
            (FieldType::Checkbox, true)
        );
        assert_eq!(
            classify_one("input", &[("type", "date")]),
            (FieldType::Input("date".into()), true)
        );
        assert_eq!(
            classify_one("input", &[("type", "hidden")]),
            (FieldType::Input("hidden".into()), false)
        );
        assert!(!classify_one("input", &[("type", "submit")]).1);
    }

    #[test]
    fn test_editable_and_aria() {
        assert_eq!(
            classify_one("div", &[("contenteditable", "true")]),
            (FieldType::ContentEditable, true)
        );
        assert_eq!(
            classify_one("div", &[("role", "radio")]),
            (FieldType::Radio, true)
        );
        assert_eq!(
            classify_one("div", &[("role", "checkbox")]),
            (FieldType::Checkbox, true)
        );
        assert_eq!(
            classify_one("div", &[("role", "textbox")]),
            (FieldType::ContentEditable, true)
        );
        assert_eq!(classify_one("div", &[]), (FieldType::Unknown, false));
        assert_eq!(classify_one("button", &[]), (FieldType::Unknown, false));
    }

    #[test]
    fn test_label_like() {
        let mut b = SnapshotBuilder::new();
        let body = b.body();
        let span = b.element(body, "span", &[]);
        let heading = b.element(body, "section", &[("role", "heading")]);
        let input = b.element(body, "input", &[]);
        let snap = b.build();

        assert!(is_label_like(&snap.nodes[span as usize]));
        assert!(is_label_like(&snap.nodes[heading as usize]));
        assert!(is_heading(&snap.nodes[heading as usize]));
        assert!(!is_label_like(&snap.nodes[input as usize]));
    }
}
