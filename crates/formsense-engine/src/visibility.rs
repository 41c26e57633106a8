use formsense_common::protocol::SnapshotNode;
use formsense_common::result::VisibilityReport;

/// A node is interactable when it is rendered, not hidden, not transparent,
/// laid out under an offset parent and has a non-empty box.
pub fn is_visible(node: &SnapshotNode) -> bool {
    node.is_element()
        && node.style.display != "none"
        && node.style.visibility != "hidden"
        && node.style.opacity > 0.0
        && node.offset_parent
        && node.rect.width > 0.0
        && node.rect.height > 0.0
}

pub fn visibility_report(node: &SnapshotNode) -> VisibilityReport {
    VisibilityReport {
        display: node.style.display.clone(),
        visibility: node.style.visibility.clone(),
        opacity: node.style.opacity,
        offset_parent: node.offset_parent,
        rect: node.rect,
        visible: is_visible(node),
    }
}
