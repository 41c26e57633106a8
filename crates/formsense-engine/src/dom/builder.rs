use formsense_common::protocol::{
    ComputedStyle, FormState, NodeId, NodeKind, OptionEntry, PageSnapshot, Rect, SnapshotNode,
};
use std::collections::HashMap;

const ROW_HEIGHT: f32 = 30.0;

/// Assembles a [`PageSnapshot`] by hand.
///
/// Nodes get a visible block layout by default: each element occupies its own row, in
/// creation order, 200x20 px with a non-null offset parent.
#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
    nodes: Vec<SnapshotNode>,
    epoch: u64,
    url: String,
}

impl Default for SnapshotBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotBuilder {
    /// Starts a document containing a single `<body>` (node 0).
    pub fn new() -> Self {
        let body = SnapshotNode {
            id: 0,
            kind: NodeKind::Element,
            tag: "body".into(),
            text: String::new(),
            attributes: HashMap::new(),
            parent: None,
            children: vec![],
            style: ComputedStyle::default(),
            rect: Rect::new(0.0, 0.0, 800.0, 600.0),
            offset_parent: false,
            state: FormState::default(),
        };
        Self {
            nodes: vec![body],
            epoch: 1,
            url: "about:blank".into(),
        }
    }

    pub fn body(&self) -> NodeId {
        0
    }

    pub fn epoch(mut self, epoch: u64) -> Self {
        self.epoch = epoch;
        self
    }

    pub fn url(mut self, url: &str) -> Self {
        self.url = url.to_string();
        self
    }

    pub fn element(&mut self, parent: NodeId, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
        let id = self.nodes.len() as NodeId;
        let attributes = attrs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.nodes.push(SnapshotNode {
            id,
            kind: NodeKind::Element,
            tag: tag.to_lowercase(),
            text: String::new(),
            attributes,
            parent: Some(parent),
            children: vec![],
            style: ComputedStyle::default(),
            rect: Rect::new(10.0, id as f32 * ROW_HEIGHT, 200.0, 20.0),
            offset_parent: true,
            state: FormState::default(),
        });
        self.nodes[parent as usize].children.push(id);
        id
    }

    pub fn text(&mut self, parent: NodeId, text: &str) -> NodeId {
        let id = self.nodes.len() as NodeId;
        self.nodes.push(SnapshotNode {
            id,
            kind: NodeKind::Text,
            tag: String::new(),
            text: text.to_string(),
            attributes: HashMap::new(),
            parent: Some(parent),
            children: vec![],
            style: ComputedStyle::default(),
            rect: Rect::default(),
            offset_parent: false,
            state: FormState::default(),
        });
        self.nodes[parent as usize].children.push(id);
        id
    }

    /// An element holding a single text child.
    pub fn text_element(
        &mut self,
        parent: NodeId,
        tag: &str,
        attrs: &[(&str, &str)],
        text: &str,
    ) -> NodeId {
        let id = self.element(parent, tag, attrs);
        self.text(id, text);
        id
    }

    /// Adds `<option>` children and mirrors them into the select's form state.
    pub fn options(&mut self, select: NodeId, options: &[(&str, &str)]) -> &mut Self {
        for (value, text) in options {
            let opt = self.text_element(select, "option", &[("value", *value)], text);
            let node = &mut self.nodes[opt as usize];
            node.rect = Rect::default();
            node.offset_parent = false;
        }
        let state = &mut self.nodes[select as usize].state;
        state.options = options
            .iter()
            .map(|(value, text)| OptionEntry::new(*value, *text))
            .collect();
        if !options.is_empty() {
            state.selected_index = Some(0);
            state.value = Some(options[0].0.to_string());
        }
        self
    }

    pub fn value(&mut self, id: NodeId, value: &str) -> &mut Self {
        self.nodes[id as usize].state.value = Some(value.to_string());
        self
    }

    pub fn checked(&mut self, id: NodeId, checked: bool) -> &mut Self {
        self.nodes[id as usize].state.checked = checked;
        self
    }

    pub fn rect(&mut self, id: NodeId, rect: Rect) -> &mut Self {
        self.nodes[id as usize].rect = rect;
        self
    }

    pub fn style(&mut self, id: NodeId, display: &str, visibility: &str, opacity: f32) -> &mut Self {
        self.nodes[id as usize].style = ComputedStyle {
            display: display.to_string(),
            visibility: visibility.to_string(),
            opacity,
        };
        self
    }

    /// Marks the node `display: none` with an empty box, as browsers report it.
    pub fn hidden(&mut self, id: NodeId) -> &mut Self {
        let node = &mut self.nodes[id as usize];
        node.style.display = "none".into();
        node.rect = Rect::default();
        node.offset_parent = false;
        self
    }

    pub fn build(&self) -> PageSnapshot {
        PageSnapshot {
            url: self.url.clone(),
            title: String::new(),
            epoch: self.epoch,
            nodes: self.nodes.clone(),
            query_matches: vec![],
        }
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut SnapshotNode> {
        self.nodes.get_mut(id as usize)
    }
}
