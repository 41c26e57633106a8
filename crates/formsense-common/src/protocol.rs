use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Index of a node inside one [`PageSnapshot`]. Only meaningful for the
/// snapshot epoch that produced it.
pub type NodeId = u32;

/// Custom deserializer for HashMap<String, String> that filters out null values.
/// The page runtime reports missing attributes as null.
fn deserialize_nullable_string_map<'de, D>(
    deserializer: D,
) -> Result<HashMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let map: HashMap<String, Option<String>> = HashMap::deserialize(deserializer)?;
    Ok(map
        .into_iter()
        .filter_map(|(k, v)| v.map(|val| (k, val)))
        .collect())
}

/// Actions executed by the page runtime (`window.FormSense.process`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PageAction {
    Snapshot(SnapshotRequest),
    Apply(ApplyRequest),
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SnapshotRequest {
    /// Selector queries answered against the same node registry.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub queries: Vec<NodeQuery>,
}

impl SnapshotRequest {
    pub fn with_query(query: NodeQuery) -> Self {
        Self {
            queries: vec![query],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "expr", rename_all = "snake_case")]
pub enum NodeQuery {
    Css(String),
    Xpath(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyRequest {
    pub epoch: u64,
    pub steps: Vec<PlannedStep>,
}

/// One DOM mutation or synthetic event aimed at a snapshot node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedStep {
    pub node: NodeId,
    pub step: DomStep,
}

impl PlannedStep {
    pub fn new(node: NodeId, step: DomStep) -> Self {
        Self { node, step }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DomStep {
    ScrollIntoView,
    Focus,
    SetValue { value: String },
    SetSelectedIndex { index: usize },
    SetTextContent { text: String },
    Click,
    Dispatch { event: DomEvent },
    Submit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DomEvent {
    Input,
    Change,
    Blur,
}

impl DomEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            DomEvent::Input => "input",
            DomEvent::Change => "change",
            DomEvent::Blur => "blur",
        }
    }
}

/// Responses received from the page runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PageResponse {
    Ok {
        data: PageData,
        #[serde(default)]
        warnings: Vec<String>,
    },
    Error {
        code: String,
        message: String,
        #[serde(default)]
        details: Option<serde_json::Value>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PageData {
    Snapshot(Box<PageSnapshot>),
    Applied(ApplyOutcome),
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PageSnapshot {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    pub epoch: u64,
    pub nodes: Vec<SnapshotNode>,
    #[serde(default)]
    pub query_matches: Vec<QueryMatch>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct QueryMatch {
    #[serde(default)]
    pub nodes: Vec<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    #[default]
    Element,
    Text,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotNode {
    pub id: NodeId,
    #[serde(default)]
    pub kind: NodeKind,
    /// Lower-cased tag name; empty for text nodes.
    #[serde(default)]
    pub tag: String,
    /// Character data of a text node.
    #[serde(default)]
    pub text: String,
    #[serde(default, deserialize_with = "deserialize_nullable_string_map")]
    pub attributes: HashMap<String, String>,
    #[serde(default)]
    pub parent: Option<NodeId>,
    #[serde(default)]
    pub children: Vec<NodeId>,
    #[serde(default)]
    pub style: ComputedStyle,
    #[serde(default)]
    pub rect: Rect,
    #[serde(default)]
    pub offset_parent: bool,
    #[serde(default)]
    pub state: FormState,
}

impl SnapshotNode {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Attribute value, treating empty strings as absent.
    pub fn non_empty_attr(&self, name: &str) -> Option<&str> {
        self.attr(name).filter(|v| !v.trim().is_empty())
    }

    pub fn is_element(&self) -> bool {
        self.kind == NodeKind::Element
    }

    pub fn is_text(&self) -> bool {
        self.kind == NodeKind::Text
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|c| c.split_whitespace().any(|token| token == class))
    }

    pub fn classes(&self) -> Vec<String> {
        self.attr("class")
            .map(|c| c.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn role(&self) -> Option<&str> {
        self.attr("role")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComputedStyle {
    pub display: String,
    pub visibility: String,
    pub opacity: f32,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            display: "block".into(),
            visibility: "visible".into(),
            opacity: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Width of the shared horizontal span of two boxes (0 when disjoint).
    pub fn horizontal_overlap(&self, other: &Rect) -> f32 {
        (self.right().min(other.right()) - self.x.max(other.x)).max(0.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FormState {
    pub value: Option<String>,
    pub checked: bool,
    pub selected_index: Option<usize>,
    pub options: Vec<OptionEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionEntry {
    pub value: String,
    pub text: String,
}

impl OptionEntry {
    pub fn new(value: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            text: text.into(),
        }
    }
}

/// State read back from the page after a plan was applied.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ApplyOutcome {
    pub applied: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_value: Option<String>,
}

/// Semantic kind of a form field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum FieldType {
    Text,
    Textarea,
    Select,
    Checkbox,
    Radio,
    ContentEditable,
    /// Any other `<input type=...>` kept verbatim (email, number, date, ...).
    Input(String),
    Unknown,
}

/// Input types that accept free text entry.
const TEXT_ENTRY_INPUT_TYPES: &[&str] = &["email", "tel", "url", "search", "password", "number"];

impl FieldType {
    pub fn as_str(&self) -> &str {
        match self {
            FieldType::Text => "text",
            FieldType::Textarea => "textarea",
            FieldType::Select => "select",
            FieldType::Checkbox => "checkbox",
            FieldType::Radio => "radio",
            FieldType::ContentEditable => "contenteditable",
            FieldType::Input(kind) => kind.as_str(),
            FieldType::Unknown => "unknown",
        }
    }

    pub fn is_choice(&self) -> bool {
        matches!(self, FieldType::Checkbox | FieldType::Radio)
    }

    /// Plain text fields: free-text inputs and textareas.
    pub fn is_plain_text(&self) -> bool {
        match self {
            FieldType::Text | FieldType::Textarea => true,
            FieldType::Input(kind) => TEXT_ENTRY_INPUT_TYPES.contains(&kind.as_str()),
            _ => false,
        }
    }
}

impl From<String> for FieldType {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "" | "text" => FieldType::Text,
            "textarea" => FieldType::Textarea,
            "select" | "select-one" | "select-multiple" => FieldType::Select,
            "checkbox" => FieldType::Checkbox,
            "radio" => FieldType::Radio,
            "contenteditable" => FieldType::ContentEditable,
            "unknown" => FieldType::Unknown,
            other => FieldType::Input(other.to_string()),
        }
    }
}

impl From<FieldType> for String {
    fn from(value: FieldType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Description of one visible form field, produced by detection and mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMetadata {
    pub label: String,
    pub name: String,
    pub id: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub required: bool,
    pub placeholder: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<OptionEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub radio_options: Vec<OptionEntry>,
    pub selector: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xpath: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
}
