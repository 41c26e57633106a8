//! A scripted page: answers the runtime protocol over an in-memory snapshot.
#![allow(dead_code)]

use async_trait::async_trait;
use formsense_engine::backend::{Backend, BackendError, Evaluation, NavigationResult, ScriptBridge};
use formsense_engine::dom::SnapshotBuilder;
use formsense_engine::protocol::{
    ApplyOutcome, DomStep, NodeId, NodeQuery, PageAction, PageData, PageResponse, PageSnapshot,
    PlannedStep, QueryMatch, SnapshotNode,
};
use serde_json::{Value, json};

pub struct FakePage {
    pub snapshot: PageSnapshot,
    pub installed: bool,
    pub injections: usize,
    pub snapshots_taken: usize,
    /// One entry per applied plan.
    pub applied: Vec<Vec<PlannedStep>>,
    /// Bump the epoch right after each snapshot, as if the page re-rendered.
    pub mutate_after_snapshot: bool,
    /// Make the next apply throw in page context.
    pub apply_throws: Option<String>,
    /// Make the next runtime call evaluate to null.
    pub null_once: bool,
    pub visited: Vec<String>,
}

impl FakePage {
    pub fn new(builder: &SnapshotBuilder) -> Self {
        Self {
            snapshot: builder.build(),
            installed: false,
            injections: 0,
            snapshots_taken: 0,
            applied: Vec::new(),
            mutate_after_snapshot: false,
            apply_throws: None,
            null_once: false,
            visited: Vec::new(),
        }
    }

    pub fn node(&self, id: NodeId) -> &SnapshotNode {
        &self.snapshot.nodes[id as usize]
    }

    pub fn value(&self, id: NodeId) -> Option<&str> {
        self.node(id).state.value.as_deref()
    }

    pub fn is_checked(&self, id: NodeId) -> bool {
        self.node(id).state.checked
    }

    /// Every step the page ran against `id`, across all plans.
    pub fn steps_for(&self, id: NodeId) -> Vec<DomStep> {
        self.applied
            .iter()
            .flatten()
            .filter(|s| s.node == id)
            .map(|s| s.step.clone())
            .collect()
    }

    fn respond(&mut self, action: PageAction) -> Evaluation {
        let response = match action {
            PageAction::Snapshot(request) => {
                self.snapshot.epoch += 1;
                self.snapshots_taken += 1;
                let mut snapshot = self.snapshot.clone();
                snapshot.query_matches = request
                    .queries
                    .iter()
                    .map(|q| self.answer(q))
                    .collect();
                if self.mutate_after_snapshot {
                    self.snapshot.epoch += 1;
                }
                PageResponse::Ok {
                    data: PageData::Snapshot(Box::new(snapshot)),
                    warnings: vec![],
                }
            }
            PageAction::Apply(request) => {
                if request.epoch != self.snapshot.epoch {
                    return Evaluation::Value(json!({
                        "status": "error",
                        "code": "ELEMENT_STALE",
                        "message": format!("epoch {} != {}", request.epoch, self.snapshot.epoch),
                        "details": {"id": request.steps.first().map(|s| s.node).unwrap_or(0)}
                    }));
                }
                if let Some(message) = self.apply_throws.take() {
                    return Evaluation::ScriptError(message);
                }
                let outcome = self.apply(&request.steps);
                self.applied.push(request.steps);
                PageResponse::Ok {
                    data: PageData::Applied(outcome),
                    warnings: vec![],
                }
            }
        };
        Evaluation::Value(serde_json::to_value(response).unwrap())
    }

    fn answer(&self, query: &NodeQuery) -> QueryMatch {
        match query {
            NodeQuery::Css(selector) => match parse_css(selector) {
                Some(parts) => QueryMatch {
                    nodes: self
                        .snapshot
                        .nodes
                        .iter()
                        .filter(|n| n.is_element() && parts.matches(n))
                        .map(|n| n.id)
                        .collect(),
                    error: None,
                },
                None => QueryMatch {
                    nodes: vec![],
                    error: Some(format!("'{}' is not a valid selector", selector)),
                },
            },
            NodeQuery::Xpath(path) => {
                let Some(rest) = path.strip_prefix("//*[@id=\"") else {
                    return QueryMatch {
                        nodes: vec![],
                        error: Some(format!("unsupported xpath {}", path)),
                    };
                };
                let id = rest.trim_end_matches("\"]");
                QueryMatch {
                    nodes: self
                        .snapshot
                        .nodes
                        .iter()
                        .filter(|n| n.attr("id") == Some(id))
                        .map(|n| n.id)
                        .collect(),
                    error: None,
                }
            }
        }
    }

    fn apply(&mut self, steps: &[PlannedStep]) -> ApplyOutcome {
        for planned in steps {
            let id = planned.node as usize;
            match &planned.step {
                DomStep::SetValue { value } => {
                    self.snapshot.nodes[id].state.value = Some(value.clone())
                }
                DomStep::SetTextContent { text } => {
                    self.snapshot.nodes[id].state.value = Some(text.clone())
                }
                DomStep::SetSelectedIndex { index } => {
                    let state = &mut self.snapshot.nodes[id].state;
                    state.selected_index = Some(*index);
                    state.value = state.options.get(*index).map(|o| o.value.clone());
                }
                DomStep::Click => self.click(planned.node),
                _ => {}
            }
        }

        let Some(last) = steps.last() else {
            return ApplyOutcome::default();
        };
        let node = &self.snapshot.nodes[last.node as usize];
        let selected = node
            .state
            .selected_index
            .and_then(|i| node.state.options.get(i));
        ApplyOutcome {
            applied: steps.len(),
            value: node.state.value.clone(),
            checked: Some(node.state.checked),
            selected_text: selected.map(|o| o.text.clone()),
            selected_value: selected.map(|o| o.value.clone()),
        }
    }

    fn click(&mut self, id: NodeId) {
        let node = &self.snapshot.nodes[id as usize];
        let is_radio = node.attr("type") == Some("radio") || node.attr("role") == Some("radio");
        if is_radio {
            let name = node.attr("name").map(str::to_string);
            for other in self.snapshot.nodes.iter_mut() {
                if name.is_some() && other.attr("name") == name.as_deref() {
                    other.state.checked = false;
                }
            }
            self.snapshot.nodes[id as usize].state.checked = true;
        } else if node.attr("type") == Some("checkbox") || node.attr("role") == Some("checkbox") {
            let state = &mut self.snapshot.nodes[id as usize].state;
            state.checked = !state.checked;
        }
    }
}

#[async_trait]
impl ScriptBridge for FakePage {
    async fn evaluate(&mut self, script: &str) -> Result<Evaluation, BackendError> {
        if script.starts_with("typeof window.FormSense") {
            return Ok(Evaluation::Value(Value::Bool(self.installed)));
        }
        let Some(payload) = script
            .strip_prefix("window.FormSense.process(")
            .and_then(|s| s.strip_suffix(')'))
        else {
            self.installed = true;
            self.injections += 1;
            return Ok(Evaluation::Null);
        };
        if std::mem::take(&mut self.null_once) {
            return Ok(Evaluation::Null);
        }
        let action: PageAction = serde_json::from_str(payload)?;
        Ok(self.respond(action))
    }
}

#[async_trait]
impl Backend for FakePage {
    async fn launch(&mut self) -> Result<(), BackendError> {
        Ok(())
    }

    async fn close(&mut self) -> Result<(), BackendError> {
        Ok(())
    }

    async fn is_ready(&self) -> bool {
        true
    }

    async fn navigate(&mut self, url: &str) -> Result<NavigationResult, BackendError> {
        self.visited.push(url.to_string());
        self.installed = false;
        Ok(NavigationResult {
            url: url.to_string(),
            title: "Fake".into(),
            status: 200,
        })
    }
}

/// `tag#id[attr="v"]...`, enough for the selectors the engine generates.
struct CssParts {
    tag: Option<String>,
    id: Option<String>,
    attrs: Vec<(String, String)>,
}

impl CssParts {
    fn matches(&self, node: &SnapshotNode) -> bool {
        self.tag.as_ref().is_none_or(|t| &node.tag == t)
            && self.id.as_ref().is_none_or(|id| node.attr("id") == Some(id))
            && self.attrs.iter().all(|(k, v)| node.attr(k) == Some(v))
    }
}

fn parse_css(selector: &str) -> Option<CssParts> {
    let selector = selector.trim();
    let head_end = selector.find('[').unwrap_or(selector.len());
    let (head, mut rest) = selector.split_at(head_end);

    let (tag, id) = match head.split_once('#') {
        Some((tag, id)) => (tag, Some(id.to_string())),
        None => (head, None),
    };
    let valid = |s: &str| s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid(tag) || id.as_deref().is_some_and(|i| i.is_empty() || !valid(i)) {
        return None;
    }
    if tag.is_empty() && id.is_none() && rest.is_empty() {
        return None;
    }
    if tag.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        return None;
    }

    let mut attrs = Vec::new();
    while let Some(body) = rest.strip_prefix('[') {
        let end = body.find(']')?;
        let (key, value) = body[..end].split_once('=')?;
        attrs.push((key.to_string(), value.trim_matches('"').to_string()));
        rest = &body[end + 1..];
    }
    if !rest.is_empty() {
        return None;
    }

    Some(CssParts {
        tag: (!tag.is_empty()).then(|| tag.to_lowercase()),
        id,
        attrs,
    })
}
