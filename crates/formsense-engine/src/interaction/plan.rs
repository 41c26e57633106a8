//! Per-field-type step sequences.

use super::radio::{choose_member, member_value, radio_group};
use crate::classify::classify;
use crate::dom::{Dom, normalize_text};
use crate::label::resolve_label;
use formsense_common::protocol::{
    DomEvent, DomStep, FieldType, NodeId, OptionEntry, PlannedStep, SnapshotNode,
};
use formsense_common::result::{FailureKind, InteractionOutcome, MatchMethod};

const CHECK_TOKENS: &[&str] = &["true", "yes", "checked", "on"];
const UNCHECK_TOKENS: &[&str] = &["false", "no", "unchecked", "off"];

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlanError {
    #[error("Option '{value}' not found. Available: {}", .available.join(", "))]
    OptionNotFound {
        value: String,
        available: Vec<String>,
    },

    #[error("Unsupported field type '{field_type}' on <{tag}>")]
    Unsupported { field_type: FieldType, tag: String },

    #[error("Radio group is empty")]
    EmptyGroup,

    #[error("Node {0} is not in the snapshot")]
    MissingNode(NodeId),
}

impl PlanError {
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            PlanError::OptionNotFound { .. } => FailureKind::OptionNotFound,
            PlanError::Unsupported { .. } => FailureKind::UnsupportedField,
            PlanError::EmptyGroup | PlanError::MissingNode(_) => FailureKind::NotFound,
        }
    }
}

/// Steps to run against one snapshot, plus the outcome they should produce.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionPlan {
    /// Node the steps act on (the chosen member for radio groups).
    pub target: NodeId,
    pub steps: Vec<PlannedStep>,
    pub outcome: InteractionOutcome,
}

impl InteractionPlan {
    /// True when the control is already in the requested state.
    pub fn is_noop(&self) -> bool {
        self.steps.is_empty()
    }
}

struct Steps {
    node: NodeId,
    steps: Vec<PlannedStep>,
}

impl Steps {
    /// Scroll into view, then focus.
    fn entry(node: NodeId) -> Self {
        Self {
            node,
            steps: vec![
                PlannedStep::new(node, DomStep::ScrollIntoView),
                PlannedStep::new(node, DomStep::Focus),
            ],
        }
    }

    fn push(mut self, step: DomStep) -> Self {
        self.steps.push(PlannedStep::new(self.node, step));
        self
    }

    fn event(self, event: DomEvent) -> Self {
        self.push(DomStep::Dispatch { event })
    }

    /// input, change, blur.
    fn finish(self) -> Vec<PlannedStep> {
        self.event(DomEvent::Input)
            .event(DomEvent::Change)
            .event(DomEvent::Blur)
            .steps
    }
}

/// Interpret a checkbox value. Unrecognized values toggle the current state.
pub fn checkbox_target(value: &str, current: bool) -> bool {
    let token = normalize_text(value);
    if CHECK_TOKENS.contains(&token.as_str()) {
        true
    } else if UNCHECK_TOKENS.contains(&token.as_str()) {
        false
    } else {
        !current
    }
}

/// Plan a value-driven fill for whatever kind of control `id` is.
pub fn plan_fill(dom: &Dom, id: NodeId, value: &str) -> Result<InteractionPlan, PlanError> {
    let node = dom.node(id).ok_or(PlanError::MissingNode(id))?;
    match classify(node) {
        FieldType::Select => plan_select(dom, node, value),
        FieldType::Checkbox => Ok(plan_checkbox(node, checkbox_target(value, node.state.checked))),
        FieldType::Radio => plan_radio(dom, &radio_group(dom, id), Some(value)),
        FieldType::ContentEditable => Ok(plan_content_editable(node, value)),
        FieldType::Text | FieldType::Textarea | FieldType::Input(_) => Ok(plan_text(node, value)),
        FieldType::Unknown => Err(PlanError::Unsupported {
            field_type: FieldType::Unknown,
            tag: node.tag.clone(),
        }),
    }
}

/// Clear, then set the value so frameworks observe both edits.
pub fn plan_text(node: &SnapshotNode, value: &str) -> InteractionPlan {
    let steps = Steps::entry(node.id)
        .push(DomStep::SetValue {
            value: String::new(),
        })
        .event(DomEvent::Input)
        .push(DomStep::SetValue {
            value: value.to_string(),
        })
        .finish();
    InteractionPlan {
        target: node.id,
        steps,
        outcome: InteractionOutcome::Filled {
            value: value.to_string(),
        },
    }
}

pub fn plan_content_editable(node: &SnapshotNode, value: &str) -> InteractionPlan {
    let steps = Steps::entry(node.id)
        .push(DomStep::SetTextContent {
            text: value.to_string(),
        })
        .finish();
    InteractionPlan {
        target: node.id,
        steps,
        outcome: InteractionOutcome::Filled {
            value: value.to_string(),
        },
    }
}

/// Choose the first option whose text contains `value` or whose value equals it.
pub fn plan_select(
    dom: &Dom,
    node: &SnapshotNode,
    value: &str,
) -> Result<InteractionPlan, PlanError> {
    if classify(node) != FieldType::Select {
        return Err(PlanError::Unsupported {
            field_type: classify(node),
            tag: node.tag.clone(),
        });
    }

    let options = select_options(dom, node);
    let wanted = normalize_text(value);
    let Some((index, option)) = options.iter().enumerate().find(|(_, o)| {
        normalize_text(&o.text).contains(&wanted) || normalize_text(&o.value) == wanted
    }) else {
        return Err(PlanError::OptionNotFound {
            value: value.to_string(),
            available: options.iter().map(|o| o.text.clone()).collect(),
        });
    };

    let steps = Steps::entry(node.id)
        .push(DomStep::SetSelectedIndex { index })
        .event(DomEvent::Change)
        .steps;
    Ok(InteractionPlan {
        target: node.id,
        steps,
        outcome: InteractionOutcome::Selected {
            text: option.text.clone(),
            value: option.value.clone(),
        },
    })
}

/// Options reported with the select's form state, else read from `<option>` children.
pub fn select_options(dom: &Dom, node: &SnapshotNode) -> Vec<OptionEntry> {
    if !node.state.options.is_empty() {
        return node.state.options.clone();
    }
    dom.descendants(node.id)
        .into_iter()
        .filter(|n| n.tag == "option")
        .map(|n| {
            let text = dom.text(n.id);
            let value = n.attr("value").map(str::to_string).unwrap_or_else(|| text.clone());
            OptionEntry::new(value, text)
        })
        .collect()
}

/// Click only when the current state differs from `checked`.
pub fn plan_checkbox(node: &SnapshotNode, checked: bool) -> InteractionPlan {
    let changed = node.state.checked != checked;
    let steps = if changed {
        Steps::entry(node.id).push(DomStep::Click).finish()
    } else {
        Vec::new()
    };
    InteractionPlan {
        target: node.id,
        steps,
        outcome: InteractionOutcome::Checkbox { checked, changed },
    }
}

/// Pick a member of `group` and click it unless it is already checked.
pub fn plan_radio(
    dom: &Dom,
    group: &[NodeId],
    value: Option<&str>,
) -> Result<InteractionPlan, PlanError> {
    let (member, matched_by) = choose_member(dom, group, value).ok_or(PlanError::EmptyGroup)?;
    let already = dom.node(member).is_some_and(|n| n.state.checked);

    let mut steps = Steps::entry(member);
    if !already {
        steps = steps.push(DomStep::Click);
    }
    Ok(InteractionPlan {
        target: member,
        steps: steps.finish(),
        outcome: InteractionOutcome::Radio {
            value: member_value(dom, member),
            label: resolve_label(dom, member),
            matched_by,
        },
    })
}

pub fn plan_click(node: &SnapshotNode) -> InteractionPlan {
    InteractionPlan {
        target: node.id,
        steps: vec![
            PlannedStep::new(node.id, DomStep::ScrollIntoView),
            PlannedStep::new(node.id, DomStep::Click),
        ],
        outcome: InteractionOutcome::Clicked {
            tag: node.tag.clone(),
        },
    }
}

/// Submit `node` (a form) or click it (a submit control). `form` names the owning form.
pub fn plan_submit(node: &SnapshotNode, form: Option<String>) -> InteractionPlan {
    InteractionPlan {
        target: node.id,
        steps: vec![PlannedStep::new(node.id, DomStep::Submit)],
        outcome: InteractionOutcome::Submitted { form },
    }
}

/// The method reported for a plan: radio plans report how the member was chosen.
pub fn member_method(plan: &InteractionPlan) -> Option<MatchMethod> {
    match &plan.outcome {
        InteractionOutcome::Radio { matched_by, .. } => Some(*matched_by),
        _ => None,
    }
}
