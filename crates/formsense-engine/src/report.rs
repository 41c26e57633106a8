//! Packaging outcomes into `InteractionResult`s.

use crate::classify::classify;
use crate::dom::Dom;
use crate::interaction::{InteractionPlan, PlanError};
use crate::label::resolve_label;
use crate::page::EngineError;
use crate::resolution::locator::{css_selector, xpath};
use crate::visibility::visibility_report;
use formsense_common::protocol::{ApplyOutcome, NodeId, SnapshotNode};
use formsense_common::result::{
    ElementDebugInfo, FailureKind, InteractionOutcome, InteractionResult, MatchMethod, Operation,
};

const DEBUG_TEXT_LIMIT: usize = 200;

/// How the target was found: method, optional score, and the node's locator.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub method: MatchMethod,
    pub score: Option<u8>,
    pub locator: String,
}

impl Resolved {
    pub fn new(dom: &Dom, node: NodeId, method: MatchMethod, score: Option<u8>) -> Self {
        Self {
            method,
            score,
            locator: xpath(dom, node),
        }
    }

    fn stamp(&self, mut result: InteractionResult) -> InteractionResult {
        result = result.with_method(self.method).with_locator(self.locator.clone());
        match self.score {
            Some(score) => result.with_score(score),
            None => result,
        }
    }
}

pub fn field_not_found(operation: Operation, descriptor: &str) -> InteractionResult {
    InteractionResult::failed(
        operation,
        descriptor,
        FailureKind::NotFound,
        format!("Could not find field: {}", descriptor),
    )
}

pub fn element_not_found(operation: Operation, selector: &str) -> InteractionResult {
    InteractionResult::failed(
        operation,
        selector,
        FailureKind::NotFound,
        format!("Could not find element: {}", selector),
    )
}

pub fn engine_failure(operation: Operation, target: &str, err: &EngineError) -> InteractionResult {
    InteractionResult::failed(operation, target, err.failure_kind(), err.to_string())
}

pub fn plan_failure(
    operation: Operation,
    target: &str,
    resolved: &Resolved,
    err: &PlanError,
) -> InteractionResult {
    resolved.stamp(InteractionResult::failed(
        operation,
        target,
        err.failure_kind(),
        err.to_string(),
    ))
}

pub fn apply_failure(
    operation: Operation,
    target: &str,
    resolved: &Resolved,
    err: &EngineError,
) -> InteractionResult {
    resolved.stamp(engine_failure(operation, target, err))
}

/// Success for a plan whose steps ran (or were not needed). Read-back state
/// from the page overrides the planned outcome where present.
pub fn completed(
    operation: Operation,
    target: &str,
    resolved: &Resolved,
    plan: InteractionPlan,
    applied: Option<&ApplyOutcome>,
) -> InteractionResult {
    let outcome = match applied {
        Some(readback) => reconcile(plan.outcome, readback),
        None => plan.outcome,
    };
    resolved
        .stamp(InteractionResult::succeeded(operation, target))
        .with_outcome(outcome)
}

fn reconcile(planned: InteractionOutcome, readback: &ApplyOutcome) -> InteractionOutcome {
    match planned {
        InteractionOutcome::Filled { value } => InteractionOutcome::Filled {
            value: readback.value.clone().unwrap_or(value),
        },
        InteractionOutcome::Selected { text, value } => InteractionOutcome::Selected {
            text: readback.selected_text.clone().unwrap_or(text),
            value: readback.selected_value.clone().unwrap_or(value),
        },
        InteractionOutcome::Checkbox { checked, changed } => InteractionOutcome::Checkbox {
            checked: readback.checked.unwrap_or(checked),
            changed,
        },
        other => other,
    }
}

/// Everything `debug_element` reports about one node.
pub fn debug_info(dom: &Dom, id: NodeId, match_count: usize) -> Option<ElementDebugInfo> {
    let node = dom.node(id)?;
    let mut ancestors = Vec::new();
    for ancestor in dom.ancestors(id) {
        ancestors.push(describe(ancestor));
        if ancestor.tag == "body" {
            break;
        }
    }

    Some(ElementDebugInfo {
        tag: node.tag.clone(),
        id: node.attr("id").unwrap_or_default().to_string(),
        name: node.attr("name").unwrap_or_default().to_string(),
        classes: node.classes(),
        field_type: classify(node),
        label: resolve_label(dom, id),
        visibility: visibility_report(node),
        xpath: xpath(dom, id),
        selector: css_selector(dom, id),
        text: dom.text(id).chars().take(DEBUG_TEXT_LIMIT).collect(),
        value: node.state.value.clone(),
        checked: node.state.checked,
        attributes: node
            .attributes
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
        ancestors,
        match_count,
    })
}

/// `tag#id` or `tag.class.class`.
fn describe(node: &SnapshotNode) -> String {
    if let Some(id) = node.non_empty_attr("id") {
        return format!("{}#{}", node.tag, id);
    }
    let classes = node.classes();
    if classes.is_empty() {
        node.tag.clone()
    } else {
        format!("{}.{}", node.tag, classes.join("."))
    }
}
