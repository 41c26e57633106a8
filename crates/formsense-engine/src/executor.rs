//! `FormEngine`: form operations over a script-evaluation bridge.
//!
//! Every operation follows the same pipeline:
//! snapshot → resolve → plan → apply → report
//!
//! Each target gets its own snapshot; node ids never outlive the operation
//! that obtained them. Failures are returned as unsuccessful
//! `InteractionResult`s, never as errors.

use crate::backend::ScriptBridge;
use crate::classify::classify;
use crate::config::FormSenseConfig;
use crate::dom::{Dom, normalize_text};
use crate::fields;
use crate::interaction::{
    InteractionPlan, PlanError, member_method, plan_checkbox, plan_click, plan_fill, plan_radio,
    plan_select, plan_submit, radio_group, radios_within,
};
use crate::page::{self, EngineError};
use crate::report::{self, Resolved};
use crate::resolution::FieldResolver;
use crate::visibility::is_visible;
use formsense_common::formatter::mask_sensitive;
use formsense_common::protocol::{FieldMetadata, FieldType, NodeId, NodeQuery, SnapshotNode};
use formsense_common::result::{
    Confidence, FailureKind, InteractionOutcome, InteractionResult, MatchMethod, Operation,
};
use tracing::{debug, info, warn};

/// What a selector is expected to name. Field lookups fall back to descriptor
/// resolution; radio lookups may also name a whole group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lookup {
    Element,
    Field,
    Radio,
}

struct Located {
    dom: Dom,
    nodes: Vec<NodeId>,
    method: MatchMethod,
    score: Option<u8>,
}

impl Located {
    /// Lookups never produce an empty match list.
    fn first(&self) -> NodeId {
        self.nodes[0]
    }

    /// First node passing `pred`, searching matches and then their descendants.
    fn find(&self, pred: impl Fn(&SnapshotNode) -> bool) -> Option<NodeId> {
        let matched = self.nodes.iter().filter_map(|&n| self.dom.node(n));
        let nested = self
            .nodes
            .iter()
            .flat_map(|&n| self.dom.descendants(n));
        matched.chain(nested).find(|n| pred(*n)).map(|n| n.id)
    }
}

pub struct FormEngine {
    config: FormSenseConfig,
    resolver: FieldResolver,
    last_fields: Option<Vec<FieldMetadata>>,
}

impl Default for FormEngine {
    fn default() -> Self {
        Self::new(FormSenseConfig::default())
    }
}

impl FormEngine {
    pub fn new(config: FormSenseConfig) -> Self {
        let resolver = FieldResolver::new(config.engine.max_section_children);
        Self {
            config,
            resolver,
            last_fields: None,
        }
    }

    pub fn with_resolver(mut self, resolver: FieldResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn config(&self) -> &FormSenseConfig {
        &self.config
    }

    /// Fields from the most recent detect/map call. Not refreshed on page changes.
    pub fn last_fields(&self) -> Option<&[FieldMetadata]> {
        self.last_fields.as_deref()
    }

    pub async fn detect_fields<B: ScriptBridge + ?Sized>(
        &mut self,
        bridge: &mut B,
    ) -> Result<Vec<FieldMetadata>, EngineError> {
        let dom = page::snapshot(bridge, Vec::new()).await?;
        let detected = fields::detect(&dom);
        info!(url = dom.url(), count = detected.len(), "detected fields");
        self.last_fields = Some(detected.clone());
        Ok(detected)
    }

    pub async fn map_fields<B: ScriptBridge + ?Sized>(
        &mut self,
        bridge: &mut B,
    ) -> Result<Vec<FieldMetadata>, EngineError> {
        let dom = page::snapshot(bridge, Vec::new()).await?;
        let mapped = fields::map(&dom, &self.config.examples);
        info!(url = dom.url(), count = mapped.len(), "mapped fields");
        self.last_fields = Some(mapped.clone());
        Ok(mapped)
    }

    /// Fill each `(descriptor, value)` pair in order. A failed field does not
    /// stop the ones after it.
    pub async fn fill_form<B: ScriptBridge + ?Sized>(
        &self,
        bridge: &mut B,
        values: &[(String, String)],
    ) -> Vec<InteractionResult> {
        let mut results = Vec::with_capacity(values.len());
        for (descriptor, value) in values {
            let result = self.fill_field(bridge, descriptor, value).await;
            self.log_result(&result, Some(value));
            results.push(result);
        }
        results
    }

    async fn fill_field<B: ScriptBridge + ?Sized>(
        &self,
        bridge: &mut B,
        descriptor: &str,
        value: &str,
    ) -> InteractionResult {
        let op = Operation::Fill;
        let dom = match page::snapshot(bridge, Vec::new()).await {
            Ok(dom) => dom,
            Err(e) => return report::engine_failure(op, descriptor, &e),
        };
        let Some(candidate) = self.resolver.resolve(&dom, descriptor) else {
            return report::field_not_found(op, descriptor);
        };

        let plan = plan_fill(&dom, candidate.node, value);
        let node = plan.as_ref().map_or(candidate.node, |p| p.target);
        let resolved = Resolved::new(&dom, node, candidate.method, Some(candidate.score));
        self.run_plan(bridge, dom.epoch(), op, descriptor, &resolved, plan)
            .await
    }

    /// Fill each `(xpath, value)` pair in order.
    pub async fn fill_by_xpath<B: ScriptBridge + ?Sized>(
        &self,
        bridge: &mut B,
        values: &[(String, String)],
    ) -> Vec<InteractionResult> {
        let mut results = Vec::with_capacity(values.len());
        for (path, value) in values {
            let result = self.fill_xpath(bridge, path, value).await;
            self.log_result(&result, Some(value));
            results.push(result);
        }
        results
    }

    async fn fill_xpath<B: ScriptBridge + ?Sized>(
        &self,
        bridge: &mut B,
        path: &str,
        value: &str,
    ) -> InteractionResult {
        let op = Operation::FillXpath;
        let dom = match page::snapshot(bridge, vec![NodeQuery::Xpath(path.to_string())]).await {
            Ok(dom) => dom,
            Err(e) => return report::engine_failure(op, path, &e),
        };
        let matched = dom.query_match(0);
        if let Some(err) = matched.and_then(|m| m.error.as_deref()) {
            return report::element_not_found(op, path)
                .with_message(format!("Could not find element: {} ({})", path, err));
        }
        let Some(&node) = matched.and_then(|m| m.nodes.first()) else {
            return report::element_not_found(op, path);
        };

        let plan = plan_fill(&dom, node, value);
        let target = plan.as_ref().map_or(node, |p| p.target);
        let resolved = Resolved::new(&dom, target, MatchMethod::Xpath, None);
        self.run_plan(bridge, dom.epoch(), op, path, &resolved, plan)
            .await
    }

    pub async fn select_option<B: ScriptBridge + ?Sized>(
        &self,
        bridge: &mut B,
        selector: &str,
        value: &str,
    ) -> InteractionResult {
        let op = Operation::Select;
        let result = match self.locate(bridge, op, selector, Lookup::Field).await {
            Ok(located) => {
                let node = located
                    .find(|n| classify(n) == FieldType::Select)
                    .unwrap_or(located.first());
                let dom = &located.dom;
                let plan = match dom.node(node) {
                    Some(n) => plan_select(dom, n, value),
                    None => Err(PlanError::MissingNode(node)),
                };
                let resolved = Resolved::new(dom, node, located.method, located.score);
                self.run_plan(bridge, dom.epoch(), op, selector, &resolved, plan)
                    .await
            }
            Err(failure) => failure,
        };
        self.log_result(&result, Some(value));
        result
    }

    /// Check one radio of the group named by `selector`. `value` picks the
    /// member; without it the first member is checked.
    pub async fn check_radio<B: ScriptBridge + ?Sized>(
        &self,
        bridge: &mut B,
        selector: &str,
        value: Option<&str>,
    ) -> InteractionResult {
        let op = Operation::Radio;
        let result = match self.locate(bridge, op, selector, Lookup::Radio).await {
            Ok(located) => {
                let dom = &located.dom;
                let first = located.first();
                let group = match dom.node(first) {
                    Some(n) if classify(n) == FieldType::Radio => radio_group(dom, first),
                    _ => radios_within(dom, first),
                };
                debug!(selector, via = %located.method, members = group.len(), "radio group");

                let plan = plan_radio(dom, &group, value);
                let node = plan.as_ref().map_or(first, |p| p.target);
                let method = plan
                    .as_ref()
                    .ok()
                    .and_then(member_method)
                    .unwrap_or(located.method);
                let resolved = Resolved::new(dom, node, method, located.score);
                self.run_plan(bridge, dom.epoch(), op, selector, &resolved, plan)
                    .await
            }
            Err(failure) => failure,
        };
        self.log_result(&result, value);
        result
    }

    /// Bring a checkbox to `checked`. Already in that state → no events.
    pub async fn check_checkbox<B: ScriptBridge + ?Sized>(
        &self,
        bridge: &mut B,
        selector: &str,
        checked: bool,
    ) -> InteractionResult {
        let op = Operation::Checkbox;
        let result = match self.locate(bridge, op, selector, Lookup::Field).await {
            Ok(located) => {
                let dom = &located.dom;
                match located
                    .find(|n| classify(n) == FieldType::Checkbox)
                    .and_then(|id| dom.node(id))
                {
                    Some(node) => {
                        let resolved =
                            Resolved::new(dom, node.id, located.method, located.score);
                        let plan = Ok(plan_checkbox(node, checked));
                        self.run_plan(bridge, dom.epoch(), op, selector, &resolved, plan)
                            .await
                    }
                    None => InteractionResult::failed(
                        op,
                        selector,
                        FailureKind::UnsupportedField,
                        format!("Element is not a checkbox: {}", selector),
                    ),
                }
            }
            Err(failure) => failure,
        };
        self.log_result(&result, None);
        result
    }

    /// Click the first match of `selector` that carries `attribute` (equal to
    /// `value` when both are given) or whose text contains `value`.
    pub async fn click_custom_element<B: ScriptBridge + ?Sized>(
        &self,
        bridge: &mut B,
        selector: &str,
        attribute: Option<&str>,
        value: Option<&str>,
    ) -> InteractionResult {
        let op = Operation::ClickCustom;
        let result = match self.locate(bridge, op, selector, Lookup::Element).await {
            Ok(located) => {
                let dom = &located.dom;
                let wanted = value.map(normalize_text);
                let matches: Vec<&SnapshotNode> = located
                    .nodes
                    .iter()
                    .filter_map(|&n| dom.node(n))
                    .filter(|n| match (attribute, wanted.as_deref()) {
                        (Some(attr), Some(v)) => n.attr(attr).is_some_and(|a| normalize_text(a) == v),
                        (Some(attr), None) => n.attr(attr).is_some(),
                        (None, Some(v)) => normalize_text(&dom.text(n.id)).contains(v),
                        (None, None) => true,
                    })
                    .collect();

                match pick_visible(&matches) {
                    Some(node) => {
                        let resolved = Resolved::new(dom, node.id, located.method, None);
                        let plan = Ok(plan_click(node));
                        self.run_plan(bridge, dom.epoch(), op, selector, &resolved, plan)
                            .await
                    }
                    None => {
                        let filter = match (attribute, value) {
                            (Some(a), Some(v)) => format!(" [{}={}]", a, v),
                            (Some(a), None) => format!(" [{}]", a),
                            (None, Some(v)) => format!(" [text~{}]", v),
                            (None, None) => String::new(),
                        };
                        report::element_not_found(op, selector).with_message(format!(
                            "Could not find element: {}{}",
                            selector, filter
                        ))
                    }
                }
            }
            Err(failure) => failure,
        };
        self.log_result(&result, None);
        result
    }

    pub async fn click_element<B: ScriptBridge + ?Sized>(
        &self,
        bridge: &mut B,
        selector: &str,
    ) -> InteractionResult {
        let op = Operation::Click;
        let result = match self.locate(bridge, op, selector, Lookup::Element).await {
            Ok(located) => {
                let dom = &located.dom;
                let matches: Vec<&SnapshotNode> =
                    located.nodes.iter().filter_map(|&n| dom.node(n)).collect();
                match pick_visible(&matches) {
                    Some(node) => {
                        let resolved = Resolved::new(dom, node.id, located.method, None);
                        self.run_plan(bridge, dom.epoch(), op, selector, &resolved, Ok(plan_click(node)))
                            .await
                    }
                    None => report::element_not_found(op, selector),
                }
            }
            Err(failure) => failure,
        };
        self.log_result(&result, None);
        result
    }

    /// Submit the form named by `selector` (default `form`). A non-form match
    /// is clicked instead, which submits its owning form.
    pub async fn submit_form<B: ScriptBridge + ?Sized>(
        &self,
        bridge: &mut B,
        selector: Option<&str>,
    ) -> InteractionResult {
        let op = Operation::Submit;
        let selector = selector.filter(|s| !s.trim().is_empty()).unwrap_or("form");
        let result = match self.locate(bridge, op, selector, Lookup::Element).await {
            Ok(located) => {
                let dom = &located.dom;
                match dom.node(located.first()) {
                    Some(node) => {
                        let form = std::iter::once(node)
                            .chain(dom.ancestors(node.id))
                            .find(|n| n.tag == "form")
                            .and_then(|f| f.non_empty_attr("id").or_else(|| f.non_empty_attr("name")))
                            .map(str::to_string);
                        let resolved = Resolved::new(dom, node.id, located.method, None);
                        let plan = Ok(plan_submit(node, form));
                        self.run_plan(bridge, dom.epoch(), op, selector, &resolved, plan)
                            .await
                    }
                    None => report::element_not_found(op, selector),
                }
            }
            Err(failure) => failure,
        };
        self.log_result(&result, None);
        result
    }

    /// Report tag, attributes, label, visibility checks and locators of the
    /// first match. Nothing is changed on the page.
    pub async fn debug_element<B: ScriptBridge + ?Sized>(
        &self,
        bridge: &mut B,
        selector: &str,
    ) -> InteractionResult {
        let op = Operation::Debug;
        let result = match self.locate(bridge, op, selector, Lookup::Element).await {
            Ok(located) => {
                let dom = &located.dom;
                let node = located.first();
                match report::debug_info(dom, node, located.nodes.len()) {
                    Some(info) => InteractionResult::succeeded(op, selector)
                        .with_method(located.method)
                        .with_locator(info.xpath.clone())
                        .with_outcome(InteractionOutcome::Debug(Box::new(info))),
                    None => report::element_not_found(op, selector),
                }
            }
            Err(failure) => failure,
        };
        self.log_result(&result, None);
        result
    }

    /// Snapshot with `selector` as a CSS query, then fall back to exact id,
    /// `name`, and (for field lookups) descriptor resolution.
    async fn locate<B: ScriptBridge + ?Sized>(
        &self,
        bridge: &mut B,
        op: Operation,
        selector: &str,
        lookup: Lookup,
    ) -> Result<Located, InteractionResult> {
        let query = vec![NodeQuery::Css(selector.to_string())];
        let dom = page::snapshot(bridge, query)
            .await
            .map_err(|e| report::engine_failure(op, selector, &e))?;
        match self.find(&dom, selector, lookup) {
            Some((nodes, method, score)) => Ok(Located {
                dom,
                nodes,
                method,
                score,
            }),
            None => Err(report::element_not_found(op, selector)),
        }
    }

    fn find(
        &self,
        dom: &Dom,
        selector: &str,
        lookup: Lookup,
    ) -> Option<(Vec<NodeId>, MatchMethod, Option<u8>)> {
        if let Some(matched) = dom.query_match(0) {
            match &matched.error {
                Some(err) => debug!(selector, error = %err, "css query rejected"),
                None if !matched.nodes.is_empty() => {
                    return Some((matched.nodes.clone(), MatchMethod::CssSelector, None));
                }
                None => {}
            }
        }

        let bare = selector.trim().trim_start_matches('#');
        if bare.is_empty() {
            return None;
        }

        let by_id: Vec<NodeId> = dom
            .elements()
            .filter(|n| n.attr("id") == Some(bare))
            .map(|n| n.id)
            .collect();
        if !by_id.is_empty() {
            return Some((by_id, MatchMethod::IdOrName, None));
        }

        let by_name: Vec<NodeId> = dom
            .elements()
            .filter(|n| n.attr("name") == Some(bare))
            .map(|n| n.id)
            .collect();
        if !by_name.is_empty() {
            let all_radios = by_name
                .iter()
                .all(|&n| dom.node(n).is_some_and(|n| classify(n) == FieldType::Radio));
            let method = if lookup == Lookup::Radio && all_radios {
                MatchMethod::GroupName
            } else {
                MatchMethod::IdOrName
            };
            return Some((by_name, method, None));
        }

        if lookup != Lookup::Element {
            return self
                .resolver
                .resolve(dom, selector)
                .map(|c| (vec![c.node], c.method, Some(c.score)));
        }
        None
    }

    async fn run_plan<B: ScriptBridge + ?Sized>(
        &self,
        bridge: &mut B,
        epoch: u64,
        op: Operation,
        target: &str,
        resolved: &Resolved,
        plan: Result<InteractionPlan, PlanError>,
    ) -> InteractionResult {
        let mut plan = match plan {
            Ok(plan) => plan,
            Err(e) => return report::plan_failure(op, target, resolved, &e),
        };
        if plan.is_noop() {
            debug!(subject = target, "already in requested state");
            return report::completed(op, target, resolved, plan, None);
        }

        let steps = std::mem::take(&mut plan.steps);
        match page::apply(bridge, epoch, steps).await {
            Ok(readback) => report::completed(op, target, resolved, plan, Some(&readback)),
            Err(e) => report::apply_failure(op, target, resolved, &e),
        }
    }

    fn log_result(&self, result: &InteractionResult, value: Option<&str>) {
        let security = &self.config.security;
        let shown = value.map(|v| {
            if security.redact_in_logs {
                mask_sensitive(v, &result.target, &security.sensitive_fields)
            } else {
                v.to_string()
            }
        });

        if !result.success {
            warn!(
                operation = %result.operation,
                subject = %result.target,
                value = ?shown,
                failure = ?result.failure,
                "{}",
                result.message.as_deref().unwrap_or("failed")
            );
            return;
        }

        let method = result.method.map(|m| m.as_str()).unwrap_or("-");
        match result.confidence(self.config.engine.low_confidence_threshold) {
            Some(Confidence::AmbiguousAccepted) => warn!(
                operation = %result.operation,
                subject = %result.target,
                value = ?shown,
                method,
                score = ?result.score,
                "low-confidence match accepted"
            ),
            _ => info!(
                operation = %result.operation,
                subject = %result.target,
                value = ?shown,
                method,
                score = ?result.score,
                "ok"
            ),
        }
    }
}

/// First visible node, else the first node.
fn pick_visible<'a>(nodes: &[&'a SnapshotNode]) -> Option<&'a SnapshotNode> {
    nodes
        .iter()
        .find(|n| is_visible(n))
        .or_else(|| nodes.first())
        .copied()
}
