//! Candidate generation: five independent strategies, run in priority order.
//!
//! Each strategy proposes `(node, method, score)` candidates for a descriptor. Scores
//! are comparable across strategies. Generation stops at the first exact-label
//! candidate or at any score of 100.

use crate::classify::{
    is_choice_control, is_form_control, is_heading, is_label_like, is_plain_text_field,
};
use crate::dom::{Dom, normalize_text};
use crate::resolution::container::{common_container, is_question_container, section_controls};
use crate::visibility::is_visible;
use formsense_common::protocol::{NodeId, SnapshotNode};
use formsense_common::result::MatchMethod;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::debug;

static BOOLEAN_KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(yes|no|agree|disagree|accept|true|false)\b").unwrap()
});

/// Google Forms question title classes.
const QUESTION_TITLE_CLASSES: &[&str] = &["M7eMe", "freebirdFormviewerComponentsQuestionBaseTitle"];

/// Attributes probed by [`AttributeProbe`].
const PROBED_ATTRIBUTES: &[&str] = &["id", "name", "placeholder", "aria-label"];

/// Descriptors that read like a yes/no question favor choice controls.
pub fn is_boolean_like(text: &str) -> bool {
    BOOLEAN_KEYWORDS.is_match(text)
}

/// A human-meaningful field descriptor, pre-normalized for comparison.
#[derive(Debug, Clone)]
pub struct Descriptor {
    pub text: String,
    pub normalized: String,
    pub boolean_like: bool,
}

impl Descriptor {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            normalized: normalize_text(text),
            boolean_like: is_boolean_like(text),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub node: NodeId,
    pub method: MatchMethod,
    pub score: u8,
}

impl Candidate {
    pub fn new(node: NodeId, method: MatchMethod, score: u8) -> Self {
        Self {
            node,
            method,
            score,
        }
    }

    /// Strategy priority (1 is highest).
    pub fn priority(&self) -> u8 {
        self.method.strategy().unwrap_or(u8::MAX)
    }
}

pub struct StrategyContext<'a> {
    pub dom: &'a Dom,
    pub descriptor: &'a Descriptor,
    pub max_section_children: usize,
}

impl<'a> StrategyContext<'a> {
    fn section(&self, id: NodeId) -> Option<NodeId> {
        common_container(self.dom, id, self.max_section_children)
    }

    /// Visible label-like elements (never controls) whose text satisfies `pred`.
    fn labels_where(&self, pred: impl Fn(&str) -> bool) -> Vec<&'a SnapshotNode> {
        let dom = self.dom;
        dom.elements()
            .filter(|n| is_label_like(n) && !is_form_control(n) && is_visible(n))
            .filter(|n| pred(&normalize_text(&dom.text_content(n.id))))
            .collect()
    }
}

pub trait Strategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Propose candidates given what earlier strategies already found.
    fn propose(&self, ctx: &StrategyContext<'_>, found: &[Candidate]) -> Vec<Candidate>;
}

/// Strategy 1: label-like text equal to the descriptor.
pub struct ExactLabel;

impl Strategy for ExactLabel {
    fn name(&self) -> &'static str {
        "exact_label"
    }

    fn propose(&self, ctx: &StrategyContext<'_>, _found: &[Candidate]) -> Vec<Candidate> {
        let labels = ctx.labels_where(|text| text == ctx.descriptor.normalized);

        for label in &labels {
            if label.tag == "label"
                && let Some(target) = label.non_empty_attr("for")
                && let Some(control) = ctx.dom.find_by_attr("id", target)
                && is_form_control(control)
                && is_visible(control)
            {
                return vec![Candidate::new(control.id, MatchMethod::ExactLabelMatch, 100)];
            }
        }

        for label in labels {
            let Some(section) = ctx.section(label.id) else {
                continue;
            };
            let controls = section_controls(ctx.dom, section);
            let pick = match controls.as_slice() {
                [] => None,
                [only] => Some(Candidate::new(
                    only.id,
                    MatchMethod::ExactTextMatchSingleInput,
                    99,
                )),
                many => {
                    let preferred = if ctx.descriptor.boolean_like {
                        many.iter().find(|c| is_choice_control(c))
                    } else {
                        many.iter().find(|c| !is_choice_control(c))
                    };
                    Some(match preferred {
                        Some(c) => {
                            Candidate::new(c.id, MatchMethod::ExactTextMatchFirstTextInput, 95)
                        }
                        None => {
                            Candidate::new(many[0].id, MatchMethod::ExactTextMatchFirstInput, 90)
                        }
                    })
                }
            };
            if let Some(candidate) = pick {
                return vec![candidate];
            }
        }

        vec![]
    }
}

/// Strategy 2: label-like text containing the descriptor, nearest control below it.
pub struct Proximity;

impl Proximity {
    fn score(label: &SnapshotNode, control: &SnapshotNode, boolean_like: bool) -> f32 {
        let mut score = 1000.0 - (control.rect.y - label.rect.bottom()).abs();
        if label.rect.horizontal_overlap(&control.rect) > 0.0 {
            score += 200.0;
        }
        let favored = if boolean_like {
            is_choice_control(control)
        } else {
            is_plain_text_field(control)
        };
        if favored {
            score += 300.0;
        }
        score
    }
}

impl Strategy for Proximity {
    fn name(&self) -> &'static str {
        "proximity"
    }

    fn propose(&self, ctx: &StrategyContext<'_>, found: &[Candidate]) -> Vec<Candidate> {
        if found.iter().any(|c| c.score > 90) {
            return vec![];
        }

        let matches = ctx.labels_where(|text| text.contains(&ctx.descriptor.normalized));
        // Keep only the deepest matches; their ancestors contain the same text.
        let deepest = matches.iter().filter(|m| {
            !matches
                .iter()
                .any(|other| other.id != m.id && ctx.dom.contains(m.id, other.id))
        });

        let mut out = Vec::new();
        for label in deepest {
            let Some(section) = ctx.section(label.id) else {
                continue;
            };
            let controls = section_controls(ctx.dom, section);
            let below: Vec<&SnapshotNode> = controls
                .iter()
                .copied()
                .filter(|c| c.rect.y >= label.rect.y)
                .collect();
            let pool = if below.is_empty() { controls } else { below };
            let heading = is_heading(label);

            match pool.as_slice() {
                [] => {}
                [only] => {
                    let (method, score) = if heading {
                        (MatchMethod::ProximityHeadingSingle, 94)
                    } else {
                        (MatchMethod::ProximityTextSingle, 88)
                    };
                    out.push(Candidate::new(only.id, method, score));
                }
                many => {
                    let mut best = many[0];
                    let mut best_score = Self::score(label, best, ctx.descriptor.boolean_like);
                    for &control in &many[1..] {
                        let score = Self::score(label, control, ctx.descriptor.boolean_like);
                        if score > best_score {
                            best = control;
                            best_score = score;
                        }
                    }
                    let (method, score) = if heading {
                        (MatchMethod::ProximityHeadingBest, 92)
                    } else {
                        (MatchMethod::ProximityTextBest, 86)
                    };
                    out.push(Candidate::new(best.id, method, score));
                }
            }
        }
        out
    }
}

/// Strategy 3: id, name, placeholder and aria-label probing on visible controls.
pub struct AttributeProbe;

impl Strategy for AttributeProbe {
    fn name(&self) -> &'static str {
        "attribute_probe"
    }

    fn propose(&self, ctx: &StrategyContext<'_>, _found: &[Candidate]) -> Vec<Candidate> {
        let wanted = &ctx.descriptor.normalized;
        let mut out = Vec::new();

        for control in ctx
            .dom
            .elements()
            .filter(|n| is_form_control(n) && is_visible(n))
        {
            let values: Vec<(&str, String)> = PROBED_ATTRIBUTES
                .iter()
                .filter_map(|attr| control.non_empty_attr(attr).map(|v| (*attr, normalize_text(v))))
                .collect();

            let candidate = if values.iter().any(|(a, v)| *a == "id" && v == wanted) {
                Some(Candidate::new(control.id, MatchMethod::DirectIdMatch, 98))
            } else if values.iter().any(|(a, v)| *a != "id" && v == wanted) {
                Some(Candidate::new(control.id, MatchMethod::DirectAttributeMatch, 85))
            } else if values.iter().any(|(_, v)| v.contains(wanted.as_str())) {
                Some(Candidate::new(control.id, MatchMethod::PartialAttributeMatch, 75))
            } else {
                None
            };
            out.extend(candidate);
        }
        out
    }
}

/// Strategy 4: framework question containers (Google Forms).
pub struct PlatformPattern;

impl PlatformPattern {
    fn is_question_title(node: &SnapshotNode) -> bool {
        is_heading(node) || QUESTION_TITLE_CLASSES.iter().any(|c| node.has_class(c))
    }
}

impl Strategy for PlatformPattern {
    fn name(&self) -> &'static str {
        "platform_pattern"
    }

    fn propose(&self, ctx: &StrategyContext<'_>, _found: &[Candidate]) -> Vec<Candidate> {
        let dom = ctx.dom;
        let mut seen = HashSet::new();
        let mut out = Vec::new();

        let titles = dom.elements().filter(|n| {
            Self::is_question_title(n)
                && normalize_text(&dom.text_content(n.id)).contains(&ctx.descriptor.normalized)
        });
        for title in titles {
            let Some(container) = dom.ancestors(title.id).find(|a| is_question_container(a))
            else {
                continue;
            };
            if !seen.insert(container.id) {
                continue;
            }

            let controls = section_controls(dom, container.id);
            let preferred = if ctx.descriptor.boolean_like {
                controls.iter().find(|c| is_choice_control(c))
            } else {
                controls.iter().find(|c| is_plain_text_field(c))
            };
            if let Some(control) = preferred.or(controls.first()) {
                out.push(Candidate::new(
                    control.id,
                    MatchMethod::PlatformPatternMatch,
                    96,
                ));
            }
        }
        out
    }
}

/// Strategy 5: the Nth text-owning label pairs with the Nth control.
pub struct PositionalFallback;

impl Strategy for PositionalFallback {
    fn name(&self) -> &'static str {
        "positional_fallback"
    }

    fn propose(&self, ctx: &StrategyContext<'_>, found: &[Candidate]) -> Vec<Candidate> {
        if !found.is_empty() {
            return vec![];
        }
        let dom = ctx.dom;
        let labels: Vec<String> = dom
            .elements()
            .filter(|n| is_label_like(n) && !is_form_control(n) && is_visible(n))
            .map(|n| normalize_text(&dom.own_text(n.id)))
            .filter(|text| !text.is_empty())
            .collect();
        let controls: Vec<&SnapshotNode> = dom
            .elements()
            .filter(|n| is_form_control(n) && is_visible(n))
            .collect();

        labels
            .iter()
            .position(|text| text.contains(&ctx.descriptor.normalized))
            .and_then(|i| controls.get(i))
            .map(|control| vec![Candidate::new(control.id, MatchMethod::PositionalFallback, 60)])
            .unwrap_or_default()
    }
}

/// Runs the strategies in order and collects their candidates.
pub struct CandidateGenerator {
    strategies: Vec<Box<dyn Strategy>>,
}

impl Default for CandidateGenerator {
    fn default() -> Self {
        Self {
            strategies: vec![
                Box::new(ExactLabel),
                Box::new(Proximity),
                Box::new(AttributeProbe),
                Box::new(PlatformPattern),
                Box::new(PositionalFallback),
            ],
        }
    }
}

impl CandidateGenerator {
    pub fn with_strategies(strategies: Vec<Box<dyn Strategy>>) -> Self {
        Self { strategies }
    }

    pub fn generate(&self, ctx: &StrategyContext<'_>) -> Vec<Candidate> {
        let mut found: Vec<Candidate> = Vec::new();
        if ctx.descriptor.normalized.is_empty() {
            return found;
        }

        for strategy in &self.strategies {
            let proposed = strategy.propose(ctx, &found);
            debug!(
                strategy = strategy.name(),
                descriptor = %ctx.descriptor.text,
                proposed = proposed.len(),
                "strategy finished"
            );
            // An exact label match outranks every later strategy.
            let decisive = proposed
                .iter()
                .any(|c| c.score >= 100 || c.method.strategy() == Some(1));
            found.extend(proposed);
            if decisive {
                break;
            }
        }
        found
    }
}
