//! Structured outcomes returned by every engine operation.

use crate::protocol::{FieldType, Rect};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// How a target element was located.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    // Strategy 1
    ExactLabelMatch,
    ExactTextMatchSingleInput,
    ExactTextMatchFirstTextInput,
    ExactTextMatchFirstInput,
    // Strategy 2
    ProximityHeadingSingle,
    ProximityTextSingle,
    ProximityHeadingBest,
    ProximityTextBest,
    // Strategy 3
    DirectIdMatch,
    DirectAttributeMatch,
    PartialAttributeMatch,
    // Strategy 4
    PlatformPatternMatch,
    // Strategy 5
    PositionalFallback,
    // Selector-driven operations
    CssSelector,
    IdOrName,
    GroupName,
    Xpath,
    // Radio member choice
    RadioValueMatch,
    RadioLabelMatch,
    RadioContainerTextMatch,
    RadioDefaultFirst,
}

impl MatchMethod {
    /// Candidate strategy (1 = highest priority) that produces this method.
    pub fn strategy(&self) -> Option<u8> {
        use MatchMethod::*;
        match self {
            ExactLabelMatch
            | ExactTextMatchSingleInput
            | ExactTextMatchFirstTextInput
            | ExactTextMatchFirstInput => Some(1),
            ProximityHeadingSingle
            | ProximityTextSingle
            | ProximityHeadingBest
            | ProximityTextBest => Some(2),
            DirectIdMatch | DirectAttributeMatch | PartialAttributeMatch => Some(3),
            PlatformPatternMatch => Some(4),
            PositionalFallback => Some(5),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        use MatchMethod::*;
        match self {
            ExactLabelMatch => "exact_label_match",
            ExactTextMatchSingleInput => "exact_text_match_single_input",
            ExactTextMatchFirstTextInput => "exact_text_match_first_text_input",
            ExactTextMatchFirstInput => "exact_text_match_first_input",
            ProximityHeadingSingle => "proximity_heading_single",
            ProximityTextSingle => "proximity_text_single",
            ProximityHeadingBest => "proximity_heading_best",
            ProximityTextBest => "proximity_text_best",
            DirectIdMatch => "direct_id_match",
            DirectAttributeMatch => "direct_attribute_match",
            PartialAttributeMatch => "partial_attribute_match",
            PlatformPatternMatch => "platform_pattern_match",
            PositionalFallback => "positional_fallback",
            CssSelector => "css_selector",
            IdOrName => "id_or_name",
            GroupName => "group_name",
            Xpath => "xpath",
            RadioValueMatch => "radio_value_match",
            RadioLabelMatch => "radio_label_match",
            RadioContainerTextMatch => "radio_container_text_match",
            RadioDefaultFirst => "radio_default_first",
        }
    }
}

impl fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Fill,
    FillXpath,
    Select,
    Radio,
    Checkbox,
    ClickCustom,
    Click,
    Submit,
    Debug,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Fill => "fill",
            Operation::FillXpath => "fill_xpath",
            Operation::Select => "select",
            Operation::Radio => "radio",
            Operation::Checkbox => "checkbox",
            Operation::ClickCustom => "click_custom",
            Operation::Click => "click",
            Operation::Submit => "submit",
            Operation::Debug => "debug",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NotFound,
    OptionNotFound,
    ScriptExecutionError,
    NullResult,
    StaleElement,
    UnsupportedField,
    Bridge,
}

/// How much a successful resolution can be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Confident,
    /// A low-scoring candidate was used anyway.
    AmbiguousAccepted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InteractionOutcome {
    Filled {
        value: String,
    },
    Selected {
        text: String,
        value: String,
    },
    Radio {
        value: String,
        label: String,
        matched_by: MatchMethod,
    },
    Checkbox {
        checked: bool,
        changed: bool,
    },
    Clicked {
        tag: String,
    },
    Submitted {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        form: Option<String>,
    },
    Debug(Box<ElementDebugInfo>),
}

/// Terminal value of one operation (or one field of a multi-field operation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionResult {
    pub success: bool,
    pub operation: Operation,
    /// Field descriptor, selector or xpath the caller supplied.
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<MatchMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<InteractionOutcome>,
}

impl InteractionResult {
    pub fn succeeded(operation: Operation, target: impl Into<String>) -> Self {
        Self {
            success: true,
            operation,
            target: target.into(),
            method: None,
            score: None,
            locator: None,
            message: None,
            failure: None,
            outcome: None,
        }
    }

    pub fn failed(
        operation: Operation,
        target: impl Into<String>,
        failure: FailureKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            operation,
            target: target.into(),
            method: None,
            score: None,
            locator: None,
            message: Some(message.into()),
            failure: Some(failure),
            outcome: None,
        }
    }

    pub fn with_method(mut self, method: MatchMethod) -> Self {
        self.method = Some(method);
        self
    }

    pub fn with_score(mut self, score: u8) -> Self {
        self.score = Some(score);
        self
    }

    pub fn with_locator(mut self, locator: impl Into<String>) -> Self {
        self.locator = Some(locator.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_outcome(mut self, outcome: InteractionOutcome) -> Self {
        self.outcome = Some(outcome);
        self
    }

    /// Confidence of a successful scored resolution; `None` when unscored or failed.
    pub fn confidence(&self, threshold: u8) -> Option<Confidence> {
        if !self.success {
            return None;
        }
        self.score.map(|score| {
            if score >= threshold {
                Confidence::Confident
            } else {
                Confidence::AmbiguousAccepted
            }
        })
    }
}

/// Per-check breakdown of the visibility decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisibilityReport {
    pub display: String,
    pub visibility: String,
    pub opacity: f32,
    pub offset_parent: bool,
    pub rect: Rect,
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementDebugInfo {
    pub tag: String,
    pub id: String,
    pub name: String,
    pub classes: Vec<String>,
    pub field_type: FieldType,
    pub label: String,
    pub visibility: VisibilityReport,
    pub xpath: String,
    pub selector: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub checked: bool,
    pub attributes: BTreeMap<String, String>,
    /// Ancestor chain from the parent up to `<body>`, e.g. `div.form-group`.
    pub ancestors: Vec<String>,
    /// Number of nodes the selector matched.
    pub match_count: usize,
}
