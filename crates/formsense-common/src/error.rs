use crate::result::FailureKind;
use serde_json::Value;

/// Errors raised by a script-evaluation bridge or reported by the page runtime.
#[derive(thiserror::Error, Debug, Clone)]
pub enum BackendError {
    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Element {id} is stale (snapshot epoch no longer matches the page)")]
    ElementStale { id: u32 },

    #[error("Invalid selector: {selector}")]
    SelectorInvalid { selector: String },

    #[error("Script execution error: {0}")]
    ScriptError(String),

    #[error("Script returned null")]
    NullResult,

    #[error("Timed out during {operation}")]
    TimeoutWithContext { operation: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Runtime injection failed: {0}")]
    Injection(String),

    #[error("Browser is not launched")]
    NotReady,

    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Bridge error: {0}")]
    Other(String),
}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        BackendError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        BackendError::Serialization(err.to_string())
    }
}

impl BackendError {
    /// Page-runtime error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            BackendError::Navigation(_) => "NAVIGATION_ERROR",
            BackendError::ElementStale { .. } => "ELEMENT_STALE",
            BackendError::SelectorInvalid { .. } => "SELECTOR_INVALID",
            BackendError::ScriptError(_) => "SCRIPT_ERROR",
            BackendError::NullResult => "NULL_RESULT",
            BackendError::TimeoutWithContext { .. } => "TIMEOUT",
            BackendError::InvalidRequest(_) => "INVALID_REQUEST",
            BackendError::Injection(_) => "INJECTION_ERROR",
            BackendError::NotReady => "NOT_READY",
            BackendError::Io(_) => "IO_ERROR",
            BackendError::Serialization(_) => "SERIALIZATION_ERROR",
            BackendError::Other(_) => "INTERNAL_ERROR",
        }
    }

    /// Failure category reported to callers of the engine operations.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            BackendError::ScriptError(_) => FailureKind::ScriptExecutionError,
            BackendError::NullResult => FailureKind::NullResult,
            BackendError::ElementStale { .. } => FailureKind::StaleElement,
            _ => FailureKind::Bridge,
        }
    }
}

/// Maps an error code returned by the page runtime to a [`BackendError`].
pub fn map_page_error(code: &str, message: &str, details: Option<&Value>) -> BackendError {
    match code {
        "ELEMENT_STALE" => BackendError::ElementStale {
            id: details
                .and_then(|d| d.get("id"))
                .and_then(Value::as_u64)
                .unwrap_or(0) as u32,
        },
        "SELECTOR_INVALID" => BackendError::SelectorInvalid {
            selector: details
                .and_then(|d| d.get("selector"))
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string(),
        },
        "SCRIPT_ERROR" => BackendError::ScriptError(message.to_string()),
        "TIMEOUT" => BackendError::TimeoutWithContext {
            operation: message.to_string(),
        },
        "INVALID_REQUEST" | "UNKNOWN_ACTION" => BackendError::InvalidRequest(message.to_string()),
        "INTERNAL_ERROR" => BackendError::Other(message.to_string()),
        _ => BackendError::Other(format!("[{}] {}", code, message)),
    }
}
