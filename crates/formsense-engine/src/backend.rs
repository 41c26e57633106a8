use async_trait::async_trait;
pub use formsense_common::error::BackendError;
use formsense_common::protocol::{PageAction, PageResponse};
use formsense_scanner::RUNTIME_JS;
use serde_json::Value;

/// Expression that reports whether the page runtime is already installed.
const RUNTIME_PROBE: &str = "typeof window.FormSense !== 'undefined'";

#[derive(Debug, Clone)]
pub struct NavigationResult {
    pub url: String,
    pub title: String,
    pub status: u16, // generic status code (e.g. 200)
}

/// Outcome of evaluating one script in page context.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    Value(Value),
    /// The script threw; carries the exception message.
    ScriptError(String),
    /// The evaluation completed without a payload.
    Null,
}

/// The one capability the engine needs from a browser: evaluate a script in page context.
#[async_trait]
pub trait ScriptBridge: Send {
    /// Evaluate a script and return its JSON-compatible result.
    async fn evaluate(&mut self, script: &str) -> Result<Evaluation, BackendError>;

    /// Send an action to the page runtime, injecting it first when missing.
    async fn dispatch(&mut self, action: &PageAction) -> Result<PageResponse, BackendError> {
        let installed = matches!(
            self.evaluate(RUNTIME_PROBE).await?,
            Evaluation::Value(Value::Bool(true))
        );
        if !installed && let Evaluation::ScriptError(message) = self.evaluate(RUNTIME_JS).await? {
            return Err(BackendError::Injection(message));
        }

        let script = runtime_call(action)?;
        match self.evaluate(&script).await? {
            Evaluation::Value(Value::Null) | Evaluation::Null => Err(BackendError::NullResult),
            Evaluation::Value(value) => Ok(serde_json::from_value(value)?),
            Evaluation::ScriptError(message) => Err(BackendError::ScriptError(message)),
        }
    }
}

/// Builds the runtime invocation for an action. The action is JSON-encoded, so user
/// values never reach the page as raw script text.
pub fn runtime_call(action: &PageAction) -> Result<String, BackendError> {
    let payload = serde_json::to_string(action)?;
    Ok(format!("window.FormSense.process({})", payload))
}

/// The Backend trait is the interface the browser-driving binaries implement.
#[async_trait]
pub trait Backend: ScriptBridge + Sync {
    /// Launch the backend (start browser, connect to remote, etc.)
    async fn launch(&mut self) -> Result<(), BackendError>;

    /// Close the backend and cleanup resources.
    async fn close(&mut self) -> Result<(), BackendError>;

    /// Check if the backend is ready to accept commands.
    async fn is_ready(&self) -> bool;

    /// Navigate to a specific URL.
    async fn navigate(&mut self, url: &str) -> Result<NavigationResult, BackendError>;
}
