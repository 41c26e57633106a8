use chromiumoxide::Page;
use chromiumoxide::error::CdpError;
use formsense_engine::backend::{BackendError, Evaluation};
use formsense_engine::config::EngineConfig;
use serde_json::Value;
use std::time::Duration;

/// Delay between retries while the page has no execution context.
const CONTEXT_RETRY_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy)]
pub struct EvalSettings {
    /// Dialogs (alert/confirm/prompt) block the JS thread; give up after this.
    pub timeout: Duration,
    pub context_retries: usize,
}

impl Default for EvalSettings {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

impl From<&EngineConfig> for EvalSettings {
    fn from(config: &EngineConfig) -> Self {
        Self {
            timeout: Duration::from_millis(config.eval_timeout_ms),
            context_retries: config.context_retries.max(1),
        }
    }
}

/// Whether an error means the page has no usable context, e.g. mid-navigation.
pub(crate) fn is_context_error(err: &str) -> bool {
    err.contains("Cannot find context")
        || err.contains("Execution context was destroyed")
        || err.contains("-32000")
}

/// Turns a CDP remote result into an [`Evaluation`]. `undefined` and `null` both
/// come back without a payload.
pub(crate) fn to_evaluation(value: Option<&Value>) -> Evaluation {
    match value {
        None | Some(Value::Null) => Evaluation::Null,
        Some(value) => Evaluation::Value(value.clone()),
    }
}

enum Attempt {
    Done(Evaluation),
    Context(String),
}

async fn evaluate_once(page: &Page, script: &str, timeout: Duration) -> Result<Attempt, BackendError> {
    let result = tokio::time::timeout(timeout, page.evaluate(script))
        .await
        .map_err(|_| BackendError::TimeoutWithContext {
            operation: "script evaluation (possibly blocked by a dialog)".into(),
        })?;

    match result {
        Ok(remote) => Ok(Attempt::Done(to_evaluation(remote.value()))),
        Err(CdpError::JavascriptException(details)) => {
            let message = details
                .exception
                .as_ref()
                .and_then(|e| e.description.clone())
                .unwrap_or_else(|| details.text.clone());
            Ok(Attempt::Done(Evaluation::ScriptError(message)))
        }
        Err(e) => {
            let message = e.to_string();
            if is_context_error(&message) {
                Ok(Attempt::Context(message))
            } else {
                Err(BackendError::Other(message))
            }
        }
    }
}

/// Evaluates `script` in the page, retrying while the execution context is being
/// replaced.
pub async fn evaluate(page: &Page, script: &str, settings: &EvalSettings) -> Result<Evaluation, BackendError> {
    let mut last_error = String::new();

    for attempt in 1..=settings.context_retries {
        match evaluate_once(page, script, settings.timeout).await? {
            Attempt::Done(evaluation) => return Ok(evaluation),
            Attempt::Context(message) => {
                tracing::debug!(
                    attempt,
                    retries = settings.context_retries,
                    "context error during evaluation, retrying"
                );
                last_error = message;
                tokio::time::sleep(CONTEXT_RETRY_DELAY).await;
            }
        }
    }

    Err(BackendError::Navigation(format!(
        "page context unavailable after {} attempts: {}",
        settings.context_retries, last_error
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_context_errors() {
        assert!(is_context_error("Execution context was destroyed, most likely because of a navigation"));
        assert!(is_context_error("error -32000: Cannot find context with specified id"));
        assert!(!is_context_error("ReferenceError: foo is not defined"));
    }

    #[test]
    fn test_null_and_undefined_have_no_payload() {
        assert_eq!(to_evaluation(None), Evaluation::Null);
        assert_eq!(to_evaluation(Some(&Value::Null)), Evaluation::Null);
        assert_eq!(
            to_evaluation(Some(&json!({"status": "ok"}))),
            Evaluation::Value(json!({"status": "ok"}))
        );
    }

    #[test]
    fn test_settings_follow_engine_config() {
        let config = EngineConfig {
            eval_timeout_ms: 2500,
            context_retries: 0,
            ..EngineConfig::default()
        };
        let settings = EvalSettings::from(&config);
        assert_eq!(settings.timeout, Duration::from_millis(2500));
        assert_eq!(settings.context_retries, 1);
    }
}
