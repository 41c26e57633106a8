//! Line-oriented commands for the REPL and script files.
//!
//! ```text
//! goto example.com/signup
//! fill "Full Name" "Ada Lovelace" Email ada@example.com
//! select #country Canada
//! radio color blue
//! click-custom .chip data-kind=beta
//! ```

use crate::backend::{Backend, BackendError};
use crate::executor::FormEngine;
use crate::page::EngineError;
use formsense_common::formatter::{format_fields, format_result, format_results};
use formsense_common::result::InteractionResult;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unknown command '{0}'. Type 'help' for a list of commands.")]
    UnknownCommand(String),

    #[error("'{command}' expects {expected}")]
    Usage {
        command: String,
        expected: &'static str,
    },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

const HELP: &str = "\
goto <url>                              navigate
detect                                  list visible form fields
map                                     list fields with xpath and example values
fill <field> <value> [<field> <value>]  fill fields by label, name or id
fill-xpath <xpath> <value> [...]        fill fields by xpath
select <selector> <option>              choose a dropdown option by text or value
radio <selector> [value]                check a radio button in a group
check <selector> | uncheck <selector>   set a checkbox
click <selector>                        click an element
click-custom <selector> [attr=value | @attr | text]
submit [selector]                       submit a form (default: form)
debug <selector>                        inspect an element
fields                                  show the last detected fields";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Goto(String),
    Detect,
    Map,
    Fields,
    Fill(Vec<(String, String)>),
    FillXpath(Vec<(String, String)>),
    Select { selector: String, value: String },
    Radio { selector: String, value: Option<String> },
    Checkbox { selector: String, checked: bool },
    Click(String),
    ClickCustom {
        selector: String,
        attribute: Option<String>,
        value: Option<String>,
    },
    Submit(Option<String>),
    Debug(String),
    Help,
}

/// Stands in for `#` while splitting; shlex reads a word-initial `#` as a comment,
/// which would swallow id selectors.
const HASH_PLACEHOLDER: char = '\u{E000}';

/// Split a line into words with shell quoting rules.
pub fn tokenize(line: &str) -> Result<Vec<String>, CommandError> {
    let guarded = line.replace('#', &HASH_PLACEHOLDER.to_string());
    let words = shlex::split(&guarded)
        .ok_or_else(|| CommandError::Parse("unbalanced quotes or trailing escape".into()))?;
    Ok(words
        .into_iter()
        .map(|w| w.replace(HASH_PLACEHOLDER, "#"))
        .collect())
}

fn usage(command: &str, expected: &'static str) -> CommandError {
    CommandError::Usage {
        command: command.to_string(),
        expected,
    }
}

fn pairs(command: &str, args: &[String]) -> Result<Vec<(String, String)>, CommandError> {
    if args.is_empty() || args.len() % 2 != 0 {
        return Err(usage(command, "<target> <value> pairs"));
    }
    Ok(args
        .chunks_exact(2)
        .map(|pair| (pair[0].clone(), pair[1].clone()))
        .collect())
}

pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let mut tokens = tokenize(line)?.into_iter();
    let Some(name) = tokens.next() else {
        return Err(CommandError::Parse("empty command".into()));
    };
    let args: Vec<String> = tokens.collect();
    let name = name.to_lowercase();

    let one = |expected: &'static str| -> Result<String, CommandError> {
        match args.as_slice() {
            [only] => Ok(only.clone()),
            _ => Err(usage(&name, expected)),
        }
    };

    let command = match name.as_str() {
        "goto" | "navigate" => Command::Goto(one("<url>")?),
        "detect" => Command::Detect,
        "map" => Command::Map,
        "fields" => Command::Fields,
        "help" | "?" => Command::Help,
        "fill" => Command::Fill(pairs(&name, &args)?),
        "fill-xpath" => Command::FillXpath(pairs(&name, &args)?),
        "select" => match args.as_slice() {
            [selector, value] => Command::Select {
                selector: selector.clone(),
                value: value.clone(),
            },
            _ => return Err(usage(&name, "<selector> <option>")),
        },
        "radio" => match args.as_slice() {
            [selector] => Command::Radio {
                selector: selector.clone(),
                value: None,
            },
            [selector, value] => Command::Radio {
                selector: selector.clone(),
                value: Some(value.clone()),
            },
            _ => return Err(usage(&name, "<selector> [value]")),
        },
        "check" | "uncheck" => Command::Checkbox {
            selector: one("<selector>")?,
            checked: name == "check",
        },
        "click" => Command::Click(one("<selector>")?),
        "click-custom" => {
            let (selector, filter) = match args.as_slice() {
                [selector] => (selector.clone(), None),
                [selector, filter] => (selector.clone(), Some(filter.as_str())),
                _ => return Err(usage(&name, "<selector> [attr=value | @attr | text]")),
            };
            let (attribute, value) = match filter {
                Some(f) if f.starts_with('@') => (Some(f[1..].to_string()), None),
                Some(f) => match f.split_once('=') {
                    Some((attr, value)) if !attr.is_empty() => {
                        (Some(attr.to_string()), Some(value.to_string()))
                    }
                    _ => (None, Some(f.to_string())),
                },
                None => (None, None),
            };
            Command::ClickCustom {
                selector,
                attribute,
                value,
            }
        }
        "submit" => match args.as_slice() {
            [] => Command::Submit(None),
            [selector] => Command::Submit(Some(selector.clone())),
            _ => return Err(usage(&name, "[selector]")),
        },
        "debug" => Command::Debug(one("<selector>")?),
        _ => return Err(CommandError::UnknownCommand(name.clone())),
    };
    Ok(command)
}

/// Accept bare hosts like `example.com/form` as https URLs.
pub fn normalize_url(raw: &str) -> Result<String, CommandError> {
    match url::Url::parse(raw) {
        Ok(parsed) => Ok(parsed.to_string()),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            Ok(url::Url::parse(&format!("https://{}", raw))?.to_string())
        }
        Err(e) => Err(e.into()),
    }
}

/// Result of executing a command.
pub struct ExecutionResult {
    /// Formatted output string for display.
    pub output: String,
    /// Whether every interaction succeeded.
    pub success: bool,
}

impl ExecutionResult {
    fn text(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            success: true,
        }
    }
}

/// Parses lines and runs them through a [`FormEngine`].
pub struct CommandRunner {
    engine: FormEngine,
}

impl CommandRunner {
    pub fn new(engine: FormEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &FormEngine {
        &self.engine
    }

    pub async fn execute_line<B: Backend + ?Sized>(
        &mut self,
        backend: &mut B,
        line: &str,
    ) -> Result<ExecutionResult, CommandError> {
        let command = parse_command(line)?;
        self.execute(backend, command).await
    }

    /// Navigate to `raw`, accepting bare hosts.
    pub async fn goto<B: Backend + ?Sized>(
        &mut self,
        backend: &mut B,
        raw: &str,
    ) -> Result<ExecutionResult, CommandError> {
        let url = normalize_url(raw)?;
        info!(%url, "navigating");
        let nav = backend.navigate(&url).await?;
        Ok(ExecutionResult::text(format!(
            "Navigated to {} ({})",
            nav.url, nav.title
        )))
    }

    pub async fn execute<B: Backend + ?Sized>(
        &mut self,
        backend: &mut B,
        command: Command,
    ) -> Result<ExecutionResult, CommandError> {
        let sensitive = self.engine.config().security.sensitive_fields.clone();
        let single = |result: InteractionResult| ExecutionResult {
            output: format_result(&result, &sensitive),
            success: result.success,
        };
        let many = |results: Vec<InteractionResult>| ExecutionResult {
            output: format_results(&results, &sensitive),
            success: results.iter().all(|r| r.success),
        };

        let result = match command {
            Command::Goto(raw) => self.goto(backend, &raw).await?,
            Command::Detect => {
                let fields = self.engine.detect_fields(backend).await?;
                ExecutionResult::text(format_fields(&fields))
            }
            Command::Map => {
                let fields = self.engine.map_fields(backend).await?;
                ExecutionResult::text(format_fields(&fields))
            }
            Command::Fields => match self.engine.last_fields() {
                Some(fields) => ExecutionResult::text(format_fields(fields)),
                None => ExecutionResult::text("No fields yet. Run 'detect' or 'map' first."),
            },
            Command::Fill(values) => many(self.engine.fill_form(backend, &values).await),
            Command::FillXpath(values) => many(self.engine.fill_by_xpath(backend, &values).await),
            Command::Select { selector, value } => {
                single(self.engine.select_option(backend, &selector, &value).await)
            }
            Command::Radio { selector, value } => single(
                self.engine
                    .check_radio(backend, &selector, value.as_deref())
                    .await,
            ),
            Command::Checkbox { selector, checked } => single(
                self.engine
                    .check_checkbox(backend, &selector, checked)
                    .await,
            ),
            Command::Click(selector) => single(self.engine.click_element(backend, &selector).await),
            Command::ClickCustom {
                selector,
                attribute,
                value,
            } => single(
                self.engine
                    .click_custom_element(
                        backend,
                        &selector,
                        attribute.as_deref(),
                        value.as_deref(),
                    )
                    .await,
            ),
            Command::Submit(selector) => single(
                self.engine
                    .submit_form(backend, selector.as_deref())
                    .await,
            ),
            Command::Debug(selector) => single(self.engine.debug_element(backend, &selector).await),
            Command::Help => ExecutionResult::text(HELP),
        };
        Ok(result)
    }
}
