use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormSenseConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub examples: ExampleValues,
    #[serde(default)]
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Scores below this are reported as `ambiguous_accepted`.
    #[serde(default = "default_low_confidence_threshold")]
    pub low_confidence_threshold: u8,
    #[serde(default = "default_max_section_children")]
    pub max_section_children: usize,
    #[serde(default = "default_eval_timeout_ms")]
    pub eval_timeout_ms: u64,
    #[serde(default = "default_context_retries")]
    pub context_retries: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            low_confidence_threshold: default_low_confidence_threshold(),
            max_section_children: default_max_section_children(),
            eval_timeout_ms: default_eval_timeout_ms(),
            context_retries: default_context_retries(),
        }
    }
}

fn default_low_confidence_threshold() -> u8 {
    80
}

fn default_max_section_children() -> usize {
    crate::resolution::container::DEFAULT_MAX_SECTION_CHILDREN
}

fn default_eval_timeout_ms() -> u64 {
    10000
}

fn default_context_retries() -> usize {
    3
}

/// Sample values suggested by `map_fields`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExampleValues {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_email")]
    pub email: String,
    #[serde(default = "default_phone")]
    pub phone: String,
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default = "default_number")]
    pub number: String,
    #[serde(default = "default_date")]
    pub date: String,
    #[serde(default = "default_checkbox")]
    pub checkbox: String,
    #[serde(default = "default_text")]
    pub text: String,
}

impl Default for ExampleValues {
    fn default() -> Self {
        Self {
            name: default_name(),
            email: default_email(),
            phone: default_phone(),
            address: default_address(),
            number: default_number(),
            date: default_date(),
            checkbox: default_checkbox(),
            text: default_text(),
        }
    }
}

fn default_name() -> String {
    "John Doe".to_string()
}

fn default_email() -> String {
    "example@email.com".to_string()
}

fn default_phone() -> String {
    "555-123-4567".to_string()
}

fn default_address() -> String {
    "123 Main Street".to_string()
}

fn default_number() -> String {
    "42".to_string()
}

fn default_date() -> String {
    "2024-01-01".to_string()
}

fn default_checkbox() -> String {
    "true".to_string()
}

fn default_text() -> String {
    "Sample text".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(default = "default_sensitive_fields")]
    pub sensitive_fields: Vec<String>,
    #[serde(default = "default_redact_in_logs")]
    pub redact_in_logs: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            sensitive_fields: default_sensitive_fields(),
            redact_in_logs: default_redact_in_logs(),
        }
    }
}

fn default_sensitive_fields() -> Vec<String> {
    formsense_common::formatter::DEFAULT_SENSITIVE_FIELDS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_redact_in_logs() -> bool {
    true
}
