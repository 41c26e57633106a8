use crate::protocol::FieldMetadata;
use crate::result::{InteractionOutcome, InteractionResult};

/// Default sensitive field names that should be masked in output.
pub const DEFAULT_SENSITIVE_FIELDS: &[&str] = &[
    "password",
    "secret",
    "token",
    "cvv",
    "ssn",
    "card_number",
    "credit_card",
];

/// Score below which a resolved target is flagged in output.
const LOW_CONFIDENCE_NOTE_BELOW: u8 = 80;

pub fn format_result(result: &InteractionResult, sensitive_fields: &[String]) -> String {
    if !result.success {
        let message = result.message.as_deref().unwrap_or("failed");
        return format!("error {} {:?}: {}", result.operation, result.target, message);
    }

    let mut output = format!("ok {} {:?}", result.operation, result.target);

    if let Some(method) = result.method {
        match result.score {
            Some(score) => output.push_str(&format!(" via {} ({})", method, score)),
            None => output.push_str(&format!(" via {}", method)),
        }
    }
    if let Some(locator) = &result.locator {
        output.push_str(&format!(" @ {}", locator));
    }

    match &result.outcome {
        Some(InteractionOutcome::Filled { value }) => {
            let shown = mask_sensitive(value, &result.target, sensitive_fields);
            output.push_str(&format!(" = {:?}", shown));
        }
        Some(InteractionOutcome::Selected { text, value }) => {
            output.push_str(&format!(" = {:?} [{}]", text, value));
        }
        Some(InteractionOutcome::Radio { label, value, .. }) => {
            output.push_str(&format!(" = {:?} [{}]", label, value));
        }
        Some(InteractionOutcome::Checkbox { checked, changed }) => {
            let state = if *checked { "checked" } else { "unchecked" };
            if *changed {
                output.push_str(&format!(" = {}", state));
            } else {
                output.push_str(&format!(" = {} (unchanged)", state));
            }
        }
        Some(InteractionOutcome::Clicked { tag }) => output.push_str(&format!(" <{}>", tag)),
        Some(InteractionOutcome::Submitted { form }) => {
            if let Some(form) = form {
                output.push_str(&format!(" form={}", form));
            }
        }
        Some(InteractionOutcome::Debug(info)) => {
            output.push_str(&format!(
                "\n  <{}> type={} label={:?}",
                info.tag, info.field_type, info.label
            ));
            if !info.id.is_empty() {
                output.push_str(&format!(" id={}", info.id));
            }
            if !info.name.is_empty() {
                output.push_str(&format!(" name={}", info.name));
            }
            if !info.classes.is_empty() {
                output.push_str(&format!(" class={}", info.classes.join(".")));
            }
            let vis = &info.visibility;
            output.push_str(&format!(
                "\n  visible={} display={} visibility={} opacity={} offset_parent={} @ ({:.0},{:.0}) {:.0}x{:.0}",
                vis.visible,
                vis.display,
                vis.visibility,
                vis.opacity,
                vis.offset_parent,
                vis.rect.x,
                vis.rect.y,
                vis.rect.width,
                vis.rect.height
            ));
            output.push_str(&format!("\n  xpath={} css={}", info.xpath, info.selector));
            if let Some(value) = &info.value {
                let shown = mask_sensitive(value, &info.name, sensitive_fields);
                output.push_str(&format!("\n  value={:?}", shown));
            }
            if !info.ancestors.is_empty() {
                output.push_str(&format!("\n  ancestors: {}", info.ancestors.join(" < ")));
            }
            if info.match_count > 1 {
                output.push_str(&format!("\n  # {} elements matched, showing first", info.match_count));
            }
        }
        None => {}
    }

    if let Some(score) = result.score
        && score < LOW_CONFIDENCE_NOTE_BELOW
    {
        output.push_str(" (Note: low confidence match, verify before use)");
    }

    output
}

pub fn format_results(results: &[InteractionResult], sensitive_fields: &[String]) -> String {
    let ok = results.iter().filter(|r| r.success).count();
    let mut output = format!("{}/{} fields succeeded\n", ok, results.len());
    for result in results {
        output.push_str(&format_result(result, sensitive_fields));
        output.push('\n');
    }
    output
}

pub fn format_fields(fields: &[FieldMetadata]) -> String {
    if fields.is_empty() {
        return "No visible form fields".to_string();
    }

    let mut output = String::new();
    for (i, field) in fields.iter().enumerate() {
        // e.g. [1] email "Email address" {required} #email
        output.push_str(&format!(
            "[{}] {} {:?}",
            i + 1,
            field.field_type,
            field.label
        ));
        if field.required {
            output.push_str(" {required}");
        }
        output.push_str(&format!(" {}", field.selector));
        if !field.placeholder.is_empty() {
            output.push_str(&format!(" placeholder={:?}", field.placeholder));
        }

        let choices = if field.radio_options.is_empty() {
            &field.options
        } else {
            &field.radio_options
        };
        if !choices.is_empty() {
            let texts: Vec<&str> = choices.iter().map(|o| o.text.as_str()).collect();
            output.push_str(&format!(" [{}]", texts.join(" | ")));
        }

        if let Some(example) = &field.example {
            let shown = mask_sensitive(example, &field.name, &[]);
            output.push_str(&format!(" = {:?}", shown));
        }
        if let Some(xpath) = &field.xpath {
            output.push_str(&format!("\n    {}", xpath));
        }
        output.push('\n');
    }
    output
}

pub fn mask_sensitive(value: &str, field_name: &str, sensitive_fields: &[String]) -> String {
    let lower_field = field_name.to_lowercase();

    let is_sensitive = sensitive_fields
        .iter()
        .any(|f| lower_field.contains(&f.to_lowercase()))
        || DEFAULT_SENSITIVE_FIELDS
            .iter()
            .any(|f| lower_field.contains(*f));

    if is_sensitive {
        "••••••••".to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{FieldType, OptionEntry};
    use crate::result::{FailureKind, MatchMethod, Operation};

    #[test]
    fn test_format_fill_success() {
        let result = InteractionResult::succeeded(Operation::Fill, "Email")
            .with_method(MatchMethod::ExactLabelMatch)
            .with_score(100)
            .with_locator("//*[@id=\"email\"]")
            .with_outcome(InteractionOutcome::Filled {
                value: "a@b.c".into(),
            });

        assert_eq!(
            format_result(&result, &[]),
            "ok fill \"Email\" via exact_label_match (100) @ //*[@id=\"email\"] = \"a@b.c\""
        );
    }

    #[test]
    fn test_format_masks_password() {
        let result = InteractionResult::succeeded(Operation::Fill, "Password")
            .with_outcome(InteractionOutcome::Filled {
                value: "hunter2".into(),
            });
        let out = format_result(&result, &[]);
        assert!(out.contains("••••••••"));
        assert!(!out.contains("hunter2"));
    }

    #[test]
    fn test_format_low_confidence_note() {
        let result = InteractionResult::succeeded(Operation::Fill, "Email")
            .with_method(MatchMethod::PositionalFallback)
            .with_score(60);
        assert!(format_result(&result, &[]).contains("low confidence"));
    }

    #[test]
    fn test_format_failure() {
        let result = InteractionResult::failed(
            Operation::Select,
            "#country",
            FailureKind::OptionNotFound,
            "Option 'Mars' not found. Available: USA, Canada",
        );
        assert_eq!(
            format_result(&result, &[]),
            "error select \"#country\": Option 'Mars' not found. Available: USA, Canada"
        );
    }

    #[test]
    fn test_format_fields() {
        let fields = vec![FieldMetadata {
            label: "Country".into(),
            name: "country".into(),
            id: "country".into(),
            field_type: FieldType::Select,
            required: true,
            placeholder: String::new(),
            options: vec![OptionEntry::new("us", "USA"), OptionEntry::new("ca", "Canada")],
            radio_options: vec![],
            selector: "#country".into(),
            xpath: None,
            example: Some("USA".into()),
        }];

        assert_eq!(
            format_fields(&fields),
            "[1] select \"Country\" {required} #country [USA | Canada] = \"USA\"\n"
        );
    }

    #[test]
    fn test_mask_custom_field() {
        assert_eq!(mask_sensitive("1234", "pin_code", &["pin".into()]), "••••••••");
        assert_eq!(mask_sensitive("John", "first_name", &["pin".into()]), "John");
    }
}
