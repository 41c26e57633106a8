mod common;

use common::FakePage;
use formsense_engine::config::FormSenseConfig;
use formsense_engine::dom::SnapshotBuilder;
use formsense_engine::executor::FormEngine;
use formsense_engine::protocol::{DomEvent, DomStep, FieldType, NodeId};
use formsense_engine::result::{Confidence, FailureKind, InteractionOutcome, MatchMethod};

fn pairs(values: &[(&str, &str)]) -> Vec<(String, String)> {
    values
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

struct SignupPage {
    builder: SnapshotBuilder,
    name: NodeId,
    email: NodeId,
    plan: NodeId,
    terms: NodeId,
    submit: NodeId,
}

fn signup_page() -> SignupPage {
    let mut b = SnapshotBuilder::new();
    let body = b.body();
    let form = b.element(body, "form", &[("id", "signup")]);

    let row = b.element(form, "div", &[("class", "form-group")]);
    b.text_element(row, "label", &[("for", "name")], "Name");
    let name = b.element(row, "input", &[("id", "name"), ("name", "name")]);

    let row = b.element(form, "div", &[("class", "form-group")]);
    b.text_element(row, "label", &[("for", "email")], "Email");
    let email = b.element(row, "input", &[("id", "email"), ("type", "email")]);

    let row = b.element(form, "div", &[("class", "form-group")]);
    b.text_element(row, "span", &[], "Plan");
    let plan = b.element(row, "select", &[("name", "plan")]);
    b.options(plan, &[("", "Pick one"), ("free", "Free"), ("pro", "Professional")]);

    let row = b.element(form, "div", &[("class", "form-group")]);
    b.text_element(row, "span", &[], "Accept terms");
    b.element(row, "input", &[("name", "comment")]);
    let terms = b.element(row, "input", &[("type", "checkbox"), ("name", "terms")]);

    let submit = b.text_element(form, "button", &[("type", "submit"), ("class", "primary")], "Sign up");

    SignupPage {
        builder: b,
        name,
        email,
        plan,
        terms,
        submit,
    }
}

#[tokio::test]
async fn test_multi_field_fill_is_independent_per_field() {
    let page_def = signup_page();
    let mut page = FakePage::new(&page_def.builder);
    let engine = FormEngine::default();

    let results = engine
        .fill_form(
            &mut page,
            &pairs(&[
                ("Name", "Grace"),
                ("Favourite planet", "Mars"),
                ("Email", "grace@navy.mil"),
                ("Plan", "pro"),
            ]),
        )
        .await;

    let ok: Vec<bool> = results.iter().map(|r| r.success).collect();
    assert_eq!(ok, vec![true, false, true, true]);
    assert_eq!(page.value(page_def.name), Some("Grace"));
    assert_eq!(page.value(page_def.email), Some("grace@navy.mil"));
    assert_eq!(page.value(page_def.plan), Some("pro"));
    assert_eq!(page.snapshots_taken, 4);
    assert_eq!(page.injections, 1);
}

#[tokio::test]
async fn test_boolean_descriptor_prefers_checkbox() {
    let page_def = signup_page();
    let mut page = FakePage::new(&page_def.builder);
    let engine = FormEngine::default();

    let results = engine
        .fill_form(&mut page, &pairs(&[("Accept terms", "yes")]))
        .await;

    assert!(results[0].success, "{:?}", results[0].message);
    assert_eq!(results[0].score, Some(95));
    assert!(page.is_checked(page_def.terms));
    assert_eq!(
        results[0].outcome,
        Some(InteractionOutcome::Checkbox {
            checked: true,
            changed: true
        })
    );
}

#[tokio::test]
async fn test_checkbox_is_idempotent() {
    let page_def = signup_page();
    let mut page = FakePage::new(&page_def.builder);
    let engine = FormEngine::default();

    let first = engine.check_checkbox(&mut page, "terms", true).await;
    let second = engine.check_checkbox(&mut page, "terms", true).await;

    assert!(first.success && second.success);
    assert_eq!(first.method, Some(MatchMethod::IdOrName));
    assert!(page.is_checked(page_def.terms));
    assert_eq!(page.applied.len(), 1);
    let clicks = page
        .steps_for(page_def.terms)
        .into_iter()
        .filter(|s| *s == DomStep::Click)
        .count();
    assert_eq!(clicks, 1);
}

#[tokio::test]
async fn test_select_reports_available_options() {
    let page_def = signup_page();
    let mut page = FakePage::new(&page_def.builder);
    let engine = FormEngine::default();

    let result = engine.select_option(&mut page, "plan", "Enterprise").await;

    assert!(!result.success);
    assert_eq!(result.failure, Some(FailureKind::OptionNotFound));
    assert_eq!(
        result.message.as_deref(),
        Some("Option 'Enterprise' not found. Available: Pick one, Free, Professional")
    );
    assert!(page.applied.is_empty());
}

#[tokio::test]
async fn test_select_falls_back_to_descriptor() {
    let page_def = signup_page();
    let mut page = FakePage::new(&page_def.builder);
    let engine = FormEngine::default();

    let result = engine.select_option(&mut page, "Plan", "free").await;

    assert!(result.success, "{:?}", result.message);
    assert_eq!(result.method, Some(MatchMethod::ExactTextMatchSingleInput));
    assert_eq!(page.node(page_def.plan).state.selected_index, Some(1));
    let steps = page.steps_for(page_def.plan);
    assert_eq!(
        steps.last(),
        Some(&DomStep::Dispatch {
            event: DomEvent::Change
        })
    );
    assert!(!steps.contains(&DomStep::Dispatch {
        event: DomEvent::Blur
    }));
}

#[tokio::test]
async fn test_click_custom_filters_by_attribute() {
    let mut b = SnapshotBuilder::new();
    let body = b.body();
    let hidden = b.text_element(body, "div", &[("class", "chip"), ("data-kind", "b")], "Beta");
    b.hidden(hidden);
    b.text_element(body, "div", &[("class", "chip"), ("data-kind", "a")], "Alpha");
    let visible_b = b.text_element(body, "div", &[("class", "chip"), ("data-kind", "b")], "Beta");
    let mut page = FakePage::new(&b);
    let engine = FormEngine::default();

    let result = engine
        .click_custom_element(&mut page, "div", Some("data-kind"), Some("b"))
        .await;
    assert!(result.success, "{:?}", result.message);
    assert_eq!(page.steps_for(visible_b), vec![DomStep::ScrollIntoView, DomStep::Click]);

    let missing = engine
        .click_custom_element(&mut page, "div", None, Some("Gamma"))
        .await;
    assert!(!missing.success);
    assert_eq!(missing.failure, Some(FailureKind::NotFound));
    assert_eq!(
        missing.message.as_deref(),
        Some("Could not find element: div [text~Gamma]")
    );
}

#[tokio::test]
async fn test_click_and_submit() {
    let page_def = signup_page();
    let mut page = FakePage::new(&page_def.builder);
    let engine = FormEngine::default();

    let clicked = engine.click_element(&mut page, "button").await;
    assert!(clicked.success);
    assert_eq!(
        clicked.outcome,
        Some(InteractionOutcome::Clicked {
            tag: "button".into()
        })
    );
    assert_eq!(page.steps_for(page_def.submit).last(), Some(&DomStep::Click));

    let submitted = engine.submit_form(&mut page, None).await;
    assert!(submitted.success);
    assert_eq!(
        submitted.outcome,
        Some(InteractionOutcome::Submitted {
            form: Some("signup".into())
        })
    );
    let last_plan = page.applied.last().unwrap();
    assert_eq!(last_plan.len(), 1);
    assert_eq!(last_plan[0].step, DomStep::Submit);
}

#[tokio::test]
async fn test_debug_element_reports_without_touching_page() {
    let page_def = signup_page();
    let mut page = FakePage::new(&page_def.builder);
    let engine = FormEngine::default();

    let result = engine.debug_element(&mut page, "#email").await;

    assert!(result.success);
    let Some(InteractionOutcome::Debug(info)) = result.outcome else {
        panic!("expected debug outcome");
    };
    assert_eq!(info.field_type, FieldType::Input("email".into()));
    assert_eq!(info.label, "Email");
    assert_eq!(info.xpath, "//*[@id=\"email\"]");
    assert_eq!(info.match_count, 1);
    assert!(info.visibility.visible);
    assert!(page.applied.is_empty());

    let missing = engine.debug_element(&mut page, "#nope").await;
    assert_eq!(missing.failure, Some(FailureKind::NotFound));
}

#[tokio::test]
async fn test_fill_by_xpath() {
    let page_def = signup_page();
    let mut page = FakePage::new(&page_def.builder);
    let engine = FormEngine::default();

    let results = engine
        .fill_by_xpath(
            &mut page,
            &pairs(&[("//*[@id=\"name\"]", "Linus"), ("not-an-xpath", "x")]),
        )
        .await;

    assert!(results[0].success);
    assert_eq!(results[0].method, Some(MatchMethod::Xpath));
    assert_eq!(results[0].score, None);
    assert_eq!(page.value(page_def.name), Some("Linus"));
    assert!(!results[1].success);
    assert_eq!(results[1].failure, Some(FailureKind::NotFound));
}

#[tokio::test]
async fn test_detect_then_map_round_trip() {
    let page_def = signup_page();
    let mut page = FakePage::new(&page_def.builder);
    let mut engine = FormEngine::default();

    let detected = engine.detect_fields(&mut page).await.unwrap();
    let mapped = engine.map_fields(&mut page).await.unwrap();

    assert_eq!(detected.len(), 5);
    assert_eq!(detected.len(), mapped.len());
    for (d, m) in detected.iter().zip(&mapped) {
        assert_eq!(d.label, m.label);
        assert_eq!(d.field_type, m.field_type);
        assert_eq!(d.selector, m.selector);
        assert!(m.xpath.is_some());
        assert!(m.example.is_some());
    }
    assert_eq!(mapped[0].example.as_deref(), Some("John Doe"));
    assert_eq!(mapped[2].example.as_deref(), Some("Free"));
    assert_eq!(engine.last_fields().map(|f| f.len()), Some(5));
}

#[tokio::test]
async fn test_resolution_is_deterministic() {
    let page_def = signup_page();
    let engine = FormEngine::default();

    let mut first_page = FakePage::new(&page_def.builder);
    let mut second_page = FakePage::new(&page_def.builder);
    let first = engine
        .fill_form(&mut first_page, &pairs(&[("Plan", "free"), ("comment", "hi")]))
        .await;
    let second = engine
        .fill_form(&mut second_page, &pairs(&[("Plan", "free"), ("comment", "hi")]))
        .await;

    assert_eq!(first, second);
    assert_eq!(first_page.applied, second_page.applied);
}

#[tokio::test]
async fn test_higher_score_wins_across_strategies() {
    let mut b = SnapshotBuilder::new();
    let body = b.body();
    let row = b.element(body, "div", &[]);
    b.text_element(row, "span", &[], "Phone");
    let labeled = b.element(row, "input", &[("name", "p1")]);
    let by_id = b.element(body, "input", &[("id", "phone")]);
    let mut page = FakePage::new(&b);
    let engine = FormEngine::default();

    let results = engine.fill_form(&mut page, &pairs(&[("Phone", "555")])).await;

    assert_eq!(results[0].method, Some(MatchMethod::ExactTextMatchSingleInput));
    assert_eq!(page.value(labeled), Some("555"));
    assert_eq!(page.value(by_id), None);
}

#[tokio::test]
async fn test_low_score_is_accepted_but_flagged() {
    let mut b = SnapshotBuilder::new();
    let body = b.body();
    b.element(body, "input", &[("name", "customer_reference_code")]);
    let mut page = FakePage::new(&b);
    let mut config = FormSenseConfig::default();
    config.engine.low_confidence_threshold = 80;
    let engine = FormEngine::new(config);

    let results = engine
        .fill_form(&mut page, &pairs(&[("reference", "R-1")]))
        .await;

    assert!(results[0].success);
    assert_eq!(results[0].method, Some(MatchMethod::PartialAttributeMatch));
    assert_eq!(
        results[0].confidence(engine.config().engine.low_confidence_threshold),
        Some(Confidence::AmbiguousAccepted)
    );
}

#[tokio::test]
async fn test_exact_label_beats_direct_id_match() {
    let mut b = SnapshotBuilder::new();
    let body = b.body();
    let row = b.element(body, "div", &[]);
    b.text_element(row, "span", &[], "Zip");
    b.element(row, "input", &[("type", "checkbox")]);
    let labeled = b.element(row, "input", &[("name", "postal")]);
    let by_id = b.element(body, "input", &[("id", "zip")]);
    let mut page = FakePage::new(&b);
    let engine = FormEngine::default();

    let results = engine.fill_form(&mut page, &pairs(&[("Zip", "12345")])).await;

    assert!(results[0].success, "{:?}", results[0].message);
    assert_eq!(results[0].method, Some(MatchMethod::ExactTextMatchFirstTextInput));
    assert_eq!(results[0].score, Some(95));
    assert_eq!(page.value(labeled), Some("12345"));
    assert_eq!(page.value(by_id), None);
}

#[tokio::test]
async fn test_exact_label_beats_platform_pattern() {
    let mut b = SnapshotBuilder::new();
    let body = b.body();
    let row = b.element(body, "div", &[]);
    b.text_element(row, "span", &[], "Age");
    b.element(row, "input", &[("type", "checkbox")]);
    let labeled = b.element(row, "input", &[("name", "age")]);
    let item = b.element(body, "div", &[("class", "Qr7Oae"), ("role", "listitem")]);
    b.text_element(item, "div", &[("class", "M7eMe")], "Age group");
    let radio = b.element(item, "div", &[("role", "radio"), ("aria-label", "Adult")]);
    let mut page = FakePage::new(&b);
    let engine = FormEngine::default();

    let results = engine.fill_form(&mut page, &pairs(&[("Age", "30")])).await;

    assert!(results[0].success, "{:?}", results[0].message);
    assert_eq!(results[0].method, Some(MatchMethod::ExactTextMatchFirstTextInput));
    assert_eq!(page.value(labeled), Some("30"));
    assert!(!page.is_checked(radio));
}
