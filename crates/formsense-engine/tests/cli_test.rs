mod common;

use common::FakePage;
use formsense_engine::cli::{CliError, FileOptions, FileSummary, OutputHandlers, run_file, run_script};
use formsense_engine::command::CommandRunner;
use formsense_engine::dom::SnapshotBuilder;
use formsense_engine::executor::FormEngine;
use formsense_engine::protocol::NodeId;
use std::io::Write;

const QUIET: OutputHandlers = OutputHandlers {
    out: |_| {},
    err: |_| {},
};

fn contact_page() -> (SnapshotBuilder, NodeId, NodeId) {
    let mut b = SnapshotBuilder::new();
    let body = b.body();
    let form = b.element(body, "form", &[("id", "contact")]);
    b.text_element(form, "label", &[("for", "fn")], "Full Name");
    let name = b.element(form, "input", &[("id", "fn")]);
    let news = b.element(form, "input", &[("type", "checkbox"), ("id", "news")]);
    (b, name, news)
}

#[tokio::test]
async fn test_script_runs_each_command() {
    let (builder, name, news) = contact_page();
    let mut page = FakePage::new(&builder);
    let mut runner = CommandRunner::new(FormEngine::default());

    let script = r#"
# contact form
goto example.com/contact
fill "Full Name" "Ada Lovelace"
check #news
submit
"#;
    let summary = run_script(
        &mut page,
        &mut runner,
        QUIET,
        script,
        FileOptions {
            stop_on_error: true,
        },
    )
    .await
    .unwrap();

    assert_eq!(
        summary,
        FileSummary {
            executed: 4,
            failed: 0
        }
    );
    assert_eq!(page.visited, vec!["https://example.com/contact".to_string()]);
    assert_eq!(page.value(name), Some("Ada Lovelace"));
    assert!(page.is_checked(news));
}

#[tokio::test]
async fn test_script_keeps_going_unless_told_to_stop() {
    let (builder, name, _) = contact_page();
    let script = "fill Nickname Ada\nbogus\nfill \"Full Name\" Grace\n";

    let mut page = FakePage::new(&builder);
    let mut runner = CommandRunner::new(FormEngine::default());
    let summary = run_script(
        &mut page,
        &mut runner,
        QUIET,
        script,
        FileOptions {
            stop_on_error: false,
        },
    )
    .await
    .unwrap();
    assert_eq!(summary.executed, 3);
    assert_eq!(summary.failed, 2);
    assert_eq!(page.value(name), Some("Grace"));

    let mut page = FakePage::new(&builder);
    let err = run_script(
        &mut page,
        &mut runner,
        QUIET,
        script,
        FileOptions {
            stop_on_error: true,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, CliError::Interaction { line: 1 }));
    assert_eq!(page.value(name), None);
}

#[tokio::test]
async fn test_run_file_reads_from_disk() {
    let (builder, _, news) = contact_page();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "check news").unwrap();
    writeln!(file, "uncheck news").unwrap();

    let mut page = FakePage::new(&builder);
    let mut runner = CommandRunner::new(FormEngine::default());
    let summary = run_file(
        &mut page,
        &mut runner,
        QUIET,
        file.path().to_str().unwrap(),
        FileOptions {
            stop_on_error: true,
        },
    )
    .await
    .unwrap();

    assert_eq!(summary.failed, 0);
    assert!(!page.is_checked(news));
}

#[tokio::test]
async fn test_goto_takes_url_verbatim() {
    let (builder, _, _) = contact_page();
    let mut page = FakePage::new(&builder);
    let mut runner = CommandRunner::new(FormEngine::default());

    let result = runner
        .goto(&mut page, r#"https://example.com/search?q="a b""#)
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(
        page.visited,
        vec!["https://example.com/search?q=%22a%20b%22".to_string()]
    );
}
