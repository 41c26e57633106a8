use anyhow::Context;
use clap::Parser;
use formsense_engine::backend::Backend;
use formsense_engine::cli::{self, FileOptions, OutputHandlers, ReplOptions};
use formsense_engine::command::CommandRunner;
use formsense_engine::config::ConfigLoader;
use formsense_engine::executor::FormEngine;
use formsense_h::backend::HeadlessBackend;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "formsense", version, about = "Fill web forms by their human-readable labels")]
struct Args {
    /// Launch the browser in visible mode (not headless)
    #[arg(long)]
    visible: bool,

    /// Page to open before running commands
    #[arg(long)]
    url: Option<String>,

    /// Script to execute (non-interactive mode)
    #[arg(long)]
    file: Option<String>,

    /// Config file (default: ./formsense.yaml, then ~/.formsense/config.yaml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Keep running a script after a failed line
    #[arg(long)]
    keep_going: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout carries only command output.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => ConfigLoader::load_from(path)
            .await
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ConfigLoader::load_default().await?,
    };

    let mut backend = HeadlessBackend::new_with_visibility(args.visible).with_config(&config.engine);
    backend.launch().await.context("failed to launch browser")?;

    let mut runner = CommandRunner::new(FormEngine::new(config));
    let output = OutputHandlers {
        out: |msg| println!("{}", msg),
        err: |msg| eprintln!("{}", msg),
    };

    let outcome = run(&mut backend, &mut runner, output, &args).await;
    backend.close().await?;
    outcome
}

async fn run(
    backend: &mut HeadlessBackend,
    runner: &mut CommandRunner,
    output: OutputHandlers,
    args: &Args,
) -> anyhow::Result<()> {
    if let Some(url) = &args.url {
        let result = runner.goto(backend, url).await?;
        (output.out)(&result.output);
    }

    if let Some(path) = &args.file {
        let summary = cli::run_file(
            backend,
            runner,
            output,
            path,
            FileOptions {
                stop_on_error: !args.keep_going,
            },
        )
        .await
        .with_context(|| format!("executing {}", path))?;
        if summary.failed > 0 {
            anyhow::bail!("{} of {} commands failed", summary.failed, summary.executed);
        }
        return Ok(());
    }

    cli::run_repl(
        backend,
        runner,
        output,
        ReplOptions {
            banner_lines: &[
                "Browser launched. Try: goto example.com/signup, detect, fill \"Email\" a@b.com",
                "Type 'help' for commands, 'exit' or 'quit' to close.",
            ],
            prompt: "> ",
            exit_commands: &["exit", "quit"],
            ctrl_c_message: Some("Interrupted."),
        },
    )
    .await?;
    Ok(())
}
