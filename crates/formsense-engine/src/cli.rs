use crate::backend::Backend;
use crate::command::{CommandError, CommandRunner};
use std::io::{self, Write};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("line {line}: {source}")]
    Command {
        line: usize,
        #[source]
        source: CommandError,
    },

    #[error("line {line}: interaction failed")]
    Interaction { line: usize },
}

#[derive(Clone, Copy)]
pub struct OutputHandlers {
    pub out: fn(&str),
    pub err: fn(&str),
}

pub struct FileOptions {
    /// Abort on the first command error or failed interaction.
    pub stop_on_error: bool,
}

/// Tally of a script run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FileSummary {
    pub executed: usize,
    pub failed: usize,
}

pub struct ReplOptions<'a> {
    pub banner_lines: &'a [&'a str],
    pub prompt: &'a str,
    pub exit_commands: &'a [&'a str],
    pub ctrl_c_message: Option<&'a str>,
}

/// Lines that carry no command.
fn is_blank_or_comment(line: &str) -> bool {
    line.is_empty() || line.starts_with('#')
}

pub async fn run_script<B: Backend + ?Sized>(
    backend: &mut B,
    runner: &mut CommandRunner,
    output: OutputHandlers,
    content: &str,
    options: FileOptions,
) -> Result<FileSummary, CliError> {
    let mut summary = FileSummary::default();
    for (index, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if is_blank_or_comment(trimmed) {
            continue;
        }
        let line_no = index + 1;
        summary.executed += 1;

        match runner.execute_line(backend, trimmed).await {
            Ok(result) if result.success => (output.out)(&result.output),
            Ok(result) => {
                summary.failed += 1;
                (output.err)(&result.output);
                if options.stop_on_error {
                    return Err(CliError::Interaction { line: line_no });
                }
            }
            Err(source) => {
                summary.failed += 1;
                (output.err)(&format!("Error on line {} '{}': {}", line_no, trimmed, source));
                if options.stop_on_error {
                    return Err(CliError::Command {
                        line: line_no,
                        source,
                    });
                }
            }
        }
    }
    Ok(summary)
}

pub async fn run_file<B: Backend + ?Sized>(
    backend: &mut B,
    runner: &mut CommandRunner,
    output: OutputHandlers,
    path: &str,
    options: FileOptions,
) -> Result<FileSummary, CliError> {
    let content = tokio::fs::read_to_string(path).await?;
    run_script(backend, runner, output, &content, options).await
}

/// Possible outcomes from reading a single REPL line.
enum ReadLineResult {
    Input(String),
    /// Empty line; re-prompt.
    Skip,
    /// EOF or an exit command.
    Exit,
    Error(io::Error),
}

async fn read_line(
    reader: &mut tokio::io::Lines<BufReader<tokio::io::Stdin>>,
    options: &ReplOptions<'_>,
    output: OutputHandlers,
) -> ReadLineResult {
    tokio::select! {
        line = reader.next_line() => classify_line(line, options.exit_commands),
        _ = tokio::signal::ctrl_c() => {
            if let Some(message) = options.ctrl_c_message {
                (output.out)(message);
            }
            ReadLineResult::Exit
        }
    }
}

fn classify_line(result: Result<Option<String>, io::Error>, exit_commands: &[&str]) -> ReadLineResult {
    match result {
        Ok(Some(input)) => {
            let trimmed = input.trim();
            if is_blank_or_comment(trimmed) {
                ReadLineResult::Skip
            } else if exit_commands.contains(&trimmed) {
                ReadLineResult::Exit
            } else {
                ReadLineResult::Input(trimmed.to_string())
            }
        }
        Ok(None) => ReadLineResult::Exit,
        Err(e) => ReadLineResult::Error(e),
    }
}

pub async fn run_repl<B: Backend + ?Sized>(
    backend: &mut B,
    runner: &mut CommandRunner,
    output: OutputHandlers,
    options: ReplOptions<'_>,
) -> Result<(), CliError> {
    for line in options.banner_lines {
        (output.out)(line);
    }

    let mut reader = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = io::stdout();

    loop {
        print!("{}", options.prompt);
        stdout.flush()?;

        match read_line(&mut reader, &options, output).await {
            ReadLineResult::Input(line) => match runner.execute_line(backend, &line).await {
                Ok(result) if result.success => (output.out)(&result.output),
                Ok(result) => (output.err)(&result.output),
                Err(err) => (output.err)(&format!("Error: {}", err)),
            },
            ReadLineResult::Skip => continue,
            ReadLineResult::Exit => break,
            ReadLineResult::Error(e) => return Err(e.into()),
        }
    }
    Ok(())
}
