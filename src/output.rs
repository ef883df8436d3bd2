//! Shared output formatting for task-cli commands.

use std::io::{self, Write};

use serde::Serialize;

use crate::error::{Error, Result};
use crate::task::Task;

pub const SCHEMA_VERSION: &str = "task-cli.v1";

#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    pub json: bool,
    pub quiet: bool,
}

#[derive(Debug, Clone)]
pub struct HumanOutput {
    header: String,
    summary: Vec<(String, String)>,
    details: Vec<String>,
    warnings: Vec<String>,
    next_steps: Vec<String>,
}

impl HumanOutput {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            summary: Vec::new(),
            details: Vec::new(),
            warnings: Vec::new(),
            next_steps: Vec::new(),
        }
    }

    pub fn push_summary(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.summary.push((key.into(), value.into()));
    }

    pub fn push_detail(&mut self, value: impl Into<String>) {
        self.details.push(value.into());
    }

    pub fn push_warning(&mut self, value: impl Into<String>) {
        self.warnings.push(value.into());
    }

    pub fn push_next_step(&mut self, value: impl Into<String>) {
        self.next_steps.push(value.into());
    }
}

/// Write a successful result as a JSON envelope or as human text.
pub fn write_success<W: Write, T: Serialize>(
    out: &mut W,
    options: OutputOptions,
    command: &str,
    data: &T,
    human: Option<&HumanOutput>,
) -> Result<()> {
    if options.json {
        let warnings = human.map(|h| h.warnings.clone()).unwrap_or_default();
        let next_steps = human.map(|h| h.next_steps.clone()).unwrap_or_default();

        #[derive(Serialize)]
        struct Envelope<'a, T: Serialize> {
            schema_version: &'static str,
            command: &'a str,
            status: &'static str,
            data: &'a T,
            #[serde(skip_serializing_if = "Vec::is_empty")]
            warnings: Vec<String>,
            #[serde(skip_serializing_if = "Vec::is_empty")]
            next_steps: Vec<String>,
        }

        let payload = Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: "success",
            data,
            warnings,
            next_steps,
        };

        writeln!(out, "{}", serde_json::to_string_pretty(&payload)?)?;
        return Ok(());
    }

    if options.quiet {
        return Ok(());
    }

    if let Some(human) = human {
        writeln!(out, "{}", format_human(human))?;
    }

    Ok(())
}

/// Report an error: JSON on stdout, or `error:`/`hint:` lines on stderr.
pub fn emit_error(command: &str, err: &Error, json: bool) -> Result<()> {
    if json {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        return write_error(&mut out, command, err, true);
    }
    let stderr = io::stderr();
    let mut out = stderr.lock();
    write_error(&mut out, command, err, false)
}

pub fn write_error<W: Write>(out: &mut W, command: &str, err: &Error, json: bool) -> Result<()> {
    let next_steps = error_next_steps(err);
    let hint = next_steps.first().map(|step| step.as_str());
    if json {
        #[derive(Serialize)]
        struct ErrorBody<'a> {
            message: &'a str,
            code: i32,
            kind: &'static str,
            #[serde(skip_serializing_if = "Option::is_none")]
            details: Option<serde_json::Value>,
        }

        #[derive(Serialize)]
        struct Envelope<'a> {
            schema_version: &'static str,
            command: &'a str,
            status: &'static str,
            error: ErrorBody<'a>,
            #[serde(skip_serializing_if = "Vec::is_empty")]
            next_steps: Vec<String>,
        }

        let payload = Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: "error",
            error: ErrorBody {
                message: &err.to_string(),
                code: err.exit_code(),
                kind: err.kind(),
                details: err.details(),
            },
            next_steps,
        };

        writeln!(out, "{}", serde_json::to_string_pretty(&payload)?)?;
        return Ok(());
    }

    writeln!(out, "error: {err}")?;
    if let Some(hint) = hint {
        writeln!(out, "hint: {hint}")?;
    }
    Ok(())
}

pub fn format_human(output: &HumanOutput) -> String {
    let mut lines = Vec::new();
    lines.push(output.header.clone());

    push_summary(&mut lines, &output.summary);
    push_section(&mut lines, "Tasks", &output.details);
    push_section(&mut lines, "Warnings", &output.warnings);
    push_section(&mut lines, "Next steps", &output.next_steps);

    lines.join("\n")
}

/// One-line rendering of a task for listings.
pub fn task_line(task: &Task) -> String {
    format!(
        "{} [{}] \"{}\" (created {}, updated {})",
        task.id(),
        task.status().label(),
        task.description(),
        task.created_at().format("%Y-%m-%d %H:%M:%S"),
        task.updated_at().format("%Y-%m-%d %H:%M:%S"),
    )
}

/// First positional argument, skipping the values of `--file` and `--config`.
pub fn infer_command_name_from_args() -> String {
    command_name(std::env::args().skip(1))
}

fn command_name(args: impl IntoIterator<Item = String>) -> String {
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        if arg == "--file" || arg == "--config" {
            args.next();
            continue;
        }
        if !arg.starts_with('-') {
            return arg;
        }
    }
    "task-cli".to_string()
}

fn error_next_steps(err: &Error) -> Vec<String> {
    match err {
        Error::NotFound(_) => vec!["task-cli list".to_string()],
        Error::InvalidConfig(_) => vec!["fix task-cli.toml then retry".to_string()],
        Error::MalformedDocument { location, .. } => {
            vec![format!("repair or move aside {location} then retry")]
        }
        Error::PersistenceFailure { location, .. } => {
            vec![format!("check that {location} is writable; nothing was changed")]
        }
        _ => Vec::new(),
    }
}

fn push_summary(lines: &mut Vec<String>, summary: &[(String, String)]) {
    if summary.is_empty() {
        return;
    }

    lines.push(String::new());
    lines.push("Summary:".to_string());
    for (key, value) in summary {
        lines.push(format!("- {key}: {value}"));
    }
}

fn push_section(lines: &mut Vec<String>, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }

    lines.push(String::new());
    lines.push(format!("{title}:"));
    for item in items {
        lines.push(format!("- {item}"));
    }
}
