//! Console input: where command lines come from and how they are read.
//!
//! A line is split into words (a double-quoted run is one word, so
//! `add "Buy groceries"` has two), an optional leading `task-cli` is dropped,
//! and the rest is parsed with the same clap definitions as the CLI.

use std::collections::VecDeque;
use std::fs;
use std::io::BufRead;
use std::path::{Path, PathBuf};

use clap::error::ErrorKind;
use clap::{Parser, Subcommand};

use crate::cli::task::TaskCommand;
use crate::error::{Error, Result};

/// Program name accepted in front of console commands
pub const PROGRAM_NAME: &str = "task-cli";

#[derive(Parser, Debug)]
#[command(name = PROGRAM_NAME, no_binary_name = true, disable_version_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

/// Commands understood by the console
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    #[command(flatten)]
    Task(TaskCommand),

    /// Re-read the task document from disk
    Reload,

    /// Leave the console
    Exit,
}

/// Result of reading one console line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellInput {
    /// Blank line
    Empty,
    /// Command to run
    Command(ShellCommand),
    /// Help text requested with `help` or `--help`
    Help(String),
}

/// Parse one console line.
pub fn parse_line(line: &str) -> Result<ShellInput> {
    let mut words = split_line(line)?;
    if words.first().map(String::as_str) == Some(PROGRAM_NAME) {
        words.remove(0);
    }
    if words.is_empty() {
        return Ok(ShellInput::Empty);
    }

    match ShellLine::try_parse_from(words) {
        Ok(parsed) => Ok(ShellInput::Command(parsed.command)),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
            | ErrorKind::DisplayVersion => Ok(ShellInput::Help(err.render().to_string())),
            _ => Err(usage_error(&err)),
        },
    }
}

fn usage_error(err: &clap::Error) -> Error {
    let rendered = err.render().to_string();
    let first = rendered.lines().next().unwrap_or_default();
    let message = first.strip_prefix("error: ").unwrap_or(first);
    Error::InvalidArgument(format!("{message} (type 'help' for usage)"))
}

/// Split a line into words. Double quotes group words; `\"` and `\\` escape
/// inside quotes.
pub fn split_line(line: &str) -> Result<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = line.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(next @ ('"' | '\\')) => current.push(next),
                            Some(next) => {
                                current.push('\\');
                                current.push(next);
                            }
                            None => return Err(unterminated_quote()),
                        },
                        Some(other) => current.push(other),
                        None => return Err(unterminated_quote()),
                    }
                }
            }
            ch if ch.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            other => {
                in_word = true;
                current.push(other);
            }
        }
    }

    if in_word {
        words.push(current);
    }
    Ok(words)
}

fn unterminated_quote() -> Error {
    Error::InvalidArgument("unterminated quote".to_string())
}

/// A supply of raw command lines.
pub trait CommandSource {
    /// Next command line, or `None` once the source is exhausted.
    fn next_command(&mut self) -> Result<Option<String>>;

    /// Interactive sources get a prompt and keep going after errors.
    fn is_interactive(&self) -> bool;
}

/// Lines typed at a terminal (or anything else readable line by line).
pub struct ConsoleSource<R: BufRead> {
    reader: R,
}

impl<R: BufRead> ConsoleSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> CommandSource for ConsoleSource<R> {
    fn next_command(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn is_interactive(&self) -> bool {
        true
    }
}

/// Commands read from a script file, one per line. Blank lines and lines
/// starting with `#` are skipped.
#[derive(Debug)]
pub struct ScriptSource {
    origin: PathBuf,
    lines: VecDeque<(usize, String)>,
    current_line: usize,
}

impl ScriptSource {
    pub fn open(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|err| {
            Error::InvalidArgument(format!("cannot read script {}: {err}", path.display()))
        })?;
        Ok(Self::from_text(path, &text))
    }

    pub fn from_text(origin: impl Into<PathBuf>, text: &str) -> Self {
        let lines = text
            .lines()
            .enumerate()
            .filter(|(_, line)| {
                let trimmed = line.trim();
                !trimmed.is_empty() && !trimmed.starts_with('#')
            })
            .map(|(index, line)| (index + 1, line.to_string()))
            .collect();
        Self {
            origin: origin.into(),
            lines,
            current_line: 0,
        }
    }

    /// `path:line` of the command handed out last
    pub fn position(&self) -> String {
        format!("{}:{}", self.origin.display(), self.current_line)
    }
}

impl CommandSource for ScriptSource {
    fn next_command(&mut self) -> Result<Option<String>> {
        Ok(self.lines.pop_front().map(|(number, line)| {
            self.current_line = number;
            tracing::debug!(position = %self.position(), "script command");
            line
        }))
    }

    fn is_interactive(&self) -> bool {
        false
    }
}
