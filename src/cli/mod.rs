//! Command-line interface for task-cli
//!
//! This module defines the CLI structure using clap derive macros. Task
//! subcommands live in [`task`] so the console can reuse them.

use std::io;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::error::Result;
use crate::gateway::PersistenceGateway;
use crate::mode::{ApiMode, ConsoleMode, OperationMode};
use crate::output::OutputOptions;
use crate::service::TaskService;
use crate::shell::{ConsoleSource, ScriptSource};

pub mod task;

use task::TaskCommand;

/// task-cli - a small task tracker
///
/// Tasks are kept in a JSON document; every change is written through to it
/// before the command reports success.
#[derive(Parser, Debug)]
#[command(name = "task-cli")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file (defaults to ./task-cli.toml, then the user config)
    #[arg(long, global = true, env = "TASK_CLI_CONFIG")]
    pub config: Option<PathBuf>,

    /// Task document to use instead of the configured json.file.path
    #[arg(long, global = true, env = "TASK_CLI_FILE")]
    pub file: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(flatten)]
    Task(TaskCommand),

    /// Interactive console reading commands from stdin
    Console,

    /// Run the commands in a script file, stopping at the first failure
    Run {
        /// Script with one console command per line; `#` starts a comment
        script: PathBuf,
    },

    /// Programmatic API front end
    Api,
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let options = OutputOptions {
            json: self.json,
            quiet: self.quiet,
        };

        let cwd = std::env::current_dir()?;
        let mut config = Config::discover(self.config.as_deref(), &cwd)?;
        if let Some(file) = &self.file {
            config = config.with_document_path(file.to_string_lossy());
        }

        let gateway = PersistenceGateway::from_config(&config)?;
        let mut service = TaskService::new(gateway);
        tracing::debug!(document = %service.gateway().location(), "task document opened");

        match self.command {
            Commands::Task(command) => {
                let stdout = io::stdout();
                let mut out = stdout.lock();
                task::execute(&mut service, command, options, &mut out)
            }
            Commands::Console => {
                let stdin = io::stdin();
                let source = ConsoleSource::new(stdin.lock());
                ConsoleMode::new(source, io::stdout(), options).start(&mut service)
            }
            Commands::Run { script } => {
                let source = ScriptSource::open(&script)?;
                ConsoleMode::new(source, io::stdout(), options).start(&mut service)
            }
            Commands::Api => ApiMode.start(&mut service),
        }
    }
}
