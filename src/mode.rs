//! Operation modes: the front ends that drive a [`TaskService`].

use std::io::Write;

use crate::cli::task::execute;
use crate::document::DocumentStore;
use crate::error::{Error, Result};
use crate::output::{write_error, OutputOptions};
use crate::service::TaskService;
use crate::shell::{parse_line, CommandSource, ShellCommand, ShellInput};

pub const PROMPT: &str = "> ";
pub const FAREWELL: &str = "Goodbye! :)";

/// A front end that runs until the user leaves or its input ends.
pub trait OperationMode {
    fn start<D: DocumentStore>(&mut self, service: &mut TaskService<D>) -> Result<()>;

    fn stop(&mut self);
}

enum Flow {
    Continue,
    Exit,
}

/// Read-eval-print loop over a [`CommandSource`].
///
/// Interactive sources see a prompt and a failing command only prints its
/// error. Scripts stop at the first failing command and hand its error back
/// to the caller.
pub struct ConsoleMode<S: CommandSource, W: Write> {
    source: S,
    out: W,
    options: OutputOptions,
    running: bool,
}

impl<S: CommandSource, W: Write> ConsoleMode<S, W> {
    pub fn new(source: S, out: W, options: OutputOptions) -> Self {
        Self {
            source,
            out,
            options,
            running: false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn into_output(self) -> W {
        self.out
    }

    fn handle_line<D: DocumentStore>(
        &mut self,
        service: &mut TaskService<D>,
        line: &str,
    ) -> Result<Flow> {
        match parse_line(line)? {
            ShellInput::Empty => Ok(Flow::Continue),
            ShellInput::Help(text) => {
                write!(self.out, "{text}")?;
                Ok(Flow::Continue)
            }
            ShellInput::Command(ShellCommand::Exit) => Ok(Flow::Exit),
            ShellInput::Command(ShellCommand::Reload) => {
                service.reload()?;
                if !self.options.quiet && !self.options.json {
                    writeln!(self.out, "Reloaded {}", service.gateway().location())?;
                }
                Ok(Flow::Continue)
            }
            ShellInput::Command(ShellCommand::Task(command)) => {
                tracing::debug!(command = command.name(), "console command");
                execute(service, command, self.options, &mut self.out)?;
                Ok(Flow::Continue)
            }
        }
    }
}

impl<S: CommandSource, W: Write> OperationMode for ConsoleMode<S, W> {
    fn start<D: DocumentStore>(&mut self, service: &mut TaskService<D>) -> Result<()> {
        let interactive = self.source.is_interactive();
        tracing::info!(interactive, "console started");
        self.running = true;

        while self.running {
            if interactive {
                write!(self.out, "{PROMPT}")?;
                self.out.flush()?;
            }

            let Some(line) = self.source.next_command()? else {
                break;
            };

            match self.handle_line(service, &line) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Exit) => {
                    writeln!(self.out, "{FAREWELL}")?;
                    self.stop();
                }
                Err(err) if interactive => {
                    tracing::warn!(error = %err, "console command failed");
                    write_error(&mut self.out, "console", &err, self.options.json)?;
                }
                Err(err) => {
                    tracing::warn!(error = %err, line = %line, "script aborted");
                    self.stop();
                    self.out.flush()?;
                    return Err(err);
                }
            }
        }

        self.running = false;
        self.out.flush()?;
        tracing::info!("console stopped");
        Ok(())
    }

    fn stop(&mut self) {
        self.running = false;
    }
}

/// Programmatic front end. Not available yet.
#[derive(Debug, Default)]
pub struct ApiMode;

impl OperationMode for ApiMode {
    fn start<D: DocumentStore>(&mut self, _service: &mut TaskService<D>) -> Result<()> {
        Err(Error::Unsupported("API mode is not implemented".to_string()))
    }

    fn stop(&mut self) {}
}
