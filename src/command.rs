//! Blocking invocation of external programs.
//!
//! Every program skywall runs (ImageMagick, curl, the desktop tools) goes
//! through [`run_echoed`]: the command line is printed first, then the
//! process runs to completion and a non-zero exit becomes an error.
//! There is no retry and no timeout.

use crate::output;
use std::ffi::OsStr;
use std::process::{Command, ExitStatus};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Command `{command}` failed ({status})")]
    Failed { command: String, status: ExitStatus },
}

/// A program plus its arguments, kept as plain strings so the same value
/// can be echoed, asserted on in tests, and executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for a in args {
            self = self.arg(a);
        }
        self
    }

    /// Command line as it is echoed to the operator.
    pub fn command_line(&self) -> String {
        output::format_command(&self.program, &self.args)
    }

    fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

/// Print the command line, run it, and fail on a non-zero exit.
pub fn run_echoed(invocation: &Invocation) -> Result<(), CommandError> {
    output::print_command(&invocation.program, &invocation.args);
    let status = invocation
        .to_command()
        .status()
        .map_err(|source| CommandError::Spawn {
            program: invocation.program.clone(),
            source,
        })?;
    if !status.success() {
        return Err(CommandError::Failed {
            command: invocation.command_line(),
            status,
        });
    }
    Ok(())
}

/// Run without echoing and return stdout. Used for probes, whose output is
/// consumed rather than shown.
pub fn capture(invocation: &Invocation) -> Result<String, CommandError> {
    tracing::debug!(command = %invocation.command_line(), "capturing");
    let out = invocation
        .to_command()
        .output()
        .map_err(|source| CommandError::Spawn {
            program: invocation.program.clone(),
            source,
        })?;
    if !out.status.success() {
        return Err(CommandError::Failed {
            command: invocation.command_line(),
            status: out.status,
        });
    }
    Ok(String::from_utf8_lossy(&out.stdout).into_owned())
}
