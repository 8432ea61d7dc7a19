// Copyright (c) The faultcheck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The process-executor contract and its blocking implementation.

use crate::errors::SpawnError;
use bytes::Bytes;
use camino::Utf8Path;
use std::process::ExitStatus;

/// The complete captured output of one subprocess run.
///
/// Built once per run and never modified afterwards.
#[derive(Clone, Debug)]
pub struct ExecutionOutcome {
    /// Everything the process wrote to stdout.
    pub stdout: Bytes,
    /// Everything the process wrote to stderr.
    pub stderr: Bytes,
    /// The process exit code. On unix, a signal-terminated process is
    /// reported as the negated signal number.
    pub exit_code: i32,
}

/// Runs a command to completion and captures its output.
///
/// This is the pipeline's only external collaborator: everything downstream
/// of it operates on the captured [`ExecutionOutcome`] in memory. Tests
/// substitute a scripted implementation.
pub trait ProcessExecutor {
    /// Spawns `command[0]` with the remaining elements as arguments, blocks
    /// until it exits, and captures both streams in full.
    ///
    /// `cwd` overrides the working directory for the child; `None` inherits
    /// the caller's.
    fn run(
        &self,
        command: &[String],
        cwd: Option<&Utf8Path>,
    ) -> Result<ExecutionOutcome, SpawnError>;
}

/// A [`ProcessExecutor`] that spawns the command with [`duct`] and blocks
/// until exit.
///
/// There is deliberately no timeout: a hung subprocess blocks the pipeline
/// indefinitely. This is a documented limitation, accepted because the
/// binaries under test are short-lived unit-test programs.
#[derive(Clone, Copy, Debug, Default)]
pub struct DuctExecutor;

impl ProcessExecutor for DuctExecutor {
    fn run(
        &self,
        command: &[String],
        cwd: Option<&Utf8Path>,
    ) -> Result<ExecutionOutcome, SpawnError> {
        let (program, args) = command.split_first().ok_or(SpawnError::EmptyCommand)?;

        // unchecked() because nonzero exits are findings for the verifier,
        // not errors.
        let mut expression = duct::cmd(program.as_str(), args)
            .stdout_capture()
            .stderr_capture()
            .unchecked();
        if let Some(dir) = cwd {
            expression = expression.dir(dir.as_std_path());
        }

        let output = expression
            .run()
            .map_err(|err| SpawnError::exec(command, err))?;

        Ok(ExecutionOutcome {
            stdout: Bytes::from(output.stdout),
            stderr: Bytes::from(output.stderr),
            exit_code: exit_code_for(output.status),
        })
    }
}

#[cfg(unix)]
fn exit_code_for(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    match status.code() {
        Some(code) => code,
        None => status.signal().map_or(-1, |signal| -signal),
    }
}

#[cfg(not(unix))]
fn exit_code_for(status: ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}
