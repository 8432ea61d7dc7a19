// Copyright (c) The faultcheck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::output::StderrStyles;
use faultcheck_runner::{
    errors::{FatalError, MatcherBuildError, SourceScanError, SpawnError},
    exit_codes::FaultcheckExitCode,
};
use owo_colors::OwoColorize;
use std::error::Error;
use thiserror::Error;

// The #[error()] strings are placeholder messages -- the expected way to
// print out errors is with the display_to_stderr method, which colorizes
// them.

/// An error that terminates a faultcheck run before verification completes.
///
/// Only harness misconfiguration lands here: an unreadable source file, a
/// command that cannot be spawned, a broken matcher pattern, or an
/// unwritable output stream. Findings about the binary under test are never
/// errors; they accumulate into the verification outcome instead.
#[derive(Debug, Error)]
pub enum ExpectedError {
    #[error("source scan failed")]
    SourceScanError {
        #[from]
        err: SourceScanError,
    },
    #[error("spawning the test command failed")]
    SpawnError {
        #[from]
        err: SpawnError,
    },
    #[error("building scenario matchers failed")]
    MatcherBuildError {
        #[from]
        err: MatcherBuildError,
    },
    #[error("writing to stdout failed")]
    WriteOutputError {
        #[source]
        err: std::io::Error,
    },
}

impl From<FatalError> for ExpectedError {
    fn from(err: FatalError) -> Self {
        match err {
            FatalError::SourceScan(err) => err.into(),
            FatalError::Spawn(err) => err.into(),
            FatalError::MatcherBuild(err) => err.into(),
        }
    }
}

impl ExpectedError {
    pub(crate) fn write_output_error(err: std::io::Error) -> Self {
        Self::WriteOutputError { err }
    }

    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            // An unreadable source file propagates the OS error code, so
            // wrapper scripts can tell ENOENT from EACCES.
            Self::SourceScanError { err } => err
                .os_error_code()
                .unwrap_or(FaultcheckExitCode::SETUP_ERROR),
            Self::SpawnError { .. } => FaultcheckExitCode::SPAWN_FAILED,
            Self::MatcherBuildError { .. } => FaultcheckExitCode::SETUP_ERROR,
            Self::WriteOutputError { .. } => FaultcheckExitCode::WRITE_OUTPUT_ERROR,
        }
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        let mut next_error = match &self {
            Self::SourceScanError { err } => {
                tracing::error!("{err}");
                err.source()
            }
            Self::SpawnError { err } => {
                tracing::error!("{err}");
                err.source()
            }
            Self::MatcherBuildError { err } => {
                tracing::error!(
                    "{} {err}",
                    "scenario configuration is broken:".style(styles.bold)
                );
                err.source()
            }
            Self::WriteOutputError { err } => {
                tracing::error!("failed to write output");
                Some(err as &dyn Error)
            }
        };

        while let Some(err) = next_error {
            tracing::error!(target: "faultcheck::no_heading", "\nCaused by:\n  {}", err);
            next_error = err.source();
        }
    }
}
