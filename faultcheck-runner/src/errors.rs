// Copyright (c) The faultcheck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by faultcheck.

use camino::Utf8PathBuf;
use thiserror::Error;

/// An error that occurred while reading a test source file.
///
/// This is always fatal: an unreadable source file means the harness is
/// misconfigured, not that the binary under test misbehaved. The CLI maps it
/// to an immediate exit with the underlying OS error code.
#[derive(Debug, Error)]
#[error("failed to read test source at `{path}`")]
pub struct SourceScanError {
    path: Utf8PathBuf,
    #[source]
    err: std::io::Error,
}

impl SourceScanError {
    pub(crate) fn new(path: impl Into<Utf8PathBuf>, err: std::io::Error) -> Self {
        Self {
            path: path.into(),
            err,
        }
    }

    /// The OS error code for the underlying I/O failure, if there is one.
    pub fn os_error_code(&self) -> Option<i32> {
        self.err.raw_os_error()
    }
}

/// An error that occurred while spawning the test command or reading its
/// output. Also fatal: it indicates a broken harness setup.
#[derive(Debug, Error)]
pub enum SpawnError {
    /// The command vector was empty.
    #[error("cannot spawn an empty command")]
    EmptyCommand,

    /// The process failed to launch or its streams could not be read.
    #[error("failed to run `{command}`")]
    Exec {
        /// The full command line, shell-quoted for display.
        command: String,
        /// The underlying I/O error.
        #[source]
        err: std::io::Error,
    },
}

impl SpawnError {
    pub(crate) fn exec(
        command: impl IntoIterator<Item = impl AsRef<str>>,
        err: std::io::Error,
    ) -> Self {
        Self::Exec {
            command: shell_words::join(command),
            err,
        }
    }
}

/// An error that occurred while building a [`Matcher`](crate::classify::Matcher).
///
/// Matcher lists are fixed at scenario-build time, so these surface before
/// anything is executed.
#[derive(Debug, Error)]
pub enum MatcherBuildError {
    /// The pattern failed to compile.
    #[error("invalid matcher pattern `{pattern}`")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// The regex compile error.
        #[source]
        err: Box<regex::Error>,
    },

    /// A labeled pattern does not define the mandatory test-name capture.
    #[error(
        "matcher pattern `{pattern}` for label `{label}` does not define a `{capture}` capture",
        capture = crate::classify::TEST_NAME_CAPTURE,
    )]
    MissingTestNameCapture {
        /// The matcher's label.
        label: String,
        /// The offending pattern.
        pattern: String,
    },

    /// An unlabeled (pure summary) pattern defines capture groups, which
    /// would silently be ignored.
    #[error("summary pattern `{pattern}` must not define capture groups")]
    SummaryPatternCaptures {
        /// The offending pattern.
        pattern: String,
    },
}

/// A fatal error from running a scenario end to end.
///
/// Everything else the pipeline observes (unexpected output lines, duplicate
/// test names, wrong exit codes, failed invariant checks) is accumulated
/// non-fatally and reported at the end of the run.
#[derive(Debug, Error)]
pub enum FatalError {
    /// The test source could not be read.
    #[error(transparent)]
    SourceScan(#[from] SourceScanError),

    /// The test command could not be spawned.
    #[error(transparent)]
    Spawn(#[from] SpawnError),

    /// A scenario's matcher list failed to build.
    #[error(transparent)]
    MatcherBuild(#[from] MatcherBuildError),
}
