// Copyright (c) The faultcheck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scenario variants and their declarative runner configuration.
//!
//! Each variant describes one scenario shape: how the test command is
//! wrapped, which exit codes are acceptable, which marker patterns apply to
//! each stream, and which structural checks run against the raw execution
//! outcome. Building a variant's [`RunnerSpec`] never executes anything;
//! execution and verification are driven separately by
//! [`scenario`](crate::scenario).

use crate::{
    classify::{Matcher, MatcherSet},
    errors::MatcherBuildError,
    exec::ExecutionOutcome,
};
use bstr::BString;

/// The exit code a panic-flagged invocation is expected to produce when no
/// explicit target code is configured.
pub const DEFAULT_PANIC_EXIT_CODE: i32 = 255;

/// The name faults are attributed to when they are not attributable to one
/// test: the top-level entry point of the binary under test.
pub const ENTRY_POINT_NAME: &str = "main";

/// What the scenario expects of the subprocess exit code.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ExitPolicy {
    /// The process must exit with exactly this code. `Exact(0)` means a
    /// clean run is required; any other value additionally implies that the
    /// process must not succeed.
    Exact(i32),
    /// The process must fail, with no particular code.
    NonZero,
    /// The exit code carries no expectation.
    Any,
}

/// A scenario-level check failure concerning the exit code or stream usage,
/// as opposed to a per-line classification anomaly.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StructuralFailure {
    /// The test program wrote to stderr in a scenario that requires it
    /// empty.
    UnexpectedStderr {
        /// The full stderr capture, after normalization would be overkill:
        /// kept raw for the diagnostic.
        stderr: BString,
    },
    /// The test program was expected to exit cleanly but did not.
    UnexpectedExitCode {
        /// The observed exit code.
        exit_code: i32,
    },
    /// The test program was required to fail but exited zero.
    DidNotFail,
    /// The test program failed, but not with the configured code.
    ExitCodeMismatch {
        /// The configured code.
        expected: i32,
        /// The observed code.
        actual: i32,
    },
}

impl std::fmt::Display for StructuralFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnexpectedStderr { stderr } => {
                write!(f, "test program wrote to stderr: {stderr}")
            }
            Self::UnexpectedExitCode { exit_code } => {
                write!(f, "test program failed with exit code {exit_code}")
            }
            Self::DidNotFail => write!(f, "test program should have failed but did not"),
            Self::ExitCodeMismatch { expected, actual } => write!(
                f,
                "test program failed with exit code {actual}, not {expected}"
            ),
        }
    }
}

/// The declarative configuration one variant supplies to the generic
/// execute-and-verify routine.
#[derive(Clone, Debug)]
pub struct RunnerSpec {
    /// Wrapper prepended to the test command (the memory checker).
    pub command_prefix: Vec<String>,
    /// Arguments appended after the test command (panic flags).
    pub extra_args: Vec<String>,
    /// The exit-code expectation.
    pub exit_policy: ExitPolicy,
    /// Matchers applied to normalized stdout lines.
    pub stdout_matchers: MatcherSet,
    /// Matchers applied to normalized stderr lines.
    pub stderr_matchers: MatcherSet,
    /// Whether any stderr output at all is a structural failure.
    pub require_empty_stderr: bool,
}

impl RunnerSpec {
    /// The full command vector for `test_command` under this spec.
    pub fn command(&self, test_command: &[String]) -> Vec<String> {
        self.command_prefix
            .iter()
            .chain(test_command)
            .chain(&self.extra_args)
            .cloned()
            .collect()
    }

    /// Inspects the raw execution outcome for structural failures.
    ///
    /// All applicable failures are reported; none of them aborts the
    /// scenario.
    pub fn structural_failures(&self, outcome: &ExecutionOutcome) -> Vec<StructuralFailure> {
        let mut failures = Vec::new();

        if self.require_empty_stderr && !outcome.stderr.is_empty() {
            failures.push(StructuralFailure::UnexpectedStderr {
                stderr: BString::from(outcome.stderr.as_ref()),
            });
        }

        match self.exit_policy {
            ExitPolicy::Exact(0) => {
                if outcome.exit_code != 0 {
                    failures.push(StructuralFailure::UnexpectedExitCode {
                        exit_code: outcome.exit_code,
                    });
                }
            }
            ExitPolicy::Exact(expected) => {
                // Both findings are informative when the program exits zero,
                // so both are reported.
                if outcome.exit_code == 0 {
                    failures.push(StructuralFailure::DidNotFail);
                }
                if outcome.exit_code != expected {
                    failures.push(StructuralFailure::ExitCodeMismatch {
                        expected,
                        actual: outcome.exit_code,
                    });
                }
            }
            ExitPolicy::NonZero => {
                if outcome.exit_code == 0 {
                    failures.push(StructuralFailure::DidNotFail);
                }
            }
            ExitPolicy::Any => {}
        }

        failures
    }
}

/// The closed set of scenario shapes.
///
/// Variants carry configuration only; the differences between them stay
/// declarative and are folded into a [`RunnerSpec`] by [`Variant::spec`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Variant {
    /// Every test passes: run under the memory checker with leak checking
    /// enabled, expect exit 0 and an empty stderr.
    Clean,
    /// The program is expected to fail, optionally with an exact exit code.
    /// Leak checking is disabled since abnormal termination is expected.
    Fail {
        /// The exact expected exit code, or `None` for any nonzero code.
        expected_code: Option<i32>,
    },
    /// A panic-flagged invocation: `--panic` with the default sentinel code,
    /// or `--panic=<code>` for an explicit one.
    Panic {
        /// The explicit panic exit code, or `None` for the sentinel.
        expected_code: Option<i32>,
    },
    /// Combined fault injection and panic. Unions the fail and panic stderr
    /// markers, with the panic and terminal logging markers narrowed to the
    /// top-level entry point: composite fault modes short-circuit normal
    /// per-test execution.
    FailPanic {
        /// The explicit panic exit code, or `None` for the sentinel.
        expected_code: Option<i32>,
    },
}

impl Variant {
    /// Builds this variant's runner spec.
    ///
    /// Fails only if a marker pattern is invalid, which surfaces before
    /// anything is executed.
    pub fn spec(&self) -> Result<RunnerSpec, MatcherBuildError> {
        match self {
            Self::Clean => Ok(RunnerSpec {
                command_prefix: leak_checking_prefix(),
                extra_args: vec![],
                exit_policy: ExitPolicy::Exact(0),
                stdout_matchers: passed_matchers()?,
                stderr_matchers: MatcherSet::empty(),
                require_empty_stderr: true,
            }),
            Self::Fail { expected_code } => Ok(RunnerSpec {
                command_prefix: plain_prefix(),
                extra_args: vec![],
                exit_policy: failure_policy(*expected_code),
                stdout_matchers: failure_stdout_matchers()?,
                stderr_matchers: fault_marker_matchers()?.silenced(),
                require_empty_stderr: false,
            }),
            Self::Panic { expected_code } => Ok(RunnerSpec {
                command_prefix: plain_prefix(),
                extra_args: vec![panic_flag(*expected_code)],
                exit_policy: ExitPolicy::Exact(
                    expected_code.unwrap_or(DEFAULT_PANIC_EXIT_CODE),
                ),
                stdout_matchers: failure_stdout_matchers()?,
                stderr_matchers: fault_marker_matchers()?.chain(panic_matchers()?).silenced(),
                require_empty_stderr: false,
            }),
            Self::FailPanic { expected_code } => Ok(RunnerSpec {
                command_prefix: plain_prefix(),
                extra_args: vec![panic_flag(*expected_code)],
                exit_policy: ExitPolicy::Exact(
                    expected_code.unwrap_or(DEFAULT_PANIC_EXIT_CODE),
                ),
                stdout_matchers: failure_stdout_matchers()?,
                stderr_matchers: fault_marker_matchers()?
                    .chain(toplevel_panic_matchers()?)
                    .chain(toplevel_logfailed_matchers()?)
                    .silenced(),
                require_empty_stderr: false,
            }),
        }
    }
}

fn leak_checking_prefix() -> Vec<String> {
    ["valgrind", "-q", "--leak-check=yes"]
        .map(String::from)
        .to_vec()
}

fn plain_prefix() -> Vec<String> {
    ["valgrind", "-q"].map(String::from).to_vec()
}

fn panic_flag(expected_code: Option<i32>) -> String {
    match expected_code {
        Some(code) => format!("--panic={code}"),
        None => "--panic".to_owned(),
    }
}

fn failure_policy(expected_code: Option<i32>) -> ExitPolicy {
    match expected_code {
        Some(code) => ExitPolicy::Exact(code),
        None => ExitPolicy::NonZero,
    }
}

fn passed_matchers() -> Result<MatcherSet, MatcherBuildError> {
    Ok(MatcherSet::new([
        Matcher::labeled("passed", r"^passed: (?P<test>test\S*)")?,
        Matcher::summary(r"^All [0-9]+ tests passed$")?,
    ]))
}

fn failure_stdout_matchers() -> Result<MatcherSet, MatcherBuildError> {
    Ok(MatcherSet::new([
        Matcher::labeled("passed", r"^passed: (?P<test>test\S*)")?,
        Matcher::labeled("FAILED", r"^FAILED: [^:]+:[0-9]+:(?P<test>test\S*)")?,
    ]))
}

fn fault_marker_matchers() -> Result<MatcherSet, MatcherBuildError> {
    Ok(MatcherSet::new([
        Matcher::labeled("NOMEM", r"^NOMEM \(in [^:]+:(?P<test>test\w*)")?,
        Matcher::labeled("LOGFAILED", r"^LOGFAILED \(in [^:]+:(?P<test>test\S*)\)")?,
    ]))
}

fn panic_matchers() -> Result<MatcherSet, MatcherBuildError> {
    Ok(MatcherSet::new([Matcher::labeled(
        "PANIC",
        r"^PANIC! \([^:]+:[0-9]+ in (?P<test>\S+)\):",
    )?]))
}

fn toplevel_panic_matchers() -> Result<MatcherSet, MatcherBuildError> {
    Ok(MatcherSet::new([Matcher::labeled(
        "PANIC",
        &format!(r"^PANIC! \([^:]+:[0-9]+ in (?P<test>{ENTRY_POINT_NAME})\):"),
    )?]))
}

fn toplevel_logfailed_matchers() -> Result<MatcherSet, MatcherBuildError> {
    Ok(MatcherSet::new([Matcher::labeled(
        "LOGFAILED",
        &format!(r"^LOGFAILED \(in [^:]+:(?P<test>{ENTRY_POINT_NAME})\): Error logging error\."),
    )?]))
}
