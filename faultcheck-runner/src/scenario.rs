// Copyright (c) The faultcheck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Driving one configured scenario end to end.
//!
//! Scenarios execute strictly sequentially, each one a blocking pipeline:
//! scan the source (or reuse a cached set), run the wrapped command, then
//! normalize, classify, and structurally check the captured output. The only
//! state worth sharing between scenarios against the same source file is the
//! [`SourceDefinitionSet`]; outcome codes are combined by the caller with
//! [`OutcomeCode::absorb`](crate::verify::OutcomeCode::absorb).

use crate::{
    classify::classify,
    errors::FatalError,
    exec::ProcessExecutor,
    normalize::normalized_lines,
    source_scan::{scan_source, SourceDefinitionSet},
    variant::Variant,
    verify::Results,
};
use camino::Utf8PathBuf;

/// One configured scenario: a variant, the test command it wraps, and the
/// source file its expectations derive from.
#[derive(Clone, Debug)]
pub struct Scenario {
    /// The scenario shape.
    pub variant: Variant,
    /// The test binary and its arguments, before wrapping.
    pub command: Vec<String>,
    /// The test source file to scan for declared tests.
    pub source: Utf8PathBuf,
    /// Working directory override for the subprocess. `None` inherits the
    /// caller's.
    pub cwd: Option<Utf8PathBuf>,
}

impl Scenario {
    /// Runs the scenario, scanning the source file first.
    pub fn run(&self, executor: &dyn ProcessExecutor) -> Result<Results, FatalError> {
        let source = scan_source(&self.source)?;
        self.run_with_source(executor, source)
    }

    /// Runs the scenario against an already-scanned source set.
    ///
    /// Only harness misconfiguration is an `Err` here: an unbuildable
    /// matcher list or a spawn failure. Everything the subprocess itself
    /// does wrong comes back accumulated inside [`Results`].
    pub fn run_with_source(
        &self,
        executor: &dyn ProcessExecutor,
        source: SourceDefinitionSet,
    ) -> Result<Results, FatalError> {
        let spec = self.variant.spec()?;
        let command = spec.command(&self.command);

        tracing::debug!(
            "running {:?} scenario: {}",
            self.variant,
            shell_words::join(&command)
        );
        let outcome = executor.run(&command, self.cwd.as_deref())?;
        tracing::debug!("test program exited with code {}", outcome.exit_code);

        let stdout = classify(&normalized_lines(&outcome.stdout), &spec.stdout_matchers);
        let stderr = classify(&normalized_lines(&outcome.stderr), &spec.stderr_matchers);

        let mut results = Results::new(source, [stdout, stderr]);
        results.record_structural(spec.structural_failures(&outcome));
        Ok(results)
    }
}
