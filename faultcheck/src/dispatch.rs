// Copyright (c) The faultcheck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    output::{OutputContext, OutputOpts, OutputWriter},
    ExpectedError,
};
use camino::Utf8PathBuf;
use clap::{Parser, ValueEnum};
use faultcheck_runner::{
    exec::DuctExecutor,
    scenario::Scenario,
    variant::{Variant, ENTRY_POINT_NAME},
    verify::Results,
    TestName,
};
use owo_colors::OwoColorize;
use std::{collections::BTreeSet, io::Write};

/// Verifies that a unit-test binary fails the way it is supposed to.
///
/// faultcheck scans SOURCE_FILE for declared tests, runs TEST_COMMAND under
/// valgrind, classifies every output line against the selected scenario's
/// marker patterns, and checks the observed test sets against the source.
#[derive(Debug, Parser)]
#[command(version, bin_name = "faultcheck", styles = crate::output::clap_styles::style())]
pub struct FaultcheckApp {
    /// Test source file scanned for declared tests
    #[arg(value_name = "SOURCE_FILE")]
    source_file: Utf8PathBuf,

    /// Test command to run, with its arguments
    #[arg(
        value_name = "TEST_COMMAND",
        required = true,
        num_args = 1..,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    test_command: Vec<String>,

    /// Scenario shape to verify against
    #[arg(long, value_enum, default_value_t, value_name = "VARIANT")]
    variant: VariantOpt,

    /// Exact exit code the test program must produce
    #[arg(long, value_name = "CODE")]
    expect_exit: Option<i32>,

    /// Working directory for the test program [default: inherited]
    #[arg(long, env = "FAULTCHECK_TEST_DIR", value_name = "DIR")]
    test_dir: Option<Utf8PathBuf>,

    #[command(flatten)]
    output: OutputOpts,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, ValueEnum)]
enum VariantOpt {
    /// Every test passes, stderr stays empty
    #[default]
    Clean,
    /// The program fails, reporting injected faults on stderr
    Fail,
    /// The program is invoked with the panic flag
    Panic,
    /// Combined fault injection and panic
    FailPanic,
}

impl VariantOpt {
    fn to_variant(self, expected_code: Option<i32>) -> Variant {
        match self {
            Self::Clean => Variant::Clean,
            Self::Fail => Variant::Fail { expected_code },
            Self::Panic => Variant::Panic { expected_code },
            Self::FailPanic => Variant::FailPanic { expected_code },
        }
    }
}

impl FaultcheckApp {
    /// Initializes the output context.
    pub fn init_output(&self) -> OutputContext {
        self.output.init()
    }

    /// Executes the app, returning the process exit code on a completed
    /// verification.
    pub fn exec(
        self,
        output: OutputContext,
        output_writer: &mut OutputWriter,
    ) -> Result<i32, ExpectedError> {
        let variant = self.variant.to_variant(self.expect_exit);
        let scenario = Scenario {
            variant,
            command: self.test_command,
            source: self.source_file,
            cwd: self.test_dir,
        };

        if output.verbose {
            tracing::info!(
                "verifying `{}` against `{}`",
                scenario.command.join(" "),
                scenario.source
            );
        }

        let mut results = scenario.run(&DuctExecutor)?;

        let styles = output.stdout_styles();
        let mut stdout = output_writer.stdout_writer();
        for line in results.echoes() {
            writeln!(stdout, "{} {line}", "OK:".style(styles.pass))
                .map_err(ExpectedError::write_output_error)?;
        }
        stdout.flush().map_err(ExpectedError::write_output_error)?;

        default_checks(&mut results, variant);

        for diagnostic in results.diagnostics() {
            tracing::warn!("{diagnostic}");
        }
        let outcome = results.outcome();
        if outcome.is_pass() {
            tracing::info!("all checks passed");
        } else {
            tracing::error!("[{}] errors found verifying test output", outcome.code());
        }
        Ok(outcome.code())
    }
}

/// The checks every scenario runs unless a library driver supplies its own.
///
/// The passed bucket is expected to hold exactly the tests that produced
/// output and were not attributed to a fault marker. Panic-family scenarios
/// short-circuit per-test execution, so source coverage cannot be required
/// there and the panic must be attributed to the entry point.
fn default_checks(results: &mut Results, variant: Variant) {
    let run = results.run_set().clone();
    let source = results.source_set().clone();

    let faulted: BTreeSet<TestName> = results
        .buckets()
        .iter()
        .filter(|(label, _)| *label != "passed")
        .flat_map(|(_, names)| names.iter().cloned())
        .collect();
    let expected_passed: BTreeSet<TestName> = run.difference(&faulted).cloned().collect();

    match variant {
        Variant::Clean | Variant::Fail { .. } => {
            results.check_found(&source);
            results.check_run(&run);
            results.check_matched("passed", &expected_passed, true);
        }
        Variant::Panic { .. } | Variant::FailPanic { .. } => {
            let mut observed = run.clone();
            observed.remove(ENTRY_POINT_NAME);
            results.check_run(&observed);
            results.check_matched("passed", &expected_passed, true);
            results.check_matched(
                "PANIC",
                &BTreeSet::from([TestName::from(ENTRY_POINT_NAME)]),
                true,
            );
        }
    }
}
