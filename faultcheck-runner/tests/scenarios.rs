// Copyright (c) The faultcheck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end scenario runs against a scripted process executor.

use bytes::Bytes;
use camino::{Utf8Path, Utf8PathBuf};
use camino_tempfile::Utf8TempDir;
use faultcheck_runner::{
    errors::SpawnError,
    exec::{ExecutionOutcome, ProcessExecutor},
    scenario::Scenario,
    variant::{Variant, DEFAULT_PANIC_EXIT_CODE},
    verify::{OutcomeCode, Results},
    TestName,
};
use maplit::btreeset;
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::collections::BTreeSet;

/// Replays a scripted outcome and records the command it was asked to run.
struct ScriptedExecutor {
    stdout: &'static str,
    stderr: &'static str,
    exit_code: i32,
    commands: RefCell<Vec<Vec<String>>>,
}

impl ScriptedExecutor {
    fn new(stdout: &'static str, stderr: &'static str, exit_code: i32) -> Self {
        Self {
            stdout,
            stderr,
            exit_code,
            commands: RefCell::new(Vec::new()),
        }
    }
}

impl ProcessExecutor for ScriptedExecutor {
    fn run(
        &self,
        command: &[String],
        _cwd: Option<&Utf8Path>,
    ) -> Result<ExecutionOutcome, SpawnError> {
        self.commands.borrow_mut().push(command.to_vec());
        Ok(ExecutionOutcome {
            stdout: Bytes::copy_from_slice(self.stdout.as_bytes()),
            stderr: Bytes::copy_from_slice(self.stderr.as_bytes()),
            exit_code: self.exit_code,
        })
    }
}

fn write_source(dir: &Utf8TempDir, declarations: &[&str]) -> Utf8PathBuf {
    let path = dir.path().join("test_widget.c");
    let contents: String = declarations
        .iter()
        .map(|name| format!("static int {name}(void) {{ return 0; }}\n"))
        .collect();
    std::fs::write(&path, contents).expect("write test source");
    path
}

fn scenario(variant: Variant, source: Utf8PathBuf) -> Scenario {
    Scenario {
        variant,
        command: vec!["./widget-test".to_owned()],
        source,
        cwd: None,
    }
}

fn names(list: &[&str]) -> BTreeSet<TestName> {
    list.iter().map(|name| TestName::from(*name)).collect()
}

#[test]
fn clean_run_passes_every_check() {
    let dir = Utf8TempDir::new().unwrap();
    let source = write_source(&dir, &["test_alpha"]);
    let executor = ScriptedExecutor::new("passed: test_alpha\nAll 1 tests passed\n", "", 0);

    let mut results = scenario(Variant::Clean, source).run(&executor).unwrap();

    assert_eq!(results.run_set(), &names(&["test_alpha"]));
    assert_eq!(results.diagnostics().len(), 0);

    let source_set = results.source_set().clone();
    let run_set = results.run_set().clone();
    results.check_found(&source_set);
    results.check_run(&run_set);
    results.check_matched("passed", &run_set, true);

    assert!(results.outcome().is_pass());
    assert_eq!(
        executor.commands.borrow()[0],
        vec!["valgrind", "-q", "--leak-check=yes", "./widget-test"]
    );
}

#[test]
fn typed_fault_lands_in_the_right_buckets() {
    let dir = Utf8TempDir::new().unwrap();
    let source = write_source(&dir, &["test_alpha", "test_beta"]);
    let executor = ScriptedExecutor::new(
        "passed: test_alpha\n",
        "NOMEM (in test_widget.c:test_beta) out of memory\n",
        12,
    );

    let mut results = scenario(
        Variant::Fail {
            expected_code: Some(12),
        },
        source,
    )
    .run(&executor)
    .unwrap();

    assert_eq!(results.matched("passed"), names(&["test_alpha"]));
    assert_eq!(results.matched("NOMEM"), names(&["test_beta"]));

    let source_set = results.source_set().clone();
    results.check_found(&source_set);
    results.check_matched("passed", &names(&["test_alpha"]), true);
    assert!(results.outcome().is_pass());
}

#[test]
fn protocol_violation_is_reported_but_checks_still_run() {
    let dir = Utf8TempDir::new().unwrap();
    let source = write_source(&dir, &["test_alpha"]);
    let executor = ScriptedExecutor::new(
        "??? garbage\npassed: test_alpha\nAll 1 tests passed\n",
        "",
        0,
    );

    let mut results = scenario(Variant::Clean, source).run(&executor).unwrap();

    assert_eq!(results.diagnostics().len(), 1);
    assert!(!results.outcome().is_pass());

    // Later checks still execute and can pass on their own terms.
    let source_set = results.source_set().clone();
    results.check_found(&source_set);
    results.check_matched("passed", &names(&["test_alpha"]), true);
    assert_eq!(results.diagnostics().len(), 1);
    assert_eq!(results.outcome().code(), 1);
}

#[test]
fn duplicate_passed_line_is_a_single_anomaly() {
    let dir = Utf8TempDir::new().unwrap();
    let source = write_source(&dir, &["test_alpha"]);
    let executor = ScriptedExecutor::new(
        "passed: test_alpha\npassed: test_alpha\nAll 1 tests passed\n",
        "",
        0,
    );

    let results = scenario(Variant::Clean, source).run(&executor).unwrap();

    assert_eq!(results.diagnostics().len(), 1);
    assert_eq!(results.matched("passed"), names(&["test_alpha"]));
    assert!(!results.outcome().is_pass());
}

#[test]
fn panic_scenario_attributes_the_panic_to_its_function() {
    let dir = Utf8TempDir::new().unwrap();
    let source = write_source(&dir, &["test_alpha", "test_beta"]);
    let executor = ScriptedExecutor::new(
        "passed: test_alpha\n",
        "PANIC! (test_widget.c:42 in test_beta): induced panic\n",
        DEFAULT_PANIC_EXIT_CODE,
    );

    let mut results = scenario(Variant::Panic { expected_code: None }, source)
        .run(&executor)
        .unwrap();

    assert_eq!(results.matched("PANIC"), names(&["test_beta"]));
    assert_eq!(results.diagnostics().len(), 0);

    results.check_matched("PANIC", &names(&["test_beta"]), true);
    assert!(results.outcome().is_pass());
    assert_eq!(
        executor.commands.borrow()[0],
        vec!["valgrind", "-q", "./widget-test", "--panic"]
    );
}

#[test]
fn composite_fault_mode_expects_the_top_level_entry_point() {
    let dir = Utf8TempDir::new().unwrap();
    let source = write_source(&dir, &["test_alpha", "test_logging"]);
    let executor = ScriptedExecutor::new(
        "passed: test_alpha\n",
        concat!(
            "LOGFAILED (in test_widget.c:test_logging) injected\n",
            "LOGFAILED (in test_widget.c:main): Error logging error.\n",
            "PANIC! (test_widget.c:88 in main): no recovery\n",
        ),
        13,
    );

    let mut results = scenario(
        Variant::FailPanic {
            expected_code: Some(13),
        },
        source,
    )
    .run(&executor)
    .unwrap();

    assert_eq!(results.diagnostics().len(), 0);
    assert_eq!(
        results.matched("LOGFAILED"),
        names(&["test_logging", "main"])
    );
    assert_eq!(results.matched("PANIC"), names(&["main"]));

    // The entry point is not a source-declared test; exclude it the way
    // scenario drivers do.
    let mut found: BTreeSet<TestName> = results.run_set().clone();
    found.remove("main");
    results.check_run(&found);
    results.check_matched("NOMEM", &btreeset! {}, true);
    assert!(results.outcome().is_pass());
}

#[test]
fn wrong_exit_code_is_a_structural_failure() {
    let dir = Utf8TempDir::new().unwrap();
    let source = write_source(&dir, &["test_alpha"]);
    let executor = ScriptedExecutor::new(
        "passed: test_alpha\n",
        "NOMEM (in test_widget.c:test_alpha) injected\n",
        3,
    );

    let results = scenario(
        Variant::Fail {
            expected_code: Some(12),
        },
        source,
    )
    .run(&executor)
    .unwrap();

    assert_eq!(results.diagnostics().len(), 1);
    assert!(!results.outcome().is_pass());
}

#[test]
fn sequential_scenarios_combine_to_the_first_nonzero_outcome() {
    let dir = Utf8TempDir::new().unwrap();
    let source = write_source(&dir, &["test_alpha"]);

    let run = |stdout: &'static str, exit: i32| -> Results {
        let executor = ScriptedExecutor::new(stdout, "", exit);
        scenario(Variant::Clean, source.clone()).run(&executor).unwrap()
    };

    let good = run("passed: test_alpha\nAll 1 tests passed\n", 0);
    let bad = run("??? garbage\n", 0);

    let mut total = OutcomeCode::PASS;
    total.absorb(good.outcome());
    total.absorb(bad.outcome());
    total.absorb(good.outcome());
    assert_eq!(total.code(), 1);
}

#[test]
fn missing_source_file_is_fatal() {
    let dir = Utf8TempDir::new().unwrap();
    let executor = ScriptedExecutor::new("", "", 0);
    let err = scenario(Variant::Clean, dir.path().join("absent.c"))
        .run(&executor)
        .unwrap_err();

    assert!(matches!(
        err,
        faultcheck_runner::errors::FatalError::SourceScan(_)
    ));
    // Nothing may be spawned when scanning fails.
    assert!(executor.commands.borrow().is_empty());
}
