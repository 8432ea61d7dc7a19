// Copyright (c) The faultcheck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Invariant verification over the collected test-name sets.
//!
//! A [`Results`] value merges the scanned source set, the per-stream
//! classification buckets, and any structural failures, then answers the
//! scenario driver's invariant checks. Violations never short-circuit:
//! every check runs, every finding is recorded, and the outcome code simply
//! becomes (and stays) nonzero after the first one.

use crate::{
    classify::{Anomaly, Classification},
    exit_codes::FaultcheckExitCode,
    source_scan::SourceDefinitionSet,
    variant::StructuralFailure,
    TestName,
};
use bstr::BString;
use itertools::Itertools;
use smol_str::SmolStr;
use std::collections::{BTreeMap, BTreeSet};

/// An integer summarizing whether any check failed.
///
/// Starts at zero and keeps the first nonzero code absorbed into it; it
/// never resets. Combining scenario outcomes with [`OutcomeCode::absorb`]
/// makes the top-level exit status the first nonzero outcome encountered
/// anywhere in the run.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct OutcomeCode(i32);

impl OutcomeCode {
    /// The all-checks-passed outcome.
    pub const PASS: Self = Self(FaultcheckExitCode::OK);

    /// Whether no check has failed.
    pub fn is_pass(self) -> bool {
        self.0 == 0
    }

    /// The raw code, suitable as a process exit status.
    pub fn code(self) -> i32 {
        self.0
    }

    /// Folds another outcome in, keeping the first nonzero code.
    pub fn absorb(&mut self, other: OutcomeCode) {
        if self.0 == 0 {
            self.0 = other.0;
        }
    }

    fn fail(&mut self) {
        self.absorb(Self(FaultcheckExitCode::VERIFICATION_FAILED));
    }
}

/// A failed invariant check.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CheckViolation {
    /// `check_found`: these tests were expected to have executed but
    /// produced no output at all.
    NotRun {
        /// The missing test names.
        missing: BTreeSet<TestName>,
    },
    /// `check_run`: these tests were expected to exist in source but the
    /// scanner never found them.
    NotInSource {
        /// The missing test names.
        missing: BTreeSet<TestName>,
    },
    /// `check_matched`: these tests did not match the given label.
    NotMatched {
        /// The bucket label.
        label: SmolStr,
        /// The missing test names.
        missing: BTreeSet<TestName>,
    },
    /// `check_matched` in strict mode: these tests matched the given label
    /// without being expected to.
    UnexpectedlyMatched {
        /// The bucket label.
        label: SmolStr,
        /// The extra test names.
        extra: BTreeSet<TestName>,
    },
}

fn join(names: &BTreeSet<TestName>) -> String {
    names.iter().join(", ")
}

impl std::fmt::Display for CheckViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotRun { missing } => {
                write!(f, "tests {{{}}} did not run", join(missing))
            }
            Self::NotInSource { missing } => {
                write!(f, "tests {{{}}} were not found in the source", join(missing))
            }
            Self::NotMatched { label, missing } => {
                write!(f, "tests {{{}}} did not match `{label}`", join(missing))
            }
            Self::UnexpectedlyMatched { label, extra } => {
                write!(f, "tests {{{}}} matched `{label}` unexpectedly", join(extra))
            }
        }
    }
}

/// One reportable finding: a classification anomaly, a structural failure,
/// or a failed invariant check. Each prints as a single diagnostic line.
#[derive(Clone, Debug)]
pub enum Diagnostic {
    /// A per-line classification anomaly.
    Anomaly(Anomaly),
    /// A scenario-level structural failure.
    Structural(StructuralFailure),
    /// A failed invariant check.
    Violation(CheckViolation),
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Anomaly(inner) => inner.fmt(f),
            Self::Structural(inner) => inner.fmt(f),
            Self::Violation(inner) => inner.fmt(f),
        }
    }
}

/// The merged view of one scenario's results, plus the checks over it.
#[derive(Clone, Debug)]
pub struct Results {
    source: SourceDefinitionSet,
    buckets: BTreeMap<SmolStr, BTreeSet<TestName>>,
    run: BTreeSet<TestName>,
    echoes: Vec<BString>,
    diagnostics: Vec<Diagnostic>,
    outcome: OutcomeCode,
}

impl Results {
    /// Builds a results view from the source set and the per-stream
    /// classifications.
    ///
    /// A label present in more than one classification has its sets
    /// unioned; the run set is the union of every bucket. Classification
    /// anomalies are folded in as diagnostics immediately.
    pub fn new(
        source: SourceDefinitionSet,
        classifications: impl IntoIterator<Item = Classification>,
    ) -> Self {
        let mut buckets: BTreeMap<SmolStr, BTreeSet<TestName>> = BTreeMap::new();
        let mut echoes = Vec::new();
        let mut diagnostics = Vec::new();
        let mut outcome = OutcomeCode::PASS;

        for classification in classifications {
            for (label, names) in classification.buckets {
                buckets.entry(label).or_default().extend(names);
            }
            echoes.extend(classification.echoes);
            for anomaly in classification.anomalies {
                diagnostics.push(Diagnostic::Anomaly(anomaly));
                outcome.fail();
            }
        }

        let run = buckets.values().flatten().cloned().collect();

        Self {
            source,
            buckets,
            run,
            echoes,
            diagnostics,
            outcome,
        }
    }

    /// Folds structural failures in as diagnostics.
    pub fn record_structural(&mut self, failures: impl IntoIterator<Item = StructuralFailure>) {
        for failure in failures {
            self.diagnostics.push(Diagnostic::Structural(failure));
            self.outcome.fail();
        }
    }

    /// The set of tests declared in source.
    pub fn source_set(&self) -> &SourceDefinitionSet {
        &self.source
    }

    /// The union of every bucket across both streams: every test that
    /// produced recognized output.
    pub fn run_set(&self) -> &BTreeSet<TestName> {
        &self.run
    }

    /// Every bucket, keyed by label, merged across streams.
    pub fn buckets(&self) -> &BTreeMap<SmolStr, BTreeSet<TestName>> {
        &self.buckets
    }

    /// The set of tests matched under `label`. Unknown labels are empty.
    pub fn matched(&self, label: &str) -> BTreeSet<TestName> {
        self.buckets.get(label).cloned().unwrap_or_default()
    }

    /// Stdout lines whose matchers requested an observability echo.
    pub fn echoes(&self) -> &[BString] {
        &self.echoes
    }

    /// Every finding so far, in the order it was recorded.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// The accumulated outcome.
    pub fn outcome(&self) -> OutcomeCode {
        self.outcome
    }

    /// Checks that every test in `expected` executed (produced at least one
    /// recognized output line).
    pub fn check_found(&mut self, expected: &BTreeSet<TestName>) {
        let missing: BTreeSet<_> = expected.difference(&self.run).cloned().collect();
        if !missing.is_empty() {
            self.violation(CheckViolation::NotRun { missing });
        }
    }

    /// Checks that every test in `expected` is declared in the source.
    pub fn check_run(&mut self, expected: &BTreeSet<TestName>) {
        let missing: BTreeSet<_> = expected.difference(&self.source).cloned().collect();
        if !missing.is_empty() {
            self.violation(CheckViolation::NotInSource { missing });
        }
    }

    /// Checks that every test in `expected` matched `label`; with `strict`,
    /// additionally checks that nothing else did.
    pub fn check_matched(&mut self, label: &str, expected: &BTreeSet<TestName>, strict: bool) {
        let matched = self.matched(label);

        let missing: BTreeSet<_> = expected.difference(&matched).cloned().collect();
        if !missing.is_empty() {
            self.violation(CheckViolation::NotMatched {
                label: SmolStr::new(label),
                missing,
            });
        }

        if strict {
            let extra: BTreeSet<_> = matched.difference(expected).cloned().collect();
            if !extra.is_empty() {
                self.violation(CheckViolation::UnexpectedlyMatched {
                    label: SmolStr::new(label),
                    extra,
                });
            }
        }
    }

    fn violation(&mut self, violation: CheckViolation) {
        self.diagnostics.push(Diagnostic::Violation(violation));
        self.outcome.fail();
    }
}
