// Copyright (c) The faultcheck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ordered first-match-wins classification of output lines.
//!
//! A [`MatcherSet`] is an ordered list of [`Matcher`]s. Classification walks
//! each non-blank line through the list and the first structural match wins,
//! so more specific patterns must be listed before catch-alls such as the
//! final summary line. Every line lands in exactly one labeled bucket or the
//! anomaly list; nothing is dropped silently.

use crate::{errors::MatcherBuildError, TestName};
use bstr::{BStr, BString, ByteSlice};
use regex::bytes::Regex;
use smol_str::SmolStr;
use std::collections::{BTreeMap, BTreeSet};

/// The mandatory named capture identifying the test a line refers to.
pub const TEST_NAME_CAPTURE: &str = "test";

/// What to do when a labeled matcher matches a line.
///
/// Actions are values rather than behavior so the classification core stays
/// free of I/O; the CLI decides how echoes are rendered.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum MatchAction {
    /// Consume the line without further ado.
    Silent,
    /// Record the matched line for a human-observability echo. Has no effect
    /// on classification.
    #[default]
    Echo,
    /// Run a caller-supplied hook with the extracted test name and the line.
    Custom(fn(&TestName, &BStr)),
}

/// One classification rule: an optional label, a byte pattern, and an
/// on-match action.
///
/// Labeled matchers must define the [`TEST_NAME_CAPTURE`] capture; unlabeled
/// matchers consume pure summary lines and must not capture anything. Both
/// properties are validated here, at build time, rather than at match time.
#[derive(Clone, Debug)]
pub struct Matcher {
    label: Option<SmolStr>,
    regex: Regex,
    action: MatchAction,
}

impl Matcher {
    /// Builds a labeled matcher with the default [`MatchAction::Echo`]
    /// action.
    pub fn labeled(label: &str, pattern: &str) -> Result<Self, MatcherBuildError> {
        let regex = compile(pattern)?;
        if !regex
            .capture_names()
            .any(|name| name == Some(TEST_NAME_CAPTURE))
        {
            return Err(MatcherBuildError::MissingTestNameCapture {
                label: label.to_owned(),
                pattern: pattern.to_owned(),
            });
        }
        Ok(Self {
            label: Some(SmolStr::new(label)),
            regex,
            action: MatchAction::default(),
        })
    }

    /// Builds an unlabeled matcher for lines that should be consumed without
    /// contributing a test name, such as the final summary line.
    pub fn summary(pattern: &str) -> Result<Self, MatcherBuildError> {
        let regex = compile(pattern)?;
        // captures_len counts the implicit whole-match group.
        if regex.captures_len() > 1 {
            return Err(MatcherBuildError::SummaryPatternCaptures {
                pattern: pattern.to_owned(),
            });
        }
        Ok(Self {
            label: None,
            regex,
            action: MatchAction::Silent,
        })
    }

    /// Replaces the on-match action.
    #[must_use]
    pub fn with_action(mut self, action: MatchAction) -> Self {
        self.action = action;
        self
    }

    /// The matcher's label, if it has one.
    pub fn label(&self) -> Option<&SmolStr> {
        self.label.as_ref()
    }

    /// Extracts the test name from a line this matcher matched.
    ///
    /// Returns `None` when the pattern's test-name group did not participate
    /// in the match (only possible when a caller wraps the capture in an
    /// optional group).
    fn test_name(&self, line: &[u8]) -> Option<TestName> {
        let captures = self.regex.captures(line)?;
        let name = captures.name(TEST_NAME_CAPTURE)?;
        Some(TestName::new(name.as_bytes().trim().to_str_lossy()))
    }
}

fn compile(pattern: &str) -> Result<Regex, MatcherBuildError> {
    Regex::new(pattern).map_err(|err| MatcherBuildError::InvalidPattern {
        pattern: pattern.to_owned(),
        err: Box::new(err),
    })
}

/// An ordered list of matchers. Order is significant: classification tries
/// matchers strictly front to back.
#[derive(Clone, Debug, Default)]
pub struct MatcherSet {
    matchers: Vec<Matcher>,
}

impl MatcherSet {
    /// An empty set. Classifying any non-blank line against it is an
    /// anomaly; useful for streams that are checked only for emptiness.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a set from matchers in dispatch order.
    pub fn new(matchers: impl IntoIterator<Item = Matcher>) -> Self {
        Self {
            matchers: matchers.into_iter().collect(),
        }
    }

    /// Appends another set's matchers after this set's, preserving both
    /// orders. Used by composite variants to union ancestor matcher lists.
    #[must_use]
    pub fn chain(mut self, other: Self) -> Self {
        self.matchers.extend(other.matchers);
        self
    }

    /// Replaces every matcher's action with [`MatchAction::Silent`].
    ///
    /// Used for stderr marker lists, which exist for verification only; the
    /// observability echo is a stdout affordance.
    #[must_use]
    pub fn silenced(mut self) -> Self {
        for matcher in &mut self.matchers {
            matcher.action = MatchAction::Silent;
        }
        self
    }

    /// The labels of all labeled matchers, in dispatch order.
    pub fn labels(&self) -> impl Iterator<Item = &SmolStr> {
        self.matchers.iter().filter_map(Matcher::label)
    }
}

/// A non-fatal classification anomaly.
///
/// Anomalies are accumulated across the whole run and reported together;
/// they never abort classification.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Anomaly {
    /// A non-blank line matched none of the configured patterns. This is a
    /// protocol violation by the binary under test.
    UnmatchedLine(BString),
    /// A test name was matched twice under the same label. The bucket keeps
    /// a single entry.
    DuplicateTestName {
        /// The repeated test name.
        name: TestName,
        /// The label of the bucket it was already in.
        label: SmolStr,
    },
}

impl std::fmt::Display for Anomaly {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnmatchedLine(line) => write!(f, "unmatched output line: {line}"),
            Self::DuplicateTestName { name, label } => {
                write!(f, "test `{name}` matched `{label}` twice")
            }
        }
    }
}

/// The result of classifying one line sequence against one matcher list.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Classification {
    /// Matched test names, keyed by matcher label. Every labeled matcher
    /// contributes a bucket, even an empty one.
    pub buckets: BTreeMap<SmolStr, BTreeSet<TestName>>,
    /// Anomalies, in the order they were observed.
    pub anomalies: Vec<Anomaly>,
    /// Lines whose matcher requested an [`MatchAction::Echo`], in order.
    pub echoes: Vec<BString>,
}

/// Classifies `lines` against `matchers`.
///
/// Blank and whitespace-only lines are skipped entirely. Every other line
/// ends up in exactly one label bucket or the anomaly list. The function is
/// pure and deterministic given its inputs (a [`MatchAction::Custom`] hook
/// may run for side effects, but has no influence on the result).
pub fn classify(lines: &[BString], matchers: &MatcherSet) -> Classification {
    let mut out = Classification::default();
    for label in matchers.labels() {
        out.buckets.entry(label.clone()).or_default();
    }

    for line in lines {
        if line.trim().is_empty() {
            continue;
        }

        let Some(matcher) = matchers
            .matchers
            .iter()
            .find(|matcher| matcher.regex.is_match(line))
        else {
            out.anomalies.push(Anomaly::UnmatchedLine(line.clone()));
            continue;
        };

        let Some(label) = &matcher.label else {
            // A summary line: consumed, contributes no test name.
            continue;
        };

        let Some(name) = matcher.test_name(line) else {
            out.anomalies.push(Anomaly::UnmatchedLine(line.clone()));
            continue;
        };

        let bucket = out.buckets.entry(label.clone()).or_default();
        if !bucket.insert(name.clone()) {
            out.anomalies.push(Anomaly::DuplicateTestName {
                name: name.clone(),
                label: label.clone(),
            });
        }

        match matcher.action {
            MatchAction::Silent => {}
            MatchAction::Echo => out.echoes.push(line.clone()),
            MatchAction::Custom(hook) => hook(&name, line.as_bstr()),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::{btreemap, btreeset};
    use pretty_assertions::assert_eq;

    fn passed_matchers() -> MatcherSet {
        MatcherSet::new([
            Matcher::labeled("passed", r"^passed: (?P<test>test\S*)").unwrap(),
            Matcher::summary(r"^All [0-9]+ tests passed$").unwrap(),
        ])
    }

    fn lines(raw: &[&str]) -> Vec<BString> {
        raw.iter().copied().map(BString::from).collect()
    }

    #[test]
    fn labeled_matcher_requires_test_capture() {
        let err = Matcher::labeled("passed", r"^passed: test\S*").unwrap_err();
        assert!(matches!(
            err,
            MatcherBuildError::MissingTestNameCapture { .. }
        ));
    }

    #[test]
    fn summary_matcher_rejects_captures() {
        let err = Matcher::summary(r"^All (?P<test>[0-9]+) tests passed$").unwrap_err();
        assert!(matches!(err, MatcherBuildError::SummaryPatternCaptures { .. }));
    }

    #[test]
    fn invalid_pattern_is_a_build_error() {
        let err = Matcher::labeled("passed", r"^passed: (?P<test>test[").unwrap_err();
        assert!(matches!(err, MatcherBuildError::InvalidPattern { .. }));
    }

    #[test]
    fn clean_run_classifies_without_anomalies() {
        let out = classify(
            &lines(&["passed: test_alpha", "All 1 tests passed"]),
            &passed_matchers(),
        );

        assert_eq!(
            out.buckets,
            btreemap! {"passed".into() => btreeset! {"test_alpha".into()}}
        );
        assert_eq!(out.anomalies, vec![]);
        assert_eq!(out.echoes, lines(&["passed: test_alpha"]));
    }

    #[test]
    fn blank_lines_are_skipped() {
        let out = classify(
            &lines(&["", "   ", "\t", "passed: test_alpha"]),
            &passed_matchers(),
        );
        assert_eq!(out.anomalies, vec![]);
        assert_eq!(out.buckets["passed"], btreeset! {"test_alpha".into()});
    }

    #[test]
    fn unmatched_line_is_one_anomaly_and_scanning_continues() {
        let out = classify(
            &lines(&["??? garbage", "passed: test_alpha"]),
            &passed_matchers(),
        );

        assert_eq!(out.anomalies, vec![Anomaly::UnmatchedLine("??? garbage".into())]);
        assert_eq!(out.buckets["passed"], btreeset! {"test_alpha".into()});
    }

    #[test]
    fn duplicate_name_is_one_anomaly_and_bucket_keeps_one_entry() {
        let out = classify(
            &lines(&["passed: test_alpha", "passed: test_alpha"]),
            &passed_matchers(),
        );

        assert_eq!(
            out.anomalies,
            vec![Anomaly::DuplicateTestName {
                name: "test_alpha".into(),
                label: "passed".into(),
            }]
        );
        assert_eq!(out.buckets["passed"], btreeset! {"test_alpha".into()});
    }

    #[test]
    fn first_match_wins_over_later_patterns() {
        // A catch-all listed first would swallow everything; listed last, it
        // only sees what the specific patterns left over.
        let specific_first = MatcherSet::new([
            Matcher::labeled("passed", r"^passed: (?P<test>test\S*)").unwrap(),
            Matcher::labeled("any", r"^(?P<test>\S+)").unwrap(),
        ]);

        let out = classify(&lines(&["passed: test_alpha", "orphan"]), &specific_first);
        assert_eq!(out.buckets["passed"], btreeset! {"test_alpha".into()});
        assert_eq!(out.buckets["any"], btreeset! {"orphan".into()});

        let catch_all_first = MatcherSet::new([
            Matcher::labeled("any", r"^(?P<test>\S+)").unwrap(),
            Matcher::labeled("passed", r"^passed: (?P<test>test\S*)").unwrap(),
        ]);

        let out = classify(&lines(&["passed: test_alpha"]), &catch_all_first);
        assert_eq!(out.buckets["passed"], btreeset! {});
        assert_eq!(out.buckets["any"], btreeset! {"passed:".into()});
    }

    #[test]
    fn every_labeled_matcher_gets_a_bucket() {
        let out = classify(&[], &passed_matchers());
        assert_eq!(out.buckets, btreemap! {"passed".into() => btreeset! {}});
    }

    #[test]
    fn classify_is_deterministic() {
        let input = lines(&["passed: test_alpha", "junk", "passed: test_alpha"]);
        let first = classify(&input, &passed_matchers());
        let second = classify(&input, &passed_matchers());
        assert_eq!(first, second);
    }

    #[test]
    fn silent_action_suppresses_echo() {
        let matchers = MatcherSet::new([Matcher::labeled("passed", r"^passed: (?P<test>test\S*)")
            .unwrap()
            .with_action(MatchAction::Silent)]);
        let out = classify(&lines(&["passed: test_alpha"]), &matchers);
        assert_eq!(out.echoes, Vec::<BString>::new());
        assert_eq!(out.buckets["passed"], btreeset! {"test_alpha".into()});
    }
}
