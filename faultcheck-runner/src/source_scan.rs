// Copyright (c) The faultcheck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Extracting declared test names from a source file.

use crate::{errors::SourceScanError, TestName};
use bstr::ByteSlice;
use camino::Utf8Path;
use regex::bytes::{Captures, Regex};
use std::{collections::BTreeSet, sync::LazyLock};

/// The set of test names declared in one source file.
///
/// Names are treated as unique within the file: repeated declarations
/// collapse without diagnostic. The set is built once per scan and can be
/// reused across every scenario that runs against the same source.
pub type SourceDefinitionSet = BTreeSet<TestName>;

/// The default declaration pattern.
///
/// Matches C-style test definitions of roughly the form
/// `[static] int test_SOME_NAME([signature])`, with the test name in the
/// mandatory `test` capture.
pub static DEFAULT_DEFINITION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:static\s+)?int\s+(?P<test>test_[_a-zA-Z0-9]*)\s*\(.*\)")
        .expect("default definition pattern is valid")
});

/// Scans `path` for test declarations using the default pattern.
///
/// Fails only if the file cannot be read; see [`SourceScanError`].
pub fn scan_source(path: &Utf8Path) -> Result<SourceDefinitionSet, SourceScanError> {
    scan_source_with(path, &DEFAULT_DEFINITION_PATTERN, |_, _| {})
}

/// Scans `path` for lines matching `pattern`, which must carry a `test`
/// capture naming the declared test.
///
/// `callback` runs once per matched line, in file order, before the name is
/// added to the set. It exists for side effects only; panics from it
/// propagate uncaught.
pub fn scan_source_with(
    path: &Utf8Path,
    pattern: &Regex,
    mut callback: impl FnMut(&[u8], &Captures<'_>),
) -> Result<SourceDefinitionSet, SourceScanError> {
    let contents = std::fs::read(path).map_err(|err| SourceScanError::new(path, err))?;

    let mut tests = SourceDefinitionSet::new();
    for line in contents.lines() {
        let Some(captures) = pattern.captures(line) else {
            continue;
        };
        callback(line, &captures);
        if let Some(name) = captures.name(crate::classify::TEST_NAME_CAPTURE) {
            let name = name.as_bytes().trim();
            tests.insert(TestName::new(name.to_str_lossy()));
        }
    }

    tracing::debug!("scanned {path}: {} test declarations", tests.len());
    Ok(tests)
}
