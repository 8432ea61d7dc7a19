// Copyright (c) The faultcheck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Core functionality for [faultcheck](https://crates.io/crates/faultcheck).
//!
//! faultcheck runs a native unit-test binary and verifies not just that it
//! reports pass/fail results, but that under fault injection it fails in the
//! specific ways it is supposed to: induced allocation failures show up as
//! `NOMEM` lines, induced logging failures as `LOGFAILED` lines, and
//! unrecoverable panics terminate the process with particular exit codes.
//!
//! The crate is organized around a small, synchronous pipeline:
//!
//! - [`source_scan`] extracts the set of declared test names from a source
//!   file;
//! - [`exec`] defines the process-executor contract and a blocking
//!   implementation on top of it;
//! - [`normalize`] strips escape sequences and splits captured output into
//!   lines;
//! - [`classify`] dispatches each line to the first matching pattern in an
//!   ordered list, building labeled buckets of test names;
//! - [`variant`] describes the scenario shapes (clean run, expected failure,
//!   panic) as declarative configuration values;
//! - [`verify`] checks the collected sets against expectations and
//!   accumulates an outcome code;
//! - [`scenario`] drives one configured variant end to end.

pub mod classify;
pub mod errors;
pub mod exec;
pub mod exit_codes;
pub mod normalize;
pub mod scenario;
pub mod source_scan;
pub mod variant;
pub mod verify;

use smol_str::SmolStr;

/// The name of a single unit test, as declared in source or observed in
/// process output.
///
/// Test names are expected to be unique within one source file; repeated
/// declarations collapse without diagnostic.
pub type TestName = SmolStr;
