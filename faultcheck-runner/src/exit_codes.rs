// Copyright (c) The faultcheck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Documented exit codes for `faultcheck` runs.
///
/// A faultcheck invocation may fail for a variety of reasons. This structure
/// documents the exit codes that occur in case of expected failures.
///
/// One exception is unreadable test source files: those terminate the process
/// with the raw OS error code reported for the open, so that wrapper scripts
/// can distinguish `ENOENT` from `EACCES`.
pub enum FaultcheckExitCode {}

impl FaultcheckExitCode {
    /// Every invariant check in every scenario passed.
    pub const OK: i32 = 0;

    /// One or more anomalies, structural failures, or invariant violations
    /// were found.
    ///
    /// When several scenarios run in sequence, the process exit code is the
    /// first nonzero scenario outcome encountered, not a bitmask.
    pub const VERIFICATION_FAILED: i32 = 1;

    /// The command line was malformed (fewer than two positional arguments).
    pub const USAGE_ERROR: i32 = 2;

    /// A user issue happened while setting up a faultcheck invocation, such
    /// as a marker pattern without its test-name capture.
    pub const SETUP_ERROR: i32 = 96;

    /// The test command could not be spawned, or its output could not be
    /// read.
    pub const SPAWN_FAILED: i32 = 102;

    /// Writing data to stdout or stderr produced an error.
    pub const WRITE_OUTPUT_ERROR: i32 = 110;
}
