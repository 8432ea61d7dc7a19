// Copyright (c) The faultcheck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The faultcheck CLI.
//!
//! faultcheck runs a unit-test binary under valgrind and verifies that it
//! behaves the way its scenario says it should: clean runs pass every test
//! and keep stderr empty; fault-injection runs fail with the configured exit
//! code and report each injected fault on stderr in its expected shape.
//!
//! All the interesting logic lives in the `faultcheck-runner` crate; this
//! crate only parses arguments, wires up diagnostics output, and maps
//! results to process exit codes.

mod dispatch;
mod errors;
mod output;

pub use dispatch::FaultcheckApp;
pub use errors::ExpectedError;
pub use output::OutputWriter;
