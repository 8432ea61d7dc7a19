// Copyright (c) The faultcheck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turning raw captured bytes into clean lines.

use bstr::{BString, ByteSlice};

/// Strips ANSI/VT100 escape sequences from `raw` and splits the result into
/// lines.
///
/// Both `\n` and `\r\n` are accepted as line terminators. The function is
/// pure and is applied identically to stdout and stderr captures.
pub fn normalized_lines(raw: &[u8]) -> Vec<BString> {
    let stripped = strip_ansi_escapes::strip(raw);
    stripped
        .lines()
        .map(BString::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case(b"one\ntwo\n", &["one", "two"]; "unix endings")]
    #[test_case(b"one\r\ntwo\r\n", &["one", "two"]; "dos endings")]
    #[test_case(b"one\ntwo", &["one", "two"]; "no trailing newline")]
    #[test_case(b"", &[]; "empty capture")]
    #[test_case(b"\n\n", &["", ""]; "blank lines preserved")]
    fn splits_line_endings(raw: &[u8], expected: &[&str]) {
        let lines = normalized_lines(raw);
        let expected: Vec<BString> = expected.iter().copied().map(BString::from).collect();
        assert_eq!(lines, expected);
    }

    #[test]
    fn strips_ansi_sequences() {
        let raw = b"\x1b[32m\x1b[1mpassed:\x1b[0m test_alpha\n";
        assert_eq!(normalized_lines(raw), vec![BString::from("passed: test_alpha")]);
    }

    #[test]
    fn is_pure() {
        let raw = b"\x1b[31mFAILED\x1b[0m: a.c:3:test_beta\r\n";
        assert_eq!(normalized_lines(raw), normalized_lines(raw));
    }
}
