// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    literal      = { "abc", "abc", true },
    star         = { "abc", "a*", true },
    question     = { "abc", "a?c", true },
    class        = { "b", "[abc]", true },
    negated      = { "d", "[!abc]", true },
    slash        = { "a/b", "a*", true },
    leading_dot  = { ".rc", "*rc", true },
    mismatch     = { "abc", "b*", false },
    anchored     = { "xabc", "abc", false },
    bad_pattern  = { "[x", "[x", true },
    bad_mismatch = { "x", "[x", false },
)]
fn glob_matching(subject: &str, pattern: &str, expected: bool) {
    assert_eq!(GlobMatcher.matches(subject, pattern), expected);
}
