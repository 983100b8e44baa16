// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use super::{cumulative_format, format_times, TimeFormatError, Times, DEFAULT_TIME_FORMAT};

fn sample() -> Times {
    Times {
        real: Duration::from_micros(83_456_789),
        user: Duration::from_micros(1_250_000),
        sys: Duration::from_micros(250_000),
    }
}

#[yare::parameterized(
    seconds_default    = { "%R",    "83.456\n" },
    seconds_precision1 = { "%1R",   "83.4\n" },
    seconds_precision0 = { "%0R",   "83\n" },
    seconds_precision6 = { "%6R",   "83.456789\n" },
    precision_clamped  = { "%9R",   "83.456789\n" },
    long_form          = { "%lR",   "1m23.456s\n" },
    long_precision2    = { "%2lR",  "1m23.45s\n" },
    long_precision0    = { "%0lR",  "1m23s\n" },
    user               = { "%U",    "1.250\n" },
    sys                = { "%S",    "0.250\n" },
    cpu_sum            = { "%C",    "1.500\n" },
    percent_escape     = { "100%%", "100%\n" },
    trailing_percent   = { "50%",   "50%\n" },
    plain_text         = { "done",  "done\n" },
)]
fn renders(format: &str, expected: &str) {
    assert_eq!(format_times(format, &sample()).unwrap(), expected);
}

#[test]
fn default_format_matches_interactive_output() {
    let out = format_times(DEFAULT_TIME_FORMAT, &sample()).unwrap();
    assert_eq!(out, "\nreal\t1m23.45s\nuser\t0m01.25s\nsys\t0m00.25s\n");
}

#[test]
fn long_form_includes_hours() {
    let times = Times {
        real: Duration::from_secs(2 * 3600 + 5 * 60 + 7),
        ..Times::default()
    };
    assert_eq!(format_times("%0lR", &times).unwrap(), "2h5m07s\n");
}

#[test]
fn cpu_percentage() {
    let times = Times {
        real: Duration::from_secs(4),
        user: Duration::from_secs(1),
        sys: Duration::from_secs(1),
    };
    assert_eq!(format_times("%P", &times).unwrap(), "50.000\n");
    assert_eq!(format_times("%0P", &times).unwrap(), "50\n");
    assert_eq!(format_times("%P", &Times::default()).unwrap(), "0.000\n");
}

#[yare::parameterized(
    unknown_letter   = { "%Q",  TimeFormatError::UnknownSpecifier('Q') },
    long_percent     = { "%lP", TimeFormatError::UnknownSpecifier('P') },
    digit_at_end     = { "%3",  TimeFormatError::Truncated },
    modifier_at_end  = { "%l",  TimeFormatError::Truncated },
)]
fn rejects(format: &str, expected: TimeFormatError) {
    assert_eq!(format_times(format, &sample()), Err(expected));
}

#[test]
fn cumulative_format_drops_real_line() {
    assert_eq!(cumulative_format(DEFAULT_TIME_FORMAT), "user\t%2lU\nsys\t%2lS");
    assert_eq!(cumulative_format("%U"), "%U");
}

proptest::proptest! {
    #[test]
    fn rendered_output_is_newline_terminated(format in "[a-z%0-9lRUSCP\t]{0,24}") {
        if let Ok(out) = format_times(&format, &sample()) {
            proptest::prop_assert!(out.ends_with('\n'));
        }
    }
}
