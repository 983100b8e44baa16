// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `TIMEFORMAT` rendering for timed pipelines.
//!
//! Conversions:
//!
//! - `%[p][l]R` elapsed wall time
//! - `%[p][l]U` user CPU time
//! - `%[p][l]S` system CPU time
//! - `%[p][l]C` user + system CPU time
//! - `%[p]P`    CPU percentage, `100 * (U + S) / R`
//! - `%%`       a literal percent sign
//!
//! `p` is a precision digit (0 to 6, larger digits clamp to 6, default 3);
//! `l` selects the long `[Nh]NmSS.FFFs` form. A lone `%` at the end of the
//! format is printed literally.

use std::fmt::Write as _;
use std::time::Duration;

use thiserror::Error;

/// Format used when `TIMEFORMAT` is unset.
pub const DEFAULT_TIME_FORMAT: &str = "\nreal\t%2lR\nuser\t%2lU\nsys\t%2lS";

const DEFAULT_PRECISION: usize = 3;
const MAX_PRECISION: usize = 6;

/// Sampled durations for one timed command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Times {
    pub real: Duration,
    pub user: Duration,
    pub sys: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeFormatError {
    #[error("{0}: unknown format specifier")]
    UnknownSpecifier(char),
    #[error("incomplete format specifier at end of format")]
    Truncated,
}

/// Render `times` according to `format`, with a trailing newline.
pub fn format_times(format: &str, times: &Times) -> Result<String, TimeFormatError> {
    let mut out = String::new();
    let mut chars = format.chars();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        let Some(mut spec) = chars.next() else {
            out.push('%');
            break;
        };
        if spec == '%' {
            out.push('%');
            continue;
        }

        let mut precision = DEFAULT_PRECISION;
        if let Some(digit) = spec.to_digit(10) {
            precision = (digit as usize).min(MAX_PRECISION);
            spec = chars.next().ok_or(TimeFormatError::Truncated)?;
        }
        if spec == 'P' {
            let real = times.real.as_secs_f64();
            let cpu = (times.user + times.sys).as_secs_f64();
            let percent = if real > 0.0 { 100.0 * cpu / real } else { 0.0 };
            let _ = write!(out, "{percent:.precision$}");
            continue;
        }

        let long = spec == 'l';
        if long {
            spec = chars.next().ok_or(TimeFormatError::Truncated)?;
        }
        let value = match spec {
            'R' => times.real,
            'U' => times.user,
            'S' => times.sys,
            'C' => times.user + times.sys,
            other => return Err(TimeFormatError::UnknownSpecifier(other)),
        };
        if long {
            write_long(&mut out, value, precision);
        } else {
            write_seconds(&mut out, value, precision);
        }
    }

    out.push('\n');
    Ok(out)
}

/// Fraction of the current second scaled down to `precision` digits.
fn scaled_fraction(value: Duration, precision: usize) -> u32 {
    let mut frac = value.subsec_micros();
    for _ in precision..MAX_PRECISION {
        frac /= 10;
    }
    frac
}

fn write_seconds(out: &mut String, value: Duration, precision: usize) {
    let secs = value.as_secs();
    if precision == 0 {
        let _ = write!(out, "{secs}");
    } else {
        let frac = scaled_fraction(value, precision);
        let _ = write!(out, "{secs}.{frac:0precision$}");
    }
}

fn write_long(out: &mut String, value: Duration, precision: usize) {
    let total = value.as_secs();
    let hours = total / 3600;
    let minutes = (total / 60) % 60;
    let secs = total % 60;
    if hours > 0 {
        let _ = write!(out, "{hours}h");
    }
    if precision == 0 {
        let _ = write!(out, "{minutes}m{secs:02}s");
    } else {
        let frac = scaled_fraction(value, precision);
        let _ = write!(out, "{minutes}m{secs:02}.{frac:0precision$}s");
    }
}

/// The format with its first line dropped, used when `time` is given no
/// pipeline and reports the shell's accumulated CPU time (the `real` line of
/// the default format has nothing to measure).
pub fn cumulative_format(format: &str) -> &str {
    match format.get(1..).and_then(|rest| rest.find('\n')) {
        Some(idx) => &format[idx + 2..],
        None => format,
    }
}

#[cfg(test)]
#[path = "time_fmt_tests.rs"]
mod tests;
