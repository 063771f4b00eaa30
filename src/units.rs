// Copyright (c) 2018 Levente Kurusa
// Copyright (c) 2025 Ant Group
//
// SPDX-License-Identifier: Apache-2.0 or MIT
//

//! Conversion between human-readable quantities ("512m", "1.5GiB", "50%")
//! and the integer quantities stored in a resource set.
//!
//! The accepted grammar is a decimal number, an optional single space, an
//! optional multiplier letter (`k`, `m`, `g`, `t`, `p`, `e`, any case), an
//! optional `i` and an optional `b`. Memory sizes always use base 1024, so
//! "512m", "512mb" and "512MiB" are the same quantity.

use std::convert::TryFrom;

use crate::error::{Error, Result};

pub const KB: i64 = 1000;
pub const MB: i64 = 1000 * KB;
pub const GB: i64 = 1000 * MB;

#[allow(non_upper_case_globals)]
pub const KiB: i64 = 1024;
#[allow(non_upper_case_globals)]
pub const MiB: i64 = 1024 * KiB;
#[allow(non_upper_case_globals)]
pub const GiB: i64 = 1024 * MiB;
#[allow(non_upper_case_globals)]
pub const TiB: i64 = 1024 * GiB;

const BINARY_ABBRS: [&str; 7] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB", "EiB"];

// Fraction digits beyond this are dropped; 10^18 still fits an i128
// multiplication with any multiplier.
const MAX_FRACTION_DIGITS: usize = 18;

/// Parses a memory size into bytes, using binary (1024) multipliers.
pub fn parse_size(s: &str) -> Result<i64> {
    parse_quantity(s, 1024)
}

/// Parses a percentage-like quantity. A trailing `%` is accepted and
/// multipliers are decimal (1000), so "50" and "50%" both yield 50.
///
/// Range checking is left to the caller.
pub fn parse_percent_like(s: &str) -> Result<i64> {
    let stripped = s.strip_suffix('%').unwrap_or(s);
    parse_quantity(stripped, 1000).map_err(|_| Error::MalformedQuantity(s.to_string()))
}

/// Renders a byte count with the largest binary unit that represents it
/// exactly, allowing quarter fractions ("1.5GiB", "1.25KiB"). The result
/// always parses back to the same byte count with `parse_size`.
pub fn format_size(bytes: i64) -> String {
    if bytes <= 0 {
        return format!("{}B", bytes);
    }

    for (power, abbr) in BINARY_ABBRS.iter().enumerate().skip(1).rev() {
        let unit = 1i64 << (10 * power);
        if bytes < unit {
            continue;
        }

        let rem = bytes % unit;
        if rem == 0 {
            return format!("{}{}", bytes / unit, abbr);
        }
        // rem < unit <= 2^60, so rem * 4 cannot overflow.
        if (rem * 4) % unit == 0 {
            let frac = match rem * 4 / unit {
                1 => ".25",
                2 => ".5",
                _ => ".75",
            };
            return format!("{}{}{}", bytes / unit, frac, abbr);
        }
    }

    format!("{}{}", bytes, BINARY_ABBRS[0])
}

fn multiplier_power(c: char) -> Option<u32> {
    match c.to_ascii_lowercase() {
        'k' => Some(1),
        'm' => Some(2),
        'g' => Some(3),
        't' => Some(4),
        'p' => Some(5),
        'e' => Some(6),
        _ => None,
    }
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn parse_quantity(s: &str, base: i128) -> Result<i64> {
    let malformed = || Error::MalformedQuantity(s.to_string());

    // Suffixes are peeled off right to left: [b][i][letter][space].
    let rest = s
        .strip_suffix(|c: char| c.eq_ignore_ascii_case(&'b'))
        .unwrap_or(s);
    let rest = rest
        .strip_suffix(|c: char| c.eq_ignore_ascii_case(&'i'))
        .unwrap_or(rest);

    let (number, multiplier) = match rest.chars().last().and_then(multiplier_power) {
        // Multiplier letters are ASCII, slicing off one byte is safe.
        Some(power) => (&rest[..rest.len() - 1], base.pow(power)),
        None => (rest, 1),
    };
    let number = number.strip_suffix(' ').unwrap_or(number);

    let mut parts = number.splitn(2, '.');
    let whole = parts.next().unwrap_or_default();
    let fraction = parts.next();

    if !is_digits(whole) || !fraction.map_or(true, is_digits) {
        return Err(malformed());
    }

    let whole: i128 = whole.parse().map_err(|_| malformed())?;
    let mut total = whole.checked_mul(multiplier).ok_or_else(malformed)?;

    if let Some(fraction) = fraction {
        let digits = &fraction[..fraction.len().min(MAX_FRACTION_DIGITS)];
        let numerator: i128 = digits.parse().map_err(|_| malformed())?;
        let denominator = 10i128.pow(digits.len() as u32);
        total = total
            .checked_add(numerator * multiplier / denominator)
            .ok_or_else(malformed)?;
    }

    i64::try_from(total).map_err(|_| malformed())
}
