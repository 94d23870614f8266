// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2024 Jonathan Lee
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License version 3
// as published by the Free Software Foundation.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see https://www.gnu.org/licenses/.

//! Key canonicalisation and the deterministic key ordering.
//!
//! Keys are compared in three tiers: two numeric keys compare numerically,
//! two datetime keys compare chronologically, anything else compares by
//! codepoint. When a key set mixes tiers, numeric keys sort before datetime
//! keys, which sort before plain text, so the order is always total.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{Number, Value};
use std::cmp::Ordering;

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Canonical string form of a raw cell value, or `None` for null.
pub fn key_of(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(format_number(n)),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}

fn format_number(n: &Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    match n.as_f64() {
        Some(f) if f == 0.0 => "0".to_string(),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

/// Numeric value of a raw cell, using the loose coercion the data producers
/// rely on: booleans count as 1/0 and numeric strings are accepted.
///
/// Null, containers, unparsable strings and non-finite results are `None`.
pub fn number_of(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Null | Value::Array(_) | Value::Object(_) => return None,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                0.0
            } else {
                parse_number(trimmed)?
            }
        }
    };
    n.is_finite().then_some(n)
}

/// Parses a whole, already trimmed, non-empty string as a number.
pub fn parse_number(text: &str) -> Option<f64> {
    match text {
        "Infinity" | "+Infinity" => return Some(f64::INFINITY),
        "-Infinity" => return Some(f64::NEG_INFINITY),
        _ => {}
    }
    let radix = match text.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        #[allow(clippy::cast_precision_loss)]
        return u64::from_str_radix(&text[2..], radix).ok().map(|v| v as f64);
    }
    if !text
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'))
    {
        return None;
    }
    text.parse::<f64>().ok()
}

/// Milliseconds since the Unix epoch for strings that read as a calendar
/// date or timestamp. Values without an offset are taken as UTC.
pub fn parse_datetime(text: &str) -> Option<i64> {
    let text = text.trim();
    if text.len() < 7 {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.timestamp_millis());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.timestamp_millis());
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt.and_utc().timestamp_millis());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return date_millis(date);
        }
    }
    // Year-month keys such as "2024-03".
    NaiveDate::parse_from_str(&format!("{text}-01"), "%Y-%m-%d")
        .ok()
        .and_then(date_millis)
}

fn date_millis(date: NaiveDate) -> Option<i64> {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp_millis())
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum KeyClass {
    Numeric(f64),
    Temporal(i64),
    Text,
}

impl KeyClass {
    fn of(key: &str) -> Self {
        let trimmed = key.trim();
        // Blank keys coerce to zero, like blank numeric cells.
        if trimmed.is_empty() {
            return Self::Numeric(0.0);
        }
        if let Some(n) = parse_number(trimmed) {
            return Self::Numeric(n);
        }
        parse_datetime(key).map_or(Self::Text, Self::Temporal)
    }

    const fn rank(self) -> u8 {
        match self {
            Self::Numeric(_) => 0,
            Self::Temporal(_) => 1,
            Self::Text => 2,
        }
    }
}

fn compare_classified(a: (&KeyClass, &str), b: (&KeyClass, &str)) -> Ordering {
    match (a.0, b.0) {
        (KeyClass::Numeric(x), KeyClass::Numeric(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
        (KeyClass::Temporal(x), KeyClass::Temporal(y)) => x.cmp(y),
        (KeyClass::Text, KeyClass::Text) => a.1.cmp(b.1),
        (x, y) => x.rank().cmp(&y.rank()),
    }
}

/// Compares two keys under the three-tier ordering.
pub fn compare_keys(a: &str, b: &str) -> Ordering {
    compare_classified((&KeyClass::of(a), a), (&KeyClass::of(b), b))
}

/// Sorts keys in place. The sort is stable: keys that compare equal keep
/// their incoming order.
pub fn sort_keys(keys: &mut Vec<String>) {
    let mut classified: Vec<(KeyClass, String)> = keys
        .drain(..)
        .map(|k| (KeyClass::of(&k), k))
        .collect();
    classified.sort_by(|a, b| compare_classified((&a.0, &a.1), (&b.0, &b.1)));
    keys.extend(classified.into_iter().map(|(_, k)| k));
}

pub fn sorted_keys<I>(keys: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut out: Vec<String> = keys.into_iter().collect();
    sort_keys(&mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn owned(keys: &[&str]) -> Vec<String> {
        keys.iter().map(|k| (*k).to_string()).collect()
    }

    #[test]
    fn numeric_keys_sort_numerically() {
        assert_eq!(sorted_keys(owned(&["2", "10", "1"])), owned(&["1", "2", "10"]));
    }

    #[test]
    fn date_keys_sort_chronologically() {
        let keys = owned(&["2024-02-01", "2023-12-31T23:00:00Z", "2024-01-15 08:00:00"]);
        assert_eq!(
            sorted_keys(keys),
            owned(&["2023-12-31T23:00:00Z", "2024-01-15 08:00:00", "2024-02-01"])
        );
    }

    #[test]
    fn text_keys_sort_by_codepoint() {
        assert_eq!(
            sorted_keys(owned(&["beta", "Alpha", "alpha"])),
            owned(&["Alpha", "alpha", "beta"])
        );
    }

    #[test]
    fn mixed_tiers_order_numeric_then_temporal_then_text() {
        assert_eq!(
            sorted_keys(owned(&["zeta", "2024-01-01", "7", "abc", "3"])),
            owned(&["3", "7", "2024-01-01", "abc", "zeta"])
        );
    }

    #[test]
    fn blank_keys_sort_as_zero() {
        assert_eq!(
            sorted_keys(owned(&["2024-01-01", "5", "", "-1", "abc"])),
            owned(&["-1", "", "5", "2024-01-01", "abc"])
        );
    }

    #[test]
    fn equal_keys_keep_insertion_order() {
        assert_eq!(sorted_keys(owned(&["1.0", "0", "1"])), owned(&["0", "1.0", "1"]));
    }

    #[test]
    fn key_of_uses_plain_string_coercion() {
        assert_eq!(key_of(&json!("2024-01-01")).as_deref(), Some("2024-01-01"));
        assert_eq!(key_of(&json!(7)).as_deref(), Some("7"));
        assert_eq!(key_of(&json!(2.5)).as_deref(), Some("2.5"));
        assert_eq!(key_of(&json!(3.0)).as_deref(), Some("3"));
        assert_eq!(key_of(&json!(true)).as_deref(), Some("true"));
        assert_eq!(key_of(&json!(null)), None);
    }

    #[test]
    fn number_of_follows_loose_coercion() {
        assert_eq!(number_of(&json!(4)), Some(4.0));
        assert_eq!(number_of(&json!(" 12.5 ")), Some(12.5));
        assert_eq!(number_of(&json!("")), Some(0.0));
        assert_eq!(number_of(&json!("0x10")), Some(16.0));
        assert_eq!(number_of(&json!(false)), Some(0.0));
        assert_eq!(number_of(&json!("bad")), None);
        assert_eq!(number_of(&json!("inf")), None);
        assert_eq!(number_of(&json!("Infinity")), None);
        assert_eq!(number_of(&json!([1])), None);
        assert_eq!(number_of(&json!(null)), None);
    }

    #[test]
    fn datetime_parsing_covers_common_layouts() {
        assert!(parse_datetime("2024-01-01").is_some());
        assert!(parse_datetime("2024/01/01").is_some());
        assert!(parse_datetime("2024-03").is_some());
        assert!(parse_datetime("2024-01-01T10:00:00+02:00").is_some());
        assert!(parse_datetime("pool-a").is_none());
        assert_eq!(parse_datetime("2024-01-02"), parse_datetime("2024-01-02T00:00:00Z"));
    }

    proptest! {
        #[test]
        fn integer_keys_always_sort_like_integers(values in proptest::collection::vec(-10_000i64..10_000, 0..40)) {
            let keys: Vec<String> = values.iter().map(ToString::to_string).collect();
            let sorted = sorted_keys(keys);
            let parsed: Vec<i64> = sorted.iter().map(|k| k.parse().unwrap()).collect();
            let mut expected = values.clone();
            expected.sort_unstable();
            prop_assert_eq!(parsed, expected);
        }

        #[test]
        fn sorting_is_idempotent(keys in proptest::collection::vec("[a-c0-9\\-]{0,6}", 0..30)) {
            let once = sorted_keys(keys);
            let twice = sorted_keys(once.clone());
            prop_assert_eq!(once, twice);
        }
    }
}
