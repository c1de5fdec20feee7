/*
 * typer.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Conversion between flat-map value strings and typed leaves.
//!
//! Both directions are culture invariant: `.` is the only decimal separator
//! and no grouping characters are accepted or produced.

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::escape::{escape_value, unescape_value};
use crate::node::Leaf;

/// Infer a typed leaf from a raw flat-map value.
///
/// The first matching interpretation wins: `null`, `true`/`false`, 32-bit
/// integer, 64-bit integer, decimal, finite double, and finally an
/// (unescaped) string.
pub fn parse_leaf(raw: &str) -> Leaf {
    match raw {
        "null" => return Leaf::Null,
        "true" => return Leaf::Bool(true),
        "false" => return Leaf::Bool(false),
        _ => {}
    }

    if let Ok(v) = raw.parse::<i32>() {
        return Leaf::Int(v);
    }
    if let Ok(v) = raw.parse::<i64>() {
        return Leaf::Long(v);
    }
    if is_plain_decimal(raw) {
        if let Ok(v) = Decimal::from_str(raw) {
            return Leaf::Decimal(v);
        }
    }
    if looks_numeric(raw) {
        if let Ok(v) = raw.parse::<f64>() {
            if v.is_finite() {
                return Leaf::Double(v);
            }
        }
    }

    Leaf::String(unescape_value(raw))
}

/// Render a leaf as a flat-map value, or `None` if it has no string form.
pub fn stringify_leaf(leaf: &Leaf) -> Option<String> {
    match leaf {
        Leaf::Null => Some("null".to_string()),
        Leaf::Bool(true) => Some("true".to_string()),
        Leaf::Bool(false) => Some("false".to_string()),
        Leaf::Int(v) => Some(v.to_string()),
        Leaf::Long(v) => Some(v.to_string()),
        Leaf::Decimal(v) => Some(v.to_string()),
        Leaf::Double(v) if v.is_finite() => Some(v.to_string()),
        Leaf::Double(_) => None,
        Leaf::String(s) => Some(guard_literal(escape_value(s))),
    }
}

/// Prefix a `\` when an escaped string would otherwise read back as `null`,
/// a bool or a number. `\x` unescapes to `x`, so the text is unchanged.
fn guard_literal(escaped: String) -> String {
    if matches!(parse_leaf(&escaped), Leaf::String(_)) {
        escaped
    } else {
        format!("\\{escaped}")
    }
}

/// `[+-]digits[.digits]`, with at least one digit overall.
fn is_plain_decimal(raw: &str) -> bool {
    let body = raw.strip_prefix(['+', '-']).unwrap_or(raw);
    let (int_part, frac_part) = match body.split_once('.') {
        Some((i, f)) => (i, f),
        None => (body, ""),
    };
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    !(int_part.is_empty() && frac_part.is_empty()) && all_digits(int_part) && all_digits(frac_part)
}

/// Rejects the textual spellings `f64::from_str` accepts (`inf`, `NaN`, ...).
fn looks_numeric(raw: &str) -> bool {
    !raw.is_empty()
        && raw
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_inference_order() {
        assert_eq!(parse_leaf("null"), Leaf::Null);
        assert_eq!(parse_leaf("true"), Leaf::Bool(true));
        assert_eq!(parse_leaf("false"), Leaf::Bool(false));
        assert_eq!(parse_leaf("42"), Leaf::Int(42));
        assert_eq!(parse_leaf("-7"), Leaf::Int(-7));
        assert_eq!(parse_leaf("3000000000"), Leaf::Long(3_000_000_000));
        assert_eq!(parse_leaf("4.3"), Leaf::Decimal(Decimal::new(43, 1)));
        assert_eq!(parse_leaf("1e3"), Leaf::Double(1000.0));
        assert_eq!(parse_leaf("hello"), Leaf::String("hello".to_string()));
    }

    #[test]
    fn test_literals_are_case_sensitive() {
        assert_eq!(parse_leaf("True"), Leaf::String("True".to_string()));
        assert_eq!(parse_leaf("NULL"), Leaf::String("NULL".to_string()));
    }

    #[test]
    fn test_no_grouping_or_culture_separators() {
        assert_eq!(parse_leaf("1,000"), Leaf::String("1,000".to_string()));
        assert_eq!(parse_leaf("4,3"), Leaf::String("4,3".to_string()));
        assert_eq!(parse_leaf("1_000"), Leaf::String("1_000".to_string()));
    }

    #[test]
    fn test_non_finite_spellings_stay_strings() {
        assert_eq!(parse_leaf("inf"), Leaf::String("inf".to_string()));
        assert_eq!(parse_leaf("NaN"), Leaf::String("NaN".to_string()));
    }

    #[test]
    fn test_strings_are_unescaped() {
        assert_eq!(
            parse_leaf("Line1\\nLine2"),
            Leaf::String("Line1\nLine2".to_string())
        );
        assert_eq!(
            parse_leaf("2000-03-05T00\\:00\\:00"),
            Leaf::String("2000-03-05T00:00:00".to_string())
        );
    }

    #[test]
    fn test_stringify() {
        assert_eq!(stringify_leaf(&Leaf::Null).as_deref(), Some("null"));
        assert_eq!(stringify_leaf(&Leaf::Bool(false)).as_deref(), Some("false"));
        assert_eq!(stringify_leaf(&Leaf::Long(-5)).as_deref(), Some("-5"));
        assert_eq!(stringify_leaf(&Leaf::Double(0.25)).as_deref(), Some("0.25"));
        assert_eq!(
            stringify_leaf(&Leaf::Decimal(Decimal::new(430, 2))).as_deref(),
            Some("4.30")
        );
        assert_eq!(
            stringify_leaf(&Leaf::String("a:b".to_string())).as_deref(),
            Some("a\\:b")
        );
        assert_eq!(stringify_leaf(&Leaf::Double(f64::NAN)), None);
        assert_eq!(stringify_leaf(&Leaf::Double(f64::INFINITY)), None);
    }

    #[test]
    fn test_literal_looking_strings_are_guarded() {
        for text in ["12", "true", "null", "4.30", "-7", "+5", "1e3", "3000000000"] {
            let stored = stringify_leaf(&Leaf::String(text.to_string())).unwrap();
            assert_eq!(stored, format!("\\{text}"));
            assert_eq!(parse_leaf(&stored), Leaf::String(text.to_string()));
        }
        assert_eq!(
            stringify_leaf(&Leaf::String("True".to_string())).as_deref(),
            Some("True")
        );
        assert_eq!(stringify_leaf(&Leaf::String(String::new())).as_deref(), Some(""));
    }
}
