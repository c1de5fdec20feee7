/*
 * mod.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Composite formatting: `{index[,alignment][:format]}` placeholders filled
//! from a list of values, with `{{` and `}}` as literal braces.

pub mod datetime;
pub mod number;

use crate::culture::FormatProvider;
use crate::error::FormatError;
use crate::value::Value;

pub use datetime::format_datetime;
pub use number::{Number, format_number};

/// Format one value. `spec` is the text after `:` in a placeholder.
///
/// Numbers and dates honour the specifier; other values ignore it.
pub fn format_value(
    value: &Value,
    spec: Option<&str>,
    provider: &dyn FormatProvider,
) -> Result<String, FormatError> {
    let spec = spec.unwrap_or("");
    match value {
        Value::Null => Ok(String::new()),
        Value::Int(v) => format_number(Number::Int(*v), spec, provider.number_format()),
        Value::Decimal(d) => format_number(Number::Decimal(*d), spec, provider.number_format()),
        Value::Float(f) => format_number(Number::Float(*f), spec, provider.number_format()),
        Value::DateTime(dt) => format_datetime(dt, spec, provider.datetime_format()),
        other => Ok(other.to_string()),
    }
}

/// Fill the placeholders of `format` from `args`.
pub fn format_composite(
    provider: &dyn FormatProvider,
    format: &str,
    args: &[Value],
) -> Result<String, FormatError> {
    let mut out = String::with_capacity(format.len());
    let mut chars = format.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        match c {
            '{' if chars.peek().is_some_and(|&(_, n)| n == '{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek().is_some_and(|&(_, n)| n == '}') => {
                chars.next();
                out.push('}');
            }
            '}' => return Err(invalid("unescaped '}'", pos)),
            '{' => {
                let item = parse_item(&mut chars, format.len())?;
                let value = args.get(item.index).ok_or(FormatError::IndexOutOfRange {
                    index: item.index,
                    count: args.len(),
                })?;
                let text = format_value(value, item.spec.as_deref(), provider)?;
                pad(&mut out, &text, item.alignment);
            }
            c => out.push(c),
        }
    }
    Ok(out)
}

fn invalid(message: &str, position: usize) -> FormatError {
    FormatError::InvalidFormatString {
        message: message.to_string(),
        position,
    }
}

struct Item {
    index: usize,
    alignment: i64,
    spec: Option<String>,
}

type Chars<'a> = std::iter::Peekable<std::str::CharIndices<'a>>;

fn skip_spaces(chars: &mut Chars<'_>) {
    while chars.next_if(|&(_, c)| c == ' ').is_some() {}
}

fn read_number(chars: &mut Chars<'_>, end: usize) -> Result<u64, FormatError> {
    let start = chars.peek().map_or(end, |&(p, _)| p);
    let mut value: u64 = 0;
    let mut any = false;
    while let Some((_, c)) = chars.next_if(|&(_, c)| c.is_ascii_digit()) {
        any = true;
        value = value
            .checked_mul(10)
            .and_then(|v| v.checked_add(u64::from(c as u8 - b'0')))
            .filter(|&v| v < 1_000_000)
            .ok_or_else(|| invalid("number too large", start))?;
    }
    if !any {
        return Err(invalid("expected a number", start));
    }
    Ok(value)
}

/// Parse the rest of a placeholder after its opening `{`.
fn parse_item(chars: &mut Chars<'_>, end: usize) -> Result<Item, FormatError> {
    let index = read_number(chars, end)? as usize;
    skip_spaces(chars);

    let mut alignment = 0i64;
    if chars.next_if(|&(_, c)| c == ',').is_some() {
        skip_spaces(chars);
        let negative = chars.next_if(|&(_, c)| c == '-').is_some();
        let width = read_number(chars, end)? as i64;
        alignment = if negative { -width } else { width };
        skip_spaces(chars);
    }

    let mut spec = None;
    if chars.next_if(|&(_, c)| c == ':').is_some() {
        let mut text = String::new();
        loop {
            match chars.next() {
                Some((_, '}')) if chars.peek().is_some_and(|&(_, n)| n == '}') => {
                    chars.next();
                    text.push('}');
                }
                Some((_, '}')) => {
                    spec = Some(text);
                    return Ok(Item {
                        index,
                        alignment,
                        spec,
                    });
                }
                Some((_, '{')) if chars.peek().is_some_and(|&(_, n)| n == '{') => {
                    chars.next();
                    text.push('{');
                }
                Some((pos, '{')) => return Err(invalid("unexpected '{' in format specifier", pos)),
                Some((_, c)) => text.push(c),
                None => return Err(invalid("unterminated placeholder", end)),
            }
        }
    }

    match chars.next() {
        Some((_, '}')) => Ok(Item {
            index,
            alignment,
            spec,
        }),
        Some((pos, _)) => Err(invalid("expected '}' to close the placeholder", pos)),
        None => Err(invalid("unterminated placeholder", end)),
    }
}

/// Append `text` padded with spaces: right-aligned for a positive
/// alignment, left-aligned for a negative one.
fn pad(out: &mut String, text: &str, alignment: i64) {
    let width = alignment.unsigned_abs() as usize;
    let fill = width.saturating_sub(text.chars().count());
    if alignment > 0 {
        out.extend(std::iter::repeat_n(' ', fill));
        out.push_str(text);
    } else {
        out.push_str(text);
        out.extend(std::iter::repeat_n(' ', fill));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::culture::Culture;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    fn inv(format: &str, args: &[Value]) -> Result<String, FormatError> {
        format_composite(&Culture::invariant(), format, args)
    }

    #[test]
    fn test_alignment_and_specifiers() {
        assert_eq!(
            inv("[{0,10:n2}] [{0,-6}] [{1}]", &[Value::Int(5), Value::from("x")]).unwrap(),
            "[      5.00] [5     ] [x]"
        );
        assert_eq!(
            format_composite(&Culture::ru(), "{0:n2}", &[Value::Int(2030)]).unwrap(),
            "2\u{a0}030,00"
        );
    }

    #[test]
    fn test_escaped_braces() {
        assert_eq!(inv("{{{0}}}", &[Value::Int(1)]).unwrap(), "{1}");
        assert_eq!(inv("{0:#}}}", &[Value::Int(7)]).unwrap(), "7}");
    }

    #[test]
    fn test_values_without_specifiers() {
        let dt = NaiveDate::from_ymd_opt(2025, 3, 26)
            .unwrap()
            .and_hms_opt(3, 5, 10)
            .unwrap();
        assert_eq!(
            inv(
                "{0}|{1}|{2}|{3}|{4:n2}",
                &[
                    Value::Bool(true),
                    Value::Null,
                    Value::DateTime(dt),
                    Value::Decimal(Decimal::new(430, 2)),
                    Value::from("ignored spec"),
                ]
            )
            .unwrap(),
            "True||03/26/2025 03:05:10|4.30|ignored spec"
        );
    }

    #[test]
    fn test_malformed_format_strings() {
        assert_eq!(
            inv("{1}", &[Value::Int(1)]),
            Err(FormatError::IndexOutOfRange { index: 1, count: 1 })
        );
        assert!(matches!(
            inv("a } b", &[]),
            Err(FormatError::InvalidFormatString { position: 2, .. })
        ));
        assert!(matches!(
            inv("{0", &[Value::Int(1)]),
            Err(FormatError::InvalidFormatString { .. })
        ));
        assert!(matches!(
            inv("{x}", &[Value::Int(1)]),
            Err(FormatError::InvalidFormatString { position: 1, .. })
        ));
        assert!(matches!(
            inv("{0,}", &[Value::Int(1)]),
            Err(FormatError::InvalidFormatString { .. })
        ));
    }
}
