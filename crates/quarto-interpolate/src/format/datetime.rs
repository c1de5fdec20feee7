/*
 * datetime.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Standard and custom date/time format specifiers.

use std::borrow::Cow;

use chrono::{Datelike, NaiveDateTime, Timelike};

use crate::culture::DateTimeFormat;
use crate::error::FormatError;

const SORTABLE: &str = "yyyy'-'MM'-'dd'T'HH':'mm':'ss";
const UNIVERSAL_SORTABLE: &str = "yyyy'-'MM'-'dd HH':'mm':'ss'Z'";
const ROUND_TRIP: &str = "yyyy'-'MM'-'dd'T'HH':'mm':'ss'.'fffffff";

/// Expand a one-letter standard specifier into its custom pattern.
fn standard_pattern<'a>(letter: char, dtf: &'a DateTimeFormat) -> Option<Cow<'a, str>> {
    let pattern = match letter {
        'd' => Cow::Borrowed(dtf.short_date_pattern.as_str()),
        'D' => Cow::Borrowed(dtf.long_date_pattern.as_str()),
        'f' => Cow::Owned(format!("{} {}", dtf.long_date_pattern, dtf.short_time_pattern)),
        'F' => Cow::Owned(format!("{} {}", dtf.long_date_pattern, dtf.long_time_pattern)),
        'g' => Cow::Owned(format!("{} {}", dtf.short_date_pattern, dtf.short_time_pattern)),
        'G' => Cow::Owned(format!("{} {}", dtf.short_date_pattern, dtf.long_time_pattern)),
        'M' | 'm' => Cow::Borrowed(dtf.month_day_pattern.as_str()),
        'O' | 'o' => Cow::Borrowed(ROUND_TRIP),
        's' => Cow::Borrowed(SORTABLE),
        't' => Cow::Borrowed(dtf.short_time_pattern.as_str()),
        'T' => Cow::Borrowed(dtf.long_time_pattern.as_str()),
        'u' => Cow::Borrowed(UNIVERSAL_SORTABLE),
        'Y' | 'y' => Cow::Borrowed(dtf.year_month_pattern.as_str()),
        _ => return None,
    };
    Some(pattern)
}

/// Format `dt` with a standard (`g`, `D`, `o`) or custom (`dd.MM.yyyy`)
/// specifier. An empty specifier is `G`.
pub fn format_datetime(
    dt: &NaiveDateTime,
    spec: &str,
    dtf: &DateTimeFormat,
) -> Result<String, FormatError> {
    let spec = if spec.is_empty() { "G" } else { spec };
    let mut chars = spec.chars();
    let pattern = match (chars.next(), chars.next()) {
        (Some(letter), None) => {
            standard_pattern(letter, dtf).ok_or_else(|| FormatError::InvalidSpecifier {
                specifier: spec.to_string(),
                kind: "DateTime",
            })?
        }
        _ => Cow::Borrowed(spec),
    };
    Ok(format_custom(dt, &pattern, dtf))
}

#[derive(Debug, Clone, PartialEq)]
enum Field {
    /// A pattern letter repeated `count` times.
    Run(char, usize),
    Literal(String),
}

fn tokenize(pattern: &str) -> Vec<Field> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut fields = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            'd' | 'M' | 'y' | 'h' | 'H' | 'm' | 's' | 'f' | 'F' | 't' => {
                let count = chars[i..].iter().take_while(|&&x| x == c).count();
                fields.push(Field::Run(c, count));
                i += count;
            }
            '\'' | '"' => {
                let mut text = String::new();
                i += 1;
                while i < chars.len() && chars[i] != c {
                    if chars[i] == '\\' && i + 1 < chars.len() {
                        i += 1;
                    }
                    text.push(chars[i]);
                    i += 1;
                }
                i += 1;
                fields.push(Field::Literal(text));
            }
            '\\' => {
                if let Some(&next) = chars.get(i + 1) {
                    fields.push(Field::Literal(next.to_string()));
                }
                i += 2;
            }
            // `%` marks a one-letter custom pattern such as `%d`.
            '%' => i += 1,
            ':' => {
                fields.push(Field::Run(':', 1));
                i += 1;
            }
            '/' => {
                fields.push(Field::Run('/', 1));
                i += 1;
            }
            other => {
                fields.push(Field::Literal(other.to_string()));
                i += 1;
            }
        }
    }
    fields
}

fn format_custom(dt: &NaiveDateTime, pattern: &str, dtf: &DateTimeFormat) -> String {
    let fields = tokenize(pattern);
    // Month names switch to the genitive form next to a day number.
    let genitive = !dtf.month_genitive_names.is_empty()
        && fields
            .iter()
            .any(|f| matches!(f, Field::Run('d', count) if *count <= 2));

    let mut out = String::new();
    for field in &fields {
        let (c, count) = match field {
            Field::Literal(text) => {
                out.push_str(text);
                continue;
            }
            Field::Run(c, count) => (*c, *count),
        };
        let month = dt.month0() as usize;
        let hour12 = match dt.hour() % 12 {
            0 => 12,
            h => h,
        };
        match (c, count) {
            ('d', 1) => out.push_str(&dt.day().to_string()),
            ('d', 2) => out.push_str(&format!("{:02}", dt.day())),
            ('d', 3) => out.push_str(&dtf.abbreviated_day_names[dt.weekday().num_days_from_sunday() as usize]),
            ('d', _) => out.push_str(&dtf.day_names[dt.weekday().num_days_from_sunday() as usize]),
            ('M', 1) => out.push_str(&dt.month().to_string()),
            ('M', 2) => out.push_str(&format!("{:02}", dt.month())),
            ('M', 3) => out.push_str(&dtf.abbreviated_month_names[month]),
            ('M', _) => match dtf.month_genitive_names.get(month).filter(|_| genitive) {
                Some(name) => out.push_str(name),
                None => out.push_str(&dtf.month_names[month]),
            },
            ('y', 1) => out.push_str(&(dt.year() % 100).to_string()),
            ('y', 2) => out.push_str(&format!("{:02}", dt.year() % 100)),
            ('y', n) => out.push_str(&format!("{:0n$}", dt.year())),
            ('h', 1) => out.push_str(&hour12.to_string()),
            ('h', _) => out.push_str(&format!("{hour12:02}")),
            ('H', 1) => out.push_str(&dt.hour().to_string()),
            ('H', _) => out.push_str(&format!("{:02}", dt.hour())),
            ('m', 1) => out.push_str(&dt.minute().to_string()),
            ('m', _) => out.push_str(&format!("{:02}", dt.minute())),
            ('s', 1) => out.push_str(&dt.second().to_string()),
            ('s', _) => out.push_str(&format!("{:02}", dt.second())),
            ('f' | 'F', n) => {
                let n = n.min(9);
                let nanos = dt.nanosecond() % 1_000_000_000;
                let mut digits = format!("{nanos:09}");
                digits.truncate(n);
                if c == 'F' {
                    while digits.ends_with('0') {
                        digits.pop();
                    }
                }
                out.push_str(&digits);
            }
            ('t', n) => {
                let designator = if dt.hour() < 12 {
                    &dtf.am_designator
                } else {
                    &dtf.pm_designator
                };
                if n == 1 {
                    out.extend(designator.chars().next());
                } else {
                    out.push_str(designator);
                }
            }
            (':', _) => out.push_str(&dtf.time_separator),
            ('/', _) => out.push_str(&dtf.date_separator),
            _ => {}
        }
    }
    out
}
