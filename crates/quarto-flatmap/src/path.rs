/*
 * path.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Parsing of flat-map keys into path segments.
//!
//! A key such as `Servers[1]:Host` splits into the segments `Servers[1]` and
//! `Host`. Each segment is a (possibly empty) member name followed by zero
//! or more `[index]` suffixes. Brackets only count as structure when they
//! are not escaped, so `a\[0\]` is the plain member name `a[0]`.

use crate::error::{FlatMapError, FlatMapResult};
use crate::escape::{split_key, unescape_key};

/// Largest array index a key may address. Arrays are padded up to the
/// index, so larger values are rejected as malformed.
pub const MAX_INDEX: usize = 1_000_000;

/// One `:`-separated piece of a flat key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// The segment as written in the key (still escaped).
    pub raw: String,

    /// The unescaped member name. Empty for a bare `[i]` segment.
    pub name: String,

    /// Array indices, outermost first.
    pub indices: Vec<usize>,
}

impl Segment {
    /// Whether this segment addresses an object member when it leads a key.
    ///
    /// A leading segment with an empty name and at least one index (`[0]`)
    /// indexes the root directly. After a `:` every segment names a member,
    /// including the empty one.
    pub fn has_member(&self) -> bool {
        !self.name.is_empty() || self.indices.is_empty()
    }
}

/// Parse a flat key into its segments.
pub fn parse_key(key: &str) -> FlatMapResult<Vec<Segment>> {
    split_key(key)
        .into_iter()
        .map(|raw| parse_segment(key, raw))
        .collect()
}

fn parse_segment(key: &str, raw: &str) -> FlatMapResult<Segment> {
    let mut name_end = None;
    let mut escaped = false;
    for (i, c) in raw.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '[' => {
                name_end = Some(i);
                break;
            }
            ']' => {
                return Err(FlatMapError::malformed(
                    key,
                    format!("unexpected ']' in segment '{raw}'"),
                ));
            }
            _ => {}
        }
    }
    if escaped {
        return Err(FlatMapError::malformed(
            key,
            format!("dangling escape at end of segment '{raw}'"),
        ));
    }

    let Some(name_end) = name_end else {
        return Ok(Segment {
            raw: raw.to_string(),
            name: unescape_key(raw),
            indices: Vec::new(),
        });
    };

    let indices = parse_indices(key, raw, &raw[name_end..])?;
    Ok(Segment {
        raw: raw.to_string(),
        name: unescape_key(&raw[..name_end]),
        indices,
    })
}

/// Parse a run of `[digits]` groups that must extend to the end of the segment.
fn parse_indices(key: &str, raw: &str, mut rest: &str) -> FlatMapResult<Vec<usize>> {
    let mut indices = Vec::new();
    while !rest.is_empty() {
        let Some(body) = rest.strip_prefix('[') else {
            return Err(FlatMapError::malformed(
                key,
                format!("unexpected text after index in segment '{raw}'"),
            ));
        };
        let Some(close) = body.find(']') else {
            return Err(FlatMapError::malformed(
                key,
                format!("unterminated index in segment '{raw}'"),
            ));
        };
        let digits = &body[..close];
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(FlatMapError::malformed(
                key,
                format!("index '{digits}' is not a non-negative integer"),
            ));
        }
        let index = digits
            .parse::<usize>()
            .ok()
            .filter(|&index| index <= MAX_INDEX)
            .ok_or_else(|| {
                FlatMapError::malformed(key, format!("index '{digits}' is out of range"))
            })?;
        indices.push(index);
        rest = &body[close + 1..];
    }
    Ok(indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(key: &str) -> Vec<(String, Vec<usize>)> {
        parse_key(key)
            .unwrap()
            .into_iter()
            .map(|s| (s.name, s.indices))
            .collect()
    }

    #[test]
    fn test_plain_and_nested() {
        assert_eq!(names("Name"), vec![("Name".to_string(), vec![])]);
        assert_eq!(
            names("Nested:Value"),
            vec![("Nested".to_string(), vec![]), ("Value".to_string(), vec![])]
        );
    }

    #[test]
    fn test_indices() {
        assert_eq!(names("Values[2]"), vec![("Values".to_string(), vec![2])]);
        assert_eq!(names("Grid[1][0]"), vec![("Grid".to_string(), vec![1, 0])]);
        assert_eq!(names("[3]"), vec![(String::new(), vec![3])]);
        assert_eq!(
            names("Servers[1]:Host"),
            vec![
                ("Servers".to_string(), vec![1]),
                ("Host".to_string(), vec![])
            ]
        );
    }

    #[test]
    fn test_escaped_brackets_are_part_of_the_name() {
        assert_eq!(names("a\\[0\\]"), vec![("a[0]".to_string(), vec![])]);
        assert_eq!(names("a\\:b"), vec![("a:b".to_string(), vec![])]);
        assert_eq!(names("a\\[x\\][1]"), vec![("a[x]".to_string(), vec![1])]);
    }

    #[test]
    fn test_bare_index_segment_has_no_member() {
        let segments = parse_key("[0]").unwrap();
        assert!(!segments[0].has_member());
        let segments = parse_key("").unwrap();
        assert!(segments[0].has_member());
    }

    #[test]
    fn test_index_limit_is_inclusive() {
        assert_eq!(
            names("Values[1000000]"),
            vec![("Values".to_string(), vec![MAX_INDEX])]
        );
    }

    #[test]
    fn test_malformed_keys() {
        for key in [
            "Invalid[Path",
            "Values[x]",
            "Values[-1]",
            "Values[+1]",
            "Values[]",
            "Values[1]tail",
            "Bad]",
            "Dangling\\",
            "Values[99999999999999999999999]",
            "Values[18446744073709551615]",
            "Values[4000000000]",
            "Values[1000001]",
        ] {
            let err = parse_key(key).unwrap_err();
            assert!(
                matches!(err, FlatMapError::MalformedPath { .. }),
                "expected malformed path for {key}, got {err:?}"
            );
        }
    }
}
