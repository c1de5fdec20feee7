/*
 * escape.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Backslash escaping for key segments and leaf values.
//!
//! Keys and values are escaped differently. Key segments only protect the
//! structural characters `\ : [ ]`. Values protect those as well as `"`,
//! newline, carriage return and tab, which are written as `\"`, `\n`, `\r`
//! and `\t`. The two schemes must stay separate: unescaping a key turns `\n`
//! into a plain `n`, while unescaping a value turns it into a newline.

/// Escape a single key segment (an object member name).
pub fn escape_key(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for c in segment.chars() {
        if matches!(c, '\\' | ':' | '[' | ']') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Undo [`escape_key`]. Every `\x` becomes `x`.
///
/// A trailing lone backslash is kept as-is.
pub fn unescape_key(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    let mut chars = segment.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(next) => out.push(next),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Escape a string leaf for storage as a flat-map value.
pub fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            ':' => out.push_str("\\:"),
            '[' => out.push_str("\\["),
            ']' => out.push_str("\\]"),
            _ => out.push(c),
        }
    }
    out
}

/// Undo [`escape_value`].
pub fn unescape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Split a flat key on every `:` that is not escaped.
///
/// The returned segments are still escaped.
pub fn split_key(key: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    for (i, c) in key.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == ':' {
            segments.push(&key[start..i]);
            start = i + 1;
        }
    }
    segments.push(&key[start..]);
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_key_escaping() {
        assert_eq!(escape_key("a:b[0]"), "a\\:b\\[0\\]");
        assert_eq!(escape_key("C:\\dir"), "C\\:\\\\dir");
        assert_eq!(escape_key("plain"), "plain");
        assert_eq!(unescape_key("a\\:b\\[0\\]"), "a:b[0]");
    }

    #[test]
    fn test_key_escaping_leaves_value_characters_alone() {
        assert_eq!(escape_key("line\nbreak \"q\""), "line\nbreak \"q\"");
        assert_eq!(unescape_key("\\n"), "n");
    }

    #[test]
    fn test_value_escaping() {
        assert_eq!(escape_value("Line1\nLine2"), "Line1\\nLine2");
        assert_eq!(escape_value("C:\\Folder"), "C\\:\\\\Folder");
        assert_eq!(escape_value("say \"hi\"\t[x]\r"), "say \\\"hi\\\"\\t\\[x\\]\\r");
        assert_eq!(unescape_value("C\\:\\\\Folder\\\\File.txt"), "C:\\Folder\\File.txt");
        assert_eq!(unescape_value("Line1\\nLine2"), "Line1\nLine2");
    }

    #[test]
    fn test_dangling_backslash_is_kept() {
        assert_eq!(unescape_value("abc\\"), "abc\\");
        assert_eq!(unescape_key("abc\\"), "abc\\");
    }

    #[test]
    fn test_split_key() {
        assert_eq!(split_key("A:B:C"), vec!["A", "B", "C"]);
        assert_eq!(split_key("A\\:B:C"), vec!["A\\:B", "C"]);
        assert_eq!(split_key("A\\\\:B"), vec!["A\\\\", "B"]);
        assert_eq!(split_key("Single"), vec!["Single"]);
        assert_eq!(split_key(""), vec![""]);
    }

    proptest! {
        #[test]
        fn prop_value_roundtrip(s in any::<String>()) {
            prop_assert_eq!(unescape_value(&escape_value(&s)), s);
        }

        #[test]
        fn prop_key_roundtrip(s in any::<String>()) {
            prop_assert_eq!(unescape_key(&escape_key(&s)), s);
        }

        #[test]
        fn prop_escaped_key_is_one_segment(s in any::<String>()) {
            let escaped = escape_key(&s);
            prop_assert_eq!(split_key(&escaped).len(), 1);
        }
    }
}
