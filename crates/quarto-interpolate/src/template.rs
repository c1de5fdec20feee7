/*
 * template.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Splitting templates into a positional format string and expressions.
//!
//! `"{Name} is {Age,3} ({Name})"` becomes the format string
//! `"{0} is {1,3} ({0})"` with expressions `["Name", "Age"]`.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// A template rewritten for composite formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTemplate {
    /// Format string with `{N[,width][:format]}` placeholders.
    pub format: String,

    /// Expression texts, indexed by placeholder number.
    pub expressions: Vec<String>,
}

/// Turns raw template text into a [`ParsedTemplate`].
pub trait TemplateParser: Send + Sync {
    fn parse(&self, template: &str) -> ParsedTemplate;
}

/// `{`, a lazy expression body, optional parenthesized groups, then the
/// terminator that starts the width (`,`) or format (`:`) or closes the
/// token (`}`).
static TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{(.*?)(\(.*?\))*(\}|:|,)").expect("token pattern is valid")
});

/// The default [`TemplateParser`].
///
/// Templates are never rejected: text the token pattern does not match is
/// copied through unchanged and left to the formatter.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexTemplateParser;

impl TemplateParser for RegexTemplateParser {
    fn parse(&self, template: &str) -> ParsedTemplate {
        let mut slots: HashMap<String, usize> = HashMap::new();
        let mut expressions = Vec::new();

        let format = TOKEN.replace_all(template, |caps: &Captures<'_>| {
            let whole = &caps[0];
            let terminator = &caps[3];
            let expression = whole[1..whole.len() - terminator.len()].trim().to_string();

            let index = *slots.entry(expression.clone()).or_insert_with(|| {
                expressions.push(expression);
                expressions.len() - 1
            });
            format!("{{{index}{terminator}")
        });

        tracing::debug!(
            template,
            expressions = expressions.len(),
            "Parsed template"
        );

        ParsedTemplate {
            format: format.into_owned(),
            expressions,
        }
    }
}
