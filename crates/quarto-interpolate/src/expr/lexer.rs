/*
 * lexer.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Tokenizer for expression text.

use crate::error::{ExprError, ExprResult};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Ident(String),
    /// Numeric literal text plus an optional type suffix (`m`, `d`, `f`).
    Number { text: String, suffix: Option<char> },
    Str(String),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Dot,
    Comma,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,
    Eof,
}

/// A token and the byte offset where it starts.
pub(crate) type Spanned = (Token, usize);

pub(crate) fn tokenize(src: &str) -> ExprResult<Vec<Spanned>> {
    let chars: Vec<(usize, char)> = src.char_indices().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let (pos, c) = chars[i];
        let next = chars.get(i + 1).map(|&(_, c)| c);

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        if c.is_ascii_digit() || (c == '.' && next.is_some_and(|n| n.is_ascii_digit())) {
            let (token, end) = lex_number(&chars, i);
            tokens.push((token, pos));
            i = end;
            continue;
        }

        if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].1.is_alphanumeric() || chars[i].1 == '_') {
                i += 1;
            }
            let ident: String = chars[start..i].iter().map(|&(_, c)| c).collect();
            tokens.push((Token::Ident(ident), pos));
            continue;
        }

        if c == '"' || c == '\'' {
            let (text, end) = lex_string(&chars, i, c)?;
            tokens.push((Token::Str(text), pos));
            i = end;
            continue;
        }

        let (token, width) = match (c, next) {
            ('=', Some('=')) => (Token::EqEq, 2),
            ('!', Some('=')) => (Token::NotEq, 2),
            ('<', Some('>')) => (Token::NotEq, 2),
            ('<', Some('=')) => (Token::Le, 2),
            ('>', Some('=')) => (Token::Ge, 2),
            ('&', Some('&')) => (Token::AndAnd, 2),
            ('|', Some('|')) => (Token::OrOr, 2),
            ('=', _) => (Token::EqEq, 1),
            ('!', _) => (Token::Bang, 1),
            ('<', _) => (Token::Lt, 1),
            ('>', _) => (Token::Gt, 1),
            ('(', _) => (Token::LParen, 1),
            (')', _) => (Token::RParen, 1),
            ('[', _) => (Token::LBracket, 1),
            (']', _) => (Token::RBracket, 1),
            ('.', _) => (Token::Dot, 1),
            (',', _) => (Token::Comma, 1),
            ('+', _) => (Token::Plus, 1),
            ('-', _) => (Token::Minus, 1),
            ('*', _) => (Token::Star, 1),
            ('/', _) => (Token::Slash, 1),
            ('%', _) => (Token::Percent, 1),
            _ => {
                return Err(ExprError::Syntax {
                    message: format!("unexpected character '{c}'"),
                    position: pos,
                });
            }
        };
        tokens.push((token, pos));
        i += width;
    }

    tokens.push((Token::Eof, src.len()));
    Ok(tokens)
}

fn lex_number(chars: &[(usize, char)], start: usize) -> (Token, usize) {
    let mut i = start;
    let mut text = String::new();
    let digits = |i: &mut usize, text: &mut String| {
        while *i < chars.len() && chars[*i].1.is_ascii_digit() {
            text.push(chars[*i].1);
            *i += 1;
        }
    };

    digits(&mut i, &mut text);

    // A dot only belongs to the number when a digit follows, so `1.ToString()`
    // still lexes as a member call.
    if i + 1 < chars.len() && chars[i].1 == '.' && chars[i + 1].1.is_ascii_digit() {
        text.push('.');
        i += 1;
        digits(&mut i, &mut text);
    }

    if i < chars.len() && matches!(chars[i].1, 'e' | 'E') {
        let mut j = i + 1;
        if j < chars.len() && matches!(chars[j].1, '+' | '-') {
            j += 1;
        }
        if j < chars.len() && chars[j].1.is_ascii_digit() {
            text.extend(chars[i..j].iter().map(|&(_, c)| c));
            i = j;
            digits(&mut i, &mut text);
        }
    }

    let mut suffix = None;
    if i < chars.len() {
        let c = chars[i].1.to_ascii_lowercase();
        let ends_word = chars
            .get(i + 1)
            .is_none_or(|&(_, n)| !(n.is_alphanumeric() || n == '_'));
        if matches!(c, 'm' | 'd' | 'f') && ends_word {
            suffix = Some(c);
            i += 1;
        }
    }

    (Token::Number { text, suffix }, i)
}

fn lex_string(chars: &[(usize, char)], start: usize, quote: char) -> ExprResult<(String, usize)> {
    let mut i = start + 1;
    let mut text = String::new();
    while i < chars.len() {
        let c = chars[i].1;
        if c == quote {
            return Ok((text, i + 1));
        }
        if c == '\\' {
            let Some(&(_, escaped)) = chars.get(i + 1) else {
                break;
            };
            text.push(match escaped {
                'n' => '\n',
                'r' => '\r',
                't' => '\t',
                '0' => '\0',
                other => other,
            });
            i += 2;
            continue;
        }
        text.push(c);
        i += 1;
    }
    Err(ExprError::Syntax {
        message: "unterminated string literal".to_string(),
        position: chars[start].0,
    })
}
