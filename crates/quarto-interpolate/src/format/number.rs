/*
 * number.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Standard and custom numeric format specifiers.
//!
//! Every number is first turned into its decimal digits ([`Digits`]); all
//! rounding happens on those digits, half away from zero, so an `f64` formats
//! the way its shortest round-trip text reads.

use rust_decimal::Decimal;

use crate::culture::NumberFormat;
use crate::error::FormatError;

/// A numeric value handed to the formatter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Decimal(Decimal),
    Float(f64),
}

impl Number {
    fn is_negative(&self) -> bool {
        match self {
            Number::Int(v) => *v < 0,
            Number::Decimal(d) => d.is_sign_negative() && !d.is_zero(),
            Number::Float(f) => *f < 0.0,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Number::Int(_) => "integer",
            Number::Decimal(_) => "decimal",
            Number::Float(_) => "floating-point",
        }
    }
}

/// The magnitude of a number as decimal digits, with the decimal point after
/// the first `point` digits (`point` may be negative or past the end).
/// `digits` has no leading or trailing zeros; it is empty for zero.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Digits {
    digits: Vec<u8>,
    point: i32,
}

impl Digits {
    fn zero() -> Self {
        Digits {
            digits: Vec::new(),
            point: 0,
        }
    }

    fn of(number: &Number) -> Self {
        match number {
            Number::Int(v) => Self::from_text(&v.unsigned_abs().to_string(), 0),
            Number::Decimal(d) => Self::from_text(&d.abs().to_string(), 0),
            Number::Float(f) => {
                // `{:e}` is the shortest text that round-trips, e.g. `4.3e0`.
                let text = format!("{:e}", f.abs());
                let (mantissa, exponent) = text.split_once('e').unwrap_or((text.as_str(), "0"));
                Self::from_text(mantissa, exponent.parse().unwrap_or(0))
            }
        }
    }

    /// Parse `int[.frac]` scaled by `10^exponent`.
    fn from_text(text: &str, exponent: i32) -> Self {
        let (int, frac) = text.split_once('.').unwrap_or((text, ""));
        let mut result = Digits {
            digits: int.bytes().chain(frac.bytes()).map(|b| b - b'0').collect(),
            point: int.len() as i32 + exponent,
        };
        result.normalize();
        result
    }

    fn normalize(&mut self) {
        let leading = self.digits.iter().take_while(|&&d| d == 0).count();
        self.digits.drain(..leading);
        self.point -= leading as i32;
        while self.digits.last() == Some(&0) {
            self.digits.pop();
        }
        if self.digits.is_empty() {
            self.point = 0;
        }
    }

    fn is_zero(&self) -> bool {
        self.digits.is_empty()
    }

    /// Multiply by `10^n`.
    fn shift(&mut self, n: i32) {
        if !self.is_zero() {
            self.point += n;
        }
    }

    /// Keep the first `keep` digits, rounding half away from zero.
    fn round_to(&mut self, keep: i32) {
        if keep < 0 {
            *self = Digits::zero();
            return;
        }
        let keep = keep as usize;
        if keep >= self.digits.len() {
            return;
        }
        let round_up = self.digits[keep] >= 5;
        self.digits.truncate(keep);
        if round_up {
            let mut carried = true;
            for d in self.digits.iter_mut().rev() {
                if *d == 9 {
                    *d = 0;
                } else {
                    *d += 1;
                    carried = false;
                    break;
                }
            }
            if carried {
                self.digits.insert(0, 1);
                self.point += 1;
            }
        }
        self.normalize();
    }

    fn round_fraction(&mut self, fraction_digits: usize) {
        self.round_to(self.point + fraction_digits as i32);
    }

    fn round_significant(&mut self, significant: usize) {
        self.round_to(significant as i32);
    }

    fn digit(&self, i: i32) -> char {
        usize::try_from(i)
            .ok()
            .and_then(|i| self.digits.get(i))
            .map_or('0', |d| char::from(b'0' + d))
    }

    /// Integer part without leading zeros; empty when below one.
    fn integer_part(&self) -> String {
        (0..self.point.max(0)).map(|i| self.digit(i)).collect()
    }

    /// Exactly `n` fraction digits.
    fn fraction_part(&self, n: usize) -> String {
        (0..n as i32).map(|i| self.digit(self.point + i)).collect()
    }

    /// All significant fraction digits.
    fn fraction_all(&self) -> String {
        let len = (self.digits.len() as i32 - self.point).max(0) as usize;
        self.fraction_part(len)
    }
}

/// Insert group separators into a run of integer digits.
fn group_integer(int: &str, nf: &NumberFormat) -> String {
    if nf.group_sizes.is_empty() || nf.group_separator.is_empty() {
        return int.to_string();
    }
    let chars: Vec<char> = int.chars().collect();
    let mut groups: Vec<String> = Vec::new();
    let mut end = chars.len();
    let mut sizes = nf.group_sizes.iter().copied();
    let mut size = sizes.next().unwrap_or(0);
    while end > 0 {
        if size == 0 {
            groups.push(chars[..end].iter().collect());
            break;
        }
        let start = end.saturating_sub(size);
        groups.push(chars[start..end].iter().collect());
        end = start;
        if let Some(next) = sizes.next() {
            size = next;
        }
    }
    groups.reverse();
    groups.join(&nf.group_separator)
}

/// `int[sep frac]` with the integer part defaulting to `0`.
fn fixed(digits: &Digits, fraction_digits: usize, grouped: bool, nf: &NumberFormat) -> String {
    let mut int = digits.integer_part();
    if int.is_empty() {
        int.push('0');
    }
    let mut out = if grouped { group_integer(&int, nf) } else { int };
    if fraction_digits > 0 {
        out.push_str(&nf.decimal_separator);
        out.push_str(&digits.fraction_part(fraction_digits));
    }
    out
}

/// Fill a currency or percent pattern: `n` is the number, `symbol_char`
/// stands for `symbol`, `-` for the negative sign.
fn apply_pattern(pattern: &str, number: &str, symbol_char: char, symbol: &str, nf: &NumberFormat) -> String {
    let mut out = String::new();
    for c in pattern.chars() {
        match c {
            'n' => out.push_str(number),
            '-' => out.push_str(&nf.negative_sign),
            c if c == symbol_char => out.push_str(symbol),
            c => out.push(c),
        }
    }
    out
}

fn exponent_text(exponent: i32, min_digits: usize, always_sign: bool, nf: &NumberFormat) -> String {
    let sign = if exponent < 0 {
        nf.negative_sign.as_str()
    } else if always_sign {
        nf.positive_sign.as_str()
    } else {
        ""
    };
    format!("{sign}{:0width$}", exponent.unsigned_abs(), width = min_digits)
}

fn with_sign(negative: bool, body: String, nf: &NumberFormat) -> String {
    if negative {
        format!("{}{body}", nf.negative_sign)
    } else {
        body
    }
}

/// Format `number` with a standard (`n2`, `P`, `X8`) or custom (`#,##0.00`)
/// specifier. An empty specifier means general formatting.
pub fn format_number(number: Number, spec: &str, nf: &NumberFormat) -> Result<String, FormatError> {
    if let Number::Float(f) = number {
        if f.is_nan() {
            return Ok(nf.nan_symbol.clone());
        }
        if f.is_infinite() {
            return Ok(if f > 0.0 {
                nf.positive_infinity_symbol.clone()
            } else {
                nf.negative_infinity_symbol.clone()
            });
        }
    }

    match parse_standard(spec) {
        Some((letter, precision)) => standard(number, letter, precision, spec, nf),
        None if spec.is_empty() => Ok(general(number, None, 'E', nf)),
        None => Ok(custom(number, spec, nf)),
    }
}

/// A standard specifier is one letter followed by at most nine digits.
fn parse_standard(spec: &str) -> Option<(char, Option<usize>)> {
    let mut chars = spec.chars();
    let letter = chars.next().filter(char::is_ascii_alphabetic)?;
    let rest = chars.as_str();
    if rest.len() > 9 || !rest.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let precision = if rest.is_empty() { None } else { rest.parse().ok() };
    Some((letter, precision))
}

fn standard(
    number: Number,
    letter: char,
    precision: Option<usize>,
    spec: &str,
    nf: &NumberFormat,
) -> Result<String, FormatError> {
    let invalid = || FormatError::InvalidSpecifier {
        specifier: spec.to_string(),
        kind: number.kind(),
    };
    let mut digits = Digits::of(&number);
    let negative = number.is_negative();

    let text = match letter.to_ascii_uppercase() {
        'C' => {
            let precision = precision.unwrap_or(nf.currency_decimal_digits);
            digits.round_fraction(precision);
            let body = fixed(&digits, precision, true, nf);
            let pattern = if negative && !digits.is_zero() {
                &nf.currency_negative_pattern
            } else {
                &nf.currency_positive_pattern
            };
            apply_pattern(pattern, &body, '$', &nf.currency_symbol, nf)
        }
        'D' => {
            let Number::Int(_) = number else {
                return Err(invalid());
            };
            let mut int = digits.integer_part();
            if int.is_empty() {
                int.push('0');
            }
            let width = precision.unwrap_or(0);
            with_sign(negative, format!("{int:0>width$}"), nf)
        }
        'E' => {
            let precision = precision.unwrap_or(6);
            digits.round_significant(precision + 1);
            let exponent = if digits.is_zero() { 0 } else { digits.point - 1 };
            let mut body = digits.digit(0).to_string();
            if precision > 0 {
                body.push_str(&nf.decimal_separator);
                body.extend((1..=precision as i32).map(|i| digits.digit(i)));
            }
            body.push(letter);
            body.push_str(&exponent_text(exponent, 3, true, nf));
            with_sign(negative && !digits.is_zero(), body, nf)
        }
        'F' | 'N' => {
            let precision = precision.unwrap_or(nf.number_decimal_digits);
            digits.round_fraction(precision);
            let grouped = letter.eq_ignore_ascii_case(&'N');
            let body = fixed(&digits, precision, grouped, nf);
            with_sign(negative && !digits.is_zero(), body, nf)
        }
        'G' => {
            let exponent_char = if letter == 'g' { 'e' } else { 'E' };
            general(number, precision.filter(|&p| p > 0), exponent_char, nf)
        }
        'P' => {
            let precision = precision.unwrap_or(nf.percent_decimal_digits);
            digits.shift(2);
            digits.round_fraction(precision);
            let body = fixed(&digits, precision, true, nf);
            let pattern = if negative && !digits.is_zero() {
                &nf.percent_negative_pattern
            } else {
                &nf.percent_positive_pattern
            };
            apply_pattern(pattern, &body, '%', &nf.percent_symbol, nf)
        }
        'R' => general(number, None, 'E', nf),
        'X' => {
            let Number::Int(v) = number else {
                return Err(invalid());
            };
            let width = precision.unwrap_or(0);
            // Negative values print as their two's complement.
            let bits = v as u64;
            if letter == 'x' {
                format!("{bits:0width$x}")
            } else {
                format!("{bits:0width$X}")
            }
        }
        _ => return Err(invalid()),
    };
    Ok(text)
}

/// General format: the shorter of fixed and scientific notation.
fn general(number: Number, precision: Option<usize>, exponent_char: char, nf: &NumberFormat) -> String {
    let negative = number.is_negative();

    // Decimals keep their scale (`4.30`) unless a precision is given.
    if let (Number::Decimal(d), None) = (number, precision) {
        let text = d.abs().to_string().replace('.', &nf.decimal_separator);
        return with_sign(negative, text, nf);
    }

    let mut digits = Digits::of(&number);
    let limit = match (precision, number) {
        (Some(p), _) => {
            digits.round_significant(p);
            p as i32
        }
        (None, Number::Float(_)) => 15,
        (None, _) => i32::MAX,
    };
    if digits.is_zero() {
        return "0".to_string();
    }

    let exponent = digits.point - 1;
    let body = if exponent >= limit || exponent < -4 {
        let mut text = digits.digit(0).to_string();
        let rest: String = (1..digits.digits.len() as i32).map(|i| digits.digit(i)).collect();
        if !rest.is_empty() {
            text.push_str(&nf.decimal_separator);
            text.push_str(&rest);
        }
        text.push(exponent_char);
        text.push_str(&exponent_text(exponent, 2, true, nf));
        text
    } else {
        let mut text = digits.integer_part();
        if text.is_empty() {
            text.push('0');
        }
        let fraction = digits.fraction_all();
        if !fraction.is_empty() {
            text.push_str(&nf.decimal_separator);
            text.push_str(&fraction);
        }
        text
    };
    with_sign(negative, body, nf)
}

/// One `;`-separated section of a custom numeric format.
#[derive(Debug, Default)]
struct Section {
    /// Placeholders (`0`/`#`) before the decimal point.
    integer_placeholders: usize,
    /// Digits the integer part is zero-padded to.
    min_integer: usize,
    min_fraction: usize,
    max_fraction: usize,
    grouping: bool,
    /// Each `,` directly left of the decimal point divides by 1000.
    scale_commas: usize,
    percents: usize,
    per_milles: usize,
    scientific: Option<Scientific>,
}

#[derive(Debug, Clone, Copy)]
struct Scientific {
    always_sign: bool,
    min_digits: usize,
}

/// Split on `;` outside quotes and escapes.
fn split_sections(spec: &str) -> Vec<&str> {
    let mut sections = Vec::new();
    let mut start = 0;
    let mut quote: Option<char> = None;
    let mut chars = spec.char_indices();
    while let Some((i, c)) = chars.next() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '\\') => {
                chars.next();
            }
            (None, ';') => {
                sections.push(&spec[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    sections.push(&spec[start..]);
    sections
}

/// Tokens of a custom numeric section, with quoting resolved.
#[derive(Debug, Clone, PartialEq)]
enum Part {
    Zero,
    Hash,
    Point,
    Comma,
    Percent,
    PerMille,
    Exponent { upper: bool, always_sign: bool, min_digits: usize },
    Literal(String),
}

fn tokenize_section(section: &str) -> Vec<Part> {
    let chars: Vec<char> = section.chars().collect();
    let mut parts = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        i += 1;
        let part = match c {
            '0' => Part::Zero,
            '#' => Part::Hash,
            '.' => Part::Point,
            ',' => Part::Comma,
            '%' => Part::Percent,
            '\u{2030}' => Part::PerMille,
            '\\' => match chars.get(i) {
                Some(&next) => {
                    i += 1;
                    Part::Literal(next.to_string())
                }
                None => Part::Literal(String::new()),
            },
            '\'' | '"' => {
                let end = chars[i..].iter().position(|&q| q == c).map_or(chars.len(), |p| i + p);
                let text: String = chars[i..end].iter().collect();
                i = (end + 1).min(chars.len());
                Part::Literal(text)
            }
            'E' | 'e' => {
                let mut j = i;
                let mut always_sign = false;
                if let Some(&sign @ ('+' | '-')) = chars.get(j) {
                    always_sign = sign == '+';
                    j += 1;
                }
                let zeros = chars[j..].iter().take_while(|&&z| z == '0').count();
                if zeros == 0 {
                    Part::Literal(c.to_string())
                } else {
                    i = j + zeros;
                    Part::Exponent {
                        upper: c == 'E',
                        always_sign,
                        min_digits: zeros,
                    }
                }
            }
            other => Part::Literal(other.to_string()),
        };
        parts.push(part);
    }
    parts
}

fn analyze(parts: &[Part]) -> Section {
    let mut section = Section::default();
    let mut seen_point = false;
    let mut seen_digit = false;
    let mut first_zero: Option<usize> = None;
    let mut pending_commas = 0;

    for part in parts {
        match part {
            Part::Zero | Part::Hash if section.scientific.is_none() => {
                if seen_point {
                    section.max_fraction += 1;
                    if *part == Part::Zero {
                        section.min_fraction = section.max_fraction;
                    }
                } else {
                    if pending_commas > 0 && seen_digit {
                        section.grouping = true;
                    }
                    pending_commas = 0;
                    if *part == Part::Zero && first_zero.is_none() {
                        first_zero = Some(section.integer_placeholders);
                    }
                    section.integer_placeholders += 1;
                    seen_digit = true;
                }
            }
            Part::Point if !seen_point && section.scientific.is_none() => {
                seen_point = true;
                section.scale_commas = pending_commas;
                pending_commas = 0;
            }
            Part::Comma if !seen_point => pending_commas += 1,
            Part::Percent => section.percents += 1,
            Part::PerMille => section.per_milles += 1,
            Part::Exponent {
                always_sign,
                min_digits,
                ..
            } if section.scientific.is_none() => {
                section.scientific = Some(Scientific {
                    always_sign: *always_sign,
                    min_digits: *min_digits,
                });
            }
            _ => {}
        }
    }
    if !seen_point {
        section.scale_commas = pending_commas;
    }
    section.min_integer = first_zero.map_or(0, |first| section.integer_placeholders - first);
    section
}

fn custom(number: Number, spec: &str, nf: &NumberFormat) -> String {
    let sections = split_sections(spec);
    let negative = number.is_negative();
    let is_zero = Digits::of(&number).is_zero();

    // Pick the section; an explicit negative section carries its own sign.
    let (chosen, signed) = match (sections.len(), negative, is_zero) {
        (3.., _, true) if !sections[2].is_empty() => (sections[2], false),
        (2.., true, _) if !sections[1].is_empty() => (sections[1], false),
        _ => (sections[0], negative),
    };

    let parts = tokenize_section(chosen);
    let section = analyze(&parts);
    let mut digits = Digits::of(&number);
    digits.shift(2 * section.percents as i32 + 3 * section.per_milles as i32);
    digits.shift(-3 * section.scale_commas as i32);

    let mut exponent = 0;
    if section.scientific.is_some() {
        let integer_digits = section.integer_placeholders.max(1);
        digits.round_significant(integer_digits + section.max_fraction);
        if !digits.is_zero() {
            exponent = digits.point - integer_digits as i32;
            digits.point = integer_digits as i32;
        }
    } else {
        digits.round_fraction(section.max_fraction);
    }

    let mut int = digits.integer_part();
    if int.len() < section.min_integer {
        int = format!("{int:0>width$}", width = section.min_integer);
    }
    let int_chars: Vec<char> = int.chars().collect();

    let mut fraction = digits.fraction_part(section.max_fraction);
    while fraction.len() > section.min_fraction && fraction.ends_with('0') {
        fraction.pop();
    }
    let fraction_chars: Vec<char> = fraction.chars().collect();

    let mut out = String::new();
    if signed && !digits.is_zero() {
        out.push_str(&nf.negative_sign);
    }

    // Integer digits line up with the placeholders from the right; extra
    // leading digits all go to the first placeholder.
    let offset = int_chars.len() as isize - section.integer_placeholders as isize;
    let mut integer_index = 0usize;
    let mut fraction_index = 0usize;
    let mut in_fraction = false;
    let mut in_exponent = false;

    for part in &parts {
        match part {
            Part::Zero | Part::Hash if in_exponent => {}
            Part::Zero | Part::Hash if !in_fraction => {
                if section.grouping {
                    if integer_index == 0 {
                        out.push_str(&group_integer(&int, nf));
                    }
                } else {
                    let position = integer_index as isize + offset;
                    if integer_index == 0 && position >= 0 {
                        out.extend(&int_chars[..=position as usize]);
                    } else if integer_index > 0 && position >= 0 {
                        out.push(int_chars[position as usize]);
                    }
                }
                integer_index += 1;
            }
            Part::Zero | Part::Hash => {
                if let Some(&d) = fraction_chars.get(fraction_index) {
                    out.push(d);
                }
                fraction_index += 1;
            }
            Part::Point if !in_fraction && !in_exponent => {
                in_fraction = true;
                if !fraction_chars.is_empty() {
                    out.push_str(&nf.decimal_separator);
                }
            }
            Part::Point | Part::Comma => {}
            Part::Percent => out.push_str(&nf.percent_symbol),
            Part::PerMille => out.push_str(&nf.per_mille_symbol),
            Part::Exponent {
                upper,
                always_sign,
                min_digits,
            } => {
                if in_exponent {
                    continue;
                }
                in_exponent = true;
                out.push(if *upper { 'E' } else { 'e' });
                out.push_str(&exponent_text(exponent, *min_digits, *always_sign, nf));
            }
            Part::Literal(text) => out.push_str(text),
        }
    }
    out
}
