/*
 * eval.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Tree-walking interpreter for bound expressions.

use std::cmp::Ordering;

use chrono::{Datelike, Months, NaiveDateTime, NaiveTime, TimeDelta, Timelike, Weekday};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use super::ast::{BinaryOp, Expr, UnaryOp};
use crate::error::{ExprError, ExprResult};
use crate::reflect::ContextRef;
use crate::value::Value;

/// Widest result `PadLeft`/`PadRight` may produce.
const MAX_PAD_WIDTH: usize = 1_000_000;

pub(crate) fn eval(expr: &Expr, ctx: &ContextRef<'_>) -> ExprResult<Value> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),

        Expr::Field { index, name } => {
            let descriptor = ctx.descriptor();
            descriptor
                .get_index(*index, ctx.value())
                .ok_or_else(|| ExprError::UnknownMember {
                    type_name: descriptor.full_name().to_string(),
                    member: name.clone(),
                })
        }

        Expr::Ident(name) => Err(ExprError::UnknownMember {
            type_name: ctx.descriptor().full_name().to_string(),
            member: name.clone(),
        }),

        Expr::Context => Err(ExprError::InvalidArgument {
            message: "'it' must be followed by a member access".to_string(),
        }),

        Expr::Member { target, name } => {
            let value = eval(target, ctx)?;
            member(&value, name)
        }

        Expr::Call {
            target: None,
            method,
            args,
        } => {
            expect_args(method, args.len(), 0, 0)?;
            let descriptor = ctx.descriptor();
            match method.as_str() {
                "GetType" => Ok(Value::Type(descriptor.type_name())),
                "ToString" => Ok(Value::String(descriptor.full_name().to_string())),
                _ => Err(ExprError::UnknownMethod {
                    type_name: descriptor.full_name().to_string(),
                    method: method.clone(),
                }),
            }
        }

        Expr::Call {
            target: Some(target),
            method,
            args,
        } => {
            let value = eval(target, ctx)?;
            let args = args
                .iter()
                .map(|arg| eval(arg, ctx))
                .collect::<ExprResult<Vec<_>>>()?;
            call(&value, method, &args)
        }

        Expr::Index { target, index } => {
            let value = eval(target, ctx)?;
            let index = eval(index, ctx)?;
            index_into(&value, &index)
        }

        Expr::Unary { op, operand } => unary(*op, eval(operand, ctx)?),

        Expr::Binary {
            op: op @ (BinaryOp::And | BinaryOp::Or),
            left,
            right,
        } => {
            let left = as_bool(*op, eval(left, ctx)?)?;
            // Short-circuit: `false && x` and `true || x` never evaluate `x`.
            if (*op == BinaryOp::And) != left {
                return Ok(Value::Bool(left));
            }
            Ok(Value::Bool(as_bool(*op, eval(right, ctx)?)?))
        }

        Expr::Binary { op, left, right } => {
            let left = eval(left, ctx)?;
            let right = eval(right, ctx)?;
            binary(*op, &left, &right)
        }
    }
}

fn as_bool(op: BinaryOp, value: Value) -> ExprResult<bool> {
    match value {
        Value::Bool(b) => Ok(b),
        other => Err(ExprError::mismatch(format!(
            "operator '{}' expects Boolean operands, got {}",
            op.symbol(),
            other.type_name().name
        ))),
    }
}

fn member(value: &Value, name: &str) -> ExprResult<Value> {
    let unknown = || ExprError::UnknownMember {
        type_name: value.type_name().full_name.to_string(),
        member: name.to_string(),
    };

    match value {
        Value::Null => Err(ExprError::NullReference {
            member: name.to_string(),
        }),
        Value::Object(obj) => obj.get(name).ok_or_else(unknown),
        Value::Type(t) => match name {
            "Name" => Ok(Value::from(t.name)),
            "FullName" => Ok(Value::from(t.full_name)),
            _ => Err(unknown()),
        },
        Value::String(s) => match name {
            "Length" => Ok(Value::from(s.chars().count())),
            _ => Err(unknown()),
        },
        Value::List(items) => match name {
            "Count" | "Length" => Ok(Value::from(items.len())),
            _ => Err(unknown()),
        },
        Value::DateTime(dt) => datetime_member(dt, name).ok_or_else(unknown),
        _ => Err(unknown()),
    }
}

fn datetime_member(dt: &NaiveDateTime, name: &str) -> Option<Value> {
    let value = match name {
        "Year" => Value::from(dt.year()),
        "Month" => Value::from(dt.month()),
        "Day" => Value::from(dt.day()),
        "Hour" => Value::from(dt.hour()),
        "Minute" => Value::from(dt.minute()),
        "Second" => Value::from(dt.second()),
        "Millisecond" => Value::from(dt.nanosecond() / 1_000_000),
        "DayOfYear" => Value::from(dt.ordinal()),
        "DayOfWeek" => Value::from(weekday_name(dt.weekday())),
        "Date" => Value::DateTime(dt.date().and_time(NaiveTime::MIN)),
        _ => return None,
    };
    Some(value)
}

pub(crate) fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

fn expect_args(method: &str, found: usize, min: usize, max: usize) -> ExprResult<()> {
    if (min..=max).contains(&found) {
        return Ok(());
    }
    let expected = if min == max {
        min.to_string()
    } else {
        format!("{min} to {max}")
    };
    Err(ExprError::ArgumentCount {
        method: method.to_string(),
        expected,
        found,
    })
}

fn call(value: &Value, method: &str, args: &[Value]) -> ExprResult<Value> {
    if let Value::Null = value {
        return Err(ExprError::NullReference {
            member: format!("{method}()"),
        });
    }

    match method {
        "GetType" => {
            expect_args(method, args.len(), 0, 0)?;
            return Ok(Value::Type(value.type_name()));
        }
        "ToString" => {
            expect_args(method, args.len(), 0, 0)?;
            return Ok(Value::String(value.to_string()));
        }
        _ => {}
    }

    let result = match value {
        Value::String(s) => string_method(s, method, args)?,
        Value::List(items) => list_method(items, method, args)?,
        Value::DateTime(dt) => datetime_method(dt, method, args)?,
        _ => None,
    };

    result.ok_or_else(|| ExprError::UnknownMethod {
        type_name: value.type_name().full_name.to_string(),
        method: method.to_string(),
    })
}

fn arg_str<'a>(method: &str, arg: &'a Value) -> ExprResult<&'a str> {
    match arg {
        Value::String(s) => Ok(s),
        other => Err(ExprError::mismatch(format!(
            "'{method}' expects a String argument, got {}",
            other.type_name().name
        ))),
    }
}

fn arg_int(method: &str, arg: &Value) -> ExprResult<i64> {
    match arg {
        Value::Int(v) => Ok(*v),
        other => Err(ExprError::mismatch(format!(
            "'{method}' expects an integer argument, got {}",
            other.type_name().name
        ))),
    }
}

fn arg_f64(method: &str, arg: &Value) -> ExprResult<f64> {
    match arg {
        Value::Int(v) => Ok(*v as f64),
        Value::Decimal(d) => Ok(d.to_f64().unwrap_or(f64::NAN)),
        Value::Float(f) => Ok(*f),
        other => Err(ExprError::mismatch(format!(
            "'{method}' expects a numeric argument, got {}",
            other.type_name().name
        ))),
    }
}

/// A non-negative count or position no larger than `len`.
fn bounded(index: i64, len: usize) -> ExprResult<usize> {
    usize::try_from(index)
        .ok()
        .filter(|&i| i <= len)
        .ok_or(ExprError::IndexOutOfRange { index, len })
}

fn string_method(s: &str, method: &str, args: &[Value]) -> ExprResult<Option<Value>> {
    let value = match method {
        "ToUpper" => {
            expect_args(method, args.len(), 0, 0)?;
            Value::String(s.to_uppercase())
        }
        "ToLower" => {
            expect_args(method, args.len(), 0, 0)?;
            Value::String(s.to_lowercase())
        }
        "Trim" => {
            expect_args(method, args.len(), 0, 0)?;
            Value::from(s.trim())
        }
        "Substring" => {
            expect_args(method, args.len(), 1, 2)?;
            let chars: Vec<char> = s.chars().collect();
            let start = bounded(arg_int(method, &args[0])?, chars.len())?;
            let end = match args.get(1) {
                Some(count) => {
                    let count = arg_int(method, count)?;
                    if count < 0 {
                        return Err(ExprError::IndexOutOfRange {
                            index: count,
                            len: chars.len(),
                        });
                    }
                    bounded((start as i64).saturating_add(count), chars.len())?
                }
                None => chars.len(),
            };
            Value::String(chars[start..end].iter().collect())
        }
        "Contains" => {
            expect_args(method, args.len(), 1, 1)?;
            Value::Bool(s.contains(arg_str(method, &args[0])?))
        }
        "StartsWith" => {
            expect_args(method, args.len(), 1, 1)?;
            Value::Bool(s.starts_with(arg_str(method, &args[0])?))
        }
        "EndsWith" => {
            expect_args(method, args.len(), 1, 1)?;
            Value::Bool(s.ends_with(arg_str(method, &args[0])?))
        }
        "Replace" => {
            expect_args(method, args.len(), 2, 2)?;
            let from = arg_str(method, &args[0])?;
            if from.is_empty() {
                return Err(ExprError::InvalidArgument {
                    message: "'Replace' cannot replace an empty string".to_string(),
                });
            }
            Value::String(s.replace(from, arg_str(method, &args[1])?))
        }
        "IndexOf" => {
            expect_args(method, args.len(), 1, 1)?;
            let needle = arg_str(method, &args[0])?;
            let index = s
                .find(needle)
                .map_or(-1, |byte| s[..byte].chars().count() as i64);
            Value::Int(index)
        }
        "PadLeft" | "PadRight" => {
            expect_args(method, args.len(), 1, 1)?;
            let width = arg_int(method, &args[0])?;
            let width = usize::try_from(width).map_err(|_| ExprError::InvalidArgument {
                message: format!("'{method}' width must not be negative, got {width}"),
            })?;
            if width > MAX_PAD_WIDTH {
                return Err(ExprError::InvalidArgument {
                    message: format!(
                        "'{method}' width must not exceed {MAX_PAD_WIDTH}, got {width}"
                    ),
                });
            }
            let padding = " ".repeat(width.saturating_sub(s.chars().count()));
            if method == "PadLeft" {
                Value::String(format!("{padding}{s}"))
            } else {
                Value::String(format!("{s}{padding}"))
            }
        }
        _ => return Ok(None),
    };
    Ok(Some(value))
}

fn list_method(items: &[Value], method: &str, args: &[Value]) -> ExprResult<Option<Value>> {
    let empty = || ExprError::InvalidArgument {
        message: format!("'{method}' called on an empty list"),
    };
    let value = match method {
        "First" => {
            expect_args(method, args.len(), 0, 0)?;
            items.first().cloned().ok_or_else(empty)?
        }
        "Last" => {
            expect_args(method, args.len(), 0, 0)?;
            items.last().cloned().ok_or_else(empty)?
        }
        "Contains" => {
            expect_args(method, args.len(), 1, 1)?;
            Value::Bool(items.iter().any(|item| values_equal(item, &args[0])))
        }
        _ => return Ok(None),
    };
    Ok(Some(value))
}

fn datetime_method(dt: &NaiveDateTime, method: &str, args: &[Value]) -> ExprResult<Option<Value>> {
    let overflow = || ExprError::Overflow {
        op: method.to_string(),
    };
    let unit_ms = match method {
        "AddDays" => 86_400_000.0,
        "AddHours" => 3_600_000.0,
        "AddMinutes" => 60_000.0,
        "AddSeconds" => 1_000.0,
        "AddMonths" | "AddYears" => {
            expect_args(method, args.len(), 1, 1)?;
            let mut months = arg_int(method, &args[0])?;
            if method == "AddYears" {
                months = months.checked_mul(12).ok_or_else(overflow)?;
            }
            let magnitude = u32::try_from(months.unsigned_abs()).map_err(|_| overflow())?;
            let shifted = if months >= 0 {
                dt.checked_add_months(Months::new(magnitude))
            } else {
                dt.checked_sub_months(Months::new(magnitude))
            };
            return shifted.map(|v| Some(Value::DateTime(v))).ok_or_else(overflow);
        }
        _ => return Ok(None),
    };

    expect_args(method, args.len(), 1, 1)?;
    let ms = (arg_f64(method, &args[0])? * unit_ms).round();
    if !ms.is_finite() || ms.abs() >= i64::MAX as f64 {
        return Err(overflow());
    }
    TimeDelta::try_milliseconds(ms as i64)
        .and_then(|delta| dt.checked_add_signed(delta))
        .map(|v| Some(Value::DateTime(v)))
        .ok_or_else(overflow)
}

fn index_into(value: &Value, index: &Value) -> ExprResult<Value> {
    let position = match index {
        Value::Int(i) => *i,
        other => {
            return Err(ExprError::mismatch(format!(
                "index must be an integer, got {}",
                other.type_name().name
            )));
        }
    };
    let out_of_range = |len: usize| ExprError::IndexOutOfRange {
        index: position,
        len,
    };

    match value {
        Value::Null => Err(ExprError::NullReference {
            member: format!("[{position}]"),
        }),
        Value::List(items) => usize::try_from(position)
            .ok()
            .and_then(|i| items.get(i))
            .cloned()
            .ok_or_else(|| out_of_range(items.len())),
        Value::String(s) => usize::try_from(position)
            .ok()
            .and_then(|i| s.chars().nth(i))
            .map(Value::from)
            .ok_or_else(|| out_of_range(s.chars().count())),
        other => Err(ExprError::mismatch(format!(
            "values of type {} cannot be indexed",
            other.type_name().name
        ))),
    }
}

fn unary(op: UnaryOp, value: Value) -> ExprResult<Value> {
    match (op, value) {
        (UnaryOp::Neg, Value::Int(v)) => v.checked_neg().map(Value::Int).ok_or(ExprError::Overflow {
            op: "-".to_string(),
        }),
        (UnaryOp::Neg, Value::Decimal(d)) => Ok(Value::Decimal(-d)),
        (UnaryOp::Neg, Value::Float(f)) => Ok(Value::Float(-f)),
        (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (op, other) => Err(ExprError::mismatch(format!(
            "operator '{}' cannot be applied to {}",
            if op == UnaryOp::Neg { "-" } else { "!" },
            other.type_name().name
        ))),
    }
}

/// Both operands converted to their common numeric type.
enum NumPair {
    Int(i64, i64),
    Decimal(Decimal, Decimal),
    Float(f64, f64),
}

fn promote(left: &Value, right: &Value) -> Option<NumPair> {
    let float = |v: &Value| match v {
        Value::Int(i) => Some(*i as f64),
        Value::Decimal(d) => d.to_f64(),
        Value::Float(f) => Some(*f),
        _ => None,
    };
    let decimal = |v: &Value| match v {
        Value::Int(i) => Some(Decimal::from(*i)),
        Value::Decimal(d) => Some(*d),
        _ => None,
    };

    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Some(NumPair::Int(*a, *b)),
        (Value::Float(_), _) | (_, Value::Float(_)) => {
            Some(NumPair::Float(float(left)?, float(right)?))
        }
        _ => Some(NumPair::Decimal(decimal(left)?, decimal(right)?)),
    }
}

fn binary(op: BinaryOp, left: &Value, right: &Value) -> ExprResult<Value> {
    match op {
        BinaryOp::Eq => Ok(Value::Bool(values_equal(left, right))),
        BinaryOp::Ne => Ok(Value::Bool(!values_equal(left, right))),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordering = compare(op, left, right)?;
            let result = match op {
                BinaryOp::Lt => ordering == Some(Ordering::Less),
                BinaryOp::Le => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
                BinaryOp::Gt => ordering == Some(Ordering::Greater),
                _ => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
            };
            Ok(Value::Bool(result))
        }
        BinaryOp::Add if matches!(left, Value::String(_)) || matches!(right, Value::String(_)) => {
            Ok(Value::String(format!("{left}{right}")))
        }
        _ => arithmetic(op, left, right),
    }
}

fn operand_mismatch(op: BinaryOp, left: &Value, right: &Value) -> ExprError {
    ExprError::mismatch(format!(
        "operator '{}' cannot be applied to {} and {}",
        op.symbol(),
        left.type_name().name,
        right.type_name().name
    ))
}

fn arithmetic(op: BinaryOp, left: &Value, right: &Value) -> ExprResult<Value> {
    let overflow = || ExprError::Overflow {
        op: op.symbol().to_string(),
    };

    match promote(left, right).ok_or_else(|| operand_mismatch(op, left, right))? {
        NumPair::Int(a, b) => {
            if matches!(op, BinaryOp::Div | BinaryOp::Rem) && b == 0 {
                return Err(ExprError::DivideByZero);
            }
            let result = match op {
                BinaryOp::Add => a.checked_add(b),
                BinaryOp::Sub => a.checked_sub(b),
                BinaryOp::Mul => a.checked_mul(b),
                BinaryOp::Div => a.checked_div(b),
                BinaryOp::Rem => a.checked_rem(b),
                _ => return Err(operand_mismatch(op, left, right)),
            };
            result.map(Value::Int).ok_or_else(overflow)
        }
        NumPair::Decimal(a, b) => {
            if matches!(op, BinaryOp::Div | BinaryOp::Rem) && b.is_zero() {
                return Err(ExprError::DivideByZero);
            }
            let result = match op {
                BinaryOp::Add => a.checked_add(b),
                BinaryOp::Sub => a.checked_sub(b),
                BinaryOp::Mul => a.checked_mul(b),
                BinaryOp::Div => a.checked_div(b),
                BinaryOp::Rem => a.checked_rem(b),
                _ => return Err(operand_mismatch(op, left, right)),
            };
            result.map(Value::Decimal).ok_or_else(overflow)
        }
        NumPair::Float(a, b) => {
            let result = match op {
                BinaryOp::Add => a + b,
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                BinaryOp::Div => a / b,
                BinaryOp::Rem => a % b,
                _ => return Err(operand_mismatch(op, left, right)),
            };
            Ok(Value::Float(result))
        }
    }
}

/// `None` when the operands are unordered (a NaN is involved).
fn compare(op: BinaryOp, left: &Value, right: &Value) -> ExprResult<Option<Ordering>> {
    match (left, right) {
        (Value::String(a), Value::String(b)) => Ok(Some(a.cmp(b))),
        (Value::DateTime(a), Value::DateTime(b)) => Ok(Some(a.cmp(b))),
        _ => match promote(left, right).ok_or_else(|| operand_mismatch(op, left, right))? {
            NumPair::Int(a, b) => Ok(Some(a.cmp(&b))),
            NumPair::Decimal(a, b) => Ok(Some(a.cmp(&b))),
            NumPair::Float(a, b) => Ok(a.partial_cmp(&b)),
        },
    }
}

/// Equality across kinds: numbers compare by value after promotion, other
/// mismatched kinds are simply unequal.
pub(crate) fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::DateTime(a), Value::DateTime(b)) => a == b,
        (Value::Type(a), Value::Type(b)) => a == b,
        (Value::Object(a), Value::Object(b)) => a == b,
        (Value::List(a), Value::List(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        _ => match promote(left, right) {
            Some(NumPair::Int(a, b)) => a == b,
            Some(NumPair::Decimal(a, b)) => a == b,
            Some(NumPair::Float(a, b)) => a == b,
            None => false,
        },
    }
}
