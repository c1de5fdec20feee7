/*
 * value.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Runtime values produced by expression evaluation.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

use crate::reflect::{ObjectRef, Reflect};

/// The name of a runtime type, as returned by `GetType()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeName {
    /// Short name, e.g. `Settings`.
    pub name: &'static str,

    /// Fully qualified name, e.g. `my_crate::config::Settings`.
    pub full_name: &'static str,
}

impl TypeName {
    pub const fn builtin(name: &'static str) -> Self {
        TypeName {
            name,
            full_name: name,
        }
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.full_name)
    }
}

/// A value flowing through expression evaluation and formatting.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Decimal(Decimal),
    Float(f64),
    String(String),
    DateTime(NaiveDateTime),
    List(Vec<Value>),
    /// A registered object whose fields are looked up at evaluation time.
    Object(ObjectRef),
    Type(TypeName),
}

impl Value {
    /// Wrap a registered type so its fields can be reached from expressions.
    pub fn object<T: Reflect>(value: T) -> Value {
        Value::Object(ObjectRef::new(value))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The runtime type of this value.
    pub fn type_name(&self) -> TypeName {
        match self {
            Value::Null => TypeName::builtin("Null"),
            Value::Bool(_) => TypeName::builtin("Boolean"),
            Value::Int(_) => TypeName::builtin("Int64"),
            Value::Decimal(_) => TypeName::builtin("Decimal"),
            Value::Float(_) => TypeName::builtin("Double"),
            Value::String(_) => TypeName::builtin("String"),
            Value::DateTime(_) => TypeName::builtin("DateTime"),
            Value::List(_) => TypeName::builtin("List"),
            Value::Object(obj) => obj.descriptor().type_name(),
            Value::Type(_) => TypeName::builtin("Type"),
        }
    }
}

/// Culture-invariant general form, used for `ToString()` and string
/// concatenation inside expressions.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Decimal(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::String(s) => f.write_str(s),
            Value::DateTime(dt) => write!(f, "{}", dt.format("%m/%d/%Y %H:%M:%S")),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Object(obj) => f.write_str(obj.descriptor().full_name()),
            Value::Type(t) => write!(f, "{t}"),
        }
    }
}

macro_rules! from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::Int(i64::from(v))
                }
            }
        )*
    };
}

from_int!(i8, i16, i32, i64, u8, u16, u32);

macro_rules! from_wide_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    match i64::try_from(v) {
                        Ok(small) => Value::Int(small),
                        Err(_) => Value::Decimal(Decimal::from(v)),
                    }
                }
            }
        )*
    };
}

from_wide_int!(u64, usize);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Decimal(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<char> for Value {
    fn from(v: char) -> Self {
        Value::String(v.to_string())
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::DateTime(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::DateTime(v.and_time(chrono::NaiveTime::MIN))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Clone + Into<Value>> From<&[T]> for Value {
    fn from(v: &[T]) -> Self {
        Value::List(v.iter().cloned().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions() {
        assert_eq!(Value::from(5i32), Value::Int(5));
        assert_eq!(Value::from(u64::MAX), Value::Decimal(Decimal::from(u64::MAX)));
        assert_eq!(Value::from(Some("x")), Value::String("x".to_string()));
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(
            Value::from(vec![1, 2]),
            Value::List(vec![Value::Int(1), Value::Int(2)])
        );
        let date = NaiveDate::from_ymd_opt(2025, 3, 26).unwrap();
        assert_eq!(
            Value::from(date),
            Value::DateTime(date.and_hms_opt(0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_display_is_invariant() {
        assert_eq!(Value::Bool(true).to_string(), "True");
        assert_eq!(Value::Float(4.5).to_string(), "4.5");
        assert_eq!(Value::Decimal(Decimal::new(430, 2)).to_string(), "4.30");
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(
            Value::from(vec![Value::Int(1), Value::from("a")]).to_string(),
            "[1, a]"
        );
        let dt = NaiveDate::from_ymd_opt(2025, 3, 26)
            .unwrap()
            .and_hms_opt(3, 5, 10)
            .unwrap();
        assert_eq!(Value::DateTime(dt).to_string(), "03/26/2025 03:05:10");
    }

    #[test]
    fn test_builtin_type_names() {
        assert_eq!(Value::Int(1).type_name().name, "Int64");
        assert_eq!(Value::from("s").type_name().name, "String");
        assert_eq!(Value::Null.type_name().name, "Null");
    }
}
