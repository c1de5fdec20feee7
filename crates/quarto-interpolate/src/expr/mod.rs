/*
 * mod.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The embedded expression language.
//!
//! Expressions are parsed once, bound against the field registry of the
//! context type, and then evaluated any number of times against instances of
//! that type. Binding resolves every root identifier to a registry position,
//! so a misspelled field is reported when the expression is compiled rather
//! than on some later evaluation.

mod ast;
mod eval;
mod lexer;
mod parser;

use std::sync::Arc;

pub use ast::{BinaryOp, Expr, UnaryOp};
pub use parser::parse;

use crate::error::{ExprError, ExprResult};
use crate::reflect::{ContextRef, TypeDescriptor};
use crate::value::Value;

/// An expression bound to one context type.
#[derive(Debug)]
pub struct CompiledExpression {
    source: String,
    root: Expr,
    descriptor: Arc<TypeDescriptor>,
}

impl CompiledExpression {
    /// Parse `source` and bind it to the fields of `descriptor`.
    pub fn compile(source: &str, descriptor: Arc<TypeDescriptor>) -> ExprResult<Self> {
        let parsed = parse(source)?;
        let root = bind(parsed, &descriptor)?;
        Ok(CompiledExpression {
            source: source.to_string(),
            root,
            descriptor,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> &Expr {
        &self.root
    }

    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    /// Evaluate against a context of the bound type.
    pub fn evaluate(&self, context: &ContextRef<'_>) -> ExprResult<Value> {
        if context.type_id() != self.descriptor.type_id() {
            return Err(ExprError::mismatch(format!(
                "expression was compiled for '{}' but evaluated against '{}'",
                self.descriptor.full_name(),
                context.descriptor().full_name()
            )));
        }
        eval::eval(&self.root, context)
    }
}

/// Resolve identifiers rooted at the context.
fn bind(expr: Expr, descriptor: &TypeDescriptor) -> ExprResult<Expr> {
    let bound = match expr {
        Expr::Ident(name) => resolve_field(name, descriptor)?,

        Expr::Member { target, name } if *target == Expr::Context => {
            resolve_field(name, descriptor)?
        }

        Expr::Context => {
            return Err(ExprError::InvalidArgument {
                message: "'it' must be followed by a member access".to_string(),
            });
        }

        Expr::Call {
            target,
            method,
            args,
        } => {
            let target = match target {
                Some(t) if *t == Expr::Context => None,
                Some(t) => Some(Box::new(bind(*t, descriptor)?)),
                None => None,
            };
            if target.is_none() && !matches!(method.as_str(), "GetType" | "ToString") {
                return Err(ExprError::UnknownMethod {
                    type_name: descriptor.full_name().to_string(),
                    method,
                });
            }
            Expr::Call {
                target,
                method,
                args: args
                    .into_iter()
                    .map(|arg| bind(arg, descriptor))
                    .collect::<ExprResult<_>>()?,
            }
        }

        Expr::Member { target, name } => Expr::Member {
            target: Box::new(bind(*target, descriptor)?),
            name,
        },

        Expr::Index { target, index } => Expr::Index {
            target: Box::new(bind(*target, descriptor)?),
            index: Box::new(bind(*index, descriptor)?),
        },

        Expr::Unary { op, operand } => Expr::Unary {
            op,
            operand: Box::new(bind(*operand, descriptor)?),
        },

        Expr::Binary { op, left, right } => Expr::Binary {
            op,
            left: Box::new(bind(*left, descriptor)?),
            right: Box::new(bind(*right, descriptor)?),
        },

        leaf @ (Expr::Literal(_) | Expr::Field { .. }) => leaf,
    };
    Ok(bound)
}

fn resolve_field(name: String, descriptor: &TypeDescriptor) -> ExprResult<Expr> {
    match descriptor.field_index(&name) {
        Some(index) => Ok(Expr::Field { index, name }),
        None => Err(ExprError::UnknownMember {
            type_name: descriptor.full_name().to_string(),
            member: name,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::{NoContext, Reflect, TypeBuilder};
    use chrono::{NaiveDate, NaiveDateTime};
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    struct Address {
        city: String,
    }

    impl Reflect for Address {
        fn describe(ty: &mut TypeBuilder<Self>) {
            ty.field("City", |a| a.city.clone());
        }
    }

    struct Sample {
        id: i32,
        name: Option<String>,
        when: NaiveDateTime,
        prices: Vec<Decimal>,
        ratio: f64,
        address: Option<std::sync::Arc<Address>>,
    }

    impl Reflect for Sample {
        fn describe(ty: &mut TypeBuilder<Self>) {
            ty.field("Id", |s| s.id)
                .field("Name", |s| s.name.clone())
                .field("When", |s| s.when)
                .field("Prices", |s| s.prices.clone())
                .field("Ratio", |s| s.ratio)
                .field("Address", |s| {
                    s.address
                        .clone()
                        .map_or(Value::Null, |a| Value::Object(crate::reflect::ObjectRef::from_arc(a)))
                });
        }
    }

    fn sample() -> Sample {
        Sample {
            id: 7,
            name: Some("HeLLo".to_string()),
            when: NaiveDate::from_ymd_opt(2025, 3, 26)
                .unwrap()
                .and_hms_opt(3, 5, 10)
                .unwrap(),
            prices: vec![Decimal::new(2, 0), Decimal::new(43, 1), Decimal::new(7, 0)],
            ratio: 0.5,
            address: Some(std::sync::Arc::new(Address {
                city: "Oslo".to_string(),
            })),
        }
    }

    fn run(src: &str) -> ExprResult<Value> {
        let compiled = CompiledExpression::compile(src, TypeDescriptor::of::<Sample>())?;
        let s = sample();
        compiled.evaluate(&ContextRef::new(&s))
    }

    fn ok(src: &str) -> Value {
        run(src).unwrap()
    }

    #[test]
    fn test_fields_and_members() {
        assert_eq!(ok("Id"), Value::Int(7));
        assert_eq!(ok("it.Id"), Value::Int(7));
        assert_eq!(ok("Name.Length"), Value::Int(5));
        assert_eq!(ok("When.Year + 5"), Value::Int(2030));
        assert_eq!(ok("Prices[1]"), Value::Decimal(Decimal::new(43, 1)));
        assert_eq!(ok("Prices.Count"), Value::Int(3));
        assert_eq!(ok("Address.City"), Value::from("Oslo"));
        assert_eq!(ok("When.DayOfWeek"), Value::from("Wednesday"));
    }

    #[test]
    fn test_arithmetic_promotion() {
        assert_eq!(ok("7+3"), Value::Int(10));
        assert_eq!(ok("7 / 2"), Value::Int(3));
        assert_eq!(ok("-7 % 3"), Value::Int(-1));
        assert_eq!(ok("Prices[1] * 100"), Value::Decimal(Decimal::new(4300, 1)));
        assert_eq!(ok("Ratio * 4"), Value::Float(2.0));
        assert_eq!(ok("1.5m + 1"), Value::Decimal(Decimal::new(25, 1)));
        assert_eq!(ok("Name + '!' + Id"), Value::from("HeLLo!7"));
    }

    #[test]
    fn test_arithmetic_errors() {
        assert_eq!(run("1 / 0"), Err(ExprError::DivideByZero));
        assert_eq!(run("1.0m % 0"), Err(ExprError::DivideByZero));
        assert!(matches!(
            run("9223372036854775807 + 1"),
            Err(ExprError::Overflow { .. })
        ));
        assert!(matches!(run("Name - 1"), Err(ExprError::TypeMismatch { .. })));
    }

    #[test]
    fn test_logic_short_circuits() {
        assert_eq!(ok("Id > 5 && Name.StartsWith('He')"), Value::Bool(true));
        assert_eq!(ok("Id == 7.0"), Value::Bool(true));
        assert_eq!(ok("Id <> 7"), Value::Bool(false));
        // The right side would fail if evaluated.
        assert_eq!(ok("false and (1 / 0 == 1)"), Value::Bool(false));
        assert_eq!(ok("true or (1 / 0 == 1)"), Value::Bool(true));
        assert_eq!(ok("not (Id < 3)"), Value::Bool(true));
        assert!(matches!(run("Id && true"), Err(ExprError::TypeMismatch { .. })));
    }

    #[test]
    fn test_string_methods() {
        assert_eq!(ok("Name.ToUpper()"), Value::from("HELLO"));
        assert_eq!(ok("Name.Substring(1, 3)"), Value::from("eLL"));
        assert_eq!(ok("Name.Substring(2)"), Value::from("LLo"));
        assert_eq!(ok("Name.IndexOf('L')"), Value::Int(2));
        assert_eq!(ok("Name.Replace('L', 'l')"), Value::from("Hello"));
        assert_eq!(ok("Name.PadLeft(7)"), Value::from("  HeLLo"));
        assert_eq!(ok("Name[0]"), Value::from("H"));
        assert!(matches!(
            run("Name.Substring(4, 5)"),
            Err(ExprError::IndexOutOfRange { .. })
        ));
        assert!(matches!(
            run("Name.Substring()"),
            Err(ExprError::ArgumentCount { .. })
        ));
    }

    #[test]
    fn test_padding_width_is_bounded() {
        assert_eq!(ok("Name.PadRight(1000000).Length"), Value::Int(1_000_000));
        for expression in [
            "Name.PadLeft(9223372036854775807)",
            "Name.PadRight(1000001)",
            "Name.PadLeft(-1)",
        ] {
            assert!(
                matches!(run(expression), Err(ExprError::InvalidArgument { .. })),
                "{expression}"
            );
        }
    }

    #[test]
    fn test_datetime_methods() {
        let expected = NaiveDate::from_ymd_opt(2025, 4, 1)
            .unwrap()
            .and_hms_opt(3, 5, 10)
            .unwrap();
        assert_eq!(ok("When.AddDays(6)"), Value::DateTime(expected));
        assert_eq!(ok("When.AddMonths(1).Month"), Value::Int(4));
        assert_eq!(ok("When.AddYears(-1).Year"), Value::Int(2024));
        assert_eq!(ok("When.AddHours(0.5).Minute"), Value::Int(35));
        assert_eq!(ok("When.Date.Hour"), Value::Int(0));
    }

    #[test]
    fn test_get_type() {
        assert_eq!(ok("GetType().Name"), Value::from("Sample"));
        assert_eq!(ok("Id.GetType().Name"), Value::from("Int64"));
        assert_eq!(ok("Prices[0].ToString()"), Value::from("2"));
    }

    #[test]
    fn test_binding_errors() {
        assert_eq!(
            run("Missing + 1"),
            Err(ExprError::UnknownMember {
                type_name: std::any::type_name::<Sample>().to_string(),
                member: "Missing".to_string(),
            })
        );
        assert!(matches!(run("Explode()"), Err(ExprError::UnknownMethod { .. })));
        assert!(matches!(run("it"), Err(ExprError::InvalidArgument { .. })));
        assert!(matches!(run("Name.Nope"), Err(ExprError::UnknownMember { .. })));
    }

    #[test]
    fn test_null_reference() {
        let compiled = CompiledExpression::compile("Name.Length", TypeDescriptor::of::<Sample>())
            .unwrap();
        let mut s = sample();
        s.name = None;
        assert_eq!(
            compiled.evaluate(&ContextRef::new(&s)),
            Err(ExprError::NullReference {
                member: "Length".to_string()
            })
        );
    }

    #[test]
    fn test_wrong_context_type_is_rejected() {
        let compiled = CompiledExpression::compile("Id", TypeDescriptor::of::<Sample>()).unwrap();
        assert!(matches!(
            compiled.evaluate(&ContextRef::new(&NoContext)),
            Err(ExprError::TypeMismatch { .. })
        ));
    }
}
