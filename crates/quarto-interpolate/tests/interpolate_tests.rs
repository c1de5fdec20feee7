/*
 * interpolate_tests.rs
 * Copyright (c) 2025 Posit, PBC
 */

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use quarto_interpolate::{
    Culture, ExprError, InterpolateError, InterpolateExt, Interpolator, ObjectRef, Reflect,
    TypeBuilder, Value, interpolate, interpolate_with, interpolate_without_context,
};
use rust_decimal::Decimal;

struct Owner {
    name: String,
}

impl Reflect for Owner {
    fn describe(ty: &mut TypeBuilder<Self>) {
        ty.field("Name", |o| o.name.clone());
    }
}

struct Report {
    date_prop: NaiveDateTime,
    int_field: i32,
    str_prop: String,
    d_array: Vec<Decimal>,
    owner: Arc<Owner>,
    note: Option<String>,
}

impl Reflect for Report {
    fn describe(ty: &mut TypeBuilder<Self>) {
        ty.field("DateProp", |r| r.date_prop)
            .field("IntField", |r| r.int_field)
            .field("StrProp", |r| r.str_prop.clone())
            .field("DArray", |r| r.d_array.clone())
            .field("Owner", |r| {
                Value::Object(ObjectRef::from_arc(Arc::clone(&r.owner)))
            })
            .field("Note", |r| r.note.clone());
    }
}

fn report() -> Report {
    Report {
        date_prop: NaiveDate::from_ymd_opt(2025, 3, 26)
            .unwrap()
            .and_hms_opt(3, 5, 10)
            .unwrap(),
        int_field: 5,
        str_prop: "-test text-".to_string(),
        d_array: vec![Decimal::new(2, 0), Decimal::new(43, 1), Decimal::new(7, 0)],
        owner: Arc::new(Owner {
            name: "Ann".to_string(),
        }),
        note: None,
    }
}

const TEMPLATE: &str = "p1={IntField,10:n2}, p2={StrProp}, p3={IntField}, \
p4={(DateProp.Year+5):n2}, p5={DateProp:g}, 10={7+3}, p7={GetType().Name}, p8={DArray[1]:p2}";

#[test]
fn test_sample_template_ru() {
    assert_eq!(
        report().interpolate_with(TEMPLATE, &Culture::ru()).unwrap(),
        "p1=      5,00, p2=-test text-, p3=5, p4=2\u{a0}030,00, p5=26.03.2025 03:05, \
10=10, p7=Report, p8=430,00\u{a0}%"
    );
}

#[test]
fn test_sample_template_en() {
    assert_eq!(
        interpolate_with(Some(&report()), TEMPLATE, &Culture::en()).unwrap(),
        "p1=      5.00, p2=-test text-, p3=5, p4=2,030.00, p5=3/26/2025 3:05 AM, \
10=10, p7=Report, p8=430.00%"
    );
}

#[test]
fn test_sample_template_invariant() {
    assert_eq!(
        interpolate(&report(), TEMPLATE).unwrap(),
        "p1=      5.00, p2=-test text-, p3=5, p4=2,030.00, p5=03/26/2025 03:05, \
10=10, p7=Report, p8=430.00 %"
    );
}

#[test]
fn test_repeated_expression_dedup() {
    struct Item {
        id: i64,
        name: &'static str,
    }

    impl Reflect for Item {
        fn describe(ty: &mut TypeBuilder<Self>) {
            ty.field("Id", |i| i.id).field("Name", |i| i.name);
        }
    }

    let item = Item {
        id: 1,
        name: "HeLLo",
    };
    assert_eq!(
        item.interpolate("{Name} {Id} {Name} {Name}").unwrap(),
        "HeLLo 1 HeLLo HeLLo"
    );
}

#[test]
fn test_without_context() {
    assert_eq!(interpolate_without_context("{7+3}").unwrap(), "10");
    assert_eq!(
        interpolate_without_context("{GetType().Name}").unwrap(),
        "NoContext"
    );
    assert_eq!(interpolate_without_context("plain text").unwrap(), "plain text");
}

#[test]
fn test_nested_objects_and_nulls() {
    let report = report();
    assert_eq!(
        report
            .interpolate("{Owner.Name.ToUpper()}|{Note}|{Note == null}")
            .unwrap(),
        "ANN||True"
    );
    assert!(matches!(
        report.interpolate("{Note.Length}"),
        Err(InterpolateError::TemplateEvaluation {
            source: ExprError::NullReference { .. },
            ..
        })
    ));
}

#[test]
fn test_date_arithmetic_and_custom_format() {
    assert_eq!(
        report()
            .interpolate("{DateProp.AddDays(10):yyyy-MM-dd} {DateProp.DayOfWeek}")
            .unwrap(),
        "2025-04-05 Wednesday"
    );
}

#[test]
fn test_evaluation_error_message() {
    let err = report().interpolate("{IntField / 0}").unwrap_err();
    assert!(
        err.to_string().starts_with("Error expression='IntField / 0'"),
        "{err}"
    );
    assert!(matches!(
        err,
        InterpolateError::TemplateEvaluation {
            source: ExprError::DivideByZero,
            ..
        }
    ));
}

#[test]
fn test_unknown_member_is_reported() {
    let interpolator = Interpolator::new();
    let err = interpolator.interpolate(&report(), "{Missing}").unwrap_err();
    assert_eq!(
        err,
        InterpolateError::TemplateEvaluation {
            expression: "Missing".to_string(),
            source: ExprError::UnknownMember {
                type_name: std::any::type_name::<Report>().to_string(),
                member: "Missing".to_string(),
            },
        }
    );
}

#[test]
fn test_oversized_padding_is_an_error() {
    let err = report()
        .interpolate("{StrProp.PadLeft(9223372036854775807)}")
        .unwrap_err();
    assert!(matches!(
        err,
        InterpolateError::TemplateEvaluation {
            source: ExprError::InvalidArgument { .. },
            ..
        }
    ));
}

struct Single {
    value: i64,
    text: String,
}

impl Reflect for Single {
    fn describe(ty: &mut TypeBuilder<Self>) {
        ty.field("V", |s| s.value).field("S", |s| s.text.clone());
    }
}

proptest! {
    #[test]
    fn integers_render_plainly(value in any::<i64>()) {
        let single = Single { value, text: String::new() };
        prop_assert_eq!(single.interpolate("{V}").unwrap(), value.to_string());
        prop_assert_eq!(
            single.interpolate_with("{V}", &Culture::ru()).unwrap(),
            value.to_string()
        );
    }

    #[test]
    fn strings_pass_through(text in "[a-zA-Z0-9 ,.:{}]{0,24}") {
        let single = Single { value: 0, text: text.clone() };
        prop_assert_eq!(single.interpolate("[{S}]").unwrap(), format!("[{text}]"));
    }
}
