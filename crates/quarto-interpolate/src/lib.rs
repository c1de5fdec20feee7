/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Template interpolation against the fields of a context object.
//!
//! A template embeds expressions in braces, each optionally followed by an
//! alignment and a format specifier:
//!
//! - `{Name}`: a registered field of the context
//! - `{Total,10:n2}`: right-aligned in 10 columns, two decimals
//! - `{(Created.Year + 5):n2}`, `{Items[1]:p2}`: arbitrary expressions
//! - `{GetType().Name}`: method calls on the context or any value
//!
//! Templates are rewritten once per context type into a positional format
//! string (`{0,10:n2}`), each distinct expression is compiled once per
//! context type, and the results are formatted with a [`FormatProvider`]
//! such as [`Culture::ru`].
//!
//! # Example
//!
//! ```ignore
//! use quarto_interpolate::{Culture, InterpolateExt, Reflect, TypeBuilder};
//!
//! struct Invoice { id: u32, total: Decimal }
//!
//! impl Reflect for Invoice {
//!     fn describe(ty: &mut TypeBuilder<Self>) {
//!         ty.field("Id", |i| i.id).field("Total", |i| i.total);
//!     }
//! }
//!
//! let text = invoice.interpolate_with("#{Id}: {Total:n2}", &Culture::ru())?;
//! ```

pub mod culture;
pub mod error;
pub mod evaluator;
pub mod expr;
pub mod format;
pub mod interpolator;
pub mod reflect;
pub mod template;
pub mod value;

pub use culture::{Culture, DateTimeFormat, FormatProvider, NumberFormat};
pub use error::{ExprError, ExprResult, FormatError, InterpolateError, InterpolateResult};
pub use evaluator::{CachingEvaluator, ExpressionEvaluator};
pub use expr::CompiledExpression;
pub use format::{format_composite, format_value};
pub use interpolator::{InterpolateExt, Interpolator, InterpolatorBuilder};
pub use reflect::{ContextRef, NoContext, ObjectRef, Reflect, TypeBuilder, TypeDescriptor};
pub use template::{ParsedTemplate, RegexTemplateParser, TemplateParser};
pub use value::{TypeName, Value};

/// Render `template` against `context` with the invariant culture.
pub fn interpolate<T: Reflect>(context: &T, template: &str) -> InterpolateResult<String> {
    Interpolator::global().interpolate(context, template)
}

/// Render `template` with an explicit provider. `None` evaluates against
/// [`NoContext`].
pub fn interpolate_with<T: Reflect>(
    context: Option<&T>,
    template: &str,
    provider: &dyn FormatProvider,
) -> InterpolateResult<String> {
    Interpolator::global().interpolate_with(context, template, provider)
}

/// Render a template that needs no context object, e.g. `"{7+3}"`.
pub fn interpolate_without_context(template: &str) -> InterpolateResult<String> {
    Interpolator::global().interpolate_without_context(template)
}
