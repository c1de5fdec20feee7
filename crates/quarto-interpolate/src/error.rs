/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for expression evaluation and interpolation.

use thiserror::Error;

/// Errors raised while compiling or evaluating a single expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    /// The expression text could not be parsed.
    #[error("Syntax error at offset {position}: {message}")]
    Syntax { message: String, position: usize },

    /// A field or property does not exist on the type.
    #[error("No member '{member}' on type '{type_name}'")]
    UnknownMember { type_name: String, member: String },

    /// A method does not exist on the type.
    #[error("No method '{method}' on type '{type_name}'")]
    UnknownMethod { type_name: String, method: String },

    /// A method was called with the wrong number of arguments.
    #[error("Method '{method}' expects {expected} argument(s), got {found}")]
    ArgumentCount {
        method: String,
        expected: String,
        found: usize,
    },

    /// An operator or method was applied to values of the wrong kind.
    #[error("Type mismatch: {message}")]
    TypeMismatch { message: String },

    #[error("Attempted to divide by zero")]
    DivideByZero,

    #[error("Arithmetic overflow in '{op}'")]
    Overflow { op: String },

    #[error("Index {index} is out of range for length {len}")]
    IndexOutOfRange { index: i64, len: usize },

    /// A member was accessed on a null value.
    #[error("Null reference while accessing '{member}'")]
    NullReference { member: String },

    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },
}

impl ExprError {
    pub(crate) fn mismatch(message: impl Into<String>) -> Self {
        ExprError::TypeMismatch {
            message: message.into(),
        }
    }
}

/// Errors raised while applying a composite format string.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormatError {
    /// The composite format string is not well formed.
    #[error("Invalid format string at offset {position}: {message}")]
    InvalidFormatString { message: String, position: usize },

    /// A placeholder refers to a missing argument.
    #[error("Placeholder index {index} is out of range ({count} argument(s))")]
    IndexOutOfRange { index: usize, count: usize },

    /// A format specifier is not valid for the value it is applied to.
    #[error("Format specifier '{specifier}' is not valid for {kind} values")]
    InvalidSpecifier { specifier: String, kind: &'static str },
}

/// Errors returned by the interpolation entry points.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InterpolateError {
    /// An expression failed to compile or evaluate.
    #[error("Error expression='{expression}': {source}")]
    TemplateEvaluation {
        expression: String,
        #[source]
        source: ExprError,
    },

    /// The rewritten template could not be formatted.
    #[error("Format error: {0}")]
    Format(#[from] FormatError),
}

impl InterpolateError {
    /// Wrap an expression failure with the expression text.
    pub fn evaluation(expression: impl Into<String>, source: ExprError) -> Self {
        InterpolateError::TemplateEvaluation {
            expression: expression.into(),
            source,
        }
    }
}

/// Result type for expression evaluation.
pub type ExprResult<T> = Result<T, ExprError>;

/// Result type for interpolation.
pub type InterpolateResult<T> = Result<T, InterpolateError>;
