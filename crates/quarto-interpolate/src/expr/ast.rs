/*
 * ast.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Expression syntax tree.

use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A constant: number, string, `true`, `false` or `null`.
    Literal(Value),

    /// `it`, the context object itself. Removed by binding.
    Context,

    /// A bare identifier before binding.
    Ident(String),

    /// A context field, resolved to its registry position by binding.
    Field { index: usize, name: String },

    /// `target.name`
    Member { target: Box<Expr>, name: String },

    /// `target.method(args)`, or `method(args)` on the context when `target`
    /// is `None`.
    Call {
        target: Option<Box<Expr>>,
        method: String,
        args: Vec<Expr>,
    },

    /// `target[index]`
    Index { target: Box<Expr>, index: Box<Expr> },

    Unary { op: UnaryOp, operand: Box<Expr> },

    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
        }
    }
}
