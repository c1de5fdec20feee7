/*
 * parser.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Recursive-descent parser for expression text.
//!
//! Precedence, lowest first:
//!
//! | level          | operators                 |
//! |----------------|---------------------------|
//! | or             | `\|\|` `or`               |
//! | and            | `&&` `and`                |
//! | equality       | `==` `=` `!=` `<>`        |
//! | relational     | `<` `<=` `>` `>=`         |
//! | additive       | `+` `-`                   |
//! | multiplicative | `*` `/` `%`               |
//! | unary          | `-` `!` `not`             |
//! | postfix        | `.member` `.call()` `[i]` |

use std::str::FromStr;

use rust_decimal::Decimal;

use super::ast::{BinaryOp, Expr, UnaryOp};
use super::lexer::{Spanned, Token, tokenize};
use crate::error::{ExprError, ExprResult};
use crate::value::Value;

/// Parse expression text into an unbound syntax tree.
pub fn parse(src: &str) -> ExprResult<Expr> {
    let mut parser = Parser {
        tokens: tokenize(src)?,
        pos: 0,
    };
    let expr = parser.parse_or()?;
    match parser.peek() {
        Token::Eof => Ok(expr),
        other => Err(parser.error(format!("unexpected {}", describe(other)))),
    }
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        // The token list always ends with Eof, and `advance` never moves past it.
        &self.tokens[self.pos.min(self.tokens.len() - 1)].0
    }

    fn offset(&self) -> usize {
        self.tokens[self.pos.min(self.tokens.len() - 1)].1
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token != Token::Eof {
            self.pos += 1;
        }
        token
    }

    fn error(&self, message: String) -> ExprError {
        ExprError::Syntax {
            message,
            position: self.offset(),
        }
    }

    fn expect(&mut self, expected: Token) -> ExprResult<()> {
        if *self.peek() == expected {
            self.advance();
            Ok(())
        } else {
            Err(self.error(format!(
                "expected {}, found {}",
                describe(&expected),
                describe(self.peek())
            )))
        }
    }

    fn at_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), Token::Ident(name) if name == keyword)
    }

    fn parse_or(&mut self) -> ExprResult<Expr> {
        let mut left = self.parse_and()?;
        while matches!(self.peek(), Token::OrOr) || self.at_keyword("or") {
            self.advance();
            let right = self.parse_and()?;
            left = binary(BinaryOp::Or, left, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> ExprResult<Expr> {
        let mut left = self.parse_equality()?;
        while matches!(self.peek(), Token::AndAnd) || self.at_keyword("and") {
            self.advance();
            let right = self.parse_equality()?;
            left = binary(BinaryOp::And, left, right);
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> ExprResult<Expr> {
        let mut left = self.parse_relational()?;
        loop {
            let op = match self.peek() {
                Token::EqEq => BinaryOp::Eq,
                Token::NotEq => BinaryOp::Ne,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_relational()?;
            left = binary(op, left, right);
        }
    }

    fn parse_relational(&mut self) -> ExprResult<Expr> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.peek() {
                Token::Lt => BinaryOp::Lt,
                Token::Le => BinaryOp::Le,
                Token::Gt => BinaryOp::Gt,
                Token::Ge => BinaryOp::Ge,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_additive()?;
            left = binary(op, left, right);
        }
    }

    fn parse_additive(&mut self) -> ExprResult<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = binary(op, left, right);
        }
    }

    fn parse_multiplicative(&mut self) -> ExprResult<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Token::Star => BinaryOp::Mul,
                Token::Slash => BinaryOp::Div,
                Token::Percent => BinaryOp::Rem,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_unary()?;
            left = binary(op, left, right);
        }
    }

    fn parse_unary(&mut self) -> ExprResult<Expr> {
        let op = match self.peek() {
            Token::Minus => UnaryOp::Neg,
            Token::Bang => UnaryOp::Not,
            _ if self.at_keyword("not") => UnaryOp::Not,
            _ => return self.parse_postfix(),
        };
        self.advance();
        let operand = self.parse_unary()?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_postfix(&mut self) -> ExprResult<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek() {
                Token::Dot => {
                    self.advance();
                    let name = match self.advance() {
                        Token::Ident(name) => name,
                        other => {
                            return Err(self.error(format!(
                                "expected member name after '.', found {}",
                                describe(&other)
                            )));
                        }
                    };
                    expr = if *self.peek() == Token::LParen {
                        let args = self.parse_args()?;
                        Expr::Call {
                            target: Some(Box::new(expr)),
                            method: name,
                            args,
                        }
                    } else {
                        Expr::Member {
                            target: Box::new(expr),
                            name,
                        }
                    };
                }
                Token::LBracket => {
                    self.advance();
                    let index = self.parse_or()?;
                    self.expect(Token::RBracket)?;
                    expr = Expr::Index {
                        target: Box::new(expr),
                        index: Box::new(index),
                    };
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_args(&mut self) -> ExprResult<Vec<Expr>> {
        self.expect(Token::LParen)?;
        let mut args = Vec::new();
        if *self.peek() == Token::RParen {
            self.advance();
            return Ok(args);
        }
        loop {
            args.push(self.parse_or()?);
            match self.advance() {
                Token::Comma => continue,
                Token::RParen => return Ok(args),
                other => {
                    return Err(self.error(format!(
                        "expected ',' or ')' in argument list, found {}",
                        describe(&other)
                    )));
                }
            }
        }
    }

    fn parse_primary(&mut self) -> ExprResult<Expr> {
        let offset = self.offset();
        match self.advance() {
            Token::Number { text, suffix } => number_literal(&text, suffix, offset),
            Token::Str(s) => Ok(Expr::Literal(Value::String(s))),
            Token::LParen => {
                let inner = self.parse_or()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Token::Ident(name) => match name.as_str() {
                "true" => Ok(Expr::Literal(Value::Bool(true))),
                "false" => Ok(Expr::Literal(Value::Bool(false))),
                "null" => Ok(Expr::Literal(Value::Null)),
                "it" => Ok(Expr::Context),
                _ if *self.peek() == Token::LParen => {
                    let args = self.parse_args()?;
                    Ok(Expr::Call {
                        target: None,
                        method: name,
                        args,
                    })
                }
                _ => Ok(Expr::Ident(name)),
            },
            Token::Eof => Err(ExprError::Syntax {
                message: "expected an expression".to_string(),
                position: offset,
            }),
            other => Err(ExprError::Syntax {
                message: format!("unexpected {}", describe(&other)),
                position: offset,
            }),
        }
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn number_literal(text: &str, suffix: Option<char>, position: usize) -> ExprResult<Expr> {
    let invalid = |kind: &str| ExprError::Syntax {
        message: format!("invalid {kind} literal '{text}'"),
        position,
    };
    let is_real = text.contains(['.', 'e', 'E']);

    let value = match suffix {
        Some('m') => {
            let parsed = if text.contains(['e', 'E']) {
                Decimal::from_scientific(text)
            } else {
                Decimal::from_str(text)
            };
            Value::Decimal(parsed.map_err(|_| invalid("decimal"))?)
        }
        Some(_) => Value::Float(text.parse().map_err(|_| invalid("real"))?),
        None if is_real => Value::Float(text.parse().map_err(|_| invalid("real"))?),
        None => match text.parse::<i64>() {
            Ok(v) => Value::Int(v),
            // Too wide for i64: keep it exact.
            Err(_) => Value::Decimal(Decimal::from_str(text).map_err(|_| invalid("integer"))?),
        },
    };
    Ok(Expr::Literal(value))
}

fn describe(token: &Token) -> String {
    match token {
        Token::Ident(name) => format!("identifier '{name}'"),
        Token::Number { text, .. } => format!("number '{text}'"),
        Token::Str(_) => "string literal".to_string(),
        Token::Eof => "end of expression".to_string(),
        Token::LParen => "'('".to_string(),
        Token::RParen => "')'".to_string(),
        Token::LBracket => "'['".to_string(),
        Token::RBracket => "']'".to_string(),
        Token::Dot => "'.'".to_string(),
        Token::Comma => "','".to_string(),
        Token::Plus => "'+'".to_string(),
        Token::Minus => "'-'".to_string(),
        Token::Star => "'*'".to_string(),
        Token::Slash => "'/'".to_string(),
        Token::Percent => "'%'".to_string(),
        Token::Bang => "'!'".to_string(),
        Token::EqEq => "'=='".to_string(),
        Token::NotEq => "'!='".to_string(),
        Token::Lt => "'<'".to_string(),
        Token::Le => "'<='".to_string(),
        Token::Gt => "'>'".to_string(),
        Token::Ge => "'>='".to_string(),
        Token::AndAnd => "'&&'".to_string(),
        Token::OrOr => "'||'".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ident(name: &str) -> Box<Expr> {
        Box::new(Expr::Ident(name.to_string()))
    }

    fn int(v: i64) -> Box<Expr> {
        Box::new(Expr::Literal(Value::Int(v)))
    }

    #[test]
    fn test_precedence() {
        assert_eq!(
            parse("1 + 2 * 3").unwrap(),
            Expr::Binary {
                op: BinaryOp::Add,
                left: int(1),
                right: Box::new(Expr::Binary {
                    op: BinaryOp::Mul,
                    left: int(2),
                    right: int(3),
                }),
            }
        );
        assert_eq!(
            parse("a or b and not c").unwrap(),
            Expr::Binary {
                op: BinaryOp::Or,
                left: ident("a"),
                right: Box::new(Expr::Binary {
                    op: BinaryOp::And,
                    left: ident("b"),
                    right: Box::new(Expr::Unary {
                        op: UnaryOp::Not,
                        operand: ident("c"),
                    }),
                }),
            }
        );
    }

    #[test]
    fn test_left_associative() {
        assert_eq!(
            parse("8 - 3 - 1").unwrap(),
            Expr::Binary {
                op: BinaryOp::Sub,
                left: Box::new(Expr::Binary {
                    op: BinaryOp::Sub,
                    left: int(8),
                    right: int(3),
                }),
                right: int(1),
            }
        );
    }

    #[test]
    fn test_postfix_chain() {
        assert_eq!(
            parse("GetType().Name").unwrap(),
            Expr::Member {
                target: Box::new(Expr::Call {
                    target: None,
                    method: "GetType".to_string(),
                    args: vec![],
                }),
                name: "Name".to_string(),
            }
        );
        assert_eq!(
            parse("Items[1].Substring(0, 2)").unwrap(),
            Expr::Call {
                target: Some(Box::new(Expr::Index {
                    target: ident("Items"),
                    index: int(1),
                })),
                method: "Substring".to_string(),
                args: vec![Expr::Literal(Value::Int(0)), Expr::Literal(Value::Int(2))],
            }
        );
        assert_eq!(
            parse("it.Name").unwrap(),
            Expr::Member {
                target: Box::new(Expr::Context),
                name: "Name".to_string(),
            }
        );
    }

    #[test]
    fn test_literals() {
        assert_eq!(
            parse("4.3m").unwrap(),
            Expr::Literal(Value::Decimal(Decimal::new(43, 1)))
        );
        assert_eq!(parse("1.5").unwrap(), Expr::Literal(Value::Float(1.5)));
        assert_eq!(parse("2f").unwrap(), Expr::Literal(Value::Float(2.0)));
        assert_eq!(parse("null").unwrap(), Expr::Literal(Value::Null));
        assert_eq!(
            parse("99999999999999999999").unwrap(),
            Expr::Literal(Value::Decimal(
                Decimal::from_str("99999999999999999999").unwrap()
            ))
        );
    }

    #[test]
    fn test_syntax_errors() {
        assert!(matches!(
            parse(""),
            Err(ExprError::Syntax { position: 0, .. })
        ));
        assert!(matches!(
            parse("(1 + 2"),
            Err(ExprError::Syntax { position: 6, .. })
        ));
        assert!(matches!(
            parse("a b"),
            Err(ExprError::Syntax { position: 2, .. })
        ));
        assert!(matches!(
            parse("a."),
            Err(ExprError::Syntax { .. })
        ));
        assert!(matches!(
            parse("f(1 2)"),
            Err(ExprError::Syntax { .. })
        ));
    }
}
