//! Recursive-descent parser producing a whitelisted [`Expr`] tree.
//!
//! Grammar (lowest to highest precedence):
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := unary (('*' | '/') unary)*
//! unary  := '-' unary | atom
//! atom   := number | signal | function '(' expr ')' | '(' expr ')'
//! ```

use crate::error::{Error, Result};
use crate::eval::ast::{BinOp, Expr, UnaryFn};
use crate::eval::lexer::{Token, TokenKind};

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn end_position(&self) -> usize {
        self.tokens.last().map(|t| t.position + 1).unwrap_or(0)
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        tok
    }

    fn expect(&mut self, expected: &TokenKind) -> Result<()> {
        match self.advance() {
            Some(tok) if std::mem::discriminant(&tok.kind) == std::mem::discriminant(expected) => Ok(()),
            Some(tok) => Err(Error::EvaluationError {
                message: format!("unexpected token at position {}", tok.position),
                position: tok.position,
            }),
            None => Err(Error::EvaluationError {
                message: "unexpected end of expression".to_string(),
                position: self.end_position(),
            }),
        }
    }

    pub fn parse(mut self) -> Result<Expr> {
        let expr = self.parse_expr()?;
        if let Some(tok) = self.peek() {
            return Err(Error::EvaluationError {
                message: format!("unexpected trailing token at position {}", tok.position),
                position: tok.position,
            });
        }
        Ok(expr)
    }

    fn parse_expr(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_term()?;
        loop {
            match self.peek().map(|t| &t.kind) {
                Some(TokenKind::Plus) => {
                    self.advance();
                    let rhs = self.parse_term()?;
                    lhs = Expr::Binary(BinOp::Add, Box::new(lhs), Box::new(rhs));
                }
                Some(TokenKind::Minus) => {
                    self.advance();
                    let rhs = self.parse_term()?;
                    lhs = Expr::Binary(BinOp::Sub, Box::new(lhs), Box::new(rhs));
                }
                _ => break,
            }
        }
        Ok(lhs)
    }

    fn parse_term(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_unary()?;
        loop {
            match self.peek().map(|t| &t.kind) {
                Some(TokenKind::Star) => {
                    self.advance();
                    let rhs = self.parse_unary()?;
                    lhs = Expr::Binary(BinOp::Mul, Box::new(lhs), Box::new(rhs));
                }
                Some(TokenKind::Slash) => {
                    self.advance();
                    let rhs = self.parse_unary()?;
                    lhs = Expr::Binary(BinOp::Div, Box::new(lhs), Box::new(rhs));
                }
                _ => break,
            }
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        if let Some(TokenKind::Minus) = self.peek().map(|t| &t.kind) {
            self.advance();
            let inner = self.parse_unary()?;
            return Ok(Expr::Neg(Box::new(inner)));
        }
        self.parse_atom()
    }

    fn parse_atom(&mut self) -> Result<Expr> {
        let tok = self.advance().ok_or_else(|| Error::EvaluationError {
            message: "unexpected end of expression".to_string(),
            position: self.end_position(),
        })?;

        match tok.kind {
            TokenKind::Number(v) => Ok(Expr::Number(v)),
            TokenKind::LParen => {
                let inner = self.parse_expr()?;
                self.expect(&TokenKind::RParen)?;
                Ok(inner)
            }
            TokenKind::Ident(name) => {
                if let Some(func) = UnaryFn::from_name(&name) {
                    self.expect(&TokenKind::LParen)?;
                    let arg = self.parse_expr()?;
                    self.expect(&TokenKind::RParen)?;
                    Ok(Expr::Call(func, Box::new(arg), tok.position))
                } else {
                    Ok(Expr::Signal(name))
                }
            }
            _ => Err(Error::EvaluationError {
                message: format!("unexpected token at position {}", tok.position),
                position: tok.position,
            }),
        }
    }
}

pub fn parse(expression: &str) -> Result<Expr> {
    let tokens = crate::eval::lexer::tokenize(expression)?;
    if tokens.is_empty() {
        return Err(Error::EvaluationError { message: "empty expression".to_string(), position: 0 });
    }
    Parser::new(tokens).parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_arithmetic_with_precedence() {
        let expr = parse("V(out) + 2 * V(in)").unwrap();
        assert!(matches!(expr, Expr::Binary(BinOp::Add, _, _)));
    }

    #[test]
    fn parses_nested_function_calls() {
        let expr = parse("db(deriv(V(out)))").unwrap();
        match expr {
            Expr::Call(UnaryFn::Db, inner, _) => {
                assert!(matches!(*inner, Expr::Call(UnaryFn::Deriv, _, _)));
            }
            _ => panic!("expected db(...) call"),
        }
    }

    #[test]
    fn rejects_unknown_identifier_used_as_function() {
        let err = parse("foo(V(out))").unwrap_err();
        assert!(matches!(err, Error::EvaluationError { .. }));
    }

    #[test]
    fn rejects_unbalanced_parens() {
        assert!(parse("(V(out) + 1").is_err());
    }
}
