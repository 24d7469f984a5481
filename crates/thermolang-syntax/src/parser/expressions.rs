//! Expression parsing methods for the recursive-descent parser.
//!
//! One method per precedence level, loosest first:
//! equality, relational, additive, multiplicative, unary minus, primary.

use super::Parser;
use crate::ast::*;
use crate::error::SyntaxError;
use crate::lexer::{SpannedToken, Token};

impl Parser {
    pub fn parse_expression(&mut self) -> Result<Expression, SyntaxError> {
        self.parse_equality()
    }

    fn parse_equality(&mut self) -> Result<Expression, SyntaxError> {
        let mut left = self.parse_relational()?;

        loop {
            let op = match self.peek() {
                Some(Token::Eq) => BinaryOp::Eq,
                Some(Token::Ne) => BinaryOp::Ne,
                _ => return Ok(left),
            };
            self.advance();

            let right = self.parse_relational()?;
            left = binary(left, op, right);
        }
    }

    fn parse_relational(&mut self) -> Result<Expression, SyntaxError> {
        let mut left = self.parse_additive()?;

        loop {
            let op = match self.peek() {
                Some(Token::Lt) => BinaryOp::Lt,
                Some(Token::Le) => BinaryOp::Le,
                Some(Token::Gt) => BinaryOp::Gt,
                Some(Token::Ge) => BinaryOp::Ge,
                _ => return Ok(left),
            };
            self.advance();

            let right = self.parse_additive()?;
            left = binary(left, op, right);
        }
    }

    fn parse_additive(&mut self) -> Result<Expression, SyntaxError> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.advance();

            let right = self.parse_multiplicative()?;
            left = binary(left, op, right);
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expression, SyntaxError> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                _ => return Ok(left),
            };
            self.advance();

            let right = self.parse_unary()?;
            left = binary(left, op, right);
        }
    }

    fn parse_unary(&mut self) -> Result<Expression, SyntaxError> {
        if matches!(self.peek(), Some(Token::Minus)) {
            let start_span = self.peek_span();
            self.advance();
            let expr = self.nested(start_span, Self::parse_unary)?;
            let span = start_span.merge(expr.span());

            return Ok(Expression::Negate {
                expr: Box::new(expr),
                span,
            });
        }

        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expression, SyntaxError> {
        let sensor = match self.peek() {
            Some(Token::Humidity) => Some(Sensor::Humidity),
            Some(Token::Occupied) => Some(Sensor::Occupied),
            Some(Token::Time) => Some(Sensor::Time),
            Some(Token::Temp) => Some(Sensor::Temperature),
            _ => None,
        };
        if let Some(sensor) = sensor {
            let span = self.peek_span();
            self.advance();
            return Ok(Expression::Sensor(sensor, span));
        }

        match self.peek() {
            Some(Token::Integer(_) | Token::String(_) | Token::Identifier(_)) => {
                let Some(SpannedToken { token, span }) = self.advance() else {
                    unreachable!("peek confirmed a token");
                };
                Ok(match token {
                    Token::Integer(n) => Expression::Integer(n, span),
                    Token::String(s) => Expression::Text(s, span),
                    Token::Identifier(name) => Expression::Variable(name, span),
                    _ => unreachable!("literal token filtered above"),
                })
            }
            Some(Token::LeftParen) => {
                let span = self.peek_span();
                self.advance();
                let expr = self.nested(span, Self::parse_expression)?;
                self.expect(Token::RightParen, "parenthesized expression")?;
                Ok(expr)
            }
            _ => Err(self.unexpected("expression", "expression")),
        }
    }
}

fn binary(left: Expression, op: BinaryOp, right: Expression) -> Expression {
    let span = left.span().merge(right.span());
    Expression::Binary {
        left: Box::new(left),
        op,
        right: Box::new(right),
        span,
    }
}
