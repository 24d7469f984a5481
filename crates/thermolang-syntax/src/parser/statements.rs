//! Rule and statement parsing for the recursive-descent parser.

use super::Parser;
use crate::ast::*;
use crate::error::SyntaxError;
use crate::lexer::{SpannedToken, Token};

const SET_TARGETS: &str = "SET target (TEMP, MODE, FAN, SWING, POWER or a variable name)";

impl Parser {
    /// A top-level item: a `RULE`, or a bare statement that runs as an
    /// always-true rule.
    pub(super) fn parse_item(&mut self) -> Result<Rule, SyntaxError> {
        if matches!(self.peek(), Some(Token::Rule)) {
            return self.parse_rule();
        }

        let statement = self.parse_statement()?;
        let span = statement.span();
        Ok(Rule {
            name: None,
            trigger: Trigger::Always,
            body: Block { statements: vec![statement], span },
            span,
        })
    }

    fn parse_rule(&mut self) -> Result<Rule, SyntaxError> {
        let start_span = self.expect(Token::Rule, "rule")?;

        let name = match (self.peek(), self.peek_nth(1)) {
            (Some(Token::Identifier(id)), Some(Token::Colon)) => {
                let id = id.clone();
                self.pos += 2;
                Some(id)
            }
            _ => None,
        };

        let condition = self.parse_expression()?;
        let body = self.parse_block("rule body")?;
        let span = start_span.merge(&body.span);

        Ok(Rule {
            name,
            trigger: Trigger::When(condition),
            body,
            span,
        })
    }

    pub fn parse_statement(&mut self) -> Result<Statement, SyntaxError> {
        match self.peek() {
            Some(Token::Set) => self.parse_set(),
            Some(Token::Wait) => self.parse_wait(),
            Some(Token::If) => self.parse_if(),
            Some(Token::While) => self.parse_while(),
            Some(Token::Repeat) => self.parse_repeat(),
            Some(Token::LeftBrace) => Ok(Statement::Block(self.parse_block("block")?)),
            _ => Err(self.unexpected("statement (SET, WAIT, IF, WHILE, REPEAT or '{')", "statement")),
        }
    }

    pub(super) fn parse_block(&mut self, context: &str) -> Result<Block, SyntaxError> {
        let start_span = self.expect(Token::LeftBrace, context)?;
        let mut statements = Vec::with_capacity(4);

        self.nested(start_span, |parser| {
            parser.skip_separators();
            while !matches!(parser.peek(), Some(Token::RightBrace) | None) {
                statements.push(parser.parse_statement()?);
                parser.skip_separators();
            }
            Ok(())
        })?;

        let end_span = self.expect(Token::RightBrace, context)?;

        Ok(Block {
            statements,
            span: start_span.merge(&end_span),
        })
    }

    fn parse_set(&mut self) -> Result<Statement, SyntaxError> {
        let start_span = self.expect(Token::Set, "SET")?;

        let target = match self.peek() {
            Some(
                Token::Temp
                | Token::Mode
                | Token::Fan
                | Token::Swing
                | Token::Power
                | Token::Identifier(_),
            ) => self.advance(),
            Some(sensor @ (Token::Humidity | Token::Occupied | Token::Time)) => {
                return Err(SyntaxError::InvalidSyntax {
                    message: format!("cannot assign to read-only sensor {}", sensor),
                    span: self.peek_span(),
                });
            }
            _ => None,
        };
        let Some(SpannedToken { token: target, .. }) = target else {
            return Err(self.unexpected(SET_TARGETS, "SET"));
        };

        self.expect(Token::Assign, "SET")?;

        let command = match target {
            Token::Temp => SetCommand::Temp(self.parse_expression()?),
            Token::Identifier(name) => SetCommand::Variable {
                name,
                value: self.parse_expression()?,
            },
            Token::Mode => SetCommand::Mode(self.parse_constant(
                "one of COOL, HEAT, DRY, FAN, AUTO",
                |t| match t {
                    Token::Cool => Some(Mode::Cool),
                    Token::Heat => Some(Mode::Heat),
                    Token::Dry => Some(Mode::Dry),
                    Token::Fan => Some(Mode::Fan),
                    Token::Auto => Some(Mode::Auto),
                    _ => None,
                },
            )?),
            Token::Fan => SetCommand::Fan(self.parse_constant(
                "one of OFF, LOW, MID, HIGH, AUTO",
                |t| match t {
                    Token::Off => Some(FanSpeed::Off),
                    Token::Low => Some(FanSpeed::Low),
                    Token::Mid => Some(FanSpeed::Mid),
                    Token::High => Some(FanSpeed::High),
                    Token::Auto => Some(FanSpeed::Auto),
                    _ => None,
                },
            )?),
            Token::Swing => SetCommand::Swing(self.parse_constant(
                "one of OFF, ON, LOW, MID, HIGH, AUTO",
                |t| match t {
                    Token::Off => Some(Swing::Off),
                    Token::On => Some(Swing::On),
                    Token::Low => Some(Swing::Low),
                    Token::Mid => Some(Swing::Mid),
                    Token::High => Some(Swing::High),
                    Token::Auto => Some(Swing::Auto),
                    _ => None,
                },
            )?),
            Token::Power => SetCommand::Power(self.parse_constant("ON or OFF", |t| match t {
                Token::On => Some(Power::On),
                Token::Off => Some(Power::Off),
                _ => None,
            })?),
            _ => unreachable!("target token filtered above"),
        };

        Ok(Statement::Set {
            command,
            span: start_span.merge(&self.previous_span()),
        })
    }

    /// Reads one enumerated constant; anything else is a static type error.
    fn parse_constant<T>(
        &mut self,
        expected: &str,
        convert: impl Fn(&Token) -> Option<T>,
    ) -> Result<T, SyntaxError> {
        match self.peek().and_then(&convert) {
            Some(value) => {
                self.pos += 1;
                Ok(value)
            }
            None => Err(self.unexpected(expected, "SET")),
        }
    }

    fn parse_wait(&mut self) -> Result<Statement, SyntaxError> {
        let start_span = self.expect(Token::Wait, "WAIT")?;
        let seconds = self.parse_expression()?;
        let end_span = self.expect(Token::Seconds, "WAIT")?;

        Ok(Statement::Wait {
            seconds,
            span: start_span.merge(&end_span),
        })
    }

    fn parse_if(&mut self) -> Result<Statement, SyntaxError> {
        let start_span = self.expect(Token::If, "IF")?;

        let condition = self.parse_expression()?;
        let then_block = self.parse_block("IF body")?;

        let else_block = if matches!(self.peek(), Some(Token::Else)) {
            self.advance();
            if matches!(self.peek(), Some(Token::If)) {
                let nested = self.parse_if()?;
                let span = nested.span();
                Some(Block { statements: vec![nested], span })
            } else {
                Some(self.parse_block("ELSE body")?)
            }
        } else {
            None
        };

        let end_span = else_block.as_ref().map(|b| b.span).unwrap_or(then_block.span);

        Ok(Statement::If {
            condition,
            then_block,
            else_block,
            span: start_span.merge(&end_span),
        })
    }

    fn parse_while(&mut self) -> Result<Statement, SyntaxError> {
        let start_span = self.expect(Token::While, "WHILE")?;
        let condition = self.parse_expression()?;
        let body = self.parse_block("WHILE body")?;
        let span = start_span.merge(&body.span);

        Ok(Statement::While { condition, body, span })
    }

    fn parse_repeat(&mut self) -> Result<Statement, SyntaxError> {
        let start_span = self.expect(Token::Repeat, "REPEAT")?;
        let count = self.parse_expression()?;
        let body = self.parse_block("REPEAT body")?;
        let span = start_span.merge(&body.span);

        Ok(Statement::Repeat { count, body, span })
    }
}
