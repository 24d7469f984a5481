//! Canonical source rendering of a parsed [`Program`].
//!
//! The output parses back to a structurally identical tree, which is what
//! `thermolang fmt` relies on. Parentheses are emitted only where operator
//! precedence or left-associativity requires them.

use crate::ast::*;
use std::fmt::{self, Write};

const INDENT: &str = "    ";

/// Renders a program as thermolang source.
pub fn print(program: &Program) -> String {
    program.to_string()
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, rule) in self.rules.iter().enumerate() {
            if i > 0 && !(rule.is_implicit() && self.rules[i - 1].is_implicit()) {
                f.write_char('\n')?;
            }
            write_rule(f, rule)?;
        }
        Ok(())
    }
}

fn write_rule(f: &mut fmt::Formatter<'_>, rule: &Rule) -> fmt::Result {
    match &rule.trigger {
        Trigger::Always => {
            for statement in &rule.body.statements {
                write_statement(f, statement, 0)?;
            }
            Ok(())
        }
        Trigger::When(condition) => {
            f.write_str("RULE ")?;
            if let Some(name) = &rule.name {
                write!(f, "{}: ", name)?;
            }
            write!(f, "{} ", ExprDisplay(condition))?;
            write_block(f, &rule.body, 0)?;
            f.write_char('\n')
        }
    }
}

fn write_block(f: &mut fmt::Formatter<'_>, block: &Block, depth: usize) -> fmt::Result {
    if block.statements.is_empty() {
        return f.write_str("{}");
    }
    f.write_str("{\n")?;
    for statement in &block.statements {
        write_statement(f, statement, depth + 1)?;
    }
    write!(f, "{}}}", INDENT.repeat(depth))
}

fn write_statement(f: &mut fmt::Formatter<'_>, statement: &Statement, depth: usize) -> fmt::Result {
    f.write_str(&INDENT.repeat(depth))?;
    match statement {
        Statement::Set { command, .. } => match command {
            SetCommand::Temp(value) => write!(f, "SET TEMP = {}", ExprDisplay(value))?,
            SetCommand::Mode(mode) => write!(f, "SET MODE = {}", mode)?,
            SetCommand::Fan(speed) => write!(f, "SET FAN = {}", speed)?,
            SetCommand::Swing(swing) => write!(f, "SET SWING = {}", swing)?,
            SetCommand::Power(power) => write!(f, "SET POWER = {}", power)?,
            SetCommand::Variable { name, value } => {
                write!(f, "SET {} = {}", name, ExprDisplay(value))?
            }
        },
        Statement::Wait { seconds, .. } => write!(f, "WAIT {} SECONDS", ExprDisplay(seconds))?,
        Statement::If { condition, then_block, else_block, .. } => {
            write!(f, "IF {} ", ExprDisplay(condition))?;
            write_block(f, then_block, depth)?;
            if let Some(else_block) = else_block {
                f.write_str(" ELSE ")?;
                write_block(f, else_block, depth)?;
            }
        }
        Statement::While { condition, body, .. } => {
            write!(f, "WHILE {} ", ExprDisplay(condition))?;
            write_block(f, body, depth)?;
        }
        Statement::Repeat { count, body, .. } => {
            write!(f, "REPEAT {} ", ExprDisplay(count))?;
            write_block(f, body, depth)?;
        }
        Statement::Block(block) => write_block(f, block, depth)?,
    }
    f.write_char('\n')
}

struct ExprDisplay<'a>(&'a Expression);

impl fmt::Display for ExprDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_expr(f, self.0)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_expr(f, self)
    }
}

fn write_expr(f: &mut fmt::Formatter<'_>, expr: &Expression) -> fmt::Result {
    match expr {
        Expression::Integer(n, _) => write!(f, "{}", n),
        Expression::Text(s, _) => write!(f, "\"{}\"", s),
        Expression::Variable(name, _) => f.write_str(name),
        Expression::Sensor(sensor, _) => write!(f, "{}", sensor),
        Expression::Negate { expr, .. } => {
            f.write_char('-')?;
            if matches!(**expr, Expression::Binary { .. }) {
                write_parenthesized(f, expr)
            } else {
                write_expr(f, expr)
            }
        }
        Expression::Binary { left, op, right, .. } => {
            write_operand(f, left, op.precedence(), false)?;
            write!(f, " {} ", op)?;
            write_operand(f, right, op.precedence(), true)
        }
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, operand: &Expression, parent: u8, is_right: bool) -> fmt::Result {
    let needs_parens = match operand {
        Expression::Binary { op, .. } => {
            op.precedence() < parent || (is_right && op.precedence() == parent)
        }
        _ => false,
    };
    if needs_parens {
        write_parenthesized(f, operand)
    } else {
        write_expr(f, operand)
    }
}

fn write_parenthesized(f: &mut fmt::Formatter<'_>, expr: &Expression) -> fmt::Result {
    f.write_char('(')?;
    write_expr(f, expr)?;
    f.write_char(')')
}

#[cfg(test)]
mod tests {
    use crate::parser::parse_source;

    fn reformat(source: &str) -> String {
        super::print(&parse_source(source).unwrap())
    }

    #[test]
    fn test_prints_rule_with_block() {
        let out = reformat("rule humidity > 60 { set fan = high }");
        assert_eq!(out, "RULE HUMIDITY GT 60 {\n    SET FAN = HIGH\n}\n");
    }

    #[test]
    fn test_keeps_needed_parentheses_only() {
        let out = reformat("SET TEMP = (3 + 4) * 2 - (1 - 1) + (2 * 3)");
        assert_eq!(out, "SET TEMP = (3 + 4) * 2 - (1 - 1) + 2 * 3\n");
    }

    #[test]
    fn test_negation_of_compound_operand() {
        let out = reformat("SET x = -(2 + 3) * -y");
        assert_eq!(out, "SET x = -(2 + 3) * -y\n");
    }

    #[test]
    fn test_else_if_prints_as_nested_block() {
        let out = reformat("IF x { SET FAN = LOW } ELSE IF y { SET FAN = MID }");
        assert_eq!(
            out,
            "IF x {\n    SET FAN = LOW\n} ELSE {\n    IF y {\n        SET FAN = MID\n    }\n}\n"
        );
    }

    #[test]
    fn test_named_rule_and_wait() {
        let out = reformat("RULE warmup: OCCUPIED EQ 1 { WAIT 5 * 60 SECONDS }");
        assert_eq!(out, "RULE warmup: OCCUPIED EQ 1 {\n    WAIT 5 * 60 SECONDS\n}\n");
    }

    #[test]
    fn test_blank_line_between_rules() {
        let out = reformat("SET POWER = ON SET MODE = COOL RULE 1 {} RULE 0 {}");
        assert_eq!(out, "SET POWER = ON\nSET MODE = COOL\n\nRULE 1 {}\n\nRULE 0 {}\n");
    }
}
