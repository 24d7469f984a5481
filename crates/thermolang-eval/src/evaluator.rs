//! Expression evaluation.
//!
//! Sensor names resolve through the [`Sensors`] facade on every read and
//! take precedence over user bindings; anything else is looked up in the
//! [`Environment`].

use crate::binary_ops::{eval_binary_op, eval_negate};
use crate::environment::Environment;
use crate::error::EvalError;
use crate::facade::{Sensors, check_reading};
use crate::value::Value;
use thermolang_syntax::ast::{Expression, Sensor};
use thermolang_syntax::error::Span;

pub struct Evaluator<'a, S: Sensors + ?Sized> {
    env: &'a Environment,
    sensors: &'a mut S,
}

impl<'a, S: Sensors + ?Sized> Evaluator<'a, S> {
    pub fn new(env: &'a Environment, sensors: &'a mut S) -> Self {
        Self { env, sensors }
    }

    pub fn evaluate(&mut self, expr: &Expression) -> Result<Value, EvalError> {
        match expr {
            Expression::Integer(n, _) => Ok(Value::Integer(*n)),
            Expression::Text(s, _) => Ok(Value::Text(s.clone())),
            Expression::Sensor(sensor, span) => self.read_sensor(*sensor, *span),
            Expression::Variable(name, span) => {
                self.env
                    .get(name)
                    .cloned()
                    .ok_or_else(|| EvalError::UndefinedVariable {
                        name: name.clone(),
                        span: *span,
                    })
            }
            Expression::Negate { expr, span } => {
                let value = self.evaluate(expr)?;
                eval_negate(&value, *span)
            }
            Expression::Binary { left, op, right, span } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                eval_binary_op(&left, *op, &right, *span)
            }
        }
    }

    /// Evaluates a condition. Only integers have a truth value.
    pub fn evaluate_condition(&mut self, expr: &Expression) -> Result<bool, EvalError> {
        let value = self.evaluate(expr)?;
        value
            .truthiness()
            .ok_or_else(|| EvalError::mismatch("condition", value.type_name(), *expr.span()))
    }

    /// Evaluates an expression that must produce an integer.
    pub fn evaluate_integer(&mut self, expr: &Expression, context: &str) -> Result<i64, EvalError> {
        let value = self.evaluate(expr)?;
        value
            .as_integer()
            .ok_or_else(|| EvalError::mismatch(context, value.type_name(), *expr.span()))
    }

    fn read_sensor(&mut self, sensor: Sensor, span: Span) -> Result<Value, EvalError> {
        self.sensors
            .read(sensor)
            .and_then(|raw| check_reading(sensor, raw))
            .map(Value::Integer)
            .map_err(|error| EvalError::Sensor { error, span })
    }
}

/// One-shot evaluation of `expr`.
pub fn evaluate<S: Sensors + ?Sized>(
    expr: &Expression,
    env: &Environment,
    sensors: &mut S,
) -> Result<Value, EvalError> {
    Evaluator::new(env, sensors).evaluate(expr)
}
