use super::Interpreter;
use crate::control_flow::{ExecutionResult, Frame};
use crate::error::{EvalError, RuntimeError};
use crate::evaluator::Evaluator;
use crate::facade::{Command, Device, Sensors};
use crate::value::Value;
use std::time::Duration;
use thermolang_syntax::ast::{Expression, SetCommand, Statement};
use thermolang_syntax::error::Span;
use tracing::{info, trace};

impl<'p, D: Device, S: Sensors> Interpreter<'p, D, S> {
    /// Advances the top frame by one statement or one loop iteration.
    pub(super) fn advance(&mut self) -> Result<ExecutionResult, RuntimeError> {
        let Some(frame) = self.frames.last_mut() else {
            return Ok(ExecutionResult::Continue);
        };

        match frame {
            Frame::Block { statements, next } => {
                let statements: &'p [Statement] = *statements;
                let Some(statement) = statements.get(*next) else {
                    self.frames.pop();
                    return Ok(ExecutionResult::Continue);
                };
                *next += 1;
                self.execute(statement)
            }
            Frame::While { condition, body, span } => {
                let (condition, body, span) = (*condition, *body, *span);
                self.tick(span)?;
                if self.condition(condition)? {
                    self.frames.push(Frame::block(body));
                } else {
                    self.frames.pop();
                }
                Ok(ExecutionResult::Continue)
            }
            Frame::Repeat { body, remaining } => {
                if *remaining == 0 {
                    self.frames.pop();
                    return Ok(ExecutionResult::Continue);
                }
                *remaining -= 1;
                let body = *body;
                self.frames.push(Frame::block(body));
                Ok(ExecutionResult::Continue)
            }
        }
    }

    fn execute(&mut self, statement: &'p Statement) -> Result<ExecutionResult, RuntimeError> {
        self.tick(statement.span())?;

        match statement {
            Statement::Set { command, span } => self.execute_set(command, *span),

            Statement::Wait { seconds, span } => match self.evaluate(seconds)? {
                Value::Integer(n) if n >= 0 => {
                    trace!(seconds = n, "suspending on WAIT");
                    Ok(ExecutionResult::Suspend(Duration::from_secs(n.unsigned_abs())))
                }
                other => Err(RuntimeError::InvalidWait { seconds: other, span: *span }),
            },

            Statement::If { condition, then_block, else_block, .. } => {
                if self.condition(condition)? {
                    self.frames.push(Frame::block(then_block));
                } else if let Some(else_block) = else_block {
                    self.frames.push(Frame::block(else_block));
                }
                Ok(ExecutionResult::Continue)
            }

            Statement::While { condition, body, span } => {
                self.frames.push(Frame::While { condition, body, span: *span });
                Ok(ExecutionResult::Continue)
            }

            Statement::Repeat { count, body, span } => match self.evaluate(count)? {
                Value::Integer(n) if n >= 0 => {
                    self.frames.push(Frame::Repeat { body, remaining: n.unsigned_abs() });
                    Ok(ExecutionResult::Continue)
                }
                other => Err(RuntimeError::InvalidRepeatCount { count: other, span: *span }),
            },

            Statement::Block(block) => {
                self.frames.push(Frame::block(block));
                Ok(ExecutionResult::Continue)
            }
        }
    }

    fn execute_set(&mut self, command: &SetCommand, span: Span) -> Result<ExecutionResult, RuntimeError> {
        let command = match command {
            SetCommand::Variable { name, value } => {
                let value = self.evaluate(value)?;
                trace!(variable = %name, value = %value, "variable bound");
                self.env.set(name.as_str(), value);
                return Ok(ExecutionResult::Continue);
            }
            SetCommand::Temp(expr) => {
                let setpoint = Evaluator::new(&self.env, &mut self.sensors)
                    .evaluate_integer(expr, "SET TEMP")?;
                Command::Temp(setpoint)
            }
            SetCommand::Mode(mode) => Command::Mode(*mode),
            SetCommand::Fan(speed) => Command::Fan(*speed),
            SetCommand::Swing(swing) => Command::Swing(*swing),
            SetCommand::Power(power) => Command::Power(*power),
        };

        self.device
            .apply(command)
            .map_err(|error| RuntimeError::Device { command, error, span })?;
        self.state.apply(command);
        info!(command = %command, "device command applied");

        Ok(ExecutionResult::Continue)
    }

    fn evaluate(&mut self, expr: &Expression) -> Result<Value, EvalError> {
        Evaluator::new(&self.env, &mut self.sensors).evaluate(expr)
    }

    fn condition(&mut self, expr: &Expression) -> Result<bool, EvalError> {
        Evaluator::new(&self.env, &mut self.sensors).evaluate_condition(expr)
    }

    /// Counts one unit of work against the step limit.
    fn tick(&mut self, span: Span) -> Result<(), RuntimeError> {
        self.steps += 1;
        match self.max_steps {
            Some(limit) if self.steps > limit => Err(RuntimeError::StepLimit { limit, span }),
            _ => Ok(()),
        }
    }
}
