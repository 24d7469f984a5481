//! Runtime error types with source-location tracking.
//!
//! [`EvalError`] covers expression failures, [`RuntimeError`] everything that
//! can abort a rule body. Both expose `span()` so the CLI can point at the
//! offending source, e.g. "division by zero at line 12, column 5".
//!
//! [`DeviceError`] and [`SensorError`] are what facade implementations
//! return; the interpreter wraps them with the span that triggered them.

use crate::facade::Command;
use crate::value::Value;
use std::fmt;
use thermolang_syntax::ast::Sensor;
use thermolang_syntax::error::Span;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SensorError {
    OutOfRange { sensor: Sensor, value: i64 },
    Unavailable { sensor: Sensor, reason: String },
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorError::OutOfRange { sensor, value } => {
                write!(f, "{} reading {} is out of range", sensor, value)
            }
            SensorError::Unavailable { sensor, reason } => {
                write!(f, "{} unavailable: {}", sensor, reason)
            }
        }
    }
}

impl std::error::Error for SensorError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// The device refused the value.
    Rejected { reason: String },
    /// The device could not be reached.
    Unavailable { reason: String },
}

impl DeviceError {
    pub fn rejected(reason: impl Into<String>) -> Self {
        DeviceError::Rejected { reason: reason.into() }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        DeviceError::Unavailable { reason: reason.into() }
    }
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::Rejected { reason } => write!(f, "rejected: {}", reason),
            DeviceError::Unavailable { reason } => write!(f, "unavailable: {}", reason),
        }
    }
}

impl std::error::Error for DeviceError {}

/// An expression that could not be evaluated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    UndefinedVariable { name: String, span: Span },
    /// `context` names the operation, `found` the offending operand kinds.
    TypeMismatch { context: String, found: String, span: Span },
    DivisionByZero { span: Span },
    Overflow { span: Span },
    Sensor { error: SensorError, span: Span },
}

impl EvalError {
    pub fn span(&self) -> Span {
        match self {
            EvalError::UndefinedVariable { span, .. }
            | EvalError::TypeMismatch { span, .. }
            | EvalError::DivisionByZero { span }
            | EvalError::Overflow { span }
            | EvalError::Sensor { span, .. } => *span,
        }
    }

    pub(crate) fn mismatch(context: impl Into<String>, found: impl Into<String>, span: Span) -> Self {
        EvalError::TypeMismatch {
            context: context.into(),
            found: found.into(),
            span,
        }
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::UndefinedVariable { name, span } => {
                write!(f, "undefined variable '{}' at {}", name, span)
            }
            EvalError::TypeMismatch { context, found, span } => {
                write!(f, "type mismatch in {}: found {} at {}", context, found, span)
            }
            EvalError::DivisionByZero { span } => write!(f, "division by zero at {}", span),
            EvalError::Overflow { span } => write!(f, "integer overflow at {}", span),
            EvalError::Sensor { error, span } => write!(f, "{} at {}", error, span),
        }
    }
}

impl std::error::Error for EvalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EvalError::Sensor { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Anything that aborts a rule body for the current pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    Eval(EvalError),
    InvalidRepeatCount { count: Value, span: Span },
    InvalidWait { seconds: Value, span: Span },
    Device { command: Command, error: DeviceError, span: Span },
    StepLimit { limit: u64, span: Span },
}

impl RuntimeError {
    pub fn span(&self) -> Span {
        match self {
            RuntimeError::Eval(e) => e.span(),
            RuntimeError::InvalidRepeatCount { span, .. }
            | RuntimeError::InvalidWait { span, .. }
            | RuntimeError::Device { span, .. }
            | RuntimeError::StepLimit { span, .. } => *span,
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::Eval(e) => write!(f, "{}", e),
            RuntimeError::InvalidRepeatCount { count, span } => write!(
                f,
                "REPEAT count must be a non-negative Integer, got {} at {}",
                count, span
            ),
            RuntimeError::InvalidWait { seconds, span } => write!(
                f,
                "WAIT duration must be a non-negative Integer, got {} at {}",
                seconds, span
            ),
            RuntimeError::Device { command, error, span } => {
                write!(f, "device {} for SET {} at {}", error, command, span)
            }
            RuntimeError::StepLimit { limit, span } => {
                write!(f, "step limit of {} exceeded at {}", limit, span)
            }
        }
    }
}

impl std::error::Error for RuntimeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RuntimeError::Eval(e) => Some(e),
            RuntimeError::Device { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl From<EvalError> for RuntimeError {
    fn from(err: EvalError) -> Self {
        RuntimeError::Eval(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eval_error_display_includes_position() {
        let err = EvalError::UndefinedVariable {
            name: "target".to_string(),
            span: Span::new(2, 9, 14, 20),
        };
        assert_eq!(err.to_string(), "undefined variable 'target' at line 2, column 9");
        assert_eq!(err.span().line, 2);
    }

    #[test]
    fn runtime_error_wraps_eval_error() {
        let span = Span::new(1, 12, 11, 16);
        let err: RuntimeError = EvalError::DivisionByZero { span }.into();
        assert_eq!(err.span(), span);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn device_error_display_names_command() {
        let err = RuntimeError::Device {
            command: Command::Temp(60),
            error: DeviceError::rejected("setpoint 60 outside 0..=50"),
            span: Span::new(3, 5, 30, 43),
        };
        assert_eq!(
            err.to_string(),
            "device rejected: setpoint 60 outside 0..=50 for SET TEMP = 60 at line 3, column 5"
        );
    }

    #[test]
    fn sensor_error_display() {
        let err = SensorError::OutOfRange { sensor: Sensor::Humidity, value: 140 };
        assert_eq!(err.to_string(), "HUMIDITY reading 140 is out of range");
    }
}
