use crate::error::EvalError;
use crate::value::Value;
use std::cmp::Ordering;
use thermolang_syntax::ast::BinaryOp;
use thermolang_syntax::error::Span;

pub fn eval_binary_op(left: &Value, op: BinaryOp, right: &Value, span: Span) -> Result<Value, EvalError> {
    match op {
        BinaryOp::Add => arithmetic(left, op, right, span, i64::checked_add),
        BinaryOp::Sub => arithmetic(left, op, right, span, i64::checked_sub),
        BinaryOp::Mul => arithmetic(left, op, right, span, i64::checked_mul),
        BinaryOp::Div => eval_div(left, right, span),
        BinaryOp::Eq => compare(left, op, right, span, |o| o == Ordering::Equal),
        BinaryOp::Ne => compare(left, op, right, span, |o| o != Ordering::Equal),
        BinaryOp::Lt => compare(left, op, right, span, |o| o == Ordering::Less),
        BinaryOp::Le => compare(left, op, right, span, |o| o != Ordering::Greater),
        BinaryOp::Gt => compare(left, op, right, span, |o| o == Ordering::Greater),
        BinaryOp::Ge => compare(left, op, right, span, |o| o != Ordering::Less),
    }
}

pub fn eval_negate(value: &Value, span: Span) -> Result<Value, EvalError> {
    match value {
        Value::Integer(n) => n
            .checked_neg()
            .map(Value::Integer)
            .ok_or(EvalError::Overflow { span }),
        Value::Text(_) => Err(EvalError::mismatch("unary '-'", "Text", span)),
    }
}

fn integers(left: &Value, op: BinaryOp, right: &Value, span: Span) -> Result<(i64, i64), EvalError> {
    match (left, right) {
        (Value::Integer(l), Value::Integer(r)) => Ok((*l, *r)),
        _ => Err(EvalError::mismatch(
            format!("'{}'", op),
            format!("{} and {}", left.type_name(), right.type_name()),
            span,
        )),
    }
}

fn arithmetic(
    left: &Value,
    op: BinaryOp,
    right: &Value,
    span: Span,
    apply: fn(i64, i64) -> Option<i64>,
) -> Result<Value, EvalError> {
    let (l, r) = integers(left, op, right, span)?;
    apply(l, r).map(Value::Integer).ok_or(EvalError::Overflow { span })
}

/// Floor division: the quotient rounds toward negative infinity.
fn eval_div(left: &Value, right: &Value, span: Span) -> Result<Value, EvalError> {
    let (l, r) = integers(left, BinaryOp::Div, right, span)?;
    if r == 0 {
        return Err(EvalError::DivisionByZero { span });
    }
    let q = l.checked_div(r).ok_or(EvalError::Overflow { span })?;
    let floored = if l % r != 0 && ((l < 0) != (r < 0)) { q - 1 } else { q };
    Ok(Value::Integer(floored))
}

fn compare(
    left: &Value,
    op: BinaryOp,
    right: &Value,
    span: Span,
    test: fn(Ordering) -> bool,
) -> Result<Value, EvalError> {
    let ordering = match (left, right) {
        (Value::Integer(l), Value::Integer(r)) => l.cmp(r),
        (Value::Text(l), Value::Text(r)) => l.cmp(r),
        _ => {
            return Err(EvalError::mismatch(
                format!("'{}'", op),
                format!("{} and {}", left.type_name(), right.type_name()),
                span,
            ));
        }
    };
    Ok(Value::from_bool(test(ordering)))
}
