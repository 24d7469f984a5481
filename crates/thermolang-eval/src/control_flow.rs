use std::time::Duration;
use thermolang_syntax::ast::{Block, Expression, Statement};
use thermolang_syntax::error::Span;

/// The result of advancing the top frame by one unit of work.
///
/// Returned by the interpreter's inner step to tell the driving loop
/// whether to keep going or hand control back to the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionResult {
    /// Keep executing the current rule.
    Continue,
    /// A `WAIT` was reached; resume after the duration elapses.
    Suspend(Duration),
}

/// One level of the saved continuation of a rule body.
///
/// Frames borrow the program, so a suspended rule resumes exactly where it
/// left off without copying any of the tree.
#[derive(Debug, Clone)]
pub enum Frame<'p> {
    /// Statements of a block; `next` is the index of the one to run next.
    Block { statements: &'p [Statement], next: usize },
    /// A `WHILE` loop; its condition is re-evaluated whenever this frame is
    /// on top of the stack.
    While { condition: &'p Expression, body: &'p Block, span: Span },
    /// A `REPEAT` loop with its remaining iterations.
    Repeat { body: &'p Block, remaining: u64 },
}

impl<'p> Frame<'p> {
    pub fn block(block: &'p Block) -> Self {
        Frame::Block { statements: &block.statements, next: 0 }
    }
}
