use thiserror::Error;

use crate::lang::symbols::Id;

/// Failures while executing IR. Analyzed programs only ever hit
/// `DivisionByZero`, `StepLimitExceeded` and `Output`; the rest guard
/// against hand-built or corrupted code.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("runtime error: unknown variable id {0}")]
    UnknownVariable(Id),

    #[error("runtime error: unknown label id {0}")]
    UnknownLabel(Id),

    #[error("runtime error: division by zero")]
    DivisionByZero,

    #[error("runtime error: program ran past the last instruction without END")]
    MissingEnd,

    #[error("runtime error: execution step limit exceeded ({0})")]
    StepLimitExceeded(u64),

    #[error("runtime error: pooled literal '{0}' does not hold an integer")]
    MalformedLiteral(String),

    #[error("runtime error: cannot write output: {0}")]
    Output(#[from] std::io::Error),
}
