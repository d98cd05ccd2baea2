use thiserror::Error;

/// Errors raised while building a [`Rule`](super::Rule).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuleError {
    #[error("rule '{rule}' has no condition; call .when() before building")]
    MissingCondition { rule: String },

    #[error("rule '{rule}' has no consequence; call .then() before building")]
    MissingConsequence { rule: String },
}

/// Faults that terminate an execution.
///
/// These are never delivered through the completion callback.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("rule '{rule}' at index {index} returned without a decision; engine stalled")]
    Stalled { rule: String, index: usize },

    #[error("step budget of {budget} exhausted before execution finished")]
    StepBudgetExceeded { budget: usize },

    #[error("fact must be a JSON object, found {found}")]
    NotAnObject { found: &'static str },
}
