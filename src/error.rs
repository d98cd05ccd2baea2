use thiserror::Error;

use crate::{EngineError, RuleError};

/// Unified error type covering rule construction, execution, and
/// configuration loading.
///
/// Returned by convenience methods like
/// [`EngineOptions::from_file()`](crate::EngineOptions::from_file).
#[derive(Debug, Error)]
pub enum RulechainError {
    #[error(transparent)]
    Rule(#[from] RuleError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("invalid engine configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
