mod engine;
mod error;
mod execute;
pub mod snapshot;
mod trampoline;
mod types;

pub use engine::Engine;
pub use error::RulechainError;
pub use types::{
    Condition, Consequence, Control, EngineError, EngineOptions, ExecutionReport, Fact, Rule,
    RuleBuilder, RuleError, RuleQuery, RuleRegistry, RuleState, MATCH_PATH_KEY,
};
