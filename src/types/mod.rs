mod control;
mod error;
mod fact;
mod options;
mod query;
mod registry;
mod report;
mod rule;

pub use control::Control;
pub(crate) use control::{Decision, Phase};
pub use error::{EngineError, RuleError};
pub use fact::{Fact, MATCH_PATH_KEY};
pub use options::EngineOptions;
pub use query::{RuleQuery, RuleState};
pub use registry::RuleRegistry;
pub use report::ExecutionReport;
pub use rule::{Condition, Consequence, Rule, RuleBuilder};
