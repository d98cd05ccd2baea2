use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::RulechainError;

/// Engine configuration.
///
/// Deserializes from camelCase JSON; missing keys take their defaults:
///
/// ```
/// use rulechain::EngineOptions;
///
/// let opts = EngineOptions::from_json(r#"{ "ignoreFactChanges": true }"#).unwrap();
/// assert!(opts.ignore_fact_changes);
/// assert_eq!(opts.max_steps, None);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct EngineOptions {
    /// Skip mutation detection entirely. The engine then makes exactly one
    /// linear pass over the active rule list.
    pub ignore_fact_changes: bool,
    /// Abort with [`EngineError::StepBudgetExceeded`](crate::EngineError::StepBudgetExceeded)
    /// after this many scheduler steps. `None` means unbounded.
    pub max_steps: Option<usize>,
}

impl EngineOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_ignore_fact_changes(mut self, ignore: bool) -> Self {
        self.ignore_fact_changes = ignore;
        self
    }

    #[must_use]
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = Some(max_steps);
        self
    }

    /// Parse options from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`RulechainError::Config`] if the JSON is malformed or has
    /// unknown keys.
    pub fn from_json(input: &str) -> Result<Self, RulechainError> {
        Ok(serde_json::from_str(input)?)
    }

    /// Read options from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`RulechainError`] on I/O or parse failure.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RulechainError> {
        let input = std::fs::read_to_string(path)?;
        Self::from_json(&input)
    }
}
