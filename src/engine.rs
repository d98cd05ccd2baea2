use std::fmt;
use std::time::Instant;

use tracing::instrument;

use crate::execute::{Execution, Outcome};
use crate::{
    EngineError, EngineOptions, ExecutionReport, Fact, Rule, RuleQuery, RuleRegistry, RuleState,
};

/// A forward-chaining rule engine.
///
/// Owns a [`RuleRegistry`] and runs its active rules against a working set
/// of [`Fact`]s until no rule fires, or until a rule calls
/// [`stop()`](crate::Control::stop). When a consequence changes the working
/// set, evaluation starts over from the first active rule. A rule fires at
/// most once per execution.
///
/// # Example
///
/// ```
/// use rulechain::{Engine, Fact, Rule};
/// use serde_json::json;
///
/// let mut engine = Engine::new();
/// engine.register(
///     Rule::new(|r, _| r.when(true), |_, facts| {
///         for fact in facts.iter_mut() {
///             fact.insert("flag", true);
///         }
///     })
///     .with_priority(2),
/// );
/// engine.register(
///     Rule::new(
///         |r, facts| r.when(facts.iter().all(|f| f.get("flag") == Some(&json!(true)))),
///         |_, facts| {
///             for fact in facts.iter_mut() {
///                 fact.insert("done", true);
///             }
///         },
///     )
///     .with_priority(1),
/// );
///
/// let out = engine.run(&[Fact::new().set("flag", false)]).unwrap();
/// assert_eq!(out[0].get("done"), Some(&json!(true)));
/// assert_eq!(out[0].match_path(), Some(vec!["index_0", "index_1"]));
/// ```
#[derive(Debug, Default)]
pub struct Engine {
    registry: RuleRegistry,
    options: EngineOptions,
}

impl Engine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_options(options: EngineOptions) -> Self {
        Self {
            registry: RuleRegistry::new(),
            options,
        }
    }

    #[must_use]
    pub fn options(&self) -> EngineOptions {
        self.options
    }

    #[must_use]
    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut RuleRegistry {
        &mut self.registry
    }

    /// See [`RuleRegistry::register`].
    pub fn register(&mut self, rule: Rule) {
        self.registry.register(rule);
    }

    /// See [`RuleRegistry::register_all`].
    pub fn register_all(&mut self, rules: impl IntoIterator<Item = Rule>) {
        self.registry.register_all(rules);
    }

    /// See [`RuleRegistry::set_enabled`].
    pub fn set_enabled(&mut self, state: impl Into<RuleState>, query: Option<&RuleQuery>) {
        self.registry.set_enabled(state, query);
    }

    /// See [`RuleRegistry::set_priority`].
    pub fn set_priority(&mut self, priority: i64, query: Option<&RuleQuery>) {
        self.registry.set_priority(priority, query);
    }

    /// See [`RuleRegistry::find_matching`].
    #[must_use]
    pub fn find_matching(&self, query: Option<&RuleQuery>) -> Vec<&Rule> {
        self.registry.find_matching(query)
    }

    /// Run the active rules against a deep copy of `facts` and hand the
    /// annotated result to `on_complete`.
    ///
    /// `on_complete` is called exactly once if the execution finishes. It is
    /// not called on failure.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Stalled`] if a condition returns without
    /// calling `when`, `next`, `restart` or `stop`, and
    /// [`EngineError::StepBudgetExceeded`] if a configured step budget runs out.
    pub fn execute<F>(&mut self, facts: &[Fact], on_complete: F) -> Result<(), EngineError>
    where
        F: FnOnce(Vec<Fact>),
    {
        let outcome = self.execute_inner(facts)?;
        on_complete(outcome.facts);
        Ok(())
    }

    /// Like [`execute`](Self::execute), returning the annotated facts.
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub fn run(&mut self, facts: &[Fact]) -> Result<Vec<Fact>, EngineError> {
        Ok(self.execute_inner(facts)?.facts)
    }

    /// Run a single fact as a batch of one.
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub fn run_one(&mut self, fact: &Fact) -> Result<Fact, EngineError> {
        let facts = self.run(std::slice::from_ref(fact))?;
        // Consequences get a slice, so the batch size never changes.
        Ok(facts.into_iter().next().unwrap_or_default())
    }

    /// Run with diagnostics.
    ///
    /// # Errors
    ///
    /// See [`execute`](Self::execute).
    pub fn run_detailed(&mut self, facts: &[Fact]) -> Result<ExecutionReport, EngineError> {
        let start = Instant::now();
        let outcome = self.execute_inner(facts)?;
        Ok(ExecutionReport::new(
            outcome.facts,
            outcome.match_path,
            outcome.restarts,
            outcome.steps,
            outcome.halted,
            start.elapsed(),
        ))
    }

    #[instrument(level = "debug", skip_all, fields(facts = facts.len(), rules = self.registry.active_len()))]
    fn execute_inner(&mut self, facts: &[Fact]) -> Result<Outcome, EngineError> {
        Execution::new(&mut self.registry, self.options, facts).run()
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Engine({}", self.registry)?;
        if self.options.ignore_fact_changes {
            write!(f, ", ignoring fact changes")?;
        }
        write!(f, ")")
    }
}
