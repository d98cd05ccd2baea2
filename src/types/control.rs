use tracing::debug;

use super::registry::RuleRegistry;
use super::rule::Rule;

/// Where a rule asked the engine to move next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Decision {
    /// `when(false)`: go straight to the next index.
    Skip,
    Next,
    Restart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Condition,
    Consequence,
}

/// Everything a rule requested during one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct Requests {
    /// `when(true)` was called from a condition.
    pub(crate) fire: bool,
    pub(crate) decision: Option<Decision>,
    pub(crate) halted: bool,
}

/// The control API handed to a running condition or consequence.
///
/// A fresh `Control` is built for every step and bound to the rule being
/// evaluated and its index in the active list. `when(true)` takes effect as
/// soon as it is called: the rule is recorded as fired and nothing later in
/// the step can take that back. `when(false)`, `next` and `restart` replace
/// any earlier movement request made in the same step. `stop` is sticky:
/// once called, the execution finishes after this step.
pub struct Control<'a> {
    rule: &'a Rule,
    index: usize,
    phase: Phase,
    registry: &'a mut RuleRegistry,
    requests: Requests,
}

impl<'a> Control<'a> {
    pub(crate) fn new(
        rule: &'a Rule,
        index: usize,
        phase: Phase,
        registry: &'a mut RuleRegistry,
    ) -> Self {
        Self {
            rule,
            index,
            phase,
            registry,
            requests: Requests::default(),
        }
    }

    /// The rule currently being evaluated.
    #[must_use]
    pub fn current_rule(&self) -> &Rule {
        self.rule
    }

    /// The current rule's position in the active rule list.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Report the condition's outcome. `true` fires the rule's consequence,
    /// unless the rule already fired during this execution. If `stop()` is
    /// also called in this step, the rule is still recorded as fired but its
    /// consequence does not run.
    ///
    /// Only meaningful inside a condition; inside a consequence it is ignored.
    pub fn when(&mut self, outcome: bool) {
        if self.phase == Phase::Consequence {
            debug!(
                rule = %self.rule.reference(self.index),
                "when() called from a consequence; ignored"
            );
            return;
        }
        if outcome {
            self.requests.fire = true;
        } else {
            self.requests.decision = Some(Decision::Skip);
        }
    }

    /// Move on, restarting from the first rule if the working set changed.
    pub fn next(&mut self) {
        self.requests.decision = Some(Decision::Next);
    }

    /// Resume evaluation from the first active rule. Called alongside
    /// `when(true)`, the restart happens after the consequence runs.
    pub fn restart(&mut self) {
        self.requests.decision = Some(Decision::Restart);
    }

    /// Halt the execution. No further rules are evaluated.
    pub fn stop(&mut self) {
        self.requests.halted = true;
    }

    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.requests.halted
    }

    /// Read access to the rule registry.
    #[must_use]
    pub fn registry(&self) -> &RuleRegistry {
        &*self.registry
    }

    /// Mutable access to the rule registry. Changes to the active list are
    /// observed starting with the next step.
    pub fn registry_mut(&mut self) -> &mut RuleRegistry {
        &mut *self.registry
    }

    pub(crate) fn into_requests(self) -> Requests {
        self.requests
    }
}
