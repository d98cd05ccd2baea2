//! The execution state machine.
//!
//! One execution walks the active rule list against a deep-cloned session:
//!
//! ```text
//! Evaluate(i) ── condition ──┬─ when(true), new ref ──> Fire(i) ── consequence ──> Next(i)
//!      ^                     │    (recorded at once)      └─ restart() ──> Restart
//!      │                     ├─ when(true), seen ref ─┐
//!      │                     ├─ when(false) ──────────┴─> Evaluate(i + 1)
//!      │                     ├─ next() ──> Next(i)
//!      │                     └─ restart() ──> Restart
//!      │
//! Next(i): session != last stable ──> re-baseline, Restart ──> Evaluate(0)
//!          otherwise ──> Evaluate(i + 1)
//!
//! stop() from anywhere ──> Finish, keeping a match the same step recorded.
//! Evaluate(i) past the end ──> Finish.
//! ```
//!
//! Every arrow is a separate trampoline step. The active list is re-read at
//! each `Evaluate`, so registry changes made by a consequence are observed
//! without restarting.

use tracing::{debug, trace, warn};

use crate::snapshot::{deep_clone, Snapshot};
use crate::trampoline::Trampoline;
use crate::types::{Control, Decision, Phase};
use crate::{EngineError, EngineOptions, Fact, RuleRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Evaluate(usize),
    /// `slot` pins the rule that matched, independent of later registry
    /// changes. `restart` carries a `restart()` the condition asked for.
    Fire {
        index: usize,
        slot: usize,
        restart: bool,
    },
    Next(usize),
    Restart,
    Finish,
}

/// Final state of a completed execution.
#[derive(Debug)]
pub(crate) struct Outcome {
    pub(crate) facts: Vec<Fact>,
    pub(crate) match_path: Vec<String>,
    pub(crate) restarts: usize,
    pub(crate) steps: usize,
    pub(crate) halted: bool,
}

pub(crate) struct Execution<'r> {
    registry: &'r mut RuleRegistry,
    ignore_fact_changes: bool,
    session: Vec<Fact>,
    last_stable: Snapshot,
    match_path: Vec<String>,
    halted: bool,
    restarts: usize,
    trampoline: Trampoline<Step>,
    stalled_at: Option<(String, usize)>,
}

impl<'r> Execution<'r> {
    pub(crate) fn new(
        registry: &'r mut RuleRegistry,
        options: EngineOptions,
        facts: &[Fact],
    ) -> Self {
        let session = deep_clone(facts);
        let last_stable = Snapshot::capture(&session);
        Self {
            registry,
            ignore_fact_changes: options.ignore_fact_changes,
            session,
            last_stable,
            match_path: Vec::new(),
            halted: false,
            restarts: 0,
            trampoline: Trampoline::new(options.max_steps),
            stalled_at: None,
        }
    }

    /// Drive the state machine until it finishes, stalls, or runs out of
    /// step budget.
    pub(crate) fn run(mut self) -> Result<Outcome, EngineError> {
        self.trampoline.schedule(Step::Evaluate(0));
        while let Some(step) = self.trampoline.tick()? {
            trace!(?step, "step");
            match step {
                Step::Evaluate(index) => self.evaluate(index),
                Step::Fire {
                    index,
                    slot,
                    restart,
                } => self.fire(index, slot, restart),
                Step::Next(index) => self.next(index),
                Step::Restart => self.restart(),
                Step::Finish => return Ok(self.finish()),
            }
        }
        // The queue drained before `Finish`: a condition made no decision.
        let (rule, index) = self.stalled_at.take().unwrap_or_default();
        warn!(%rule, index, "rule made no decision; execution stalled");
        Err(EngineError::Stalled { rule, index })
    }

    fn evaluate(&mut self, index: usize) {
        let Some(slot) = self.registry.active_slot(index) else {
            self.trampoline.schedule(Step::Finish);
            return;
        };
        let Some(rule) = self.registry.rule_at(slot).cloned() else {
            self.trampoline.schedule(Step::Finish);
            return;
        };

        let mut control = Control::new(&rule, index, Phase::Condition, self.registry);
        rule.condition.evaluate(&mut control, &self.session);
        let requests = control.into_requests();
        let reference = rule.reference(index);

        // A match is recorded before anything else in the step is honored,
        // so a `stop()` after `when(true)` still leaves the rule fired.
        let fired = requests.fire && !self.match_path.contains(&reference);
        if fired {
            debug!(rule = %reference, index, "rule fired");
            self.registry.record_fired(slot, &reference);
            self.match_path.push(reference.clone());
        } else if requests.fire {
            trace!(rule = %reference, index, "already fired; skipping");
        }

        if requests.halted {
            self.halt(&reference);
            return;
        }

        if fired {
            let restart = requests.decision == Some(Decision::Restart);
            self.trampoline.schedule(Step::Fire { index, slot, restart });
            return;
        }
        // An already-fired match advances like `when(false)`. A `restart()`
        // paired with it belongs to the firing and is dropped.
        if requests.fire {
            self.trampoline.schedule(Step::Evaluate(index + 1));
            return;
        }

        match requests.decision {
            Some(Decision::Skip) => self.trampoline.schedule(Step::Evaluate(index + 1)),
            Some(Decision::Next) => self.trampoline.schedule(Step::Next(index)),
            Some(Decision::Restart) => self.trampoline.schedule(Step::Restart),
            None => self.stalled_at = Some((reference, index)),
        }
    }

    fn fire(&mut self, index: usize, slot: usize, restart: bool) {
        let Some(rule) = self.registry.rule_at(slot).cloned() else {
            self.trampoline.schedule(Step::Next(index));
            return;
        };

        let mut control = Control::new(&rule, index, Phase::Consequence, self.registry);
        rule.consequence.apply(&mut control, &mut self.session);
        let requests = control.into_requests();

        if requests.halted {
            self.halt(&rule.reference(index));
            return;
        }

        if restart || requests.decision == Some(Decision::Restart) {
            self.trampoline.schedule(Step::Restart);
        } else {
            self.trampoline.schedule(Step::Next(index));
        }
    }

    /// Mutation check: if the session changed since the last stable
    /// snapshot, re-baseline and restart from the top; otherwise advance.
    fn next(&mut self, index: usize) {
        if !self.ignore_fact_changes && self.last_stable.differs(&self.session) {
            debug!(index, "working set changed; restarting");
            self.last_stable.refresh(&self.session);
            self.trampoline.schedule(Step::Restart);
        } else {
            self.trampoline.schedule(Step::Evaluate(index + 1));
        }
    }

    /// Restarts leave the snapshot alone; only `next` re-baselines it.
    fn restart(&mut self) {
        self.restarts += 1;
        self.trampoline.schedule(Step::Evaluate(0));
    }

    fn halt(&mut self, reference: &str) {
        debug!(rule = %reference, "execution halted");
        self.halted = true;
        self.trampoline.schedule(Step::Finish);
    }

    fn finish(mut self) -> Outcome {
        for fact in &mut self.session {
            fact.set_match_path(&self.match_path);
        }
        debug!(
            fired = self.match_path.len(),
            restarts = self.restarts,
            steps = self.trampoline.steps(),
            halted = self.halted,
            "execution finished"
        );
        Outcome {
            facts: self.session,
            match_path: self.match_path,
            restarts: self.restarts,
            steps: self.trampoline.steps(),
            halted: self.halted,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::Rule;

    fn run(registry: &mut RuleRegistry, options: EngineOptions, facts: &[Fact]) -> Outcome {
        Execution::new(registry, options, facts).run().unwrap()
    }

    #[test]
    fn empty_registry_finishes_immediately() {
        let mut registry = RuleRegistry::new();
        let out = run(&mut registry, EngineOptions::default(), &[Fact::new()]);
        assert!(out.match_path.is_empty());
        assert_eq!(out.facts[0].match_path(), Some(vec![]));
        assert_eq!(out.steps, 2);
    }

    #[test]
    fn session_is_a_copy() {
        let mut registry = RuleRegistry::new();
        registry.register(Rule::new(
            |r, _| r.when(true),
            |_, facts| facts[0].insert("x", 2),
        ));
        let input = vec![Fact::new().set("x", 1)];
        let out = run(&mut registry, EngineOptions::default(), &input);
        assert_eq!(input[0].get("x"), Some(&json!(1)));
        assert_eq!(out.facts[0].get("x"), Some(&json!(2)));
    }

    #[test]
    fn mutation_restarts_and_counts() {
        let mut registry = RuleRegistry::new();
        registry.register(Rule::new(
            |r, _| r.when(true),
            |_, facts| facts[0].insert("touched", true),
        ));
        let out = run(&mut registry, EngineOptions::default(), &[Fact::new()]);
        assert_eq!(out.match_path, ["index_0"]);
        assert_eq!(out.restarts, 1);
    }

    #[test]
    fn stop_after_match_records_rule_but_skips_consequence() {
        let mut registry = RuleRegistry::new();
        registry.register(
            Rule::new(
                |r, _| {
                    r.when(true);
                    r.stop();
                },
                |_, facts| facts[0].insert("fired", true),
            )
            .with_id("r"),
        );
        let out = run(&mut registry, EngineOptions::default(), &[Fact::new()]);
        assert!(out.halted);
        assert_eq!(out.match_path, ["r"]);
        assert_eq!(out.facts[0].match_path(), Some(vec!["r"]));
        assert_eq!(out.facts[0].get("fired"), None);
        assert_eq!(registry.rule_at(0).and_then(Rule::fired_as), Some("r"));
    }

    #[test]
    fn stop_before_match_still_records_rule() {
        let mut registry = RuleRegistry::new();
        registry.register(
            Rule::new(
                |r, _| {
                    r.stop();
                    r.when(true);
                },
                |_, _| {},
            )
            .with_id("r"),
        );
        let out = run(&mut registry, EngineOptions::default(), &[Fact::new()]);
        assert!(out.halted);
        assert_eq!(out.match_path, ["r"]);
    }

    #[test]
    fn restart_with_match_runs_consequence_first() {
        let mut registry = RuleRegistry::new();
        registry.register(
            Rule::new(
                |r, _| {
                    r.when(true);
                    r.restart();
                },
                |_, facts| facts[0].insert("ran", true),
            )
            .with_id("r"),
        );
        let out = run(&mut registry, EngineOptions::default(), &[Fact::new()]);
        assert_eq!(out.match_path, ["r"]);
        assert_eq!(out.facts[0].get("ran"), Some(&json!(true)));
        // The requested restart; the lap after it only sees an already-fired rule.
        assert_eq!(out.restarts, 1);
    }

    #[test]
    fn explicit_restart_leaves_snapshot_for_next_to_compare() {
        // "a" mutates and restarts on its own. The change is only noticed at
        // the next mutation check, after "b" fires, which restarts again.
        let mut registry = RuleRegistry::new();
        registry.register_all([
            Rule::new(
                |r, _| r.when(true),
                |r, facts| {
                    facts[0].insert("x", 1);
                    r.restart();
                },
            )
            .with_id("a")
            .with_priority(2),
            Rule::new(|r, _| r.when(true), |_, _| {})
                .with_id("b")
                .with_priority(1),
        ]);
        let out = run(&mut registry, EngineOptions::default(), &[Fact::new()]);
        assert_eq!(out.match_path, ["a", "b"]);
        assert_eq!(out.restarts, 2);
    }

    #[test]
    fn stall_is_reported() {
        let mut registry = RuleRegistry::new();
        registry.register(Rule::new(|_, _| {}, |_, _| {}).with_id("silent"));
        let err = Execution::new(&mut registry, EngineOptions::default(), &[])
            .run()
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::Stalled {
                rule: "silent".into(),
                index: 0
            }
        );
    }

    #[test]
    fn fire_uses_pinned_slot_after_registry_change() {
        let mut registry = RuleRegistry::new();
        // The condition reprioritizes another rule ahead of itself before
        // reporting a match; the consequence that runs must still be its own.
        registry.register(
            Rule::new(
                |r, _| {
                    r.registry_mut()
                        .set_priority(100, Some(&crate::RuleQuery::new().id("other")));
                    r.when(true);
                },
                |r, facts| {
                    facts[0].insert("ran", "first");
                    r.stop();
                },
            )
            .with_id("first")
            .with_priority(10),
        );
        registry.register(Rule::new(|r, _| r.when(false), |_, _| {}).with_id("other"));

        let out = run(&mut registry, EngineOptions::default(), &[Fact::new()]);
        assert_eq!(out.facts[0].get("ran"), Some(&json!("first")));
        assert_eq!(out.match_path, ["first"]);
    }
}
