use std::fmt;

use tracing::trace;

use super::query::{RuleQuery, RuleState};
use super::rule::Rule;

/// The master rule set and the active rule list derived from it.
///
/// The active list holds every enabled rule, sorted by descending priority.
/// Rules without a priority come after all prioritized rules. Ties keep
/// registration order. The active list is recomputed after every mutation.
///
/// # Example
///
/// ```
/// use rulechain::{Rule, RuleQuery, RuleRegistry};
///
/// let mut registry = RuleRegistry::new();
/// registry.register(Rule::new(|r, _| r.when(true), |_, _| {}).with_id("low").with_priority(1));
/// registry.register(Rule::new(|r, _| r.when(true), |_, _| {}).with_id("high").with_priority(9));
///
/// let order: Vec<_> = registry.active_rules().filter_map(|r| r.id()).collect();
/// assert_eq!(order, ["high", "low"]);
///
/// registry.set_enabled("off", Some(&RuleQuery::new().id("high")));
/// assert_eq!(registry.active_len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RuleRegistry {
    rules: Vec<Rule>,
    /// Indices into `rules`, in evaluation order.
    active: Vec<usize>,
}

impl RuleRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule and resync. Rules are never deduplicated.
    pub fn register(&mut self, rule: Rule) {
        self.rules.push(rule);
        self.sync();
    }

    /// Append several rules and resync once.
    pub fn register_all(&mut self, rules: impl IntoIterator<Item = Rule>) {
        self.rules.extend(rules);
        self.sync();
    }

    /// Recompute the active rule list. Idempotent.
    pub fn sync(&mut self) {
        let mut active: Vec<usize> = self
            .rules
            .iter()
            .enumerate()
            .filter(|(_, rule)| rule.enabled)
            .map(|(slot, _)| slot)
            .collect();
        // `Option<i64>` orders `None` below every `Some`, so descending order
        // puts unprioritized rules last. `sort_by` is stable.
        active.sort_by(|&a, &b| self.rules[b].priority.cmp(&self.rules[a].priority));
        trace!(total = self.rules.len(), active = active.len(), "rule registry synced");
        self.active = active;
    }

    /// Every registered rule matched by `query`, in registration order.
    /// `None` returns all rules. See [`RuleQuery`] for the OR semantics.
    #[must_use]
    pub fn find_matching(&self, query: Option<&RuleQuery>) -> Vec<&Rule> {
        self.matching_slots(query)
            .into_iter()
            .map(|slot| &self.rules[slot])
            .collect()
    }

    /// Turn matching rules on or off, then resync.
    pub fn set_enabled(&mut self, state: impl Into<RuleState>, query: Option<&RuleQuery>) {
        let enabled = bool::from(state.into());
        for slot in self.matching_slots(query) {
            self.rules[slot].enabled = enabled;
        }
        self.sync();
    }

    /// Assign `priority` to matching rules, then resync.
    pub fn set_priority(&mut self, priority: i64, query: Option<&RuleQuery>) {
        for slot in self.matching_slots(query) {
            self.rules[slot].priority = Some(priority);
        }
        self.sync();
    }

    /// The active rules in evaluation order.
    pub fn active_rules(&self) -> impl Iterator<Item = &Rule> + '_ {
        self.active.iter().map(|&slot| &self.rules[slot])
    }

    /// The active rule at `index`, if any.
    #[must_use]
    pub fn active_rule(&self, index: usize) -> Option<&Rule> {
        self.active_slot(index).map(|slot| &self.rules[slot])
    }

    #[must_use]
    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    /// All registered rules, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Rule> + '_ {
        self.rules.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Position in `rules` of the active rule at `index`. Slots are stable
    /// because rules are only ever appended.
    pub(crate) fn active_slot(&self, index: usize) -> Option<usize> {
        self.active.get(index).copied()
    }

    pub(crate) fn rule_at(&self, slot: usize) -> Option<&Rule> {
        self.rules.get(slot)
    }

    /// Tag the rule's consequence with its reference. Only the first firing
    /// assigns it.
    pub(crate) fn record_fired(&mut self, slot: usize, reference: &str) {
        if let Some(rule) = self.rules.get_mut(slot) {
            rule.fired_as.get_or_insert_with(|| reference.to_owned());
        }
    }

    fn matching_slots(&self, query: Option<&RuleQuery>) -> Vec<usize> {
        self.rules
            .iter()
            .enumerate()
            .filter(|(_, rule)| query.map_or(true, |q| q.matches(rule)))
            .map(|(slot, _)| slot)
            .collect()
    }
}

impl fmt::Display for RuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RuleRegistry({} rules, {} active)",
            self.rules.len(),
            self.active.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(id: &str) -> Rule {
        Rule::new(|r, _| r.when(false), |_, _| {}).with_id(id)
    }

    fn active_ids(registry: &RuleRegistry) -> Vec<&str> {
        registry.active_rules().filter_map(Rule::id).collect()
    }

    #[test]
    fn orders_by_descending_priority() {
        let mut registry = RuleRegistry::new();
        registry.register_all([
            rule("a").with_priority(1),
            rule("b").with_priority(3),
            rule("c").with_priority(2),
        ]);
        assert_eq!(active_ids(&registry), ["b", "c", "a"]);
    }

    #[test]
    fn ties_keep_registration_order() {
        let mut registry = RuleRegistry::new();
        registry.register_all([
            rule("a").with_priority(1),
            rule("b").with_priority(1),
            rule("c"),
            rule("d"),
            rule("e").with_priority(1),
        ]);
        assert_eq!(active_ids(&registry), ["a", "b", "e", "c", "d"]);
    }

    #[test]
    fn unprioritized_rules_sort_after_zero_and_negative() {
        let mut registry = RuleRegistry::new();
        registry.register_all([
            rule("none"),
            rule("neg").with_priority(-5),
            rule("zero").with_priority(0),
        ]);
        assert_eq!(active_ids(&registry), ["zero", "neg", "none"]);
    }

    #[test]
    fn disabled_rules_are_not_active() {
        let mut registry = RuleRegistry::new();
        registry.register(rule("a").with_enabled(false));
        registry.register(rule("b"));
        assert_eq!(registry.len(), 2);
        assert_eq!(active_ids(&registry), ["b"]);
    }

    #[test]
    fn register_never_deduplicates() {
        let mut registry = RuleRegistry::new();
        registry.register(rule("a"));
        registry.register(rule("a"));
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.active_len(), 2);
    }

    #[test]
    fn sync_is_idempotent() {
        let mut registry = RuleRegistry::new();
        registry.register_all([rule("a").with_priority(1), rule("b").with_priority(2)]);
        registry.sync();
        registry.sync();
        assert_eq!(active_ids(&registry), ["b", "a"]);
    }

    #[test]
    fn find_matching_without_query_returns_all() {
        let mut registry = RuleRegistry::new();
        registry.register_all([rule("a"), rule("b").with_enabled(false)]);
        assert_eq!(registry.find_matching(None).len(), 2);
    }

    #[test]
    fn find_matching_is_or() {
        let mut registry = RuleRegistry::new();
        registry.register_all([
            rule("a").with_priority(1),
            rule("b").with_priority(2),
            rule("c").with_priority(3),
        ]);
        let query = RuleQuery::new().id("a").priority(3);
        let found: Vec<_> = registry
            .find_matching(Some(&query))
            .into_iter()
            .filter_map(Rule::id)
            .collect();
        assert_eq!(found, ["a", "c"]);
    }

    #[test]
    fn set_enabled_resyncs() {
        let mut registry = RuleRegistry::new();
        registry.register_all([rule("r1"), rule("r2")]);
        registry.set_enabled("off", Some(&RuleQuery::new().id("r1")));
        assert_eq!(active_ids(&registry), ["r2"]);
        registry.set_enabled(RuleState::On, Some(&RuleQuery::new().id("r1")));
        assert_eq!(active_ids(&registry), ["r1", "r2"]);
    }

    #[test]
    fn set_enabled_without_query_applies_to_all() {
        let mut registry = RuleRegistry::new();
        registry.register_all([rule("r1"), rule("r2")]);
        registry.set_enabled(false, None);
        assert_eq!(registry.active_len(), 0);
    }

    #[test]
    fn set_priority_reorders() {
        let mut registry = RuleRegistry::new();
        registry.register_all([rule("a").with_priority(5), rule("b").with_priority(1)]);
        registry.set_priority(10, Some(&RuleQuery::new().id("b")));
        assert_eq!(active_ids(&registry), ["b", "a"]);
    }

    #[test]
    fn record_fired_assigns_once() {
        let mut registry = RuleRegistry::new();
        registry.register(rule("a"));
        registry.record_fired(0, "first");
        registry.record_fired(0, "second");
        assert_eq!(registry.rule_at(0).and_then(Rule::fired_as), Some("first"));
    }

    #[test]
    fn display() {
        let mut registry = RuleRegistry::new();
        registry.register_all([rule("a"), rule("b").with_enabled(false)]);
        assert_eq!(registry.to_string(), "RuleRegistry(2 rules, 1 active)");
    }
}
