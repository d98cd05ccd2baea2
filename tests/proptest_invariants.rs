
use proptest::prelude::*;
use rulechain::{Engine, EngineOptions, Fact, RuleRegistry};
use strategies::{arb_facts, arb_ruleset, GenRuleSet};

fn engine_for(gen: &GenRuleSet, options: EngineOptions) -> Engine {
    let mut engine = Engine::with_options(options);
    *engine.registry_mut() = gen.registry();
    engine
}

fn active_ids(registry: &RuleRegistry) -> Vec<String> {
    registry
        .active_rules()
        .filter_map(|r| r.id().map(str::to_owned))
        .collect()
}

// ---------------------------------------------------------------------------
// Invariant 1: Ordering
//
// The active list holds exactly the enabled rules, by descending priority,
// unprioritized rules last, ties in registration order.
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn active_list_ordering(gen in arb_ruleset()) {
        let registry = gen.registry();
        prop_assert_eq!(active_ids(&registry), gen.expected_order());
    }

    #[test]
    fn sync_is_idempotent(gen in arb_ruleset()) {
        let mut registry = gen.registry();
        let before = active_ids(&registry);
        registry.sync();
        prop_assert_eq!(active_ids(&registry), before);
    }
}

// ---------------------------------------------------------------------------
// Invariant 2: Single fire
//
// With static conditions, the match path is exactly the true rules in
// evaluation order, each appearing once, whether or not consequences mutate
// the working set.
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn each_rule_fires_at_most_once(gen in arb_ruleset(), facts in arb_facts()) {
        let mut engine = engine_for(&gen, EngineOptions::default());
        let report = engine.run_detailed(&facts).unwrap();
        let expected_fired = gen.expected_fired();
        prop_assert_eq!(report.match_path(), expected_fired.as_slice());
    }

    #[test]
    fn restarts_track_mutations(gen in arb_ruleset(), facts in arb_facts()) {
        prop_assume!(!facts.is_empty());
        let mut engine = engine_for(&gen, EngineOptions::default());
        let report = engine.run_detailed(&facts).unwrap();
        prop_assert_eq!(report.restarts(), gen.expected_mutations());
    }

    #[test]
    fn ignoring_changes_never_restarts(gen in arb_ruleset(), facts in arb_facts()) {
        let mut engine = engine_for(&gen, EngineOptions::new().with_ignore_fact_changes(true));
        let report = engine.run_detailed(&facts).unwrap();
        prop_assert_eq!(report.restarts(), 0);
        let expected_fired = gen.expected_fired();
        prop_assert_eq!(report.match_path(), expected_fired.as_slice());
    }
}

// ---------------------------------------------------------------------------
// Invariant 3: Batch annotation and isolation
//
// Every output fact carries the same match path, the batch size is
// preserved, and the caller's facts are never modified.
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn batch_shares_match_path(gen in arb_ruleset(), facts in arb_facts()) {
        let original = facts.clone();
        let mut engine = engine_for(&gen, EngineOptions::default());
        let out = engine.run(&facts).unwrap();

        prop_assert_eq!(out.len(), facts.len());
        prop_assert_eq!(&facts, &original);

        let expected = gen.expected_fired();
        let expected: Vec<&str> = expected.iter().map(String::as_str).collect();
        for fact in &out {
            prop_assert_eq!(fact.match_path(), Some(expected.clone()));
        }
    }

    #[test]
    fn determinism(gen in arb_ruleset(), facts in arb_facts()) {
        let mut engine = engine_for(&gen, EngineOptions::default());
        let first: Vec<Fact> = engine.run(&facts).unwrap();
        for _ in 0..3 {
            let again = engine.run(&facts).unwrap();
            prop_assert_eq!(&first, &again);
        }
    }
}
