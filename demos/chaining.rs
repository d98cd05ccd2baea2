use rulechain::{Engine, Fact, Rule, RuleQuery};
use serde_json::json;

fn main() {
    // Each rule feeds the next; a mutation restarts evaluation so the
    // lower priority rules see the new facts.
    let mut engine = Engine::new();
    engine.register_all([
        Rule::new(
            |r, facts| r.when(facts[0].get("order.total").and_then(|v| v.as_f64()) > Some(100.0)),
            |_, facts| facts[0].insert("order.tier", "gold"),
        )
        .with_id("tier")
        .with_priority(3),
        Rule::new(
            |r, facts| r.when(facts[0].get("order.tier") == Some(&json!("gold"))),
            |_, facts| facts[0].insert("order.discount", 0.1),
        )
        .with_id("discount")
        .with_priority(2),
        Rule::new(
            |r, facts| r.when(facts[0].get("order.discount").is_some()),
            |r, facts| {
                let total = facts[0].get("order.total").and_then(|v| v.as_f64()).unwrap_or(0.0);
                let discount = facts[0].get("order.discount").and_then(|v| v.as_f64()).unwrap_or(0.0);
                facts[0].insert("order.due", total * (1.0 - discount));
                r.stop();
            },
        )
        .with_id("settle")
        .with_priority(1),
    ]);

    let order = Fact::new().set("order.total", 250.0);

    match engine.run_detailed(&[order.clone()]) {
        Ok(report) => println!("{report}\n{}", json!(report.facts())),
        Err(e) => eprintln!("Execution failed: {e}"),
    }

    // Turn off discounts and run again.
    engine.set_enabled("off", Some(&RuleQuery::new().id("discount")));
    match engine.run_one(&order) {
        Ok(result) => println!("without discount: {}", result.into_value()),
        Err(e) => eprintln!("Execution failed: {e}"),
    }
}
