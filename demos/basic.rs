use rulechain::{Engine, Fact, Rule};
use serde_json::json;

fn main() {
    let mut engine = Engine::new();

    // Mark adults, then grant access to active adults.
    engine.register_all([
        Rule::new(
            |r, facts| r.when(facts.iter().all(|f| f.get("user.age").and_then(|v| v.as_i64()) >= Some(18))),
            |_, facts| {
                for fact in facts.iter_mut() {
                    fact.insert("user.adult", true);
                }
            },
        )
        .with_id("eligible_age")
        .with_priority(2),
        Rule::new(
            |r, facts| {
                r.when(facts.iter().all(|f| {
                    f.get("user.adult") == Some(&json!(true))
                        && f.get("user.status") == Some(&json!("active"))
                }));
            },
            |_, facts| {
                for fact in facts.iter_mut() {
                    fact.insert("access", "granted");
                }
            },
        )
        .with_id("can_proceed")
        .with_priority(1),
    ]);

    println!("{engine}");

    let fact = Fact::new().set("user.age", 25).set("user.status", "active");

    match engine.run_one(&fact) {
        Ok(result) => println!("Result: {}", result.into_value()),
        Err(e) => eprintln!("Execution failed: {e}"),
    }
}
