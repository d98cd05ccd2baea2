use rulechain::{Engine, Fact, Rule};
use serde_json::json;

fn main() {
    // Deny-before-allow: the higher priority rule runs first and stops.
    let mut engine = Engine::new();
    engine.register_all([
        Rule::new(
            |r, facts| r.when(facts[0].get("user.banned") == Some(&json!(true))),
            |r, facts| {
                facts[0].insert("verdict", "deny");
                r.stop();
            },
        )
        .with_id("banned")
        .with_priority(10), // highest priority: checked first
        Rule::new(
            |r, facts| {
                let age = facts[0].get("user.age").and_then(|v| v.as_i64());
                r.when(age >= Some(18) && facts[0].get("user.status") == Some(&json!("active")));
            },
            |_, facts| facts[0].insert("verdict", "allow"),
        )
        .with_id("allowed")
        .with_priority(1), // only reached if no deny
    ]);

    let users = [
        (
            "Banned user",
            Fact::new()
                .set("user.banned", true)
                .set("user.age", 30)
                .set("user.status", "active"),
        ),
        (
            "Normal user",
            Fact::new()
                .set("user.banned", false)
                .set("user.age", 25)
                .set("user.status", "active"),
        ),
        (
            "Underage user",
            Fact::new()
                .set("user.banned", false)
                .set("user.age", 15)
                .set("user.status", "active"),
        ),
    ];

    for (label, fact) in &users {
        match engine.run_one(fact) {
            Ok(result) => match result.get("verdict") {
                Some(verdict) => println!("{label}: {verdict} via {:?}", result.match_path()),
                None => println!("{label}: no match"),
            },
            Err(e) => eprintln!("{label}: {e}"),
        }
    }
}
