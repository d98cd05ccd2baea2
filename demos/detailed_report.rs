use rulechain::{Engine, EngineOptions, Fact, Rule};
use serde_json::json;
use tracing_subscriber::EnvFilter;

fn main() {
    // RUST_LOG=rulechain=trace shows every state transition.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let options = EngineOptions::from_json(r#"{ "maxSteps": 10000 }"#)
        .expect("valid engine configuration");
    let mut engine = Engine::with_options(options);

    engine.register_all([
        Rule::new(
            |r, facts| r.when(facts[0].get("request.region") != Some(&json!("restricted"))),
            |_, facts| facts[0].insert("checks.region", true),
        )
        .with_name("not_restricted")
        .with_priority(3),
        Rule::new(
            |r, facts| r.when(facts[0].get("user.status") == Some(&json!("active"))),
            |_, facts| facts[0].insert("checks.account", true),
        )
        .with_name("active_account")
        .with_priority(2),
        Rule::new(
            |r, facts| {
                r.when(
                    facts[0].get("checks.region") == Some(&json!(true))
                        && facts[0].get("checks.account") == Some(&json!(true)),
                );
            },
            |r, facts| {
                facts[0].insert("verdict", "proceed");
                r.stop();
            },
        )
        .with_name("can_proceed")
        .with_priority(1),
    ]);

    let fact = Fact::new()
        .set("user.status", "active")
        .set("request.region", "us-east");

    let report = match engine.run_detailed(&[fact]) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Execution failed: {e}");
            return;
        }
    };

    println!("{report}");
    println!();
    println!("Fired: {:?}", report.match_path());
    println!("Restarts: {}", report.restarts());
    println!("Halted: {}", report.halted());
    println!("Facts: {}", json!(report.facts()));
}
