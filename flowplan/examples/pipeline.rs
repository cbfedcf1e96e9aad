//! End-to-end tour: declare modules, register them, build a plan from JSON,
//! inspect it, and run it on both schedulers.
//!
//! ```sh
//! cargo run --example pipeline
//! RUST_LOG=flowplan=trace cargo run --example pipeline
//! ```

use flowplan::module::ModuleResult;
use flowplan::plans::Plan;
use flowplan::registry::ModuleRegistry;
use flowplan::schedulers::{BlockingScheduler, SignalScheduler};
use tracing_subscriber::EnvFilter;

#[derive(Default)]
struct Start;

impl Start {
    fn run(&mut self, seed: &mut i64, _extra: &mut ()) -> ModuleResult {
        *seed = 3;
        Ok(())
    }
}

flowplan::module! {
    /// Seeds the pipeline.
    struct StartModule(Start);
    args { out seed: i64 = 0 }
}

#[derive(Default)]
struct Add;

impl Add {
    fn run(&mut self, a: i64, b: i64, c: &mut i64, _extra: &mut ()) -> ModuleResult {
        *c = a + b;
        Ok(())
    }
}

flowplan::module! {
    /// Sums two channels.
    struct AddModule(Add);
    args {
        in  a: i64,
        in  b: i64,
        out c: i64 = 0,
    }
}

#[derive(Default)]
struct Print;

impl Print {
    fn run(&mut self, result: i64, _extra: &mut ()) -> ModuleResult {
        println!("result={result}");
        Ok(())
    }
}

flowplan::module! {
    /// Prints the final value.
    struct PrintModule(Print);
    args { in result: i64 }
}

const PLAN: &str = r#"[
  { "id": "start",  "module": "StartModule", "outputs": { "seed": "x" } },
  { "id": "double", "module": "AddModule",
    "inputs": { "a": "x", "b": "x" }, "outputs": { "c": "y" } },
  { "id": "print",  "module": "PrintModule", "inputs": { "result": "y" } }
]"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let registry = ModuleRegistry::<()>::global();
    registry.register::<StartModule>("StartModule")?;
    registry.register::<AddModule>("AddModule")?;
    registry.register::<PrintModule>("PrintModule")?;

    println!("registered modules:");
    for (name, factory) in registry.all() {
        let args: Vec<String> = factory.signature().iter().map(|a| a.to_string()).collect();
        println!("  {name}: {}", args.join(" "));
    }

    let doc: serde_json::Value = serde_json::from_str(PLAN)?;
    let plan = Plan::<()>::build(&doc, &())?;
    println!("\nnum_channels={}", plan.num_channels());
    plan.write_dot(&mut std::io::stdout())?;

    println!("\nblocking scheduler:");
    let mut blocking = BlockingScheduler::new(plan);
    blocking.run(&mut ())?;

    println!("\nsignal scheduler:");
    let mut signal = SignalScheduler::new(blocking.into_plan());
    signal.run(&mut ())?;

    Ok(())
}
