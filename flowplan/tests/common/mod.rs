//! Shared module definitions and document fixtures for the integration suites.
//!
//! Two module families are registered under different extra-run-argument
//! types: the arithmetic family logs into a `String` sink, the tick family
//! stamps a logical clock carried in an `i64` so execution order is
//! observable from the value table.
#![allow(dead_code)]

use flowplan::module::{ModuleError, ModuleResult};
use flowplan::registry::ModuleRegistry;
use serde_json::{json, Value};

// ---- arithmetic family: X = String (log sink) ----

#[derive(Default)]
pub struct Start;

impl Start {
    pub fn run(&mut self, seed: &mut i64, _log: &mut String) -> ModuleResult {
        *seed = 3;
        Ok(())
    }
}

flowplan::module! {
    /// Seeds a channel with a fixed value.
    pub struct StartModule(Start);
    extra = String;
    args { out seed: i64 = 0 }
}

#[derive(Default)]
pub struct Add;

impl Add {
    pub fn run(&mut self, a: i64, b: i64, c: &mut i64, _log: &mut String) -> ModuleResult {
        *c = a + b;
        Ok(())
    }
}

flowplan::module! {
    /// Sums two input channels.
    pub struct AddModule(Add);
    extra = String;
    args {
        in  a: i64,
        in  b: i64,
        out c: i64 = 0,
    }
}

#[derive(Default)]
pub struct Output;

impl Output {
    pub fn run(&mut self, result: i64, log: &mut String) -> ModuleResult {
        log.push_str(&format!("result={result}\n"));
        Ok(())
    }
}

flowplan::module! {
    /// Appends its input to the run log.
    pub struct OutputModule(Output);
    extra = String;
    args { in result: i64 }
}

#[derive(Default)]
pub struct Forward;

impl Forward {
    pub fn run(&mut self, value: i64, passed: &mut i64, _log: &mut String) -> ModuleResult {
        *passed = value + 1;
        Ok(())
    }
}

flowplan::module! {
    /// Increments and forwards, so plans can chain indefinitely.
    pub struct ForwardModule(Forward);
    extra = String;
    args {
        in  value: i64,
        out passed: i64 = 0,
    }
}

#[derive(Default)]
pub struct Keep;

impl Keep {
    pub fn run(&mut self, _value: &mut i64, _log: &mut String) -> ModuleResult {
        Ok(())
    }
}

flowplan::module! {
    /// Leaves its output at the declared default.
    pub struct KeepModule(Keep);
    extra = String;
    args { out value: i64 = 7 }
}

#[derive(Default)]
pub struct WideStart;

impl WideStart {
    pub fn run(&mut self, wide: &mut i128, _log: &mut String) -> ModuleResult {
        *wide = 1 << 40;
        Ok(())
    }
}

flowplan::module! {
    /// Produces a wider integer type than the arithmetic family consumes.
    pub struct WideStartModule(WideStart);
    extra = String;
    args { out wide: i128 = 0 }
}

#[derive(Default)]
pub struct Explode;

impl Explode {
    pub fn run(&mut self, _boom: &mut i64, _log: &mut String) -> ModuleResult {
        Err(ModuleError::failed("boom"))
    }
}

flowplan::module! {
    /// Always fails, for error-propagation tests.
    pub struct ExplodeModule(Explode);
    extra = String;
    args { out boom: i64 = 0 }
}

pub struct Bias {
    pub offset: i64,
}

impl Bias {
    pub fn run(&mut self, value: i64, biased: &mut i64, _log: &mut String) -> ModuleResult {
        *biased = value + self.offset;
        Ok(())
    }
}

flowplan::module! {
    /// Adds a constructor-supplied offset to its input.
    pub struct BiasModule(Bias);
    extra = String;
    ctor = i64, |offset: &i64| Bias { offset: *offset };
    args {
        in  value: i64,
        out biased: i64 = 0,
    }
}

/// Registry with the arithmetic family registered.
pub fn arithmetic_registry() -> ModuleRegistry<String> {
    let registry = ModuleRegistry::new();
    registry.register::<StartModule>("StartModule").unwrap();
    registry.register::<AddModule>("AddModule").unwrap();
    registry.register::<OutputModule>("OutputModule").unwrap();
    registry.register::<ForwardModule>("ForwardModule").unwrap();
    registry.register::<KeepModule>("KeepModule").unwrap();
    registry.register::<WideStartModule>("WideStartModule").unwrap();
    registry.register::<ExplodeModule>("ExplodeModule").unwrap();
    registry
}

/// Registry with the bias module, exercising constructor arguments.
pub fn bias_registry() -> ModuleRegistry<String, i64> {
    let registry = ModuleRegistry::new();
    registry.register::<BiasStartModule>("StartModule").unwrap();
    registry.register::<BiasModule>("BiasModule").unwrap();
    registry.register::<BiasOutputModule>("OutputModule").unwrap();
    registry
}

flowplan::module! {
    pub struct BiasStartModule(Start);
    extra = String;
    ctor = i64, |_offset: &i64| Start;
    args { out seed: i64 = 0 }
}

flowplan::module! {
    pub struct BiasOutputModule(Output);
    extra = String;
    ctor = i64, |_offset: &i64| Output;
    args { in result: i64 }
}

// ---- tick family: X = i64 (logical clock) ----

#[derive(Default)]
pub struct TickSource;

impl TickSource {
    pub fn run(&mut self, t: &mut i64, clock: &mut i64) -> ModuleResult {
        *clock += 1;
        *t = *clock;
        Ok(())
    }
}

flowplan::module! {
    /// Stamps the next clock tick into its output.
    pub struct TickSourceModule(TickSource);
    extra = i64;
    args { out t: i64 = 0 }
}

#[derive(Default)]
pub struct TickChain;

impl TickChain {
    pub fn run(&mut self, _a: i64, t: &mut i64, clock: &mut i64) -> ModuleResult {
        *clock += 1;
        *t = *clock;
        Ok(())
    }
}

flowplan::module! {
    /// One-input tick stamp; the input only forces ordering.
    pub struct TickChainModule(TickChain);
    extra = i64;
    args {
        in  a: i64,
        out t: i64 = 0,
    }
}

#[derive(Default)]
pub struct TickJoin;

impl TickJoin {
    pub fn run(&mut self, _a: i64, _b: i64, t: &mut i64, clock: &mut i64) -> ModuleResult {
        *clock += 1;
        *t = *clock;
        Ok(())
    }
}

flowplan::module! {
    /// Two-input tick stamp.
    pub struct TickJoinModule(TickJoin);
    extra = i64;
    args {
        in  a: i64,
        in  b: i64,
        out t: i64 = 0,
    }
}

/// Registry with the tick family registered.
pub fn tick_registry() -> ModuleRegistry<i64> {
    let registry = ModuleRegistry::new();
    registry.register::<TickSourceModule>("TickSource").unwrap();
    registry.register::<TickChainModule>("TickChain").unwrap();
    registry.register::<TickJoinModule>("TickJoin").unwrap();
    registry
}

// ---- document fixtures ----

/// The canonical happy-path document: s feeds a twice, a feeds o.
pub fn happy_path_doc() -> Value {
    json!([
        { "id": "s", "module": "StartModule", "outputs": { "seed": "x" } },
        { "id": "a", "module": "AddModule",
          "inputs": { "a": "x", "b": "x" }, "outputs": { "c": "y" } },
        { "id": "o", "module": "OutputModule", "inputs": { "result": "y" } },
    ])
}
