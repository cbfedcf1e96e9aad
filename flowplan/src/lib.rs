//! ```text
//! config document ──► Plan::build ──► Plan (modules + channels + graph)
//!                      │                │
//!                      │                ├─► BlockingScheduler ─► ValueContext
//!                      │                ├─► SignalScheduler ──► ValueContext
//!                      │                └─► write_dot (Graphviz view)
//!                      │
//!                      └─► ModuleRegistry (type name ─► factory)
//!                              ▲
//!                              └── module! declarations register here
//! ```
//!
//! Flowplan is a declarative dataflow execution engine. A configuration
//! document declares a directed graph of typed *modules* wired together by
//! symbolic channels; the engine validates the wiring, assigns each channel a
//! dense slot in a shared value table, and executes the modules in dependency
//! order. All wiring mistakes (unknown module types, dangling inputs, type
//! mismatches, cycles) are rejected when the plan is built, never at run time.

pub mod config;
pub mod context;
pub mod module;
pub mod plans;
pub mod registry;
pub mod schedulers;
pub mod signature;

mod macros;

/// Implementation detail of the [`module!`] macro; not part of the public API.
#[doc(hidden)]
pub mod __private {
    pub use rustc_hash::FxHashMap;
    pub use tracing;
}
