//! The runtime contract between the engine and compiled module types.
//!
//! A module *type* is declared once with the [`module!`](crate::module!) macro
//! and registered under a name; a module *instance* is created per plan entry.
//! The engine drives instances exclusively through the object-safe [`Module`]
//! trait: [`resolve`](Module::resolve) wires argument names to value-table
//! slots while the plan is built, and [`invoke`](Module::invoke) runs the user
//! function against a [`ValueContext`].
//!
//! `X` is the extra-run-argument type threaded through every invocation (a
//! sink, a request scope, `()` when unused). It is part of the plan's type:
//! modules, factories, registries, and schedulers all agree on it statically.

use crate::context::{SlotError, ValueContext};
use crate::signature::ArgSpec;
use miette::Diagnostic;
use rustc_hash::FxHashMap;
use thiserror::Error;

/// A `resolve` call was handed an incomplete binding map.
#[derive(Debug, Error, Diagnostic)]
pub enum BindError {
    /// A declared argument has no entry in the name-to-slot map.
    #[error("argument \"{arg}\" of module \"{module}\" has no slot binding")]
    #[diagnostic(
        code(flowplan::module::missing_binding),
        help("resolve() must receive one slot per declared argument.")
    )]
    MissingBinding { module: String, arg: &'static str },
}

/// A module invocation failed.
///
/// On a validated plan the engine raises none of the structural variants;
/// `Io` and `Failed` carry failures out of user code unchanged.
#[derive(Debug, Error, Diagnostic)]
pub enum ModuleError {
    /// `invoke` ran before `resolve` populated the index table.
    #[error("module \"{module}\" was invoked before argument \"{arg}\" was resolved")]
    #[diagnostic(
        code(flowplan::module::unresolved),
        help("Build a plan instead of invoking modules by hand.")
    )]
    Unresolved { module: String, arg: &'static str },

    /// A slot read or write failed underneath the trampoline.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Slot(#[from] SlotError),

    /// I/O failure inside a user function.
    #[error(transparent)]
    #[diagnostic(code(flowplan::module::io))]
    Io(#[from] std::io::Error),

    /// A user function signalled failure.
    #[error("module failed: {message}")]
    #[diagnostic(code(flowplan::module::failed))]
    Failed { message: String },
}

impl ModuleError {
    /// Convenience constructor for user-signalled failures.
    pub fn failed(message: impl Into<String>) -> Self {
        ModuleError::Failed {
            message: message.into(),
        }
    }
}

/// Result type user functions return.
pub type ModuleResult = Result<(), ModuleError>;

/// Runtime interface of a module instance.
///
/// Instances are produced by factories during plan construction; user code
/// never drives this trait directly. The contract:
///
/// - `resolve` is called exactly once, before the first `invoke`, with a map
///   holding one slot index per declared argument.
/// - `invoke` reads each input slot (cast to the declared type), seeds each
///   output with its declared default, calls the user function with arguments
///   in declared order (outputs by `&mut`), then stores the outputs back.
///
/// `invoke` preconditions are established by the builder: the context has at
/// least `num_channels` slots and every input slot holds a value of the
/// declared type, produced earlier in the same run.
pub trait Module<X = ()>: Send {
    /// Instance id, unique within its plan.
    fn id(&self) -> &str;

    /// The declaring type's signature.
    fn signature(&self) -> &'static [ArgSpec];

    /// Wires argument names to value-table slots.
    fn resolve(&mut self, bindings: &FxHashMap<String, usize>) -> Result<(), BindError>;

    /// Runs the module against the shared value table.
    fn invoke(&mut self, slots: &mut ValueContext, extra: &mut X) -> Result<(), ModuleError>;
}

/// Compile-time side of a module declaration.
///
/// Implemented by the [`module!`](crate::module!) macro; the generic
/// [`TypedFactory`](crate::registry::TypedFactory) builds instances through
/// it. `C` is the extra-constructor-argument type handed to every
/// instantiation when a plan is built.
pub trait ModuleType<X = (), C = ()>: Module<X> + Sized + 'static {
    /// The type's signature, built once and shared by every instance.
    fn signature() -> &'static [ArgSpec];

    /// Creates an instance with the given plan-unique id.
    fn instantiate(id: &str, ctor: &C) -> Self;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Touch;

    impl Touch {
        fn run(&mut self, seen: &mut i64, _extra: &mut ()) -> ModuleResult {
            *seen += 1;
            Ok(())
        }
    }

    crate::module! {
        struct TouchModule(Touch);
        args {
            out seen: i64 = 0,
        }
    }

    #[test]
    fn resolve_rejects_missing_bindings() {
        let mut m = TouchModule::instantiate("t", &());
        let err = m.resolve(&FxHashMap::default()).unwrap_err();
        assert!(err.to_string().contains("\"seen\""));
        assert!(err.to_string().contains("\"t\""));
    }

    #[test]
    fn invoke_before_resolve_is_rejected() {
        let mut m = TouchModule::instantiate("t", &());
        let mut slots = ValueContext::new(1);
        let err = m.invoke(&mut slots, &mut ()).unwrap_err();
        assert!(matches!(err, ModuleError::Unresolved { .. }));
    }

    #[test]
    fn invoke_seeds_default_then_runs() {
        let mut m = TouchModule::instantiate("t", &());
        let mut bindings = FxHashMap::default();
        bindings.insert("seen".to_string(), 0);
        m.resolve(&bindings).unwrap();

        let mut slots = ValueContext::new(1);
        m.invoke(&mut slots, &mut ()).unwrap();
        assert_eq!(slots.get::<i64>(0).unwrap(), 1);

        // A stale value in the slot does not survive re-seeding.
        slots.set(0, 99_i64).unwrap();
        m.invoke(&mut slots, &mut ()).unwrap();
        assert_eq!(slots.get::<i64>(0).unwrap(), 1);
    }
}
