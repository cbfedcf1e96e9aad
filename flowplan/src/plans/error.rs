//! Static-validation failures raised while a plan is built.
//!
//! Every variant is surfaced before any plan exists; a document that builds
//! cannot fail inside the engine at run time.

use crate::config::ConfigError;
use crate::module::BindError;
use crate::registry::RegistryError;
use crate::signature::Direction;
use miette::Diagnostic;
use thiserror::Error;

/// The document failed validation; no plan was produced.
#[derive(Debug, Error, Diagnostic)]
pub enum PlanError {
    /// Factory lookup failed (unknown module type name).
    #[error(transparent)]
    #[diagnostic(transparent)]
    Registry(#[from] RegistryError),

    /// The document itself is malformed.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    /// Two entries share one id.
    #[error("module id \"{id}\" is declared more than once")]
    #[diagnostic(
        code(flowplan::plans::duplicate_module_id),
        help("Module ids are unique per plan.")
    )]
    DuplicateModuleId { id: String },

    /// The config block's size disagrees with the signature.
    #[error(
        "module \"{module}\" declares {expected} {direction} argument(s) \
         but its config block binds {found}"
    )]
    #[diagnostic(
        code(flowplan::plans::inconsistent_cardinality),
        help("The inputs/outputs blocks must bind every declared argument exactly once.")
    )]
    InconsistentCardinality {
        module: String,
        direction: Direction,
        expected: usize,
        found: usize,
    },

    /// A declared argument has no binding in the config block.
    #[error("argument \"{arg}\" of module \"{module}\" has no binding in the document")]
    #[diagnostic(code(flowplan::plans::missing_config))]
    MissingConfig { module: String, arg: String },

    /// Two modules claim the same global output name.
    #[error("modules \"{first}\" and \"{second}\" both output to channel \"{channel}\"")]
    #[diagnostic(
        code(flowplan::plans::output_conflict),
        help("Each channel has exactly one producer.")
    )]
    OutputConflict {
        channel: String,
        first: String,
        second: String,
    },

    /// An input is bound to a channel nothing produces.
    #[error(
        "input \"{input}\" of module \"{module}\" is bound to channel \
         \"{channel}\" that no module outputs"
    )]
    #[diagnostic(code(flowplan::plans::dangling_input))]
    DanglingInput {
        module: String,
        input: String,
        channel: String,
    },

    /// Producer and consumer declare different types for one channel.
    #[error(
        "input \"{input}\" of module \"{module}\" is declared as {expected} \
         but channel \"{channel}\" is produced by \"{producer}\" as {found}"
    )]
    #[diagnostic(
        code(flowplan::plans::type_mismatch),
        help("Both ends of a channel must declare the same argument type.")
    )]
    TypeMismatch {
        module: String,
        input: String,
        channel: String,
        expected: &'static str,
        producer: String,
        found: &'static str,
    },

    /// A module consumes its own output.
    #[error("module \"{module}\" consumes its own output channel \"{channel}\"")]
    #[diagnostic(code(flowplan::plans::self_dependency))]
    SelfDependency { module: String, channel: String },

    /// The dependency graph has a cycle; the residual subgraph follows.
    #[error("circular dependency:\n{dot}")]
    #[diagnostic(
        code(flowplan::plans::circular_dependency),
        help("The dump shows the unresolvable core of the graph.")
    )]
    CircularDependency { dot: String },

    /// A module rejected its binding map.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Bind(#[from] BindError),
}
