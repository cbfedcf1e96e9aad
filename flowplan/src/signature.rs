//! Argument descriptors that make module interfaces introspectable.
//!
//! Every module type carries a *signature*: an ordered slice of [`ArgSpec`],
//! one per declared argument. The plan builder walks signatures to check
//! cardinality, bind channels, and compare producer/consumer types, so a
//! signature is the single source of truth about a module's shape.
//!
//! Signatures are built once per module type by the [`module!`](crate::module!)
//! macro and handed out as `&'static [ArgSpec]`; nothing mutates them after
//! that.

use std::any::TypeId;
use std::fmt;

/// Whether an argument reads a channel or produces one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// The argument reads a value from a channel.
    In,
    /// The argument writes a value to a channel the module owns.
    Out,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::In => f.write_str("input"),
            Direction::Out => f.write_str("output"),
        }
    }
}

/// One declared argument of a module type.
///
/// An `ArgSpec` couples a local argument name with its direction, the declared
/// type's textual label (used verbatim in diagnostics), the textual default
/// literal for outputs, and a runtime type token. Two arguments may be wired
/// to the same channel only when their tokens are equal; the builder checks
/// this once so invocation never has to.
///
/// # Examples
///
/// ```
/// use std::any::TypeId;
/// use flowplan::signature::{ArgSpec, Direction};
///
/// let spec = ArgSpec::output("i64", "seed", "0", TypeId::of::<i64>());
/// assert_eq!(spec.direction(), Direction::Out);
/// assert_eq!(spec.name(), "seed");
/// assert_eq!(spec.default(), Some("0"));
/// ```
#[derive(Clone, Debug)]
pub struct ArgSpec {
    direction: Direction,
    type_name: &'static str,
    name: &'static str,
    default: Option<&'static str>,
    token: TypeId,
}

impl ArgSpec {
    /// Describes an input argument.
    #[must_use]
    pub fn input(type_name: &'static str, name: &'static str, token: TypeId) -> Self {
        Self {
            direction: Direction::In,
            type_name,
            name,
            default: None,
            token,
        }
    }

    /// Describes an output argument with its textual default literal.
    ///
    /// The default is re-evaluated on entry to every invocation, so an output
    /// slot never carries a value from a previous run.
    #[must_use]
    pub fn output(
        type_name: &'static str,
        name: &'static str,
        default: &'static str,
        token: TypeId,
    ) -> Self {
        Self {
            direction: Direction::Out,
            type_name,
            name,
            default: Some(default),
            token,
        }
    }

    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// The declared type exactly as written in the module declaration.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Textual default literal; present for outputs only.
    #[must_use]
    pub fn default(&self) -> Option<&'static str> {
        self.default
    }

    /// Runtime identity of the declared type. Equality means bindable.
    #[must_use]
    pub fn token(&self) -> TypeId {
        self.token
    }
}

impl fmt::Display for ArgSpec {
    /// `(direction, type, name, default, token)` dump form used by registry
    /// listings.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {}, {:?})",
            self.direction,
            self.type_name,
            self.name,
            self.default.unwrap_or("-"),
            self.token,
        )
    }
}

/// Number of input arguments in a signature.
#[must_use]
pub fn input_count(signature: &[ArgSpec]) -> usize {
    signature
        .iter()
        .filter(|a| a.direction() == Direction::In)
        .count()
}

/// Number of output arguments in a signature.
#[must_use]
pub fn output_count(signature: &[ArgSpec]) -> usize {
    signature.len() - input_count(signature)
}

/// Looks up an argument by its local name.
#[must_use]
pub fn find_arg<'a>(signature: &'a [ArgSpec], name: &str) -> Option<&'a ArgSpec> {
    signature.iter().find(|a| a.name() == name)
}
