//! Reader adapter over hierarchical configuration documents.
//!
//! The engine never commits to a parser: anything that can present itself as
//! a tree of ordered string-keyed mappings and lists implements [`ConfigNode`]
//! and can drive the plan builder. The crate ships the implementation for
//! [`serde_json::Value`], whose object entries keep document order.
//!
//! A plan document's top level is a list; each element is a mapping with the
//! keys `id`, `module`, and optional `inputs` / `outputs` mappings from local
//! argument name to global channel name:
//!
//! ```json
//! [
//!   { "id": "s", "module": "StartModule", "outputs": { "seed": "x" } },
//!   { "id": "a", "module": "AddModule",
//!     "inputs": { "a": "x", "b": "x" }, "outputs": { "c": "y" } },
//!   { "id": "o", "module": "OutputModule", "inputs": { "result": "y" } }
//! ]
//! ```

use miette::Diagnostic;
use thiserror::Error;

/// The document does not have the expected shape.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// The document root is not a list of module entries.
    #[error("the document's top level is not a list")]
    #[diagnostic(
        code(flowplan::config::top_level_not_list),
        help("A plan document is a list of module entries.")
    )]
    TopLevelNotList,

    /// A top-level element is not a mapping.
    #[error("entry #{index} is not a mapping")]
    #[diagnostic(code(flowplan::config::entry_not_map))]
    EntryNotMap { index: usize },

    /// An entry is missing a required key.
    #[error("entry #{index} has no \"{field}\" key")]
    #[diagnostic(
        code(flowplan::config::missing_field),
        help("Every entry needs an \"id\" and a \"module\" key.")
    )]
    MissingField { index: usize, field: &'static str },

    /// A scalar field does not hold a string.
    #[error("the \"{field}\" key of entry #{index} is not a string")]
    #[diagnostic(code(flowplan::config::field_not_string))]
    FieldNotString { index: usize, field: &'static str },

    /// An `inputs` / `outputs` block is not a mapping.
    #[error("the \"{block}\" block of module \"{module}\" is not a mapping")]
    #[diagnostic(code(flowplan::config::block_not_map))]
    BlockNotMap { module: String, block: &'static str },

    /// A binding inside `inputs` / `outputs` is not a string.
    #[error("binding \"{name}\" in the \"{block}\" block of module \"{module}\" is not a string")]
    #[diagnostic(
        code(flowplan::config::binding_not_string),
        help("Bindings map a local argument name to a global channel name.")
    )]
    BindingNotString {
        module: String,
        block: &'static str,
        name: String,
    },
}

/// A node in an ordered hierarchical document.
///
/// Each accessor returns `None` when the node is not of that shape; the
/// builder turns that into a typed [`ConfigError`].
pub trait ConfigNode {
    /// The node as a string scalar.
    fn as_str(&self) -> Option<&str>;

    /// Child of a mapping node by key.
    fn child(&self, key: &str) -> Option<&Self>;

    /// Entries of a mapping node, in document order.
    fn entries(&self) -> Option<Vec<(&str, &Self)>>;

    /// Elements of a list node, in document order.
    fn items(&self) -> Option<Vec<&Self>>;
}

impl ConfigNode for serde_json::Value {
    fn as_str(&self) -> Option<&str> {
        self.as_str()
    }

    fn child(&self, key: &str) -> Option<&Self> {
        self.as_object().and_then(|map| map.get(key))
    }

    fn entries(&self) -> Option<Vec<(&str, &Self)>> {
        self.as_object()
            .map(|map| map.iter().map(|(k, v)| (k.as_str(), v)).collect())
    }

    fn items(&self) -> Option<Vec<&Self>> {
        self.as_array().map(|list| list.iter().collect())
    }
}

/// One module entry lifted out of the document.
#[derive(Debug)]
pub struct RawEntry<'d> {
    /// Plan-unique module id.
    pub id: &'d str,
    /// Registered module type name.
    pub module: &'d str,
    /// Ordered (local argument, global channel) input bindings.
    pub inputs: Vec<(&'d str, &'d str)>,
    /// Ordered (local argument, global channel) output bindings.
    pub outputs: Vec<(&'d str, &'d str)>,
}

/// Lifts a document into raw module entries, in document order.
pub fn parse_entries<D: ConfigNode>(doc: &D) -> Result<Vec<RawEntry<'_>>, ConfigError> {
    let items = doc.items().ok_or(ConfigError::TopLevelNotList)?;
    let mut entries = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        if item.entries().is_none() {
            return Err(ConfigError::EntryNotMap { index });
        }
        let id = scalar_field(item, index, "id")?;
        let module = scalar_field(item, index, "module")?;
        let inputs = binding_block(item, id, "inputs")?;
        let outputs = binding_block(item, id, "outputs")?;
        entries.push(RawEntry {
            id,
            module,
            inputs,
            outputs,
        });
    }
    Ok(entries)
}

fn scalar_field<'d, D: ConfigNode>(
    entry: &'d D,
    index: usize,
    field: &'static str,
) -> Result<&'d str, ConfigError> {
    entry
        .child(field)
        .ok_or(ConfigError::MissingField { index, field })?
        .as_str()
        .ok_or(ConfigError::FieldNotString { index, field })
}

/// An absent block reads as zero bindings.
fn binding_block<'d, D: ConfigNode>(
    entry: &'d D,
    module: &str,
    block: &'static str,
) -> Result<Vec<(&'d str, &'d str)>, ConfigError> {
    let Some(node) = entry.child(block) else {
        return Ok(Vec::new());
    };
    let pairs = node.entries().ok_or_else(|| ConfigError::BlockNotMap {
        module: module.to_owned(),
        block,
    })?;
    let mut bindings = Vec::with_capacity(pairs.len());
    for (local, value) in pairs {
        let global = value.as_str().ok_or_else(|| ConfigError::BindingNotString {
            module: module.to_owned(),
            block,
            name: local.to_owned(),
        })?;
        bindings.push((local, global));
    }
    Ok(bindings)
}
