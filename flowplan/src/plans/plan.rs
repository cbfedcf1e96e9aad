//! The validated, runnable plan.

use crate::config::ConfigNode;
use crate::module::Module;
use crate::registry::ModuleRegistry;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction::Incoming;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::io;

use super::{builder, dot, PlanError};

/// An ordered collection of resolved modules plus their dependency graph.
///
/// A plan is produced atomically by [`Plan::build`] and immutable afterwards:
/// modules sit in document order, every argument is bound to a value-table
/// slot, types match across each channel, and the graph is a DAG. Schedulers
/// take ownership of a plan to run it.
///
/// `X` is the extra-run-argument type every module invocation receives.
///
/// # Examples
///
/// ```
/// use flowplan::module::ModuleResult;
/// use flowplan::plans::Plan;
/// use flowplan::registry::ModuleRegistry;
/// use serde_json::json;
///
/// #[derive(Default)]
/// struct Start;
///
/// impl Start {
///     fn run(&mut self, seed: &mut i64, _extra: &mut ()) -> ModuleResult {
///         *seed = 3;
///         Ok(())
///     }
/// }
///
/// flowplan::module! {
///     struct StartModule(Start);
///     args { out seed: i64 = 0 }
/// }
///
/// let registry = ModuleRegistry::new();
/// registry.register::<StartModule>("StartModule").unwrap();
///
/// let doc = json!([
///     { "id": "s", "module": "StartModule", "outputs": { "seed": "x" } },
/// ]);
/// let plan = Plan::build_with(&registry, &doc, &()).unwrap();
/// assert_eq!(plan.num_channels(), 1);
/// ```
pub struct Plan<X = ()> {
    modules: Vec<Box<dyn Module<X>>>,
    graph: DiGraph<String, ()>,
    num_channels: usize,
}

impl<X> std::fmt::Debug for Plan<X> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Plan")
            .field("modules", &self.modules.iter().map(|m| m.id()).collect::<Vec<_>>())
            .field("graph", &self.graph)
            .field("num_channels", &self.num_channels)
            .finish()
    }
}

impl<X> Plan<X> {
    /// Builds a plan against the process-wide registry for `(X, C)`.
    pub fn build<D, C>(doc: &D, ctor: &C) -> Result<Self, PlanError>
    where
        D: ConfigNode,
        X: 'static,
        C: 'static,
    {
        Self::build_with(ModuleRegistry::<X, C>::global(), doc, ctor)
    }

    /// Builds a plan against an explicit registry.
    pub fn build_with<D, C>(
        registry: &ModuleRegistry<X, C>,
        doc: &D,
        ctor: &C,
    ) -> Result<Self, PlanError>
    where
        D: ConfigNode,
    {
        builder::build(registry, doc, ctor)
    }

    pub(crate) fn from_parts(
        modules: Vec<Box<dyn Module<X>>>,
        graph: DiGraph<String, ()>,
        num_channels: usize,
    ) -> Self {
        Self {
            modules,
            graph,
            num_channels,
        }
    }

    /// Number of channels (value-table slots) the plan uses.
    #[must_use]
    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    /// Number of modules in the plan.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Module ids in document order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.modules.iter().map(|m| m.id())
    }

    /// Read-only view of the dependency graph.
    ///
    /// Vertex `i` carries the id of the `i`-th module in document order; an
    /// edge `u -> v` means `v` consumes a channel `u` produces.
    #[must_use]
    pub fn dependencies(&self) -> &DiGraph<String, ()> {
        &self.graph
    }

    /// Writes the dependency graph in Graphviz DOT form.
    pub fn write_dot<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        out.write_all(dot::render_graph(&self.graph).as_bytes())
    }

    /// Deterministic root-first topological order over module indices.
    ///
    /// Kahn's algorithm with a smallest-vertex-first tie-break, so ties fall
    /// back to document order and repeated calls agree.
    pub(crate) fn topological_order(&self) -> Vec<usize> {
        let n = self.graph.node_count();
        let mut pending = self.in_degrees();
        let mut ready: BinaryHeap<Reverse<usize>> = pending
            .iter()
            .enumerate()
            .filter(|(_, &deg)| deg == 0)
            .map(|(i, _)| Reverse(i))
            .collect();

        let mut order = Vec::with_capacity(n);
        while let Some(Reverse(vertex)) = ready.pop() {
            order.push(vertex);
            for succ in self.graph.neighbors(NodeIndex::new(vertex)) {
                let succ = succ.index();
                pending[succ] -= 1;
                if pending[succ] == 0 {
                    ready.push(Reverse(succ));
                }
            }
        }
        debug_assert_eq!(order.len(), n, "plan graphs are acyclic by construction");
        order
    }

    pub(crate) fn modules_mut(&mut self) -> &mut [Box<dyn Module<X>>] {
        &mut self.modules
    }

    pub(crate) fn in_degrees(&self) -> Vec<usize> {
        (0..self.graph.node_count())
            .map(|i| {
                self.graph
                    .neighbors_directed(NodeIndex::new(i), Incoming)
                    .count()
            })
            .collect()
    }
}
