//! Two-pass plan construction plus the cycle check.
//!
//! Pass 1 walks the document in order: looks up each entry's factory, checks
//! binding cardinality against the signature, instantiates the module as a
//! graph vertex, and catalogues every output channel with a dense slot index
//! assigned in discovery order. Pass 2 walks the same order again: builds each
//! module's name-to-slot map, verifies input bindings (existence, type token
//! equality, no self-loops), adds set-semantics dependency edges, and calls
//! `resolve`. A sink-removal sweep then proves the graph acyclic; whatever
//! survives the sweep is the unresolvable core and is dumped in DOT form.

use crate::config::{self, ConfigNode, RawEntry};
use crate::module::Module;
use crate::registry::ModuleRegistry;
use crate::signature::{find_arg, input_count, output_count, ArgSpec, Direction};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::stable_graph::StableDiGraph;
use petgraph::Direction::Outgoing;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, instrument};

use super::{dot, Plan, PlanError};

/// Producer-side record of one catalogued channel.
struct OutputInfo<'s> {
    producer: NodeIndex,
    slot: usize,
    spec: &'s ArgSpec,
}

#[instrument(level = "debug", skip_all)]
pub(crate) fn build<X, C, D>(
    registry: &ModuleRegistry<X, C>,
    doc: &D,
    ctor: &C,
) -> Result<Plan<X>, PlanError>
where
    D: ConfigNode,
{
    let entries = config::parse_entries(doc)?;

    // Pass 1: instantiate modules, catalogue outputs.
    let mut graph: DiGraph<String, ()> = DiGraph::with_capacity(entries.len(), entries.len());
    let mut modules: Vec<Box<dyn Module<X>>> = Vec::with_capacity(entries.len());
    let mut signatures: Vec<&'static [ArgSpec]> = Vec::with_capacity(entries.len());
    let mut outputs: FxHashMap<&str, OutputInfo<'static>> = FxHashMap::default();
    let mut seen_ids: FxHashSet<&str> = FxHashSet::default();

    for entry in &entries {
        if !seen_ids.insert(entry.id) {
            return Err(PlanError::DuplicateModuleId {
                id: entry.id.to_owned(),
            });
        }
        let factory = registry.find(entry.module)?;
        let signature = factory.signature();
        check_bindings(entry, signature)?;

        let vertex = graph.add_node(entry.id.to_owned());
        modules.push(factory.create(entry.id, ctor));
        signatures.push(signature);

        for &(local, global) in &entry.outputs {
            let slot = outputs.len();
            if let Some(previous) = outputs.get(global) {
                return Err(PlanError::OutputConflict {
                    channel: global.to_owned(),
                    first: graph[previous.producer].clone(),
                    second: entry.id.to_owned(),
                });
            }
            let spec = find_arg(signature, local)
                .expect("cardinality check guarantees every bound name is declared");
            outputs.insert(
                global,
                OutputInfo {
                    producer: vertex,
                    slot,
                    spec,
                },
            );
        }
    }
    let num_channels = outputs.len();

    // Pass 2: bind inputs, build index tables, add edges.
    for (index, entry) in entries.iter().enumerate() {
        let vertex = NodeIndex::new(index);
        let signature = signatures[index];
        let mut name_to_slot: FxHashMap<String, usize> = FxHashMap::default();

        for &(local, global) in &entry.outputs {
            let info = &outputs[global];
            name_to_slot.insert(local.to_owned(), info.slot);
        }

        for &(local, global) in &entry.inputs {
            let Some(info) = outputs.get(global) else {
                return Err(PlanError::DanglingInput {
                    module: entry.id.to_owned(),
                    input: local.to_owned(),
                    channel: global.to_owned(),
                });
            };
            name_to_slot.insert(local.to_owned(), info.slot);

            let input = find_arg(signature, local)
                .expect("cardinality check guarantees every bound name is declared");
            if input.token() != info.spec.token() {
                return Err(PlanError::TypeMismatch {
                    module: entry.id.to_owned(),
                    input: local.to_owned(),
                    channel: global.to_owned(),
                    expected: input.type_name(),
                    producer: graph[info.producer].clone(),
                    found: info.spec.type_name(),
                });
            }
            if info.producer == vertex {
                return Err(PlanError::SelfDependency {
                    module: entry.id.to_owned(),
                    channel: global.to_owned(),
                });
            }
            // Set semantics: several inputs from one producer stay one edge.
            graph.update_edge(info.producer, vertex, ());
        }

        modules[index].resolve(&name_to_slot)?;
    }

    check_cycles(&graph)?;

    debug!(
        modules = modules.len(),
        channels = num_channels,
        edges = graph.edge_count(),
        "plan built"
    );
    Ok(Plan::from_parts(modules, graph, num_channels))
}

/// Cardinality and coverage of one entry's binding blocks.
fn check_bindings(entry: &RawEntry<'_>, signature: &[ArgSpec]) -> Result<(), PlanError> {
    let expected_in = input_count(signature);
    let expected_out = output_count(signature);
    if entry.inputs.len() != expected_in {
        return Err(PlanError::InconsistentCardinality {
            module: entry.id.to_owned(),
            direction: Direction::In,
            expected: expected_in,
            found: entry.inputs.len(),
        });
    }
    if entry.outputs.len() != expected_out {
        return Err(PlanError::InconsistentCardinality {
            module: entry.id.to_owned(),
            direction: Direction::Out,
            expected: expected_out,
            found: entry.outputs.len(),
        });
    }
    for arg in signature {
        let block = match arg.direction() {
            Direction::In => &entry.inputs,
            Direction::Out => &entry.outputs,
        };
        if !block.iter().any(|(local, _)| *local == arg.name()) {
            return Err(PlanError::MissingConfig {
                module: entry.id.to_owned(),
                arg: arg.name().to_owned(),
            });
        }
    }
    Ok(())
}

/// Sink-removal acyclicity proof.
///
/// Repeatedly deletes a vertex with no outgoing edges; if none exists while
/// vertices remain, the leftovers all participate in cycles and are reported
/// in DOT form.
fn check_cycles(graph: &DiGraph<String, ()>) -> Result<(), PlanError> {
    let mut residual: StableDiGraph<String, ()> = StableDiGraph::from(graph.clone());
    while residual.node_count() > 0 {
        let sink = residual
            .node_indices()
            .find(|&v| residual.neighbors_directed(v, Outgoing).next().is_none());
        match sink {
            Some(v) => {
                residual.remove_node(v);
            }
            None => {
                return Err(PlanError::CircularDependency {
                    dot: dot::render_residual(&residual),
                });
            }
        }
    }
    Ok(())
}
