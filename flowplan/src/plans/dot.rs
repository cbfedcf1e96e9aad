//! Graphviz DOT emission for dependency graphs.
//!
//! The format is deliberately plain so the output greps well: one quoted id
//! per vertex, one `"u" -> "v";` line per edge. The same renderer serves
//! [`Plan::write_dot`](super::Plan::write_dot) and the residual-graph dump
//! inside [`PlanError::CircularDependency`](super::PlanError).

use petgraph::graph::DiGraph;
use petgraph::stable_graph::StableDiGraph;
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use std::fmt::Write;

/// Renders vertex ids and edges into DOT.
fn render<'a>(
    vertices: impl Iterator<Item = &'a str>,
    edges: impl Iterator<Item = (&'a str, &'a str)>,
) -> String {
    let mut out = String::from("digraph G {\n");
    for id in vertices {
        writeln!(out, "  \"{id}\";").expect("writing to a String");
    }
    for (from, to) in edges {
        writeln!(out, "  \"{from}\" -> \"{to}\";").expect("writing to a String");
    }
    out.push_str("}\n");
    out
}

pub(crate) fn render_graph(graph: &DiGraph<String, ()>) -> String {
    render(
        graph.node_indices().map(|v| graph[v].as_str()),
        graph
            .edge_references()
            .map(|e| (graph[e.source()].as_str(), graph[e.target()].as_str())),
    )
}

pub(crate) fn render_residual(graph: &StableDiGraph<String, ()>) -> String {
    render(
        graph.node_indices().map(|v| graph[v].as_str()),
        graph
            .edge_references()
            .map(|e| (graph[e.source()].as_str(), graph[e.target()].as_str())),
    )
}
