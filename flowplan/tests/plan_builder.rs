//! End-to-end plan construction scenarios, happy path and every rejection.

mod common;

use common::*;
use flowplan::plans::{Plan, PlanError};
use serde_json::json;

#[test]
fn happy_path_builds_two_channels() {
    let registry = arithmetic_registry();
    let plan = Plan::build_with(&registry, &happy_path_doc(), &()).unwrap();

    assert_eq!(plan.num_channels(), 2);
    assert_eq!(plan.len(), 3);
    let ids: Vec<_> = plan.ids().collect();
    assert_eq!(ids, vec!["s", "a", "o"]);

    // Edges: s -> a (once, despite two bindings) and a -> o.
    let graph = plan.dependencies();
    assert_eq!(graph.edge_count(), 2);
}

#[test]
fn happy_path_dot_lists_every_vertex_and_edge() {
    let registry = arithmetic_registry();
    let plan = Plan::build_with(&registry, &happy_path_doc(), &()).unwrap();

    let mut out = Vec::new();
    plan.write_dot(&mut out).unwrap();
    let dot = String::from_utf8(out).unwrap();

    for line in ["  \"s\";", "  \"a\";", "  \"o\";", "  \"s\" -> \"a\";", "  \"a\" -> \"o\";"] {
        assert!(dot.contains(line), "missing {line:?} in:\n{dot}");
    }
}

#[test]
fn unknown_module_is_named() {
    let registry = arithmetic_registry();
    let doc = json!([
        { "id": "s", "module": "Nope", "outputs": { "seed": "x" } },
    ]);
    let err = Plan::build_with(&registry, &doc, &()).unwrap_err();
    assert!(matches!(err, PlanError::Registry(_)));
    assert!(err.to_string().contains("\"Nope\""));
}

#[test]
fn output_conflict_names_both_modules_and_the_channel() {
    let registry = arithmetic_registry();
    let doc = json!([
        { "id": "first", "module": "StartModule", "outputs": { "seed": "x" } },
        { "id": "second", "module": "StartModule", "outputs": { "seed": "x" } },
    ]);
    let err = Plan::build_with(&registry, &doc, &()).unwrap_err();
    assert!(matches!(err, PlanError::OutputConflict { .. }));
    let message = err.to_string();
    assert!(message.contains("\"first\""));
    assert!(message.contains("\"second\""));
    assert!(message.contains("\"x\""));
}

#[test]
fn dangling_input_names_argument_channel_and_module() {
    let registry = arithmetic_registry();
    let doc = json!([
        { "id": "s", "module": "StartModule", "outputs": { "seed": "x" } },
        { "id": "adder", "module": "AddModule",
          "inputs": { "a": "ghost", "b": "x" }, "outputs": { "c": "y" } },
    ]);
    let err = Plan::build_with(&registry, &doc, &()).unwrap_err();
    assert!(matches!(err, PlanError::DanglingInput { .. }));
    let message = err.to_string();
    assert!(message.contains("\"a\""));
    assert!(message.contains("\"ghost\""));
    assert!(message.contains("\"adder\""));
}

#[test]
fn self_dependency_names_the_module() {
    let registry = arithmetic_registry();
    let doc = json!([
        { "id": "loopy", "module": "ForwardModule",
          "inputs": { "value": "z" }, "outputs": { "passed": "z" } },
    ]);
    let err = Plan::build_with(&registry, &doc, &()).unwrap_err();
    assert!(matches!(err, PlanError::SelfDependency { .. }));
    assert!(err.to_string().contains("\"loopy\""));
}

#[test]
fn circular_dependency_dumps_the_residual_graph() {
    let registry = arithmetic_registry();
    let doc = json!([
        { "id": "A", "module": "ForwardModule",
          "inputs": { "value": "p" }, "outputs": { "passed": "q" } },
        { "id": "B", "module": "ForwardModule",
          "inputs": { "value": "q" }, "outputs": { "passed": "p" } },
    ]);
    let err = Plan::build_with(&registry, &doc, &()).unwrap_err();
    assert!(matches!(err, PlanError::CircularDependency { .. }));
    let message = err.to_string();
    assert!(message.contains("\"A\" -> \"B\";"));
    assert!(message.contains("\"B\" -> \"A\";"));
}

#[test]
fn cycle_report_excludes_modules_outside_the_cycle() {
    let registry = arithmetic_registry();
    // tail hangs off the A/B cycle; only the cycle is unresolvable.
    let doc = json!([
        { "id": "A", "module": "ForwardModule",
          "inputs": { "value": "p" }, "outputs": { "passed": "q" } },
        { "id": "B", "module": "ForwardModule",
          "inputs": { "value": "q" }, "outputs": { "passed": "p" } },
        { "id": "tail", "module": "OutputModule", "inputs": { "result": "q" } },
    ]);
    let err = Plan::build_with(&registry, &doc, &()).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("\"A\""));
    assert!(message.contains("\"B\""));
    assert!(!message.contains("\"tail\""));
}

#[test]
fn type_mismatch_lists_both_declared_types() {
    let registry = arithmetic_registry();
    let doc = json!([
        { "id": "w", "module": "WideStartModule", "outputs": { "wide": "x" } },
        { "id": "o", "module": "OutputModule", "inputs": { "result": "x" } },
    ]);
    let err = Plan::build_with(&registry, &doc, &()).unwrap_err();
    assert!(matches!(err, PlanError::TypeMismatch { .. }));
    let message = err.to_string();
    assert!(message.contains("i64"));
    assert!(message.contains("i128"));
    assert!(message.contains("\"x\""));
    assert!(message.contains("\"w\""));
}

#[test]
fn cardinality_mismatch_counts_inputs() {
    let registry = arithmetic_registry();
    let doc = json!([
        { "id": "s", "module": "StartModule", "outputs": { "seed": "x" } },
        { "id": "a", "module": "AddModule",
          "inputs": { "a": "x" }, "outputs": { "c": "y" } },
    ]);
    let err = Plan::build_with(&registry, &doc, &()).unwrap_err();
    assert!(matches!(
        err,
        PlanError::InconsistentCardinality { expected: 2, found: 1, .. }
    ));
    assert!(err.to_string().contains("\"a\""));
}

#[test]
fn cardinality_mismatch_counts_outputs() {
    let registry = arithmetic_registry();
    let doc = json!([
        { "id": "s", "module": "StartModule",
          "outputs": { "seed": "x", "bonus": "y" } },
    ]);
    let err = Plan::build_with(&registry, &doc, &()).unwrap_err();
    assert!(matches!(
        err,
        PlanError::InconsistentCardinality { expected: 1, found: 2, .. }
    ));
}

#[test]
fn missing_config_names_the_unbound_argument() {
    let registry = arithmetic_registry();
    // Right count, wrong name: "b" is declared but never bound.
    let doc = json!([
        { "id": "s", "module": "StartModule", "outputs": { "seed": "x" } },
        { "id": "a", "module": "AddModule",
          "inputs": { "a": "x", "wrong": "x" }, "outputs": { "c": "y" } },
    ]);
    let err = Plan::build_with(&registry, &doc, &()).unwrap_err();
    assert!(matches!(err, PlanError::MissingConfig { .. }));
    let message = err.to_string();
    assert!(message.contains("\"b\""));
    assert!(message.contains("\"a\""));
}

#[test]
fn duplicate_ids_are_rejected() {
    let registry = arithmetic_registry();
    let doc = json!([
        { "id": "twin", "module": "StartModule", "outputs": { "seed": "x" } },
        { "id": "twin", "module": "OutputModule", "inputs": { "result": "x" } },
    ]);
    let err = Plan::build_with(&registry, &doc, &()).unwrap_err();
    assert!(matches!(err, PlanError::DuplicateModuleId { .. }));
    assert!(err.to_string().contains("\"twin\""));
}

#[test]
fn malformed_document_is_a_config_error() {
    let registry = arithmetic_registry();
    let doc = json!({ "not": "a list" });
    let err = Plan::build_with(&registry, &doc, &()).unwrap_err();
    assert!(matches!(err, PlanError::Config(_)));
}

#[test]
fn slot_indices_follow_output_discovery_order() {
    let registry = arithmetic_registry();
    let doc = json!([
        { "id": "s1", "module": "StartModule", "outputs": { "seed": "first" } },
        { "id": "s2", "module": "StartModule", "outputs": { "seed": "second" } },
        { "id": "f", "module": "ForwardModule",
          "inputs": { "value": "first" }, "outputs": { "passed": "third" } },
    ]);
    let plan = Plan::build_with(&registry, &doc, &()).unwrap();
    assert_eq!(plan.num_channels(), 3);

    // Running proves the assignment: s1 writes slot 0, s2 slot 1, f slot 2.
    let mut scheduler = flowplan::schedulers::BlockingScheduler::new(plan);
    let mut log = String::new();
    let slots = scheduler.run(&mut log).unwrap();
    assert_eq!(slots.get::<i64>(0).unwrap(), 3);
    assert_eq!(slots.get::<i64>(1).unwrap(), 3);
    assert_eq!(slots.get::<i64>(2).unwrap(), 4);
}

#[test]
fn build_is_deterministic_across_runs() {
    let registry = arithmetic_registry();
    let first = Plan::build_with(&registry, &happy_path_doc(), &()).unwrap();
    let second = Plan::build_with(&registry, &happy_path_doc(), &()).unwrap();

    assert_eq!(first.ids().collect::<Vec<_>>(), second.ids().collect::<Vec<_>>());
    assert_eq!(first.num_channels(), second.num_channels());

    let mut dot_first = Vec::new();
    let mut dot_second = Vec::new();
    first.write_dot(&mut dot_first).unwrap();
    second.write_dot(&mut dot_second).unwrap();
    assert_eq!(dot_first, dot_second);
}
