// tests/builder_grammar.rs

//! Tagging-grammar rules enforced by the step graph builder.

use nbdag::errors::NbdagError;
use nbdag::graph::build;
use nbdag_test_utils::builders::NotebookBuilder;

#[test]
fn consecutive_cells_with_same_step_tag_merge() {
    let notebook = NotebookBuilder::new()
        .step("a", &[], "x = 1")
        .step("a", &[], "y = x + 1")
        .build();

    let pipeline = build(&notebook).unwrap();
    assert_eq!(pipeline.steps.len(), 1);
    let step = &pipeline.steps["a"];
    assert_eq!(step.source, vec!["x = 1".to_string(), "y = x + 1".to_string()]);
    assert_eq!(step.merged_source(), "x = 1\ny = x + 1");
}

#[test]
fn skip_cells_are_dropped() {
    let notebook = NotebookBuilder::new()
        .cell(&["skip"], "this is not even python (")
        .step("a", &[], "x = 1")
        .build();

    let pipeline = build(&notebook).unwrap();
    assert_eq!(pipeline.steps.len(), 1);
    assert!(pipeline.imports_and_functions.is_empty());
}

#[test]
fn untagged_cells_before_steps_join_the_preamble() {
    let notebook = NotebookBuilder::new()
        .preamble("import math")
        .preamble("def helper():\n    return 1")
        .step("a", &[], "x = helper()")
        .build();

    let pipeline = build(&notebook).unwrap();
    assert_eq!(pipeline.imports_and_functions.len(), 2);
    assert_eq!(pipeline.preamble(), "import math\ndef helper():\n    return 1");
}

#[test]
fn untagged_cell_after_steps_is_an_orphan() {
    let notebook = NotebookBuilder::new()
        .step("a", &[], "x = 1")
        .preamble("y = 2")
        .build();

    match build(&notebook) {
        Err(NbdagError::GraphDefinition(msg)) => {
            assert!(msg.contains("no step tag"), "unexpected message: {msg}");
        }
        other => panic!("expected GraphDefinition error, got {other:?}"),
    }
}

#[test]
fn imports_cells_join_the_preamble_anywhere() {
    let notebook = NotebookBuilder::new()
        .step("a", &[], "x = 1")
        .cell(&["imports"], "import json")
        .step("b", &[], "y = x + 1")
        .build();

    let pipeline = build(&notebook).unwrap();
    assert_eq!(pipeline.imports_and_functions, vec!["import json".to_string()]);
    assert_eq!(pipeline.steps.len(), 2);
}

#[test]
fn later_step_without_prev_depends_on_previous_step() {
    let notebook = NotebookBuilder::new()
        .step("a", &[], "x = 1")
        .step("b", &[], "y = 2")
        .step("c", &[], "z = 3")
        .build();

    let pipeline = build(&notebook).unwrap();
    assert!(pipeline.steps["a"].dependencies.is_empty());
    assert_eq!(pipeline.steps["b"].dependencies, vec!["a".to_string()]);
    assert_eq!(pipeline.steps["c"].dependencies, vec!["b".to_string()]);
}

#[test]
fn explicit_prevs_override_the_implicit_chain() {
    let notebook = NotebookBuilder::new()
        .step("a", &[], "x = 1")
        .step("b", &[], "y = 2")
        .step("c", &["a"], "z = 3")
        .build();

    let pipeline = build(&notebook).unwrap();
    assert_eq!(pipeline.steps["c"].dependencies, vec!["a".to_string()]);
}

#[test]
fn unknown_predecessor_is_rejected() {
    let notebook = NotebookBuilder::new()
        .step("a", &[], "x = 1")
        .step("b", &["nonexistent"], "y = 2")
        .build();

    match build(&notebook) {
        Err(NbdagError::GraphDefinition(msg)) => {
            assert!(msg.contains("nonexistent"), "unexpected message: {msg}");
            assert!(msg.contains("b"), "unexpected message: {msg}");
        }
        other => panic!("expected GraphDefinition error, got {other:?}"),
    }
}

#[test]
fn forward_predecessor_reference_is_rejected() {
    // `prev` must name an already-declared step.
    let notebook = NotebookBuilder::new()
        .step("a", &["b"], "x = 1")
        .step("b", &[], "y = 2")
        .build();

    assert!(matches!(
        build(&notebook),
        Err(NbdagError::GraphDefinition(_))
    ));
}

#[test]
fn self_predecessor_is_rejected() {
    let notebook = NotebookBuilder::new().step("a", &["a"], "x = 1").build();
    match build(&notebook) {
        Err(NbdagError::GraphDefinition(msg)) => {
            assert!(msg.contains("itself"), "unexpected message: {msg}");
        }
        other => panic!("expected GraphDefinition error, got {other:?}"),
    }
}

#[test]
fn non_consecutive_step_redeclaration_is_rejected() {
    let notebook = NotebookBuilder::new()
        .step("a", &[], "x = 1")
        .step("b", &[], "y = 2")
        .step("a", &[], "z = 3")
        .build();

    match build(&notebook) {
        Err(NbdagError::GraphDefinition(msg)) => {
            assert!(msg.contains("contiguous"), "unexpected message: {msg}");
        }
        other => panic!("expected GraphDefinition error, got {other:?}"),
    }
}

#[test]
fn notebook_without_steps_is_rejected() {
    let notebook = NotebookBuilder::new().preamble("import os").build();
    assert!(matches!(
        build(&notebook),
        Err(NbdagError::GraphDefinition(_))
    ));
}

#[test]
fn config_tags_populate_step_config() {
    let notebook = NotebookBuilder::new()
        .cell(
            &[
                "step:train",
                "limit:nvidia.com/gpu:1",
                "label:team:ml",
                "annotation:owner:alice",
                "experimental-cache",
            ],
            "x = 1",
        )
        .build();

    let pipeline = build(&notebook).unwrap();
    let config = &pipeline.steps["train"].config;
    assert_eq!(config.limits.get("nvidia.com/gpu").map(String::as_str), Some("1"));
    assert_eq!(config.labels.get("team").map(String::as_str), Some("ml"));
    assert_eq!(config.annotations.get("owner").map(String::as_str), Some("alice"));
    assert_eq!(config.raw_tags, vec!["experimental-cache".to_string()]);
}

#[test]
fn pipeline_parameters_cell_declares_environment_symbols() {
    let notebook = NotebookBuilder::new()
        .cell(&["pipeline-parameters"], "lr = 0.1\nepochs = 10")
        .step("a", &[], "train(lr, epochs)")
        .build();

    let pipeline = build(&notebook).unwrap();
    assert!(pipeline.config.parameters.contains("lr"));
    assert!(pipeline.config.parameters.contains("epochs"));
    // Parameter defaults stay available in the preamble.
    assert!(pipeline.preamble().contains("lr = 0.1"));
}
