//! Tests for workflow definitions and chain validation

use crate::error::ChainError;

use super::{
    validate_links, ChainLink, WorkflowChain, WorkflowDefinition, WorkflowOptions,
};

fn link(keyword: &str, instruction: &str, next: Option<&str>) -> ChainLink {
    ChainLink {
        keyword: keyword.to_string(),
        instruction: instruction.to_string(),
        next_keyword: next.map(str::to_string),
    }
}

fn three_stage_links() -> Vec<ChainLink> {
    vec![
        link("PLAN_DONE", "Implement the plan for {{TASK}}", Some("IMPL_DONE")),
        link("IMPL_DONE", "Run the tests", Some("TESTS_DONE")),
        link("TESTS_DONE", "Write a summary", None),
    ]
}

fn definition() -> WorkflowDefinition {
    WorkflowDefinition {
        instance_id: Some("demo".to_string()),
        task_description: None,
        chains: three_stage_links(),
        initial_prompt: "Plan {{TASK}}. Say PLAN_DONE when finished.".to_string(),
        options: WorkflowOptions::default(),
    }
}

fn messages(links: &[ChainLink]) -> Vec<String> {
    validate_links(links).into_iter().map(|e| e.to_string()).collect()
}

#[test]
fn test_valid_chain_has_no_errors() {
    assert!(validate_links(&three_stage_links()).is_empty());
}

#[test]
fn test_single_terminal_stage_is_valid() {
    assert!(validate_links(&[link("DONE", "Wrap up", None)]).is_empty());
}

#[test]
fn test_empty_chain_rejected() {
    assert_eq!(messages(&[]), vec!["No stages defined".to_string()]);
}

#[test]
fn test_missing_keyword_and_instruction() {
    let errors = messages(&[link("  ", "do it", Some("B")), link("B", "", None)]);
    assert!(errors.iter().any(|e| e.contains("Stage 0: keyword cannot be empty")));
    assert!(errors
        .iter()
        .any(|e| e == "Keyword 'B': instruction cannot be empty"));
}

#[test]
fn test_broken_link_rejected() {
    let errors = messages(&[link("A", "a", Some("MISSING")), link("B", "b", None)]);
    assert!(errors
        .iter()
        .any(|e| e.contains("nextKeyword 'MISSING' does not match any stage")));
    assert!(errors
        .iter()
        .any(|e| e.contains("'B': stage is not reachable")));
}

#[test]
fn test_backward_link_rejected() {
    let errors = messages(&[
        link("A", "a", Some("B")),
        link("B", "b", Some("A")),
        link("C", "c", None),
    ]);
    assert!(errors.iter().any(|e| e.contains("points backwards")));
}

#[test]
fn test_non_terminal_without_next_rejected() {
    let errors = messages(&[link("A", "a", None), link("B", "b", None)]);
    assert!(errors
        .iter()
        .any(|e| e == "Keyword 'A': only the final stage may omit nextKeyword"));
}

#[test]
fn test_terminal_with_next_rejected() {
    let errors = messages(&[link("A", "a", Some("B")), link("B", "b", Some("A"))]);
    assert!(errors
        .iter()
        .any(|e| e.contains("final stage must not declare nextKeyword")));
}

#[test]
fn test_branch_rejected() {
    let errors = messages(&[
        link("A", "a", Some("C")),
        link("B", "b", Some("C")),
        link("C", "c", None),
    ]);
    assert!(errors
        .iter()
        .any(|e| e == "Keyword 'C': stage is the target of more than one nextKeyword"));
    assert!(errors
        .iter()
        .any(|e| e == "Keyword 'B': stage is not reachable from the first stage"));
}

#[test]
fn test_duplicate_keyword_reported_once() {
    let errors = messages(&[
        link("A", "a", Some("B")),
        link("B", "b", Some("B")),
        link("B", "c", None),
    ]);
    let duplicates = errors
        .iter()
        .filter(|e| e.contains("used by more than one stage"))
        .count();
    assert_eq!(duplicates, 1);
}

#[test]
fn test_definition_options_validated() {
    let mut def = definition();
    def.options = WorkflowOptions {
        poll_interval: 0,
        timeout: 0,
        retry_attempts: 0,
        retry_delay: 0,
    };

    match def.validate() {
        Err(ChainError::Configuration(errors)) => assert_eq!(errors.len(), 3),
        other => panic!("Expected configuration error, got {other:?}"),
    }
}

#[test]
fn test_initial_prompt_requires_placeholder() {
    let mut def = definition();
    def.initial_prompt = "Start working".to_string();
    let err = def.validate().unwrap_err();
    assert!(err.to_string().contains("{{TASK}}"));
}

#[test]
fn test_instantiate_substitutes_task_everywhere() {
    let def = definition();
    let chain = def.instantiate("the login page").unwrap();

    assert_eq!(
        chain.initial_prompt(),
        Some("Plan the login page. Say PLAN_DONE when finished.")
    );
    assert_eq!(
        chain.stage(0).unwrap().instruction,
        "Implement the plan for the login page"
    );
    // The definition stays a template.
    assert!(def.chains[0].instruction.contains("{{TASK}}"));
}

#[test]
fn test_chain_lookup() {
    let chain = WorkflowChain::new(three_stage_links()).unwrap();
    assert_eq!(chain.len(), 3);
    assert!(!chain.is_empty());
    assert_eq!(chain.first_keyword(), "PLAN_DONE");
    assert_eq!(chain.index_of("TESTS_DONE"), Some(2));
    assert_eq!(chain.index_of("NOPE"), None);
    assert_eq!(chain.stage(2).unwrap().next_keyword, None);
    assert_eq!(
        chain.stage(0).unwrap().next_keyword.as_deref(),
        Some("IMPL_DONE")
    );
    assert_eq!(chain.initial_prompt(), None);
}

#[test]
fn test_chain_new_rejects_invalid_links() {
    let result = WorkflowChain::new(vec![link("A", "a", Some("B"))]);
    assert!(matches!(result, Err(ChainError::Configuration(_))));
}

#[test]
fn test_parse_camel_case_document() {
    let json = r#"{
        "instanceId": "feature-42",
        "taskDescription": "Add dark mode",
        "chains": [
            { "keyword": "PLAN_DONE", "instruction": "Build it", "nextKeyword": "BUILD_DONE" },
            { "keyword": "BUILD_DONE", "instruction": "Review it" }
        ],
        "initialPrompt": "Plan {{TASK}}",
        "options": { "pollInterval": 2, "timeout": 600 }
    }"#;

    let def = WorkflowDefinition::from_json(json).unwrap();
    assert_eq!(def.instance_id.as_deref(), Some("feature-42"));
    assert_eq!(def.chains.len(), 2);
    assert_eq!(def.chains[0].next_keyword.as_deref(), Some("BUILD_DONE"));
    assert_eq!(def.chains[1].next_keyword, None);
    assert_eq!(def.options.poll_interval, 2);
    assert_eq!(def.options.timeout, 600);
    // Unspecified options fall back to defaults.
    assert_eq!(def.options.retry_attempts, 3);
    assert_eq!(def.options.retry_delay, 2);
    assert!(def.validate().is_ok());
}

#[test]
fn test_parse_rejects_missing_chains() {
    assert!(WorkflowDefinition::from_json(r#"{"initialPrompt": "x"}"#).is_err());
}

#[test]
fn test_load_from_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("workflow.json");
    std::fs::write(&path, serde_json::to_string_pretty(&definition()).unwrap()).unwrap();

    let loaded = WorkflowDefinition::load(&path).unwrap();
    assert_eq!(loaded, definition());

    let missing = WorkflowDefinition::load(&dir.path().join("nope.json"));
    assert!(missing.is_err());
}
