//! Tests for completion signal detection

use super::{is_completion_signal, CompletionSignalDetector, SignalRules};

#[test]
fn test_builtin_rules_compile() {
    let detector = CompletionSignalDetector::new(SignalRules::default()).unwrap();
    assert_eq!(detector.rules(), CompletionSignalDetector::default().rules());
}

#[test]
fn test_exact_keyword_is_signal() {
    for keyword in ["PLAN_DONE", "IMPLEMENTATION_COMPLETE", "READY", "ALL-TESTS-PASS"] {
        assert!(
            is_completion_signal(keyword, keyword),
            "{keyword} should signal itself"
        );
    }
}

#[test]
fn test_surrounding_whitespace_ignored() {
    assert!(is_completion_signal("   PLAN_DONE  \r", "PLAN_DONE"));
}

#[test]
fn test_status_marker_prefix_accepted() {
    assert!(is_completion_signal("⏺ PLAN_DONE", "PLAN_DONE"));
    assert!(is_completion_signal("⏺PLAN_DONE", "PLAN_DONE"));
    assert!(is_completion_signal("  ● PLAN_DONE", "PLAN_DONE"));
}

#[test]
fn test_status_marker_with_short_gap_accepted() {
    // Up to nine characters (the space included) between marker and keyword.
    assert!(is_completion_signal("⏺ **PLAN_DONE", "PLAN_DONE"));
    assert!(is_completion_signal("⏺ 12345678PLAN_DONE", "PLAN_DONE"));
    assert!(!is_completion_signal("⏺ 123456789PLAN_DONE", "PLAN_DONE"));
}

#[test]
fn test_keyword_inside_prose_rejected() {
    assert!(!is_completion_signal("Then say PLAN_DONE when done", "PLAN_DONE"));
    assert!(!is_completion_signal("When finished, SAY PLAN_DONE", "PLAN_DONE"));
    assert!(!is_completion_signal("The plan is PLAN_DONE ready", "PLAN_DONE"));
    assert!(!is_completion_signal("PLAN_DONE is what I print later", "PLAN_DONE"));
}

#[test]
fn test_instruction_vocabulary_rejected() {
    let keyword = "BUILD_DONE";
    let mentions = [
        "Reply with BUILD_DONE",
        "Finish and BUILD_DONE",
        "Signal using BUILD_DONE",
        "type BUILD_DONE",
        "Document the result, BUILD_DONE",
        "signal completion: BUILD_DONE",
        "Execute step 2 then BUILD_DONE",
        "Step 3: BUILD_DONE",
        "execute it and print BUILD_DONE",
        "plan: BUILD_DONE",
        "Update the todo list BUILD_DONE",
        "Create BUILD_DONE",
        "Analyze BUILD_DONE",
        "Let me print BUILD_DONE",
        "I need to say it BUILD_DONE",
        "I will print BUILD_DONE",
        "I should BUILD_DONE",
        "Finish: Say BUILD_DONE",
        "Finish. Say BUILD_DONE",
    ];
    for line in mentions {
        assert!(!is_completion_signal(line, keyword), "accepted: {line}");
    }
}

#[test]
fn test_mention_rejected_even_with_marker() {
    assert!(!is_completion_signal("⏺ I will BUILD_DONE", "BUILD_DONE"));
    assert!(!is_completion_signal("⏺ Let me BUILD_DONE", "BUILD_DONE"));
}

#[test]
fn test_structural_lines_rejected() {
    assert!(!is_completion_signal("│ > BUILD_DONE │", "BUILD_DONE"));
    assert!(!is_completion_signal("  ⎿ ☐ BUILD_DONE", "BUILD_DONE"));
    assert!(!is_completion_signal("- [ ] BUILD_DONE", "BUILD_DONE"));
    assert!(!is_completion_signal("* BUILD_DONE", "BUILD_DONE"));
}

#[test]
fn test_numbered_list_rejected() {
    assert!(!is_completion_signal("1. BUILD_DONE", "BUILD_DONE"));
    assert!(!is_completion_signal("  12.BUILD_DONE", "BUILD_DONE"));
}

#[test]
fn test_colon_keyword_accepts_trailing_value() {
    assert!(is_completion_signal("STATUS:", "STATUS:"));
    assert!(is_completion_signal("STATUS:green", "STATUS:"));
    assert!(is_completion_signal("⏺ STATUS:42/42", "STATUS:"));
    assert!(!is_completion_signal("STATUS: green", "STATUS:"));
    assert!(!is_completion_signal("Current STATUS:green", "STATUS:"));
}

#[test]
fn test_no_occurrence_rejected() {
    assert!(!is_completion_signal("", "DONE"));
    assert!(!is_completion_signal("⏺", "DONE"));
    assert!(!is_completion_signal("DONE", ""));
}

#[test]
fn test_find_last_signal_skips_mentions() {
    let detector = CompletionSignalDetector::default();
    let text = "Then say DONE when finished\nworking...\n⏺ DONE\nI will say DONE again";
    let offset = detector.find_last_signal(text, "DONE").unwrap();
    assert_eq!(&text[offset..offset + 4], "DONE");
    assert_eq!(offset, text.find("⏺ DONE").unwrap() + "⏺ ".len());
}

#[test]
fn test_find_last_signal_prefers_latest_occurrence() {
    let detector = CompletionSignalDetector::default();
    let text = "DONE\nmore output\nDONE\n";
    assert_eq!(detector.find_last_signal(text, "DONE"), Some(17));
    assert_eq!(detector.find_last_signal("no signal here", "DONE"), None);
    assert_eq!(detector.find_last_signal("", "DONE"), None);
}

#[test]
fn test_custom_rules_from_toml() {
    let rules = SignalRules::from_toml(
        r#"
        mention_phrases = ["echo {keyword}"]
        status_markers = ["[ok]"]
        max_marker_gap = 2
        "#,
    )
    .unwrap();

    // Untouched fields keep their defaults.
    assert_eq!(rules.numbered_item_pattern, r"^\d+\.");
    assert_eq!(rules.mention_phrases_ignore_case, vec!["say {keyword}"]);

    let detector = CompletionSignalDetector::new(rules).unwrap();
    assert!(detector.is_completion_signal("[ok] DONE", "DONE"));
    assert!(!detector.is_completion_signal("⏺ DONE", "DONE"));
    assert!(!detector.is_completion_signal("echo DONE", "DONE"));
    // "Let me" is no longer a mention phrase, but the line is still not the keyword.
    assert!(!detector.is_completion_signal("Let me DONE", "DONE"));
}

#[test]
fn test_invalid_numbered_pattern_rejected() {
    let rules = SignalRules {
        numbered_item_pattern: "(".to_string(),
        ..SignalRules::default()
    };
    assert!(CompletionSignalDetector::new(rules).is_err());
}

#[test]
fn test_rules_load_and_resolve() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("signals.toml");
    std::fs::write(&path, "max_marker_gap = 0\n").unwrap();

    let rules = SignalRules::resolve(Some(&path)).unwrap();
    assert_eq!(rules.max_marker_gap, 0);

    assert!(SignalRules::load(&dir.path().join("missing.toml")).is_err());
    std::fs::write(&path, "max_marker_gap = \"many\"\n").unwrap();
    assert!(SignalRules::load(&path).is_err());
}
