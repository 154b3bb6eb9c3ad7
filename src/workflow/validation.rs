//! Workflow definition validation

use std::collections::HashMap;

use super::types::{ChainLink, ValidationError, WorkflowDefinition, TASK_PLACEHOLDER};

/// Validate a whole workflow document: links, options and initial prompt.
pub fn validate(definition: &WorkflowDefinition) -> Result<(), Vec<ValidationError>> {
    let mut errors = validate_links(&definition.chains);

    let options = &definition.options;
    if options.poll_interval == 0 {
        errors.push(ValidationError::global(
            "options.pollInterval must be at least 1 second",
        ));
    }
    if options.timeout == 0 {
        errors.push(ValidationError::global(
            "options.timeout must be at least 1 second",
        ));
    }
    if options.retry_attempts == 0 {
        errors.push(ValidationError::global(
            "options.retryAttempts must be at least 1",
        ));
    }

    if definition.initial_prompt.trim().is_empty() {
        errors.push(ValidationError::global("initialPrompt cannot be empty"));
    } else if !definition.initial_prompt.contains(TASK_PLACEHOLDER) {
        errors.push(ValidationError::global(format!(
            "initialPrompt must contain the {TASK_PLACEHOLDER} placeholder"
        )));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate the keyword linkage of a chain.
///
/// The chain must be a single forward path: every link except the last names
/// a `nextKeyword` that is the trigger of exactly one later link, no link is
/// the target of two others, and the last link names nothing.
pub fn validate_links(links: &[ChainLink]) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if links.is_empty() {
        errors.push(ValidationError::global("No stages defined"));
        return errors;
    }

    let mut positions: HashMap<&str, Vec<usize>> = HashMap::new();
    for (index, link) in links.iter().enumerate() {
        positions.entry(link.keyword.as_str()).or_default().push(index);
    }

    for (index, link) in links.iter().enumerate() {
        if link.keyword.trim().is_empty() {
            errors.push(ValidationError::global(format!(
                "Stage {index}: keyword cannot be empty"
            )));
            continue;
        }
        if link.keyword.contains(['\n', '\r']) {
            errors.push(ValidationError::at(
                &link.keyword,
                "keyword must fit on a single line",
            ));
        }
        if link.instruction.trim().is_empty() {
            errors.push(ValidationError::at(
                &link.keyword,
                "instruction cannot be empty",
            ));
        }
        let owners = positions
            .get(link.keyword.as_str())
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        if owners.len() > 1 && owners[0] == index {
            errors.push(ValidationError::at(
                &link.keyword,
                "keyword is used by more than one stage",
            ));
        }
    }

    let last = links.len() - 1;
    let mut incoming = vec![0usize; links.len()];

    for (index, link) in links.iter().enumerate() {
        match (&link.next_keyword, index == last) {
            (None, true) => {}
            (Some(next), true) => errors.push(ValidationError::at(
                &link.keyword,
                format!("final stage must not declare nextKeyword (found '{next}')"),
            )),
            (None, false) => errors.push(ValidationError::at(
                &link.keyword,
                "only the final stage may omit nextKeyword",
            )),
            (Some(next), false) => {
                let targets = positions.get(next.as_str()).map(Vec::as_slice).unwrap_or(&[]);
                let later: Vec<usize> = targets.iter().copied().filter(|&t| t > index).collect();
                match later.as_slice() {
                    [target] => incoming[*target] += 1,
                    [] if targets.is_empty() => errors.push(ValidationError::at(
                        &link.keyword,
                        format!("nextKeyword '{next}' does not match any stage"),
                    )),
                    [] => errors.push(ValidationError::at(
                        &link.keyword,
                        format!("nextKeyword '{next}' points backwards and would form a cycle"),
                    )),
                    // Duplicate triggers are already reported above.
                    _ => {}
                }
            }
        }
    }

    for (index, count) in incoming.iter().enumerate().skip(1) {
        let keyword = &links[index].keyword;
        if keyword.trim().is_empty() {
            continue;
        }
        match count {
            0 => errors.push(ValidationError::at(
                keyword,
                "stage is not reachable from the first stage",
            )),
            1 => {}
            _ => errors.push(ValidationError::at(
                keyword,
                "stage is the target of more than one nextKeyword",
            )),
        }
    }

    errors
}
