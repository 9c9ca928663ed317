// src/notebook/tags.rs

//! The cell tagging grammar.
//!
//! Recognised tags:
//! - `step:<name>`   — the cell belongs to step `<name>`
//! - `prev:<name>`   — explicit predecessor declaration for the cell's step
//! - `skip`          — ignore the cell entirely
//! - `imports`, `functions` — reserved names for shared preamble cells
//! - `pipeline-parameters`  — reserved name for parameter-declaration cells
//! - `limit:<k>:<v>`, `label:<k>:<v>`, `annotation:<k>:<v>` — step config
//!
//! Any other tag is passed through opaquely into the step's config; the
//! core never interprets it.

use std::collections::BTreeMap;

use crate::errors::{NbdagError, Result};

/// Cells whose tag is a reserved name rather than a step membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservedCell {
    /// Shared import statements, hoisted into the preamble.
    Imports,
    /// Shared function/class definitions, hoisted into the preamble.
    Functions,
    /// Declares pipeline parameters; their names become environment symbols
    /// that never need marshalling.
    PipelineParameters,
}

/// Parsed view of a single cell's tag set.
#[derive(Debug, Clone, Default)]
pub struct CellTags {
    /// Step membership, if any.
    pub step: Option<String>,
    /// Explicit predecessor names, in declaration order.
    pub prevs: Vec<String>,
    /// `skip` tag present.
    pub skip: bool,
    /// Reserved cell kind, if any.
    pub reserved: Option<ReservedCell>,
    /// `limit:<k>:<v>` entries.
    pub limits: BTreeMap<String, String>,
    /// `label:<k>:<v>` entries.
    pub labels: BTreeMap<String, String>,
    /// `annotation:<k>:<v>` entries.
    pub annotations: BTreeMap<String, String>,
    /// Unrecognised tags, passed through opaquely.
    pub raw: Vec<String>,
}

impl CellTags {
    /// Parse a cell's declared tag strings.
    ///
    /// Grammar violations that can be detected on a single cell (malformed
    /// key/value tags, conflicting step/reserved membership) are reported
    /// here; cross-cell rules live in the graph builder.
    pub fn parse(tags: &[String]) -> Result<Self> {
        let mut parsed = CellTags::default();

        for tag in tags {
            let tag = tag.trim();
            if tag.is_empty() {
                continue;
            }
            if tag == "skip" {
                parsed.skip = true;
            } else if tag == "imports" {
                parsed.set_reserved(ReservedCell::Imports)?;
            } else if tag == "functions" {
                parsed.set_reserved(ReservedCell::Functions)?;
            } else if tag == "pipeline-parameters" {
                parsed.set_reserved(ReservedCell::PipelineParameters)?;
            } else if let Some(name) = tag.strip_prefix("step:") {
                if parsed.step.is_some() {
                    return Err(NbdagError::GraphDefinition(format!(
                        "cell declares more than one step tag ('{tag}')"
                    )));
                }
                parsed.step = Some(validate_step_name(name)?);
            } else if let Some(name) = tag.strip_prefix("prev:") {
                if name.is_empty() {
                    return Err(NbdagError::GraphDefinition(
                        "'prev:' tag with empty step name".to_string(),
                    ));
                }
                parsed.prevs.push(name.to_string());
            } else if let Some(rest) = tag.strip_prefix("limit:") {
                let (k, v) = split_key_value(tag, rest)?;
                parsed.limits.insert(k, v);
            } else if let Some(rest) = tag.strip_prefix("label:") {
                let (k, v) = split_key_value(tag, rest)?;
                parsed.labels.insert(k, v);
            } else if let Some(rest) = tag.strip_prefix("annotation:") {
                let (k, v) = split_key_value(tag, rest)?;
                parsed.annotations.insert(k, v);
            } else {
                parsed.raw.push(tag.to_string());
            }
        }

        if parsed.step.is_some() && parsed.reserved.is_some() {
            return Err(NbdagError::GraphDefinition(
                "cell is tagged both as a step and as a reserved cell".to_string(),
            ));
        }
        if parsed.step.is_none() && !parsed.prevs.is_empty() {
            return Err(NbdagError::GraphDefinition(
                "'prev:' tag on a cell with no step tag".to_string(),
            ));
        }

        Ok(parsed)
    }

    fn set_reserved(&mut self, kind: ReservedCell) -> Result<()> {
        if self.reserved.is_some() {
            return Err(NbdagError::GraphDefinition(
                "cell declares more than one reserved tag".to_string(),
            ));
        }
        self.reserved = Some(kind);
        Ok(())
    }
}

/// Step names become generated Python function names, so they must be valid
/// Python identifiers.
fn validate_step_name(name: &str) -> Result<String> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if !valid {
        return Err(NbdagError::GraphDefinition(format!(
            "invalid step name '{name}': must be a valid Python identifier"
        )));
    }
    Ok(name.to_string())
}

/// Split the `<k>:<v>` remainder of a `limit:`/`label:`/`annotation:` tag.
///
/// The key may itself contain `:`-free path segments separated by `/`
/// (e.g. `limit:nvidia.com/gpu:1`), so we split on the *last* colon.
fn split_key_value(tag: &str, rest: &str) -> Result<(String, String)> {
    match rest.rsplit_once(':') {
        Some((k, v)) if !k.is_empty() && !v.is_empty() => {
            Ok((k.to_string(), v.to_string()))
        }
        _ => Err(NbdagError::GraphDefinition(format!(
            "malformed key/value tag '{tag}': expected '<kind>:<key>:<value>'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_step_and_prevs() {
        let tags = vec!["step:train".to_string(), "prev:load".to_string()];
        let parsed = CellTags::parse(&tags).unwrap();
        assert_eq!(parsed.step.as_deref(), Some("train"));
        assert_eq!(parsed.prevs, vec!["load".to_string()]);
        assert!(!parsed.skip);
    }

    #[test]
    fn limit_key_with_slash_splits_on_last_colon() {
        let tags = vec!["step:a".to_string(), "limit:nvidia.com/gpu:1".to_string()];
        let parsed = CellTags::parse(&tags).unwrap();
        assert_eq!(parsed.limits.get("nvidia.com/gpu").map(String::as_str), Some("1"));
    }

    #[test]
    fn unknown_tags_pass_through() {
        let tags = vec!["step:a".to_string(), "my-custom-tag".to_string()];
        let parsed = CellTags::parse(&tags).unwrap();
        assert_eq!(parsed.raw, vec!["my-custom-tag".to_string()]);
    }

    #[test]
    fn prev_without_step_is_an_error() {
        let tags = vec!["prev:a".to_string()];
        assert!(CellTags::parse(&tags).is_err());
    }

    #[test]
    fn invalid_step_name_is_rejected() {
        for bad in ["1abc", "a-b", "", "with space"] {
            let tags = vec![format!("step:{bad}")];
            assert!(CellTags::parse(&tags).is_err(), "accepted step name {bad:?}");
        }
    }
}
