// src/analysis/magics.rs

//! Source preprocessing: interactive-shell directives and indentation.
//!
//! Notebook cells may contain `%`/`%%` magic directives that are not valid
//! Python. They are commented out (not stripped, so line numbers survive)
//! before the block reaches the parser or the generated program.

use std::sync::OnceLock;

use regex::Regex;

fn magic_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?m)^(\s*%%?.*)$").expect("valid magic regex"))
}

/// Comment out the magic commands in a code block.
pub fn comment_magic_commands(code: &str) -> String {
    magic_pattern().replace_all(code.trim(), "#$1").into_owned()
}

/// Remove the longest common whitespace prefix from a multiline block.
///
/// The prefix is compared character-wise, so mixed tab/space indentation
/// only loses what the lines actually share. Whitespace-only lines are
/// normalized to empty and ignored when computing the prefix.
pub fn dedent(text: &str) -> String {
    let mut prefix: Option<&str> = None;
    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let indent = &line[..line.len() - line.trim_start().len()];
        prefix = Some(match prefix {
            Some(current) => common_prefix(current, indent),
            None => indent,
        });
    }

    let prefix = match prefix {
        Some(p) if !p.is_empty() => p,
        _ => return text.to_string(),
    };

    let out: Vec<&str> = text
        .lines()
        .map(|line| {
            if line.trim().is_empty() {
                ""
            } else {
                line.strip_prefix(prefix).unwrap_or(line)
            }
        })
        .collect();
    out.join("\n")
}

fn common_prefix<'a>(a: &'a str, b: &str) -> &'a str {
    let mut end = 0;
    for (ca, cb) in a.chars().zip(b.chars()) {
        if ca != cb {
            break;
        }
        end += ca.len_utf8();
    }
    &a[..end]
}
