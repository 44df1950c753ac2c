//! String and regular-expression functions for path-expression engines.
//!
//! Regex functions take XPath-style flags: `s` (dot matches newline), `m` (multi-line),
//! `i` (case-insensitive) and `x` (ignore whitespace in the pattern).
use crate::{
    QueryItem,
    error::{QueryError, QueryResult},
};
use regex::{Regex, RegexBuilder};

/// Upper-cases a string.
#[must_use]
pub fn upper_case(text: &str) -> String {
    text.to_uppercase()
}

/// Lower-cases a string.
#[must_use]
pub fn lower_case(text: &str) -> String {
    text.to_lowercase()
}

/// Strips leading and trailing whitespace.
#[must_use]
pub fn trim(text: &str) -> &str {
    text.trim()
}

/// Returns true if `text` ends with `suffix`.
#[must_use]
pub fn ends_with(text: &str, suffix: &str) -> bool {
    text.ends_with(suffix)
}

/// Compiles a pattern with XPath-style flags.
///
/// # Errors
/// Returns [`QueryError::InvalidRegex`] for a bad pattern, and [`QueryError::InvalidConfig`]
/// for an unknown flag
pub fn regex(pattern: &str, flags: &str) -> QueryResult<Regex> {
    let mut builder = RegexBuilder::new(pattern);
    for flag in flags.chars() {
        match flag {
            's' => builder.dot_matches_new_line(true),
            'm' => builder.multi_line(true),
            'i' => builder.case_insensitive(true),
            'x' => builder.ignore_whitespace(true),
            _ => return Err(QueryError::InvalidConfig(format!("unknown regex flag `{flag}`"))),
        };
    }

    Ok(builder.build()?)
}

/// Splits `text` at every match of `pattern`. Empty text gives no tokens.
///
/// # Errors
/// Returns an error if the pattern or flags are invalid
pub fn tokenize(text: &str, pattern: &str, flags: &str) -> QueryResult<Vec<String>> {
    let regex = regex(pattern, flags)?;
    if text.is_empty() {
        return Ok(vec![]);
    }

    Ok(regex.split(text).map(str::to_string).collect())
}

/// Returns true if `pattern` matches anywhere in `text`.
///
/// # Errors
/// Returns an error if the pattern or flags are invalid
pub fn matches(text: &str, pattern: &str, flags: &str) -> QueryResult<bool> {
    Ok(regex(pattern, flags)?.is_match(text))
}

/// Calls a function by its path-expression name with string arguments.
///
/// Known functions are `upper-case`, `lower-case`, `trim`, `ends-with`, `tokenize` and
/// `matches`; the regex functions take an optional flags argument.
///
/// # Errors
/// Returns [`QueryError::PathSyntax`] for unknown functions or a wrong number of arguments
pub fn call(name: &str, args: &[&str]) -> QueryResult<Vec<QueryItem>> {
    let string = |s: String| vec![QueryItem::String(s)];

    Ok(match (name, args) {
        ("upper-case", [text]) => string(upper_case(text)),
        ("lower-case", [text]) => string(lower_case(text)),
        ("trim", [text]) => string(trim(text).to_string()),
        ("ends-with", [text, suffix]) => vec![QueryItem::Boolean(ends_with(text, suffix))],

        ("tokenize", [text, pattern]) => tokenize(text, pattern, "")?
            .into_iter()
            .map(QueryItem::String)
            .collect(),
        ("tokenize", [text, pattern, flags]) => tokenize(text, pattern, flags)?
            .into_iter()
            .map(QueryItem::String)
            .collect(),

        ("matches", [text, pattern]) => vec![QueryItem::Boolean(matches(text, pattern, "")?)],
        ("matches", [text, pattern, flags]) => {
            vec![QueryItem::Boolean(matches(text, pattern, flags)?)]
        }

        _ => {
            return Err(QueryError::syntax(
                name,
                format!("unknown function or wrong number of arguments ({})", args.len()),
            ));
        }
    })
}
