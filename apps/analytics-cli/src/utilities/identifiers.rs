//! Helpers for emitting Python identifiers and literals.

use regex::Regex;
use std::sync::LazyLock;

const PYTHON_IDENTIFIER_REGEX: &str = r"^[^\d\W]\w*$";
pub static PYTHON_IDENTIFIER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(PYTHON_IDENTIFIER_REGEX).expect("identifier regex is valid"));

const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if",
    "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try",
    "while", "with", "yield",
];

/// Exact match: `class` is a keyword, `Class` is not.
pub fn is_python_keyword(name: &str) -> bool {
    PYTHON_KEYWORDS.contains(&name)
}

/// Module names clash with keywords regardless of case, e.g. `none.py` or `true.py`.
pub fn is_reserved_module_name(name: &str) -> bool {
    PYTHON_KEYWORDS
        .iter()
        .any(|keyword| keyword.eq_ignore_ascii_case(name))
}

pub fn is_python_identifier(name: &str) -> bool {
    PYTHON_IDENTIFIER_PATTERN.is_match(name) && !is_python_keyword(name)
}

/// Renders `value` as a single-quoted Python string literal.
pub fn python_string_literal(value: &str) -> String {
    let mut literal = String::with_capacity(value.len() + 2);
    literal.push('\'');
    for c in value.chars() {
        match c {
            '\\' => literal.push_str("\\\\"),
            '\'' => literal.push_str("\\'"),
            '\n' => literal.push_str("\\n"),
            _ => literal.push(c),
        }
    }
    literal.push('\'');
    literal
}

/// Renders a Python tuple of string literals: `('a',)`, `('a', 'b')` or `()`.
pub fn python_string_tuple<S: AsRef<str>>(values: &[S]) -> String {
    match values {
        [] => "()".to_string(),
        [single] => format!("({},)", python_string_literal(single.as_ref())),
        _ => format!(
            "({})",
            values
                .iter()
                .map(|value| python_string_literal(value.as_ref()))
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

/// Renders a Python list of string literals: `['A', 'B']`.
pub fn python_string_list<S: AsRef<str>>(values: &[S]) -> String {
    format!(
        "[{}]",
        values
            .iter()
            .map(|value| python_string_literal(value.as_ref()))
            .collect::<Vec<_>>()
            .join(", ")
    )
}
