//! SQL text normalization used before every answer comparison

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// Canonicalize a SQL string for comparison.
///
/// Lower-cases, collapses whitespace runs to a single space, tightens the
/// spacing around commas and parentheses, and strips trailing semicolons.
/// Total and idempotent: `normalize_sql(&normalize_sql(s)) == normalize_sql(s)`.
pub fn normalize_sql(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut pending_space = false;

    for ch in sql.chars().flat_map(char::to_lowercase) {
        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }

        match ch {
            ',' => {
                out.push(',');
                pending_space = true;
                continue;
            }
            ')' => {}
            _ if out.ends_with('(') => {}
            _ if pending_space && !out.is_empty() => out.push(' '),
            _ => {}
        }

        out.push(ch);
        pending_space = false;
    }

    let trimmed = out.trim_end_matches(|c: char| c == ';' || c.is_whitespace());
    trimmed.to_string()
}

// ============= Python Binding =============

#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(name = "normalize_sql")]
pub fn py_normalize_sql(sql: &str) -> String {
    normalize_sql(sql)
}
