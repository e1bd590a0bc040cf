//! Clause-aware heuristic matching of learner SQL against an expected query
//!
//! This is a surface-text approximation of SQL equivalence, not a parser.
//! The expected query picks exactly one [`ClauseRule`] by its most specific
//! keyword, and that rule alone decides whether the submission is acceptable.
//! Sub-checks whose target cannot be extracted from the expected query are
//! skipped rather than failed, so the matcher is lenient: for example
//! `select 1` accepts any submission containing `select` and `from`.
//!
//! The relation is not symmetric: `sql_matches_pattern(a, b)` need not equal
//! `sql_matches_pattern(b, a)`.

use std::fmt;
use std::sync::LazyLock;

use log::debug;
#[cfg(feature = "python")]
use pyo3::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::normalize::normalize_sql;

static GROUP_BY_COLUMN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"group by\s+([a-z0-9_]+)").expect("valid group by regex"));
static HAVING_CLAUSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"having\s+([^;]+)").expect("valid having regex"));
static FROM_TABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"from\s+([a-z0-9_]+)").expect("valid from regex"));
static DISTINCT_COLUMN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"select\s+distinct\s+([a-z0-9_]+)").expect("valid distinct regex")
});
static WHERE_CLAUSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"where\s+([^;]+)").expect("valid where regex"));
static COMPARED_COLUMN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z0-9_]+)\s*[<>=]").expect("valid column regex"));
static QUOTED_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[<>=]\s*'([^']+)'").expect("valid literal regex"));
static ORDER_BY_COLUMN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"order by\s+([a-z0-9_]+)").expect("valid order by regex"));
static SELECT_LIST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"select\s+\S").expect("valid select regex"));

const AGGREGATE_FUNCTIONS: [&str; 5] = ["count", "sum", "avg", "max", "min"];
const JOIN_TYPES: [&str; 4] = ["inner", "left", "right", "full"];

/// Heuristic check selected by the expected query's distinguishing keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClauseRule {
    GroupBy,
    Distinct,
    Where,
    Join,
    OrderBy,
    Fallback,
}

impl ClauseRule {
    /// Rules in dispatch priority order.
    pub const PRIORITY: [ClauseRule; 6] = [
        ClauseRule::GroupBy,
        ClauseRule::Distinct,
        ClauseRule::Where,
        ClauseRule::Join,
        ClauseRule::OrderBy,
        ClauseRule::Fallback,
    ];

    /// Keyword whose presence in the expected query selects this rule.
    /// The fallback rule has none and always triggers.
    pub fn trigger(self) -> Option<&'static str> {
        match self {
            ClauseRule::GroupBy => Some("group by"),
            ClauseRule::Distinct => Some("distinct"),
            ClauseRule::Where => Some("where"),
            ClauseRule::Join => Some("join"),
            ClauseRule::OrderBy => Some("order by"),
            ClauseRule::Fallback => None,
        }
    }

    /// First rule in priority order triggered by a normalized expected query.
    pub fn select(expected: &str) -> ClauseRule {
        Self::PRIORITY
            .into_iter()
            .find(|rule| rule.trigger().map_or(true, |kw| expected.contains(kw)))
            .unwrap_or(ClauseRule::Fallback)
    }

    /// Apply this rule to already-normalized texts.
    pub fn accepts(self, submitted: &str, expected: &str) -> bool {
        match self {
            ClauseRule::GroupBy => group_by_accepts(submitted, expected),
            ClauseRule::Distinct => distinct_accepts(submitted, expected),
            ClauseRule::Where => where_accepts(submitted, expected),
            ClauseRule::Join => join_accepts(submitted, expected),
            ClauseRule::OrderBy => order_by_accepts(submitted, expected),
            ClauseRule::Fallback => fallback_accepts(submitted, expected),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ClauseRule::GroupBy => "group_by",
            ClauseRule::Distinct => "distinct",
            ClauseRule::Where => "where",
            ClauseRule::Join => "join",
            ClauseRule::OrderBy => "order_by",
            ClauseRule::Fallback => "fallback",
        }
    }
}

impl fmt::Display for ClauseRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of matching one submission against one expected query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchVerdict {
    pub accepted: bool,
    /// `None` when the normalized texts were identical.
    pub rule: Option<ClauseRule>,
}

/// Match a submission against the expected query, reporting the deciding rule.
pub fn match_sql(submitted: &str, expected: &str) -> MatchVerdict {
    let submitted = normalize_sql(submitted);
    let expected = normalize_sql(expected);

    if submitted == expected {
        return MatchVerdict {
            accepted: true,
            rule: None,
        };
    }

    let rule = ClauseRule::select(&expected);
    let accepted = rule.accepts(&submitted, &expected);
    debug!("clause rule {} decided accepted={}", rule, accepted);

    MatchVerdict {
        accepted,
        rule: Some(rule),
    }
}

/// Whether `submitted` is an acceptable answer for `expected`.
pub fn sql_matches_pattern(submitted: &str, expected: &str) -> bool {
    match_sql(submitted, expected).accepted
}

fn capture<'a>(re: &Regex, text: &'a str) -> Option<&'a str> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn has_comparison(text: &str) -> bool {
    text.contains(['<', '>', '='])
}

/// Text between the first and second occurrence of `keyword`, or empty.
/// A nested `where` in a subquery therefore ends the outer segment.
fn after_keyword<'a>(text: &'a str, keyword: &str) -> &'a str {
    text.split(keyword).nth(1).unwrap_or("")
}

fn same_from_table(submitted: &str, expected: &str) -> bool {
    match capture(&FROM_TABLE, expected) {
        Some(table) => submitted.contains(&format!("from {}", table)),
        None => true,
    }
}

fn group_by_accepts(submitted: &str, expected: &str) -> bool {
    if !submitted.contains("group by") {
        return false;
    }

    if let Some(column) = capture(&GROUP_BY_COLUMN, expected) {
        if !submitted.contains(&format!("group by {}", column)) {
            return false;
        }
    }

    if expected.contains("having") {
        if !submitted.contains("having") {
            return false;
        }

        if let Some(having) = capture(&HAVING_CLAUSE, expected) {
            let missing_aggregate = AGGREGATE_FUNCTIONS
                .iter()
                .any(|func| having.contains(func) && !submitted.contains(func));
            if missing_aggregate {
                return false;
            }

            if has_comparison(having) && !has_comparison(after_keyword(submitted, "having")) {
                return false;
            }
        }
    }

    true
}

fn distinct_accepts(submitted: &str, expected: &str) -> bool {
    if !submitted.contains("distinct") {
        return false;
    }

    if !same_from_table(submitted, expected) {
        return false;
    }

    // `distinct <col>` implies `<col>`, so the bare column is enough
    match capture(&DISTINCT_COLUMN, expected) {
        Some(column) => submitted.contains(column),
        None => true,
    }
}

fn where_accepts(submitted: &str, expected: &str) -> bool {
    if !submitted.contains("where") {
        return false;
    }

    if !same_from_table(submitted, expected) {
        return false;
    }

    let Some(clause) = capture(&WHERE_CLAUSE, expected) else {
        return true;
    };

    if let Some(column) = capture(&COMPARED_COLUMN, clause) {
        if !submitted.contains(column) {
            return false;
        }
    }

    if has_comparison(clause) && !has_comparison(after_keyword(submitted, "where")) {
        return false;
    }

    if let Some(literal) = capture(&QUOTED_LITERAL, clause) {
        if !submitted.contains(&literal.to_lowercase()) {
            return false;
        }
    }

    true
}

fn join_accepts(submitted: &str, expected: &str) -> bool {
    if !submitted.contains("join") {
        return false;
    }

    let missing_join_type = JOIN_TYPES.iter().any(|kind| {
        let typed = format!("{} join", kind);
        expected.contains(&typed) && !submitted.contains(&typed)
    });
    if missing_join_type {
        return false;
    }

    !(expected.contains(" on ") && !submitted.contains(" on "))
}

fn order_by_accepts(submitted: &str, expected: &str) -> bool {
    if !submitted.contains("order by") {
        return false;
    }

    if let Some(column) = capture(&ORDER_BY_COLUMN, expected) {
        if !submitted.contains(&format!("order by {}", column)) {
            return false;
        }
    }

    // ascending is the default, only an explicit descending order is enforced
    !(expected.contains(" desc") && !submitted.contains(" desc"))
}

fn fallback_accepts(submitted: &str, expected: &str) -> bool {
    if SELECT_LIST.is_match(expected) && !submitted.contains("select") {
        return false;
    }

    if !same_from_table(submitted, expected) {
        return false;
    }

    submitted.contains("select") && submitted.contains("from")
}

// ============= Python Binding =============

#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(name = "sql_matches_pattern")]
pub fn py_sql_matches_pattern(submitted: &str, expected: &str) -> bool {
    sql_matches_pattern(submitted, expected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_selection_follows_priority() {
        assert_eq!(
            ClauseRule::select("select a, count(*) from t join u on t.id = u.id group by a"),
            ClauseRule::GroupBy
        );
        assert_eq!(ClauseRule::select("select distinct a from t where b = 1"), ClauseRule::Distinct);
        assert_eq!(ClauseRule::select("select a from t where b = 1 order by a"), ClauseRule::Where);
        assert_eq!(ClauseRule::select("select * from a join b on a.id = b.id order by x"), ClauseRule::Join);
        assert_eq!(ClauseRule::select("select a from t order by a"), ClauseRule::OrderBy);
        assert_eq!(ClauseRule::select("select a from t"), ClauseRule::Fallback);
    }

    #[test]
    fn exact_match_reports_no_rule() {
        let verdict = match_sql("SELECT a FROM t;", "select a\nfrom t");
        assert!(verdict.accepted);
        assert_eq!(verdict.rule, None);
    }

    #[test]
    fn group_by_requires_same_column() {
        let expected = "SELECT dept, COUNT(*) FROM emp GROUP BY dept";
        assert!(sql_matches_pattern("select dept, count(id) from emp group by dept", expected));
        assert!(!sql_matches_pattern("select dept, count(*) from emp group by name", expected));
        assert!(!sql_matches_pattern("select dept, count(*) from emp", expected));
    }

    #[test]
    fn having_requires_aggregate_and_comparison() {
        let expected = "SELECT dept FROM emp GROUP BY dept HAVING SUM(salary) >= 1000";
        assert!(sql_matches_pattern(
            "select dept from emp group by dept having sum(salary) > 10",
            expected
        ));
        assert!(!sql_matches_pattern(
            "select dept from emp group by dept having avg(salary) > 10",
            expected
        ));
        assert!(!sql_matches_pattern(
            "select dept from emp group by dept having sum(salary)",
            expected
        ));
        assert!(!sql_matches_pattern("select dept from emp group by dept", expected));
    }

    #[test]
    fn group_by_rule_shadows_join_requirements() {
        let expected = "SELECT a.x, COUNT(*) FROM a LEFT JOIN b ON a.id = b.id GROUP BY x";
        assert!(sql_matches_pattern("select x, count(*) from a, b group by x", expected));
    }

    #[test]
    fn distinct_accepts_column_anywhere() {
        let expected = "SELECT DISTINCT city FROM customers";
        assert!(sql_matches_pattern("select distinct(city) from customers", expected));
        assert!(!sql_matches_pattern("select distinct city from clients", expected));
        assert!(!sql_matches_pattern("select distinct name from customers", expected));
    }

    #[test]
    fn where_requires_literal_value() {
        let expected = "SELECT * FROM orders WHERE status = 'Shipped'";
        assert!(sql_matches_pattern("select id from orders where status='shipped'", expected));
        assert!(!sql_matches_pattern("select id from orders where status = 'pending'", expected));
        assert!(!sql_matches_pattern("select id from orders where state = 'shipped'", expected));
    }

    #[test]
    fn where_requires_comparison_after_keyword() {
        let expected = "SELECT * FROM users WHERE age > 18";
        assert!(!sql_matches_pattern("select * from users where age between 18 and 99", expected));
        assert!(!sql_matches_pattern("select * from users", expected));
    }

    #[test]
    fn where_without_comparison_only_checks_structure() {
        let expected = "SELECT * FROM users WHERE email IS NULL";
        assert!(sql_matches_pattern("select id from users where phone is null", expected));
    }

    #[test]
    fn comparison_must_sit_before_nested_where() {
        let expected = "SELECT * FROM users WHERE age > 18";
        assert!(!sql_matches_pattern(
            "select * from users where age in (select age from adults where age > 18)",
            expected
        ));
        assert!(sql_matches_pattern(
            "select * from users where age >= 18 and id in (select id from adults where ok)",
            expected
        ));
    }

    #[test]
    fn comparison_must_sit_before_nested_having() {
        let expected = "SELECT a FROM t GROUP BY a HAVING COUNT(*) > 1";
        assert!(!sql_matches_pattern(
            "select a from t group by a having count(*) in (select n from m group by n having max(n) > 1)",
            expected
        ));
    }

    #[test]
    fn unextractable_group_by_column_is_skipped() {
        let expected = "SELECT a FROM t GROUP BY (a)";
        assert!(sql_matches_pattern("select a from t group by b", expected));
        assert!(!sql_matches_pattern("select a from t", expected));
    }

    #[test]
    fn uncaptured_having_clause_is_skipped() {
        let expected = "SELECT a, COUNT(*) FROM t GROUP BY a HAVING";
        assert!(sql_matches_pattern("select a from t group by a having sum(b)", expected));
        assert!(!sql_matches_pattern("select a from t group by a", expected));
    }

    #[test]
    fn literal_without_operator_is_skipped() {
        let expected = "SELECT * FROM t WHERE name LIKE 'Bob%'";
        assert!(sql_matches_pattern("select * from t where name like 'alice%'", expected));
        assert!(!sql_matches_pattern("select * from t", expected));
    }

    #[test]
    fn typed_join_must_match() {
        let expected = "SELECT * FROM a LEFT JOIN b ON a.id = b.id";
        assert!(sql_matches_pattern("select * from a left join b on b.id = a.id", expected));
        assert!(!sql_matches_pattern("select * from a inner join b on a.id = b.id", expected));
        assert!(!sql_matches_pattern("select * from a left join b using (id)", expected));
    }

    #[test]
    fn order_by_enforces_desc_only() {
        let expected = "SELECT name FROM users ORDER BY age DESC";
        assert!(sql_matches_pattern("select * from users order by age desc", expected));
        assert!(!sql_matches_pattern("select * from users order by age", expected));
        assert!(!sql_matches_pattern("select * from users order by name desc", expected));

        let ascending = "SELECT name FROM users ORDER BY age ASC";
        assert!(sql_matches_pattern("select name from users order by age", ascending));
    }

    #[test]
    fn fallback_checks_table() {
        let expected = "SELECT name FROM users";
        assert!(sql_matches_pattern("select id from users", expected));
        assert!(!sql_matches_pattern("select name from people", expected));
        assert!(!sql_matches_pattern("name from users", expected));
    }

    #[test]
    fn empty_inputs_are_handled() {
        assert!(sql_matches_pattern("", ""));
        assert!(!sql_matches_pattern("", "select a from t"));
        // an empty expected query falls through to the lenient fallback
        assert!(sql_matches_pattern("select a from t", ""));
        assert!(!sql_matches_pattern("a from t", ""));
    }
}
