//! Blocked-keyword table and default whitelist patterns.

use regex::Regex;
use std::sync::LazyLock;

/// Keywords that reject a query whenever they appear as a standalone token,
/// regardless of whitelist configuration.
///
/// Covers DML/DDL and permission statements, set combination, time and
/// resource exhaustion functions, the byte-wise string constructor, and
/// system catalog identifiers.
pub const BLOCKED_KEYWORDS: &[&str] = &[
    // DML / DDL / permissions
    "INSERT",
    "UPDATE",
    "DELETE",
    "DROP",
    "TRUNCATE",
    "ALTER",
    "CREATE",
    "GRANT",
    "REVOKE",
    // set combination
    "UNION",
    // time / resource exhaustion
    "SLEEP",
    "BENCHMARK",
    // byte-wise string construction
    "CHAR",
    // system catalogs and privileged schemas
    "INFORMATION_SCHEMA",
    "PERFORMANCE_SCHEMA",
    "PG_CATALOG",
    "SQLITE_MASTER",
    "MYSQL",
    "SYS",
];

/// Default whitelist: the SELECT shapes the gate accepts out of the box.
///
/// Patterns are anchored and matched against the comment-stripped,
/// whitespace-normalized query; matching is case-insensitive and tolerates
/// a trailing semicolon.
static DEFAULT_WHITELIST: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        // Star or explicit/backtick-quoted column list over a single table,
        // with optional filtering, ordering and limit.
        Regex::new(
            r"(?i)^\s*SELECT\s+(\*|`?[A-Za-z_][A-Za-z0-9_]*`?(\s*,\s*`?[A-Za-z_][A-Za-z0-9_]*`?)*)\s+FROM\s+`?[A-Za-z_][A-Za-z0-9_]*`?(\s+WHERE\s+[^;]+?)?(\s+ORDER\s+BY\s+[^;]+?)?(\s+LIMIT\s+\d+(\s*(,|OFFSET)\s*\d+)?)?\s*;?\s*$",
        )
        .expect("default whitelist pattern must compile"),
        // Single aggregate over a single table.
        Regex::new(
            r"(?i)^\s*SELECT\s+(COUNT|SUM|AVG|MIN|MAX)\s*\(\s*(\*|`?[A-Za-z_][A-Za-z0-9_]*`?)\s*\)\s+FROM\s+`?[A-Za-z_][A-Za-z0-9_]*`?(\s+WHERE\s+[^;]+?)?\s*;?\s*$",
        )
        .expect("default whitelist pattern must compile"),
    ]
});

/// Returns a fresh copy of the default whitelist pattern set.
pub fn default_whitelist() -> Vec<Regex> {
    DEFAULT_WHITELIST.clone()
}

/// Checks whether a token is a hexadecimal numeric literal (`0x...`),
/// a common encoding bypass for string filters.
pub(crate) fn is_hex_literal(token: &str) -> bool {
    let rest = match token.strip_prefix("0x").or_else(|| token.strip_prefix("0X")) {
        Some(rest) => rest,
        None => return false,
    };
    !rest.is_empty() && rest.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_whitelist_compiles() {
        assert_eq!(default_whitelist().len(), 2);
    }

    #[test]
    fn test_hex_literal_detection() {
        assert!(is_hex_literal("0x1F"));
        assert!(is_hex_literal("0X41424344"));
        assert!(!is_hex_literal("0x"));
        assert!(!is_hex_literal("0xZZ"));
        assert!(!is_hex_literal("10"));
        assert!(!is_hex_literal("x1F"));
    }

    #[test]
    fn test_blocked_keywords_are_uppercase() {
        for kw in BLOCKED_KEYWORDS {
            assert_eq!(*kw, kw.to_ascii_uppercase());
        }
    }
}
