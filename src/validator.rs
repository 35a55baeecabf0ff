//! SQL query validator.
//!
//! The last line of defense before an agent-submitted SQL string reaches a
//! production database. The validator runs a fixed pipeline over the raw
//! text: comment stripping, whitespace normalization, structural checks,
//! a blocked-keyword scan, a nested-query scan, and finally a whitelist
//! match against the accepted SELECT shapes. The first failing stage wins
//! and the query is rejected with a typed [`RejectionError`].
//!
//! The decision is a pure function of the query text and the validator
//! configuration: identical input always produces an identical verdict.

use regex::Regex;
use tracing::{debug, warn};

use crate::errors::{RejectionError, ValidationResult};
use crate::patterns::{self, BLOCKED_KEYWORDS};

/// Validates agent-submitted SQL queries for read-only execution.
///
/// `validate` and `is_valid` take `&self` and perform no mutation, so a
/// single instance can be shared across threads. The whitelist can only be
/// extended through `&mut self`, which keeps the pattern list effectively
/// immutable once the validator is shared.
#[derive(Debug, Clone)]
pub struct QueryValidator {
    whitelist: Vec<Regex>,
    whitelist_enabled: bool,
}

impl QueryValidator {
    /// Creates a validator with the default whitelist and whitelist
    /// enforcement enabled.
    pub fn new() -> Self {
        Self {
            whitelist: patterns::default_whitelist(),
            whitelist_enabled: true,
        }
    }

    /// Returns a builder for custom pattern sets or whitelist settings.
    pub fn builder() -> QueryValidatorBuilder {
        QueryValidatorBuilder::new()
    }

    /// Appends one pattern to the whitelist.
    ///
    /// Intended for one-time setup before the validator is shared.
    pub fn add_whitelist_pattern(&mut self, pattern: Regex) {
        self.whitelist.push(pattern);
    }

    /// Validates a SQL query, returning the rejection reason on failure.
    ///
    /// # Errors
    /// Returns a [`RejectionError`] naming the rejecting stage if the query
    /// is not a single, whitelisted, keyword-clean SELECT statement.
    pub fn validate(&self, query: &str) -> ValidationResult<()> {
        match self.check(query) {
            Ok(()) => {
                debug!("SQL query passed validation");
                Ok(())
            }
            Err(err) => {
                warn!(kind = %err.kind(), reason = %err, "rejected SQL query");
                Err(err)
            }
        }
    }

    /// Checks a SQL query, returning `false` on any rejection.
    ///
    /// Never panics, for any input.
    pub fn is_valid(&self, query: &str) -> bool {
        self.validate(query).is_ok()
    }

    /// Runs the validation pipeline. First failure wins.
    fn check(&self, query: &str) -> ValidationResult<()> {
        let stripped = strip_comments(query)?;
        let normalized = normalize(&stripped);
        let body = strip_trailing_semicolon(&normalized);

        if !starts_with_select(body) {
            return Err(RejectionError::invalid_structure(
                query,
                "query must begin with SELECT",
            ));
        }

        if body.contains(';') {
            return Err(RejectionError::invalid_structure(
                query,
                "multiple SQL statements are not permitted",
            ));
        }

        if let Some(keyword) = find_blocked_keyword(body) {
            return Err(RejectionError::disallowed_keyword(query, keyword));
        }

        if contains_nested_select(body) {
            return Err(RejectionError::invalid_structure(
                query,
                "nested SELECT queries are not permitted",
            ));
        }

        if self.whitelist_enabled && !self.whitelist.iter().any(|p| p.is_match(&normalized)) {
            return Err(RejectionError::not_whitelisted(query));
        }

        Ok(())
    }
}

impl Default for QueryValidator {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`QueryValidator`] configuration.
#[derive(Debug, Default)]
pub struct QueryValidatorBuilder {
    patterns: Option<Vec<Regex>>,
    whitelist_enabled: Option<bool>,
}

impl QueryValidatorBuilder {
    /// Creates a builder with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whitelist with an explicit pattern set.
    ///
    /// An empty set rejects every query at the whitelist stage while
    /// whitelist enforcement is enabled.
    pub fn patterns(mut self, patterns: Vec<Regex>) -> Self {
        self.patterns = Some(patterns);
        self
    }

    /// Appends one pattern to the configured set (the defaults, unless
    /// `patterns` replaced them).
    pub fn pattern(mut self, pattern: Regex) -> Self {
        self.patterns
            .get_or_insert_with(patterns::default_whitelist)
            .push(pattern);
        self
    }

    /// Enables or disables whitelist enforcement (enabled by default).
    ///
    /// Disabling only removes the whitelist-match requirement; every
    /// structural and blacklist check still applies.
    pub fn whitelist_enabled(mut self, enabled: bool) -> Self {
        self.whitelist_enabled = Some(enabled);
        self
    }

    /// Builds the validator.
    pub fn build(self) -> QueryValidator {
        QueryValidator {
            whitelist: self.patterns.unwrap_or_else(patterns::default_whitelist),
            whitelist_enabled: self.whitelist_enabled.unwrap_or(true),
        }
    }
}

/// Removes SQL comments from the query.
///
/// Linear character scan. String literals are copied verbatim (doubled
/// quotes respected), so comment markers inside them survive. Executable
/// comments (`/*! ... */`) are scanned for blocked keywords before being
/// discarded: such comment bodies run on some engines despite looking
/// inert. Stripped comments are replaced by a single space. An
/// unterminated block comment extends to the end of the input.
fn strip_comments(query: &str) -> ValidationResult<String> {
    let chars: Vec<char> = query.chars().collect();
    let n = chars.len();
    let mut out = String::with_capacity(query.len());
    let mut i = 0;

    while i < n {
        let c = chars[i];
        match c {
            '\'' | '"' => {
                let quote = c;
                out.push(c);
                i += 1;
                while i < n {
                    out.push(chars[i]);
                    if chars[i] == quote {
                        if i + 1 < n && chars[i + 1] == quote {
                            out.push(chars[i + 1]);
                            i += 2;
                            continue;
                        }
                        i += 1;
                        break;
                    }
                    i += 1;
                }
            }
            '-' if i + 1 < n && chars[i + 1] == '-' => {
                while i < n && chars[i] != '\n' {
                    i += 1;
                }
            }
            '/' if i + 1 < n && chars[i + 1] == '*' => {
                let executable = i + 2 < n && chars[i + 2] == '!';
                let body_start = if executable { i + 3 } else { i + 2 };
                let mut close = None;
                let mut j = body_start;
                while j + 1 < n {
                    if chars[j] == '*' && chars[j + 1] == '/' {
                        close = Some(j);
                        break;
                    }
                    j += 1;
                }
                let body_end = close.unwrap_or(n);
                if executable {
                    let body: String = chars[body_start..body_end].iter().collect();
                    if let Some(keyword) = find_blocked_keyword(&body) {
                        return Err(RejectionError::disallowed_keyword(query, keyword));
                    }
                }
                out.push(' ');
                i = match close {
                    Some(j) => j + 2,
                    None => n,
                };
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }

    Ok(out)
}

/// Collapses consecutive whitespace to single spaces and trims the ends.
fn normalize(query: &str) -> String {
    query.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Removes at most one trailing semicolon.
fn strip_trailing_semicolon(query: &str) -> &str {
    query.strip_suffix(';').map(str::trim_end).unwrap_or(query)
}

/// Checks for a leading case-insensitive `SELECT` token.
fn starts_with_select(query: &str) -> bool {
    if query.len() < 6 || !query.is_char_boundary(6) {
        return false;
    }
    if !query[..6].eq_ignore_ascii_case("select") {
        return false;
    }
    match query[6..].chars().next() {
        None => true,
        Some(c) => !(c.is_alphanumeric() || c == '_'),
    }
}

/// Scans for blocked keywords as standalone lexical tokens.
///
/// Tokens are maximal alphanumeric/underscore runs; the scan is
/// case-insensitive and also flags hexadecimal literals. Quoted literals
/// are scanned too: a keyword inside a string cannot execute, but the gate
/// fails closed on attacker-controlled text.
fn find_blocked_keyword(text: &str) -> Option<String> {
    let mut token = String::new();
    for c in text.chars().chain(std::iter::once(' ')) {
        if c.is_alphanumeric() || c == '_' {
            token.push(c);
            continue;
        }
        if !token.is_empty() {
            if let Some(found) = check_token(&token) {
                return Some(found);
            }
            token.clear();
        }
    }
    None
}

fn check_token(token: &str) -> Option<String> {
    let upper = token.to_ascii_uppercase();
    if BLOCKED_KEYWORDS.contains(&upper.as_str()) {
        return Some(upper);
    }
    if patterns::is_hex_literal(token) {
        return Some(token.to_string());
    }
    None
}

/// Detects a `SELECT` token inside parentheses anywhere after the leading
/// statement keyword.
fn contains_nested_select(text: &str) -> bool {
    let mut depth: usize = 0;
    let mut token = String::new();
    for c in text.chars().chain(std::iter::once(' ')) {
        if c.is_alphanumeric() || c == '_' {
            token.push(c);
            continue;
        }
        if !token.is_empty() {
            if depth > 0 && token.eq_ignore_ascii_case("select") {
                return true;
            }
            token.clear();
        }
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_line_comment() {
        let out = strip_comments("SELECT * FROM posts -- WHERE admin = 1").unwrap();
        assert_eq!(normalize(&out), "SELECT * FROM posts");
    }

    #[test]
    fn test_strip_block_comment() {
        let out = strip_comments("SELECT * /* cols */ FROM posts").unwrap();
        assert_eq!(normalize(&out), "SELECT * FROM posts");
    }

    #[test]
    fn test_comment_marker_inside_string_survives() {
        let out = strip_comments("SELECT * FROM posts WHERE tag = '--x'").unwrap();
        assert_eq!(out, "SELECT * FROM posts WHERE tag = '--x'");
    }

    #[test]
    fn test_executable_comment_clean_body_is_stripped() {
        let out = strip_comments("SELECT * FROM posts /*!40000 x */").unwrap();
        assert_eq!(normalize(&out), "SELECT * FROM posts");
    }

    #[test]
    fn test_executable_comment_dirty_body_rejects() {
        let err = strip_comments("SELECT * FROM posts /*!50000 UNION SELECT * FROM users */")
            .unwrap_err();
        assert_eq!(err.kind(), crate::errors::RejectionKind::DisallowedKeyword);
    }

    #[test]
    fn test_unterminated_block_comment_extends_to_end() {
        let out = strip_comments("SELECT * FROM posts /* dangling").unwrap();
        assert_eq!(normalize(&out), "SELECT * FROM posts");
    }

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize("  SELECT \n *\t FROM  posts  "), "SELECT * FROM posts");
    }

    #[test]
    fn test_strip_trailing_semicolon_removes_one() {
        assert_eq!(strip_trailing_semicolon("SELECT 1;"), "SELECT 1");
        assert_eq!(strip_trailing_semicolon("SELECT 1;;"), "SELECT 1;");
        assert_eq!(strip_trailing_semicolon("SELECT 1"), "SELECT 1");
    }

    #[test]
    fn test_starts_with_select_token_boundary() {
        assert!(starts_with_select("SELECT * FROM t"));
        assert!(starts_with_select("select(1)"));
        assert!(!starts_with_select("SELECTX FROM t"));
        assert!(!starts_with_select("SHOW TABLES"));
        assert!(!starts_with_select(""));
    }

    #[test]
    fn test_find_blocked_keyword_is_token_based() {
        assert_eq!(find_blocked_keyword("a union b"), Some("UNION".into()));
        assert_eq!(find_blocked_keyword("name VARCHAR(20)"), None);
        assert_eq!(find_blocked_keyword("updated_at > 1"), None);
        assert_eq!(find_blocked_keyword("CHAR(65)"), Some("CHAR".into()));
        assert_eq!(find_blocked_keyword("id = 0x1F"), Some("0x1F".into()));
        assert_eq!(
            find_blocked_keyword("information_schema.tables"),
            Some("INFORMATION_SCHEMA".into())
        );
    }

    #[test]
    fn test_contains_nested_select() {
        assert!(contains_nested_select("SELECT a FROM t WHERE x IN (SELECT b FROM u)"));
        assert!(!contains_nested_select("SELECT COUNT(*) FROM t"));
        assert!(!contains_nested_select("SELECT a FROM t WHERE (x > 1)"));
    }

    #[test]
    fn test_builder_replaces_patterns() {
        let validator = QueryValidator::builder()
            .patterns(vec![Regex::new(r"(?i)^SELECT 1$").unwrap()])
            .build();
        assert!(validator.is_valid("SELECT 1"));
        assert!(!validator.is_valid("SELECT * FROM posts"));
    }

    #[test]
    fn test_builder_empty_patterns_reject_everything() {
        let validator = QueryValidator::builder().patterns(vec![]).build();
        let err = validator.validate("SELECT * FROM posts").unwrap_err();
        assert_eq!(err.kind(), crate::errors::RejectionKind::NotWhitelisted);
    }

    #[test]
    fn test_builder_appends_to_defaults() {
        let validator = QueryValidator::builder()
            .pattern(Regex::new(r"(?i)^\s*SELECT\s+DISTINCT\s+\w+\s+FROM\s+\w+\s*;?\s*$").unwrap())
            .build();
        assert!(validator.is_valid("SELECT DISTINCT author FROM posts"));
        assert!(validator.is_valid("SELECT * FROM posts"));
    }

    #[test]
    fn test_add_whitelist_pattern() {
        let mut validator = QueryValidator::new();
        assert!(!validator.is_valid("SELECT 42"));
        validator.add_whitelist_pattern(Regex::new(r"(?i)^SELECT \d+$").unwrap());
        assert!(validator.is_valid("SELECT 42"));
    }
}
