//! Read-only SQL safety gate.
//!
//! Validates free-form SQL submitted by an autonomous tool-calling agent
//! before it is handed to a database driver. Deny-by-default: a query is
//! approved only if it is a single SELECT statement, free of blocked
//! keywords and nested queries, and (unless disabled) matches one of the
//! configured whitelist shapes.
//!
//! ```
//! use query_guard::QueryValidator;
//!
//! let validator = QueryValidator::new();
//! assert!(validator.is_valid("SELECT * FROM posts"));
//! assert!(!validator.is_valid("SELECT * FROM posts; DROP TABLE users;"));
//! ```

pub mod errors;
pub mod patterns;
pub mod validator;

// Re-export commonly used types
pub use errors::{RejectionError, RejectionKind, ValidationResult};
pub use validator::{QueryValidator, QueryValidatorBuilder};
