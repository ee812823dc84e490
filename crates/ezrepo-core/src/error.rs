//! # Error Types
//!
//! Error types for ezrepo-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  ezrepo-core errors (this file)                                         │
//! │  └── SchemaError      - Descriptor defects found at registration        │
//! │                                                                         │
//! │  ezrepo-db errors (separate crate)                                      │
//! │  └── DbError          - Database operation failures                     │
//! │                                                                         │
//! │  Fatal defects (panic, never returned):                                 │
//! │  ├── Preload recursion ceiling exceeded                                 │
//! │  └── Inconsistent multi-preload declaration                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Introspection itself never fails: input that is not a record simply has no
//! fields.

use thiserror::Error;

/// Defects in a model's descriptor graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// A record was registered without a name.
    #[error("record name is empty")]
    EmptyRecordName,

    /// A field was declared without a name.
    #[error("{record}: field #{index} has an empty name")]
    EmptyFieldName { record: String, index: usize },

    /// Field names are joined with `.` into preload paths.
    ///
    /// ## When This Occurs
    /// A hand-built descriptor uses a name like `posts.images`, which would
    /// be indistinguishable from the nested path `posts` → `images`.
    #[error("{record}.{field}: field names must not contain '.'")]
    DottedFieldName { record: String, field: String },

    /// Two fields of one record share a name.
    #[error("{record}: duplicate field '{field}'")]
    DuplicateField { record: String, field: String },
}

/// Convenience type alias for Results with SchemaError.
pub type SchemaResult<T> = Result<T, SchemaError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = SchemaError::DuplicateField {
            record: "Author".to_string(),
            field: "posts".to_string(),
        };
        assert_eq!(err.to_string(), "Author: duplicate field 'posts'");

        let err = SchemaError::DottedFieldName {
            record: "Author".to_string(),
            field: "posts.images".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Author.posts.images: field names must not contain '.'"
        );
    }
}
