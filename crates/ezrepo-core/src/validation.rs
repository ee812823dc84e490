//! # Schema Validation
//!
//! Registration-time checks on a model's descriptor graph.
//!
//! ## What Gets Checked
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  validate_model::<Author>()                                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Author ──► Post ──► Img                  every reachable record,       │
//! │     ▲         │                           each visited once             │
//! │     └─────────┘ (cycles are fine here)                                  │
//! │                                                                         │
//! │  Per record:                                                            │
//! │  ├── record name not empty                                              │
//! │  ├── field names not empty                                              │
//! │  ├── field names free of '.'                                            │
//! │  └── field names unique                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Private and opted-out fields are checked too: a descriptor is either well
//! formed or not, regardless of what preload discovery would look at.

use std::collections::HashSet;

use tracing::debug;

use crate::error::{SchemaError, SchemaResult};
use crate::introspect::resolve_record;
use crate::schema::{Describe, RecordDesc, TypeDesc};

/// Validates every record reachable from `T`.
///
/// ## Example
/// ```rust
/// use ezrepo_core::{describe_record, validation::validate_model};
///
/// pub struct Tree { pub children: Vec<Tree> }
/// describe_record! { Tree { pub children: Vec<Tree> } }
///
/// // Recursive models are valid descriptors; only preload discovery
/// // rejects them.
/// assert!(validate_model::<Tree>().is_ok());
/// ```
pub fn validate_model<T: Describe + ?Sized>() -> SchemaResult<()> {
    validate_type(&T::type_desc())
}

/// Validates every record reachable from a descriptor.
pub fn validate_type(ty: &TypeDesc) -> SchemaResult<()> {
    let mut seen: HashSet<*const RecordDesc> = HashSet::new();
    let mut pending = reachable(ty);
    let mut checked = 0usize;

    while let Some(record) = pending.pop() {
        if !seen.insert(record as *const RecordDesc) {
            continue;
        }
        validate_record(record)?;
        checked += 1;

        for field in record.fields() {
            pending.extend(reachable(field.ty()));
        }
    }

    debug!(records = checked, "Schema validated");
    Ok(())
}

/// Checks a single record's own fields.
pub fn validate_record(record: &RecordDesc) -> SchemaResult<()> {
    if record.name().trim().is_empty() {
        return Err(SchemaError::EmptyRecordName);
    }

    let mut names = HashSet::new();
    for (index, field) in record.fields().iter().enumerate() {
        let name = field.name();

        if name.trim().is_empty() {
            return Err(SchemaError::EmptyFieldName {
                record: record.name().to_string(),
                index,
            });
        }

        if name.contains('.') {
            return Err(SchemaError::DottedFieldName {
                record: record.name().to_string(),
                field: name.to_string(),
            });
        }

        if !names.insert(name) {
            return Err(SchemaError::DuplicateField {
                record: record.name().to_string(),
                field: name.to_string(),
            });
        }
    }

    Ok(())
}

/// Records referenced by a field type, including map keys and values.
fn reachable(ty: &TypeDesc) -> Vec<&'static RecordDesc> {
    match ty {
        TypeDesc::Map(key, value) => {
            let mut out = reachable(key);
            out.extend(reachable(value));
            out
        }
        other => resolve_record(other).into_iter().collect(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
