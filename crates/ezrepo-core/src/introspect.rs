//! # Type Introspector
//!
//! Lists the fields of a model that take part in preload discovery.
//!
//! ## Normalization
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Input descriptor               Unwrapped to              Result        │
//! │  ─────────────────────────────  ────────────────────────  ───────────── │
//! │  Parent                         Parent                    its fields    │
//! │  Box<Parent>                    Parent                    its fields    │
//! │  Vec<Option<Box<Parent>>>       Parent                    its fields    │
//! │  [Parent; 3]                    Parent                    its fields    │
//! │  String / i64 / HashMap<..>     (no record reached)       empty         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A field is reported when it is exported (`pub`) and its `ezg` tag is not
//! one of the opt-out values.

use serde::Serialize;

use crate::schema::{Describe, FieldDesc, RecordDesc, TypeDesc};
use crate::{NO_PRELOAD_VALUES, TAG_KEY};

/// Name and declared type of an introspected field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldInfo {
    pub name: String,
    pub ty: TypeDesc,
}

/// Unwraps pointer, slice and array layers until a record is reached.
pub fn resolve_record(ty: &TypeDesc) -> Option<&'static RecordDesc> {
    let mut current = ty;
    loop {
        match current {
            TypeDesc::Record(record) => return Some(record.get()),
            TypeDesc::Pointer(inner) | TypeDesc::Slice(inner) | TypeDesc::Array(inner, _) => {
                current = inner;
            }
            TypeDesc::Scalar(_) | TypeDesc::Map(..) => return None,
        }
    }
}

/// Returns true when the field's tag opts it out of preload discovery.
pub fn is_opted_out(field: &FieldDesc) -> bool {
    field.tag().lookup(TAG_KEY).is_some_and(|value| {
        NO_PRELOAD_VALUES
            .iter()
            .any(|opt_out| value.eq_ignore_ascii_case(opt_out))
    })
}

/// Returns the exported, non-opted-out fields of the record behind `ty`, in
/// declaration order. Non-record input yields an empty list.
pub fn exported_fields(ty: &TypeDesc) -> Vec<FieldInfo> {
    let Some(record) = resolve_record(ty) else {
        return Vec::new();
    };

    record
        .fields()
        .iter()
        .filter(|field| !is_opted_out(field))
        .filter(|field| field.visibility().is_exported())
        .map(|field| FieldInfo {
            name: field.name().to_string(),
            ty: field.ty().clone(),
        })
        .collect()
}

/// [`exported_fields`] for a type known at compile time.
pub fn exported_fields_of<T: Describe + ?Sized>() -> Vec<FieldInfo> {
    exported_fields(&T::type_desc())
}

/// [`exported_fields`] for the type of a value.
pub fn exported_fields_of_val<T: Describe + ?Sized>(_value: &T) -> Vec<FieldInfo> {
    exported_fields_of::<T>()
}

// =============================================================================
// Unit Tests
// =============================================================================
