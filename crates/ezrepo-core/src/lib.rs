//! # ezrepo-core: Model Descriptors and Preload Discovery
//!
//! This crate describes model types explicitly and works out which nested
//! collection relations a model needs preloaded. It has zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        ezrepo Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Application code                             │   │
//! │  │    wrap(&mut author).find_one(&pool)                            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    ezrepo-db (CRUD wrapper)                     │   │
//! │  │    insert, find, count, paginate, preload execution             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ "which relations?"                     │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ ezrepo-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌────────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │  schema   │  │ introspect │  │  preload  │  │ validation│  │   │
//! │  │   │ TypeDesc  │─►│  exported  │─►│   auto    │  │  checks   │  │   │
//! │  │   │ RecordDesc│  │   fields   │  │  preloads │  │           │  │   │
//! │  │   └───────────┘  └────────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`schema`] - Type descriptors and the [`Describe`] trait
//! - [`tag`] - Per-field `key:"value"` annotations
//! - [`introspect`] - Exported, non-opted-out fields of a record
//! - [`preload`] - Preload path discovery and preload plans
//! - [`validation`] - Descriptor graph checks
//! - [`error`] - Schema error types
//!
//! ## Example Usage
//!
//! ```rust
//! use ezrepo_core::{auto_preloads, describe_record};
//!
//! pub struct Author { pub username: String, pub posts: Vec<Post> }
//! pub struct Post { pub title: String, pub images: Vec<Image> }
//! pub struct Image { pub title: String }
//!
//! describe_record! { Author { pub username: String, pub posts: Vec<Post> } }
//! describe_record! { Post { pub title: String, pub images: Vec<Image> } }
//! describe_record! { Image { pub title: String } }
//!
//! assert_eq!(auto_preloads::<Author>(), vec!["posts", "posts.images"]);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod introspect;
mod macros;
pub mod preload;
pub mod schema;
pub mod tag;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{SchemaError, SchemaResult};
pub use introspect::{exported_fields, exported_fields_of, exported_fields_of_val, FieldInfo};
pub use preload::{
    auto_preloads, auto_preloads_for, auto_preloads_of_val, PreloadSpec, PreloadStep,
};
pub use schema::{Describe, FieldDesc, RecordDesc, RecordRef, ScalarKind, TypeDesc, Visibility};
pub use tag::StructTag;
pub use validation::validate_model;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Deepest nesting level preload discovery descends to.
///
/// Real models are nowhere near this deep; reaching it means the model's
/// collections lead back to itself.
pub const MAX_RECURSION: u32 = 200;

/// Tag key consulted for preload annotations.
pub const TAG_KEY: &str = "ezg";

/// Tag values (case-insensitive) that exclude a field from preload discovery.
pub const NO_PRELOAD_VALUES: [&str; 2] = ["no-preload", "nopreload"];
