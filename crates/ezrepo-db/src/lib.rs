//! # ezrepo-db: Generic CRUD over SQLite
//!
//! Uniform insert / update / delete / find / paginate / count for any model
//! implementing [`Entity`], with automatic preloading of nested relations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        ezrepo Data Flow                                 │
//! │                                                                         │
//! │  Caller: wrap(&mut author).find_one(&pool)                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                     ezrepo-db (THIS CRATE)                      │    │
//! │  │                                                                 │    │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐    │    │
//! │  │   │  repository   │    │    entity     │    │    pool      │    │    │
//! │  │   │               │    │               │    │              │    │    │
//! │  │   │ Crud / Repo   │───►│ Entity trait  │    │ DbConfig     │    │    │
//! │  │   │ generic SQL   │    │ Scope         │    │ connect()    │    │    │
//! │  │   │ preload exec  │    │ PreloadFn     │    │              │    │    │
//! │  │   └───────┬───────┘    └───────────────┘    └──────────────┘    │    │
//! │  │           │                                                     │    │
//! │  │           ▼  auto_preloads / PreloadSpec                        │    │
//! │  │   ┌─────────────────────────────────────────────────────────┐   │    │
//! │  │   │                ezrepo-core (descriptors)                │   │    │
//! │  │   └─────────────────────────────────────────────────────────┘   │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                     SQLite Database (sqlx)                      │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool configuration
//! - [`entity`] - The `Entity` capability models implement
//! - [`repository`] - `Crud` trait, `Repo` wrapper, generic statements, preloads
//! - [`query`] - SELECT / COUNT statement builder
//! - [`value`] - Dynamically typed column values
//! - [`error`] - Database error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ezrepo_db::{connect, wrap, DbConfig};
//!
//! let pool = connect(&DbConfig::from_env()?).await?;
//!
//! let mut author = Author { username: "SomeUser".into(), ..Default::default() };
//! wrap(&mut author).insert(&pool).await?;
//!
//! // Preloads posts, posts.images and posts.videos
//! let found = wrap(&mut Author { username: "SomeUser".into(), ..Default::default() })
//!     .find_one(&pool)
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod entity;
pub mod error;
pub mod pool;
pub mod query;
pub mod repository;
pub mod value;

// =============================================================================
// Re-exports
// =============================================================================

pub use entity::{entity_name, Entity, PreloadFn, Scope};
pub use error::{ConfigError, DbError, DbResult};
pub use pool::{connect, health_check, DbConfig};
pub use repository::preload::{belongs_to, has_many, save_has_many, unknown_relation};
pub use repository::{wrap, Crud, Repo};
pub use value::SqlValue;

// Descriptor types models need alongside the CRUD layer
pub use ezrepo_core::{describe_record, Describe, PreloadSpec};
