//! # Repository Module
//!
//! One CRUD surface for every model.
//!
//! ## Wrapper Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Generic Repository                                   │
//! │                                                                         │
//! │  Caller                                                                 │
//! │       │                                                                 │
//! │       │  wrap(&mut Author { username: "SomeUser".into(), ..default })   │
//! │       │      .find_one(&pool)                                           │
//! │       ▼                                                                 │
//! │  Repo<'_, Author>           (thin forwarder, never owns the model)      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Crud for Author            override?  ──yes──► model's own body        │
//! │       │ no                                                              │
//! │       ▼                                                                 │
//! │  generic::find_one          Select + preload                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Overrides
//! Every [`Crud`] method has a default body in [`generic`]. A model opts in
//! with `impl Crud for Author {}` and replaces only the methods it needs:
//!
//! ```rust,ignore
//! #[async_trait]
//! impl Crud for Session {
//!     async fn delete(&self, pool: &SqlitePool) -> DbResult<()> {
//!         sqlx::query("DELETE FROM sessions WHERE token = ?")
//!             .bind(&self.token)
//!             .execute(pool)
//!             .await?;
//!         Ok(())
//!     }
//! }
//! ```

pub mod generic;
pub mod preload;

#[cfg(test)]
mod tests;

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::entity::Entity;
use crate::error::DbResult;
use crate::value::SqlValue;

// =============================================================================
// Crud
// =============================================================================

/// CRUD operations with per-model overrides.
///
/// The read methods treat `self` as an example: its primary key and every
/// non-zero column become equality conditions.
#[async_trait]
pub trait Crud: Entity {
    /// Inserts the model and its relations, storing the new key.
    async fn insert(&mut self, pool: &SqlitePool) -> DbResult<()> {
        generic::insert(self, pool).await
    }

    /// Saves all columns, inserting when the row doesn't exist yet.
    async fn update(&mut self, pool: &SqlitePool) -> DbResult<()> {
        generic::update(self, pool).await
    }

    /// Deletes the row with the model's key.
    async fn delete(&self, pool: &SqlitePool) -> DbResult<()> {
        generic::delete(self, pool).await
    }

    async fn find_one(&self, pool: &SqlitePool, shallow: bool) -> DbResult<Option<Self>> {
        generic::find_one(self, pool, shallow).await
    }

    async fn find_one_sql(
        &self,
        pool: &SqlitePool,
        sql: &str,
        args: &[SqlValue],
        shallow: bool,
    ) -> DbResult<Option<Self>> {
        generic::find_one_sql(pool, sql, args, shallow).await
    }

    async fn find(&self, pool: &SqlitePool, shallow: bool, reverse: bool) -> DbResult<Vec<Self>> {
        generic::find(self, pool, shallow, reverse).await
    }

    async fn find_sql(
        &self,
        pool: &SqlitePool,
        sql: &str,
        args: &[SqlValue],
        shallow: bool,
    ) -> DbResult<Vec<Self>> {
        generic::find_sql(pool, sql, args, shallow).await
    }

    async fn find_paginated(
        &self,
        pool: &SqlitePool,
        offset: Option<u64>,
        limit: Option<u64>,
        reverse: bool,
        shallow: bool,
    ) -> DbResult<Vec<Self>> {
        generic::find_paginated(self, pool, offset, limit, reverse, shallow).await
    }

    #[allow(clippy::too_many_arguments)]
    async fn find_paginated_sql(
        &self,
        pool: &SqlitePool,
        offset: Option<u64>,
        limit: Option<u64>,
        reverse: bool,
        shallow: bool,
        sql: &str,
        args: &[SqlValue],
    ) -> DbResult<Vec<Self>> {
        generic::find_paginated_sql(pool, offset, limit, reverse, shallow, sql, args).await
    }

    async fn count(&self, pool: &SqlitePool) -> DbResult<u64> {
        generic::count(self, pool).await
    }

    async fn count_sql(&self, pool: &SqlitePool, sql: &str, args: &[SqlValue]) -> DbResult<u64> {
        generic::count_sql::<Self>(pool, sql, args).await
    }
}

// =============================================================================
// Repo
// =============================================================================

/// Borrowing wrapper that exposes the CRUD surface for one model value.
///
/// `shallow_*` variants skip preloading; the rest preload.
pub struct Repo<'a, M> {
    obj: &'a mut M,
}

/// Wraps a model for CRUD calls.
///
/// ## Example
/// ```rust,ignore
/// let mut author = Author { username: "SomeUser".into(), ..Default::default() };
/// wrap(&mut author).insert(&pool).await?;
/// let posts = wrap(&mut Post::default()).find(&pool).await?;
/// ```
pub fn wrap<M: Crud>(obj: &mut M) -> Repo<'_, M> {
    Repo { obj }
}

impl<'a, M: Crud> Repo<'a, M> {
    /// The wrapped model.
    pub fn m(&self) -> &M {
        &*self.obj
    }

    pub async fn insert(&mut self, pool: &SqlitePool) -> DbResult<()> {
        self.obj.insert(pool).await
    }

    pub async fn update(&mut self, pool: &SqlitePool) -> DbResult<()> {
        self.obj.update(pool).await
    }

    pub async fn delete(&self, pool: &SqlitePool) -> DbResult<()> {
        self.obj.delete(pool).await
    }

    pub async fn find_one(&self, pool: &SqlitePool) -> DbResult<Option<M>> {
        self.obj.find_one(pool, false).await
    }

    pub async fn shallow_find_one(&self, pool: &SqlitePool) -> DbResult<Option<M>> {
        self.obj.find_one(pool, true).await
    }

    pub async fn find_one_sql(&self, pool: &SqlitePool, sql: &str, args: &[SqlValue]) -> DbResult<Option<M>> {
        self.obj.find_one_sql(pool, sql, args, false).await
    }

    pub async fn shallow_find_one_sql(
        &self,
        pool: &SqlitePool,
        sql: &str,
        args: &[SqlValue],
    ) -> DbResult<Option<M>> {
        self.obj.find_one_sql(pool, sql, args, true).await
    }

    pub async fn find(&self, pool: &SqlitePool) -> DbResult<Vec<M>> {
        self.obj.find(pool, false, false).await
    }

    /// Like [`find`](Self::find), newest key first.
    pub async fn find_reverse(&self, pool: &SqlitePool) -> DbResult<Vec<M>> {
        self.obj.find(pool, false, true).await
    }

    pub async fn shallow_find(&self, pool: &SqlitePool) -> DbResult<Vec<M>> {
        self.obj.find(pool, true, false).await
    }

    pub async fn find_sql(&self, pool: &SqlitePool, sql: &str, args: &[SqlValue]) -> DbResult<Vec<M>> {
        self.obj.find_sql(pool, sql, args, false).await
    }

    pub async fn shallow_find_sql(&self, pool: &SqlitePool, sql: &str, args: &[SqlValue]) -> DbResult<Vec<M>> {
        self.obj.find_sql(pool, sql, args, true).await
    }

    /// First row of `M` with a partner row in `table` under `condition`.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let foo = wrap(&mut Foo::default())
    ///     .join(&pool, "bars", "foos.id = bars.foo_id")
    ///     .await?;
    /// ```
    pub async fn join(&self, pool: &SqlitePool, table: &str, condition: &str) -> DbResult<Option<M>> {
        generic::join(pool, table, condition).await
    }

    pub async fn find_paginated(
        &self,
        pool: &SqlitePool,
        offset: Option<u64>,
        limit: Option<u64>,
        reverse: bool,
    ) -> DbResult<Vec<M>> {
        self.obj.find_paginated(pool, offset, limit, reverse, false).await
    }

    pub async fn shallow_find_paginated(
        &self,
        pool: &SqlitePool,
        offset: Option<u64>,
        limit: Option<u64>,
        reverse: bool,
    ) -> DbResult<Vec<M>> {
        self.obj.find_paginated(pool, offset, limit, reverse, true).await
    }

    pub async fn find_paginated_sql(
        &self,
        pool: &SqlitePool,
        offset: Option<u64>,
        limit: Option<u64>,
        reverse: bool,
        sql: &str,
        args: &[SqlValue],
    ) -> DbResult<Vec<M>> {
        self.obj
            .find_paginated_sql(pool, offset, limit, reverse, false, sql, args)
            .await
    }

    pub async fn shallow_find_paginated_sql(
        &self,
        pool: &SqlitePool,
        offset: Option<u64>,
        limit: Option<u64>,
        reverse: bool,
        sql: &str,
        args: &[SqlValue],
    ) -> DbResult<Vec<M>> {
        self.obj
            .find_paginated_sql(pool, offset, limit, reverse, true, sql, args)
            .await
    }

    pub async fn count(&self, pool: &SqlitePool) -> DbResult<u64> {
        self.obj.count(pool).await
    }

    pub async fn count_sql(&self, pool: &SqlitePool, sql: &str, args: &[SqlValue]) -> DbResult<u64> {
        self.obj.count_sql(pool, sql, args).await
    }
}
