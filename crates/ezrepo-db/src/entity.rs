//! # Entity Capability
//!
//! What the generic CRUD layer needs to know about a model.
//!
//! ## Responsibilities
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Entity (implemented once per model)                                    │
//! │                                                                         │
//! │  TABLE / PRIMARY_KEY      where the rows live                           │
//! │  id() / set_id()          integer primary key, None before insert       │
//! │  columns()                persisted values, key excluded                │
//! │  conditions()             WHERE clause for "find by example"            │
//! │  requires_preload()       Auto (default) | Single | Multi               │
//! │  preload()                relation name → has_many / belongs_to         │
//! │  save_relations()         associations written by update()              │
//! │                                                                         │
//! │  Describe (ezrepo-core)   descriptor for auto preload discovery         │
//! │  FromRow                  row decoding (relation fields #[sqlx(skip)])  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use ezrepo_core::introspect::resolve_record;
use ezrepo_core::{Describe, PreloadSpec};
use futures::future::BoxFuture;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, SqlitePool};

use crate::error::{DbError, DbResult};
use crate::value::SqlValue;

// =============================================================================
// Preload Scope
// =============================================================================

/// Extra clauses for the query that loads one preloaded relation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scope {
    pub(crate) condition: Option<(String, Vec<SqlValue>)>,
    pub(crate) order_by: Option<String>,
    pub(crate) limit: Option<u64>,
}

impl Scope {
    /// Adds a raw condition with `?` placeholders.
    pub fn filter(&mut self, sql: impl Into<String>, args: Vec<SqlValue>) -> &mut Self {
        self.condition = Some((sql.into(), args));
        self
    }

    /// Replaces the default primary-key ordering.
    pub fn order_by(&mut self, sql: impl Into<String>) -> &mut Self {
        self.order_by = Some(sql.into());
        self
    }

    pub fn limit(&mut self, limit: u64) -> &mut Self {
        self.limit = Some(limit);
        self
    }
}

/// Modifier applied to the scope of one preload step.
pub type PreloadFn = fn(&mut Scope);

/// Builds the scope for a step's optional modifier.
pub(crate) fn scope_for(modifier: Option<PreloadFn>) -> Scope {
    let mut scope = Scope::default();
    if let Some(modify) = modifier {
        modify(&mut scope);
    }
    scope
}

// =============================================================================
// Entity
// =============================================================================

/// Record name of a model's descriptor, used in errors and logs.
pub fn entity_name<M: Describe + ?Sized>() -> String {
    resolve_record(&M::type_desc())
        .map(|record| record.name().to_string())
        .unwrap_or_else(|| std::any::type_name::<M>().to_string())
}

/// A model stored in one table with an integer primary key.
pub trait Entity:
    Describe + for<'r> FromRow<'r, SqliteRow> + Send + Sync + Unpin + 'static
{
    /// Table name.
    const TABLE: &'static str;

    /// Primary key column.
    const PRIMARY_KEY: &'static str = "id";

    /// Primary key, `None` until the row exists.
    fn id(&self) -> Option<i64>;

    fn set_id(&mut self, id: i64);

    /// Persisted column values in a stable order, primary key excluded.
    fn columns(&self) -> Vec<(&'static str, SqlValue)>;

    /// Conditions used when the model acts as a query-by-example: the primary
    /// key when set plus every non-zero column.
    fn conditions(&self) -> Vec<(&'static str, SqlValue)> {
        let mut out = Vec::new();
        if let Some(id) = self.id() {
            out.push((Self::PRIMARY_KEY, SqlValue::Integer(id)));
        }
        out.extend(self.columns().into_iter().filter(|(_, v)| !v.is_zero()));
        out
    }

    /// Value of one persisted column.
    fn column(&self, name: &str) -> Option<SqlValue> {
        if name == Self::PRIMARY_KEY {
            return self.id().map(SqlValue::Integer);
        }
        self.columns()
            .into_iter()
            .find(|(column, _)| *column == name)
            .map(|(_, value)| value)
    }

    /// Relations to preload on non-shallow reads.
    fn requires_preload() -> PreloadSpec<PreloadFn> {
        PreloadSpec::Auto
    }

    /// Loads `relation` for `items`, then continues with `rest` inside it.
    ///
    /// Models with relations dispatch on the name to
    /// [`has_many`](crate::repository::preload::has_many) or
    /// [`belongs_to`](crate::repository::preload::belongs_to).
    fn preload<'a>(
        items: Vec<&'a mut Self>,
        relation: &'a str,
        rest: &'a [&'a str],
        scope: &'a Scope,
        pool: &'a SqlitePool,
    ) -> BoxFuture<'a, DbResult<()>> {
        let _ = (items, rest, scope, pool);
        Box::pin(async move { Err(DbError::unknown_relation(entity_name::<Self>(), relation)) })
    }

    /// Writes associated rows after the model itself was saved.
    fn save_relations<'a>(&'a mut self, pool: &'a SqlitePool) -> BoxFuture<'a, DbResult<()>> {
        let _ = pool;
        Box::pin(async { Ok(()) })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn newest_first(scope: &mut Scope) {
        scope.order_by("id DESC").limit(2);
    }

    #[test]
    fn test_scope_for_modifier() {
        assert_eq!(scope_for(None), Scope::default());

        let scope = scope_for(Some(newest_first));
        assert_eq!(scope.order_by.as_deref(), Some("id DESC"));
        assert_eq!(scope.limit, Some(2));
        assert!(scope.condition.is_none());
    }
}
