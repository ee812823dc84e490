//! # Preload Execution
//!
//! Loads related rows for models that were just read.
//!
//! ## How a Path Is Loaded
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Author::requires_preload()  (Auto → auto_preloads::<Author>())         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ["posts", "posts.images", "posts.videos"]                              │
//! │       │                                                                 │
//! │       │  one step at a time, parents first                              │
//! │       ▼                                                                 │
//! │  "posts.images" ──► Author::preload(authors, "posts", ["images"])       │
//! │                          │                                              │
//! │                          ▼  has_many descends into loaded posts         │
//! │                     Post::preload(posts, "images", [])                  │
//! │                          │                                              │
//! │                          ▼  last segment: one IN (...) query            │
//! │                     SELECT * FROM imgs WHERE post_id IN (?, ?)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A step's modifier shapes only the query of its last segment.

use std::collections::HashMap;

use ezrepo_core::auto_preloads;
use futures::future::BoxFuture;
use sqlx::SqlitePool;
use tracing::debug;

use super::generic::fetch_rows;
use super::Crud;
use crate::entity::{entity_name, scope_for, Entity, Scope};
use crate::error::{DbError, DbResult};
use crate::query::{Order, Select};
use crate::value::SqlValue;

/// Preloads every relation `M` requires into `rows`.
pub async fn apply_preloads<M: Entity>(rows: &mut [M], pool: &SqlitePool) -> DbResult<()> {
    let steps = M::requires_preload().resolve(&entity_name::<M>(), auto_preloads::<M>);

    for step in steps {
        debug!(table = M::TABLE, path = %step.path, "Preloading relation");

        let scope = scope_for(step.modifier);
        let segments = step.segments();
        let Some((relation, rest)) = segments.split_first() else {
            continue;
        };
        M::preload(rows.iter_mut().collect(), relation, rest, &scope, pool).await?;
    }
    Ok(())
}

/// Fallback arm for [`Entity::preload`] dispatchers.
pub fn unknown_relation<'a, M: Entity>(relation: &str) -> BoxFuture<'a, DbResult<()>> {
    let err = DbError::unknown_relation(entity_name::<M>(), relation);
    Box::pin(async move { Err(err) })
}

fn scoped(select: Select, scope: &Scope, primary_key: &str) -> Select {
    let select = match &scope.condition {
        Some((sql, args)) => select.where_sql(sql, args),
        None => select,
    };
    let select = match &scope.order_by {
        Some(order_by) => select.order_by_sql(order_by),
        None => select.order_by_column(primary_key, Order::Asc),
    };
    select.limit(scope.limit)
}

// =============================================================================
// Relation Loaders
// =============================================================================

/// One-to-many relation: children carry `foreign_key` pointing at the parent.
///
/// With `rest` empty the children are loaded with one `IN (...)` query,
/// grouped by foreign key and copied into every parent with that key in
/// parent order, replacing whatever `field` held. Otherwise loading continues
/// into the children already present.
///
/// ## Example
/// ```rust,ignore
/// fn preload<'a>(items: Vec<&'a mut Self>, relation: &'a str, rest: &'a [&'a str],
///                scope: &'a Scope, pool: &'a SqlitePool) -> BoxFuture<'a, DbResult<()>> {
///     match relation {
///         "posts" => has_many(items, "author_id", |a: &mut Author| &mut a.posts, rest, scope, pool),
///         _ => unknown_relation::<Self>(relation),
///     }
/// }
/// ```
pub fn has_many<'a, P, C>(
    parents: Vec<&'a mut P>,
    foreign_key: &'static str,
    field: fn(&mut P) -> &mut Vec<C>,
    rest: &'a [&'a str],
    scope: &'a Scope,
    pool: &'a SqlitePool,
) -> BoxFuture<'a, DbResult<()>>
where
    P: Entity,
    C: Entity + Clone,
{
    Box::pin(async move {
        if let Some((next, tail)) = rest.split_first() {
            let children: Vec<&'a mut C> = parents
                .into_iter()
                .flat_map(|parent| field(parent).iter_mut())
                .collect();
            if children.is_empty() {
                return Ok(());
            }
            return C::preload(children, next, tail, scope, pool).await;
        }

        let mut keys: Vec<i64> = parents.iter().filter_map(|parent| parent.id()).collect();
        keys.sort_unstable();
        keys.dedup();
        if keys.is_empty() {
            return Ok(());
        }

        let select = Select::from(C::TABLE)
            .where_in(foreign_key, keys.into_iter().map(SqlValue::Integer).collect());
        let children = fetch_rows::<C>(&scoped(select, scope, C::PRIMARY_KEY), pool).await?;
        debug!(table = C::TABLE, count = children.len(), "Loaded has-many rows");

        let mut grouped: HashMap<i64, Vec<C>> = HashMap::new();
        for child in children {
            if let Some(key) = child.column(foreign_key).and_then(|value| value.as_i64()) {
                grouped.entry(key).or_default().push(child);
            }
        }

        // Keys may repeat across parents; each gets the whole group.
        for parent in parents {
            let loaded = parent
                .id()
                .and_then(|id| grouped.get(&id).cloned())
                .unwrap_or_default();
            *field(parent) = loaded;
        }
        Ok(())
    })
}

/// Many-to-one relation: the parent carries `foreign_key` pointing at `C`.
pub fn belongs_to<'a, P, C>(
    parents: Vec<&'a mut P>,
    foreign_key: &'static str,
    field: fn(&mut P) -> &mut Option<C>,
    rest: &'a [&'a str],
    scope: &'a Scope,
    pool: &'a SqlitePool,
) -> BoxFuture<'a, DbResult<()>>
where
    P: Entity,
    C: Entity + Clone,
{
    Box::pin(async move {
        if let Some((next, tail)) = rest.split_first() {
            let targets: Vec<&'a mut C> = parents
                .into_iter()
                .filter_map(|parent| field(parent).as_mut())
                .collect();
            if targets.is_empty() {
                return Ok(());
            }
            return C::preload(targets, next, tail, scope, pool).await;
        }

        let mut keys: Vec<i64> = parents
            .iter()
            .filter_map(|parent| parent.column(foreign_key))
            .filter_map(|value| value.as_i64())
            .collect();
        keys.sort_unstable();
        keys.dedup();

        let mut by_id: HashMap<i64, C> = HashMap::new();
        if !keys.is_empty() {
            let select = Select::from(C::TABLE)
                .where_in(C::PRIMARY_KEY, keys.into_iter().map(SqlValue::Integer).collect());
            let targets = fetch_rows::<C>(&scoped(select, scope, C::PRIMARY_KEY), pool).await?;
            debug!(table = C::TABLE, count = targets.len(), "Loaded belongs-to rows");
            by_id = targets
                .into_iter()
                .filter_map(|target| target.id().map(|id| (id, target)))
                .collect();
        }

        for parent in parents {
            let key = parent.column(foreign_key).and_then(|value| value.as_i64());
            *field(parent) = key.and_then(|key| by_id.get(&key).cloned());
        }
        Ok(())
    })
}

// =============================================================================
// Association Writes
// =============================================================================

/// Saves each child through its own [`Crud::update`] after `link` set the
/// foreign key. Used from [`Entity::save_relations`].
pub async fn save_has_many<C, F>(children: &mut [C], pool: &SqlitePool, link: F) -> DbResult<()>
where
    C: Crud,
    F: Fn(&mut C) + Send + Sync,
{
    for child in children.iter_mut() {
        link(child);
        child.update(pool).await?;
    }
    Ok(())
}
