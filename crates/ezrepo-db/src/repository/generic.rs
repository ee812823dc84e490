//! # Generic CRUD Statements
//!
//! Default bodies behind every [`Crud`](super::Crud) method. Each function
//! works for any [`Entity`]; models only land here when they do not override
//! the corresponding trait method.
//!
//! ## Read Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  find / find_sql / find_paginated / find_one ...                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Select (conditions, ORDER BY id ASC|DESC, LIMIT/OFFSET)                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  rows ──► M::from_row                                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  shallow? ──yes──► return                                               │
//! │       │ no                                                              │
//! │       ▼                                                                 │
//! │  apply_preloads (requires_preload | auto_preloads)                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! "No match" is never an error: single reads give `None`, list reads give
//! an empty `Vec` and counts give `0`.

use sqlx::{Row, SqlitePool};
use tracing::debug;

use super::preload::apply_preloads;
use crate::entity::{entity_name, Entity};
use crate::error::{DbError, DbResult};
use crate::query::{quote_ident, Order, Select};
use crate::value::{bind_all, SqlValue};

const READ_FAILED: &str = "failed to read database";
const WRITE_FAILED: &str = "failed to write database";

// =============================================================================
// Writes
// =============================================================================

/// Inserts the model, stores the generated key and saves its relations.
///
/// A key that is already set is inserted as-is.
pub async fn insert<M: Entity>(model: &mut M, pool: &SqlitePool) -> DbResult<()> {
    let mut columns = model.columns();
    if let Some(id) = model.id() {
        columns.insert(0, (M::PRIMARY_KEY, SqlValue::Integer(id)));
    }

    let table = quote_ident(M::TABLE);
    let sql = if columns.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES", table)
    } else {
        let names = columns
            .iter()
            .map(|(name, _)| quote_ident(name))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = vec!["?"; columns.len()].join(", ");
        format!("INSERT INTO {} ({}) VALUES ({})", table, names, placeholders)
    };
    let values: Vec<SqlValue> = columns.into_iter().map(|(_, value)| value).collect();

    debug!(table = M::TABLE, "Inserting row");

    let result = bind_all(sqlx::query(&sql), &values)
        .execute(pool)
        .await
        .map_err(|e| DbError::from(e).context(WRITE_FAILED))?;

    model.set_id(result.last_insert_rowid());
    debug!(table = M::TABLE, id = result.last_insert_rowid(), "Row inserted");

    model.save_relations(pool).await
}

/// Saves every column of the model and then its relations.
///
/// ## Behavior
/// - No key yet: same as [`insert`]
/// - Key set but no such row: inserted with that key
/// - Otherwise: `UPDATE ... WHERE id = ?`
pub async fn update<M: Entity>(model: &mut M, pool: &SqlitePool) -> DbResult<()> {
    let Some(id) = model.id() else {
        return insert(model, pool).await;
    };

    let columns = model.columns();
    if columns.is_empty() {
        if !row_exists::<M>(id, pool).await? {
            return insert(model, pool).await;
        }
    } else {
        let assignments = columns
            .iter()
            .map(|(name, _)| format!("{} = ?", quote_ident(name)))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ?",
            quote_ident(M::TABLE),
            assignments,
            quote_ident(M::PRIMARY_KEY)
        );
        let mut values: Vec<SqlValue> = columns.into_iter().map(|(_, value)| value).collect();
        values.push(SqlValue::Integer(id));

        debug!(table = M::TABLE, id = id, "Updating row");

        let result = bind_all(sqlx::query(&sql), &values)
            .execute(pool)
            .await
            .map_err(|e| DbError::from(e).context(WRITE_FAILED))?;

        if result.rows_affected() == 0 {
            return insert(model, pool).await;
        }
    }

    model.save_relations(pool).await
}

async fn row_exists<M: Entity>(id: i64, pool: &SqlitePool) -> DbResult<bool> {
    let sql = format!(
        "SELECT 1 FROM {} WHERE {} = ? LIMIT 1",
        quote_ident(M::TABLE),
        quote_ident(M::PRIMARY_KEY)
    );
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(|e| DbError::from(e).context(READ_FAILED))?;
    Ok(row.is_some())
}

/// Deletes the row with the model's key.
///
/// ## Errors
/// [`DbError::MissingPrimaryKey`] when the model has no key.
pub async fn delete<M: Entity>(model: &M, pool: &SqlitePool) -> DbResult<()> {
    let id = model
        .id()
        .ok_or_else(|| DbError::missing_key(entity_name::<M>()))?;

    let sql = format!(
        "DELETE FROM {} WHERE {} = ?",
        quote_ident(M::TABLE),
        quote_ident(M::PRIMARY_KEY)
    );

    debug!(table = M::TABLE, id = id, "Deleting row");

    sqlx::query(&sql)
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| DbError::from(e).context(WRITE_FAILED))?;
    Ok(())
}

// =============================================================================
// Reads
// =============================================================================

/// First row matching the model's non-zero fields.
pub async fn find_one<M: Entity>(model: &M, pool: &SqlitePool, shallow: bool) -> DbResult<Option<M>> {
    let select = by_example(model, Order::Asc).limit(Some(1));
    first(select, pool, shallow).await
}

/// First row matching a raw condition.
pub async fn find_one_sql<M: Entity>(
    pool: &SqlitePool,
    sql: &str,
    args: &[SqlValue],
    shallow: bool,
) -> DbResult<Option<M>> {
    let select = by_sql::<M>(sql, args, Order::Asc).limit(Some(1));
    first(select, pool, shallow).await
}

/// All rows matching the model's non-zero fields.
pub async fn find<M: Entity>(
    model: &M,
    pool: &SqlitePool,
    shallow: bool,
    reverse: bool,
) -> DbResult<Vec<M>> {
    let select = by_example(model, Order::from_reverse(reverse));
    all(select, pool, shallow).await
}

/// All rows matching a raw condition, ordered by key.
pub async fn find_sql<M: Entity>(
    pool: &SqlitePool,
    sql: &str,
    args: &[SqlValue],
    shallow: bool,
) -> DbResult<Vec<M>> {
    let select = by_sql::<M>(sql, args, Order::Asc);
    all(select, pool, shallow).await
}

/// One page of rows matching the model's non-zero fields.
///
/// `None` leaves offset or limit unset.
pub async fn find_paginated<M: Entity>(
    model: &M,
    pool: &SqlitePool,
    offset: Option<u64>,
    limit: Option<u64>,
    reverse: bool,
    shallow: bool,
) -> DbResult<Vec<M>> {
    let select = by_example(model, Order::from_reverse(reverse))
        .offset(offset)
        .limit(limit);
    all(select, pool, shallow).await
}

/// One page of rows matching a raw condition.
pub async fn find_paginated_sql<M: Entity>(
    pool: &SqlitePool,
    offset: Option<u64>,
    limit: Option<u64>,
    reverse: bool,
    shallow: bool,
    sql: &str,
    args: &[SqlValue],
) -> DbResult<Vec<M>> {
    let select = by_sql::<M>(sql, args, Order::from_reverse(reverse))
        .offset(offset)
        .limit(limit);
    all(select, pool, shallow).await
}

/// First row of the model's table that has a partner in `table`.
///
/// Always preloads.
pub async fn join<M: Entity>(pool: &SqlitePool, table: &str, condition: &str) -> DbResult<Option<M>> {
    let select = Select::from(M::TABLE)
        .inner_join(table, condition)
        .order_by_column(M::PRIMARY_KEY, Order::Asc)
        .limit(Some(1));
    first(select, pool, false).await
}

// =============================================================================
// Counts
// =============================================================================

/// Number of rows matching the model's non-zero fields.
pub async fn count<M: Entity>(model: &M, pool: &SqlitePool) -> DbResult<u64> {
    let select = Select::from(M::TABLE).where_columns(model.conditions());
    count_rows(&select, pool).await
}

/// Number of rows matching a raw condition.
pub async fn count_sql<M: Entity>(pool: &SqlitePool, sql: &str, args: &[SqlValue]) -> DbResult<u64> {
    let select = Select::from(M::TABLE).where_sql(sql, args);
    count_rows(&select, pool).await
}

// =============================================================================
// Helpers
// =============================================================================

fn by_example<M: Entity>(model: &M, order: Order) -> Select {
    Select::from(M::TABLE)
        .where_columns(model.conditions())
        .order_by_column(M::PRIMARY_KEY, order)
}

fn by_sql<M: Entity>(sql: &str, args: &[SqlValue], order: Order) -> Select {
    Select::from(M::TABLE)
        .where_sql(sql, args)
        .order_by_column(M::PRIMARY_KEY, order)
}

/// Runs a row query and decodes every row.
pub(crate) async fn fetch_rows<M: Entity>(select: &Select, pool: &SqlitePool) -> DbResult<Vec<M>> {
    let sql = select.to_sql();
    debug!(table = M::TABLE, sql = %sql, "Fetching rows");

    let rows = bind_all(sqlx::query(&sql), select.args())
        .fetch_all(pool)
        .await
        .map_err(|e| DbError::from(e).context(READ_FAILED))?;

    rows.iter()
        .map(|row| M::from_row(row).map_err(|e| DbError::from(e).context(READ_FAILED)))
        .collect()
}

async fn all<M: Entity>(select: Select, pool: &SqlitePool, shallow: bool) -> DbResult<Vec<M>> {
    let mut rows = fetch_rows::<M>(&select, pool).await?;
    debug!(table = M::TABLE, count = rows.len(), shallow = shallow, "Rows loaded");

    if !shallow && !rows.is_empty() {
        apply_preloads(&mut rows, pool).await?;
    }
    Ok(rows)
}

async fn first<M: Entity>(select: Select, pool: &SqlitePool, shallow: bool) -> DbResult<Option<M>> {
    let rows = all::<M>(select, pool, shallow).await?;
    Ok(rows.into_iter().next())
}

async fn count_rows(select: &Select, pool: &SqlitePool) -> DbResult<u64> {
    let sql = select.to_count_sql();
    debug!(sql = %sql, "Counting rows");

    let row = bind_all(sqlx::query(&sql), select.args())
        .fetch_one(pool)
        .await
        .map_err(|e| DbError::from(e).context(READ_FAILED))?;
    let count: i64 = row
        .try_get(0)
        .map_err(|e| DbError::from(e).context(READ_FAILED))?;

    Ok(u64::try_from(count).unwrap_or(0))
}
