//! # Statement Builder
//!
//! Assembles the SELECT / COUNT statements used by the generic CRUD layer.
//!
//! ## Statement Shape
//! ```text
//! SELECT "posts".* FROM "posts"
//!   [INNER JOIN <table> ON <condition>]
//!   [WHERE <cond> AND (<user sql>) AND ...]
//!   [ORDER BY "posts"."id" ASC]
//!   [LIMIT n | LIMIT -1] [OFFSET m]
//! ```
//!
//! Placeholders are plain `?`; arguments are collected in the same order the
//! conditions are pushed.

use crate::value::SqlValue;

/// Quotes an SQLite identifier.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Sort direction on the primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

impl Order {
    pub fn from_reverse(reverse: bool) -> Self {
        if reverse {
            Order::Desc
        } else {
            Order::Asc
        }
    }

    fn as_sql(&self) -> &'static str {
        match self {
            Order::Asc => "ASC",
            Order::Desc => "DESC",
        }
    }
}

/// A SELECT statement under construction.
#[derive(Debug, Clone)]
pub struct Select {
    table: String,
    joins: Vec<String>,
    conditions: Vec<String>,
    args: Vec<SqlValue>,
    order_by: Option<String>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl Select {
    pub fn from(table: &str) -> Self {
        Select {
            table: table.to_string(),
            joins: Vec::new(),
            conditions: Vec::new(),
            args: Vec::new(),
            order_by: None,
            limit: None,
            offset: None,
        }
    }

    /// `"table"."column" = ?` for each pair; NULL values use `IS NULL`.
    pub fn where_columns(mut self, columns: Vec<(&str, SqlValue)>) -> Self {
        for (column, value) in columns {
            let target = format!("{}.{}", quote_ident(&self.table), quote_ident(column));
            if value == SqlValue::Null {
                self.conditions.push(format!("{} IS NULL", target));
            } else {
                self.conditions.push(format!("{} = ?", target));
                self.args.push(value);
            }
        }
        self
    }

    /// Raw condition with `?` placeholders, wrapped in parentheses.
    pub fn where_sql(mut self, sql: &str, args: &[SqlValue]) -> Self {
        if !sql.trim().is_empty() {
            self.conditions.push(format!("({})", sql));
            self.args.extend_from_slice(args);
        }
        self
    }

    /// `"table"."column" IN (?, ?, ...)`. An empty list matches nothing.
    pub fn where_in(mut self, column: &str, values: Vec<SqlValue>) -> Self {
        let target = format!("{}.{}", quote_ident(&self.table), quote_ident(column));
        if values.is_empty() {
            self.conditions.push("0 = 1".to_string());
            return self;
        }
        let placeholders = vec!["?"; values.len()].join(", ");
        self.conditions.push(format!("{} IN ({})", target, placeholders));
        self.args.extend(values);
        self
    }

    pub fn inner_join(mut self, table: &str, condition: &str) -> Self {
        self.joins.push(format!("INNER JOIN {} ON {}", table, condition));
        self
    }

    /// Orders by a column of the selected table.
    pub fn order_by_column(mut self, column: &str, order: Order) -> Self {
        self.order_by = Some(format!(
            "{}.{} {}",
            quote_ident(&self.table),
            quote_ident(column),
            order.as_sql()
        ));
        self
    }

    /// Orders by a raw expression, replacing any previous ordering.
    pub fn order_by_sql(mut self, sql: &str) -> Self {
        self.order_by = Some(sql.to_string());
        self
    }

    pub fn limit(mut self, limit: Option<u64>) -> Self {
        self.limit = limit;
        self
    }

    pub fn offset(mut self, offset: Option<u64>) -> Self {
        self.offset = offset;
        self
    }

    pub fn args(&self) -> &[SqlValue] {
        &self.args
    }

    fn push_from_and_where(&self, sql: &mut String) {
        sql.push_str(" FROM ");
        sql.push_str(&quote_ident(&self.table));
        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join);
        }
        if !self.conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.conditions.join(" AND "));
        }
    }

    /// Renders the row query.
    pub fn to_sql(&self) -> String {
        let mut sql = format!("SELECT {}.*", quote_ident(&self.table));
        self.push_from_and_where(&mut sql);

        if let Some(order_by) = &self.order_by {
            sql.push_str(" ORDER BY ");
            sql.push_str(order_by);
        }

        match (self.limit, self.offset) {
            (Some(limit), _) => sql.push_str(&format!(" LIMIT {}", limit)),
            // SQLite only accepts OFFSET after a LIMIT.
            (None, Some(_)) => sql.push_str(" LIMIT -1"),
            (None, None) => {}
        }
        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {}", offset));
        }
        sql
    }

    /// Renders `SELECT COUNT(*)` over the same source and conditions.
    pub fn to_count_sql(&self) -> String {
        let mut sql = String::from("SELECT COUNT(*)");
        self.push_from_and_where(&mut sql);
        sql
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
