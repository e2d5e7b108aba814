use chrono::{DateTime, Utc};
use sqlx::postgres::{PgArguments, Postgres};
use sqlx::query::QueryAs;
use std::collections::HashMap;

use crate::models::Pagination;

/// A value bound to a positional parameter
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    Text(String),
    Integer(i64),
    Timestamp(DateTime<Utc>),
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::Text(value)
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Text(value.to_string())
    }
}

impl From<i64> for QueryValue {
    fn from(value: i64) -> Self {
        QueryValue::Integer(value)
    }
}

impl From<u32> for QueryValue {
    fn from(value: u32) -> Self {
        QueryValue::Integer(i64::from(value))
    }
}

impl From<DateTime<Utc>> for QueryValue {
    fn from(value: DateTime<Utc>) -> Self {
        QueryValue::Timestamp(value)
    }
}

/// Filter name -> value. Iteration order is irrelevant to the rewrite.
pub type NamedParams = HashMap<String, QueryValue>;

/// A query with positional placeholders and the arguments that fill them
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    pub sql: String,
    pub args: Vec<QueryValue>,
}

impl BuiltQuery {
    /// Bind every argument, in position order, to a `query_as` built from `self.sql`.
    pub fn apply_bindings<'q, O>(
        &self,
        mut query: QueryAs<'q, Postgres, O, PgArguments>,
    ) -> QueryAs<'q, Postgres, O, PgArguments> {
        for arg in &self.args {
            query = match arg {
                QueryValue::Text(s) => query.bind(s.clone()),
                QueryValue::Integer(i) => query.bind(*i),
                QueryValue::Timestamp(t) => query.bind(*t),
            };
        }
        query
    }
}

/// Rewrite `:name` placeholders into `$1`, `$2`, ... positional parameters.
///
/// Placeholders are numbered in the order they appear in `query`, left to
/// right. A name used twice reuses its first position. Names missing from
/// `params` are left in the text untouched, and params whose name never
/// appears contribute no argument. `::type` casts and anything inside a
/// single-quoted literal are not placeholders.
pub fn rewrite_named_params(query: &str, params: &NamedParams) -> BuiltQuery {
    let bytes = query.as_bytes();
    let mut sql = String::with_capacity(query.len());
    let mut args = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut copied_up_to = 0;
    let mut in_literal = false;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\'' => {
                in_literal = !in_literal;
                i += 1;
            }
            b':' if !in_literal => {
                if bytes.get(i + 1) == Some(&b':') {
                    i += 2;
                    continue;
                }

                let start = i + 1;
                let mut end = start;
                while end < bytes.len() && is_name_byte(bytes[end], end == start) {
                    end += 1;
                }

                let name = &query[start..end];
                match params.get(name) {
                    Some(value) if !name.is_empty() => {
                        let position = *positions.entry(name).or_insert_with(|| {
                            args.push(value.clone());
                            args.len()
                        });
                        sql.push_str(&query[copied_up_to..i]);
                        sql.push('$');
                        sql.push_str(&position.to_string());
                        copied_up_to = end;
                        i = end;
                    }
                    _ => i += 1,
                }
            }
            _ => i += 1,
        }
    }

    sql.push_str(&query[copied_up_to..]);
    BuiltQuery { sql, args }
}

fn is_name_byte(byte: u8, first: bool) -> bool {
    if first {
        byte.is_ascii_alphabetic() || byte == b'_'
    } else {
        byte.is_ascii_alphanumeric() || byte == b'_'
    }
}

/// Builds a listing query from a base statement ending in a WHERE clause.
///
/// Predicate filters append `AND column = :pN` and are rewritten into
/// positional parameters. Pagination is kept apart and rendered as a
/// trailing `LIMIT $n OFFSET $m`.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    base: String,
    predicates: String,
    params: NamedParams,
    order_by: Option<String>,
    pagination: Pagination,
}

impl QueryBuilder {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            predicates: String::new(),
            params: NamedParams::new(),
            order_by: None,
            pagination: Pagination::default(),
        }
    }

    /// Add an equality predicate on `column`
    pub fn filter_eq(&mut self, column: &str, value: impl Into<QueryValue>) -> &mut Self {
        self.push_predicate(column, "", value.into())
    }

    /// Add an equality predicate whose parameter is cast, e.g. to `uuid`
    pub fn filter_eq_as(
        &mut self,
        column: &str,
        cast: &str,
        value: impl Into<QueryValue>,
    ) -> &mut Self {
        self.push_predicate(column, &format!("::{cast}"), value.into())
    }

    /// Add an equality predicate only when a value is present
    pub fn filter_opt<V: Into<QueryValue>>(&mut self, column: &str, value: Option<V>) -> &mut Self {
        if let Some(value) = value {
            self.filter_eq(column, value);
        }
        self
    }

    pub fn filter_opt_as<V: Into<QueryValue>>(
        &mut self,
        column: &str,
        cast: &str,
        value: Option<V>,
    ) -> &mut Self {
        if let Some(value) = value {
            self.filter_eq_as(column, cast, value);
        }
        self
    }

    pub fn order_by(&mut self, clause: &str) -> &mut Self {
        self.order_by = Some(clause.to_string());
        self
    }

    pub fn paginate(&mut self, pagination: Pagination) -> &mut Self {
        self.pagination = pagination;
        self
    }

    pub fn build(&self) -> BuiltQuery {
        let mut query = format!("{}{}", self.base.trim_end(), self.predicates);
        let mut params = self.params.clone();

        if let Some(order_by) = &self.order_by {
            query.push_str(" ORDER BY ");
            query.push_str(order_by);
        }
        if let Some(limit) = self.pagination.limit {
            query.push_str(" LIMIT :limit");
            params.insert("limit".to_string(), limit.into());
        }
        if let Some(offset) = self.pagination.offset.filter(|offset| *offset > 0) {
            query.push_str(" OFFSET :offset");
            params.insert("offset".to_string(), offset.into());
        }

        rewrite_named_params(&query, &params)
    }

    // One parameter per predicate
    fn push_predicate(&mut self, column: &str, cast: &str, value: QueryValue) -> &mut Self {
        let name = format!("p{}", self.params.len() + 1);
        self.predicates
            .push_str(&format!(" AND {column} = :{name}{cast}"));
        self.params.insert(name, value);
        self
    }
}
