//! The base query builder.
//!
//! [`BaseQuery`] is the interface the [`QueryCustomizer`](super::QueryCustomizer)
//! composes over: predicate storage, joins, eager-load registration, the select
//! list, and a dynamic-dispatch fallback for method names resolved at runtime.
//! [`QueryBuilder`] is the stock implementation.

use super::compiler::{
    DatabaseBackendType, Join, OrderBy, Query, SelectColumn, SqlCompiler, WhereClause, WhereNode,
};
use super::lookups::Lookup;
use crate::entity::{Entity, EntityMeta};
use crate::value::Value;
use quarry_core::{QuarryError, QuarryResult};
use tracing::trace;

/// The host builder operations the customizer delegates to.
pub trait BaseQuery {
    /// Returns the root entity's metadata.
    fn entity(&self) -> &'static EntityMeta;

    /// Returns the query AST built so far.
    fn query(&self) -> &Query;

    /// Returns the query AST for in-place edits.
    fn query_mut(&mut self) -> &mut Query;

    /// Appends one predicate clause.
    fn add_where(&mut self, clause: WhereClause);

    /// Appends a join unless an identical one is already present.
    fn join(&mut self, join: Join);

    /// Registers relations for eager loading.
    fn with(&mut self, relations: &[String]);

    /// Appends columns to the select list.
    fn add_select(&mut self, columns: Vec<SelectColumn>);

    /// Dynamic-dispatch fallback for methods named at runtime.
    fn call(&mut self, method: &str, args: &[Value]) -> QuarryResult<()>;

    /// Returns an empty builder for the same entity.
    fn fresh(&self) -> Box<dyn BaseQuery>;

    /// Consumes the builder, returning its query AST.
    fn into_query(self: Box<Self>) -> Query;
}

/// The stock [`BaseQuery`] implementation.
///
/// # Examples
///
/// ```
/// use quarry_db::entity::EntityMeta;
/// use quarry_db::query::builder::{BaseQuery, QueryBuilder};
/// use quarry_db::query::compiler::DatabaseBackendType;
/// use quarry_db::value::Value;
/// use std::sync::LazyLock;
///
/// static USERS: LazyLock<EntityMeta> = LazyLock::new(|| EntityMeta::new("User", "users"));
///
/// let mut builder = QueryBuilder::new(&USERS);
/// builder.call("limit", &[Value::from(5)]).unwrap();
/// let (sql, _) = builder.to_sql(DatabaseBackendType::PostgreSQL);
/// assert_eq!(sql, "SELECT * FROM \"users\" LIMIT 5");
/// ```
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    entity: &'static EntityMeta,
    query: Query,
}

impl QueryBuilder {
    /// Creates a builder targeting `entity`.
    pub fn new(entity: &'static EntityMeta) -> Self {
        Self {
            entity,
            query: Query::new(entity.table.clone()),
        }
    }

    /// Creates a builder targeting the entity type `E`.
    pub fn for_entity<E: Entity>() -> Self {
        Self::new(E::meta())
    }

    /// Compiles the query for the given backend.
    pub fn to_sql(&self, backend: DatabaseBackendType) -> (String, Vec<Value>) {
        SqlCompiler::new(backend).compile_select(&self.query)
    }

    fn register_eager(&mut self, name: &str) {
        if !self.query.eager_load.iter().any(|n| n == name) {
            self.query.eager_load.push(name.to_string());
        }
    }
}

impl BaseQuery for QueryBuilder {
    fn entity(&self) -> &'static EntityMeta {
        self.entity
    }

    fn query(&self) -> &Query {
        &self.query
    }

    fn query_mut(&mut self) -> &mut Query {
        &mut self.query
    }

    fn add_where(&mut self, clause: WhereClause) {
        self.query.wheres.push(clause);
    }

    fn join(&mut self, join: Join) {
        if !self.query.joins.contains(&join) {
            self.query.joins.push(join);
        }
    }

    /// A nested name such as `posts.comments` also registers `posts`.
    fn with(&mut self, relations: &[String]) {
        for relation in relations {
            let mut prefix = String::new();
            for segment in relation.split('.') {
                if !prefix.is_empty() {
                    prefix.push('.');
                }
                prefix.push_str(segment);
                self.register_eager(&prefix);
            }
        }
    }

    fn add_select(&mut self, columns: Vec<SelectColumn>) {
        self.query.columns.extend(columns);
    }

    fn call(&mut self, method: &str, args: &[Value]) -> QuarryResult<()> {
        trace!(entity = self.entity.name, method, "base builder dispatch");
        match method {
            "distinct" => {
                expect_arity(method, args, 0)?;
                self.query.distinct = true;
            }
            "limit" | "take" => {
                expect_arity(method, args, 1)?;
                self.query.limit = Some(usize_arg(method, &args[0])?);
            }
            "offset" | "skip" => {
                expect_arity(method, args, 1)?;
                self.query.offset = Some(usize_arg(method, &args[0])?);
            }
            "orderBy" => {
                let (column, direction) = match args {
                    [column] => (str_arg(method, column)?, "asc"),
                    [column, direction] => (str_arg(method, column)?, str_arg(method, direction)?),
                    _ => return Err(arity_error(method, "1 or 2", args.len())),
                };
                let order = match direction.to_lowercase().as_str() {
                    "asc" => OrderBy::asc(column),
                    "desc" => OrderBy::desc(column),
                    other => {
                        return Err(QuarryError::InvalidArgument(format!(
                            "{method}() direction must be 'asc' or 'desc', got '{other}'"
                        )))
                    }
                };
                self.query.order_by.push(order);
            }
            "orderByDesc" => {
                expect_arity(method, args, 1)?;
                self.query.order_by.push(OrderBy::desc(str_arg(method, &args[0])?));
            }
            "whereNull" | "whereNotNull" => {
                expect_arity(method, args, 1)?;
                let column = str_arg(method, &args[0])?;
                self.add_where(WhereClause::and(WhereNode::condition(
                    column,
                    Lookup::IsNull(method == "whereNull"),
                )));
            }
            "whereIn" => {
                expect_arity(method, args, 2)?;
                let column = str_arg(method, &args[0])?;
                let Value::List(values) = &args[1] else {
                    return Err(QuarryError::InvalidArgument(format!(
                        "{method}() expects a list, got {}",
                        args[1].type_name()
                    )));
                };
                self.add_where(WhereClause::and(WhereNode::condition(
                    column,
                    Lookup::In(values.clone()),
                )));
            }
            _ => return Err(QuarryError::method_not_found(self.entity.name, method)),
        }
        Ok(())
    }

    fn fresh(&self) -> Box<dyn BaseQuery> {
        Box::new(Self::new(self.entity))
    }

    fn into_query(self: Box<Self>) -> Query {
        self.query
    }
}

fn arity_error(method: &str, expected: &str, got: usize) -> QuarryError {
    QuarryError::InvalidArgument(format!(
        "{method}() expects {expected} argument(s), got {got}"
    ))
}

fn expect_arity(method: &str, args: &[Value], expected: usize) -> QuarryResult<()> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(arity_error(method, &expected.to_string(), args.len()))
    }
}

fn str_arg<'a>(method: &str, value: &'a Value) -> QuarryResult<&'a str> {
    value.as_str().ok_or_else(|| {
        QuarryError::InvalidArgument(format!(
            "{method}() expects a string, got {}",
            value.type_name()
        ))
    })
}

fn usize_arg(method: &str, value: &Value) -> QuarryResult<usize> {
    value
        .as_int()
        .and_then(|i| usize::try_from(i).ok())
        .ok_or_else(|| {
            QuarryError::InvalidArgument(format!(
                "{method}() expects a non-negative integer, got {value}"
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::LazyLock;

    static USERS: LazyLock<EntityMeta> = LazyLock::new(|| EntityMeta::new("User", "users"));

    fn builder() -> QueryBuilder {
        QueryBuilder::new(&USERS)
    }

    fn pg(b: &QueryBuilder) -> String {
        b.to_sql(DatabaseBackendType::PostgreSQL).0
    }

    #[test]
    fn test_new_builder_targets_entity_table() {
        let b = builder();
        assert_eq!(b.query().table, "users");
        assert_eq!(b.entity().name, "User");
        assert_eq!(pg(&b), "SELECT * FROM \"users\"");
    }

    #[test]
    fn test_with_registers_nested_parents_once() {
        let mut b = builder();
        b.with(&["posts.comments".to_string(), "posts".to_string(), "team".to_string()]);
        assert_eq!(b.query().eager_load, vec!["posts", "posts.comments", "team"]);
    }

    #[test]
    fn test_join_deduplicates() {
        let mut b = builder();
        b.join(Join::left("posts", "posts.user_id", "users.id"));
        b.join(Join::left("posts", "posts.user_id", "users.id"));
        assert_eq!(b.query().joins.len(), 1);
    }

    #[test]
    fn test_add_select_appends() {
        let mut b = builder();
        b.add_select(vec!["users.id".into()]);
        b.add_select(vec!["users.name".into()]);
        assert_eq!(pg(&b), "SELECT \"users\".\"id\", \"users\".\"name\" FROM \"users\"");
    }

    #[test]
    fn test_call_paging_and_ordering() {
        let mut b = builder();
        b.call("distinct", &[]).unwrap();
        b.call("orderBy", &["name".into()]).unwrap();
        b.call("orderBy", &["age".into(), "DESC".into()]).unwrap();
        b.call("orderByDesc", &["id".into()]).unwrap();
        b.call("take", &[Value::from(10)]).unwrap();
        b.call("skip", &[Value::from(30)]).unwrap();
        assert_eq!(
            pg(&b),
            "SELECT DISTINCT * FROM \"users\" ORDER BY \"name\" ASC, \"age\" DESC, \"id\" DESC LIMIT 10 OFFSET 30"
        );
    }

    #[test]
    fn test_call_where_helpers() {
        let mut b = builder();
        b.call("whereNull", &["deleted_at".into()]).unwrap();
        b.call("whereNotNull", &["email".into()]).unwrap();
        b.call("whereIn", &["id".into(), Value::list([1_i64, 2])]).unwrap();
        let (sql, params) = b.to_sql(DatabaseBackendType::SQLite);
        assert_eq!(
            sql,
            "SELECT * FROM \"users\" WHERE \"deleted_at\" IS NULL AND \"email\" IS NOT NULL AND \"id\" IN (?, ?)"
        );
        assert_eq!(params, vec![Value::Int(1), Value::Int(2)]);
    }

    #[test]
    fn test_call_argument_errors() {
        let mut b = builder();
        assert_eq!(b.call("limit", &[]).unwrap_err().kind(), "invalid_argument");
        assert_eq!(
            b.call("limit", &[Value::from(-1)]).unwrap_err().kind(),
            "invalid_argument"
        );
        assert_eq!(
            b.call("orderBy", &["a".into(), "sideways".into()]).unwrap_err().kind(),
            "invalid_argument"
        );
        assert_eq!(
            b.call("whereIn", &["id".into(), Value::from(1)]).unwrap_err().kind(),
            "invalid_argument"
        );
        assert_eq!(b.call("distinct", &[Value::Null]).unwrap_err().kind(), "invalid_argument");
    }

    #[test]
    fn test_call_unknown_method() {
        let mut b = builder();
        let err = b.call("popular", &[]).unwrap_err();
        assert!(matches!(
            &err,
            QuarryError::MethodNotFound { entity, method }
                if entity == "User" && method == "popular"
        ));
        assert_eq!(b.query(), QueryBuilder::new(&USERS).query());
    }

    #[test]
    fn test_fresh_and_into_query() {
        let mut b = builder();
        b.call("limit", &[Value::from(1)]).unwrap();
        let fresh = b.fresh();
        assert_eq!(fresh.query().limit, None);
        assert_eq!(fresh.entity().table, "users");
        let boxed: Box<dyn BaseQuery> = Box::new(b);
        assert_eq!(boxed.into_query().limit, Some(1));
    }
}
