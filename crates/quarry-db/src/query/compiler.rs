//! SQL query AST and compiler.
//!
//! This module defines the [`Query`] AST that a builder mutates, and the
//! [`SqlCompiler`] that translates it into parameterized SQL strings. The
//! compiler supports PostgreSQL (`$1, $2, ...`) and SQLite/MySQL (`?`)
//! parameter placeholder styles.

use super::lookups::{Lookup, Q};
use crate::value::Value;

/// The type of database backend, used by the compiler to generate
/// backend-specific SQL syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseBackendType {
    /// PostgreSQL (uses `$1, $2, ...` placeholders).
    PostgreSQL,
    /// SQLite (uses `?` placeholders).
    SQLite,
    /// MySQL (uses `?` placeholders).
    MySQL,
}

/// How a predicate attaches to the ones before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Boolean {
    /// `AND`
    #[default]
    And,
    /// `OR`
    Or,
}

impl Boolean {
    /// Returns the SQL keyword for this connector.
    pub const fn sql_keyword(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

/// The left-hand side of a predicate.
///
/// `Name` is an identifier that may be rewritten (sentinel substitution) and
/// is quoted on output. `Raw` is an SQL fragment emitted verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnExpr {
    /// A possibly qualified column name, e.g. `users.email`.
    Name(String),
    /// A raw SQL fragment, e.g. `lower(name)`.
    Raw(String),
}

impl ColumnExpr {
    /// Creates a raw SQL fragment.
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::Raw(sql.into())
    }

    /// Returns the textual column name, if this is not a raw fragment.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Name(name) => Some(name),
            Self::Raw(_) => None,
        }
    }
}

impl From<&str> for ColumnExpr {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for ColumnExpr {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

/// A column ordering direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// The column to order by.
    pub column: String,
    /// Whether to sort in descending order.
    pub descending: bool,
}

impl OrderBy {
    /// Creates an ascending order.
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: false,
        }
    }

    /// Creates a descending order.
    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            descending: true,
        }
    }
}

/// A column to select in a query.
///
/// Equality is exact textual match, which is what de-duplication of the
/// root table wildcard relies on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectColumn {
    /// A possibly qualified column name or wildcard, e.g. `users.*`.
    Column(String),
    /// A raw SQL fragment.
    Raw(String),
}

impl SelectColumn {
    /// Creates a `table.*` wildcard column.
    pub fn wildcard(table: &str) -> Self {
        Self::Column(format!("{table}.*"))
    }
}

impl From<&str> for SelectColumn {
    fn from(name: &str) -> Self {
        Self::Column(name.to_string())
    }
}

/// A WHERE clause node in the query AST.
#[derive(Debug, Clone, PartialEq)]
pub enum WhereNode {
    /// A single condition.
    Condition {
        /// The column expression.
        column: ColumnExpr,
        /// The lookup type.
        lookup: Lookup,
    },
    /// Logical AND of conditions.
    And(Vec<WhereNode>),
    /// Logical OR of conditions.
    Or(Vec<WhereNode>),
    /// Logical NOT of a condition.
    Not(Box<WhereNode>),
    /// A parenthesised group of clauses with their own connectors.
    Nested(Vec<WhereClause>),
}

impl WhereNode {
    /// Creates a condition node.
    pub fn condition(column: impl Into<ColumnExpr>, lookup: Lookup) -> Self {
        Self::Condition {
            column: column.into(),
            lookup,
        }
    }

    /// Converts a `Q` object into a `WhereNode`.
    pub fn from_q(q: &Q) -> Self {
        match q {
            Q::Filter { field, lookup } => Self::Condition {
                column: ColumnExpr::Name(field.clone()),
                lookup: lookup.clone(),
            },
            Q::And(children) => Self::And(children.iter().map(Self::from_q).collect()),
            Q::Or(children) => Self::Or(children.iter().map(Self::from_q).collect()),
            Q::Not(inner) => Self::Not(Box::new(Self::from_q(inner))),
        }
    }
}

/// One entry in a query's ordered predicate list.
#[derive(Debug, Clone, PartialEq)]
pub struct WhereClause {
    /// The connector to the preceding clause (ignored for the first one).
    pub boolean: Boolean,
    /// The predicate itself.
    pub node: WhereNode,
}

impl WhereClause {
    /// Creates a clause with the given connector.
    pub const fn new(boolean: Boolean, node: WhereNode) -> Self {
        Self { boolean, node }
    }

    /// Creates an AND-connected clause.
    pub const fn and(node: WhereNode) -> Self {
        Self::new(Boolean::And, node)
    }

    /// Creates an OR-connected clause.
    pub const fn or(node: WhereNode) -> Self {
        Self::new(Boolean::Or, node)
    }
}

/// A JOIN clause in the query AST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    /// The table to join.
    pub table: String,
    /// The type of join.
    pub join_type: JoinType,
    /// Left operand of the ON condition (a qualified column).
    pub first: String,
    /// Comparison operator of the ON condition.
    pub operator: String,
    /// Right operand of the ON condition (a qualified column).
    pub second: String,
}

impl Join {
    /// Creates a LEFT JOIN on `first = second`.
    pub fn left(
        table: impl Into<String>,
        first: impl Into<String>,
        second: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            join_type: JoinType::Left,
            first: first.into(),
            operator: "=".to_string(),
            second: second.into(),
        }
    }

    /// Creates an INNER JOIN on `first = second`.
    pub fn inner(
        table: impl Into<String>,
        first: impl Into<String>,
        second: impl Into<String>,
    ) -> Self {
        Self {
            join_type: JoinType::Inner,
            ..Self::left(table, first, second)
        }
    }
}

/// SQL JOIN types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    /// INNER JOIN.
    Inner,
    /// LEFT OUTER JOIN.
    Left,
    /// RIGHT OUTER JOIN (not supported by SQLite).
    Right,
}

impl JoinType {
    /// Returns the SQL keyword for this join type.
    pub const fn sql_keyword(&self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
            Self::Right => "RIGHT JOIN",
        }
    }
}

/// The mutable builder state for one SELECT statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    /// The root table name.
    pub table: String,
    /// Explicitly selected columns; empty means `*`.
    pub columns: Vec<SelectColumn>,
    /// Ordered predicate clauses.
    pub wheres: Vec<WhereClause>,
    /// JOIN clauses.
    pub joins: Vec<Join>,
    /// Relation names registered for eager loading, in registration order.
    pub eager_load: Vec<String>,
    /// ORDER BY clauses.
    pub order_by: Vec<OrderBy>,
    /// LIMIT.
    pub limit: Option<usize>,
    /// OFFSET.
    pub offset: Option<usize>,
    /// DISTINCT flag.
    pub distinct: bool,
}

impl Query {
    /// Creates a new query for the given table.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            wheres: Vec::new(),
            joins: Vec::new(),
            eager_load: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
            distinct: false,
        }
    }
}

/// Quotes a possibly qualified identifier segment by segment.
///
/// `*` segments are left bare so `users.*` becomes `"users".*`.
pub fn quote_identifier(name: &str) -> String {
    name.split('.')
        .map(|part| {
            if part == "*" {
                part.to_string()
            } else {
                format!("\"{}\"", part.replace('"', "\"\""))
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}

/// The SQL compiler translates a [`Query`] AST into parameterized SQL.
///
/// Different backends use different placeholder styles:
/// - PostgreSQL: `$1, $2, $3, ...`
/// - SQLite / MySQL: `?, ?, ?, ...`
pub struct SqlCompiler {
    backend: DatabaseBackendType,
}

impl SqlCompiler {
    /// Creates a new compiler for the given backend type.
    pub const fn new(backend: DatabaseBackendType) -> Self {
        Self { backend }
    }

    /// Returns a parameter placeholder for the given 1-based index.
    fn placeholder(&self, index: usize) -> String {
        match self.backend {
            DatabaseBackendType::PostgreSQL => format!("${index}"),
            DatabaseBackendType::SQLite | DatabaseBackendType::MySQL => "?".to_string(),
        }
    }

    /// Compiles a SELECT query into SQL and parameters.
    pub fn compile_select(&self, query: &Query) -> (String, Vec<Value>) {
        let mut params: Vec<Value> = Vec::new();
        let mut sql = String::from("SELECT ");

        if query.distinct {
            sql.push_str("DISTINCT ");
        }

        // SELECT columns
        if query.columns.is_empty() {
            sql.push('*');
        } else {
            let select_parts: Vec<String> = query
                .columns
                .iter()
                .map(|col| match col {
                    SelectColumn::Column(name) => quote_identifier(name),
                    SelectColumn::Raw(raw) => raw.clone(),
                })
                .collect();
            sql.push_str(&select_parts.join(", "));
        }

        // FROM
        sql.push_str(&format!(" FROM {}", quote_identifier(&query.table)));

        // JOINs
        for join in &query.joins {
            sql.push_str(&format!(
                " {} {} ON {} {} {}",
                join.join_type.sql_keyword(),
                quote_identifier(&join.table),
                quote_identifier(&join.first),
                join.operator,
                quote_identifier(&join.second),
            ));
        }

        // WHERE
        if !query.wheres.is_empty() {
            sql.push_str(" WHERE ");
            self.compile_clauses(&query.wheres, &mut sql, &mut params);
        }

        // ORDER BY
        if !query.order_by.is_empty() {
            let orders: Vec<String> = query
                .order_by
                .iter()
                .map(|o| {
                    let dir = if o.descending { " DESC" } else { " ASC" };
                    format!("{}{dir}", quote_identifier(&o.column))
                })
                .collect();
            sql.push_str(&format!(" ORDER BY {}", orders.join(", ")));
        }

        // LIMIT
        if let Some(limit) = query.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        // OFFSET
        if let Some(offset) = query.offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }

        (sql, params)
    }

    /// Compiles an ordered clause list, rendering each connector before its clause.
    fn compile_clauses(&self, clauses: &[WhereClause], sql: &mut String, params: &mut Vec<Value>) {
        for (i, clause) in clauses.iter().enumerate() {
            if i > 0 {
                sql.push(' ');
                sql.push_str(clause.boolean.sql_keyword());
                sql.push(' ');
            }
            self.compile_where_node(&clause.node, sql, params);
        }
    }

    /// Compiles a `WhereNode` into SQL, appending to the provided string.
    fn compile_where_node(&self, node: &WhereNode, sql: &mut String, params: &mut Vec<Value>) {
        match node {
            WhereNode::Condition { column, lookup } => {
                let column_sql = match column {
                    ColumnExpr::Name(name) => quote_identifier(name),
                    ColumnExpr::Raw(raw) => raw.clone(),
                };
                self.compile_lookup(&column_sql, lookup, sql, params);
            }
            WhereNode::And(children) => {
                if children.is_empty() {
                    sql.push_str("1=1");
                    return;
                }
                sql.push('(');
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        sql.push_str(" AND ");
                    }
                    self.compile_where_node(child, sql, params);
                }
                sql.push(')');
            }
            WhereNode::Or(children) => {
                if children.is_empty() {
                    sql.push_str("1=0");
                    return;
                }
                sql.push('(');
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        sql.push_str(" OR ");
                    }
                    self.compile_where_node(child, sql, params);
                }
                sql.push(')');
            }
            WhereNode::Not(inner) => {
                sql.push_str("NOT (");
                self.compile_where_node(inner, sql, params);
                sql.push(')');
            }
            WhereNode::Nested(clauses) => {
                if clauses.is_empty() {
                    sql.push_str("1=1");
                    return;
                }
                sql.push('(');
                self.compile_clauses(clauses, sql, params);
                sql.push(')');
            }
        }
    }

    /// Binds `value` and returns its placeholder.
    fn bind(&self, value: Value, params: &mut Vec<Value>) -> String {
        params.push(value);
        self.placeholder(params.len())
    }

    /// Compiles a single lookup into SQL.
    fn compile_lookup(
        &self,
        column: &str,
        lookup: &Lookup,
        sql: &mut String,
        params: &mut Vec<Value>,
    ) {
        match lookup {
            Lookup::Exact(val) => {
                if val.is_null() {
                    sql.push_str(&format!("{column} IS NULL"));
                } else {
                    let ph = self.bind(val.clone(), params);
                    sql.push_str(&format!("{column} = {ph}"));
                }
            }
            Lookup::NotExact(val) => {
                let ph = self.bind(val.clone(), params);
                sql.push_str(&format!("{column} <> {ph}"));
            }
            Lookup::Gt(val) => {
                let ph = self.bind(val.clone(), params);
                sql.push_str(&format!("{column} > {ph}"));
            }
            Lookup::Gte(val) => {
                let ph = self.bind(val.clone(), params);
                sql.push_str(&format!("{column} >= {ph}"));
            }
            Lookup::Lt(val) => {
                let ph = self.bind(val.clone(), params);
                sql.push_str(&format!("{column} < {ph}"));
            }
            Lookup::Lte(val) => {
                let ph = self.bind(val.clone(), params);
                sql.push_str(&format!("{column} <= {ph}"));
            }
            Lookup::Like(pattern) => {
                let ph = self.bind(Value::String(pattern.clone()), params);
                sql.push_str(&format!("{column} LIKE {ph}"));
            }
            Lookup::NotLike(pattern) => {
                let ph = self.bind(Value::String(pattern.clone()), params);
                sql.push_str(&format!("{column} NOT LIKE {ph}"));
            }
            Lookup::Contains(val) => {
                let ph = self.bind(Value::String(format!("%{val}%")), params);
                sql.push_str(&format!("{column} LIKE {ph}"));
            }
            Lookup::IContains(val) => {
                let ph = self.bind(Value::String(format!("%{val}%")), params);
                match self.backend {
                    DatabaseBackendType::PostgreSQL => {
                        sql.push_str(&format!("{column} ILIKE {ph}"));
                    }
                    _ => {
                        sql.push_str(&format!("LOWER({column}) LIKE LOWER({ph})"));
                    }
                }
            }
            Lookup::In(vals) | Lookup::NotIn(vals) => {
                let keyword = if matches!(lookup, Lookup::In(_)) { "IN" } else { "NOT IN" };
                if vals.is_empty() {
                    // IN () is not valid SQL; an empty set matches nothing.
                    sql.push_str(if keyword == "IN" { "1=0" } else { "1=1" });
                    return;
                }
                let placeholders: Vec<String> =
                    vals.iter().map(|v| self.bind(v.clone(), params)).collect();
                sql.push_str(&format!("{column} {keyword} ({})", placeholders.join(", ")));
            }
            Lookup::IsNull(is_null) => {
                if *is_null {
                    sql.push_str(&format!("{column} IS NULL"));
                } else {
                    sql.push_str(&format!("{column} IS NOT NULL"));
                }
            }
        }
    }
}
