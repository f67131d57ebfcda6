//! The query customizer.
//!
//! [`QueryCustomizer`] wraps a [`BaseQuery`] and layers four conveniences on
//! top of it:
//!
//! - **Symbolic columns**: a sentinel (`@` by default) in a column name stands
//!   for the root table, so `@id` on a `users` query means `users.id`.
//! - **Relation joins**: [`join_with`](QueryCustomizer::join_with) joins declared
//!   relations, optionally eager-loads them, and keeps `table.*` selected once.
//! - **Substring search**: [`search_where`](QueryCustomizer::search_where) ORs a
//!   case-insensitive multi-word match across columns into the query.
//! - **Scope dispatch**: [`call`](QueryCustomizer::call) runs an entity's
//!   registered scope, or falls back to the base builder.
//!
//! # Examples
//!
//! ```
//! use quarry_db::entity::{Entity, EntityMeta};
//! use quarry_db::query::{DatabaseBackendType, QueryCustomizer};
//! use quarry_db::relation::BelongsTo;
//!
//! struct Post;
//!
//! impl Entity for Post {
//!     fn meta() -> &'static EntityMeta {
//!         use std::sync::LazyLock;
//!         static META: LazyLock<EntityMeta> = LazyLock::new(|| {
//!             EntityMeta::new("Post", "posts")
//!                 .relation("author", BelongsTo::new("users", "user_id"))
//!                 .scope("published", |q, _| q.where_("@published", "=", true))
//!         });
//!         &META
//!     }
//! }
//!
//! let query = QueryCustomizer::for_entity::<Post>()
//!     .call("published", &[])
//!     .unwrap()
//!     .join_with("author", true);
//! let (sql, _) = query.to_sql(DatabaseBackendType::SQLite);
//! assert_eq!(
//!     sql,
//!     "SELECT \"posts\".* FROM \"posts\" \
//!      LEFT JOIN \"users\" ON \"users\".\"id\" = \"posts\".\"user_id\" \
//!      WHERE \"posts\".\"published\" = ?"
//! );
//! ```

use super::builder::{BaseQuery, QueryBuilder};
use super::compiler::{
    Boolean, ColumnExpr, DatabaseBackendType, Query, SelectColumn, SqlCompiler, WhereClause,
    WhereNode,
};
use super::lookups::{Lookup, Q};
use crate::entity::Entity;
use crate::value::Value;
use quarry_core::logging::query_span;
use quarry_core::{QuarryResult, QuerySettings, SETTINGS};
use tracing::{debug, trace};

/// Characters stripped from both ends of each search word.
const SEARCH_TRIM: &[char] = &[' ', '\t', '\n', '\r', '\0', '\x0B'];

/// One or more names: relations for [`QueryCustomizer::join_with`] or columns
/// for [`QueryCustomizer::search_where`].
///
/// A single name and any sequence of names convert into a list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameList(Vec<String>);

impl NameList {
    /// Returns the names.
    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl From<&str> for NameList {
    fn from(name: &str) -> Self {
        Self(vec![name.to_string()])
    }
}

impl From<String> for NameList {
    fn from(name: String) -> Self {
        Self(vec![name])
    }
}

impl From<Vec<String>> for NameList {
    fn from(names: Vec<String>) -> Self {
        Self(names)
    }
}

impl From<Vec<&str>> for NameList {
    fn from(names: Vec<&str>) -> Self {
        Self(names.into_iter().map(String::from).collect())
    }
}

impl From<&[&str]> for NameList {
    fn from(names: &[&str]) -> Self {
        Self(names.iter().map(|n| (*n).to_string()).collect())
    }
}

impl From<&[String]> for NameList {
    fn from(names: &[String]) -> Self {
        Self(names.to_vec())
    }
}

impl<const N: usize> From<[&str; N]> for NameList {
    fn from(names: [&str; N]) -> Self {
        Self(names.iter().map(|n| (*n).to_string()).collect())
    }
}

/// A query builder with symbolic columns, relation joins, search and scopes.
///
/// Owns its base builder and forwards everything it does not handle itself.
/// Every step consumes the customizer and returns it for chaining.
pub struct QueryCustomizer {
    base: Box<dyn BaseQuery>,
    settings: QuerySettings,
}

impl QueryCustomizer {
    /// Wraps `base`, using the globally configured query settings.
    pub fn new(base: Box<dyn BaseQuery>) -> Self {
        Self {
            base,
            settings: SETTINGS.query_settings(),
        }
    }

    /// Creates a customizer over a fresh [`QueryBuilder`] for `E`.
    pub fn for_entity<E: Entity>() -> Self {
        Self::new(Box::new(QueryBuilder::for_entity::<E>()))
    }

    /// Replaces the query settings.
    #[must_use]
    pub fn with_settings(mut self, settings: QuerySettings) -> Self {
        self.settings = settings;
        self
    }

    /// Returns the settings in use.
    pub const fn settings(&self) -> &QuerySettings {
        &self.settings
    }

    /// Returns the wrapped base builder.
    pub fn base(&self) -> &dyn BaseQuery {
        self.base.as_ref()
    }

    /// Returns the wrapped base builder mutably.
    pub fn base_mut(&mut self) -> &mut dyn BaseQuery {
        self.base.as_mut()
    }

    /// Returns the query AST built so far.
    pub fn query(&self) -> &Query {
        self.base.query()
    }

    /// Consumes the customizer, returning the base builder.
    pub fn into_inner(self) -> Box<dyn BaseQuery> {
        self.base
    }

    /// Consumes the customizer, returning its query AST.
    pub fn into_query(self) -> Query {
        self.base.into_query()
    }

    /// Compiles the query for the given backend.
    pub fn to_sql(&self, backend: DatabaseBackendType) -> (String, Vec<Value>) {
        let _span = query_span(&self.query().table).entered();
        let (sql, params) = SqlCompiler::new(backend).compile_select(self.query());
        trace!(sql = sql.as_str(), params = params.len(), "compiled query");
        (sql, params)
    }

    // ── Symbolic columns ─────────────────────────────────────────────

    fn qualify(&self, column: &str) -> String {
        let qualified = self.settings.qualify(&self.base.entity().table, column);
        if qualified != column {
            trace!(column, qualified = qualified.as_str(), "substituted column sentinel");
        }
        qualified
    }

    /// Applies sentinel substitution to textual column names; raw fragments pass through.
    fn resolve_column(&self, column: ColumnExpr) -> ColumnExpr {
        match column {
            ColumnExpr::Name(name) => ColumnExpr::Name(self.qualify(&name)),
            raw @ ColumnExpr::Raw(_) => raw,
        }
    }

    /// Adds a predicate with an explicit connector.
    ///
    /// Every sentinel in a textual `column` is replaced by the root table name
    /// and separator before the predicate reaches the base builder.
    pub fn where_with(
        mut self,
        column: impl Into<ColumnExpr>,
        operator: &str,
        value: impl Into<Value>,
        boolean: Boolean,
    ) -> QuarryResult<Self> {
        let column = self.resolve_column(column.into());
        let lookup = Lookup::from_operator(operator, value.into())?;
        self.base
            .add_where(WhereClause::new(boolean, WhereNode::Condition { column, lookup }));
        Ok(self)
    }

    /// Adds an AND-connected predicate.
    pub fn where_(
        self,
        column: impl Into<ColumnExpr>,
        operator: &str,
        value: impl Into<Value>,
    ) -> QuarryResult<Self> {
        self.where_with(column, operator, value, Boolean::And)
    }

    /// Adds an OR-connected predicate.
    pub fn or_where(
        self,
        column: impl Into<ColumnExpr>,
        operator: &str,
        value: impl Into<Value>,
    ) -> QuarryResult<Self> {
        self.where_with(column, operator, value, Boolean::Or)
    }

    /// Adds an AND-connected equality predicate.
    #[must_use]
    pub fn where_eq(mut self, column: impl Into<ColumnExpr>, value: impl Into<Value>) -> Self {
        let column = self.resolve_column(column.into());
        let value = value.into();
        let lookup = if value.is_null() {
            Lookup::IsNull(true)
        } else {
            Lookup::Exact(value)
        };
        self.base
            .add_where(WhereClause::and(WhereNode::Condition { column, lookup }));
        self
    }

    /// Adds a `Q` filter, AND-connected, substituting sentinels in every field.
    #[must_use]
    pub fn filter(self, q: Q) -> Self {
        self.add_q(q, Boolean::And)
    }

    /// Adds a `Q` filter, OR-connected, substituting sentinels in every field.
    #[must_use]
    pub fn or_filter(self, q: Q) -> Self {
        self.add_q(q, Boolean::Or)
    }

    fn add_q(mut self, q: Q, boolean: Boolean) -> Self {
        let q = q.map_fields(&|field| self.qualify(&field));
        self.base
            .add_where(WhereClause::new(boolean, WhereNode::from_q(&q)));
        self
    }

    /// Adds a parenthesised group built by `build` on a fresh customizer.
    ///
    /// A group that ends up with no predicates adds nothing.
    pub fn where_nested<F>(mut self, boolean: Boolean, build: F) -> QuarryResult<Self>
    where
        F: FnOnce(QueryCustomizer) -> QuarryResult<QueryCustomizer>,
    {
        let nested = Self {
            base: self.base.fresh(),
            settings: self.settings.clone(),
        };
        let wheres = build(nested)?.into_query().wheres;
        if !wheres.is_empty() {
            self.base
                .add_where(WhereClause::new(boolean, WhereNode::Nested(wheres)));
        }
        Ok(self)
    }

    // ── Relations ────────────────────────────────────────────────────

    /// Joins relations and optionally eager-loads them.
    ///
    /// Names that are not declared relations of the root entity are dropped
    /// without error. Afterwards the root `table.*` column is selected exactly
    /// once, however many times this is called.
    #[must_use]
    pub fn join_with(mut self, relations: impl Into<NameList>, eager_load: bool) -> Self {
        let entity = self.base.entity();
        let relations: Vec<String> = relations
            .into()
            .into_vec()
            .into_iter()
            .filter(|name| {
                let known = entity.has_relation(name);
                if !known {
                    debug!(
                        entity = entity.name,
                        relation = name.as_str(),
                        "ignoring unknown relation"
                    );
                }
                known
            })
            .collect();

        if eager_load {
            self.base.with(&relations);
        }

        for name in &relations {
            if let Some(relation) = entity.get_relation(name) {
                relation.join_with_query(&entity.table, self.base.as_mut());
            }
        }

        let wildcard = entity.wildcard();
        let query = self.base.query_mut();
        if !query.columns.is_empty() {
            query.columns.retain(|column| column != &wildcard);
        }
        self.base.add_select(vec![wildcard]);
        self
    }

    /// Registers relations for eager loading without joining them.
    #[must_use]
    pub fn with(mut self, relations: impl Into<NameList>) -> Self {
        self.base.with(&relations.into().into_vec());
        self
    }

    /// Appends columns to the select list; sentinels are substituted.
    #[must_use]
    pub fn add_select(mut self, columns: impl Into<NameList>) -> Self {
        let columns: Vec<SelectColumn> = columns
            .into()
            .into_vec()
            .iter()
            .map(|c| SelectColumn::Column(self.qualify(c)))
            .collect();
        self.base.add_select(columns);
        self
    }

    // ── Search ───────────────────────────────────────────────────────

    /// ORs a case-insensitive substring search for `term` into the query.
    ///
    /// `term` is split on single spaces and empty words are skipped. Each
    /// remaining word is lowercased and stripped of ASCII whitespace and NUL, so
    /// a whitespace-only word still matches everything. A row matches a column when the lowered
    /// column contains every word. The whole search matches when any column
    /// does. Column names are embedded as given inside the lowering function.
    #[must_use]
    pub fn search_where(mut self, term: &str, columns: impl Into<NameList>) -> Self {
        let words: Vec<String> = term
            .split(' ')
            .filter(|word| !word.is_empty())
            .map(|word| word.trim_matches(SEARCH_TRIM).to_lowercase())
            .collect();

        let groups: Vec<WhereClause> = columns
            .into()
            .into_vec()
            .iter()
            .filter_map(|column| {
                let lowered = format!("{}({column})", self.settings.lower_function);
                let conditions: Vec<WhereClause> = words
                    .iter()
                    .map(|word| {
                        WhereClause::and(WhereNode::Condition {
                            column: ColumnExpr::Raw(lowered.clone()),
                            lookup: Lookup::Like(format!("%{word}%")),
                        })
                    })
                    .collect();
                (!conditions.is_empty()).then(|| WhereClause::or(WhereNode::Nested(conditions)))
            })
            .collect();

        if groups.is_empty() {
            return self;
        }
        debug!(words = words.len(), columns = groups.len(), "adding search predicate");
        self.base
            .add_where(WhereClause::or(WhereNode::Nested(groups)));
        self
    }

    // ── Scopes ───────────────────────────────────────────────────────

    /// Calls a method by name.
    ///
    /// A scope registered on the root entity under `method` (or the
    /// `scopeMethod` spelling) runs first and its result is returned.
    /// Otherwise the base builder's fallback handles the call, failing with
    /// [`QuarryError::MethodNotFound`](quarry_core::QuarryError::MethodNotFound)
    /// when nothing matches.
    pub fn call(mut self, method: &str, args: &[Value]) -> QuarryResult<Self> {
        let entity = self.base.entity();
        if let Some(scope) = entity.scopes().get(method) {
            debug!(entity = entity.name, scope = method, "dispatching query scope");
            return scope(self, args);
        }
        self.base.call(method, args)?;
        Ok(self)
    }
}

impl std::fmt::Debug for QueryCustomizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCustomizer")
            .field("entity", &self.base.entity().name)
            .field("query", self.base.query())
            .field("settings", &self.settings)
            .finish()
    }
}
