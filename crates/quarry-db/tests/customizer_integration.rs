//! Integration tests for the query customizer.
//!
//! Tests cover: column sentinel substitution, relation joins with eager
//! loading, wildcard de-duplication, multi-word search, scope dispatch and
//! legacy scope names, fallback to the base builder, custom settings, and
//! composition over a caller-supplied base builder.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::LazyLock;

use quarry_core::{QuarryError, QuarryResult, QuerySettings};
use quarry_db::{
    BaseQuery, BelongsTo, BelongsToMany, Boolean, DatabaseBackendType, Entity, EntityMeta,
    HasOneOrMany, Join, Query, QueryBuilder, QueryCustomizer, SelectColumn, Value, WhereClause,
    WhereNode,
};

struct Article;

impl Entity for Article {
    fn meta() -> &'static EntityMeta {
        static META: LazyLock<EntityMeta> = LazyLock::new(|| {
            EntityMeta::new("Article", "articles")
                .relation("author", BelongsTo::new("users", "author_id"))
                .relation("comments", HasOneOrMany::has_many("comments", "article_id"))
                .relation(
                    "tags",
                    BelongsToMany::new("tags", "article_tag", "article_id", "tag_id"),
                )
                .scope("published", |q, _| q.where_("@status", "=", "published"))
                .scope("byAuthor", |q, args| match args {
                    [author] => q.where_("@author_id", "=", author.clone()),
                    _ => Err(QuarryError::InvalidArgument(
                        "byAuthor() expects 1 argument".to_string(),
                    )),
                })
                .scope("recent", |q, args| {
                    let n = args.first().cloned().unwrap_or(Value::Int(10));
                    q.call("orderByDesc", &["created_at".into()])?
                        .call("limit", &[n])
                })
        });
        &META
    }
}

fn articles() -> QueryCustomizer {
    QueryCustomizer::for_entity::<Article>().with_settings(QuerySettings::default())
}

fn pg(q: &QueryCustomizer) -> (String, Vec<Value>) {
    q.to_sql(DatabaseBackendType::PostgreSQL)
}

fn sqlite(q: &QueryCustomizer) -> String {
    q.to_sql(DatabaseBackendType::SQLite).0
}

// ═════════════════════════════════════════════════════════════════════
// 1. Column sentinel substitution
// ═════════════════════════════════════════════════════════════════════

#[test]
fn test_sentinel_replaced_with_root_table() {
    let q = articles().where_("@id", "=", 7).unwrap();
    let (sql, params) = pg(&q);
    assert_eq!(sql, "SELECT * FROM \"articles\" WHERE \"articles\".\"id\" = $1");
    assert_eq!(params, vec![Value::Int(7)]);
}

#[test]
fn test_sentinel_replaced_everywhere_in_column() {
    let q = articles().where_("@meta->@key", "=", 1).unwrap();
    assert_eq!(
        q.query().wheres[0].node,
        WhereNode::condition(
            "articles.meta->articles.key",
            quarry_db::Lookup::Exact(Value::Int(1))
        )
    );
}

#[test]
fn test_column_without_sentinel_passes_through() {
    let customized = articles().where_("title", "=", "Rust").unwrap().into_query();

    let mut plain = QueryBuilder::for_entity::<Article>();
    plain.add_where(WhereClause::and(WhereNode::condition(
        "title",
        quarry_db::Lookup::Exact(Value::from("Rust")),
    )));

    assert_eq!(customized, *plain.query());
}

#[test]
fn test_null_comparison_becomes_is_null() {
    let q = articles()
        .where_("@deleted_at", "=", Value::Null)
        .unwrap()
        .where_("@published_at", "!=", Option::<i64>::None)
        .unwrap();
    assert_eq!(
        sqlite(&q),
        "SELECT * FROM \"articles\" WHERE \"articles\".\"deleted_at\" IS NULL AND \"articles\".\"published_at\" IS NOT NULL"
    );
}

#[test]
fn test_where_in_operator() {
    let q = articles()
        .where_("@id", "in", Value::list([1_i64, 2, 3]))
        .unwrap();
    let (sql, params) = pg(&q);
    assert_eq!(sql, "SELECT * FROM \"articles\" WHERE \"articles\".\"id\" IN ($1, $2, $3)");
    assert_eq!(params.len(), 3);

    let err = articles().where_("@id", "in", 1).unwrap_err();
    assert_eq!(err.kind(), "invalid_argument");
}

// ═════════════════════════════════════════════════════════════════════
// 2. Relation joins
// ═════════════════════════════════════════════════════════════════════

#[test]
fn test_join_with_belongs_to() {
    let q = articles().join_with("author", true);
    assert_eq!(
        sqlite(&q),
        "SELECT \"articles\".* FROM \"articles\" LEFT JOIN \"users\" ON \"users\".\"id\" = \"articles\".\"author_id\""
    );
    assert_eq!(q.query().eager_load, vec!["author"]);
}

#[test]
fn test_join_with_belongs_to_many_joins_pivot_first() {
    let q = articles().join_with("tags", false);
    assert_eq!(
        q.query().joins,
        vec![
            Join::left("article_tag", "article_tag.article_id", "articles.id"),
            Join::left("tags", "tags.id", "article_tag.tag_id"),
        ]
    );
    assert!(q.query().eager_load.is_empty());
}

#[test]
fn test_join_with_unknown_relation_is_ignored() {
    let mixed = articles().join_with(["author", "editor"], true).into_query();
    let valid = articles().join_with(["author"], true).into_query();
    assert_eq!(mixed, valid);
}

#[test]
fn test_join_with_only_unknown_relations_selects_wildcard() {
    let q = articles().join_with("editor", true);
    assert!(q.query().joins.is_empty());
    assert!(q.query().eager_load.is_empty());
    assert_eq!(q.query().columns, vec![SelectColumn::wildcard("articles")]);
}

#[test]
fn test_repeated_join_with_keeps_single_wildcard() {
    let q = articles()
        .join_with("author", true)
        .join_with("comments", true)
        .join_with(vec!["author".to_string(), "tags".to_string()], true);

    let wildcard = SelectColumn::wildcard("articles");
    let count = q.query().columns.iter().filter(|c| **c == wildcard).count();
    assert_eq!(count, 1);
    assert_eq!(q.query().joins.len(), 4);
    assert_eq!(q.query().eager_load, vec!["author", "comments", "tags"]);
}

#[test]
fn test_join_with_preserves_other_selected_columns() {
    let q = articles()
        .add_select(["@title", "users.name"])
        .join_with("author", true);
    assert_eq!(
        sqlite(&q),
        "SELECT \"articles\".\"title\", \"users\".\"name\", \"articles\".* FROM \"articles\" LEFT JOIN \"users\" ON \"users\".\"id\" = \"articles\".\"author_id\""
    );
}

// ═════════════════════════════════════════════════════════════════════
// 3. Search
// ═════════════════════════════════════════════════════════════════════

#[test]
fn test_search_words_and_within_column_or_across_columns() {
    let q = articles()
        .where_("@status", "=", "published")
        .unwrap()
        .search_where("Rust Async", ["title", "body"]);
    let (sql, params) = pg(&q);
    assert_eq!(
        sql,
        "SELECT * FROM \"articles\" WHERE \"articles\".\"status\" = $1 OR ((lower(title) LIKE $2 AND lower(title) LIKE $3) OR (lower(body) LIKE $4 AND lower(body) LIKE $5))"
    );
    assert_eq!(
        params,
        vec![
            Value::from("published"),
            Value::from("%rust%"),
            Value::from("%async%"),
            Value::from("%rust%"),
            Value::from("%async%"),
        ]
    );
}

#[test]
fn test_search_appends_with_or_connector() {
    let q = articles().search_where("x", "title");
    let last = q.query().wheres.last().unwrap();
    assert_eq!(last.boolean, Boolean::Or);
}

#[test]
fn test_search_empty_term_or_columns_changes_nothing() {
    let before = articles().where_("@id", ">", 0).unwrap().into_query();

    let empty_term = articles()
        .where_("@id", ">", 0)
        .unwrap()
        .search_where("", ["title"])
        .into_query();
    let empty_columns = articles()
        .where_("@id", ">", 0)
        .unwrap()
        .search_where("rust", Vec::<String>::new())
        .into_query();

    assert_eq!(empty_term, before);
    assert_eq!(empty_columns, before);
}

#[test]
fn test_search_skips_blank_words() {
    let q = articles().search_where("  rust   ", "title");
    let (sql, params) = pg(&q);
    assert_eq!(sql, "SELECT * FROM \"articles\" WHERE ((lower(title) LIKE $1))");
    assert_eq!(params, vec![Value::from("%rust%")]);
}

// ═════════════════════════════════════════════════════════════════════
// 4. Scopes and dynamic dispatch
// ═════════════════════════════════════════════════════════════════════

#[test]
fn test_scope_dispatch() {
    let q = articles()
        .call("published", &[])
        .unwrap()
        .call("byAuthor", &[Value::from(3)])
        .unwrap();
    let (sql, params) = pg(&q);
    assert_eq!(
        sql,
        "SELECT * FROM \"articles\" WHERE \"articles\".\"status\" = $1 AND \"articles\".\"author_id\" = $2"
    );
    assert_eq!(params, vec![Value::from("published"), Value::Int(3)]);
}

#[test]
fn test_legacy_scope_name_resolves() {
    let legacy = articles().call("scopePublished", &[]).unwrap().into_query();
    let plain = articles().call("published", &[]).unwrap().into_query();
    assert_eq!(legacy, plain);
}

#[test]
fn test_scope_can_chain_builder_methods() {
    let q = articles().call("recent", &[Value::from(5)]).unwrap();
    assert_eq!(
        sqlite(&q),
        "SELECT * FROM \"articles\" ORDER BY \"created_at\" DESC LIMIT 5"
    );
}

#[test]
fn test_scope_errors_propagate() {
    let err = articles().call("byAuthor", &[]).unwrap_err();
    assert_eq!(err.kind(), "invalid_argument");
}

#[test]
fn test_non_scope_method_falls_back_to_base() {
    let q = articles()
        .call("whereNull", &["archived_at".into()])
        .unwrap()
        .call("offset", &[Value::from(20)])
        .unwrap();
    assert_eq!(
        sqlite(&q),
        "SELECT * FROM \"articles\" WHERE \"archived_at\" IS NULL OFFSET 20"
    );
}

#[test]
fn test_unknown_method_reports_entity_and_method() {
    let err = articles().call("trending", &[]).unwrap_err();
    assert_eq!(err.kind(), "method_not_found");
    assert_eq!(err.to_string(), "Call to undefined method Article::trending()");
}

// ═════════════════════════════════════════════════════════════════════
// 5. Settings and composition
// ═════════════════════════════════════════════════════════════════════

#[test]
fn test_custom_separator_and_lower_function() {
    let settings = QuerySettings {
        column_sentinel: '$',
        table_separator: "__".to_string(),
        lower_function: "LCASE".to_string(),
    };
    let q = articles()
        .with_settings(settings)
        .where_("$id", "=", 1)
        .unwrap()
        .search_where("Mixed", "title");
    assert_eq!(
        q.query().wheres,
        vec![
            WhereClause::and(WhereNode::condition(
                "articles__id",
                quarry_db::Lookup::Exact(Value::Int(1))
            )),
            WhereClause::or(WhereNode::Nested(vec![WhereClause::or(WhereNode::Nested(
                vec![WhereClause::and(WhereNode::condition(
                    quarry_db::ColumnExpr::raw("LCASE(title)"),
                    quarry_db::Lookup::Like("%mixed%".to_string()),
                ))]
            ))])),
        ]
    );
}

/// A base builder that counts fallback calls and forwards to [`QueryBuilder`].
struct CountingBuilder {
    inner: QueryBuilder,
    calls: &'static AtomicUsize,
}

impl BaseQuery for CountingBuilder {
    fn entity(&self) -> &'static EntityMeta {
        self.inner.entity()
    }

    fn query(&self) -> &Query {
        self.inner.query()
    }

    fn query_mut(&mut self) -> &mut Query {
        self.inner.query_mut()
    }

    fn add_where(&mut self, clause: WhereClause) {
        self.inner.add_where(clause);
    }

    fn join(&mut self, join: Join) {
        self.inner.join(join);
    }

    fn with(&mut self, relations: &[String]) {
        self.inner.with(relations);
    }

    fn add_select(&mut self, columns: Vec<SelectColumn>) {
        self.inner.add_select(columns);
    }

    fn call(&mut self, method: &str, args: &[Value]) -> QuarryResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.call(method, args)
    }

    fn fresh(&self) -> Box<dyn BaseQuery> {
        Box::new(Self {
            inner: QueryBuilder::new(self.inner.entity()),
            calls: self.calls,
        })
    }

    fn into_query(self: Box<Self>) -> Query {
        self.inner.query().clone()
    }
}

#[test]
fn test_customizer_composes_over_any_base_builder() {
    static CALLS: AtomicUsize = AtomicUsize::new(0);

    let base = CountingBuilder {
        inner: QueryBuilder::for_entity::<Article>(),
        calls: &CALLS,
    };
    let q = QueryCustomizer::new(Box::new(base))
        .with_settings(QuerySettings::default())
        .call("published", &[])
        .unwrap()
        .call("limit", &[Value::from(1)])
        .unwrap()
        .join_with("author", true);

    // Scopes never reach the base fallback.
    assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    assert_eq!(
        sqlite(&q),
        "SELECT \"articles\".* FROM \"articles\" LEFT JOIN \"users\" ON \"users\".\"id\" = \"articles\".\"author_id\" WHERE \"articles\".\"status\" = ? LIMIT 1"
    );
}
