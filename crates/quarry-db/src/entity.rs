//! Entity metadata.
//!
//! The [`Entity`] trait ties a Rust type to its [`EntityMeta`]: the table it
//! maps to, the relations it declares, and the query scopes it registers.
//! Metadata is built once, usually in a `LazyLock`, and queried by the
//! customizer at query-building time.

use crate::query::compiler::SelectColumn;
use crate::query::customizer::QueryCustomizer;
use crate::relation::Relation;
use crate::scope::ScopeRegistry;
use crate::value::Value;
use quarry_core::QuarryResult;
use std::collections::BTreeMap;

/// The root entity a query targets.
///
/// # Examples
///
/// ```
/// use quarry_db::entity::{Entity, EntityMeta};
/// use quarry_db::relation::HasOneOrMany;
///
/// struct User;
///
/// impl Entity for User {
///     fn meta() -> &'static EntityMeta {
///         use std::sync::LazyLock;
///         static META: LazyLock<EntityMeta> = LazyLock::new(|| {
///             EntityMeta::new("User", "users")
///                 .relation("posts", HasOneOrMany::has_many("posts", "user_id"))
///                 .scope("active", |q, _args| q.where_("@active", "=", true))
///         });
///         &META
///     }
/// }
///
/// assert_eq!(User::table_name(), "users");
/// assert!(User::meta().has_relation("posts"));
/// ```
pub trait Entity: 'static {
    /// Returns the static metadata for this entity type.
    fn meta() -> &'static EntityMeta;

    /// Returns the database table name.
    fn table_name() -> &'static str {
        &Self::meta().table
    }
}

/// Table, relations and scopes for one entity type.
#[derive(Debug)]
pub struct EntityMeta {
    /// Display name used in error messages (e.g. "User").
    pub name: &'static str,
    /// The database table name.
    pub table: String,
    relations: BTreeMap<String, Box<dyn Relation>>,
    scopes: ScopeRegistry,
}

impl EntityMeta {
    /// Creates metadata with no relations or scopes.
    pub fn new(name: &'static str, table: impl Into<String>) -> Self {
        Self {
            name,
            table: table.into(),
            relations: BTreeMap::new(),
            scopes: ScopeRegistry::new(),
        }
    }

    /// Declares a relation.
    #[must_use]
    pub fn relation(mut self, name: impl Into<String>, relation: impl Relation + 'static) -> Self {
        self.relations.insert(name.into(), Box::new(relation));
        self
    }

    /// Registers a query scope.
    #[must_use]
    pub fn scope<F>(mut self, name: impl Into<String>, scope: F) -> Self
    where
        F: Fn(QueryCustomizer, &[Value]) -> QuarryResult<QueryCustomizer> + Send + Sync + 'static,
    {
        self.scopes.register(name, scope);
        self
    }

    /// Returns `true` if `name` is a declared relation.
    pub fn has_relation(&self, name: &str) -> bool {
        self.relations.contains_key(name)
    }

    /// Returns the relation descriptor declared under `name`.
    pub fn get_relation(&self, name: &str) -> Option<&dyn Relation> {
        self.relations.get(name).map(AsRef::as_ref)
    }

    /// Returns the declared relation names in sorted order.
    pub fn relation_names(&self) -> Vec<&str> {
        self.relations.keys().map(String::as_str).collect()
    }

    /// Returns the scope registry.
    pub const fn scopes(&self) -> &ScopeRegistry {
        &self.scopes
    }

    /// Returns the `table.*` column for this entity.
    pub fn wildcard(&self) -> SelectColumn {
        SelectColumn::wildcard(&self.table)
    }
}
