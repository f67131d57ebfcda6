//! Relation descriptors.
//!
//! A [`Relation`] describes a named association from a root entity to another
//! table and knows how to contribute the JOIN(s) that bring the related rows
//! into a query. Descriptors are declared on
//! [`EntityMeta`](crate::entity::EntityMeta) and used by
//! [`QueryCustomizer::join_with`](crate::query::QueryCustomizer::join_with).
//!
//! All built-in descriptors join with `LEFT JOIN` so root rows without
//! related rows are kept.

use crate::query::builder::BaseQuery;
use crate::query::compiler::Join;
use std::fmt;

/// The shape of an association.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    /// The root row holds a foreign key to the related row.
    BelongsTo,
    /// The related table holds a foreign key to the root row; at most one row.
    HasOne,
    /// The related table holds a foreign key to the root row.
    HasMany,
    /// Root and related rows are linked through a pivot table.
    BelongsToMany,
}

/// A named association that can join itself into a query.
pub trait Relation: fmt::Debug + Send + Sync {
    /// Returns the shape of this association.
    fn kind(&self) -> RelationKind;

    /// Returns the table holding the related rows.
    fn related_table(&self) -> &str;

    /// Appends the join clause(s) for this relation to `query`.
    ///
    /// `parent_table` is the root entity's table.
    fn join_with_query(&self, parent_table: &str, query: &mut dyn BaseQuery);
}

fn qualified(table: &str, column: &str) -> String {
    format!("{table}.{column}")
}

/// The root row holds `foreign_key`, referencing `related_table.owner_key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BelongsTo {
    /// The related table.
    pub related_table: String,
    /// Column on the root table.
    pub foreign_key: String,
    /// Referenced column on the related table.
    pub owner_key: String,
}

impl BelongsTo {
    /// Creates a relation whose owner key is `id`.
    pub fn new(related_table: impl Into<String>, foreign_key: impl Into<String>) -> Self {
        Self {
            related_table: related_table.into(),
            foreign_key: foreign_key.into(),
            owner_key: "id".to_string(),
        }
    }

    /// Overrides the owner key.
    #[must_use]
    pub fn owner_key(mut self, key: impl Into<String>) -> Self {
        self.owner_key = key.into();
        self
    }
}

impl Relation for BelongsTo {
    fn kind(&self) -> RelationKind {
        RelationKind::BelongsTo
    }

    fn related_table(&self) -> &str {
        &self.related_table
    }

    fn join_with_query(&self, parent_table: &str, query: &mut dyn BaseQuery) {
        query.join(Join::left(
            &self.related_table,
            qualified(&self.related_table, &self.owner_key),
            qualified(parent_table, &self.foreign_key),
        ));
    }
}

/// The related table holds `foreign_key`, referencing the root's `local_key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HasOneOrMany {
    /// The related table.
    pub related_table: String,
    /// Column on the related table.
    pub foreign_key: String,
    /// Referenced column on the root table.
    pub local_key: String,
    /// Whether many related rows may exist.
    pub many: bool,
}

impl HasOneOrMany {
    /// Creates a has-one relation whose local key is `id`.
    pub fn has_one(related_table: impl Into<String>, foreign_key: impl Into<String>) -> Self {
        Self {
            related_table: related_table.into(),
            foreign_key: foreign_key.into(),
            local_key: "id".to_string(),
            many: false,
        }
    }

    /// Creates a has-many relation whose local key is `id`.
    pub fn has_many(related_table: impl Into<String>, foreign_key: impl Into<String>) -> Self {
        Self {
            many: true,
            ..Self::has_one(related_table, foreign_key)
        }
    }

    /// Overrides the local key.
    #[must_use]
    pub fn local_key(mut self, key: impl Into<String>) -> Self {
        self.local_key = key.into();
        self
    }
}

impl Relation for HasOneOrMany {
    fn kind(&self) -> RelationKind {
        if self.many {
            RelationKind::HasMany
        } else {
            RelationKind::HasOne
        }
    }

    fn related_table(&self) -> &str {
        &self.related_table
    }

    fn join_with_query(&self, parent_table: &str, query: &mut dyn BaseQuery) {
        query.join(Join::left(
            &self.related_table,
            qualified(&self.related_table, &self.foreign_key),
            qualified(parent_table, &self.local_key),
        ));
    }
}

/// Root and related rows linked through `pivot_table`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BelongsToMany {
    /// The related table.
    pub related_table: String,
    /// The pivot (link) table.
    pub pivot_table: String,
    /// Pivot column referencing the root row.
    pub foreign_pivot_key: String,
    /// Pivot column referencing the related row.
    pub related_pivot_key: String,
    /// Referenced column on the root table.
    pub parent_key: String,
    /// Referenced column on the related table.
    pub related_key: String,
}

impl BelongsToMany {
    /// Creates a relation whose parent and related keys are `id`.
    pub fn new(
        related_table: impl Into<String>,
        pivot_table: impl Into<String>,
        foreign_pivot_key: impl Into<String>,
        related_pivot_key: impl Into<String>,
    ) -> Self {
        Self {
            related_table: related_table.into(),
            pivot_table: pivot_table.into(),
            foreign_pivot_key: foreign_pivot_key.into(),
            related_pivot_key: related_pivot_key.into(),
            parent_key: "id".to_string(),
            related_key: "id".to_string(),
        }
    }
}

impl Relation for BelongsToMany {
    fn kind(&self) -> RelationKind {
        RelationKind::BelongsToMany
    }

    fn related_table(&self) -> &str {
        &self.related_table
    }

    fn join_with_query(&self, parent_table: &str, query: &mut dyn BaseQuery) {
        query.join(Join::left(
            &self.pivot_table,
            qualified(&self.pivot_table, &self.foreign_pivot_key),
            qualified(parent_table, &self.parent_key),
        ));
        query.join(Join::left(
            &self.related_table,
            qualified(&self.related_table, &self.related_key),
            qualified(&self.pivot_table, &self.related_pivot_key),
        ));
    }
}
