//! Query building, customization, and compilation.
//!
//! - [`lookups`] - Q objects and lookup types for filtering
//! - [`compiler`] - Query AST and SQL compilation
//! - [`builder`] - The [`BaseQuery`] interface and its stock implementation
//! - [`customizer`] - [`QueryCustomizer`]: symbolic columns, relation joins,
//!   search and scope dispatch layered over a base builder

pub mod builder;
pub mod compiler;
pub mod customizer;
pub mod lookups;

pub use builder::{BaseQuery, QueryBuilder};
pub use compiler::{
    Boolean, ColumnExpr, DatabaseBackendType, Join, JoinType, OrderBy, Query, SelectColumn,
    SqlCompiler, WhereClause, WhereNode,
};
pub use customizer::{NameList, QueryCustomizer};
pub use lookups::{Lookup, Q};
