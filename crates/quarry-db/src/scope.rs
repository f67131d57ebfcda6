//! Query scope registry.
//!
//! A scope is a reusable, named predicate-building routine owned by an entity
//! type. Entities register their scopes once, in their
//! [`EntityMeta`](crate::entity::EntityMeta); the customizer looks them up by
//! name when [`QueryCustomizer::call`](crate::query::QueryCustomizer::call) is
//! used.
//!
//! # Examples
//!
//! ```
//! use quarry_db::scope::ScopeRegistry;
//!
//! let mut scopes = ScopeRegistry::new();
//! scopes.register("active", |q, _args| q.where_("@active", "=", true));
//! assert!(scopes.contains("active"));
//! assert!(scopes.contains("scopeActive"));
//! ```

use crate::query::customizer::QueryCustomizer;
use crate::value::Value;
use quarry_core::QuarryResult;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A registered scope: receives the query and the call arguments and returns
/// the query for further chaining.
pub type ScopeFn =
    Arc<dyn Fn(QueryCustomizer, &[Value]) -> QuarryResult<QueryCustomizer> + Send + Sync>;

/// Name-to-scope mapping for one entity type.
#[derive(Clone, Default)]
pub struct ScopeRegistry {
    scopes: HashMap<String, ScopeFn>,
}

impl fmt::Debug for ScopeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeRegistry")
            .field("scopes", &self.names())
            .finish()
    }
}

impl ScopeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) a scope under `name`, stored with its first
    /// character lowercased.
    pub fn register<F>(&mut self, name: impl Into<String>, scope: F)
    where
        F: Fn(QueryCustomizer, &[Value]) -> QuarryResult<QueryCustomizer> + Send + Sync + 'static,
    {
        self.scopes.insert(normalize(&name.into()), Arc::new(scope));
    }

    /// Looks up a scope.
    ///
    /// Names match regardless of the case of their first character, so
    /// `Active` finds a scope registered as `active`. The method-style spelling
    /// `scopeActive` resolves `active` when no scope is registered under the
    /// literal name.
    pub fn get(&self, name: &str) -> Option<&ScopeFn> {
        self.scopes
            .get(&normalize(name))
            .or_else(|| legacy_name(name).and_then(|n| self.scopes.get(&n)))
    }

    /// Returns `true` if [`get`](Self::get) would find a scope.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Returns the registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.scopes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Returns the number of registered scopes.
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    /// Returns `true` if no scopes are registered.
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}

/// Lowercases the first character: `Active` -> `active`.
fn normalize(name: &str) -> String {
    let mut chars = name.chars();
    chars
        .next()
        .map(|first| first.to_lowercase().chain(chars).collect())
        .unwrap_or_default()
}

/// `scopeActive` -> `active`
fn legacy_name(name: &str) -> Option<String> {
    let rest = name.strip_prefix("scope")?;
    let first = rest.chars().next()?;
    if !first.is_uppercase() {
        return None;
    }
    Some(normalize(rest))
}
