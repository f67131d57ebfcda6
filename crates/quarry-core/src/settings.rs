//! Settings for quarry.
//!
//! This module provides the [`Settings`] struct, which holds the logging options
//! and the [`QuerySettings`] consulted while building queries, plus
//! [`LazySettings`], a globally-accessible, set-once settings instance.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::{QuarryError, QuarryResult};

/// Options that shape how queries are built.
///
/// # Examples
///
/// ```
/// use quarry_core::settings::QuerySettings;
///
/// let q = QuerySettings::default();
/// assert_eq!(q.column_sentinel, '@');
/// assert_eq!(q.qualify("users", "@id"), "users.id");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySettings {
    /// Character in a column name that stands for the root table prefix.
    pub column_sentinel: char,
    /// Text placed between the table name and the column when substituting.
    pub table_separator: String,
    /// SQL function used to case-fold columns in search predicates.
    pub lower_function: String,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            column_sentinel: '@',
            table_separator: ".".to_string(),
            lower_function: "lower".to_string(),
        }
    }
}

impl QuerySettings {
    /// Replaces every sentinel in `column` with `table` followed by the separator.
    ///
    /// Columns without the sentinel are returned unchanged.
    pub fn qualify(&self, table: &str, column: &str) -> String {
        if column.contains(self.column_sentinel) {
            let prefix = format!("{table}{}", self.table_separator);
            column.replace(self.column_sentinel, &prefix)
        } else {
            column.to_string()
        }
    }
}

/// The complete set of quarry settings.
///
/// # Examples
///
/// ```
/// use quarry_core::settings::Settings;
///
/// let settings = Settings::default();
/// assert!(settings.debug);
/// assert_eq!(settings.log_level, "info");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Whether debug mode is enabled (selects the pretty log format).
    pub debug: bool,
    /// The tracing filter directive.
    pub log_level: String,
    /// Query-building options.
    pub query: QuerySettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: true,
            log_level: "info".to_string(),
            query: QuerySettings::default(),
        }
    }
}

/// A lazily-initialized, globally-accessible settings container.
///
/// Call [`configure`](LazySettings::configure) once at startup. Until then,
/// [`get`](LazySettings::get) returns `None` and callers fall back to defaults.
pub struct LazySettings {
    inner: OnceLock<Settings>,
}

impl Default for LazySettings {
    fn default() -> Self {
        Self::new()
    }
}

impl LazySettings {
    /// Creates a new, unconfigured `LazySettings`.
    pub const fn new() -> Self {
        Self {
            inner: OnceLock::new(),
        }
    }

    /// Configures the global settings. May succeed only once.
    pub fn configure(&self, settings: Settings) -> QuarryResult<()> {
        self.inner.set(settings).map_err(|_| {
            QuarryError::ConfigurationError("Settings have already been configured".to_string())
        })
    }

    /// Returns the configured settings, if any.
    pub fn get(&self) -> Option<&Settings> {
        self.inner.get()
    }

    /// Returns the configured query settings, or the defaults.
    pub fn query_settings(&self) -> QuerySettings {
        self.get()
            .map_or_else(QuerySettings::default, |s| s.query.clone())
    }

    /// Returns `true` if settings have been configured.
    pub fn is_configured(&self) -> bool {
        self.inner.get().is_some()
    }
}

/// The global settings instance.
pub static SETTINGS: LazySettings = LazySettings::new();
