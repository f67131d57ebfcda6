//! Query lookups and Q objects for building complex filters.
//!
//! This module provides the [`Lookup`] enum for column-level comparisons and
//! the [`Q`] enum for combining filters with AND, OR, and NOT operators.
//!
//! # Examples
//!
//! ```
//! use quarry_db::query::lookups::{Q, Lookup};
//! use quarry_db::value::Value;
//!
//! // Simple filter: name = "Alice"
//! let q = Q::filter("name", Lookup::Exact(Value::from("Alice")));
//!
//! // Combining with AND: name = "Alice" AND age > 25
//! let combined = q & Q::filter("age", Lookup::Gt(Value::from(25)));
//!
//! // OR: name = "Alice" OR name = "Bob"
//! let either = Q::filter("name", Lookup::Exact(Value::from("Alice")))
//!     | Q::filter("name", Lookup::Exact(Value::from("Bob")));
//!
//! // NOT: NOT(active = false)
//! let negated = !Q::filter("active", Lookup::Exact(Value::from(false)));
//! ```

use crate::value::Value;
use quarry_core::{QuarryError, QuarryResult};
use std::ops;

/// A column-level lookup operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// Exact match (`column = value`).
    Exact(Value),
    /// Inequality (`column <> value`).
    NotExact(Value),
    /// Greater than (`column > value`).
    Gt(Value),
    /// Greater than or equal (`column >= value`).
    Gte(Value),
    /// Less than (`column < value`).
    Lt(Value),
    /// Less than or equal (`column <= value`).
    Lte(Value),
    /// Pattern match with the caller's own wildcards (`column LIKE value`).
    Like(String),
    /// Negated pattern match.
    NotLike(String),
    /// Substring match (`column LIKE '%value%'`).
    Contains(String),
    /// Case-insensitive substring match.
    IContains(String),
    /// Membership test (`column IN (values...)`).
    In(Vec<Value>),
    /// Negated membership test.
    NotIn(Vec<Value>),
    /// NULL test (`column IS NULL` or `column IS NOT NULL`).
    IsNull(bool),
}

impl Lookup {
    /// Builds a lookup from a textual comparison operator.
    ///
    /// Operators are matched case-insensitively with surrounding whitespace
    /// ignored. Comparing with `Null` via `=` or `!=`/`<>` becomes an
    /// `IS [NOT] NULL` test.
    ///
    /// # Examples
    ///
    /// ```
    /// use quarry_db::query::lookups::Lookup;
    /// use quarry_db::value::Value;
    ///
    /// assert_eq!(
    ///     Lookup::from_operator(">=", Value::from(3)).unwrap(),
    ///     Lookup::Gte(Value::Int(3))
    /// );
    /// assert_eq!(
    ///     Lookup::from_operator("=", Value::Null).unwrap(),
    ///     Lookup::IsNull(true)
    /// );
    /// assert!(Lookup::from_operator("=~", Value::from(1)).is_err());
    /// ```
    pub fn from_operator(operator: &str, value: Value) -> QuarryResult<Self> {
        let op = operator.trim().to_lowercase();
        let lookup = match op.as_str() {
            "=" | "==" if value.is_null() => Self::IsNull(true),
            "!=" | "<>" if value.is_null() => Self::IsNull(false),
            "=" | "==" => Self::Exact(value),
            "!=" | "<>" => Self::NotExact(value),
            ">" => Self::Gt(value),
            ">=" => Self::Gte(value),
            "<" => Self::Lt(value),
            "<=" => Self::Lte(value),
            "like" => Self::Like(pattern_text(value)),
            "not like" => Self::NotLike(pattern_text(value)),
            "in" => Self::In(list_operand(&op, value)?),
            "not in" => Self::NotIn(list_operand(&op, value)?),
            _ => return Err(QuarryError::InvalidOperator(operator.to_string())),
        };
        Ok(lookup)
    }
}

fn pattern_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

fn list_operand(op: &str, value: Value) -> QuarryResult<Vec<Value>> {
    match value {
        Value::List(items) => Ok(items),
        other => Err(QuarryError::InvalidArgument(format!(
            "operator '{op}' expects a list, got {}",
            other.type_name()
        ))),
    }
}

/// A composable query filter.
///
/// `Q` objects can be combined using `&` (AND), `|` (OR), and `!` (NOT)
/// operators to build arbitrarily complex WHERE clauses.
#[derive(Debug, Clone, PartialEq)]
pub enum Q {
    /// A single column lookup.
    Filter {
        /// The column name.
        field: String,
        /// The lookup operation.
        lookup: Lookup,
    },
    /// Logical AND of multiple conditions.
    And(Vec<Q>),
    /// Logical OR of multiple conditions.
    Or(Vec<Q>),
    /// Logical negation of a condition.
    Not(Box<Q>),
}

impl Q {
    /// Creates a new filter Q object.
    pub fn filter(field: impl Into<String>, lookup: Lookup) -> Self {
        Self::Filter {
            field: field.into(),
            lookup,
        }
    }

    /// Returns `true` if this is an empty AND/OR.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::And(children) | Self::Or(children) => children.is_empty(),
            _ => false,
        }
    }

    /// Rewrites every field name in the tree with `f`.
    #[must_use]
    pub fn map_fields<F>(self, f: &F) -> Self
    where
        F: Fn(String) -> String,
    {
        match self {
            Self::Filter { field, lookup } => Self::Filter {
                field: f(field),
                lookup,
            },
            Self::And(children) => {
                Self::And(children.into_iter().map(|c| c.map_fields(f)).collect())
            }
            Self::Or(children) => {
                Self::Or(children.into_iter().map(|c| c.map_fields(f)).collect())
            }
            Self::Not(inner) => Self::Not(Box::new(inner.map_fields(f))),
        }
    }
}

impl ops::BitAnd for Q {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            // Flatten nested ANDs
            (Self::And(mut left), Self::And(right)) => {
                left.extend(right);
                Self::And(left)
            }
            (Self::And(mut left), other) => {
                left.push(other);
                Self::And(left)
            }
            (other, Self::And(mut right)) => {
                right.insert(0, other);
                Self::And(right)
            }
            (left, right) => Self::And(vec![left, right]),
        }
    }
}

impl ops::BitOr for Q {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            // Flatten nested ORs
            (Self::Or(mut left), Self::Or(right)) => {
                left.extend(right);
                Self::Or(left)
            }
            (Self::Or(mut left), other) => {
                left.push(other);
                Self::Or(left)
            }
            (other, Self::Or(mut right)) => {
                right.insert(0, other);
                Self::Or(right)
            }
            (left, right) => Self::Or(vec![left, right]),
        }
    }
}

impl ops::Not for Q {
    type Output = Self;

    fn not(self) -> Self::Output {
        // Double negation cancellation
        match self {
            Self::Not(inner) => *inner,
            other => Self::Not(Box::new(other)),
        }
    }
}
