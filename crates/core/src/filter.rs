//! Query filters for document stores.
//!
//! A [`Filter`] is a conjunction of per-field [`Criterion`]s. Every store
//! implementation evaluates filters with the same rules:
//!
//! - a field that is absent reads as [`Value::Null`]
//! - when the stored field is a list, a criterion matches if any element matches
//! - numbers compare by value, so `5` matches `5.0`
//! - `OneOf` with no candidates matches nothing
//! - an empty filter matches every document
//!
//! # Example
//!
//! ```
//! use candy_boxes_core::{Document, Filter};
//!
//! let filter = Filter::new().one_of("tags", ["vegan"]);
//! let vegan = Document::new().with("tags", vec!["vegan", "sour"]);
//! let plain = Document::new().with("tags", vec!["sour"]);
//!
//! assert!(filter.matches(&vegan));
//! assert!(!filter.matches(&plain));
//! ```

use crate::document::{Document, Value};

/// Match rule applied to a single field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Criterion {
    /// Field equals the value (or, for list fields, contains it).
    Equals(Value),
    /// Field equals any of the values (or, for list fields, contains any of them).
    OneOf(Vec<Value>),
}

impl Criterion {
    /// Evaluate this criterion against a field value (`None` when absent).
    #[must_use]
    pub fn matches(&self, field: Option<&Value>) -> bool {
        match self {
            Self::Equals(expected) => field_matches(field, expected),
            Self::OneOf(candidates) => candidates
                .iter()
                .any(|candidate| field_matches(field, candidate)),
        }
    }
}

fn field_matches(field: Option<&Value>, expected: &Value) -> bool {
    let actual = field.unwrap_or(&Value::Null);
    if actual.equivalent(expected) {
        return true;
    }
    match actual {
        Value::List(items) => items.iter().any(|item| item.equivalent(expected)),
        _ => false,
    }
}

/// Conjunction of field criteria.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    conditions: Vec<(String, Criterion)>,
}

impl Filter {
    /// Create a filter that matches every document.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            conditions: Vec::new(),
        }
    }

    /// Require `field` to equal `value`.
    #[must_use]
    pub fn equals(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(field, Criterion::Equals(value.into()))
    }

    /// Require `field` to equal one of `values`.
    #[must_use]
    pub fn one_of<V: Into<Value>>(
        self,
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        self.with(field, Criterion::OneOf(values))
    }

    /// Add an arbitrary criterion.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, criterion: Criterion) -> Self {
        self.conditions.push((field.into(), criterion));
        self
    }

    /// Returns `true` if the filter has no conditions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// The conditions in insertion order.
    #[must_use]
    pub fn conditions(&self) -> &[(String, Criterion)] {
        &self.conditions
    }

    /// Returns `true` if the document satisfies every condition.
    #[must_use]
    pub fn matches(&self, document: &Document) -> bool {
        self.conditions
            .iter()
            .all(|(field, criterion)| criterion.matches(document.get(field)))
    }
}
