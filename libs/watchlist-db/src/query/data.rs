//! Field-value payloads for create and change operations.

use std::collections::BTreeSet;

use sea_orm::Value;

/// Ordered list of `field -> value` assignments.
///
/// `None` stands for an explicit null. Later entries for the same field
/// replace earlier ones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldValues {
    entries: Vec<(String, Option<Value>)>,
}

impl FieldValues {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a value to `field`.
    #[must_use]
    pub fn set(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.insert(field, Some(value.into()));
        self
    }

    /// Assign an explicit null to `field`.
    #[must_use]
    pub fn set_null(mut self, field: &str) -> Self {
        self.insert(field, None);
        self
    }

    /// Assign `value` when present, an explicit null otherwise.
    #[must_use]
    pub fn set_opt<V: Into<Value>>(mut self, field: &str, value: Option<V>) -> Self {
        self.insert(field, value.map(Into::into));
        self
    }

    pub fn insert(&mut self, field: &str, value: Option<Value>) {
        if let Some(slot) = self.entries.iter_mut().find(|(name, _)| name == field) {
            slot.1 = value;
        } else {
            self.entries.push((field.to_owned(), value));
        }
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Option<Value>> {
        self.entries
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Value>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Structured input that can be flattened into [`FieldValues`].
///
/// Implementors list their fields explicitly, one `set`/`set_opt` per field.
pub trait IntoFieldValues {
    fn into_field_values(self) -> FieldValues;
}

impl IntoFieldValues for FieldValues {
    fn into_field_values(self) -> FieldValues {
        self
    }
}

/// Which fields may be set to null when a change runs with `set_none`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum NoneFields {
    /// Every field.
    #[default]
    All,
    Only(BTreeSet<String>),
}

impl NoneFields {
    #[must_use]
    pub fn only<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Only(fields.into_iter().map(Into::into).collect())
    }

    #[must_use]
    pub fn allows(&self, field: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(set) => set.contains(field),
        }
    }
}

/// Knobs for [`EntityQuery::change_item`](crate::query::EntityQuery::change_item).
#[derive(Debug, Clone, Default)]
pub struct ChangeOptions {
    /// Assign nulls present in the payload instead of skipping them.
    pub set_none: bool,
    /// Restricts which fields `set_none` applies to.
    pub allowed_none_fields: NoneFields,
    /// Stage the write in the session transaction without committing.
    pub use_flush: bool,
}

impl ChangeOptions {
    #[must_use]
    pub fn set_none(mut self, allowed: NoneFields) -> Self {
        self.set_none = true;
        self.allowed_none_fields = allowed;
        self
    }

    #[must_use]
    pub fn staged(mut self) -> Self {
        self.use_flush = true;
        self
    }

    /// Whether a null for `field` should be assigned rather than skipped.
    #[must_use]
    pub fn assigns_null(&self, field: &str) -> bool {
        self.set_none && self.allowed_none_fields.allows(field)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn later_assignment_replaces_earlier() {
        let values = FieldValues::new()
            .set("name", "a")
            .set_null("score")
            .set("name", "b");
        assert_eq!(values.len(), 2);
        assert_eq!(
            values.get("name"),
            Some(&Some(Value::String(Some(Box::new("b".to_owned())))))
        );
        assert_eq!(values.get("score"), Some(&None));
    }

    #[test]
    fn null_assignment_respects_allowed_fields() {
        let opts = ChangeOptions::default();
        assert!(!opts.assigns_null("name"));

        let opts = ChangeOptions::default().set_none(NoneFields::All);
        assert!(opts.assigns_null("name"));

        let opts = ChangeOptions::default().set_none(NoneFields::only(["my_opinion"]));
        assert!(opts.assigns_null("my_opinion"));
        assert!(!opts.assigns_null("name"));
    }
}
