//! Row type

use crate::value::FieldValue;
use ahash::RandomState;
use std::collections::HashMap;

/// A data row: field name → value
///
/// Rows are read-only inputs to formula evaluation. A field that is absent
/// from the row resolves to [`FieldValue::Empty`].
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Row {
    fields: HashMap<String, FieldValue, RandomState>,
}

impl Row {
    /// Create an empty row
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a field value, if present
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Get a field value, treating absent fields as empty
    pub fn value(&self, name: &str) -> &FieldValue {
        const EMPTY: &FieldValue = &FieldValue::Empty;
        self.fields.get(name).unwrap_or(EMPTY)
    }

    /// Set a field value, returning the previous one
    pub fn insert<K: Into<String>, V: Into<FieldValue>>(
        &mut self,
        name: K,
        value: V,
    ) -> Option<FieldValue> {
        self.fields.insert(name.into(), value.into())
    }

    /// Builder-style [`Row::insert`]
    pub fn with<K: Into<String>, V: Into<FieldValue>>(mut self, name: K, value: V) -> Self {
        self.insert(name, value);
        self
    }

    /// Check whether a field is present
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the row has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over (name, value) pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (k, v) in iter {
            row.insert(k, v);
        }
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_missing_field_is_empty() {
        let row = Row::new().with("a", 1);
        assert_eq!(row.value("a"), &FieldValue::Number(1.0));
        assert_eq!(row.value("b"), &FieldValue::Empty);
        assert!(row.get("b").is_none());
    }

    #[test]
    fn test_from_iter() {
        let row: Row = [("text", "Hello"), ("other", "World")].into_iter().collect();
        assert_eq!(row.len(), 2);
        assert!(row.contains("text"));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_json_object() {
        let row: Row = serde_json::from_str(r#"{"Prix": "10 €", "Qte": 12, "x": null}"#).unwrap();
        assert_eq!(row.value("Prix"), &FieldValue::String("10 €".into()));
        assert_eq!(row.value("Qte"), &FieldValue::Number(12.0));
        assert_eq!(row.value("x"), &FieldValue::Empty);
    }
}
