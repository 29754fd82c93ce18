use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::types::D1Value;

/// A result row in object shape.
///
/// Columns are kept in SELECT order. When several result columns share a name (typically a join
/// such as `SELECT a.id, b.id ...`), the entry sits where the name first appeared and holds the
/// value of the last column with that name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct D1Row {
    entries: Vec<(String, D1Value)>,
}

impl D1Row {
    /// Build an object row from positional values.
    #[must_use]
    pub fn from_columns(columns: &[String], values: Vec<D1Value>) -> Self {
        let mut entries: Vec<(String, D1Value)> = Vec::with_capacity(columns.len());
        for (name, value) in columns.iter().zip(values) {
            if let Some(slot) = entries.iter_mut().find(|(existing, _)| existing == name) {
                slot.1 = value;
            } else {
                entries.push((name.clone(), value));
            }
        }
        Self { entries }
    }

    /// Get a value from the row by column name.
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&D1Value> {
        self.entries
            .iter()
            .find(|(name, _)| name == column_name)
            .map(|(_, value)| value)
    }

    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &D1Value)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn into_entries(self) -> Vec<(String, D1Value)> {
        self.entries
    }
}

impl Serialize for D1Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn duplicate_names_collapse_to_last_value() {
        let row = D1Row::from_columns(
            &columns(&["id", "name", "id"]),
            vec![D1Value::from(1), D1Value::from("red"), D1Value::from(9)],
        );
        assert_eq!(row.len(), 2);
        assert_eq!(row.column_names(), vec!["id", "name"]);
        assert_eq!(row.get("id"), Some(&D1Value::Integer(9)));
    }

    #[test]
    fn serialises_as_object_in_column_order() {
        let row = D1Row::from_columns(
            &columns(&["z", "a"]),
            vec![D1Value::from("last"), D1Value::Null],
        );
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(
            json,
            r#"{"z":{"type":"text","value":"last"},"a":{"type":"null"}}"#
        );
    }
}
