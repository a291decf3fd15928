//! Rows and the values in them.
//!
//! A value is a 64-bit signed integer, a string, a boolean, or null.  Booleans are stored as integers (0/1), and entity
//! references are stored as the integer id of a row in the entity table; the table descriptor is what tells us how to
//! read a column back.
use rusqlite::types::{ToSql, ToSqlOutput, ValueRef};
use smallvec::SmallVec;

/// A single column value.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Text(String),
    Bool(bool),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(x) => Some(x.as_str()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(x) => Some(*x),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(x: i64) -> Value {
        Value::Integer(x)
    }
}

impl From<bool> for Value {
    fn from(x: bool) -> Value {
        Value::Bool(x)
    }
}

impl From<String> for Value {
    fn from(x: String) -> Value {
        Value::Text(x)
    }
}

impl From<&str> for Value {
    fn from(x: &str) -> Value {
        Value::Text(x.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(x: Option<T>) -> Value {
        x.map(Into::into).unwrap_or(Value::Null)
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(rusqlite::types::Value::Null),
            Value::Integer(x) => ToSqlOutput::from(*x),
            Value::Text(x) => ToSqlOutput::Borrowed(ValueRef::Text(x.as_bytes())),
            Value::Bool(x) => ToSqlOutput::from(*x as i64),
        })
    }
}

/// Entries of a [RowData].  Rows are small and built constantly during a load, so this is a `SmallVec` map rather than
/// a hashmap.
#[derive(Clone, Debug, PartialEq)]
struct RowEntry {
    name: String,
    value: Value,
}

/// The non-key columns of a row, in table column order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RowData {
    entries: SmallVec<[RowEntry; 8]>,
}

impl RowData {
    pub fn new() -> RowData {
        Default::default()
    }

    /// Set a column, replacing any previous value for the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(e) => e.value = value,
            None => self.entries.push(RowEntry { name, value }),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| &e.value)
    }

    pub fn get_text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_text)
    }

    pub fn get_integer(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_integer)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.entries
            .iter_mut()
            .find(|e| e.name == name)
            .map(|e| &mut e.value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|e| (e.name.as_str(), &e.value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl serde::Serialize for RowData {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for e in self.entries.iter() {
            map.serialize_entry(&e.name, &e.value)?;
        }
        map.end()
    }
}

/// One persisted row, as read back from a table.
#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    /// The generated id, if the table has one.
    pub id: Option<i64>,
    /// The owning parent's id, if the table is a child table.
    pub fk: Option<i64>,
    pub data: RowData,
}
