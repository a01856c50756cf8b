//! Raw values and records as read from the store

use std::borrow::Cow;
use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};

/// A raw scalar as stored in a table cell.
///
/// Every text-matching step goes through [`Value::as_text`], which is the
/// only place a non-text value is coerced to a string.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Text(String),
    Bytes(Vec<u8>),
    Number(serde_json::Number),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Text form used for matching. `None` for null and empty values.
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Value::Null => None,
            Value::Text(s) if s.is_empty() => None,
            Value::Text(s) => Some(Cow::Borrowed(s.as_str())),
            Value::Bytes(b) if b.is_empty() => None,
            Value::Bytes(b) => Some(String::from_utf8_lossy(b)),
            Value::Number(n) => Some(Cow::Owned(n.to_string())),
        }
    }

    /// Parse the value as an embedded JSON document.
    ///
    /// Only text that starts with `{` or `[` is attempted. Parse failures
    /// return `None` and the caller keeps treating the value as opaque text.
    pub fn as_structured(&self) -> Option<serde_json::Value> {
        let text = match self {
            Value::Text(_) | Value::Bytes(_) => self.as_text()?,
            _ => return None,
        };
        let trimmed = text.trim_start();
        if !(trimmed.starts_with('{') || trimmed.starts_with('[')) {
            return None;
        }
        serde_json::from_str(trimmed).ok()
    }

    pub fn from_f64(n: f64) -> Self {
        serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or_else(|| Value::Text(n.to_string()))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            other => f.write_str(&other.as_text().unwrap_or_default()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Bytes(b) => serializer.serialize_str(&String::from_utf8_lossy(b)),
            Value::Number(n) => n.serialize(serializer),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n.into())
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// One named cell of a record
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub value: Value,
}

impl Field {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// One row of a source table, in column order.
///
/// Records are never mutated after they are read; transforms such as
/// redaction build a new field list.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub table: String,
    pub fields: Vec<Field>,
}

impl Record {
    /// Pair column names with a row of values. Extra values without a
    /// column are dropped.
    pub fn new(table: impl Into<String>, columns: &[String], values: Vec<Value>) -> Self {
        let fields = columns
            .iter()
            .zip(values)
            .map(|(name, value)| Field {
                name: name.clone(),
                value,
            })
            .collect();

        Self {
            table: table.into(),
            fields,
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.value)
    }
}

/// Serialize a field list as an ordered JSON object.
pub fn serialize_fields<S: Serializer>(
    fields: &[Field],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(fields.len()))?;
    for field in fields {
        map.serialize_entry(&field.name, &field.value)?;
    }
    map.end()
}

/// Result of decoding one row from a source
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Row(Vec<Value>),
    Skipped(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_text_skips_empty() {
        assert_eq!(Value::Null.as_text(), None);
        assert_eq!(Value::from("").as_text(), None);
        assert_eq!(Value::Bytes(vec![]).as_text(), None);
        assert_eq!(Value::from(42i64).as_text().as_deref(), Some("42"));
        assert_eq!(
            Value::Bytes(b"blob".to_vec()).as_text().as_deref(),
            Some("blob")
        );
    }

    #[test]
    fn test_record_pairs_columns_and_values() {
        let columns = vec!["key".to_string(), "value".to_string()];
        let record = Record::new(
            "ItemTable",
            &columns,
            vec![Value::from("plan_type"), Value::Null, Value::from("extra")],
        );

        assert_eq!(record.fields.len(), 2);
        assert_eq!(record.get("key"), Some(&Value::from("plan_type")));
        assert_eq!(record.get("value"), Some(&Value::Null));
    }

    #[test]
    fn test_as_structured_falls_back() {
        let ok = Value::from(r#"{"accessToken": "abc"}"#);
        assert!(ok.as_structured().is_some());

        let broken = Value::from("{not json");
        assert!(broken.as_structured().is_none());

        let plain = Value::from("hello");
        assert!(plain.as_structured().is_none());
    }

    #[test]
    fn test_record_serializes_in_column_order() {
        #[derive(serde::Serialize)]
        struct Wrapper<'a> {
            #[serde(serialize_with = "serialize_fields")]
            data: &'a [Field],
        }

        let record = Record {
            table: "t".to_string(),
            fields: vec![Field::new("z", "1"), Field::new("a", Value::Null)],
        };
        let json = serde_json::to_string(&Wrapper {
            data: &record.fields,
        })
        .unwrap();

        assert_eq!(json, r#"{"data":{"z":"1","a":null}}"#);
    }
}
