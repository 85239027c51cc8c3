use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Number;
use std::cmp::Ordering;

use super::record::RecordRef;

/// Raw submitted/serialized data: a JSON object keyed by field name
pub type RawData = serde_json::Map<String, serde_json::Value>;

/// Attribute value held by a record
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    DateTime(DateTime<Utc>),
    /// Foreign hop to another record (including the self-referencing parent)
    Ref(RecordRef),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_record_ref(&self) -> Option<&RecordRef> {
        match self {
            Value::Ref(r) => Some(r),
            _ => None,
        }
    }

    /// Integer view; floats truncate, text must parse
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Float(f) if f.is_finite() => Some(f.trunc() as i64),
            Value::Bool(b) => Some(i64::from(*b)),
            Value::Text(s) => s.trim().parse().ok(),
            Value::Ref(r) => Some(r.key),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Int(i) => Some(*i != 0),
            Value::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Some(true),
                "false" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Text form used for string coercion and substring matching
    pub fn display_text(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Bool(b) => Some(b.to_string()),
            Value::Int(i) => Some(i.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::Text(s) => Some(s.clone()),
            Value::DateTime(dt) => Some(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Value::Ref(r) => Some(r.key.to_string()),
        }
    }

    /// Natural JSON rendering; references render as their key
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::DateTime(dt) => {
                serde_json::Value::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            Value::Ref(r) => serde_json::Value::from(r.key),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Bool(_) => 0,
            Value::Int(_) | Value::Float(_) => 1,
            Value::Text(_) => 2,
            Value::DateTime(_) => 3,
            Value::Ref(_) => 4,
            Value::Null => 5,
        }
    }

    /// Total order used by in-memory sorting
    ///
    /// Nulls sort last ascending (and therefore first descending).
    pub fn sort_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
                let a = self.as_f64().unwrap_or(f64::NAN);
                let b = other.as_f64().unwrap_or(f64::NAN);
                // NaN goes after every number regardless of its sign bit
                a.is_nan().cmp(&b.is_nan()).then_with(|| a.total_cmp(&b))
            }
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::DateTime(a), Value::DateTime(b)) => a.cmp(b),
            (Value::Ref(a), Value::Ref(b)) => a.key.cmp(&b.key),
            _ => self.rank().cmp(&other.rank()),
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
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(dt: DateTime<Utc>) -> Self {
        Value::DateTime(dt)
    }
}

impl From<RecordRef> for Value {
    fn from(r: RecordRef) -> Self {
        Value::Ref(r)
    }
}

/// Output type of a declared field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Int,
    #[serde(alias = "string")]
    Str,
    Float,
    Bool,
}

impl ValueType {
    /// Coerce a resolved value to this type; failures render as null
    pub fn coerce(&self, value: &Value) -> serde_json::Value {
        if value.is_null() {
            return serde_json::Value::Null;
        }
        match self {
            ValueType::Int => value
                .as_i64()
                .map(serde_json::Value::from)
                .unwrap_or(serde_json::Value::Null),
            ValueType::Float => value
                .as_f64()
                .and_then(Number::from_f64)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            ValueType::Bool => value
                .as_bool()
                .map(serde_json::Value::Bool)
                .unwrap_or(serde_json::Value::Null),
            ValueType::Str => value
                .display_text()
                .map(serde_json::Value::String)
                .unwrap_or(serde_json::Value::Null),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_int_from_text_and_ref() {
        assert_eq!(ValueType::Int.coerce(&Value::from(" 42 ")), json!(42));
        assert_eq!(
            ValueType::Int.coerce(&Value::Ref(RecordRef::new("category", 7))),
            json!(7)
        );
        assert_eq!(ValueType::Int.coerce(&Value::from("abc")), json!(null));
    }

    #[test]
    fn test_coerce_str_renders_numbers() {
        assert_eq!(ValueType::Str.coerce(&Value::Int(5)), json!("5"));
        assert_eq!(ValueType::Str.coerce(&Value::Null), json!(null));
    }

    #[test]
    fn test_nulls_sort_last() {
        assert_eq!(Value::Null.sort_cmp(&Value::Int(1)), Ordering::Greater);
        assert_eq!(Value::Int(2).sort_cmp(&Value::Float(2.5)), Ordering::Less);
    }

    #[test]
    fn test_nan_sorts_after_numbers_and_before_null() {
        let nan = Value::Float(f64::NAN);
        assert_eq!(nan.sort_cmp(&Value::Float(f64::INFINITY)), Ordering::Greater);
        assert_eq!(Value::Int(i64::MAX).sort_cmp(&nan), Ordering::Less);
        assert_eq!(Value::Float(-f64::NAN).sort_cmp(&Value::Int(0)), Ordering::Greater);
        assert_eq!(nan.sort_cmp(&Value::Float(f64::NAN)), Ordering::Equal);
        assert_eq!(nan.sort_cmp(&Value::Null), Ordering::Less);

        let mut values = vec![
            Value::Float(3.0),
            nan.clone(),
            Value::Null,
            Value::Int(1),
            Value::Float(-f64::NAN),
            Value::Float(2.0),
        ];
        values.sort_by(|a, b| a.sort_cmp(b));
        assert_eq!(values[0], Value::Int(1));
        assert_eq!(values[1], Value::Float(2.0));
        assert_eq!(values[2], Value::Float(3.0));
        assert!(matches!(values[3], Value::Float(f) if f.is_nan()));
        assert!(matches!(values[4], Value::Float(f) if f.is_nan()));
        assert_eq!(values[5], Value::Null);
    }

    #[test]
    fn test_value_type_accepts_string_alias() {
        let parsed: ValueType = serde_json::from_value(json!("string")).unwrap();
        assert_eq!(parsed, ValueType::Str);
    }
}
