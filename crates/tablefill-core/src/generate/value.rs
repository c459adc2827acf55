use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// A generated value for a database column.
///
/// The `String` variant uses `Cow<'static, str>` so values drawn from the
/// built-in lists are held as `&'static str` borrows, while ids and custom
/// list entries are owned.
///
/// Serialized untagged so custom list values read and write as plain JSON
/// strings and numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    String(Cow<'static, str>),
}

impl Value {
    /// Convert to a MySQL literal suitable for INSERT statements.
    ///
    /// Numbers are emitted bare, strings single-quoted with embedded quotes
    /// doubled.
    pub fn to_sql_literal(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => {
                if f.is_finite() {
                    format!("{}", f)
                } else {
                    // MySQL has no literal for NaN/Infinity
                    "NULL".to_string()
                }
            }
            Value::String(s) => format!("'{}'", s.replace('\'', "''")),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }
}

impl From<&'static str> for Value {
    fn from(s: &'static str) -> Self {
        Value::String(Cow::Borrowed(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Cow::Owned(s))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(fl) => write!(f, "{}", fl),
            Value::String(s) => write!(f, "{}", s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_literals() {
        assert_eq!(Value::Null.to_sql_literal(), "NULL");
        assert_eq!(Value::Int(42).to_sql_literal(), "42");
        assert_eq!(Value::Float(1.5).to_sql_literal(), "1.5");
        assert_eq!(Value::from("zhangsan").to_sql_literal(), "'zhangsan'");
    }

    #[test]
    fn test_string_literal_escapes_quotes() {
        let v = Value::from("O'Brien".to_string());
        assert_eq!(v.to_sql_literal(), "'O''Brien'");
    }

    #[test]
    fn test_untagged_json_values() {
        let values: Vec<Value> = serde_json::from_str(r#"["alice", 7, 2.5, null]"#).unwrap();
        assert_eq!(values[0], Value::from("alice".to_string()));
        assert_eq!(values[1], Value::Int(7));
        assert_eq!(values[2], Value::Float(2.5));
        assert!(values[3].is_null());
        assert!(values[1].is_number());
        assert!(!values[0].is_number());
    }
}
