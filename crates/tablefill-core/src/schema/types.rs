use serde::{Deserialize, Serialize};
use std::fmt;

/// How a column's raw MySQL type is treated by the generators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    String,
    Number,
    Unsupported,
}

impl ColumnKind {
    /// The value kind a generator must produce for this column.
    ///
    /// Unsupported columns fall back to `String`, mirroring how field configs
    /// are synthesized for them.
    pub fn value_kind(self) -> ValueKind {
        match self {
            ColumnKind::Number => ValueKind::Number,
            ColumnKind::String | ColumnKind::Unsupported => ValueKind::String,
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKind::String => write!(f, "string"),
            ColumnKind::Number => write!(f, "number"),
            ColumnKind::Unsupported => write!(f, "unsupported"),
        }
    }
}

/// Kind of value a generator produces: the `columnTypeKind` of a field config
/// and the `valueType` of a custom value list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    String,
    Number,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::String => write!(f, "string"),
            ValueKind::Number => write!(f, "number"),
        }
    }
}

/// Column metadata as returned by schema introspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnInfo {
    pub name: String,
    pub raw_type: String,
    pub classification: ColumnKind,
    pub is_primary: bool,
}

impl ColumnInfo {
    /// Build a column from its MySQL `DATA_TYPE`, classifying it on the way.
    pub fn new(name: impl Into<String>, raw_type: impl Into<String>, is_primary: bool) -> Self {
        let raw_type = raw_type.into().to_lowercase();
        let classification = classify_mysql_type(&raw_type);
        Self {
            name: name.into(),
            raw_type,
            classification,
            is_primary,
        }
    }
}

const STRING_TYPES: &[&str] = &[
    "char",
    "varchar",
    "text",
    "tinytext",
    "mediumtext",
    "longtext",
    "enum",
    "set",
    "json",
];

const NUMBER_TYPES: &[&str] = &[
    "int",
    "integer",
    "tinyint",
    "smallint",
    "mediumint",
    "bigint",
    "decimal",
    "numeric",
    "float",
    "double",
];

/// Classify a MySQL `DATA_TYPE` string (case-insensitive).
pub fn classify_mysql_type(data_type: &str) -> ColumnKind {
    let normalized = data_type.trim().to_lowercase();
    if STRING_TYPES.contains(&normalized.as_str()) {
        ColumnKind::String
    } else if NUMBER_TYPES.contains(&normalized.as_str()) {
        ColumnKind::Number
    } else {
        ColumnKind::Unsupported
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_string_types() {
        for t in ["char", "VARCHAR", "text", "longtext", "enum", "set", "json"] {
            assert_eq!(classify_mysql_type(t), ColumnKind::String, "{}", t);
        }
    }

    #[test]
    fn test_classify_number_types() {
        for t in ["int", "BIGINT", "tinyint", "decimal", "double", "float"] {
            assert_eq!(classify_mysql_type(t), ColumnKind::Number, "{}", t);
        }
    }

    #[test]
    fn test_classify_unsupported_types() {
        for t in ["datetime", "timestamp", "blob", "geometry", ""] {
            assert_eq!(classify_mysql_type(t), ColumnKind::Unsupported, "{}", t);
        }
    }

    #[test]
    fn test_unsupported_column_generates_as_string() {
        assert_eq!(ColumnKind::Unsupported.value_kind(), ValueKind::String);
        assert_eq!(ColumnKind::Number.value_kind(), ValueKind::Number);
    }

    #[test]
    fn test_column_info_wire_shape() {
        let col = ColumnInfo::new("id", "INT", true);
        let json = serde_json::to_value(&col).unwrap();
        assert_eq!(json["name"], "id");
        assert_eq!(json["rawType"], "int");
        assert_eq!(json["classification"], "number");
        assert_eq!(json["isPrimary"], true);
    }
}
