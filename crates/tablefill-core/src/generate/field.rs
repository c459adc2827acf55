//! Per-column generator assignments and the generation request.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::generate::value::Value;
use crate::schema::types::{ColumnInfo, ValueKind};

/// Generator family of a field config. Together with the generator type it
/// selects a registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GeneratorKind {
    IdGenerator,
    SequenceIn,
    RandomIn,
    TimeGenerator,
    Default,
    /// No generator chosen yet; never matches a registry entry.
    #[default]
    #[serde(rename = "")]
    Unassigned,
}

impl GeneratorKind {
    /// Whether this kind picks from a list (and so may use `CustomList`).
    pub fn picks_from_list(self) -> bool {
        matches!(self, GeneratorKind::SequenceIn | GeneratorKind::RandomIn)
    }
}

impl fmt::Display for GeneratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GeneratorKind::IdGenerator => "IdGenerator",
            GeneratorKind::SequenceIn => "SequenceIn",
            GeneratorKind::RandomIn => "RandomIn",
            GeneratorKind::TimeGenerator => "TimeGenerator",
            GeneratorKind::Default => "Default",
            GeneratorKind::Unassigned => "",
        };
        write!(f, "{}", s)
    }
}

/// Generator type that draws from a user-managed custom value list.
pub const CUSTOM_LIST_TYPE: &str = "CustomList";

/// Free-form generator settings. The list keys are typed; anything else is
/// kept verbatim so UI-specific settings survive a round trip.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraConfig {
    #[serde(
        default,
        deserialize_with = "lenient_list_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub list_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub list_values: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<ValueKind>,
    #[serde(flatten)]
    pub other: serde_json::Map<String, serde_json::Value>,
}

/// A list id is only taken from an integral JSON number. Anything else reads
/// as absent and is reported as a missing `listId` during enrichment.
fn lenient_list_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        _ => None,
    })
}

/// Generator assignment for one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldConfig {
    pub column_name: String,
    pub column_type_kind: ValueKind,
    #[serde(default)]
    pub kind: GeneratorKind,
    #[serde(rename = "type", default)]
    pub generator_type: String,
    #[serde(default)]
    pub extra_config: ExtraConfig,
    #[serde(default)]
    pub order_index: i64,
}

impl FieldConfig {
    pub fn new(
        column_name: impl Into<String>,
        column_type_kind: ValueKind,
        kind: GeneratorKind,
        generator_type: impl Into<String>,
    ) -> Self {
        Self {
            column_name: column_name.into(),
            column_type_kind,
            kind,
            generator_type: generator_type.into(),
            extra_config: ExtraConfig::default(),
            order_index: 0,
        }
    }

    /// Placeholder config for a column nobody configured.
    pub fn unassigned(column: &ColumnInfo) -> Self {
        Self::new(
            column.name.clone(),
            column.classification.value_kind(),
            GeneratorKind::Unassigned,
            "",
        )
    }

    pub fn with_list_id(mut self, list_id: i64) -> Self {
        self.extra_config.list_id = Some(list_id);
        self
    }

    pub fn with_order_index(mut self, order_index: i64) -> Self {
        self.order_index = order_index;
        self
    }

    pub fn uses_custom_list(&self) -> bool {
        self.kind.picks_from_list() && self.generator_type == CUSTOM_LIST_TYPE
    }

    /// Both a kind and a type have been chosen.
    pub fn is_assigned(&self) -> bool {
        self.kind != GeneratorKind::Unassigned && !self.generator_type.is_empty()
    }
}

/// A complete request to generate rows for one table.
///
/// Counts are signed on the wire so that zero and negative values reach
/// validation instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationInput {
    pub table_name: String,
    pub total_rows: i64,
    pub batch_size: i64,
    pub columns: Vec<ColumnInfo>,
    pub field_configs: Vec<FieldConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_profile_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::ColumnKind;

    #[test]
    fn test_field_config_wire_shape() {
        let json = r#"{
            "columnName": "name",
            "columnTypeKind": "string",
            "kind": "SequenceIn",
            "type": "CustomList",
            "extraConfig": { "listId": 3, "uiColor": "red" },
            "orderIndex": 1
        }"#;
        let cfg: FieldConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.kind, GeneratorKind::SequenceIn);
        assert_eq!(cfg.generator_type, "CustomList");
        assert_eq!(cfg.extra_config.list_id, Some(3));
        assert_eq!(cfg.extra_config.other["uiColor"], "red");
        assert!(cfg.uses_custom_list());

        let back = serde_json::to_value(&cfg).unwrap();
        assert_eq!(back["type"], "CustomList");
        assert_eq!(back["extraConfig"]["uiColor"], "red");
        assert!(back["extraConfig"].get("listValues").is_none());
    }

    #[test]
    fn test_non_numeric_list_id_reads_as_absent() {
        let parse = |extra: &str| -> Option<i64> {
            let json = format!(
                r#"{{"columnName": "name", "columnTypeKind": "string",
                    "kind": "RandomIn", "type": "CustomList", "extraConfig": {}}}"#,
                extra
            );
            let cfg: FieldConfig = serde_json::from_str(&json).unwrap();
            cfg.extra_config.list_id
        };
        assert_eq!(parse(r#"{"listId": "12"}"#), None);
        assert_eq!(parse(r#"{"listId": 1.5}"#), None);
        assert_eq!(parse(r#"{"listId": null}"#), None);
        assert_eq!(parse(r#"{"listId": true}"#), None);
        assert_eq!(parse(r#"{"listId": 4.0}"#), Some(4));
        assert_eq!(parse(r#"{"listId": 7}"#), Some(7));
        assert_eq!(parse("{}"), None);
    }

    #[test]
    fn test_empty_kind_is_unassigned() {
        let json = r#"{"columnName": "x", "columnTypeKind": "number", "kind": "", "type": ""}"#;
        let cfg: FieldConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.kind, GeneratorKind::Unassigned);
        assert!(!cfg.is_assigned());
    }

    #[test]
    fn test_unassigned_uses_column_classification() {
        let col = ColumnInfo {
            name: "created".to_string(),
            raw_type: "datetime".to_string(),
            classification: ColumnKind::Unsupported,
            is_primary: false,
        };
        let cfg = FieldConfig::unassigned(&col);
        assert_eq!(cfg.column_type_kind, ValueKind::String);
        assert_eq!(cfg.kind, GeneratorKind::Unassigned);
    }

    #[test]
    fn test_generation_input_accepts_negative_counts() {
        let json = r#"{
            "tableName": "users",
            "totalRows": -5,
            "batchSize": 0,
            "columns": [],
            "fieldConfigs": []
        }"#;
        let input: GenerationInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.total_rows, -5);
        assert!(input.db_profile_id.is_none());
    }
}
