//! # Catalog
//!
//! The saved entities the engine consumes but does not own: database
//! profiles, custom value lists and table profiles, plus the async lookup
//! traits the insert driver and enricher resolve them through.

pub mod csv;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::generate::field::FieldConfig;
use crate::generate::value::Value;
use crate::output::direct::ConnectionTarget;
use crate::schema::types::{ColumnInfo, ColumnKind, ValueKind};

fn default_port() -> u16 {
    3306
}

/// Connection settings for one target MySQL server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbProfile {
    pub id: i64,
    pub name: String,
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub database: String,
    #[serde(default)]
    pub active: bool,
}

impl DbProfile {
    /// Connection target for this profile, with `database_override` taking
    /// precedence over the profile's own database.
    pub fn target(&self, database_override: Option<&str>) -> ConnectionTarget {
        let database = database_override
            .filter(|d| !d.is_empty())
            .unwrap_or(&self.database);
        ConnectionTarget {
            host: self.host.clone(),
            port: self.port,
            user: self.username.clone(),
            password: self.password.clone(),
            database: database.to_string(),
        }
    }
}

/// A named, user-managed list of values for `CustomList` generators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomValueList {
    pub id: i64,
    pub name: String,
    pub value_type: ValueKind,
    pub values: Vec<Value>,
    pub item_count: usize,
}

impl CustomValueList {
    pub fn new(
        id: i64,
        name: impl Into<String>,
        value_type: ValueKind,
        values: Vec<Value>,
    ) -> Self {
        let item_count = values.len();
        Self {
            id,
            name: name.into(),
            value_type,
            values,
            item_count,
        }
    }
}

/// Saved generator assignments for one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableProfile {
    pub id: i64,
    #[serde(default)]
    pub profile_name: String,
    pub table_name: String,
    #[serde(default)]
    pub db_profile_id: Option<i64>,
    #[serde(default)]
    pub fields: Vec<FieldConfig>,
}

/// Lookup of database profiles.
#[async_trait]
pub trait ProfileSource: Send + Sync {
    /// The single profile marked active, if any.
    async fn active_profile(&self) -> Result<Option<DbProfile>>;

    async fn profile_by_id(&self, id: i64) -> Result<Option<DbProfile>>;
}

/// Lookup of custom value lists.
#[async_trait]
pub trait ValueListSource: Send + Sync {
    /// Fetch every list whose id is in `ids`. Missing ids are simply absent
    /// from the result.
    async fn find_lists(&self, ids: &[i64]) -> Result<Vec<CustomValueList>>;
}

/// Reuse saved field configs for a (possibly changed) set of columns.
///
/// A saved field survives when its column still exists and the column's
/// classification still produces the saved value kind.
pub fn apply_saved_profile(profile: &TableProfile, columns: &[ColumnInfo]) -> Vec<FieldConfig> {
    profile
        .fields
        .iter()
        .filter(|f| {
            columns
                .iter()
                .find(|c| c.name == f.column_name)
                .is_some_and(|c| c.classification.value_kind() == f.column_type_kind)
        })
        .cloned()
        .collect()
}

/// Whether every column is supported and has a fully chosen generator.
pub fn compute_completion(columns: &[ColumnInfo], fields: &[FieldConfig]) -> bool {
    columns.iter().all(|c| {
        if c.classification == ColumnKind::Unsupported {
            return false;
        }
        fields
            .iter()
            .find(|f| f.column_name == c.name)
            .is_some_and(|f| f.is_assigned())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::field::GeneratorKind;

    fn users_columns() -> Vec<ColumnInfo> {
        vec![
            ColumnInfo::new("id", "int", true),
            ColumnInfo::new("name", "varchar", false),
            ColumnInfo::new("dept", "varchar", false),
        ]
    }

    fn users_fields() -> Vec<FieldConfig> {
        vec![
            FieldConfig::new("id", ValueKind::Number, GeneratorKind::IdGenerator, "AutoIncrement"),
            FieldConfig::new(
                "name",
                ValueKind::String,
                GeneratorKind::SequenceIn,
                "BuiltinPersonList",
            )
            .with_order_index(1),
            FieldConfig::new(
                "dept",
                ValueKind::String,
                GeneratorKind::SequenceIn,
                "BuiltinDepartmentList",
            )
            .with_order_index(2),
        ]
    }

    #[test]
    fn test_profile_target_database_override() {
        let profile = DbProfile {
            id: 1,
            name: "local".to_string(),
            host: "127.0.0.1".to_string(),
            port: 3306,
            username: "root".to_string(),
            password: "pw".to_string(),
            database: "demo".to_string(),
            active: true,
        };
        assert_eq!(profile.target(None).database, "demo");
        assert_eq!(profile.target(Some("")).database, "demo");
        assert_eq!(profile.target(Some("other")).database, "other");
    }

    #[test]
    fn test_profile_port_defaults() {
        let p: DbProfile = serde_json::from_str(r#"{"id": 1, "name": "x", "host": "h"}"#).unwrap();
        assert_eq!(p.port, 3306);
        assert!(!p.active);
    }

    #[test]
    fn test_apply_saved_profile_reuses_all_matching_fields() {
        let profile = TableProfile {
            id: 1,
            profile_name: "users".to_string(),
            table_name: "users".to_string(),
            db_profile_id: Some(1),
            fields: users_fields(),
        };
        let reused = apply_saved_profile(&profile, &users_columns());
        assert_eq!(reused.len(), 3);
        assert_eq!(reused[0].column_name, "id");
    }

    #[test]
    fn test_apply_saved_profile_drops_missing_and_retyped_columns() {
        let profile = TableProfile {
            id: 1,
            profile_name: "users".to_string(),
            table_name: "users".to_string(),
            db_profile_id: None,
            fields: users_fields(),
        };
        let columns = vec![
            ColumnInfo::new("id", "int", true),
            // name became numeric, dept was dropped
            ColumnInfo::new("name", "bigint", false),
        ];
        let reused = apply_saved_profile(&profile, &columns);
        assert_eq!(reused.len(), 1);
        assert_eq!(reused[0].column_name, "id");
    }

    #[test]
    fn test_compute_completion() {
        assert!(compute_completion(&users_columns(), &users_fields()));

        let mut partial = users_fields();
        partial[2].generator_type.clear();
        assert!(!compute_completion(&users_columns(), &partial));

        let mut columns = users_columns();
        columns.push(ColumnInfo::new("created_at", "datetime", false));
        assert!(!compute_completion(&columns, &users_fields()));
    }

    #[test]
    fn test_custom_list_item_count() {
        let list = CustomValueList::new(
            1,
            "names",
            ValueKind::String,
            vec![Value::from("alice"), Value::from("bob")],
        );
        assert_eq!(list.item_count, 2);
    }
}
