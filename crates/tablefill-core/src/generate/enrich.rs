//! Resolve `CustomList` references into self-contained field configs.

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::catalog::{CustomValueList, ValueListSource};
use crate::error::{Result, TableFillError};
use crate::generate::field::{FieldConfig, GenerationInput};
use crate::schema::types::ValueKind;

/// Return a copy of `input` whose `CustomList` fields carry the referenced
/// list's name, values and value type in their extra config.
///
/// All referenced lists are fetched with a single lookup. Fails when a field
/// has no `listId`, when a list is missing or empty, or when the list's value
/// type differs from the field's column type kind.
pub async fn enrich_generation_input(
    input: &GenerationInput,
    lists: &dyn ValueListSource,
) -> Result<GenerationInput> {
    let needs: Vec<&FieldConfig> = input
        .field_configs
        .iter()
        .filter(|f| f.uses_custom_list())
        .collect();
    if needs.is_empty() {
        return Ok(input.clone());
    }

    let mut ids = BTreeSet::new();
    for field in &needs {
        let id = field.extra_config.list_id.ok_or_else(|| {
            TableFillError::list_resolution(format!(
                "CustomList config for column '{}' is missing listId",
                field.column_name
            ))
        })?;
        ids.insert(id);
    }
    let ids: Vec<i64> = ids.into_iter().collect();

    let found = lists.find_lists(&ids).await?;
    debug!(requested = ids.len(), found = found.len(), "Resolved custom lists");
    let by_id: HashMap<i64, CustomValueList> = found.into_iter().map(|l| (l.id, l)).collect();

    let field_configs = input
        .field_configs
        .iter()
        .map(|f| {
            if !f.uses_custom_list() {
                return Ok(f.clone());
            }
            resolve_field(f, &by_id)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(GenerationInput {
        field_configs,
        ..input.clone()
    })
}

fn resolve_field(
    field: &FieldConfig,
    by_id: &HashMap<i64, CustomValueList>,
) -> Result<FieldConfig> {
    let list = field
        .extra_config
        .list_id
        .and_then(|id| by_id.get(&id))
        .filter(|l| !l.values.is_empty())
        .ok_or_else(|| {
            TableFillError::list_resolution(format!(
                "CustomList {} not found or empty (column '{}')",
                field.extra_config.list_id.unwrap_or_default(),
                field.column_name
            ))
        })?;

    if list.value_type != field.column_type_kind {
        let message = match list.value_type {
            ValueKind::Number => "Numeric lists can only be applied to number fields",
            ValueKind::String => "String lists can only be applied to string fields",
        };
        return Err(TableFillError::list_resolution(format!(
            "{} (list '{}', column '{}')",
            message, list.name, field.column_name
        )));
    }

    let mut resolved = field.clone();
    resolved.extra_config.list_name = Some(list.name.clone());
    resolved.extra_config.list_values = list.values.clone();
    resolved.extra_config.value_type = Some(list.value_type);
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::field::GeneratorKind;
    use crate::generate::value::Value;
    use crate::schema::types::ColumnInfo;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Lists {
        lists: Vec<CustomValueList>,
        lookups: AtomicUsize,
    }

    impl Lists {
        fn new(lists: Vec<CustomValueList>) -> Self {
            Self {
                lists,
                lookups: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ValueListSource for Lists {
        async fn find_lists(&self, ids: &[i64]) -> Result<Vec<CustomValueList>> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .lists
                .iter()
                .filter(|l| ids.contains(&l.id))
                .cloned()
                .collect())
        }
    }

    fn names_list() -> CustomValueList {
        CustomValueList::new(
            1,
            "names",
            ValueKind::String,
            vec![Value::from("alice"), Value::from("bob")],
        )
    }

    fn input_with(fields: Vec<FieldConfig>) -> GenerationInput {
        GenerationInput {
            table_name: "users".to_string(),
            total_rows: 2,
            batch_size: 2,
            columns: vec![
                ColumnInfo::new("name", "varchar", false),
                ColumnInfo::new("nick", "varchar", false),
                ColumnInfo::new("score", "int", false),
            ],
            field_configs: fields,
            db_profile_id: None,
            database: None,
        }
    }

    fn custom(column: &str, kind: ValueKind, list_id: i64) -> FieldConfig {
        FieldConfig::new(column, kind, GeneratorKind::SequenceIn, "CustomList")
            .with_list_id(list_id)
    }

    #[tokio::test]
    async fn test_inlines_list_values_without_touching_original() {
        let lists = Lists::new(vec![names_list()]);
        let input = input_with(vec![
            custom("name", ValueKind::String, 1),
            FieldConfig::new("score", ValueKind::Number, GeneratorKind::Default, "const_1"),
        ]);

        let enriched = enrich_generation_input(&input, &lists).await.unwrap();
        let extra = &enriched.field_configs[0].extra_config;
        assert_eq!(extra.list_name.as_deref(), Some("names"));
        assert_eq!(extra.list_values.len(), 2);
        assert_eq!(extra.value_type, Some(ValueKind::String));
        assert_eq!(enriched.field_configs[1], input.field_configs[1]);

        assert!(input.field_configs[0].extra_config.list_values.is_empty());
    }

    #[tokio::test]
    async fn test_distinct_ids_fetched_in_one_lookup() {
        let lists = Lists::new(vec![names_list()]);
        let input = input_with(vec![
            custom("name", ValueKind::String, 1),
            custom("nick", ValueKind::String, 1),
        ]);
        let enriched = enrich_generation_input(&input, &lists).await.unwrap();
        assert_eq!(lists.lookups.load(Ordering::SeqCst), 1);
        assert_eq!(enriched.field_configs[1].extra_config.list_values.len(), 2);
    }

    #[tokio::test]
    async fn test_no_custom_lists_skips_lookup() {
        let lists = Lists::new(vec![]);
        let input = input_with(vec![FieldConfig::new(
            "name",
            ValueKind::String,
            GeneratorKind::SequenceIn,
            "BuiltinPersonList",
        )]);
        let enriched = enrich_generation_input(&input, &lists).await.unwrap();
        assert_eq!(enriched, input);
        assert_eq!(lists.lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_string_list_id_reported_as_missing() {
        let lists = Lists::new(vec![names_list()]);
        let json = r#"{
            "tableName": "users",
            "totalRows": 2,
            "batchSize": 2,
            "columns": [{"name": "name", "rawType": "varchar", "classification": "string",
                         "isPrimary": false}],
            "fieldConfigs": [{"columnName": "name", "columnTypeKind": "string",
                              "kind": "SequenceIn", "type": "CustomList",
                              "extraConfig": {"listId": "1"}}]
        }"#;
        let input: GenerationInput = serde_json::from_str(json).unwrap();

        let err = enrich_generation_input(&input, &lists).await.unwrap_err();
        assert!(err.to_string().contains("missing listId"), "{}", err);
        assert_eq!(lists.lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_list_id_fails() {
        let lists = Lists::new(vec![names_list()]);
        let input = input_with(vec![
            custom("name", ValueKind::String, 1),
            FieldConfig::new("nick", ValueKind::String, GeneratorKind::RandomIn, "CustomList"),
        ]);
        let err = enrich_generation_input(&input, &lists).await.unwrap_err();
        assert!(err.to_string().contains("missing listId"), "{}", err);
        assert_eq!(lists.lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_list_fails() {
        let lists = Lists::new(vec![names_list()]);
        let input = input_with(vec![custom("name", ValueKind::String, 99)]);
        let err = enrich_generation_input(&input, &lists).await.unwrap_err();
        assert!(err.to_string().contains("not found or empty"), "{}", err);
    }

    #[tokio::test]
    async fn test_empty_list_fails() {
        let lists = Lists::new(vec![CustomValueList::new(2, "empty", ValueKind::String, vec![])]);
        let input = input_with(vec![custom("name", ValueKind::String, 2)]);
        assert!(enrich_generation_input(&input, &lists).await.is_err());
    }

    #[tokio::test]
    async fn test_value_type_mismatch_fails_both_ways() {
        let lists = Lists::new(vec![
            names_list(),
            CustomValueList::new(3, "scores", ValueKind::Number, vec![Value::Int(1)]),
        ]);

        let err = enrich_generation_input(
            &input_with(vec![custom("score", ValueKind::Number, 1)]),
            &lists,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().starts_with("String lists"), "{}", err);

        let err = enrich_generation_input(
            &input_with(vec![custom("name", ValueKind::String, 3)]),
            &lists,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().starts_with("Numeric lists"), "{}", err);
    }
}
