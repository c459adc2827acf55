//! # Batch SQL Builder
//!
//! Turns a generation request into literal MySQL `INSERT` statements, one
//! statement per batch:
//!
//! ```sql
//! INSERT INTO `users` (`name`, `dept`) VALUES ('zhangsan', 'dept_1'), ('lisi', 'dept_2');
//! ```
//!
//! Row indices passed to the generators are absolute across the whole run so
//! `SequenceIn` cycles continue across batch boundaries.

use indexmap::IndexMap;

use crate::error::{Result, TableFillError};
use crate::generate::field::{FieldConfig, GenerationInput};
use crate::generate::registry::GeneratorRegistry;
use crate::generate::value::Value;
use crate::schema::types::ColumnInfo;

/// Upper bound on `totalRows` for a single run.
pub const MAX_TOTAL_ROWS: i64 = 1_000_000;

/// Statements for one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildResult {
    pub statements: Vec<String>,
    pub row_count: usize,
}

/// A bounded sample of statements plus one progress line per prepared chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct Preview {
    pub statements: Vec<String>,
    pub events: Vec<String>,
}

/// Check `totalRows` and `batchSize`, returning them as validated counts.
pub fn validate_counts(input: &GenerationInput) -> Result<(usize, usize)> {
    if input.total_rows <= 0 {
        return Err(TableFillError::validation("Total rows must be positive"));
    }
    if input.total_rows > MAX_TOTAL_ROWS {
        return Err(TableFillError::validation("Total rows limit is 1,000,000"));
    }
    if input.batch_size <= 0 {
        return Err(TableFillError::validation("Batch size must be positive"));
    }
    Ok((input.total_rows as usize, input.batch_size as usize))
}

/// Everything that must hold before any SQL is built for `input`.
pub fn validate_generation_input(input: &GenerationInput) -> Result<(usize, usize)> {
    if input.table_name.trim().is_empty() {
        return Err(TableFillError::validation("Table name is required"));
    }
    validate_counts(input)
}

/// Field configs keyed by column name, with a placeholder for every column
/// that has none.
pub fn ensure_field_configs(
    columns: &[ColumnInfo],
    field_configs: &[FieldConfig],
) -> IndexMap<String, FieldConfig> {
    let mut map: IndexMap<String, FieldConfig> = field_configs
        .iter()
        .map(|cfg| (cfg.column_name.clone(), cfg.clone()))
        .collect();
    for column in columns {
        if !map.contains_key(&column.name) {
            map.insert(column.name.clone(), FieldConfig::unassigned(column));
        }
    }
    map
}

/// Build the single INSERT statement for rows
/// `start_index .. start_index + batch_size`.
///
/// A column is left out of the column list only when its generator reports
/// `skip_insert` for the batch's first row *and* it is a primary key. Other
/// `skip_insert` cells are sent as `NULL`.
pub fn build_batch_statements(
    registry: &GeneratorRegistry,
    input: &GenerationInput,
    start_index: usize,
    batch_size: usize,
) -> Result<BuildResult> {
    let configs = ensure_field_configs(&input.columns, &input.field_configs);

    let mut include: Vec<(&ColumnInfo, &FieldConfig)> = Vec::with_capacity(input.columns.len());
    for column in &input.columns {
        let Some(cfg) = configs.get(&column.name) else {
            continue;
        };
        let first = registry.generate(
            cfg.column_type_kind,
            cfg.kind,
            &cfg.generator_type,
            start_index,
            column,
            &cfg.extra_config,
        )?;
        if !(first.skip_insert && column.is_primary) {
            include.push((column, cfg));
        }
    }

    if include.is_empty() {
        return Err(TableFillError::validation("No columns available for insert"));
    }

    let col_list = include
        .iter()
        .map(|(c, _)| quote_identifier(&c.name))
        .collect::<Vec<_>>()
        .join(", ");
    let mut sql = format!(
        "INSERT INTO {} ({}) VALUES ",
        quote_identifier(&input.table_name),
        col_list
    );

    for offset in 0..batch_size {
        if offset > 0 {
            sql.push_str(", ");
        }
        sql.push('(');
        for (j, (column, cfg)) in include.iter().enumerate() {
            if j > 0 {
                sql.push_str(", ");
            }
            let generated = registry.generate(
                cfg.column_type_kind,
                cfg.kind,
                &cfg.generator_type,
                start_index + offset,
                column,
                &cfg.extra_config,
            )?;
            let literal = if generated.skip_insert {
                Value::Null.to_sql_literal()
            } else {
                generated.value.to_sql_literal()
            };
            sql.push_str(&literal);
        }
        sql.push(')');
    }
    sql.push(';');

    Ok(BuildResult {
        statements: vec![sql],
        row_count: batch_size,
    })
}

/// Build statements chunk by chunk until `totalRows` rows are prepared or
/// `max_statements` statements have been collected.
pub fn generate_preview_statements(
    registry: &GeneratorRegistry,
    input: &GenerationInput,
    max_statements: usize,
) -> Result<Preview> {
    let (total_rows, batch_size) = validate_counts(input)?;
    let mut preview = Preview::default();
    let mut generated = 0usize;

    while generated < total_rows && preview.statements.len() < max_statements {
        let current = batch_size.min(total_rows - generated);
        let batch = build_batch_statements(registry, input, generated, current)?;
        for statement in batch.statements {
            if preview.statements.len() < max_statements {
                preview.statements.push(statement);
            }
        }
        generated += batch.row_count;
        preview
            .events
            .push(format!("Prepared rows {}/{}", generated, total_rows));
    }

    Ok(preview)
}

/// Back-tick quote a MySQL identifier. Embedded back-ticks are not escaped.
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name)
}

/// Truncate a SQL string for error messages and logs.
pub fn truncate_sql(sql: &str, max_len: usize) -> String {
    if sql.len() <= max_len {
        return sql.to_string();
    }
    let mut end = max_len;
    while !sql.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &sql[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::field::GeneratorKind;
    use crate::schema::types::ValueKind;

    fn registry() -> &'static GeneratorRegistry {
        GeneratorRegistry::builtin()
    }

    fn users_input(total_rows: i64, batch_size: i64) -> GenerationInput {
        GenerationInput {
            table_name: "users".to_string(),
            total_rows,
            batch_size,
            columns: vec![
                ColumnInfo::new("id", "int", true),
                ColumnInfo::new("name", "varchar", false),
                ColumnInfo::new("dept", "varchar", false),
                ColumnInfo::new("flag", "tinyint", false),
            ],
            field_configs: vec![
                FieldConfig::new(
                    "id",
                    ValueKind::Number,
                    GeneratorKind::IdGenerator,
                    "AutoIncrement",
                ),
                FieldConfig::new(
                    "name",
                    ValueKind::String,
                    GeneratorKind::SequenceIn,
                    "BuiltinPersonList",
                ),
                FieldConfig::new(
                    "dept",
                    ValueKind::String,
                    GeneratorKind::SequenceIn,
                    "BuiltinDepartmentList",
                ),
                FieldConfig::new("flag", ValueKind::Number, GeneratorKind::Default, "const_1"),
            ],
            db_profile_id: None,
            database: None,
        }
    }

    #[test]
    fn test_end_to_end_preview() {
        let preview = generate_preview_statements(registry(), &users_input(2, 2), 1).unwrap();
        let expected = concat!(
            "INSERT INTO `users` (`name`, `dept`, `flag`) ",
            "VALUES ('zhangsan', 'dept_1', 1), ('lisi', 'dept_2', 1);"
        );
        assert_eq!(preview.statements, vec![expected.to_string()]);
        assert_eq!(preview.events, vec!["Prepared rows 2/2".to_string()]);
    }

    #[test]
    fn test_preview_stops_at_statement_cap() {
        let preview = generate_preview_statements(registry(), &users_input(10, 3), 2).unwrap();
        assert_eq!(preview.statements.len(), 2);
        assert_eq!(preview.events, vec!["Prepared rows 3/10", "Prepared rows 6/10"]);
    }

    #[test]
    fn test_preview_covers_remainder_batch() {
        let preview = generate_preview_statements(registry(), &users_input(7, 3), 10).unwrap();
        assert_eq!(preview.statements.len(), 3);
        assert_eq!(preview.events.last().map(String::as_str), Some("Prepared rows 7/7"));
    }

    #[test]
    fn test_row_count_accounting_sums_to_total() {
        for (total, batch) in [(1, 1), (10, 3), (100, 7), (64, 64), (5, 100)] {
            let input = users_input(total, batch);
            let (total_rows, batch_size) = validate_counts(&input).unwrap();
            let mut done = 0usize;
            while done < total_rows {
                let current = batch_size.min(total_rows - done);
                done += build_batch_statements(registry(), &input, done, current)
                    .unwrap()
                    .row_count;
            }
            assert_eq!(done, total_rows, "total={} batch={}", total, batch);
        }
    }

    #[test]
    fn test_sequence_continues_across_batches() {
        let input = users_input(4, 2);
        let second = build_batch_statements(registry(), &input, 2, 2).unwrap();
        assert!(second.statements[0].contains("('wangwu', 'dept_3', 1), ('zhaoliu', 'dept_4', 1)"));
    }

    #[test]
    fn test_skip_insert_non_primary_is_null() {
        let mut input = users_input(1, 1);
        input.field_configs[3] =
            FieldConfig::new("flag", ValueKind::Number, GeneratorKind::Default, "DbDefault");
        let result = build_batch_statements(registry(), &input, 0, 1).unwrap();
        assert_eq!(
            result.statements[0],
            "INSERT INTO `users` (`name`, `dept`, `flag`) VALUES ('zhangsan', 'dept_1', NULL);"
        );
    }

    #[test]
    fn test_primary_key_without_skip_is_included() {
        let mut input = users_input(2, 2);
        input.field_configs[0] = FieldConfig::new(
            "id",
            ValueKind::Number,
            GeneratorKind::SequenceIn,
            "BuiltinNumIdList",
        );
        let result = build_batch_statements(registry(), &input, 0, 2).unwrap();
        let header = "INSERT INTO `users` (`id`, `name`, `dept`, `flag`)";
        assert!(result.statements[0].starts_with(header));
        assert!(result.statements[0].contains("(101, 'zhangsan', 'dept_1', 1)"));
    }

    #[test]
    fn test_explicit_null_generator() {
        let mut input = users_input(1, 1);
        input.field_configs[2] = FieldConfig::new(
            "dept",
            ValueKind::String,
            GeneratorKind::Default,
            "Null",
        );
        let result = build_batch_statements(registry(), &input, 0, 1).unwrap();
        assert!(result.statements[0].ends_with("VALUES ('zhangsan', NULL, 1);"));
    }

    #[test]
    fn test_no_columns_available() {
        let input = GenerationInput {
            columns: vec![ColumnInfo::new("id", "int", true)],
            field_configs: vec![FieldConfig::new(
                "id",
                ValueKind::Number,
                GeneratorKind::IdGenerator,
                "AutoIncrement",
            )],
            ..users_input(1, 1)
        };
        let err = build_batch_statements(registry(), &input, 0, 1).unwrap_err();
        assert_eq!(err.to_string(), "No columns available for insert");
    }

    #[test]
    fn test_unconfigured_column_fails_generation() {
        let mut input = users_input(1, 1);
        input.field_configs.truncate(3);
        let err = build_batch_statements(registry(), &input, 0, 1).unwrap_err();
        assert!(matches!(err, TableFillError::GeneratorNotFound { .. }));
    }

    #[test]
    fn test_custom_list_values_are_escaped() {
        let mut input = users_input(1, 1);
        let mut cfg = FieldConfig::new(
            "name",
            ValueKind::String,
            GeneratorKind::SequenceIn,
            "CustomList",
        );
        cfg.extra_config.list_values = vec![Value::from("O'Brien")];
        input.field_configs[1] = cfg;
        let result = build_batch_statements(registry(), &input, 0, 1).unwrap();
        assert!(result.statements[0].contains("('O''Brien', 'dept_1', 1)"));
    }

    #[test]
    fn test_count_validation_boundaries() {
        assert!(validate_counts(&users_input(1_000_000, 1)).is_ok());
        assert!(validate_counts(&users_input(1_000_001, 1)).is_err());
        assert!(validate_counts(&users_input(0, 1)).is_err());
        assert!(validate_counts(&users_input(-3, 1)).is_err());
        assert!(validate_counts(&users_input(10, 0)).is_err());
        assert!(validate_counts(&users_input(10, -1)).is_err());
    }

    #[test]
    fn test_table_name_required() {
        let mut input = users_input(1, 1);
        input.table_name = "  ".to_string();
        let err = validate_generation_input(&input).unwrap_err();
        assert_eq!(err.to_string(), "Table name is required");
    }

    #[test]
    fn test_ensure_field_configs_fills_gaps_in_order() {
        let input = users_input(1, 1);
        let map = ensure_field_configs(&input.columns, &input.field_configs[..2]);
        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["id", "name", "dept", "flag"]);
        assert_eq!(map["flag"].column_type_kind, ValueKind::Number);
        assert_eq!(map["dept"].kind, GeneratorKind::Unassigned);
    }

    #[test]
    fn test_quote_identifier_is_verbatim() {
        assert_eq!(quote_identifier("users"), "`users`");
        assert_eq!(quote_identifier("we`ird"), "`we`ird`");
    }

    #[test]
    fn test_truncate_sql() {
        assert_eq!(truncate_sql("SELECT 1", 200), "SELECT 1");
        let long = "A".repeat(300);
        let truncated = truncate_sql(&long, 200);
        assert_eq!(truncated.len(), 203);
        assert!(truncated.ends_with("..."));
    }
}
