use sqlx::mysql::MySqlPool;
use sqlx::Row;
use tracing::debug;

use crate::error::{Result, TableFillError};
use crate::schema::types::ColumnInfo;

/// Reads column metadata for a single table from `INFORMATION_SCHEMA`.
pub struct MySqlIntrospector {
    pool: MySqlPool,
    database_name: Option<String>,
}

impl MySqlIntrospector {
    /// `database_name` pins the schema to look in; when `None` the schema is
    /// resolved from the connection's current database or, failing that, from
    /// the first schema that has a table with the requested name.
    pub fn new(pool: MySqlPool, database_name: Option<String>) -> Self {
        Self {
            pool,
            database_name: database_name.filter(|d| !d.is_empty()),
        }
    }

    /// Fetch the columns of `table_name` in ordinal order.
    pub async fn fetch_columns(&self, table_name: &str) -> Result<Vec<ColumnInfo>> {
        let schema = self.resolve_schema(table_name).await?;
        debug!(schema = %schema, table = table_name, "Fetching column metadata");

        // CAST to CHAR for MySQL 8.4+ VARBINARY compatibility
        let query = r#"
            SELECT
                CAST(COLUMN_NAME AS CHAR) AS column_name,
                CAST(DATA_TYPE AS CHAR) AS data_type,
                CAST(COLUMN_KEY AS CHAR) AS column_key
            FROM INFORMATION_SCHEMA.COLUMNS
            WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?
            ORDER BY ORDINAL_POSITION
        "#;

        let rows = sqlx::query(query)
            .bind(&schema)
            .bind(table_name)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| TableFillError::Introspection {
                query: "fetch columns".to_string(),
                source: e,
            })?;

        if rows.is_empty() {
            return Err(TableFillError::Other(format!(
                "Table not found or has no columns: {}.{}",
                schema, table_name
            )));
        }

        let mut columns = Vec::with_capacity(rows.len());
        for row in rows {
            let name: String = row.get("column_name");
            let data_type: String = row.get("data_type");
            let column_key: Option<String> = row.get("column_key");
            columns.push(ColumnInfo::new(
                name,
                data_type,
                column_key.as_deref() == Some("PRI"),
            ));
        }
        Ok(columns)
    }

    async fn resolve_schema(&self, table_name: &str) -> Result<String> {
        if let Some(db) = &self.database_name {
            return Ok(db.clone());
        }

        let current: Option<String> = sqlx::query_scalar("SELECT CAST(DATABASE() AS CHAR)")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| TableFillError::Introspection {
                query: "current database".to_string(),
                source: e,
            })?;
        if let Some(db) = current.filter(|d| !d.is_empty()) {
            return Ok(db);
        }

        let inferred: Option<String> = sqlx::query_scalar(
            "SELECT CAST(TABLE_SCHEMA AS CHAR)
             FROM INFORMATION_SCHEMA.TABLES
             WHERE TABLE_NAME = ?
             LIMIT 1",
        )
        .bind(table_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| TableFillError::Introspection {
            query: "infer schema".to_string(),
            source: e,
        })?;

        inferred.ok_or_else(|| {
            TableFillError::Other(
                "No database resolved: set database in profile or request".to_string(),
            )
        })
    }
}
