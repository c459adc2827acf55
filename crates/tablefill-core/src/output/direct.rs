//! # Direct Database Execution
//!
//! The seam between the insert driver and a live MySQL server. A run asks a
//! [`ConnectionFactory`] for one [`BatchExecutor`], sends every batch through
//! it in order and closes it when the run ends, whatever the outcome.
//!
//! Statements are executed as sent. There is no wrapping transaction:
//! batches that succeeded before a failure stay in the table.

use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlPool, MySqlPoolOptions};
use sqlx::{ConnectOptions, Connection};

use crate::error::{Result, TableFillError};
use crate::output::sql::truncate_sql;

/// Pool size for one insert run.
const MAX_CONNECTIONS: u32 = 10;

/// Length of the SQL excerpt carried by insert errors.
const SQL_PREVIEW_LEN: usize = 200;

/// Where to connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionTarget {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    /// Empty means no default schema.
    pub database: String,
}

impl ConnectionTarget {
    /// `mysql://` URL for logs and error messages, password masked.
    pub fn display_url(&self) -> String {
        let fallback = format!(
            "mysql://{}@{}:{}/{}",
            self.user, self.host, self.port, self.database
        );
        let Ok(mut url) = url::Url::parse(&format!("mysql://{}", self.host)) else {
            return fallback;
        };
        if url.set_username(&self.user).is_err() || url.set_port(Some(self.port)).is_err() {
            return fallback;
        }
        if !self.password.is_empty() {
            let _ = url.set_password(Some("****"));
        }
        url.set_path(&self.database);
        url.to_string()
    }

    fn connect_options(&self) -> MySqlConnectOptions {
        let options = MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password);
        if self.database.is_empty() {
            options
        } else {
            options.database(&self.database)
        }
    }
}

/// Opens executors for insert runs.
#[async_trait]
pub trait ConnectionFactory: Send + Sync {
    async fn connect(&self, target: &ConnectionTarget) -> Result<Box<dyn BatchExecutor>>;
}

/// Executes batch statements against one open target.
#[async_trait]
pub trait BatchExecutor: Send {
    /// Execute one batch. `first_row` is the zero-based index of the batch's
    /// first row and only feeds error context.
    async fn execute(&mut self, table: &str, first_row: usize, sql: &str) -> Result<()>;

    /// Release the connection. Must be called exactly once.
    async fn close(self: Box<Self>);
}

/// sqlx-backed factory: one pool per run.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlConnectionFactory;

#[async_trait]
impl ConnectionFactory for MySqlConnectionFactory {
    async fn connect(&self, target: &ConnectionTarget) -> Result<Box<dyn BatchExecutor>> {
        let pool = connect_pool(target).await?;
        Ok(Box::new(MySqlBatchExecutor { pool }))
    }
}

/// Open a pool for `target`, failing fast if no connection can be made.
pub async fn connect_pool(target: &ConnectionTarget) -> Result<MySqlPool> {
    MySqlPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect_with(target.connect_options())
        .await
        .map_err(|e| TableFillError::Connection {
            message: "Failed to connect to MySQL".to_string(),
            connection_hint: target.display_url(),
            source: e,
        })
}

struct MySqlBatchExecutor {
    pool: MySqlPool,
}

#[async_trait]
impl BatchExecutor for MySqlBatchExecutor {
    async fn execute(&mut self, table: &str, first_row: usize, sql: &str) -> Result<()> {
        sqlx::query(sql)
            .execute(&self.pool)
            .await
            .map_err(|e| TableFillError::InsertFailed {
                table: table.to_string(),
                row_index: first_row,
                sql_preview: truncate_sql(sql, SQL_PREVIEW_LEN),
                source: e,
            })?;
        Ok(())
    }

    async fn close(self: Box<Self>) {
        self.pool.close().await;
    }
}

/// Open a single connection to `target`, ping it and close it.
pub async fn ping(target: &ConnectionTarget) -> Result<()> {
    let connection_error = |e: sqlx::Error| TableFillError::Connection {
        message: "Connection test failed".to_string(),
        connection_hint: target.display_url(),
        source: e,
    };
    let mut conn: MySqlConnection = target
        .connect_options()
        .connect()
        .await
        .map_err(connection_error)?;
    let pinged = conn.ping().await.map_err(connection_error);
    let _ = conn.close().await;
    pinged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> ConnectionTarget {
        ConnectionTarget {
            host: "db.internal".to_string(),
            port: 3307,
            user: "root".to_string(),
            password: "secret123".to_string(),
            database: "shop".to_string(),
        }
    }

    #[test]
    fn test_display_url_hides_password() {
        let shown = target().display_url();
        assert!(!shown.contains("secret123"));
        assert!(shown.contains("****"));
        assert!(shown.contains("root"));
        assert!(shown.contains("db.internal:3307"));
        assert!(shown.ends_with("/shop"));
    }

    #[test]
    fn test_display_url_without_password() {
        let t = ConnectionTarget {
            password: String::new(),
            ..target()
        };
        let shown = t.display_url();
        assert!(!shown.contains("****"));
        assert!(shown.starts_with("mysql://root@db.internal:3307"));
    }

    #[test]
    fn test_display_url_encodes_odd_user() {
        let t = ConnectionTarget {
            user: "ad@min".to_string(),
            ..target()
        };
        let shown = t.display_url();
        assert!(shown.contains("ad%40min"));
        assert!(!shown.contains("secret123"));
    }
}
