pub mod columns;
pub mod insert;
pub mod lists;
pub mod ping;
pub mod preview;

use std::sync::Arc;

use anyhow::{bail, Context, Result};

use tablefill_core::catalog::{apply_saved_profile, compute_completion, DbProfile, ProfileSource};
use tablefill_core::config::{read_config, ConfigCatalog, TableFillConfig};
use tablefill_core::output::direct::{connect_pool, MySqlConnectionFactory};
use tablefill_core::schema::mysql::MySqlIntrospector;
use tablefill_core::task::hub::BroadcastHub;
use tablefill_core::{ColumnInfo, GenerationInput, InsertDriver};

use crate::args::{Cli, JobArgs};

/// Fallbacks when neither the command line nor tablefill.toml give counts.
const DEFAULT_TOTAL_ROWS: i64 = 1000;
const DEFAULT_BATCH_SIZE: i64 = 500;

/// Loaded configuration plus the catalog built from it.
pub struct Workspace {
    pub config: TableFillConfig,
    pub catalog: Arc<ConfigCatalog>,
}

impl Workspace {
    pub fn load(cli: &Cli) -> Result<Self> {
        let config = read_config(&cli.config)?.unwrap_or_default();
        let mut catalog = ConfigCatalog::from_config(&config)?;
        if let Some(selector) = &cli.profile {
            catalog.select_profile(selector)?;
        }
        Ok(Self {
            config,
            catalog: Arc::new(catalog),
        })
    }

    pub async fn profile(&self, id: Option<i64>) -> Result<DbProfile> {
        match id {
            Some(id) => self
                .catalog
                .profile_by_id(id)
                .await?
                .with_context(|| format!("Database profile {} not found", id)),
            None => self
                .catalog
                .active_profile()
                .await?
                .context(
                    "No active database profile: mark one `active = true` in tablefill.toml \
                     or pass --profile",
                ),
        }
    }

    pub fn driver(&self) -> InsertDriver {
        let mut driver = InsertDriver::new(
            self.catalog.clone(),
            self.catalog.clone(),
            Arc::new(MySqlConnectionFactory),
        )
        .with_hub(BroadcastHub::new(self.config.generate.flush_interval()));
        if let Some(max) = self.config.generate.preview_statements {
            driver = driver.with_preview_statements(max);
        }
        driver
    }

    /// Introspect `table` through `profile`.
    pub async fn fetch_columns(
        &self,
        profile: &DbProfile,
        database: Option<&str>,
        table: &str,
    ) -> Result<Vec<ColumnInfo>> {
        let target = profile.target(database);
        let pool = connect_pool(&target).await?;
        let introspector =
            MySqlIntrospector::new(pool.clone(), Some(target.database.clone()));
        let columns = introspector.fetch_columns(table).await;
        pool.close().await;
        Ok(columns?)
    }

    /// Assemble the generation request for `preview`/`insert`.
    pub async fn build_input(&self, args: &JobArgs) -> Result<GenerationInput> {
        let mut input = if let Some(path) = &args.input {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str::<GenerationInput>(&text)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        } else if let Some(selector) = &args.table_profile {
            let saved = self
                .catalog
                .table_profile(selector)
                .with_context(|| format!("Table profile '{}' not found", selector))?;
            let profile = self.profile(saved.db_profile_id).await?;
            let columns = self
                .fetch_columns(&profile, args.database.as_deref(), &saved.table_name)
                .await?;
            let field_configs = apply_saved_profile(saved, &columns);
            if !compute_completion(&columns, &field_configs) {
                tracing::warn!(
                    "Table profile '{}' does not configure every column of {}",
                    saved.profile_name,
                    saved.table_name
                );
            }
            GenerationInput {
                table_name: saved.table_name.clone(),
                total_rows: self.config.generate.total_rows.unwrap_or(DEFAULT_TOTAL_ROWS),
                batch_size: self.config.generate.batch_size.unwrap_or(DEFAULT_BATCH_SIZE),
                columns,
                field_configs,
                db_profile_id: saved.db_profile_id,
                database: None,
            }
        } else {
            bail!("Pass --input <job.json> or --table-profile <id|name>");
        };

        if let Some(rows) = args.rows {
            input.total_rows = rows;
        }
        if let Some(batch_size) = args.batch_size {
            input.batch_size = batch_size;
        }
        if args.database.is_some() {
            input.database = args.database.clone();
        }
        Ok(input)
    }
}
