//! # Configuration File Parser
//!
//! Reads and parses `tablefill.toml`, the optional file that holds the
//! catalog (database profiles, custom value lists, saved table profiles)
//! and run defaults. Supports:
//!
//! - `[generate]` — default row count, batch size, hub flush window, preview size
//! - `[[profiles]]` — MySQL connection profiles, at most one `active`
//! - `[[lists]]` — custom value lists, inline `values` or a `csv` file
//! - `[[tables]]` — saved generator assignments per table
//!
//! Example `tablefill.toml`:
//!
//! ```toml
//! [generate]
//! total_rows = 10000
//! batch_size = 500
//!
//! [[profiles]]
//! id = 1
//! name = "local"
//! host = "127.0.0.1"
//! username = "root"
//! password = "secret"
//! database = "shop"
//! active = true
//!
//! [[lists]]
//! id = 1
//! name = "cities"
//! value_type = "string"
//! values = ["Paris", "Oslo", "Lima"]
//!
//! [[lists]]
//! id = 2
//! name = "scores"
//! value_type = "number"
//! csv = "lists/scores.csv"
//!
//! [[tables]]
//! id = 1
//! profileName = "users-default"
//! tableName = "users"
//!
//! [[tables.fields]]
//! columnName = "city"
//! columnTypeKind = "string"
//! kind = "RandomIn"
//! type = "CustomList"
//! extraConfig = { listId = 1 }
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::catalog::csv::parse_value_list_csv;
use crate::catalog::{CustomValueList, DbProfile, ProfileSource, TableProfile, ValueListSource};
use crate::error::{Result, TableFillError};
use crate::generate::value::Value;
use crate::schema::types::ValueKind;
use crate::task::hub::DEFAULT_FLUSH_INTERVAL;

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = "tablefill.toml";

/// Top-level tablefill.toml structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TableFillConfig {
    pub generate: GenerateConfig,
    pub profiles: Vec<DbProfile>,
    pub lists: Vec<ListConfig>,
    pub tables: Vec<TableProfile>,

    /// Absolute path to the directory containing tablefill.toml.
    ///
    /// Populated by `read_config()` so that relative `csv` paths resolve
    /// against the config file's location, not the CWD.
    #[serde(skip)]
    pub config_dir: Option<PathBuf>,
}

/// Run defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GenerateConfig {
    pub total_rows: Option<i64>,
    pub batch_size: Option<i64>,
    /// Push hub coalescing window in milliseconds.
    pub flush_interval_ms: Option<u64>,
    /// Statements returned by `preview`.
    pub preview_statements: Option<usize>,
}

impl GenerateConfig {
    pub fn flush_interval(&self) -> Duration {
        self.flush_interval_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_FLUSH_INTERVAL)
    }
}

/// A custom value list as written in the config file.
#[derive(Debug, Clone, Deserialize)]
pub struct ListConfig {
    pub id: i64,
    pub name: String,
    pub value_type: ValueKind,
    #[serde(default)]
    pub values: Option<Vec<Value>>,
    /// CSV file, relative to the config directory.
    #[serde(default)]
    pub csv: Option<PathBuf>,
}

/// Read and parse a tablefill.toml file from the given directory.
///
/// Returns `None` if the file doesn't exist (config is optional).
/// Returns an error if the file exists but can't be parsed or fails
/// validation.
pub fn read_config(dir: &Path) -> Result<Option<TableFillConfig>> {
    let path = dir.join(CONFIG_FILE_NAME);
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(&path).map_err(|e| TableFillError::Config {
        message: format!("Failed to read {}: {}", path.display(), e),
    })?;

    let mut config: TableFillConfig =
        toml::from_str(&content).map_err(|e| TableFillError::Config {
            message: format!("Failed to parse {}: {}", path.display(), e),
        })?;

    config.config_dir = Some(std::fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf()));
    config.validate()?;

    Ok(Some(config))
}

fn config_error(message: String) -> TableFillError {
    TableFillError::Config { message }
}

fn check_unique<'a>(kind: &str, ids: impl Iterator<Item = &'a i64>) -> Result<()> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(*id) {
            return Err(config_error(format!("Duplicate {} id {}", kind, id)));
        }
    }
    Ok(())
}

impl TableFillConfig {
    /// Validate semantic constraints that serde cannot enforce.
    pub fn validate(&self) -> Result<()> {
        check_unique("profile", self.profiles.iter().map(|p| &p.id))?;
        check_unique("list", self.lists.iter().map(|l| &l.id))?;
        check_unique("table profile", self.tables.iter().map(|t| &t.id))?;

        let active: Vec<&str> = self
            .profiles
            .iter()
            .filter(|p| p.active)
            .map(|p| p.name.as_str())
            .collect();
        if active.len() > 1 {
            return Err(config_error(format!(
                "More than one active profile: {}",
                active.join(", ")
            )));
        }

        for list in &self.lists {
            match (&list.values, &list.csv) {
                (Some(_), Some(_)) => {
                    return Err(config_error(format!(
                        "List '{}': set either values or csv, not both",
                        list.name
                    )))
                }
                (None, None) => {
                    return Err(config_error(format!(
                        "List '{}': one of values or csv is required",
                        list.name
                    )))
                }
                (Some(values), None) => validate_inline_values(list, values)?,
                (None, Some(_)) => {}
            }
        }

        for table in &self.tables {
            if let Some(id) = table.db_profile_id {
                if !self.profiles.iter().any(|p| p.id == id) {
                    tracing::warn!(
                        "Table profile '{}' references unknown database profile {}",
                        table.profile_name,
                        id
                    );
                }
            }
        }
        Ok(())
    }

    /// Materialize every configured list, reading CSV files relative to
    /// `config_dir`.
    pub fn value_lists(&self) -> Result<Vec<CustomValueList>> {
        let base = self.config_dir.clone().unwrap_or_default();
        self.lists
            .iter()
            .map(|list| {
                let values = match (&list.values, &list.csv) {
                    (Some(values), _) => values.clone(),
                    (None, Some(csv)) => {
                        let path = base.join(csv);
                        let text = std::fs::read_to_string(&path).map_err(|e| {
                            config_error(format!(
                                "List '{}': failed to read {}: {}",
                                list.name,
                                path.display(),
                                e
                            ))
                        })?;
                        parse_value_list_csv(&text, list.value_type)?
                    }
                    (None, None) => Vec::new(),
                };
                Ok(CustomValueList::new(
                    list.id,
                    list.name.clone(),
                    list.value_type,
                    values,
                ))
            })
            .collect()
    }
}

fn validate_inline_values(list: &ListConfig, values: &[Value]) -> Result<()> {
    if values.is_empty() {
        return Err(config_error(format!("List '{}' has no values", list.name)));
    }
    let mismatch = values.iter().find(|v| match list.value_type {
        ValueKind::Number => !v.is_number(),
        ValueKind::String => !matches!(v, Value::String(_)),
    });
    if let Some(v) = mismatch {
        return Err(config_error(format!(
            "List '{}' is a {} list but contains '{}'",
            list.name, list.value_type, v
        )));
    }
    Ok(())
}

/// In-memory catalog backed by a loaded config.
#[derive(Debug, Clone, Default)]
pub struct ConfigCatalog {
    profiles: Vec<DbProfile>,
    lists: Vec<CustomValueList>,
    tables: Vec<TableProfile>,
}

impl ConfigCatalog {
    pub fn from_config(config: &TableFillConfig) -> Result<Self> {
        Ok(Self {
            profiles: config.profiles.clone(),
            lists: config.value_lists()?,
            tables: config.tables.clone(),
        })
    }

    /// Make the profile named or numbered by `selector` the only active one.
    pub fn select_profile(&mut self, selector: &str) -> Result<()> {
        let id = find_profile(&self.profiles, selector)
            .map(|p| p.id)
            .ok_or_else(|| config_error(format!("Unknown database profile '{}'", selector)))?;
        for profile in &mut self.profiles {
            profile.active = profile.id == id;
        }
        Ok(())
    }

    pub fn profiles(&self) -> &[DbProfile] {
        &self.profiles
    }

    /// Configured lists, optionally only those of one value type.
    pub fn lists(&self, value_type: Option<ValueKind>) -> Vec<&CustomValueList> {
        self.lists
            .iter()
            .filter(|l| value_type.is_none_or(|t| l.value_type == t))
            .collect()
    }

    /// Table profile by id or profile name.
    pub fn table_profile(&self, selector: &str) -> Option<&TableProfile> {
        match selector.parse::<i64>() {
            Ok(id) => self.tables.iter().find(|t| t.id == id),
            Err(_) => self.tables.iter().find(|t| t.profile_name == selector),
        }
    }
}

fn find_profile<'a>(profiles: &'a [DbProfile], selector: &str) -> Option<&'a DbProfile> {
    match selector.parse::<i64>() {
        Ok(id) => profiles.iter().find(|p| p.id == id),
        Err(_) => profiles.iter().find(|p| p.name == selector),
    }
}

#[async_trait]
impl ProfileSource for ConfigCatalog {
    async fn active_profile(&self) -> Result<Option<DbProfile>> {
        Ok(self.profiles.iter().find(|p| p.active).cloned())
    }

    async fn profile_by_id(&self, id: i64) -> Result<Option<DbProfile>> {
        Ok(self.profiles.iter().find(|p| p.id == id).cloned())
    }
}

#[async_trait]
impl ValueListSource for ConfigCatalog {
    async fn find_lists(&self, ids: &[i64]) -> Result<Vec<CustomValueList>> {
        Ok(self
            .lists
            .iter()
            .filter(|l| ids.contains(&l.id))
            .cloned()
            .collect())
    }
}
