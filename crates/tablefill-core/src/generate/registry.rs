//! # Generator Registry
//!
//! Catalog mapping `(value kind, generator kind, generator type)` to a value
//! producing function. The catalog is built once; lookups are exact matches
//! and the first registered entry for a triple wins.
//!
//! `CustomList` is not a registry entry: `SequenceIn`/`RandomIn` with that
//! type draw from the `listValues` the enricher inlined into the field's
//! extra config.

use std::sync::LazyLock;

use rand::Rng;

use crate::error::{Result, TableFillError};
use crate::generate::field::{ExtraConfig, GeneratorKind, CUSTOM_LIST_TYPE};
use crate::generate::ids;
use crate::generate::value::Value;
use crate::schema::types::{ColumnInfo, ValueKind};

pub const BUILTIN_PERSONS: &[&str] = &["zhangsan", "lisi", "wangwu", "zhaoliu"];
pub const BUILTIN_DEPARTMENTS: &[&str] = &["dept_1", "dept_2", "dept_3", "dept_4", "dept_5"];
pub const BUILTIN_NUM_IDS: &[i64] = &[101, 202, 303, 404, 505, 606];

/// What a generator sees for one cell.
pub struct GenContext<'a> {
    /// Absolute row position across the whole run.
    pub row_index: usize,
    pub column: &'a ColumnInfo,
}

pub type GeneratorFn = fn(&GenContext<'_>) -> Value;

/// One catalog entry.
#[derive(Clone)]
pub struct GeneratorEntry {
    pub column_kind: ValueKind,
    pub kind: GeneratorKind,
    pub generator_type: &'static str,
    pub generate: GeneratorFn,
    /// The column should be left to the database (omitted for primary keys,
    /// sent as `NULL` otherwise).
    pub skip_insert: bool,
}

impl GeneratorEntry {
    pub fn new(
        column_kind: ValueKind,
        kind: GeneratorKind,
        generator_type: &'static str,
        generate: GeneratorFn,
    ) -> Self {
        Self {
            column_kind,
            kind,
            generator_type,
            generate,
            skip_insert: false,
        }
    }

    pub fn skipping_insert(mut self) -> Self {
        self.skip_insert = true;
        self
    }
}

/// A generated cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Generated {
    pub value: Value,
    pub skip_insert: bool,
}

#[derive(Clone, Default)]
pub struct GeneratorRegistry {
    entries: Vec<GeneratorEntry>,
}

static BUILTIN: LazyLock<GeneratorRegistry> = LazyLock::new(GeneratorRegistry::with_builtins);

impl GeneratorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared built-in catalog.
    pub fn builtin() -> &'static GeneratorRegistry {
        &BUILTIN
    }

    pub fn register(&mut self, entry: GeneratorEntry) {
        self.entries.push(entry);
    }

    pub fn find(
        &self,
        column_kind: ValueKind,
        kind: GeneratorKind,
        generator_type: &str,
    ) -> Option<&GeneratorEntry> {
        self.entries.iter().find(|e| {
            e.column_kind == column_kind && e.kind == kind && e.generator_type == generator_type
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Produce the value for one cell.
    pub fn generate(
        &self,
        column_kind: ValueKind,
        kind: GeneratorKind,
        generator_type: &str,
        row_index: usize,
        column: &ColumnInfo,
        extra_config: &ExtraConfig,
    ) -> Result<Generated> {
        if kind.picks_from_list() && generator_type == CUSTOM_LIST_TYPE {
            let values = &extra_config.list_values;
            let value = if kind == GeneratorKind::SequenceIn {
                pick_sequential(values, row_index)
            } else {
                pick_random(values)
            }
            .ok_or_else(|| TableFillError::EmptyList {
                list: CUSTOM_LIST_TYPE.to_string(),
            })?;
            return Ok(Generated {
                value: value.clone(),
                skip_insert: false,
            });
        }

        let entry = self.find(column_kind, kind, generator_type).ok_or_else(|| {
            TableFillError::GeneratorNotFound {
                column_kind: column_kind.to_string(),
                kind: kind.to_string(),
                generator_type: generator_type.to_string(),
            }
        })?;

        let ctx = GenContext { row_index, column };
        Ok(Generated {
            value: (entry.generate)(&ctx),
            skip_insert: entry.skip_insert,
        })
    }

    fn with_builtins() -> Self {
        use GeneratorKind::*;
        use ValueKind::{Number, String as Str};

        let mut r = Self::new();

        // String generators
        r.register(GeneratorEntry::new(Str, IdGenerator, "ULID", |_| {
            Value::from(ids::ulid())
        }));
        r.register(GeneratorEntry::new(Str, IdGenerator, "UUID", |_| {
            Value::from(uuid::Uuid::new_v4().to_string())
        }));
        r.register(GeneratorEntry::new(Str, IdGenerator, "SnowflakeId", |_| {
            Value::from(ids::snowflake_id().to_string())
        }));
        r.register(GeneratorEntry::new(Str, SequenceIn, "BuiltinPersonList", |ctx| {
            static_str(pick_sequential(BUILTIN_PERSONS, ctx.row_index))
        }));
        r.register(GeneratorEntry::new(Str, SequenceIn, "BuiltinDepartmentList", |ctx| {
            static_str(pick_sequential(BUILTIN_DEPARTMENTS, ctx.row_index))
        }));
        r.register(GeneratorEntry::new(Str, RandomIn, "BuiltinPersonList", |_| {
            static_str(pick_random(BUILTIN_PERSONS))
        }));
        r.register(GeneratorEntry::new(Str, RandomIn, "BuiltinDepartmentList", |_| {
            static_str(pick_random(BUILTIN_DEPARTMENTS))
        }));
        r.register(
            GeneratorEntry::new(Str, Default, "DbDefault", |_| Value::Null).skipping_insert(),
        );
        r.register(GeneratorEntry::new(Str, Default, "Null", |_| Value::Null));

        // Number generators
        r.register(
            GeneratorEntry::new(Number, IdGenerator, "AutoIncrement", |_| Value::Null)
                .skipping_insert(),
        );
        r.register(GeneratorEntry::new(Number, IdGenerator, "SnowflakeId", |_| {
            Value::Int(ids::snowflake_id())
        }));
        r.register(GeneratorEntry::new(Number, SequenceIn, "BuiltinNumIdList", |ctx| {
            static_int(pick_sequential(BUILTIN_NUM_IDS, ctx.row_index))
        }));
        r.register(GeneratorEntry::new(Number, RandomIn, "BuiltinNumIdList", |_| {
            static_int(pick_random(BUILTIN_NUM_IDS))
        }));
        r.register(GeneratorEntry::new(Number, TimeGenerator, "TimestampSeconds", |_| {
            Value::Int(chrono::Utc::now().timestamp())
        }));
        r.register(GeneratorEntry::new(Number, TimeGenerator, "TimestampMillis", |_| {
            Value::Int(ids::epoch_millis())
        }));
        r.register(
            GeneratorEntry::new(Number, Default, "DbDefault", |_| Value::Null).skipping_insert(),
        );
        r.register(GeneratorEntry::new(Number, Default, "Null", |_| Value::Null));
        r.register(GeneratorEntry::new(Number, Default, "const_0", |_| Value::Int(0)));
        r.register(GeneratorEntry::new(Number, Default, "const_1", |_| Value::Int(1)));

        r
    }
}

fn pick_sequential<T>(list: &[T], index: usize) -> Option<&T> {
    if list.is_empty() {
        return None;
    }
    list.get(index % list.len())
}

fn pick_random<T>(list: &[T]) -> Option<&T> {
    if list.is_empty() {
        return None;
    }
    list.get(rand::rng().random_range(0..list.len()))
}

// The built-in lists are non-empty constants.
fn static_str(picked: Option<&&'static str>) -> Value {
    picked.map_or(Value::Null, |s| Value::from(*s))
}

fn static_int(picked: Option<&i64>) -> Value {
    picked.map_or(Value::Null, |i| Value::Int(*i))
}
