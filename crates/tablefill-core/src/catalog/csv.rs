//! Import of custom value lists from CSV text.
//!
//! Only the first comma-separated cell of each line is used. The first line
//! is always treated as a header.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Result, TableFillError};
use crate::generate::value::Value;
use crate::schema::types::ValueKind;

/// Maximum number of values a single list may hold.
pub const MAX_LIST_VALUES: usize = 5000;

static HEADER_CELL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)^(value|values|name|header)$").ok());

fn is_header_cell(cell: &str) -> bool {
    HEADER_CELL.as_ref().is_some_and(|re| re.is_match(cell))
}

/// Parse CSV text into list values of the given kind.
pub fn parse_value_list_csv(text: &str, value_type: ValueKind) -> Result<Vec<Value>> {
    let mut values = Vec::new();

    for line in text.lines().skip(1) {
        if line.trim().is_empty() {
            continue;
        }
        let first = line.split(',').next().unwrap_or("").trim();
        if first.is_empty() {
            continue;
        }
        // A second header row is tolerated before any data
        if values.is_empty() && is_header_cell(first) {
            continue;
        }

        match value_type {
            ValueKind::Number => match parse_number(first) {
                Some(v) => values.push(v),
                None if values.is_empty() => continue,
                None => {
                    return Err(TableFillError::Csv {
                        message: format!("numeric list contains non-numeric value '{}'", first),
                    })
                }
            },
            ValueKind::String => values.push(Value::from(first.to_string())),
        }

        if values.len() > MAX_LIST_VALUES {
            return Err(TableFillError::Csv {
                message: format!("too many entries, at most {} are supported", MAX_LIST_VALUES),
            });
        }
    }

    if values.is_empty() {
        return Err(TableFillError::Csv {
            message: "no usable values found".to_string(),
        });
    }
    Ok(values)
}

fn parse_number(cell: &str) -> Option<Value> {
    if let Ok(i) = cell.parse::<i64>() {
        return Some(Value::Int(i));
    }
    cell.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(Value::Float)
}
