//! Typed access to loosely-typed SQL result cells
//!
//! The remote driver returns padded character columns, so every cell is
//! trimmed on the way out and each caller states which column it expects.

use afsctl_errors::{Error, InventoryError};
use afsctl_gateway::SqlRow;
use serde_json::Value;

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// A required character column; missing columns are a query/schema mismatch.
pub(crate) fn text(row: &SqlRow, query: &'static str, column: &'static str) -> Result<String, Error> {
    let value = row
        .get(column)
        .ok_or(InventoryError::MissingColumn { query, column })?;
    Ok(cell_text(value))
}

/// An optional character column; null, missing and blank all read as `None`.
pub(crate) fn opt_text(row: &SqlRow, column: &'static str) -> Option<String> {
    row.get(column)
        .map(cell_text)
        .filter(|text| !text.is_empty())
}

/// A numeric column, tolerating both number and padded-character renditions.
pub(crate) fn opt_number(row: &SqlRow, column: &'static str) -> Option<i64> {
    match row.get(column)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> SqlRow {
        match value {
            Value::Object(map) => map,
            _ => panic!("test rows are objects"),
        }
    }

    #[test]
    fn trims_padded_character_cells() {
        let row = row(json!({"AFS_NAME": "AFSDEMO   "}));
        assert_eq!(text(&row, "q", "AFS_NAME").unwrap(), "AFSDEMO");
    }

    #[test]
    fn missing_required_column_is_an_error() {
        let row = row(json!({}));
        assert!(text(&row, "q", "AFS_NAME").is_err());
    }

    #[test]
    fn optional_columns_treat_blank_as_absent() {
        let row = row(json!({"V_ACTIVE_JOB_STATUS": "   ", "IASP_NUMBER": "33"}));
        assert_eq!(opt_text(&row, "V_ACTIVE_JOB_STATUS"), None);
        assert_eq!(opt_number(&row, "IASP_NUMBER"), Some(33));
        assert_eq!(opt_number(&row, "MISSING"), None);
    }
}
