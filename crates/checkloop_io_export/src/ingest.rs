//! Record ingestion from JSON text, Polars dataframes and Arrow IPC bytes.

use std::io::Cursor;

use polars::prelude::{AnyValue, DataFrame, IpcReader, SerReader};
use serde_json::Value;

use crate::spec::{EnumCellValue, ExportError, SpecRecord};
use crate::util::validate_unique_columns;

////////////////////////////////////////////////////////////////////////////////
// #region Json

/// Parse a JSON array of objects into records.
///
/// Object key order is preserved. Nested arrays/objects become their compact
/// JSON text.
pub fn records_from_json_str(payload: &str) -> Result<Vec<SpecRecord>, ExportError> {
    let value: Value = serde_json::from_str(payload)
        .map_err(|e| ExportError::InvalidInput(format!("Failed to parse JSON records: {e}")))?;
    match value {
        Value::Array(l_values) => records_from_json_values(&l_values),
        other => Err(ExportError::InvalidInput(format!(
            "Expected a JSON array of objects, got {}.",
            derive_json_kind(&other)
        ))),
    }
}

/// Convert already-parsed JSON values (one object per record) into records.
pub fn records_from_json_values(values: &[Value]) -> Result<Vec<SpecRecord>, ExportError> {
    values
        .iter()
        .enumerate()
        .map(|(n_idx, value)| derive_record_from_json(n_idx, value))
        .collect()
}

fn derive_record_from_json(n_idx: usize, value: &Value) -> Result<SpecRecord, ExportError> {
    let Value::Object(dict_fields) = value else {
        return Err(ExportError::InvalidInput(format!(
            "Record {n_idx} must be a JSON object, got {}.",
            derive_json_kind(value)
        )));
    };
    Ok(dict_fields
        .iter()
        .map(|(key, val)| (key.as_str(), derive_cell_value_from_json(val)))
        .collect())
}

fn derive_cell_value_from_json(value: &Value) -> EnumCellValue {
    match value {
        Value::Null => EnumCellValue::None,
        Value::Bool(val) => EnumCellValue::Boolean(*val),
        Value::Number(val) => val
            .as_f64()
            .map_or_else(|| EnumCellValue::String(val.to_string()), EnumCellValue::Number),
        Value::String(val) => EnumCellValue::String(val.clone()),
        Value::Array(_) | Value::Object(_) => EnumCellValue::String(value.to_string()),
    }
}

fn derive_json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region DataFrame

/// Convert each dataframe row into one record keyed by column name.
pub fn records_from_dataframe(df: &DataFrame) -> Result<Vec<SpecRecord>, ExportError> {
    let l_colnames: Vec<String> = df
        .get_column_names_str()
        .into_iter()
        .map(ToString::to_string)
        .collect();
    validate_unique_columns(&l_colnames)?;

    let l_cols = df.get_columns();
    let mut l_records = Vec::with_capacity(df.height());
    for n_idx_row in 0..df.height() {
        let mut record = SpecRecord::new();
        for (c_name, col) in l_colnames.iter().zip(l_cols) {
            let value = col.get(n_idx_row).map_err(|e| {
                ExportError::InvalidInput(format!("Failed to access cell value: {e}"))
            })?;
            record.insert(c_name.as_str(), derive_cell_value_from_any_value(value));
        }
        l_records.push(record);
    }
    Ok(l_records)
}

/// Decode Arrow IPC bytes (as produced by `polars.DataFrame.write_ipc`) into records.
pub fn records_from_ipc_bytes(v_ipc_df: &[u8]) -> Result<Vec<SpecRecord>, ExportError> {
    let df = derive_dataframe_from_ipc_bytes(v_ipc_df)?;
    records_from_dataframe(&df)
}

fn derive_dataframe_from_ipc_bytes(v_ipc_df: &[u8]) -> Result<DataFrame, ExportError> {
    IpcReader::new(Cursor::new(v_ipc_df))
        .finish()
        .map_err(|e| ExportError::InvalidInput(format!("Failed to read IPC DataFrame bytes: {e}")))
}

fn derive_cell_value_from_any_value(value: AnyValue<'_>) -> EnumCellValue {
    match value {
        AnyValue::Null => EnumCellValue::None,
        AnyValue::Boolean(val) => EnumCellValue::Boolean(val),
        AnyValue::String(val) => EnumCellValue::String(val.to_string()),
        AnyValue::StringOwned(val) => EnumCellValue::String(val.to_string()),
        AnyValue::UInt8(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt16(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt32(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt64(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int8(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int16(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int32(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int64(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int128(val) => EnumCellValue::Number(val as f64),
        AnyValue::Float32(val) => EnumCellValue::Number(val as f64),
        AnyValue::Float64(val) => EnumCellValue::Number(val),
        _ => EnumCellValue::String(value.to_string()),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use polars::df;
    use polars::prelude::{IpcWriter, SerWriter};

    use super::*;

    #[test]
    fn test_records_from_json_preserves_key_order_and_types() -> Result<(), ExportError> {
        let records = records_from_json_str(
            r#"[
                {"name": "Alice", "dept": "A&E", "grade": 5, "active": true, "notes": null},
                {"name": "Bob", "tags": ["night", "icu"]}
            ]"#,
        )?;

        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0].keys().collect::<Vec<_>>(),
            vec!["name", "dept", "grade", "active", "notes"]
        );
        assert_eq!(records[0].get("grade"), Some(&EnumCellValue::Number(5.0)));
        assert_eq!(records[0].get("active"), Some(&EnumCellValue::Boolean(true)));
        assert_eq!(records[0].get("notes"), Some(&EnumCellValue::None));
        assert_eq!(
            records[1].get("tags"),
            Some(&EnumCellValue::from(r#"["night","icu"]"#))
        );
        Ok(())
    }

    #[test]
    fn test_records_from_json_rejects_non_arrays() {
        assert!(matches!(
            records_from_json_str(r#"{"name": "Alice"}"#),
            Err(ExportError::InvalidInput(msg)) if msg.contains("an object")
        ));
        assert!(matches!(
            records_from_json_str(r#"[{"a": 1}, 2]"#),
            Err(ExportError::InvalidInput(msg)) if msg.starts_with("Record 1")
        ));
        assert!(matches!(
            records_from_json_str("not json"),
            Err(ExportError::InvalidInput(_))
        ));
        assert_eq!(records_from_json_str("[]").ok(), Some(vec![]));
    }

    #[test]
    fn test_records_from_dataframe() -> Result<(), Box<dyn std::error::Error>> {
        let df = df!(
            "postcode" => &[Some("007700"), None],
            "count" => &[3i64, 4],
            "active" => &[true, false]
        )?;
        let records = records_from_dataframe(&df)?;

        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0].keys().collect::<Vec<_>>(),
            vec!["postcode", "count", "active"]
        );
        assert_eq!(records[0].get("postcode"), Some(&EnumCellValue::from("007700")));
        assert_eq!(records[1].get("postcode"), Some(&EnumCellValue::None));
        assert_eq!(records[1].get("count"), Some(&EnumCellValue::Number(4.0)));
        assert_eq!(records[1].get("active"), Some(&EnumCellValue::Boolean(false)));
        Ok(())
    }

    #[test]
    fn test_records_from_ipc_bytes() -> Result<(), Box<dyn std::error::Error>> {
        let mut df = df!(
            "name" => &["Alice", "Bob"],
            "score" => &[1.5f64, 2.0]
        )?;
        let mut v_bytes: Vec<u8> = Vec::new();
        IpcWriter::new(&mut v_bytes).finish(&mut df)?;

        let records = records_from_ipc_bytes(&v_bytes)?;
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].get("name"), Some(&EnumCellValue::from("Bob")));
        assert_eq!(records[0].get("score"), Some(&EnumCellValue::Number(1.5)));

        assert!(matches!(
            records_from_ipc_bytes(b"garbage"),
            Err(ExportError::InvalidInput(_))
        ));
        Ok(())
    }
}
