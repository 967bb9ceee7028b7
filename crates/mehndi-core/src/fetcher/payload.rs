//! Decoding of spreadsheet responses into raw rows.
//!
//! Two shapes are accepted: an array of flat objects, and a sheet range
//! `{"values": [[header...], [cell...]]}` whose first row names the columns.

use crate::errors::FetchError;
use crate::normalizer::RawRow;
use serde_json::Value;

pub fn rows_from_value(value: Value) -> Result<Vec<RawRow>, FetchError> {
    match value {
        Value::Array(items) => Ok(items
            .into_iter()
            .map(|item| match item {
                Value::Object(map) => map,
                // Left empty so the normalizer rejects and counts it.
                _ => RawRow::new(),
            })
            .collect()),
        Value::Object(mut range) => match range.remove("values") {
            Some(Value::Array(grid)) => rows_from_grid(grid),
            Some(other) => Err(FetchError::Payload(format!(
                "'values' must be an array, got {}",
                type_name(&other)
            ))),
            None => Err(FetchError::Payload(
                "expected an array of rows or a 'values' range".to_string(),
            )),
        },
        other => Err(FetchError::Payload(format!(
            "expected an array of rows or a 'values' range, got {}",
            type_name(&other)
        ))),
    }
}

fn rows_from_grid(grid: Vec<Value>) -> Result<Vec<RawRow>, FetchError> {
    let mut lines = grid.into_iter();
    let header: Vec<String> = match lines.next() {
        None => return Ok(Vec::new()),
        Some(Value::Array(cells)) => cells.iter().map(header_text).collect(),
        Some(other) => {
            return Err(FetchError::Payload(format!(
                "header row must be an array, got {}",
                type_name(&other)
            )))
        }
    };

    Ok(lines
        .map(|line| {
            let cells = match line {
                Value::Array(cells) => cells,
                _ => Vec::new(),
            };
            header
                .iter()
                .enumerate()
                .filter(|(_, name)| !name.is_empty())
                .map(|(column, name)| {
                    let value = cells
                        .get(column)
                        .cloned()
                        .unwrap_or_else(|| Value::String(String::new()));
                    (name.clone(), value)
                })
                .collect()
        })
        .collect())
}

fn header_text(cell: &Value) -> String {
    match cell {
        Value::String(s) => s.trim().to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_array_of_objects() {
        let rows = rows_from_value(json!([
            {"category": "bridal", "image_url": "a.jpg"},
            "garbage",
            {"category": "party", "image_url": "b.jpg"}
        ]))
        .unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0]["category"], "bridal");
        assert!(rows[1].is_empty());
        assert_eq!(rows[2]["image_url"], "b.jpg");
    }

    #[test]
    fn test_values_range_pads_short_rows() {
        let rows = rows_from_value(json!({
            "range": "Gallery!A1:D3",
            "majorDimension": "ROWS",
            "values": [
                ["id", "category", "image_url", "alt_text"],
                ["1", "bridal", "a.jpg", "Bridal hands"],
                ["2", "arabic", "b.jpg"]
            ]
        }))
        .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["alt_text"], "Bridal hands");
        assert_eq!(rows[1]["category"], "arabic");
        assert_eq!(rows[1]["alt_text"], "");
    }

    #[test]
    fn test_empty_values_range() {
        assert!(rows_from_value(json!({"values": []})).unwrap().is_empty());
        assert!(rows_from_value(json!({"values": [["id", "image_url"]]}))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_unrecognized_shapes_are_payload_errors() {
        assert!(matches!(
            rows_from_value(json!({"rows": []})),
            Err(FetchError::Payload(_))
        ));
        assert!(matches!(
            rows_from_value(json!("nope")),
            Err(FetchError::Payload(_))
        ));
        assert!(matches!(
            rows_from_value(json!({"values": [["id"], "bad"], "x": 1}))
                .map(|rows| rows.len()),
            Ok(1)
        ));
        assert!(matches!(
            rows_from_value(json!({"values": ["header"]})),
            Err(FetchError::Payload(_))
        ));
    }
}
