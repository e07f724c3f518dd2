//! Result shaping
//!
//! Applies a descriptor's [`RowShape`] to the raw rows the driver returned,
//! producing the structure its response callback was declared against.

use std::collections::HashMap;

use volley_core::{QueryResult, Result, Value, VolleyError};

use crate::queue::{QueryOptions, QueuedQuery, RowShape, ShapedResult};

/// Shape a raw result according to the descriptor's declared mode.
pub(crate) fn shape_result(query: &QueuedQuery, result: QueryResult) -> Result<ShapedResult> {
    match query.shape {
        RowShape::FirstRow => Ok(ShapedResult::FirstRow(first_row(&result))),
        RowShape::Column => column(result, &query.options).map(ShapedResult::Column),
        RowShape::KeyedRows => {
            // The enqueue method requires the key field, so a missing one can
            // only mean a descriptor was built by hand incorrectly.
            let key_field = query.key_field.as_deref().ok_or_else(|| {
                VolleyError::Usage("keyed-rows query queued without a key field".into())
            })?;
            keyed_rows(&result, key_field).map(ShapedResult::KeyedRows)
        }
        RowShape::Rows => Ok(ShapedResult::Rows(rows(result))),
    }
}

fn first_row(result: &QueryResult) -> Option<HashMap<String, Value>> {
    result.rows.first().map(|row| row.to_map())
}

fn column(result: QueryResult, options: &QueryOptions) -> Result<Vec<Value>> {
    match &options.columns {
        None => Ok(result
            .rows
            .into_iter()
            .flat_map(|row| row.values)
            .collect()),
        Some(indices) => {
            let width = result.column_count();
            if let Some(&bad) = indices.iter().find(|&&idx| idx >= width) {
                return Err(VolleyError::Usage(format!(
                    "column index {} out of range for a {}-column result",
                    bad, width
                )));
            }
            Ok(result
                .rows
                .iter()
                .flat_map(|row| indices.iter().map(|&idx| row.values[idx].clone()))
                .collect())
        }
    }
}

fn keyed_rows(
    result: &QueryResult,
    key_field: &str,
) -> Result<HashMap<String, HashMap<String, Value>>> {
    if !result.columns.iter().any(|c| c.name == key_field) {
        return Err(VolleyError::Usage(format!(
            "key field '{}' is not a column of the result set",
            key_field
        )));
    }

    let mut keyed = HashMap::with_capacity(result.rows.len());
    for row in &result.rows {
        let key = row
            .get_by_name(key_field)
            .map(|v| v.to_string())
            .unwrap_or_default();
        keyed.insert(key, row.to_map());
    }
    Ok(keyed)
}

fn rows(result: QueryResult) -> Vec<Vec<Value>> {
    result.rows.into_iter().map(|row| row.values).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use volley_core::{ColumnMeta, Row};

    fn sample_result() -> QueryResult {
        let names = vec!["id".to_string(), "name".to_string()];
        let columns = names
            .iter()
            .enumerate()
            .map(|(ordinal, name)| ColumnMeta {
                name: name.clone(),
                data_type: "DYNAMIC".into(),
                ordinal,
            })
            .collect();
        let rows = vec![
            Row::new(
                names.clone(),
                vec![Value::Int64(1), Value::String("foobar".into())],
            ),
            Row::new(
                names.clone(),
                vec![Value::Int64(2), Value::String("baz".into())],
            ),
        ];
        QueryResult::new(columns, rows)
    }

    #[test]
    fn test_first_row_takes_first_match() {
        let shaped = first_row(&sample_result()).expect("row");
        assert_eq!(shaped.get("id"), Some(&Value::Int64(1)));
        assert_eq!(shaped.get("name"), Some(&Value::String("foobar".into())));
    }

    #[test]
    fn test_first_row_empty_result_is_none() {
        assert!(first_row(&QueryResult::empty()).is_none());
    }

    #[test]
    fn test_column_default_flattens_row_major() {
        let values = column(sample_result(), &QueryOptions::new()).expect("column");
        assert_eq!(
            values,
            vec![
                Value::Int64(1),
                Value::String("foobar".into()),
                Value::Int64(2),
                Value::String("baz".into()),
            ]
        );
    }

    #[test]
    fn test_column_index_hint_restricts() {
        let options = QueryOptions::new().with_columns(vec![0]);
        let values = column(sample_result(), &options).expect("column");
        assert_eq!(values, vec![Value::Int64(1), Value::Int64(2)]);
    }

    #[test]
    fn test_column_index_out_of_range() {
        let options = QueryOptions::new().with_columns(vec![5]);
        let err = column(sample_result(), &options).expect_err("out of range");
        assert!(matches!(err, VolleyError::Usage(_)));
    }

    #[test]
    fn test_keyed_rows_by_rendered_key() {
        let keyed = keyed_rows(&sample_result(), "id").expect("keyed");
        assert_eq!(keyed.len(), 2);
        assert_eq!(
            keyed["1"].get("name"),
            Some(&Value::String("foobar".into()))
        );
        assert_eq!(keyed["2"].get("name"), Some(&Value::String("baz".into())));
    }

    #[test]
    fn test_keyed_rows_unknown_key_field() {
        let err = keyed_rows(&sample_result(), "nope").expect_err("unknown key");
        assert!(matches!(err, VolleyError::Usage(_)));
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_rows_preserves_row_lists() {
        let shaped = rows(sample_result());
        assert_eq!(shaped.len(), 2);
        assert_eq!(
            shaped[0],
            vec![Value::Int64(1), Value::String("foobar".into())]
        );
    }

    #[test]
    fn test_rows_empty_result() {
        assert!(rows(QueryResult::empty()).is_empty());
    }
}
