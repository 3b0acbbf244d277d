use crate::domain::model::{Record, Table};
use crate::utils::error::{EtlError, Result};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// 把攤平後的紀錄整理成只含純量欄位的表格。
///
/// 1. 只要任一列的某欄仍是物件，就把該欄展開成 `<column>_<subkey>`，重複直到沒有物件
/// 2. 剩下的 list 轉成 JSON 字串
/// 3. 統一欄位集合 (依首次出現順序)，缺少的欄位補 `null`
///
/// 對自己的輸出再跑一次不會有任何變化。
pub fn normalize(records: Vec<Record>) -> Result<Table> {
    let mut rows = records;

    loop {
        let nested = nested_columns(&rows);
        if nested.is_empty() {
            break;
        }
        tracing::debug!("Expanding nested columns: {:?}", nested);

        for column in &nested {
            for row in rows.iter_mut() {
                expand_column(row, column)?;
            }
        }
    }

    for row in rows.iter_mut() {
        for value in row.data.values_mut() {
            if value.is_array() || value.is_object() {
                *value = Value::String(serde_json::to_string(value)?);
            }
        }
    }

    Ok(unify_columns(rows))
}

pub fn is_scalar(value: &Value) -> bool {
    !(value.is_array() || value.is_object())
}

/// 至少有一列是物件的欄位，依首次出現順序
fn nested_columns(rows: &[Record]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        for (column, value) in &row.data {
            if value.is_object() && !columns.contains(column) {
                columns.push(column.clone());
            }
        }
    }
    columns
}

/// 在原本的位置展開單一欄位。`null` 直接移除；其他純量保留在原欄位名。
fn expand_column(row: &mut Record, column: &str) -> Result<()> {
    if !matches!(row.get(column), Some(Value::Object(_)) | Some(Value::Null)) {
        return Ok(());
    }

    let mut expanded = Map::with_capacity(row.data.len());
    for (key, value) in std::mem::take(&mut row.data) {
        if key != column {
            insert_unique(&mut expanded, key, value)?;
            continue;
        }
        if let Value::Object(fields) = value {
            for (sub_key, sub_value) in fields {
                insert_unique(&mut expanded, format!("{}_{}", column, sub_key), sub_value)?;
            }
        }
    }

    row.data = expanded;
    Ok(())
}

fn insert_unique(map: &mut Map<String, Value>, column: String, value: Value) -> Result<()> {
    if map.contains_key(&column) {
        return Err(EtlError::ColumnCollision { column });
    }
    map.insert(column, value);
    Ok(())
}

fn unify_columns(rows: Vec<Record>) -> Table {
    let mut columns = Vec::new();
    let mut seen = HashSet::new();
    for row in &rows {
        for column in row.columns() {
            if seen.insert(column.clone()) {
                columns.push(column.clone());
            }
        }
    }

    let rows = rows
        .into_iter()
        .map(|mut row| {
            let mut data = Map::with_capacity(columns.len());
            for column in &columns {
                let value = row.data.remove(column).unwrap_or(Value::Null);
                data.insert(column.clone(), value);
            }
            Record { data }
        })
        .collect();

    Table { columns, rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::flatten::{flatten_current, flatten_forecast};
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(data) => Record { data },
            other => panic!("not an object: {}", other),
        }
    }

    fn assert_all_scalar(table: &Table) {
        for row in &table.rows {
            assert_eq!(row.data.len(), table.columns.len());
            for (column, value) in &row.data {
                assert!(is_scalar(value), "column {} holds {}", column, value);
            }
        }
    }

    #[test]
    fn test_normalize_expands_nested_columns_recursively() {
        let rows = vec![record(json!({
            "dt": 1,
            "main": {"temp": 9.1, "detail": {"feels": 8.0}},
            "city_coord": {"lat": 1.5, "lon": 2.5}
        }))];

        let table = normalize(rows).unwrap();

        assert_eq!(
            table.columns,
            vec!["dt", "main_temp", "main_detail_feels", "city_coord_lat", "city_coord_lon"]
        );
        assert_eq!(table.rows[0].get("main_detail_feels"), Some(&json!(8.0)));
        assert_all_scalar(&table);
    }

    #[test]
    fn test_normalize_fills_absent_sub_keys_with_null() {
        let rows = vec![
            record(json!({"dt": 1, "rain": {"3h": 0.5}})),
            record(json!({"dt": 2})),
            record(json!({"dt": 3, "rain": null})),
        ];

        let table = normalize(rows).unwrap();

        assert_eq!(table.columns, vec!["dt", "rain_3h"]);
        assert_eq!(table.rows[0].get("rain_3h"), Some(&json!(0.5)));
        assert_eq!(table.rows[1].get("rain_3h"), Some(&Value::Null));
        assert_eq!(table.rows[2].get("rain_3h"), Some(&Value::Null));
    }

    #[test]
    fn test_normalize_serializes_lists() {
        let rows = vec![record(json!({
            "tags": ["a", "b"],
            "conditions": [{"main": "Rain"}]
        }))];

        let table = normalize(rows).unwrap();

        assert_eq!(table.rows[0].get("tags"), Some(&json!("[\"a\",\"b\"]")));
        assert_eq!(
            table.rows[0].get("conditions"),
            Some(&json!("[{\"main\":\"Rain\"}]"))
        );
        assert_all_scalar(&table);
    }

    #[test]
    fn test_normalize_keeps_scalar_in_mixed_column() {
        let rows = vec![
            record(json!({"sys": {"pod": "d"}})),
            record(json!({"sys": "n"})),
        ];

        let table = normalize(rows).unwrap();

        assert_eq!(table.columns, vec!["sys_pod", "sys"]);
        assert_eq!(table.rows[0].get("sys"), Some(&Value::Null));
        assert_eq!(table.rows[1].get("sys"), Some(&json!("n")));
        assert_eq!(table.rows[1].get("sys_pod"), Some(&Value::Null));
    }

    #[test]
    fn test_normalize_reports_column_collision() {
        let rows = vec![record(json!({"main_temp": 1, "main": {"temp": 2}}))];

        let err = normalize(rows).unwrap_err();

        assert!(matches!(err, EtlError::ColumnCollision { ref column } if column == "main_temp"));
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let rows = vec![
            record(json!({"a": {"b": {"c": 1}}, "l": [1, {"x": 2}], "s": "v"})),
            record(json!({"a": {"d": true}, "extra": null})),
        ];

        let once = normalize(rows).unwrap();
        let twice = normalize(once.rows.clone()).unwrap();

        assert_eq!(once, twice);
        assert_all_scalar(&twice);
    }

    #[test]
    fn test_normalize_empty_input() {
        let table = normalize(Vec::new()).unwrap();
        assert!(table.is_empty());
        assert!(table.columns.is_empty());
    }

    #[test]
    fn test_forecast_example_after_normalize() {
        let payload = json!({
            "city": {"name": "X"},
            "list": [
                {"weather": [{"main": "Rain"}], "dt": 1},
                {"weather": [{"main": "Snow"}], "dt": 2}
            ]
        });

        let table = normalize(flatten_forecast(&payload).unwrap()).unwrap();

        assert_eq!(table.len(), 2);
        let cities: Vec<&Value> = table.column("city_name").collect();
        assert_eq!(cities, vec![&json!("X"), &json!("X")]);
        let conditions: Vec<&Value> = table.column("weather_main").collect();
        assert_eq!(conditions, vec![&json!("Rain"), &json!("Snow")]);
    }

    #[test]
    fn test_current_rows_from_different_cities_share_columns() {
        let london = flatten_current(&json!({
            "weather": [{"main": "Clouds"}],
            "main": {"temp": 11},
            "name": "London"
        }))
        .unwrap();
        let dubai = flatten_current(&json!({
            "weather": [{"main": "Clear"}],
            "main": {"temp": 31, "sea_level": 1009},
            "rain": {"1h": 0.1},
            "name": "Dubai"
        }))
        .unwrap();

        let table = normalize(vec![london, dubai]).unwrap();

        assert_eq!(
            table.columns,
            vec!["weather_main", "main_temp", "name", "main_sea_level", "rain_1h"]
        );
        assert_eq!(table.rows[0].get("rain_1h"), Some(&Value::Null));
        assert_all_scalar(&table);
    }
}
