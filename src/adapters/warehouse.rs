use crate::core::{Storage, Table, Warehouse};
use crate::utils::error::{EtlError, Result};
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColumnType {
    Integer,
    Float,
    Boolean,
    String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColumnMode {
    Nullable,
    Required,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    pub mode: ColumnMode,
}

#[derive(Debug, Serialize)]
struct TableManifest<'a> {
    table: &'a str,
    row_count: usize,
    loaded_at: String,
    columns: Vec<ColumnSchema>,
}

/// 依照實際出現的值推斷欄位型別 (類似 autodetect)。
/// 整數與浮點混合視為 FLOAT，其他型別混合或全為 null 則為 STRING。
pub fn infer_schema(table: &Table) -> Vec<ColumnSchema> {
    table
        .columns
        .iter()
        .map(|name| {
            let mut column_type: Option<ColumnType> = None;
            let mut has_null = false;

            for value in table.rows.iter().map(|row| row.get(name)) {
                let observed = match value {
                    None | Some(Value::Null) => {
                        has_null = true;
                        continue;
                    }
                    Some(Value::Bool(_)) => ColumnType::Boolean,
                    Some(Value::Number(n)) if n.is_i64() || n.is_u64() => ColumnType::Integer,
                    Some(Value::Number(_)) => ColumnType::Float,
                    Some(_) => ColumnType::String,
                };
                column_type = Some(match (column_type, observed) {
                    (None, observed) => observed,
                    (Some(current), observed) if current == observed => current,
                    (Some(ColumnType::Integer), ColumnType::Float)
                    | (Some(ColumnType::Float), ColumnType::Integer) => ColumnType::Float,
                    _ => ColumnType::String,
                });
            }

            ColumnSchema {
                name: name.clone(),
                column_type: column_type.unwrap_or(ColumnType::String),
                mode: if has_null {
                    ColumnMode::Nullable
                } else {
                    ColumnMode::Required
                },
            }
        })
        .collect()
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// 沒有欄位的表 (本次沒有任何資料) 輸出為空檔案
pub fn table_to_csv(table: &Table, name: &str) -> Result<Vec<u8>> {
    if table.columns.is_empty() {
        return Ok(Vec::new());
    }

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(table.columns.iter().map(|column| cell(row.get(column))))?;
    }
    writer.into_inner().map_err(|e| EtlError::LoadError {
        table: name.to_string(),
        message: e.to_string(),
    })
}

/// 以物件儲存實作的 warehouse：
/// `<project>/<dataset>/<table>.csv` 與 `<project>/<dataset>/<table>.schema.json`
pub struct ObjectWarehouse<S: Storage> {
    storage: S,
    project_id: String,
    dataset_id: String,
}

impl<S: Storage> ObjectWarehouse<S> {
    pub fn new(storage: S, project_id: &str, dataset_id: &str) -> Self {
        Self {
            storage,
            project_id: project_id.to_string(),
            dataset_id: dataset_id.to_string(),
        }
    }

    pub fn dataset_path(&self) -> String {
        format!("{}/{}", self.project_id, self.dataset_id)
    }

    pub fn table_path(&self, name: &str) -> String {
        format!("{}/{}.csv", self.dataset_path(), name)
    }

    pub fn schema_path(&self, name: &str) -> String {
        format!("{}/{}.schema.json", self.dataset_path(), name)
    }

    /// dataset 不存在時寫入 dataset.json
    async fn ensure_dataset(&self) -> Result<()> {
        let marker = format!("{}/dataset.json", self.dataset_path());
        if self.storage.read_file(&marker).await.is_ok() {
            return Ok(());
        }

        tracing::info!("📁 Creating dataset {}.{}", self.project_id, self.dataset_id);
        let body = serde_json::to_vec_pretty(&serde_json::json!({
            "project_id": self.project_id,
            "dataset_id": self.dataset_id,
            "created_at": Utc::now().to_rfc3339(),
        }))?;
        self.storage.write_file(&marker, &body).await
    }
}

impl<S: Storage> Warehouse for ObjectWarehouse<S> {
    async fn replace_table(&self, table: &Table, name: &str) -> Result<String> {
        self.ensure_dataset().await?;

        let csv_data = table_to_csv(table, name)?;
        let manifest = TableManifest {
            table: name,
            row_count: table.len(),
            loaded_at: Utc::now().to_rfc3339(),
            columns: infer_schema(table),
        };
        let schema_data = serde_json::to_vec_pretty(&manifest)?;

        // 直接覆寫整個物件 = truncate + insert
        self.storage
            .write_file(&self.table_path(name), &csv_data)
            .await?;
        self.storage
            .write_file(&self.schema_path(name), &schema_data)
            .await?;

        Ok(format!("{}.{}.{}", self.project_id, self.dataset_id, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::LocalStorage;
    use crate::core::normalize::normalize;
    use crate::core::Record;
    use serde_json::json;
    use tempfile::TempDir;

    fn table(rows: Vec<Value>) -> Table {
        let records = rows
            .into_iter()
            .map(|row| match row {
                Value::Object(data) => Record { data },
                other => panic!("not an object: {}", other),
            })
            .collect();
        normalize(records).unwrap()
    }

    #[test]
    fn test_infer_schema_types() {
        let table = table(vec![
            json!({"id": 1, "temp": 20, "name": "London", "day": true, "pop": null, "mixed": 1}),
            json!({"id": 2, "temp": 20.5, "name": "Dubai", "day": false, "pop": null, "mixed": "x"}),
        ]);

        let schema = infer_schema(&table);
        let types: Vec<(&str, ColumnType, ColumnMode)> = schema
            .iter()
            .map(|c| (c.name.as_str(), c.column_type, c.mode))
            .collect();

        assert_eq!(
            types,
            vec![
                ("id", ColumnType::Integer, ColumnMode::Required),
                ("temp", ColumnType::Float, ColumnMode::Required),
                ("name", ColumnType::String, ColumnMode::Required),
                ("day", ColumnType::Boolean, ColumnMode::Required),
                ("pop", ColumnType::String, ColumnMode::Nullable),
                ("mixed", ColumnType::String, ColumnMode::Required),
            ]
        );
    }

    #[test]
    fn test_table_to_csv() {
        let table = table(vec![
            json!({"city_name": "Hyderabad, IN", "temp": 29.5, "rain": null}),
            json!({"city_name": "London, GB", "temp": 9, "rain": 0.4}),
        ]);

        let csv_data = String::from_utf8(table_to_csv(&table, "t").unwrap()).unwrap();
        let lines: Vec<&str> = csv_data.lines().collect();

        assert_eq!(lines[0], "city_name,temp,rain");
        assert_eq!(lines[1], "\"Hyderabad, IN\",29.5,");
        assert_eq!(lines[2], "\"London, GB\",9,0.4");
    }

    #[tokio::test]
    async fn test_replace_table_with_empty_table_clears_previous_rows() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path());
        let warehouse = ObjectWarehouse::new(storage.clone(), "weather-project", "weather_api_data");

        let previous = table(vec![json!({"weather_main": "Clear", "dt": 1})]);
        warehouse.replace_table(&previous, "current_weather").await.unwrap();
        warehouse
            .replace_table(&Table::default(), "current_weather")
            .await
            .unwrap();

        let csv_data = storage
            .read_file("weather-project/weather_api_data/current_weather.csv")
            .await
            .unwrap();
        assert!(csv_data.is_empty());

        let schema: Value = serde_json::from_slice(
            &storage
                .read_file("weather-project/weather_api_data/current_weather.schema.json")
                .await
                .unwrap(),
        )
        .unwrap();
        assert_eq!(schema["row_count"], 0);
        assert_eq!(schema["columns"], json!([]));
    }

    #[tokio::test]
    async fn test_replace_table_overwrites_previous_contents() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path());
        let warehouse = ObjectWarehouse::new(storage.clone(), "weather-project", "weather_api_data");

        let first = table(vec![json!({"dt": 1}), json!({"dt": 2}), json!({"dt": 3})]);
        let second = table(vec![json!({"dt": 4})]);

        warehouse.replace_table(&first, "current_weather").await.unwrap();
        let destination = warehouse
            .replace_table(&second, "current_weather")
            .await
            .unwrap();

        assert_eq!(destination, "weather-project.weather_api_data.current_weather");

        let csv_data = storage
            .read_file("weather-project/weather_api_data/current_weather.csv")
            .await
            .unwrap();
        assert_eq!(String::from_utf8(csv_data).unwrap(), "dt\n4\n");

        let schema: Value = serde_json::from_slice(
            &storage
                .read_file("weather-project/weather_api_data/current_weather.schema.json")
                .await
                .unwrap(),
        )
        .unwrap();
        assert_eq!(schema["row_count"], 1);
        assert_eq!(schema["columns"][0]["type"], "INTEGER");
        assert_eq!(schema["columns"][0]["mode"], "REQUIRED");

        assert!(temp_dir
            .path()
            .join("weather-project/weather_api_data/dataset.json")
            .exists());
    }
}
