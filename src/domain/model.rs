use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// 查詢天氣 API 用的固定地點
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub city: String,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
}

impl Location {
    pub fn new(city: &str, country: &str, lat: f64, lon: f64) -> Self {
        Self {
            city: city.to_string(),
            country: country.to_string(),
            lat,
            lon,
        }
    }

    /// 例如 "London, GB"，同時作為 archive 路徑的一部分
    pub fn name(&self) -> String {
        format!("{}, {}", self.city, self.country)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataKind {
    Current,
    Forecast,
}

impl DataKind {
    pub const ALL: [DataKind; 2] = [DataKind::Current, DataKind::Forecast];

    pub fn as_str(&self) -> &'static str {
        match self {
            DataKind::Current => "current",
            DataKind::Forecast => "forecast",
        }
    }

    /// OpenWeather 端點路徑
    pub fn endpoint(&self) -> &'static str {
        match self {
            DataKind::Current => "weather",
            DataKind::Forecast => "forecast",
        }
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 單一地點、單一種類的原始 API 回應
#[derive(Debug, Clone)]
pub struct RawPayload {
    pub location: Location,
    pub kind: DataKind,
    pub body: Value,
}

/// 一列扁平化的資料；欄位依插入順序排列
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub data: Map<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.data.get(column)
    }

    pub fn insert(&mut self, column: impl Into<String>, value: Value) -> Option<Value> {
        self.data.insert(column.into(), value)
    }

    pub fn columns(&self) -> impl Iterator<Item = &String> {
        self.data.keys()
    }
}

/// Normalize 之後的表格：每一列都擁有全部欄位，且值皆為純量
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Record>,
}

impl Table {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 依欄位名稱取出整欄的值
    pub fn column<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        self.rows.iter().filter_map(move |row| row.get(name))
    }
}

/// FETCH 階段的結果
#[derive(Debug, Clone, Default)]
pub struct ExtractResult {
    pub payloads: Vec<RawPayload>,
    pub failed_locations: Vec<String>,
}

/// FLATTEN+ARCHIVE 階段的結果，兩張合併後(尚未 normalize)的表
#[derive(Debug, Clone, Default)]
pub struct TransformResult {
    pub current: Vec<Record>,
    pub forecast: Vec<Record>,
    pub archived_keys: Vec<String>,
    pub failed_locations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadedTable {
    pub table: String,
    pub destination: String,
    pub rows: usize,
    pub columns: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub message: String,
    pub tables: Vec<LoadedTable>,
    pub archived_keys: Vec<String>,
    pub failed_locations: Vec<String>,
}

impl RunReport {
    pub fn rows_loaded(&self) -> usize {
        self.tables.iter().map(|t| t.rows).sum()
    }
}
