use crate::domain::model::Record;
use crate::utils::error::{EtlError, Result};
use chrono::DateTime;
use serde_json::{Map, Value};

/// `timestamp` 欄位的格式 (UTC)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const CURRENT_CONTEXT: &str = "current";
const FORECAST_CONTEXT: &str = "forecast";
const CITY_PREFIX: &str = "city";

/// 將一筆即時天氣回應攤平成單一列。
///
/// 巢狀物件欄位展開為 `<field>_<subfield>`，其餘欄位原樣保留；
/// `weather` 若為 list 則取第一個 condition。若有 `dt` 會另外產生 `timestamp`。
pub fn flatten_current(payload: &Value) -> Result<Record> {
    let fields = as_object(payload, CURRENT_CONTEXT)?;
    let weather = fields
        .get("weather")
        .ok_or_else(|| missing_field("weather", CURRENT_CONTEXT))?;
    let condition = first_condition(weather, CURRENT_CONTEXT)?;

    let mut record = Record::new();
    for (key, value) in fields {
        let value = if key == "weather" { &condition } else { value };
        match value {
            Value::Object(sub_fields) => {
                for (sub_key, sub_value) in sub_fields {
                    insert_column(&mut record, format!("{}_{}", key, sub_key), sub_value.clone())?;
                }
            }
            other => insert_column(&mut record, key.clone(), other.clone())?,
        }
    }

    if let Some(dt) = fields.get("dt") {
        let timestamp = epoch_to_timestamp(dt, CURRENT_CONTEXT)?;
        insert_column(&mut record, "timestamp".to_string(), timestamp)?;
    }

    Ok(record)
}

/// 將預報回應展開為每個時段一列，並 cross-join `city` 的欄位 (加上 `city_` 前綴)。
/// 時段內的巢狀物件保留給 normalize 處理。
pub fn flatten_forecast(payload: &Value) -> Result<Vec<Record>> {
    let fields = as_object(payload, FORECAST_CONTEXT)?;

    let city = match fields.get("city") {
        Some(Value::Object(city)) => city,
        Some(_) => return Err(unexpected_type("city", FORECAST_CONTEXT, "an object")),
        None => return Err(missing_field("city", FORECAST_CONTEXT)),
    };
    let intervals = match fields.get("list") {
        Some(Value::Array(intervals)) => intervals,
        Some(_) => return Err(unexpected_type("list", FORECAST_CONTEXT, "a list")),
        None => return Err(missing_field("list", FORECAST_CONTEXT)),
    };

    intervals
        .iter()
        .enumerate()
        .map(|(index, interval)| flatten_interval(interval, index, city))
        .collect()
}

fn flatten_interval(interval: &Value, index: usize, city: &Map<String, Value>) -> Result<Record> {
    let context = format!("{} interval #{}", FORECAST_CONTEXT, index);
    let fields = as_object(interval, &context)?;
    let weather = fields
        .get("weather")
        .ok_or_else(|| missing_field("weather", &context))?;
    let condition = first_condition(weather, &context)?;

    let mut record = Record::new();
    for (key, value) in fields {
        let value = if key == "weather" {
            condition.clone()
        } else {
            value.clone()
        };
        record.insert(key.clone(), value);
    }

    for (key, value) in city {
        insert_column(&mut record, format!("{}_{}", CITY_PREFIX, key), value.clone())?;
    }

    Ok(record)
}

/// 欄位已存在時不覆寫，回報 `ColumnCollision`
fn insert_column(record: &mut Record, column: String, value: Value) -> Result<()> {
    if record.get(&column).is_some() {
        return Err(EtlError::ColumnCollision { column });
    }
    record.insert(column, value);
    Ok(())
}

/// list 取第一個元素；已經是單一物件(或其他值)則原樣回傳
fn first_condition(weather: &Value, context: &str) -> Result<Value> {
    match weather {
        Value::Array(conditions) => conditions.first().cloned().ok_or_else(|| {
            EtlError::EmptyWeatherConditions {
                context: context.to_string(),
            }
        }),
        other => Ok(other.clone()),
    }
}

/// epoch 秒 (整數或浮點，浮點向下取整) 轉成 UTC 字串；`null` 維持 `null`
pub fn epoch_to_timestamp(dt: &Value, context: &str) -> Result<Value> {
    let seconds = match dt {
        Value::Null => return Ok(Value::Null),
        Value::Number(number) => match number.as_i64() {
            Some(seconds) => seconds,
            None => number
                .as_f64()
                .map(|seconds| seconds.floor() as i64)
                .ok_or_else(|| unexpected_type("dt", context, "epoch seconds"))?,
        },
        _ => return Err(unexpected_type("dt", context, "epoch seconds")),
    };

    DateTime::from_timestamp(seconds, 0)
        .map(|utc| Value::String(utc.format(TIMESTAMP_FORMAT).to_string()))
        .ok_or_else(|| unexpected_type("dt", context, "epoch seconds within the supported range"))
}

fn as_object<'a>(value: &'a Value, context: &str) -> Result<&'a Map<String, Value>> {
    value.as_object().ok_or_else(|| EtlError::MalformedPayload {
        context: context.to_string(),
        message: "expected a JSON object".to_string(),
    })
}

fn missing_field(field: &str, context: &str) -> EtlError {
    EtlError::MissingField {
        field: field.to_string(),
        context: context.to_string(),
    }
}

fn unexpected_type(field: &str, context: &str, expected: &str) -> EtlError {
    EtlError::UnexpectedFieldType {
        field: field.to_string(),
        context: context.to_string(),
        expected: expected.to_string(),
    }
}
