use crate::adapters::archive::Archiver;
use crate::core::flatten::{flatten_current, flatten_forecast};
use crate::core::normalize::normalize;
use crate::core::{
    ConfigProvider, DataKind, ExtractResult, Location, Pipeline, RawPayload, RunReport, Storage,
    TransformResult, Warehouse, WeatherSource,
};
use crate::domain::model::LoadedTable;
use crate::utils::error::Result;
use chrono::Utc;

pub const SUCCESS_MESSAGE: &str = "Processing completed successfully.";

/// 天氣 ETL 的 orchestrator：
/// FETCH → FLATTEN+ARCHIVE → NORMALIZE+LOAD，全部依序執行
pub struct WeatherPipeline<F, A, W, C>
where
    F: WeatherSource,
    A: Storage,
    W: Warehouse,
    C: ConfigProvider,
{
    source: F,
    archiver: Archiver<A>,
    warehouse: W,
    config: C,
}

impl<F, A, W, C> WeatherPipeline<F, A, W, C>
where
    F: WeatherSource,
    A: Storage,
    W: Warehouse,
    C: ConfigProvider,
{
    pub fn new(source: F, archive_storage: A, warehouse: W, config: C) -> Self {
        Self {
            source,
            archiver: Archiver::new(archive_storage),
            warehouse,
            config,
        }
    }

    /// 同一地點的 current 與 forecast 必須都成功，否則整個地點略過
    async fn fetch_location(&self, location: &Location) -> Result<Vec<RawPayload>> {
        let mut payloads = Vec::with_capacity(DataKind::ALL.len());
        for kind in DataKind::ALL {
            let body = self.source.fetch(location, kind).await?;
            payloads.push(RawPayload {
                location: location.clone(),
                kind,
                body,
            });
        }
        Ok(payloads)
    }
}

#[async_trait::async_trait]
impl<F, A, W, C> Pipeline for WeatherPipeline<F, A, W, C>
where
    F: WeatherSource,
    A: Storage,
    W: Warehouse,
    C: ConfigProvider,
{
    async fn extract(&self) -> Result<ExtractResult> {
        let mut result = ExtractResult::default();

        for location in self.config.locations() {
            match self.fetch_location(location).await {
                Ok(payloads) => {
                    tracing::debug!("Fetched current and forecast for {}", location.name());
                    result.payloads.extend(payloads);
                }
                Err(e) if e.is_transport() => {
                    tracing::warn!("⚠️ Unable to retrieve data for {}: {}", location.name(), e);
                    result.failed_locations.push(location.name());
                }
                Err(e) => return Err(e),
            }
        }

        Ok(result)
    }

    async fn transform(&self, data: ExtractResult) -> Result<TransformResult> {
        let run_at = Utc::now();
        let mut result = TransformResult {
            failed_locations: data.failed_locations,
            ..TransformResult::default()
        };

        for payload in &data.payloads {
            let key = self.archiver.archive(payload, run_at).await?;
            result.archived_keys.push(key);

            match payload.kind {
                DataKind::Current => result.current.push(flatten_current(&payload.body)?),
                DataKind::Forecast => result.forecast.extend(flatten_forecast(&payload.body)?),
            }
        }

        Ok(result)
    }

    async fn load(&self, result: TransformResult) -> Result<RunReport> {
        let mut tables = Vec::new();

        for (kind, records) in [
            (DataKind::Current, result.current),
            (DataKind::Forecast, result.forecast),
        ] {
            let name = self.config.table_name(kind);
            // 沒有資料時仍以空表覆蓋，不保留上一次的內容
            if records.is_empty() {
                tracing::warn!("⚠️ No {} rows this run, {} will be emptied", kind, name);
            }

            let table = normalize(records)?;
            let destination = self.warehouse.replace_table(&table, name).await?;
            tracing::info!("✅ Uploaded data to warehouse: {}", destination);

            tables.push(LoadedTable {
                table: name.to_string(),
                destination,
                rows: table.len(),
                columns: table.columns.len(),
            });
        }

        Ok(RunReport {
            message: SUCCESS_MESSAGE.to_string(),
            tables,
            archived_keys: result.archived_keys,
            failed_locations: result.failed_locations,
        })
    }
}
