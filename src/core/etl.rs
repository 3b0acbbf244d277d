use crate::core::{Pipeline, RunReport};
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

/// 依序執行 FETCH → FLATTEN+ARCHIVE → NORMALIZE+LOAD；任何錯誤都會中止整個 run
pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<RunReport> {
        tracing::info!("🚀 Starting weather ETL run");

        tracing::info!("📡 Fetching weather data...");
        let extracted = self.pipeline.extract().await?;
        tracing::info!(
            "Fetched {} payloads ({} locations failed)",
            extracted.payloads.len(),
            extracted.failed_locations.len()
        );
        self.monitor.log_phase("fetch");

        tracing::info!("🔧 Archiving and flattening payloads...");
        let transformed = self.pipeline.transform(extracted).await?;
        tracing::info!(
            "Flattened {} current rows and {} forecast rows",
            transformed.current.len(),
            transformed.forecast.len()
        );
        self.monitor.log_phase("flatten+archive");

        tracing::info!("📦 Normalizing and loading tables...");
        let report = self.pipeline.load(transformed).await?;
        for table in &report.tables {
            tracing::info!(
                "Loaded {} rows x {} columns into {}",
                table.rows,
                table.columns,
                table.destination
            );
        }
        self.monitor.log_phase("normalize+load");
        self.monitor.log_final_stats();

        Ok(report)
    }
}
