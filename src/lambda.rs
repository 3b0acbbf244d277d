#[cfg(feature = "lambda")]
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
#[cfg(feature = "lambda")]
use serde_json::Value;
#[cfg(feature = "lambda")]
use weather_etl::config::lambda::{build_s3_client, LambdaConfig};
#[cfg(feature = "lambda")]
use weather_etl::utils::{logger, validation::Validate};
#[cfg(feature = "lambda")]
use weather_etl::{EtlEngine, ObjectWarehouse, OpenWeatherClient, S3Storage, WeatherPipeline};

#[cfg(feature = "lambda")]
fn boxed(e: weather_etl::EtlError) -> Error {
    tracing::error!("❌ {} (Category: {:?})", e, e.category());
    Box::new(e)
}

#[cfg(feature = "lambda")]
async fn function_handler(event: LambdaEvent<Value>) -> Result<String, Error> {
    // 觸發內容不影響執行，只記錄是否有帶
    tracing::info!(
        "Starting weather ETL Lambda function (payload present: {})",
        !event.payload.is_null()
    );

    let lambda_config = LambdaConfig::from_env().map_err(boxed)?;
    lambda_config.validate().map_err(boxed)?;

    let weather = &lambda_config.weather;
    let archive_client = build_s3_client(
        &lambda_config.s3_region,
        weather.archive_credentials_file(),
    )
    .await
    .map_err(boxed)?;
    let warehouse_client = build_s3_client(
        &lambda_config.s3_region,
        weather.warehouse_credentials_file(),
    )
    .await
    .map_err(boxed)?;

    let archive_storage = S3Storage::new(archive_client, weather.archive.bucket.clone());
    archive_storage
        .ensure_bucket(&lambda_config.s3_region)
        .await
        .map_err(boxed)?;

    let warehouse = ObjectWarehouse::new(
        S3Storage::new(warehouse_client, lambda_config.warehouse_bucket.clone()),
        &weather.warehouse.project_id,
        &weather.warehouse.dataset_id,
    );
    let source = OpenWeatherClient::from_config(&lambda_config).map_err(boxed)?;

    let monitoring = weather.monitoring_enabled();
    let pipeline = WeatherPipeline::new(source, archive_storage, warehouse, lambda_config);
    let engine = EtlEngine::new_with_monitoring(pipeline, monitoring);

    let report = engine.run().await.map_err(boxed)?;
    for location in &report.failed_locations {
        tracing::warn!("⚠️ Skipped {} this run", location);
    }

    tracing::info!("Weather ETL Lambda function completed successfully");
    Ok(report.message)
}

#[cfg(feature = "lambda")]
#[tokio::main]
async fn main() -> Result<(), Error> {
    logger::init_lambda_logger();

    run(service_fn(function_handler)).await
}
