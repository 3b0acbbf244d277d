use clap::Parser;
use weather_etl::config::cli::describe_plan;
use weather_etl::utils::{logger, validation::Validate};
use weather_etl::{
    CliArgs, EtlEngine, LocalStorage, ObjectWarehouse, OpenWeatherClient, WeatherConfig,
    WeatherPipeline,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // 初始化日誌
    logger::init_cli_logger(args.verbose);

    tracing::info!("🚀 Starting weather-etl CLI");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    let config = match WeatherConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 驗證配置
    if let Err(e) = args.validate().and_then(|_| config.validate()) {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No actual processing will occur");
        for line in describe_plan(&config)? {
            println!("{}", line);
        }
        return Ok(());
    }

    let monitor_enabled = args.monitor || config.monitoring_enabled();
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    // 本機執行時以目錄代替 bucket 與 warehouse
    let source = OpenWeatherClient::from_config(&config)?;
    let archive_storage = LocalStorage::new(args.archive_root(&config));
    let warehouse = ObjectWarehouse::new(
        LocalStorage::new(args.warehouse_root()),
        &config.warehouse.project_id,
        &config.warehouse.dataset_id,
    );
    let pipeline = WeatherPipeline::new(source, archive_storage, warehouse, config);

    let engine = EtlEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(report) => {
            for location in &report.failed_locations {
                tracing::warn!("⚠️ Skipped {} this run", location);
            }
            tracing::info!(
                "📁 Archived {} payloads, loaded {} rows",
                report.archived_keys.len(),
                report.rows_loaded()
            );
            println!("✅ {}", report.message);
            println!("📁 Output saved to: {}", args.output_path);
        }
        Err(e) => {
            // 記錄詳細錯誤信息
            tracing::error!(
                "❌ ETL process failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
            std::process::exit(e.severity().exit_code());
        }
    }

    Ok(())
}
