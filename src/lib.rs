pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliArgs;

#[cfg(feature = "lambda")]
pub use adapters::storage::S3Storage;
#[cfg(feature = "lambda")]
pub use config::lambda::LambdaConfig;

pub use adapters::{
    archive::Archiver, http::OpenWeatherClient, storage::LocalStorage,
    warehouse::ObjectWarehouse,
};
pub use app::pipelines::WeatherPipeline;
pub use config::WeatherConfig;
pub use core::{etl::EtlEngine, flatten::flatten_current, flatten::flatten_forecast, normalize::normalize};
pub use utils::error::{EtlError, Result};
