pub mod weather_pipeline;

pub use weather_pipeline::WeatherPipeline;
