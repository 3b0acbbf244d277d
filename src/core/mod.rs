pub mod etl;
pub mod flatten;
pub mod normalize;

pub use crate::domain::model::{
    DataKind, ExtractResult, Location, RawPayload, Record, RunReport, Table, TransformResult,
};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage, Warehouse, WeatherSource};
pub use crate::utils::error::Result;
