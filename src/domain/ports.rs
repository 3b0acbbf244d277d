use crate::domain::model::{
    DataKind, ExtractResult, Location, RunReport, Table, TransformResult,
};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// 以 key 讀寫位元組的儲存後端 (本機檔案系統或 S3)
pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn api_endpoint(&self) -> &str;
    fn api_key(&self) -> &str;
    fn units(&self) -> &str;
    fn request_timeout(&self) -> Duration;
    fn locations(&self) -> &[Location];
    fn table_name(&self, kind: DataKind) -> &str;
}

/// Fetcher: 取得某地點、某種類的原始 JSON
pub trait WeatherSource: Send + Sync {
    fn fetch(
        &self,
        location: &Location,
        kind: DataKind,
    ) -> impl std::future::Future<Output = Result<serde_json::Value>> + Send;
}

/// Loader: 以 truncate-then-insert 語意整張取代目標表，回傳寫入位置
pub trait Warehouse: Send + Sync {
    fn replace_table(
        &self,
        table: &Table,
        name: &str,
    ) -> impl std::future::Future<Output = Result<String>> + Send;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<ExtractResult>;
    async fn transform(&self, data: ExtractResult) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<RunReport>;
}
