use crate::core::Storage;
use crate::utils::error::Result;
use std::path::PathBuf;

#[cfg(feature = "lambda")]
use crate::utils::error::EtlError;
#[cfg(feature = "lambda")]
use aws_sdk_s3::error::DisplayErrorContext;
#[cfg(feature = "lambda")]
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
#[cfg(feature = "lambda")]
use aws_sdk_s3::Client as S3Client;
#[cfg(feature = "lambda")]
use std::path::Path;

/// 本機檔案系統儲存，CLI 執行時用來模擬 bucket / dataset
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn full_path(&self, path: &str) -> PathBuf {
        self.base_path.join(path)
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let data = tokio::fs::read(self.full_path(path)).await?;
        Ok(data)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.full_path(path);

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(&full_path, data).await?;
        tracing::debug!("Wrote {} bytes to {}", data.len(), full_path.display());
        Ok(())
    }
}

#[cfg(feature = "lambda")]
fn content_type_for(path: &str) -> &'static str {
    match Path::new(path).extension().and_then(|ext| ext.to_str()) {
        Some("json") => "application/json",
        Some("csv") => "text/csv",
        _ => "application/octet-stream",
    }
}

#[cfg(feature = "lambda")]
#[derive(Debug, Clone)]
pub struct S3Storage {
    client: S3Client,
    bucket: String,
}

#[cfg(feature = "lambda")]
impl S3Storage {
    pub fn new(client: S3Client, bucket: String) -> Self {
        Self { client, bucket }
    }

    /// bucket 不存在時建立
    pub async fn ensure_bucket(&self, region: &str) -> Result<()> {
        if self
            .client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .is_ok()
        {
            return Ok(());
        }

        tracing::info!("🪣 Bucket {} not found, creating it", self.bucket);
        let mut request = self.client.create_bucket().bucket(&self.bucket);
        // us-east-1 不接受 LocationConstraint
        if region != "us-east-1" {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(region))
                    .build(),
            );
        }

        request.send().await.map_err(|e| EtlError::StorageError {
            message: format!(
                "Failed to create bucket {}: {}",
                self.bucket,
                DisplayErrorContext(&e)
            ),
        })?;
        Ok(())
    }
}

#[cfg(feature = "lambda")]
impl Storage for S3Storage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
            .map_err(|e| EtlError::StorageError {
                message: format!(
                    "Failed to read s3://{}/{}: {}",
                    self.bucket,
                    path,
                    DisplayErrorContext(&e)
                ),
            })?;

        let data = resp
            .body
            .collect()
            .await
            .map_err(|e| EtlError::StorageError {
                message: format!("Failed to collect s3://{}/{}: {}", self.bucket, path, e),
            })?;

        Ok(data.into_bytes().to_vec())
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(path)
            .content_type(content_type_for(path))
            .body(data.to_vec().into())
            .send()
            .await
            .map_err(|e| EtlError::StorageError {
                message: format!(
                    "Failed to write s3://{}/{}: {}",
                    self.bucket,
                    path,
                    DisplayErrorContext(&e)
                ),
            })?;

        tracing::debug!("Uploaded {} bytes to s3://{}/{}", data.len(), self.bucket, path);
        Ok(())
    }
}
