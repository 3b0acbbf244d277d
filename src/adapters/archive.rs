use crate::core::{DataKind, RawPayload, Storage};
use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use serde_json::Value;

pub const ARCHIVE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

/// `<kind>/<location>/<UTC timestamp>.json`
pub fn archive_key(kind: DataKind, location_name: &str, at: DateTime<Utc>) -> String {
    format!(
        "{}/{}/{}.json",
        kind,
        location_name,
        at.format(ARCHIVE_TIMESTAMP_FORMAT)
    )
}

/// 原始回應原封不動地寫入 blob storage
pub struct Archiver<S: Storage> {
    storage: S,
}

impl<S: Storage> Archiver<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub async fn store(&self, payload: &Value, key: &str) -> Result<()> {
        let body = serde_json::to_vec(payload)?;
        self.storage.write_file(key, &body).await?;
        tracing::info!("🗄️ Archived {} ({} bytes)", key, body.len());
        Ok(())
    }

    pub async fn archive(&self, payload: &RawPayload, at: DateTime<Utc>) -> Result<String> {
        let key = archive_key(payload.kind, &payload.location.name(), at);
        self.store(&payload.body, &key).await?;
        Ok(key)
    }
}
