use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use crate::error::{CrawlerError, CrawlerResult};
use crate::publisher::ObjectStore;

/// Object storage endpoint of one bucket; uploads overwrite existing keys.
#[derive(Clone)]
pub struct SupabaseStorageClient {
    client: Client,
    storage_url: String,
    api_key: String,
    bucket: String,
}

impl SupabaseStorageClient {
    pub fn new(storage_url: &str, api_key: &str, bucket: &str) -> Self {
        Self {
            client: Client::new(),
            storage_url: storage_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            bucket: bucket.to_string(),
        }
    }

    fn object_url(&self, key: &str) -> String {
        format!(
            "{}/object/{}/{}",
            self.storage_url,
            self.bucket,
            key.trim_start_matches('/')
        )
    }

    pub async fn upload_object(&self, key: &str, content: Vec<u8>, content_type: &str) -> CrawlerResult<()> {
        let url = self.object_url(key);
        debug!("PUT {} ({} bytes, {})", url, content.len(), content_type);

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", content_type)
            .header("x-upsert", "true")
            .body(content)
            .send()
            .await
            .map_err(|e| CrawlerError::StorageUpload(format!("{}: {}", key, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CrawlerError::StorageUpload(format!(
                "{} rejected by bucket '{}': {} {}",
                key, self.bucket, status, body
            )));
        }

        info!("Stored {} in bucket '{}'", key, self.bucket);
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for SupabaseStorageClient {
    async fn put_object(&self, key: &str, content: Vec<u8>, content_type: &str) -> CrawlerResult<()> {
        self.upload_object(key, content, content_type).await
    }
}
