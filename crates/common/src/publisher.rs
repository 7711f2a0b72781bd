use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use time::Date;
use tracing::info;

use crate::error::{CrawlerError, CrawlerResult};

/// Write-only blob store.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put_object(&self, key: &str, content: Vec<u8>, content_type: &str) -> CrawlerResult<()>;
}

/// `<year>/<MM>/<DD>/<source-tag>/<file name>`
pub fn remote_key(date: Date, source_tag: &str, file_name: &str) -> String {
    format!(
        "{}/{:02}/{:02}/{}/{}",
        date.year(),
        u8::from(date.month()),
        date.day(),
        source_tag,
        file_name
    )
}

fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("csv") => "text/csv",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}

/// Copies local artifacts to the object store and removes them afterwards.
#[derive(Clone)]
pub struct RemotePublisher {
    store: Arc<dyn ObjectStore>,
    source_tag: String,
    retain_local: bool,
}

impl RemotePublisher {
    pub fn new(store: Arc<dyn ObjectStore>, source_tag: &str) -> Self {
        Self {
            store,
            source_tag: source_tag.to_string(),
            retain_local: false,
        }
    }

    pub fn retain_local(mut self, retain: bool) -> Self {
        self.retain_local = retain;
        self
    }

    /// Uploads `local_path` under the date-partitioned key and returns that
    /// key. The local file is only removed once the store acknowledged the
    /// upload; on upload failure it stays where it is.
    pub async fn publish(&self, local_path: &Path, date: Date) -> CrawlerResult<String> {
        let file_name = local_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                CrawlerError::StorageUpload(format!("invalid local file name: {}", local_path.display()))
            })?;
        let key = remote_key(date, &self.source_tag, file_name);

        let content = tokio::fs::read(local_path).await?;
        info!("Uploading {} as {}", local_path.display(), key);
        self.store
            .put_object(&key, content, content_type_for(local_path))
            .await?;

        if !self.retain_local {
            tokio::fs::remove_file(local_path).await?;
            info!("Removed local copy {}", local_path.display());
        }

        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::tempdir;
    use time::macros::date;

    #[derive(Default)]
    struct RecordingStore {
        puts: Mutex<Vec<(String, Vec<u8>, String)>>,
    }

    #[async_trait]
    impl ObjectStore for RecordingStore {
        async fn put_object(&self, key: &str, content: Vec<u8>, content_type: &str) -> CrawlerResult<()> {
            self.puts
                .lock()
                .unwrap()
                .push((key.to_string(), content, content_type.to_string()));
            Ok(())
        }
    }

    struct FailingStore;

    #[async_trait]
    impl ObjectStore for FailingStore {
        async fn put_object(&self, _key: &str, _content: Vec<u8>, _content_type: &str) -> CrawlerResult<()> {
            Err(CrawlerError::StorageUpload("503 Service Unavailable".into()))
        }
    }

    #[test]
    fn test_remote_key_is_zero_padded() {
        assert_eq!(
            remote_key(date!(2024 - 03 - 07), "TWITTER", "output_20240307.csv"),
            "2024/03/07/TWITTER/output_20240307.csv"
        );
        assert_eq!(
            remote_key(date!(2023 - 12 - 25), "TWITTER", "output_20231225.json"),
            "2023/12/25/TWITTER/output_20231225.json"
        );
    }

    #[tokio::test]
    async fn test_publish_uploads_then_deletes() {
        let tmp = tempdir().expect("tempdir");
        let local = tmp.path().join("output_20240307.csv");
        std::fs::write(&local, "\"a\",\"b\"\n").expect("write");

        let store = Arc::new(RecordingStore::default());
        let publisher = RemotePublisher::new(store.clone(), "TWITTER");
        let key = publisher
            .publish(&local, date!(2024 - 03 - 07))
            .await
            .expect("publish");

        assert_eq!(key, "2024/03/07/TWITTER/output_20240307.csv");
        assert!(!local.exists());

        let puts = store.puts.lock().unwrap();
        assert_eq!(puts.len(), 1);
        assert_eq!(puts[0].1, b"\"a\",\"b\"\n".to_vec());
        assert_eq!(puts[0].2, "text/csv");
    }

    #[tokio::test]
    async fn test_failed_upload_keeps_local_file() {
        let tmp = tempdir().expect("tempdir");
        let local = tmp.path().join("output_20240307.json");
        std::fs::write(&local, "{}").expect("write");

        let publisher = RemotePublisher::new(Arc::new(FailingStore), "TWITTER");
        let err = publisher
            .publish(&local, date!(2024 - 03 - 07))
            .await
            .expect_err("upload must fail");

        assert!(matches!(err, CrawlerError::StorageUpload(_)));
        assert!(local.exists());
    }

    #[tokio::test]
    async fn test_retain_local_skips_delete() {
        let tmp = tempdir().expect("tempdir");
        let local = tmp.path().join("output_20240307.csv");
        std::fs::write(&local, "x").expect("write");

        let store = Arc::new(RecordingStore::default());
        let publisher = RemotePublisher::new(store.clone(), "TWITTER").retain_local(true);
        publisher
            .publish(&local, date!(2024 - 03 - 07))
            .await
            .expect("publish");

        assert!(local.exists());
        assert_eq!(store.puts.lock().unwrap().len(), 1);
    }
}
