//! Storage for uploaded laptop images.

use super::StoreError;
use bytes::Bytes;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::RwLock;
use tonic::async_trait;
use uuid::Uuid;

/// Metadata recorded for a stored image.
#[derive(Clone, Debug)]
pub struct ImageInfo {
    pub laptop_id: String,
    pub image_type: String,
    pub path: PathBuf,
}

/// Binary asset storage. Each call owns its payload outright, so
/// implementations need no cross-call coordination beyond their own index.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Persists the payload under a freshly generated asset id and returns
    /// that id.
    async fn save(
        &self,
        laptop_id: &str,
        image_type: &str,
        data: Bytes,
    ) -> Result<String, StoreError>;
}

/// Reference implementation that writes images to a directory on disk,
/// naming each file by its generated id and type tag.
pub struct DiskImageStore {
    image_dir: PathBuf,
    index: RwLock<HashMap<String, ImageInfo>>,
}

impl DiskImageStore {
    pub fn new(image_dir: impl Into<PathBuf>) -> Self {
        Self {
            image_dir: image_dir.into(),
            index: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the recorded metadata for an asset id, if any.
    pub async fn info(&self, id: &str) -> Option<ImageInfo> {
        self.index.read().await.get(id).cloned()
    }
}

#[async_trait]
impl ImageStore for DiskImageStore {
    async fn save(
        &self,
        laptop_id: &str,
        image_type: &str,
        data: Bytes,
    ) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        let path = self.image_dir.join(format!("{id}{image_type}"));

        tokio::fs::create_dir_all(&self.image_dir)
            .await
            .map_err(|e| StoreError::Internal(format!("cannot create image dir: {e}")))?;

        tokio::fs::write(&path, &data)
            .await
            .map_err(|e| StoreError::Internal(format!("cannot write image file: {e}")))?;

        let mut index = self.index.write().await;
        index.insert(
            id.clone(),
            ImageInfo {
                laptop_id: laptop_id.to_owned(),
                image_type: image_type.to_owned(),
                path,
            },
        );

        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::{DiskImageStore, ImageStore};
    use bytes::Bytes;
    use std::sync::Arc;
    use uuid::Uuid;

    fn temp_image_dir() -> std::path::PathBuf {
        std::env::temp_dir().join(format!("catalog-image-test-{}", Uuid::new_v4()))
    }

    #[tokio::test]
    async fn save_writes_the_payload_and_records_metadata() {
        let dir = temp_image_dir();
        let store = DiskImageStore::new(&dir);
        let payload = Bytes::from_static(b"not really a jpeg");

        let id = store.save("laptop-1", ".jpg", payload.clone()).await.unwrap();
        let info = store.info(&id).await.unwrap();

        assert_eq!(info.laptop_id, "laptop-1");
        assert_eq!(info.image_type, ".jpg");
        assert_eq!(tokio::fs::read(&info.path).await.unwrap(), payload);

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn concurrent_saves_get_distinct_ids() {
        let dir = temp_image_dir();
        let store = Arc::new(DiskImageStore::new(&dir));
        let mut handles = Vec::new();

        for i in 0..8 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                let payload = Bytes::from(vec![i as u8; 64]);
                store.save("laptop-1", ".png", payload).await.unwrap()
            }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }

        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 8);

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
