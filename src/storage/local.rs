//! Filesystem storage served under `/uploads`

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::{sanitize_path, ObjectStorage, StoredObject};
use crate::store::StoreError;

pub struct LocalStorage {
    root: PathBuf,
    public_base_url: String,
}

impl LocalStorage {
    pub fn new(root: PathBuf, public_base_url: String) -> Self {
        Self {
            root,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }
}

fn io_error(path: &str, e: std::io::Error) -> StoreError {
    StoreError::Upload(format!("failed to write {}: {}", path, e))
}

#[async_trait]
impl ObjectStorage for LocalStorage {
    async fn upload(
        &self,
        path: &str,
        bytes: &[u8],
        content_type: &str,
        overwrite: bool,
    ) -> Result<StoredObject, StoreError> {
        let path = sanitize_path(path)?;
        let target = self.root.join(&path);

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(&path, e))?;
        }

        if overwrite {
            fs::write(&target, bytes).await.map_err(|e| io_error(&path, e))?;
        } else {
            let mut file = fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&target)
                .await
                .map_err(|e| match e.kind() {
                    ErrorKind::AlreadyExists => StoreError::object_exists(&path),
                    _ => io_error(&path, e),
                })?;
            file.write_all(bytes).await.map_err(|e| io_error(&path, e))?;
            file.flush().await.map_err(|e| io_error(&path, e))?;
        }

        tracing::info!("Stored {} ({} bytes)", path, bytes.len());
        Ok(StoredObject {
            url: self.public_url(&path),
            size: bytes.len() as u64,
            content_type: content_type.to_string(),
            path,
        })
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}", self.public_base_url, path)
    }
}
