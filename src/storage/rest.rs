//! Hosted bucket storage (`/storage/v1/object/...`)

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use std::time::Duration;

use super::{sanitize_path, ObjectStorage, StoredObject};
use crate::store::StoreError;

pub struct RestStorage {
    client: Client,
    base_url: String,
    api_key: String,
    bucket: String,
}

impl RestStorage {
    pub fn new(base_url: &str, api_key: &str, bucket: &str, timeout: Duration) -> Result<Self, StoreError> {
        let client = Client::builder()
            .user_agent(concat!("folio/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Upload(format!("HTTP client error: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            bucket: bucket.to_string(),
        })
    }

    fn object_url(&self, path: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, encode_path(path))
    }
}

fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Duplicate uploads come back as 409, or as 400 with a "Duplicate" body
fn classify(status: StatusCode, body: &str, path: &str) -> StoreError {
    let duplicate = status == StatusCode::CONFLICT
        || (status == StatusCode::BAD_REQUEST
            && (body.contains("Duplicate") || body.contains("already exists")));
    if duplicate {
        StoreError::object_exists(path)
    } else {
        let detail = body.chars().take(200).collect::<String>();
        StoreError::Upload(format!("{}: HTTP {}: {}", path, status, detail))
    }
}

#[async_trait]
impl ObjectStorage for RestStorage {
    async fn upload(
        &self,
        path: &str,
        bytes: &[u8],
        content_type: &str,
        overwrite: bool,
    ) -> Result<StoredObject, StoreError> {
        let path = sanitize_path(path)?;

        let response = self
            .client
            .post(self.object_url(&path))
            .header("apikey", &self.api_key)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(header::CONTENT_TYPE, content_type)
            .header("x-upsert", if overwrite { "true" } else { "false" })
            .body(bytes.to_vec())
            .send()
            .await
            .map_err(|e| StoreError::Upload(format!("{}: {}", path, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify(status, &body, &path));
        }

        tracing::info!("Uploaded {} to bucket '{}' ({} bytes)", path, self.bucket, bytes.len());
        Ok(StoredObject {
            url: self.public_url(&path),
            size: bytes.len() as u64,
            content_type: content_type.to_string(),
            path,
        })
    }

    fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url,
            self.bucket,
            encode_path(path)
        )
    }
}
