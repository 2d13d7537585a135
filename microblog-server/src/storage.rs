//! Media object storage
//!
//! Uploads go to an S3-compatible bucket (MinIO in development) through
//! `object_store`. Objects get a random name so two uploads of `cat.png`
//! never collide; the public link is derived from the configured base URL.

use std::sync::Arc;

use axum::body::Bytes;
use object_store::aws::AmazonS3Builder;
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::{ObjectStore, PutPayload};
use rand::Rng;

/// Characters used for the random salt mixed into object names
const SALT_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const SALT_LEN: usize = 16;

/// Storage error type
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("invalid storage configuration: {0}")]
    Config(String),
}

/// S3 connection settings
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// S3 endpoint, e.g. `http://localhost:9000`
    pub endpoint_url: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
    /// Base for public links (defaults to `endpoint_url`)
    pub public_url: Option<String>,
}

/// An object that has been written to storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Object name inside the bucket
    pub key: String,
    /// Public link handed to clients
    pub link: String,
}

/// Media storage handle, cheap to clone
#[derive(Clone, Debug)]
pub struct MediaStorage {
    store: Arc<dyn ObjectStore>,
    /// Links are `{link_prefix}/{key}`
    link_prefix: String,
}

impl MediaStorage {
    /// Connect to an S3-compatible bucket using path-style requests.
    pub fn s3(config: &StorageConfig) -> Result<Self, StorageError> {
        if config.bucket.is_empty() {
            return Err(StorageError::Config("bucket name is empty".into()));
        }

        let store = AmazonS3Builder::new()
            .with_endpoint(&config.endpoint_url)
            .with_bucket_name(&config.bucket)
            .with_access_key_id(&config.access_key)
            .with_secret_access_key(&config.secret_key)
            .with_region(&config.region)
            .with_allow_http(config.endpoint_url.starts_with("http://"))
            .with_virtual_hosted_style_request(false)
            .build()?;

        let base = config
            .public_url
            .as_deref()
            .unwrap_or(&config.endpoint_url)
            .trim_end_matches('/');

        Ok(Self {
            store: Arc::new(store),
            link_prefix: format!("{}/{}", base, config.bucket),
        })
    }

    /// In-process store, for tests and local runs without S3.
    pub fn in_memory(link_prefix: &str) -> Self {
        Self {
            store: Arc::new(InMemory::new()),
            link_prefix: link_prefix.trim_end_matches('/').to_owned(),
        }
    }

    /// Write `data` under a fresh random name derived from `filename`.
    pub async fn upload(&self, filename: &str, data: Bytes) -> Result<StoredObject, StorageError> {
        let key = object_name(filename);
        let size = data.len();

        self.store
            .put(&Path::from(key.as_str()), PutPayload::from(data))
            .await?;

        tracing::debug!(key = %key, size, "stored media object");
        Ok(StoredObject {
            link: self.link_for(&key),
            key,
        })
    }

    /// Read an object back.
    pub async fn get(&self, key: &str) -> Result<Bytes, StorageError> {
        let result = self.store.get(&Path::from(key)).await?;
        Ok(result.bytes().await?)
    }

    /// Delete a single object. Deleting a missing object succeeds.
    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        match self.store.delete(&Path::from(key)).await {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete several objects, stopping at the first hard failure.
    pub async fn delete_many<S: AsRef<str>>(&self, keys: &[S]) -> Result<(), StorageError> {
        for key in keys {
            self.delete(key.as_ref()).await?;
        }
        Ok(())
    }

    /// Public link for an object key.
    pub fn link_for(&self, key: &str) -> String {
        format!("{}/{}", self.link_prefix, key)
    }
}

/// Random object name: md5 of the original name plus a random salt, keeping
/// the original extension when there is one.
pub fn object_name(filename: &str) -> String {
    let mut rng = rand::thread_rng();
    let salt: String = (0..SALT_LEN)
        .map(|_| SALT_CHARSET[rng.gen_range(0..SALT_CHARSET.len())] as char)
        .collect();

    let digest = md5::compute(format!("{}{}", filename, salt));

    match extension(filename) {
        Some(ext) => format!("{:x}.{}", digest, ext),
        None => format!("{:x}", digest),
    }
}

/// Object name from a stored link (its last path segment).
pub fn name_from_link(link: &str) -> &str {
    link.rsplit('/').next().unwrap_or(link)
}

fn extension(filename: &str) -> Option<&str> {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    match base.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && !ext.is_empty()
                && ext.len() <= 10
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            Some(ext)
        }
        _ => None,
    }
}
