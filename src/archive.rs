//! Best-effort archival of original uploads for later retraining.
//!
//! A failed write is logged and otherwise ignored; it never affects the
//! prediction that was already computed.

use crate::config::ArchiveConfig;
use crate::error::ArchiveError;
use crate::image_io;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

const UPLOAD_TIMEOUT: Duration = Duration::from_secs(10);

/// A bucket-like store accepting one object per key
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` under `key`, returning where it ended up
    fn put(&self, key: &str, bytes: &[u8]) -> Result<String, ArchiveError>;
}

/// A local directory standing in for a bucket
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ObjectStore for FsObjectStore {
    fn put(&self, key: &str, bytes: &[u8]) -> Result<String, ArchiveError> {
        std::fs::create_dir_all(&self.root)?;
        let path = self.root.join(key);
        std::fs::write(&path, bytes)?;
        Ok(path.display().to_string())
    }
}

/// Plain HTTP PUT to `{endpoint}/{bucket}/{key}` (S3-compatible gateways,
/// presigned proxies)
pub struct HttpObjectStore {
    client: reqwest::blocking::Client,
    endpoint: String,
    bucket: String,
    token: Option<String>,
}

impl HttpObjectStore {
    pub fn new(
        endpoint: impl Into<String>,
        bucket: impl Into<String>,
        token: Option<String>,
    ) -> Result<Self, ArchiveError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(UPLOAD_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            bucket: bucket.into(),
            token,
        })
    }

    fn object_url(&self, key: &str) -> String {
        format!(
            "{}/{}/{}",
            self.endpoint.trim_end_matches('/'),
            self.bucket,
            key
        )
    }
}

impl ObjectStore for HttpObjectStore {
    fn put(&self, key: &str, bytes: &[u8]) -> Result<String, ArchiveError> {
        let url = self.object_url(key);
        let mut request = self.client.put(&url).body(bytes.to_vec());
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(ArchiveError::Rejected {
                key: key.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(url)
    }
}

/// Object key for an upload: `digit<labels>__<uuid>.<ext>`
pub fn archive_key(prediction: &str, bytes: &[u8]) -> String {
    format!(
        "digit{}__{}.{}",
        prediction.replace(' ', "_"),
        uuid::Uuid::new_v4(),
        image_io::extension_for(bytes)
    )
}

/// Sends each upload to the configured store, if any
pub struct Archiver {
    store: Option<Box<dyn ObjectStore>>,
}

impl Archiver {
    pub fn disabled() -> Self {
        Self { store: None }
    }

    pub fn new(store: Box<dyn ObjectStore>) -> Self {
        Self { store: Some(store) }
    }

    pub fn from_config(config: &ArchiveConfig) -> Result<Self, ArchiveError> {
        let archiver = match config {
            ArchiveConfig::Disabled => Self::disabled(),
            ArchiveConfig::Filesystem { directory } => {
                Self::new(Box::new(FsObjectStore::new(directory.clone())))
            }
            ArchiveConfig::Http {
                endpoint,
                bucket,
                token_env,
            } => {
                let token = std::env::var(token_env).ok();
                Self::new(Box::new(HttpObjectStore::new(
                    endpoint.clone(),
                    bucket.clone(),
                    token,
                )?))
            }
        };
        Ok(archiver)
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    /// Store the upload under a label-bearing key; `None` if disabled or the
    /// write failed
    pub fn archive(&self, bytes: &[u8], prediction: &str) -> Option<String> {
        let store = self.store.as_ref()?;
        let key = archive_key(prediction, bytes);

        match store.put(&key, bytes) {
            Ok(location) => {
                info!(key = %key, location = %location, "archived upload");
                Some(key)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "failed to archive upload");
                None
            }
        }
    }
}
