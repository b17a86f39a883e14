//! S3 bucket state store
//!
//! Provisions the bucket the engine persists stack state in, enforces
//! security defaults on first creation, and performs the version-aware
//! forced deletion. A versioned bucket accumulates delete markers when
//! current objects are deleted without a version qualifier, and the bucket
//! itself refuses deletion while any version or marker remains, so the purge
//! drains the current-object listing and the version listing in full before
//! the bucket delete is issued.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::{Credentials, Region};
use log::{debug, error};

use galley_core::engine::Engine;
use galley_core::naming::sanitize_name;

use crate::objects::{ObjectStorage, S3ObjectStorage, VersionMarker};
use crate::store::{StateStore, StoreError, StoreResult};

const ENV_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
const ENV_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
const ENV_SESSION_TOKEN: &str = "AWS_SESSION_TOKEN";
const ENV_DEFAULT_REGION: &str = "AWS_DEFAULT_REGION";

/// Region used when none is configured
pub const DEFAULT_REGION: &str = "eu-central-1";

/// Static credentials for the storage API
#[derive(Debug, Clone)]
pub struct S3Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

/// Configuration for an S3-backed state store
#[derive(Debug, Clone)]
pub struct S3StoreConfig {
    /// Base name; the bucket is named `<sanitized-base>-state`
    pub base_name: String,
    /// Region the bucket is created in
    pub region: String,
    /// Tags applied once, on first creation of the bucket
    pub tags: HashMap<String, String>,
    /// Explicit credentials; `None` leaves the SDK's default chain in charge
    pub credentials: Option<S3Credentials>,
}

impl S3StoreConfig {
    /// Configuration with an explicit region and no static credentials.
    pub fn new(
        base_name: impl Into<String>,
        region: impl Into<String>,
        tags: HashMap<String, String>,
    ) -> Self {
        Self {
            base_name: base_name.into(),
            region: region.into(),
            tags,
            credentials: None,
        }
    }

    /// Read credentials and region from the well-known environment
    /// variables, once. The region falls back to [`DEFAULT_REGION`].
    pub fn from_env(base_name: impl Into<String>, tags: HashMap<String, String>) -> Self {
        let credentials = match (
            std::env::var(ENV_ACCESS_KEY_ID),
            std::env::var(ENV_SECRET_ACCESS_KEY),
        ) {
            (Ok(access_key_id), Ok(secret_access_key)) => Some(S3Credentials {
                access_key_id,
                secret_access_key,
                session_token: std::env::var(ENV_SESSION_TOKEN).ok(),
            }),
            _ => None,
        };

        let region = std::env::var(ENV_DEFAULT_REGION)
            .ok()
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        Self {
            base_name: base_name.into(),
            region,
            tags,
            credentials,
        }
    }
}

/// S3 bucket-backed state store
pub struct S3StateStore {
    config: S3StoreConfig,
    bucket: String,
    storage: Arc<dyn ObjectStorage>,
    engine: Arc<dyn Engine>,
}

impl S3StateStore {
    /// Build a store talking to the real S3 API.
    pub async fn connect(config: S3StoreConfig, engine: Arc<dyn Engine>) -> StoreResult<Self> {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));

        if let Some(credentials) = &config.credentials {
            loader = loader.credentials_provider(Credentials::new(
                credentials.access_key_id.clone(),
                credentials.secret_access_key.clone(),
                credentials.session_token.clone(),
                None,
                "galley-state",
            ));
        }

        let aws_config = loader.load().await;
        let storage = Arc::new(S3ObjectStorage::new(Client::new(&aws_config)));

        Self::with_storage(config, storage, engine)
    }

    /// Build a store over any [`ObjectStorage`] implementation.
    pub fn with_storage(
        config: S3StoreConfig,
        storage: Arc<dyn ObjectStorage>,
        engine: Arc<dyn Engine>,
    ) -> StoreResult<Self> {
        let base = sanitize_name(&config.base_name);
        if base.is_empty() {
            return Err(StoreError::configuration(
                "state store base name sanitizes to empty",
            ));
        }

        let bucket = format!("{}-state", base);

        Ok(Self {
            config,
            bucket,
            storage,
            engine,
        })
    }

    /// The derived bucket name.
    pub fn bucket_name(&self) -> &str {
        &self.bucket
    }

    fn state_uri(&self) -> String {
        format!("s3://{}", self.bucket)
    }

    /// Existence is decided by exact name match over the bucket listing,
    /// not by probing.
    async fn bucket_exists(&self) -> StoreResult<bool> {
        let buckets = self.storage.list_buckets().await?;
        Ok(buckets.iter().any(|name| name == &self.bucket))
    }

    /// Create the bucket and apply the first-creation-only defaults: the
    /// configured tag set (when any) and AES-256 server-side encryption.
    async fn create_bucket(&self) -> StoreResult<()> {
        debug!(
            "creating state bucket {} in {}",
            self.bucket, self.config.region
        );

        self.storage
            .create_bucket(&self.bucket, &self.config.region)
            .await?;

        if !self.config.tags.is_empty() {
            debug!(
                "tagging state bucket {} with {} tags",
                self.bucket,
                self.config.tags.len()
            );
            self.storage
                .put_bucket_tagging(&self.bucket, &self.config.tags)
                .await?;
        }

        debug!("applying default encryption to state bucket {}", self.bucket);
        self.storage.put_bucket_encryption(&self.bucket).await?;

        Ok(())
    }

    async fn delete_object(&self, key: &str, version_id: Option<&str>) -> StoreResult<()> {
        debug!(
            "deleting object {}/{} (version {})",
            self.bucket,
            key,
            version_id.unwrap_or("current")
        );

        self.storage
            .delete_object(&self.bucket, key, version_id)
            .await
            .map_err(|e| {
                error!("failed to delete object {}/{}: {}", self.bucket, key, e);
                StoreError::object_delete_failed(key, version_id, e.to_string())
            })
    }

    /// Remove every current object, then every delete marker and object
    /// version.
    ///
    /// Each listing page is fully processed before the next one is
    /// requested; tokens and markers are only valid relative to the listing
    /// call that produced them. The two passes are independent and
    /// individually idempotent. A single failed delete aborts the purge;
    /// the bucket is then partially purged and must be re-listed before any
    /// retry.
    async fn purge(&self) -> StoreResult<()> {
        let mut token: Option<String> = None;
        loop {
            let page = self
                .storage
                .list_objects(&self.bucket, token.as_deref())
                .await?;

            for key in &page.keys {
                self.delete_object(key, None).await?;
            }

            match page.next_token {
                Some(next) => token = Some(next),
                None => break,
            }
        }

        let mut marker: Option<VersionMarker> = None;
        loop {
            let page = self
                .storage
                .list_object_versions(&self.bucket, marker.as_ref())
                .await?;

            for item in page.delete_markers.iter().chain(page.versions.iter()) {
                self.delete_object(&item.key, item.version_id.as_deref())
                    .await?;
            }

            match page.next {
                Some(next) => marker = Some(next),
                None => break,
            }
        }

        Ok(())
    }
}

#[async_trait]
impl StateStore for S3StateStore {
    async fn open(&self) -> StoreResult<String> {
        if !self.bucket_exists().await? {
            self.create_bucket().await?;
        }

        // A bucket present in the listing can still be unreachable for
        // these credentials; probe unconditionally.
        match self.storage.head_bucket(&self.bucket).await {
            Ok(()) => {}
            Err(err @ StoreError::BucketNotFound(_)) => {
                error!("state bucket {} not found after provisioning", self.bucket);
                return Err(err);
            }
            Err(err) => {
                error!("state bucket {} is not accessible: {}", self.bucket, err);
                return Err(err);
            }
        }

        let uri = self.state_uri();
        self.engine.login(&uri).await?;

        debug!("opened state bucket {} as {}", self.bucket, uri);

        Ok(uri)
    }

    async fn close(&self) -> StoreResult<()> {
        self.storage.head_bucket(&self.bucket).await?;

        let uri = self.state_uri();
        self.engine.logout(&uri).await?;

        Ok(())
    }

    async fn delete(&self, force: bool) -> StoreResult<()> {
        self.close().await?;

        if force {
            debug!("purging state bucket {}", self.bucket);
            self.purge().await?;
        }

        self.storage.delete_bucket(&self.bucket).await?;

        debug!("deleted state bucket {}", self.bucket);

        Ok(())
    }
}
