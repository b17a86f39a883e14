//! Object storage operations used by the bucket-backed state store
//!
//! The purge algorithm in `stores::s3` runs against the [`ObjectStorage`]
//! trait rather than the SDK client directly, so it can be exercised against
//! an in-memory implementation with arbitrary page sizes.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::ProvideErrorMetadata;
use aws_sdk_s3::types::{
    BucketLocationConstraint, CreateBucketConfiguration, ServerSideEncryption,
    ServerSideEncryptionByDefault, ServerSideEncryptionConfiguration, ServerSideEncryptionRule,
    Tag, Tagging,
};

use crate::store::{StoreError, StoreResult};

/// One page of the current-object listing
///
/// `next_token` is present only while the listing is truncated, and is valid
/// only relative to the listing call that produced it. A listing cannot be
/// resumed mid-stream after a failure; re-list from the start.
#[derive(Debug, Clone, Default)]
pub struct ObjectPage {
    pub keys: Vec<String>,
    pub next_token: Option<String>,
}

/// Marker pair driving the version listing; both values advance together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionMarker {
    pub key_marker: String,
    pub version_id_marker: String,
}

/// A single object version or delete marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectVersionRef {
    pub key: String,
    pub version_id: Option<String>,
}

/// One page of the version listing.
#[derive(Debug, Clone, Default)]
pub struct VersionPage {
    pub versions: Vec<ObjectVersionRef>,
    pub delete_markers: Vec<ObjectVersionRef>,
    pub next: Option<VersionMarker>,
}

/// The object-storage operations the bucket-backed state store consumes
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Names of all buckets visible to the credentials
    async fn list_buckets(&self) -> StoreResult<Vec<String>>;

    /// Probe the bucket: `Ok(())` when reachable, `BucketNotFound` when it
    /// does not exist, `Inaccessible` when it exists but cannot be reached
    async fn head_bucket(&self, bucket: &str) -> StoreResult<()>;

    /// Create the bucket in the given region
    async fn create_bucket(&self, bucket: &str, region: &str) -> StoreResult<()>;

    /// Replace the bucket's tag set
    async fn put_bucket_tagging(
        &self,
        bucket: &str,
        tags: &HashMap<String, String>,
    ) -> StoreResult<()>;

    /// Enforce AES-256 server-side encryption as the bucket default
    async fn put_bucket_encryption(&self, bucket: &str) -> StoreResult<()>;

    /// One page of current objects, continuing from `token`
    async fn list_objects(&self, bucket: &str, token: Option<&str>) -> StoreResult<ObjectPage>;

    /// One page of object versions and delete markers, continuing from
    /// `marker`
    async fn list_object_versions(
        &self,
        bucket: &str,
        marker: Option<&VersionMarker>,
    ) -> StoreResult<VersionPage>;

    /// Delete one object, or one exact version when `version_id` is given
    ///
    /// Deleting an absent key is not an error.
    async fn delete_object(
        &self,
        bucket: &str,
        key: &str,
        version_id: Option<&str>,
    ) -> StoreResult<()>;

    /// Delete the empty bucket; refused with `NotEmpty` while any object
    /// version or delete marker remains
    async fn delete_bucket(&self, bucket: &str) -> StoreResult<()>;
}

/// [`ObjectStorage`] backed by the AWS S3 API
pub struct S3ObjectStorage {
    client: Client,
}

impl S3ObjectStorage {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectStorage for S3ObjectStorage {
    async fn list_buckets(&self) -> StoreResult<Vec<String>> {
        let out = self
            .client
            .list_buckets()
            .send()
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?;

        Ok(out
            .buckets()
            .iter()
            .filter_map(|b| b.name().map(str::to_string))
            .collect())
    }

    async fn head_bucket(&self, bucket: &str) -> StoreResult<()> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(()),
            Err(err) => {
                let not_found = err.as_service_error().is_some_and(|e| e.is_not_found())
                    || err.raw_response().is_some_and(|r| r.status().as_u16() == 404);
                if not_found {
                    Err(StoreError::BucketNotFound(bucket.to_string()))
                } else {
                    Err(StoreError::inaccessible(bucket, err.to_string()))
                }
            }
        }
    }

    async fn create_bucket(&self, bucket: &str, region: &str) -> StoreResult<()> {
        let mut request = self.client.create_bucket().bucket(bucket);

        // us-east-1 is the one region that rejects an explicit constraint
        if region != "us-east-1" {
            let constraint = BucketLocationConstraint::from(region);
            let config = CreateBucketConfiguration::builder()
                .location_constraint(constraint)
                .build();
            request = request.create_bucket_configuration(config);
        }

        request
            .send()
            .await
            .map_err(|e| StoreError::BucketCreationFailed {
                bucket: bucket.to_string(),
                message: e.to_string(),
            })?;

        Ok(())
    }

    async fn put_bucket_tagging(
        &self,
        bucket: &str,
        tags: &HashMap<String, String>,
    ) -> StoreResult<()> {
        let mut tag_set = Vec::with_capacity(tags.len());
        for (key, value) in tags {
            let tag = Tag::builder()
                .key(key)
                .value(value)
                .build()
                .map_err(|e| StoreError::Storage(e.to_string()))?;
            tag_set.push(tag);
        }

        let tagging = Tagging::builder()
            .set_tag_set(Some(tag_set))
            .build()
            .map_err(|e| StoreError::Storage(e.to_string()))?;

        self.client
            .put_bucket_tagging()
            .bucket(bucket)
            .tagging(tagging)
            .send()
            .await
            .map_err(|e| StoreError::Storage(format!("Failed to tag bucket: {}", e)))?;

        Ok(())
    }

    async fn put_bucket_encryption(&self, bucket: &str) -> StoreResult<()> {
        let by_default = ServerSideEncryptionByDefault::builder()
            .sse_algorithm(ServerSideEncryption::Aes256)
            .build()
            .map_err(|e| StoreError::Storage(e.to_string()))?;

        let rule = ServerSideEncryptionRule::builder()
            .apply_server_side_encryption_by_default(by_default)
            .build();

        let config = ServerSideEncryptionConfiguration::builder()
            .rules(rule)
            .build()
            .map_err(|e| StoreError::Storage(e.to_string()))?;

        self.client
            .put_bucket_encryption()
            .bucket(bucket)
            .server_side_encryption_configuration(config)
            .send()
            .await
            .map_err(|e| StoreError::Storage(format!("Failed to apply encryption: {}", e)))?;

        Ok(())
    }

    async fn list_objects(&self, bucket: &str, token: Option<&str>) -> StoreResult<ObjectPage> {
        let mut request = self.client.list_objects_v2().bucket(bucket);
        if let Some(token) = token {
            request = request.continuation_token(token);
        }

        let out = request
            .send()
            .await
            .map_err(|e| StoreError::Storage(format!("Failed to list objects: {}", e)))?;

        let keys = out
            .contents()
            .iter()
            .filter_map(|o| o.key().map(str::to_string))
            .collect();

        let next_token = if out.is_truncated().unwrap_or(false) {
            out.next_continuation_token().map(str::to_string)
        } else {
            None
        };

        Ok(ObjectPage { keys, next_token })
    }

    async fn list_object_versions(
        &self,
        bucket: &str,
        marker: Option<&VersionMarker>,
    ) -> StoreResult<VersionPage> {
        let mut request = self.client.list_object_versions().bucket(bucket);
        if let Some(marker) = marker {
            request = request
                .key_marker(&marker.key_marker)
                .version_id_marker(&marker.version_id_marker);
        }

        let out = request
            .send()
            .await
            .map_err(|e| StoreError::Storage(format!("Failed to list object versions: {}", e)))?;

        let versions = out
            .versions()
            .iter()
            .filter_map(|v| {
                v.key().map(|key| ObjectVersionRef {
                    key: key.to_string(),
                    version_id: v.version_id().map(str::to_string),
                })
            })
            .collect();

        let delete_markers = out
            .delete_markers()
            .iter()
            .filter_map(|m| {
                m.key().map(|key| ObjectVersionRef {
                    key: key.to_string(),
                    version_id: m.version_id().map(str::to_string),
                })
            })
            .collect();

        let next = if out.is_truncated().unwrap_or(false) {
            match (out.next_key_marker(), out.next_version_id_marker()) {
                (Some(key), Some(version)) => Some(VersionMarker {
                    key_marker: key.to_string(),
                    version_id_marker: version.to_string(),
                }),
                _ => None,
            }
        } else {
            None
        };

        Ok(VersionPage {
            versions,
            delete_markers,
            next,
        })
    }

    async fn delete_object(
        &self,
        bucket: &str,
        key: &str,
        version_id: Option<&str>,
    ) -> StoreResult<()> {
        let mut request = self.client.delete_object().bucket(bucket).key(key);
        if let Some(version_id) = version_id {
            request = request.version_id(version_id);
        }

        request
            .send()
            .await
            .map_err(|e| StoreError::Storage(e.to_string()))?;

        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> StoreResult<()> {
        match self.client.delete_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(()),
            Err(err) => {
                if err.as_service_error().and_then(|e| e.code()) == Some("BucketNotEmpty") {
                    Err(StoreError::NotEmpty(bucket.to_string()))
                } else {
                    Err(StoreError::Storage(format!(
                        "Failed to delete bucket: {}",
                        err
                    )))
                }
            }
        }
    }
}
