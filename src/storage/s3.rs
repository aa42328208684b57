//! S3-compatible object store backed by the AWS SDK
//!
//! Works against Cloudflare R2, MinIO and AWS S3. Credentials are static and
//! come from [`StorageSettings`]; nothing is read from the AWS profile chain.

use std::path::Path;

use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{Delete, ObjectIdentifier};
use aws_sdk_s3::Client;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::{ObjectInfo, ObjectPage, ObjectStore};
use crate::config::StorageSettings;
use crate::error::{BackupError, BackupResult};

/// Object store client for one S3-compatible endpoint
#[derive(Debug, Clone)]
pub struct S3Store {
    client: Client,
}

impl S3Store {
    /// Build a client from storage settings
    pub fn new(settings: &StorageSettings) -> Self {
        let credentials = Credentials::new(
            settings.access_key_id.clone(),
            settings.secret_access_key.clone(),
            None,
            None,
            "gamevault-backup",
        );

        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()))
            .endpoint_url(&settings.endpoint)
            .credentials_provider(credentials)
            .force_path_style(settings.force_path_style)
            .build();

        debug!("S3 client initialized for {}", settings.endpoint);

        Self {
            client: Client::from_conf(config),
        }
    }
}

fn storage_error<E>(operation: &str, target: &str, err: E) -> BackupError
where
    E: std::error::Error + 'static,
{
    BackupError::Storage(format!(
        "{} {} failed: {}",
        operation,
        target,
        DisplayErrorContext(err)
    ))
}

fn to_utc(timestamp: Option<&aws_sdk_s3::primitives::DateTime>) -> DateTime<Utc> {
    timestamp
        .and_then(|t| DateTime::from_timestamp(t.secs(), t.subsec_nanos()))
        .unwrap_or_default()
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn list_page(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        continuation_token: Option<String>,
    ) -> BackupResult<ObjectPage> {
        let output = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .set_prefix(prefix.map(str::to_string))
            .set_continuation_token(continuation_token)
            .send()
            .await
            .map_err(|e| storage_error("list", bucket, e))?;

        let objects = output
            .contents()
            .iter()
            .filter_map(|object| {
                let key = object.key()?;
                Some(ObjectInfo {
                    key: key.to_string(),
                    size: object.size().unwrap_or(0).max(0) as u64,
                    last_modified: to_utc(object.last_modified()),
                })
            })
            .collect();

        Ok(ObjectPage {
            objects,
            next_token: output.next_continuation_token().map(str::to_string),
        })
    }

    async fn get_object(&self, bucket: &str, key: &str) -> BackupResult<Vec<u8>> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| storage_error("get", key, e))?;

        let data = output
            .body
            .collect()
            .await
            .map_err(|e| storage_error("read body of", key, e))?;

        Ok(data.into_bytes().to_vec())
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> BackupResult<()> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| storage_error("put", key, e))?;
        Ok(())
    }

    async fn put_file(
        &self,
        bucket: &str,
        key: &str,
        path: &Path,
        content_type: &str,
    ) -> BackupResult<()> {
        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| storage_error("open", &path.display().to_string(), e))?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| storage_error("put", key, e))?;
        Ok(())
    }

    async fn delete_objects(&self, bucket: &str, keys: &[String]) -> BackupResult<usize> {
        if keys.is_empty() {
            return Ok(0);
        }

        let objects = keys
            .iter()
            .map(|key| ObjectIdentifier::builder().key(key).build())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| storage_error("build delete request for", bucket, e))?;

        let delete = Delete::builder()
            .set_objects(Some(objects))
            .quiet(false)
            .build()
            .map_err(|e| storage_error("build delete request for", bucket, e))?;

        let output = self
            .client
            .delete_objects()
            .bucket(bucket)
            .delete(delete)
            .send()
            .await
            .map_err(|e| storage_error("batch delete in", bucket, e))?;

        for error in output.errors() {
            warn!(
                "Failed to delete {}: {}",
                error.key().unwrap_or("<unknown>"),
                error.message().unwrap_or("no message")
            );
        }

        Ok(output.deleted().len())
    }

    async fn head_bucket(&self, bucket: &str) -> BackupResult<bool> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(err) => {
                let missing = err.as_service_error().map_or(false, |e| e.is_not_found())
                    || err
                        .raw_response()
                        .map_or(false, |r| r.status().as_u16() == 404);
                if missing {
                    Ok(false)
                } else {
                    Err(storage_error("head", bucket, err))
                }
            }
        }
    }

    async fn create_bucket(&self, bucket: &str) -> BackupResult<()> {
        self.client
            .create_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| storage_error("create bucket", bucket, e))?;
        Ok(())
    }
}
