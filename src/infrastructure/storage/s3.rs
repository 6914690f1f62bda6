//! S3-compatible object store (AWS S3, MinIO)

use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use bytes::Bytes;
use tracing::{debug, instrument};

use crate::config::ObjectStoreConfig;
use crate::domain::DomainError;
use crate::domain::storage::{ObjectStat, ObjectStore};

#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
}

impl S3ObjectStore {
    /// Build a client from config.
    ///
    /// Static credentials are used when both keys are set, otherwise the
    /// ambient AWS credential chain. Path-style addressing is required for MinIO.
    pub async fn new(config: &ObjectStoreConfig) -> Result<Self, DomainError> {
        let region = aws_config::Region::new(config.region.clone());

        let mut builder = match (&config.access_key, &config.secret_key) {
            (Some(access_key), Some(secret_key)) => {
                let credentials = aws_sdk_s3::config::Credentials::new(
                    access_key,
                    secret_key,
                    None,
                    None,
                    "model-dashboard-config",
                );
                aws_sdk_s3::config::Builder::new()
                    .behavior_version(BehaviorVersion::latest())
                    .region(region)
                    .credentials_provider(credentials)
            }
            (None, None) => {
                let shared = aws_config::defaults(BehaviorVersion::latest())
                    .region(region)
                    .load()
                    .await;
                aws_sdk_s3::config::Builder::from(&shared)
            }
            _ => {
                return Err(DomainError::configuration(
                    "object_store requires both access_key and secret_key when either is set",
                ));
            }
        };

        if let Some(endpoint) = config.endpoint.as_deref().filter(|e| !e.is_empty()) {
            builder = builder.endpoint_url(normalize_endpoint(endpoint));
        }

        if config.force_path_style {
            builder = builder.force_path_style(true);
        }

        Ok(Self {
            client: Client::from_conf(builder.build()),
            bucket: config.bucket.clone(),
        })
    }
}

/// Bare `host:port` endpoints are treated as plain HTTP
fn normalize_endpoint(endpoint: &str) -> String {
    let lower = endpoint.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        endpoint.to_string()
    } else {
        format!("http://{}", endpoint)
    }
}

fn is_not_found<E>(err: &SdkError<E>) -> bool {
    match err {
        SdkError::ServiceError(service_err) => service_err.raw().status().as_u16() == 404,
        _ => false,
    }
}

fn storage_error<E>(action: &str, key: &str, err: E) -> DomainError
where
    E: std::error::Error,
{
    DomainError::storage(format!(
        "Failed to {} '{}': {}",
        action,
        key,
        DisplayErrorContext(&err)
    ))
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn list(&self, prefix: &str) -> Result<Vec<String>, DomainError> {
        let mut keys = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix);

            if let Some(token) = continuation_token.take() {
                request = request.continuation_token(token);
            }

            let output = request
                .send()
                .await
                .map_err(|e| storage_error("list objects under", prefix, e))?;

            keys.extend(
                output
                    .contents()
                    .iter()
                    .filter_map(|object| object.key().map(str::to_string)),
            );

            if output.is_truncated() == Some(true) {
                continuation_token = output.next_continuation_token().map(str::to_string);
                if continuation_token.is_none() {
                    break;
                }
            } else {
                break;
            }
        }

        debug!(count = keys.len(), "Listed objects");
        Ok(keys)
    }

    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn stat(&self, key: &str) -> Result<Option<ObjectStat>, DomainError> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(output) => Ok(Some(ObjectStat {
                size: output.content_length().unwrap_or(0).max(0) as u64,
                metadata: output.metadata().cloned().unwrap_or_default(),
            })),
            Err(err) if is_not_found(&err) => Ok(None),
            Err(err) => Err(storage_error("stat", key, err)),
        }
    }

    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn get(&self, key: &str) -> Result<Bytes, DomainError> {
        let output = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(output) => output,
            Err(err) if is_not_found(&err) => {
                return Err(DomainError::not_found(format!("Object '{}' not found", key)));
            }
            Err(err) => return Err(storage_error("get", key, err)),
        };

        let body = output
            .body
            .collect()
            .await
            .map_err(|e| storage_error("read body of", key, e))?;

        Ok(body.into_bytes())
    }

    #[instrument(skip(self, body, metadata), fields(bucket = %self.bucket, size = body.len()))]
    async fn put(
        &self,
        key: &str,
        body: Bytes,
        metadata: HashMap<String, String>,
    ) -> Result<(), DomainError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type("application/json")
            .set_metadata(Some(metadata))
            .body(body.into())
            .send()
            .await
            .map_err(|e| storage_error("put", key, e))?;

        Ok(())
    }

    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn delete(&self, key: &str) -> Result<(), DomainError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| storage_error("delete", key, e))?;

        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "s3"
    }
}
