use async_trait::async_trait;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::info;

use super::{BlobStore, StorageError, StoredLocation};
use crate::config::S3Settings;

/// Object storage backend (MinIO locally, AWS S3 in production).
#[derive(Clone)]
pub struct S3BlobStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3BlobStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: String) -> Self {
        Self { client, bucket }
    }

    /// Constructs a client from static credentials and a custom endpoint.
    pub async fn from_settings(settings: &S3Settings) -> Self {
        let credentials = Credentials::new(
            &settings.access_key_id,
            &settings.secret_access_key,
            None,
            None,
            "eduhelp-static",
        );

        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()))
            .credentials_provider(credentials)
            .endpoint_url(&settings.endpoint)
            .load()
            .await;

        // MinIO needs path-style addressing.
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .build();

        Self::new(
            aws_sdk_s3::Client::from_conf(s3_config),
            settings.bucket.clone(),
        )
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    fn name(&self) -> &'static str {
        "s3"
    }

    fn handles(&self, location: &StoredLocation) -> bool {
        matches!(location, StoredLocation::Object { bucket, .. } if *bucket == self.bucket)
    }

    async fn put(
        &self,
        key: &str,
        bytes: Bytes,
        content_type: Option<&str>,
    ) -> Result<StoredLocation, StorageError> {
        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes));
        if let Some(ct) = content_type {
            request = request.content_type(ct);
        }
        request
            .send()
            .await
            .map_err(|e| StorageError::Backend(format!("S3 upload failed: {e}")))?;

        info!("Uploaded object to s3://{}/{}", self.bucket, key);
        Ok(StoredLocation::Object {
            bucket: self.bucket.clone(),
            key: key.to_string(),
        })
    }

    async fn delete(&self, location: &StoredLocation) -> Result<(), StorageError> {
        let StoredLocation::Object { bucket, key } = location else {
            return Err(StorageError::Unsupported(location.to_string()));
        };
        if *bucket != self.bucket {
            return Err(StorageError::Unsupported(location.to_string()));
        }
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::Backend(format!("S3 delete failed: {e}")))?;

        info!("Deleted object s3://{bucket}/{key}");
        Ok(())
    }
}
