use crate::keys::{file_key, join_url, validate_key};
use crate::traits::{Disk, DiskError, DiskResult, PutOptions};
use crate::DiskDriver;
use async_trait::async_trait;
use bytes::Bytes;
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::signer::Signer;
use object_store::Error as ObjectStoreError;
use object_store::{
    Attribute, Attributes, ObjectStore, ObjectStoreExt, PutOptions as ObjectPutOptions,
    PutPayload, Result as ObjectResult,
};
use std::path::PathBuf;
use std::time::Duration;

/// S3 disk implementation
#[derive(Clone, Debug)]
pub struct S3Disk {
    store: AmazonS3,
    bucket: String,
    region: String,
    endpoint_url: Option<String>, // Custom endpoint for S3-compatible providers
    public_url: Option<String>,
}

impl S3Disk {
    /// Create a new S3Disk instance
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    /// * `public_url` - Optional base URL (CDN) used instead of the bucket URL
    pub async fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
        public_url: Option<String>,
    ) -> DiskResult<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region.clone())
            .with_bucket_name(bucket.clone());

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| DiskError::ConfigError(e.to_string()))?;

        Ok(S3Disk {
            store,
            bucket,
            region,
            endpoint_url,
            public_url,
        })
    }

    /// Generate public URL for an S3 object
    ///
    /// A configured public URL wins. Otherwise S3-compatible providers use
    /// path-style `{endpoint}/{bucket}/{key}` and AWS uses
    /// `https://{bucket}.s3.{region}.amazonaws.com/{key}`.
    fn generate_url(&self, key: &str) -> String {
        if let Some(ref public_url) = self.public_url {
            return join_url(public_url, key);
        }

        if let Some(ref endpoint) = self.endpoint_url {
            let base_url = endpoint.trim_end_matches('/');
            format!("{}/{}/{}", base_url, self.bucket, key)
        } else {
            format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                self.bucket, self.region, key
            )
        }
    }
}

#[async_trait]
impl Disk for S3Disk {
    async fn put_as(
        &self,
        folder: &str,
        name: &str,
        data: Bytes,
        options: &PutOptions,
    ) -> DiskResult<String> {
        let key = file_key(folder, name);
        validate_key(&key)?;

        let size = data.len() as u64;
        let location = Path::from(key.clone());
        let start = std::time::Instant::now();

        let mut attributes = Attributes::new();
        if let Some(ref content_type) = options.content_type {
            attributes.insert(Attribute::ContentType, content_type.clone().into());
        }
        if options.visibility.is_some() {
            tracing::debug!(key = %key, "S3 disk ignores visibility, use bucket policies instead");
        }
        let put_options = ObjectPutOptions {
            attributes,
            ..Default::default()
        };

        let result: ObjectResult<_> = self
            .store
            .put_opts(&location, PutPayload::from(data), put_options)
            .await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 upload failed"
            );
            DiskError::UploadFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(key)
    }

    async fn get(&self, key: &str) -> DiskResult<Bytes> {
        validate_key(key)?;
        let location = Path::from(key.to_string());

        let result: ObjectResult<_> = self.store.get(&location).await;

        let result = result.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => DiskError::NotFound(key.to_string()),
            other => DiskError::DownloadFailed(other.to_string()),
        })?;

        result
            .bytes()
            .await
            .map_err(|e| DiskError::DownloadFailed(e.to_string()))
    }

    async fn delete(&self, key: &str) -> DiskResult<bool> {
        validate_key(key)?;
        if !self.exists(key).await? {
            tracing::debug!(bucket = %self.bucket, key = %key, "S3 delete skipped, object missing");
            return Ok(false);
        }

        let start = std::time::Instant::now();
        let location = Path::from(key.to_string());

        let result: ObjectResult<_> = self.store.delete(&location).await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %key,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 delete failed"
            );
            DiskError::DeleteFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 delete successful"
        );

        Ok(true)
    }

    async fn exists(&self, key: &str) -> DiskResult<bool> {
        validate_key(key)?;
        let location = Path::from(key.to_string());
        match self.store.head(&location).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(DiskError::BackendError(e.to_string())),
        }
    }

    fn url(&self, key: &str) -> DiskResult<String> {
        validate_key(key)?;
        Ok(self.generate_url(key))
    }

    async fn temporary_url(&self, key: &str, expires_in: Duration) -> DiskResult<String> {
        validate_key(key)?;
        let location = Path::from(key.to_string());
        let url_result: ObjectResult<_> = self
            .store
            .signed_url(Method::GET, &location, expires_in)
            .await;

        let url = url_result
            .map_err(|e| DiskError::BackendError(e.to_string()))?
            .to_string();

        Ok(url)
    }

    fn path(&self, _key: &str) -> DiskResult<PathBuf> {
        Err(DiskError::Unsupported {
            driver: DiskDriver::S3,
            operation: "path",
        })
    }

    fn driver(&self) -> DiskDriver {
        DiskDriver::S3
    }
}
