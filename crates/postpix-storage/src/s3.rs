use crate::traits::{validate_key, FetchedObject, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use object_store::aws::AmazonS3Builder;
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::{
    Attribute, AttributeValue, Attributes, GetOptions, ObjectStore, PutOptions, PutPayload,
    Result as ObjectResult,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// S3 storage implementation
///
/// object_store binds a client to one bucket, so a client is built on first use of each
/// bucket and cached for the rest of the process.
pub struct S3Storage {
    region: String,
    endpoint_url: Option<String>, // Custom endpoint for S3-compatible providers
    stores: Mutex<HashMap<String, Arc<dyn ObjectStore>>>,
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:4566" for LocalStack, "http://localhost:9000" for MinIO)
    pub fn new(region: String, endpoint_url: Option<String>) -> Self {
        S3Storage {
            region,
            endpoint_url,
            stores: Mutex::new(HashMap::new()),
        }
    }

    /// Use a pre-built object store for `bucket` instead of building one from the environment.
    pub fn register_bucket(&self, bucket: impl Into<String>, store: Arc<dyn ObjectStore>) {
        if let Ok(mut stores) = self.stores.lock() {
            stores.insert(bucket.into(), store);
        }
    }

    fn store_for(&self, bucket: &str) -> StorageResult<Arc<dyn ObjectStore>> {
        let mut stores = self
            .stores
            .lock()
            .map_err(|_| StorageError::ConfigError("S3 client cache poisoned".to_string()))?;

        if let Some(store) = stores.get(bucket) {
            return Ok(Arc::clone(store));
        }

        // Build AmazonS3 object store from environment and explicit settings.
        let mut builder = AmazonS3Builder::from_env()
            .with_region(self.region.clone())
            .with_bucket_name(bucket.to_string());

        if let Some(ref endpoint) = self.endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http)
                .with_virtual_hosted_style_request(false);
        }

        let store: Arc<dyn ObjectStore> = Arc::new(
            builder
                .build()
                .map_err(|e| StorageError::ConfigError(e.to_string()))?,
        );

        tracing::debug!(bucket = %bucket, region = %self.region, "Built S3 client for bucket");
        stores.insert(bucket.to_string(), Arc::clone(&store));
        Ok(store)
    }

    /// Generate public URL for S3 object
    ///
    /// For AWS S3, uses the standard format: https://{bucket}.s3.{region}.amazonaws.com/{key}
    /// For S3-compatible providers, uses path-style: {endpoint}/{bucket}/{key}
    fn generate_url(&self, bucket: &str, key: &str) -> String {
        if let Some(ref endpoint) = self.endpoint_url {
            let base_url = endpoint.trim_end_matches('/');
            format!("{}/{}/{}", base_url, bucket, key)
        } else {
            format!("https://{}.s3.{}.amazonaws.com/{}", bucket, self.region, key)
        }
    }
}

/// Object location for a key exactly as the bucket names it.
///
/// `Path::from` percent-encodes characters such as `~` and `%`, which would address a
/// different object than the one the notification names.
fn object_location(key: &str) -> StorageResult<Path> {
    Path::parse(key)
        .map_err(|e| StorageError::InvalidKey(format!("Storage key '{}' is not usable: {}", key, e)))
}

#[async_trait]
impl Storage for S3Storage {
    async fn fetch(&self, bucket: &str, key: &str) -> StorageResult<FetchedObject> {
        validate_key(key)?;
        let store = self.store_for(bucket)?;
        let start = std::time::Instant::now();
        let location = object_location(key)?;

        let result: ObjectResult<_> = store.get_opts(&location, GetOptions::default()).await;

        let result = result.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            },
            other => {
                tracing::error!(
                    error = %other,
                    bucket = %bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 download failed"
                );
                StorageError::DownloadFailed(other.to_string())
            }
        })?;

        let content_type = result.attributes.get(&Attribute::ContentType).map(|value| {
            let value: &str = value.as_ref();
            value.to_string()
        });

        let data = result
            .bytes()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?;

        tracing::info!(
            bucket = %bucket,
            key = %key,
            size_bytes = data.len() as u64,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 download successful"
        );

        Ok(FetchedObject { data, content_type })
    }

    async fn store(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<String> {
        validate_key(key)?;
        let store = self.store_for(bucket)?;
        let size = data.len() as u64;
        let location = object_location(key)?;
        let start = std::time::Instant::now();

        let mut attributes = Attributes::new();
        attributes.insert(
            Attribute::ContentType,
            AttributeValue::from(content_type.to_string()),
        );
        let options = PutOptions {
            attributes,
            ..Default::default()
        };

        let result: ObjectResult<_> = store
            .put_opts(&location, PutPayload::from(data), options)
            .await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %bucket,
                key = %key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 upload failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        let url = self.generate_url(bucket, key);

        tracing::info!(
            bucket = %bucket,
            key = %key,
            content_type = %content_type,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(url)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use object_store::memory::InMemory;

    fn storage_with_memory_bucket(bucket: &str) -> S3Storage {
        let storage = S3Storage::new("eu-central-1".to_string(), None);
        storage.register_bucket(bucket, Arc::new(InMemory::new()));
        storage
    }

    #[test]
    fn test_public_url_formats() {
        let aws = S3Storage::new("us-east-1".to_string(), None);
        assert_eq!(
            aws.generate_url("in", "output/a.jpg"),
            "https://in.s3.us-east-1.amazonaws.com/output/a.jpg"
        );

        let localstack = S3Storage::new(
            "us-east-1".to_string(),
            Some("http://localhost:4566/".to_string()),
        );
        assert_eq!(
            localstack.generate_url("in", "output/a.jpg"),
            "http://localhost:4566/in/output/a.jpg"
        );
    }

    #[tokio::test]
    async fn test_store_then_fetch() {
        let storage = storage_with_memory_bucket("in");
        let url = storage
            .store("in", "output/a.jpg", Bytes::from_static(b"png-bytes"), "image/png")
            .await
            .unwrap();
        assert_eq!(url, "https://in.s3.eu-central-1.amazonaws.com/output/a.jpg");

        let fetched = storage.fetch("in", "output/a.jpg").await.unwrap();
        assert_eq!(fetched.data.as_ref(), b"png-bytes");
        assert_eq!(fetched.content_type.as_deref(), Some("image/png"));
    }

    #[tokio::test]
    async fn test_store_overwrites() {
        let storage = storage_with_memory_bucket("in");
        for body in [&b"first"[..], &b"second"[..]] {
            storage
                .store("in", "output/a.jpg", Bytes::copy_from_slice(body), "image/png")
                .await
                .unwrap();
        }
        let fetched = storage.fetch("in", "output/a.jpg").await.unwrap();
        assert_eq!(fetched.data.as_ref(), b"second");
    }

    #[tokio::test]
    async fn test_fetch_missing_object() {
        let storage = storage_with_memory_bucket("in");
        let err = storage.fetch("in", "input/missing.jpg").await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound { ref key, .. } if key == "input/missing.jpg"));
    }

    #[tokio::test]
    async fn test_keys_are_used_verbatim() {
        let memory = Arc::new(InMemory::new());
        let storage = S3Storage::new("us-east-1".to_string(), None);
        storage.register_bucket("in", memory.clone());

        // Uploaded by someone else, under the raw key.
        let raw = Path::parse("input/photo~1.jpg").unwrap();
        memory
            .put_opts(&raw, PutPayload::from_static(b"jpeg"), PutOptions::default())
            .await
            .unwrap();

        let fetched = storage.fetch("in", "input/photo~1.jpg").await.unwrap();
        assert_eq!(fetched.data.as_ref(), b"jpeg");

        let url = storage
            .store("in", "output/photo~1.jpg", Bytes::from_static(b"png"), "image/png")
            .await
            .unwrap();
        assert_eq!(url, "https://in.s3.us-east-1.amazonaws.com/output/photo~1.jpg");

        let written = memory
            .get_opts(&Path::parse("output/photo~1.jpg").unwrap(), GetOptions::default())
            .await
            .unwrap()
            .bytes()
            .await
            .unwrap();
        assert_eq!(written.as_ref(), b"png");
    }

    #[tokio::test]
    async fn test_unparseable_key_is_invalid() {
        let storage = storage_with_memory_bucket("in");
        let err = storage.fetch("in", "input//a.jpg").await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));
    }

    #[tokio::test]
    async fn test_rejects_traversal_keys() {
        let storage = storage_with_memory_bucket("in");
        let err = storage.fetch("in", "../x").await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));
    }
}
