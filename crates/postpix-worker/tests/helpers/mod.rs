//! In-memory collaborators for orchestrator tests.
//!
//! Every fake appends to a shared [`CallLog`] so tests can assert on the order in which
//! the pipeline touched its collaborators.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use postpix_core::{AckToken, PersistedPost, PostRecord, StorageBackend};
use postpix_db::{DbError, PostStore};
use postpix_processing::{ContentSource, ImageTransformer, MetadataSynthesizer};
use postpix_storage::{FetchedObject, Storage, StorageError, StorageResult};
use postpix_worker::{Orchestrator, PipelineConfig, SourceError, SourceMessage, WorkSource};

#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.entries().iter().filter(|e| e.starts_with(prefix)).count()
    }

    pub fn position(&self, prefix: &str) -> Option<usize> {
        self.entries().iter().position(|e| e.starts_with(prefix))
    }
}

/// EventBridge-style body for an object-created event.
pub fn notification(bucket: &str, key: &str) -> String {
    serde_json::json!({
        "version": "0",
        "detail-type": "Object Created",
        "source": "aws.s3",
        "detail": {
            "bucket": { "name": bucket },
            "object": { "key": key, "size": 1 }
        }
    })
    .to_string()
}

pub fn message(id: &str, body: String) -> SourceMessage {
    SourceMessage {
        message_id: id.to_string(),
        body,
        ack_token: AckToken::new(format!("rh-{}", id)),
        receive_count: Some(1),
    }
}

pub fn jpeg(width: u32, height: u32) -> Bytes {
    let img = DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    }));
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Jpeg)
        .unwrap();
    Bytes::from(buffer)
}

// --- Work source ---

pub struct QueueSource {
    log: CallLog,
    pending: Mutex<VecDeque<SourceMessage>>,
    pub fail_receive: bool,
    pub fail_ack: bool,
}

impl QueueSource {
    pub fn new(log: CallLog, messages: Vec<SourceMessage>) -> Self {
        Self {
            log,
            pending: Mutex::new(messages.into()),
            fail_receive: false,
            fail_ack: false,
        }
    }
}

#[async_trait]
impl WorkSource for QueueSource {
    async fn receive(&self) -> Result<Option<SourceMessage>, SourceError> {
        self.log.push("receive");
        if self.fail_receive {
            return Err(SourceError::Receive("connection refused".to_string()));
        }
        Ok(self.pending.lock().unwrap().pop_front())
    }

    async fn acknowledge(&self, token: &AckToken) -> Result<(), SourceError> {
        self.log.push(format!("ack {}", token.as_str()));
        if self.fail_ack {
            return Err(SourceError::Acknowledge("receipt handle expired".to_string()));
        }
        Ok(())
    }
}

// --- Object store ---

pub struct MemoryStorage {
    log: CallLog,
    objects: Mutex<HashMap<(String, String), (Bytes, String)>>,
    failing_store_keys: Mutex<HashSet<String>>,
}

impl MemoryStorage {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            objects: Mutex::new(HashMap::new()),
            failing_store_keys: Mutex::new(HashSet::new()),
        }
    }

    pub fn put(&self, bucket: &str, key: &str, data: Bytes, content_type: &str) {
        self.objects.lock().unwrap().insert(
            (bucket.to_string(), key.to_string()),
            (data, content_type.to_string()),
        );
    }

    pub fn get(&self, bucket: &str, key: &str) -> Option<(Bytes, String)> {
        self.objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    /// Make every `store` to `key` fail with a transient error.
    pub fn fail_store(&self, key: &str) {
        self.failing_store_keys
            .lock()
            .unwrap()
            .insert(key.to_string());
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn fetch(&self, bucket: &str, key: &str) -> StorageResult<FetchedObject> {
        self.log.push(format!("fetch {}/{}", bucket, key));
        self.get(bucket, key)
            .map(|(data, content_type)| FetchedObject {
                data,
                content_type: Some(content_type),
            })
            .ok_or_else(|| StorageError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }

    async fn store(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<String> {
        self.log.push(format!("store {}/{}", bucket, key));
        if self.failing_store_keys.lock().unwrap().contains(key) {
            return Err(StorageError::UploadFailed("503 Slow Down".to_string()));
        }
        self.put(bucket, key, data, content_type);
        Ok(format!("https://{}.s3.us-east-1.amazonaws.com/{}", bucket, key))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}

// --- Post store ---

pub struct MemoryPostStore {
    log: CallLog,
    rows: Mutex<Vec<PostRecord>>,
    next_id: AtomicUsize,
    pub fail_schema: bool,
    pub fail_insert: bool,
}

impl MemoryPostStore {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            rows: Mutex::new(Vec::new()),
            next_id: AtomicUsize::new(1),
            fail_schema: false,
            fail_insert: false,
        }
    }

    pub fn rows(&self) -> Vec<PostRecord> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl PostStore for MemoryPostStore {
    async fn ensure_schema(&self) -> Result<(), DbError> {
        self.log.push("ensure_schema");
        if self.fail_schema {
            return Err(DbError::Schema(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    async fn insert(&self, record: &PostRecord) -> Result<PersistedPost, DbError> {
        self.log.push(format!("insert {}", record.image_url));
        if self.fail_insert {
            return Err(DbError::Query(sqlx::Error::PoolClosed));
        }
        let created_at = Utc::now();
        self.rows.lock().unwrap().push(PostRecord {
            created_at: Some(created_at),
            ..record.clone()
        });
        Ok(PersistedPost {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) as i64,
            created_at,
        })
    }

    async fn close(&self) {
        self.log.push("close");
    }
}

// --- Content source ---

/// Always yields the same bytes and cycles through fixed tag indices.
pub struct FixedContent {
    next: AtomicUsize,
}

impl FixedContent {
    pub fn new() -> Self {
        Self {
            next: AtomicUsize::new(0),
        }
    }
}

impl ContentSource for FixedContent {
    fn fill_bytes(&self, buf: &mut [u8]) {
        buf.fill(0x5a);
    }

    fn index_below(&self, upper: usize) -> usize {
        self.next.fetch_add(1, Ordering::SeqCst) % upper
    }
}

/// Fakes wired into an orchestrator, sharing one call log.
pub struct Harness {
    pub log: CallLog,
    pub source: Arc<QueueSource>,
    pub storage: Arc<MemoryStorage>,
    pub posts: Arc<MemoryPostStore>,
}

impl Harness {
    pub fn new(messages: Vec<SourceMessage>) -> Self {
        Self::with(messages, |_, _| {})
    }

    /// Build fakes, letting the caller flip failure switches before they are shared.
    pub fn with<F>(messages: Vec<SourceMessage>, configure: F) -> Self
    where
        F: FnOnce(&mut QueueSource, &mut MemoryPostStore),
    {
        let log = CallLog::default();
        let mut source = QueueSource::new(log.clone(), messages);
        let mut posts = MemoryPostStore::new(log.clone());
        configure(&mut source, &mut posts);

        Self {
            storage: Arc::new(MemoryStorage::new(log.clone())),
            source: Arc::new(source),
            posts: Arc::new(posts),
            log,
        }
    }

    pub fn orchestrator(&self, config: PipelineConfig) -> Orchestrator {
        Orchestrator::new(
            self.source.clone(),
            self.storage.clone(),
            self.posts.clone(),
            ImageTransformer::default(),
            MetadataSynthesizer::new(Arc::new(FixedContent::new())),
            config,
        )
    }
}

pub fn batch(max_items_per_run: usize) -> PipelineConfig {
    PipelineConfig {
        output_bucket: None,
        max_items_per_run,
    }
}
