//! In-memory object store used by tests
//!
//! Records every call so tests can assert on ordering and batching.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{ObjectInfo, ObjectPage, ObjectStore};
use crate::error::{BackupError, BackupResult};

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub content_type: String,
    pub last_modified: DateTime<Utc>,
}

#[derive(Default)]
struct State {
    buckets: HashMap<String, BTreeMap<String, StoredObject>>,
    calls: Vec<String>,
    delete_batches: Vec<usize>,
    failing_gets: HashSet<String>,
    fail_bucket_creation: bool,
}

pub struct MemoryStore {
    page_size: usize,
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_page_size(1000)
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            page_size,
            state: Mutex::new(State::default()),
        }
    }

    pub fn insert(&self, bucket: &str, key: &str, body: &[u8]) {
        self.insert_at(bucket, key, body, Utc::now());
    }

    pub fn insert_at(&self, bucket: &str, key: &str, body: &[u8], last_modified: DateTime<Utc>) {
        let mut state = self.state.lock().unwrap();
        state.buckets.entry(bucket.to_string()).or_default().insert(
            key.to_string(),
            StoredObject {
                body: body.to_vec(),
                content_type: "application/octet-stream".to_string(),
                last_modified,
            },
        );
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        let state = self.state.lock().unwrap();
        state.buckets.get(bucket)?.get(key).cloned()
    }

    pub fn keys(&self, bucket: &str) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state
            .buckets
            .get(bucket)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Count calls whose operation name (text before `:`) equals `op`
    pub fn call_count(&self, op: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.split(':').next() == Some(op))
            .count()
    }

    pub fn delete_batch_sizes(&self) -> Vec<usize> {
        self.state.lock().unwrap().delete_batches.clone()
    }

    pub fn fail_get(&self, key: &str) {
        self.state.lock().unwrap().failing_gets.insert(key.to_string());
    }

    pub fn fail_bucket_creation(&self) {
        self.state.lock().unwrap().fail_bucket_creation = true;
    }

    fn record(&self, call: String) {
        self.state.lock().unwrap().calls.push(call);
    }
}

fn no_such_bucket(bucket: &str) -> BackupError {
    BackupError::Storage(format!("NoSuchBucket: {}", bucket))
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list_page(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        continuation_token: Option<String>,
    ) -> BackupResult<ObjectPage> {
        self.record(format!("list:{}", bucket));
        let state = self.state.lock().unwrap();
        let objects = state.buckets.get(bucket).ok_or_else(|| no_such_bucket(bucket))?;

        let mut matching = objects
            .iter()
            .filter(|(key, _)| prefix.map_or(true, |p| key.starts_with(p)))
            .filter(|(key, _)| continuation_token.as_deref().map_or(true, |t| key.as_str() > t));

        let page: Vec<ObjectInfo> = matching
            .by_ref()
            .take(self.page_size)
            .map(|(key, object)| ObjectInfo {
                key: key.clone(),
                size: object.body.len() as u64,
                last_modified: object.last_modified,
            })
            .collect();

        let next_token = if matching.next().is_some() {
            page.last().map(|o| o.key.clone())
        } else {
            None
        };

        Ok(ObjectPage {
            objects: page,
            next_token,
        })
    }

    async fn get_object(&self, bucket: &str, key: &str) -> BackupResult<Vec<u8>> {
        self.record(format!("get:{}/{}", bucket, key));
        let state = self.state.lock().unwrap();
        if state.failing_gets.contains(key) {
            return Err(BackupError::Storage(format!("connection reset fetching {}", key)));
        }
        state
            .buckets
            .get(bucket)
            .ok_or_else(|| no_such_bucket(bucket))?
            .get(key)
            .map(|object| object.body.clone())
            .ok_or_else(|| BackupError::Storage(format!("NoSuchKey: {}", key)))
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> BackupResult<()> {
        self.record(format!("put:{}/{}", bucket, key));
        let mut state = self.state.lock().unwrap();
        let objects = state
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| no_such_bucket(bucket))?;
        objects.insert(
            key.to_string(),
            StoredObject {
                body,
                content_type: content_type.to_string(),
                last_modified: Utc::now(),
            },
        );
        Ok(())
    }

    async fn delete_objects(&self, bucket: &str, keys: &[String]) -> BackupResult<usize> {
        self.record(format!("delete_objects:{}", bucket));
        let mut state = self.state.lock().unwrap();
        state.delete_batches.push(keys.len());
        let objects = state
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| no_such_bucket(bucket))?;
        Ok(keys.iter().filter(|key| objects.remove(*key).is_some()).count())
    }

    async fn head_bucket(&self, bucket: &str) -> BackupResult<bool> {
        self.record(format!("head_bucket:{}", bucket));
        Ok(self.state.lock().unwrap().buckets.contains_key(bucket))
    }

    async fn create_bucket(&self, bucket: &str) -> BackupResult<()> {
        self.record(format!("create_bucket:{}", bucket));
        let mut state = self.state.lock().unwrap();
        if state.fail_bucket_creation {
            return Err(BackupError::Storage("AccessDenied".to_string()));
        }
        state.buckets.entry(bucket.to_string()).or_default();
        Ok(())
    }
}
