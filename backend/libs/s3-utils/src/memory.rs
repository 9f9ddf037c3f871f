/// In-memory `ObjectStore` for tests
///
/// Keeps objects in a sorted map, counts every call, and can be told to
/// fail a specific `put` (or every list, delete or grant) so partial-failure
/// paths can be exercised.
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::BTreeMap;

use crate::error::{Result, StorageError};
use crate::operations::{delete_batches, ObjectStore, ObjectSummary, PutObject};

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub content_type: String,
    pub cache_control: String,
    pub last_modified: chrono::DateTime<Utc>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CallCounts {
    pub puts: usize,
    pub lists: usize,
    pub delete_batches: usize,
}

impl CallCounts {
    pub fn total(&self) -> usize {
        self.puts + self.lists + self.delete_batches
    }
}

#[derive(Debug, Default)]
struct State {
    objects: BTreeMap<String, StoredObject>,
    calls: CallCounts,
    fail_put_at: Option<usize>,
    fail_lists: bool,
    fail_deletes: bool,
    fail_grants: bool,
    grants: Vec<String>,
}

#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    state: Mutex<State>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an object directly, bypassing call accounting
    pub fn seed(&self, key: &str, body: &str) {
        self.state.lock().objects.insert(
            key.to_string(),
            StoredObject {
                body: body.as_bytes().to_vec(),
                content_type: "text/html; charset=utf-8".to_string(),
                cache_control: "no-cache".to_string(),
                last_modified: Utc::now(),
            },
        );
    }

    /// Make the `n`-th put (1-based, counted from now) fail
    pub fn fail_put_at(&self, n: usize) {
        let mut state = self.state.lock();
        state.fail_put_at = Some(state.calls.puts + n);
    }

    /// Make every subsequent `list_all` fail
    pub fn fail_lists(&self) {
        self.state.lock().fail_lists = true;
    }

    /// Make every subsequent `delete_many` fail without removing anything
    pub fn fail_deletes(&self) {
        self.state.lock().fail_deletes = true;
    }

    /// Make every subsequent `grant_distribution_read` fail
    pub fn fail_grants(&self) {
        self.state.lock().fail_grants = true;
    }

    /// Distribution ARNs granted read access, in order
    pub fn grants(&self) -> Vec<String> {
        self.state.lock().grants.clone()
    }

    pub fn keys(&self) -> Vec<String> {
        self.state.lock().objects.keys().cloned().collect()
    }

    pub fn get(&self, key: &str) -> Option<StoredObject> {
        self.state.lock().objects.get(key).cloned()
    }

    pub fn body(&self, key: &str) -> Option<String> {
        self.get(key)
            .map(|obj| String::from_utf8_lossy(&obj.body).into_owned())
    }

    pub fn calls(&self) -> CallCounts {
        self.state.lock().calls
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn put(&self, object: PutObject) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.puts += 1;

        if state.fail_put_at == Some(state.calls.puts) {
            return Err(StorageError::Put {
                key: object.key,
                message: "injected failure".to_string(),
            });
        }

        state.objects.insert(
            object.key,
            StoredObject {
                body: object.body,
                content_type: object.content_type,
                cache_control: object.cache_control,
                last_modified: Utc::now(),
            },
        );
        Ok(())
    }

    async fn list_all(&self, prefix: &str) -> Result<Vec<ObjectSummary>> {
        let mut state = self.state.lock();
        state.calls.lists += 1;

        if state.fail_lists {
            return Err(StorageError::List {
                prefix: prefix.to_string(),
                message: "injected failure".to_string(),
            });
        }

        let matching = state
            .objects
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, obj)| ObjectSummary {
                key: key.clone(),
                size: obj.body.len() as i64,
                last_modified: Some(obj.last_modified),
            })
            .collect();

        Ok(matching)
    }

    async fn delete_many(&self, keys: &[String]) -> Result<()> {
        let mut state = self.state.lock();
        for batch in delete_batches(keys) {
            state.calls.delete_batches += 1;
            if state.fail_deletes {
                return Err(StorageError::Delete {
                    count: batch.len(),
                    message: "injected failure".to_string(),
                });
            }
            for key in batch {
                state.objects.remove(key);
            }
        }
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("https://sites.test/{key}")
    }

    async fn origin_domain(&self) -> Result<String> {
        Ok("sites-test.s3.us-east-1.amazonaws.com".to_string())
    }

    async fn grant_distribution_read(&self, distribution_arn: &str) -> Result<()> {
        let mut state = self.state.lock();
        if state.fail_grants {
            return Err(StorageError::Policy {
                bucket: "sites-test".to_string(),
                message: "injected failure".to_string(),
            });
        }
        if !state.grants.iter().any(|arn| arn == distribution_arn) {
            state.grants.push(distribution_arn.to_string());
        }
        Ok(())
    }
}
