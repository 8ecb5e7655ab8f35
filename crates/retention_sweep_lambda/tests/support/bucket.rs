use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use retention_sweep_core::contract::{ListPage, StorageObject};
use retention_sweep_lambda::adapters::object_store::{ObjectStore, StoreError};
use tokio::sync::Barrier;

pub fn test_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 19, 6, 0, 0)
        .single()
        .expect("valid timestamp")
}

/// In-memory bucket that pages its listing like `ListObjectsV2`: keys in
/// lexical order, continuation token is the last key of the previous page.
pub struct InMemoryBucket {
    objects: Mutex<BTreeMap<String, DateTime<Utc>>>,
    page_size: usize,
    honor_prefix: bool,
    delete_calls: Mutex<Vec<String>>,
    list_calls: Mutex<usize>,
    delete_barrier: Option<Arc<Barrier>>,
}

impl InMemoryBucket {
    pub fn new(page_size: usize) -> Self {
        Self {
            objects: Mutex::new(BTreeMap::new()),
            page_size,
            honor_prefix: true,
            delete_calls: Mutex::new(Vec::new()),
            list_calls: Mutex::new(0),
            delete_barrier: None,
        }
    }

    /// Return every key regardless of the requested prefix.
    pub fn ignoring_prefix(mut self) -> Self {
        self.honor_prefix = false;
        self
    }

    /// Every delete parks until `parties` deletes are in flight at once.
    pub fn with_delete_barrier(mut self, parties: usize) -> Self {
        self.delete_barrier = Some(Arc::new(Barrier::new(parties)));
        self
    }

    pub fn put(&self, key: &str, created_at: DateTime<Utc>) {
        self.objects
            .lock()
            .expect("poisoned mutex")
            .insert(key.to_string(), created_at);
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects
            .lock()
            .expect("poisoned mutex")
            .keys()
            .cloned()
            .collect()
    }

    pub fn delete_calls(&self) -> Vec<String> {
        let mut calls = self.delete_calls.lock().expect("poisoned mutex").clone();
        calls.sort();
        calls
    }

    pub fn list_calls(&self) -> usize {
        *self.list_calls.lock().expect("poisoned mutex")
    }
}

#[async_trait]
impl ObjectStore for InMemoryBucket {
    async fn list_page(
        &self,
        prefix: &str,
        continuation: Option<String>,
    ) -> Result<ListPage, StoreError> {
        *self.list_calls.lock().expect("poisoned mutex") += 1;

        let objects = self.objects.lock().expect("poisoned mutex");
        let mut matching = objects
            .iter()
            .filter(|(key, _)| !self.honor_prefix || key.starts_with(prefix))
            .filter(|(key, _)| {
                continuation
                    .as_deref()
                    .map_or(true, |after| key.as_str() > after)
            });

        let page: Vec<StorageObject> = matching
            .by_ref()
            .take(self.page_size)
            .map(|(key, created_at)| StorageObject::new(key.clone(), *created_at))
            .collect();
        let has_more = matching.next().is_some();
        let next_token = if has_more {
            page.last().map(|object| object.key.clone())
        } else {
            None
        };

        Ok(ListPage {
            objects: page,
            next_token,
        })
    }

    async fn delete_object(&self, key: &str) -> Result<(), StoreError> {
        self.delete_calls
            .lock()
            .expect("poisoned mutex")
            .push(key.to_string());
        if let Some(barrier) = &self.delete_barrier {
            barrier.wait().await;
        }
        self.objects.lock().expect("poisoned mutex").remove(key);
        Ok(())
    }
}
