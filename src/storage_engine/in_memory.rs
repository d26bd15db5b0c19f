//! An in-memory [`StorageEngine`] implementation
//!
//! A [`HashMap`] behind a [`RwLock`]. Cloning an [`InMemory`] instance yields a handle to the same map,
//! which is how the in-memory backends share a store per endpoint.
use async_trait::async_trait;
use bytes::Bytes;
use std::{
    collections::HashMap,
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};
use tracing::instrument;

use super::{Error, Result, StorageEngine};

/// Type alias for the underlying datastructure used to store the key/value pairs
type Store = HashMap<Bytes, Bytes>;

/// The InMemory [`StorageEngine`] definition
#[derive(Clone, Debug, Default)]
pub struct InMemory {
    inner: Arc<RwLock<Store>>,
}

impl InMemory {
    /// A fail to acquire a lock is considered a [`Error::Logic`] since the only reason why
    /// an [`Error`] should be returned is in case of lock poisoning
    fn read_lock(&self) -> Result<RwLockReadGuard<Store>> {
        self.inner.read().map_err(|_| Error::Logic {
            reason: "Unable to acquire lock for InMemory storage engine - poisoned...".to_string(),
        })
    }

    fn write_lock(&self) -> Result<RwLockWriteGuard<Store>> {
        self.inner.write().map_err(|_| Error::Logic {
            reason: "Unable to acquire lock for InMemory storage engine - poisoned...".to_string(),
        })
    }
}

#[async_trait]
impl StorageEngine for InMemory {
    #[instrument(name = "storage_engine::in_memory::get", level = "debug", skip(self))]
    async fn get(&self, key: &[u8]) -> Result<Option<Bytes>> {
        let guard = self.read_lock()?;
        Ok(guard.get(key).cloned())
    }

    #[instrument(name = "storage_engine::in_memory::put", level = "debug", skip(self, value))]
    async fn put(&self, key: Bytes, value: Bytes) -> Result<()> {
        let mut guard = self.write_lock()?;
        guard.insert(key, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::InMemory;
    use crate::storage_engine::StorageEngine;
    use bytes::Bytes;
    use quickcheck::Arbitrary;
    use rand::{distributions::Alphanumeric, Rng};

    #[tokio::test]
    async fn put_get_override() {
        let store = InMemory::default();
        let key = Bytes::from("key");

        assert!(store.get(&key).await.unwrap().is_none());

        store.put(key.clone(), Bytes::from("value")).await.unwrap();
        assert_eq!(store.get(&key).await.unwrap().unwrap(), Bytes::from("value"));

        store.put(key.clone(), Bytes::from("value2")).await.unwrap();
        assert_eq!(store.get(&key).await.unwrap().unwrap(), Bytes::from("value2"));
        assert!(store.get(b"other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn clones_share_the_same_store() {
        let store = InMemory::default();
        let other_handle = store.clone();

        store
            .put(Bytes::from("key"), Bytes::from("value"))
            .await
            .unwrap();
        other_handle
            .put(Bytes::from("key"), Bytes::from("value2"))
            .await
            .unwrap();

        assert_eq!(
            store.get(b"key").await.unwrap().unwrap(),
            Bytes::from("value2")
        );
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct TestInput {
        keys_task_1: Vec<String>,
        keys_task_2: Vec<String>,
    }

    fn generate_random_deduped_keys(n_keys: usize) -> Vec<String> {
        let mut keys: Vec<String> = (0..n_keys)
            .map(|_| {
                rand::thread_rng()
                    .sample_iter(&Alphanumeric)
                    .take(20)
                    .map(char::from)
                    .collect()
            })
            .collect();
        keys.sort();
        keys.dedup();
        keys
    }

    impl Arbitrary for TestInput {
        fn arbitrary(_: &mut quickcheck::Gen) -> Self {
            let keys = generate_random_deduped_keys(200);
            let (left, right) = keys.split_at(keys.len() / 2);

            Self {
                keys_task_1: left.to_vec(),
                keys_task_2: right.to_vec(),
            }
        }
    }

    async fn put_get(store: InMemory, items: Vec<String>) -> usize {
        for key in items.iter() {
            let key = Bytes::from(key.clone());
            store.put(key.clone(), key.clone()).await.unwrap();
            assert_eq!(store.get(&key).await.unwrap().unwrap(), key);
        }

        items.len()
    }

    // asserts that concurrent puts/gets don't deadlock and that every item ends up in the store
    #[quickcheck_async::tokio]
    async fn concurrency_test_put_get(input: TestInput) {
        let store = InMemory::default();
        let h1 = tokio::spawn(put_get(store.clone(), input.keys_task_1.clone()));
        let h2 = tokio::spawn(put_get(store.clone(), input.keys_task_2.clone()));

        let (r1, r2) = tokio::join!(h1, h2);
        let total = r1.unwrap() + r2.unwrap();

        assert_eq!(total, input.keys_task_1.len() + input.keys_task_2.len());
        for key in input.keys_task_1.iter().chain(input.keys_task_2.iter()) {
            assert_eq!(
                store.get(key.as_bytes()).await.unwrap().unwrap(),
                Bytes::from(key.clone())
            );
        }
    }
}
