//! Keyed Async Locks
//!
//! Serializes operations on the same key (an NDR record, a phone/order
//! pair) while letting different keys proceed concurrently.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Lock table keyed by `K`
#[derive(Debug)]
pub struct KeyedLocks<K> {
    slots: Mutex<HashMap<K, Arc<Mutex<()>>>>,
}

impl<K> KeyedLocks<K>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Acquire the lock for `key`, waiting for any current holder
    pub async fn lock(&self, key: &K) -> OwnedMutexGuard<()> {
        let slot = {
            let mut slots = self.slots.lock().await;
            // Drop slots nobody holds or waits on
            slots.retain(|_, slot| Arc::strong_count(slot) > 1);
            slots
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        slot.lock_owned().await
    }

    /// Number of keys currently tracked
    pub async fn len(&self) -> usize {
        self.slots.lock().await.len()
    }
}

impl<K> Default for KeyedLocks<K>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_key_is_serialized() {
        let locks = Arc::new(KeyedLocks::<String>::new());
        let counter = Arc::new(Mutex::new(Vec::new()));

        let guard = locks.lock(&"ndr:1".to_string()).await;

        let task = {
            let locks = locks.clone();
            let counter = counter.clone();
            tokio::spawn(async move {
                let _guard = locks.lock(&"ndr:1".to_string()).await;
                counter.lock().await.push("second");
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        counter.lock().await.push("first");
        drop(guard);
        task.await.unwrap();

        assert_eq!(*counter.lock().await, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_different_keys_do_not_block() {
        let locks = KeyedLocks::<String>::new();
        let _a = locks.lock(&"a".to_string()).await;
        let _b = locks.lock(&"b".to_string()).await;
        assert_eq!(locks.len().await, 2);
    }
}
