use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use tokio::sync::OwnedMutexGuard;

/// Per-identity operation serialization.
///
/// Concurrent operations on different identities proceed in parallel;
/// operations on the same identity queue on a shared async mutex created
/// lazily for that identity. Idle entries are swept on the next acquire,
/// so the map does not grow with the total number of identities ever seen.
#[derive(Default)]
pub struct IdentityLocks {
    inner: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl IdentityLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the lock for `id`, waiting behind any in-flight operation
    /// on the same identity.
    pub async fn acquire(&self, id: &str) -> OwnedMutexGuard<()> {
        let mutex = {
            let mut map = self.inner.lock().unwrap();

            // Sweep idle entries: only the map holds them.
            map.retain(|_, m| Arc::strong_count(m) > 1);

            map.entry(id.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone()
        };

        mutex.lock_owned().await
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_same_identity_is_serialized() {
        let locks = Arc::new(IdentityLocks::new());

        let guard = locks.acquire("sha-256:aa").await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire("sha-256:aa").await;
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn test_distinct_identities_do_not_block() {
        let locks = IdentityLocks::new();

        let _a = locks.acquire("sha-256:aa").await;
        // Must not deadlock.
        let _b = locks.acquire("sha-256:bb").await;
    }

    #[tokio::test]
    async fn test_idle_entries_are_swept() {
        let locks = IdentityLocks::new();

        drop(locks.acquire("sha-256:aa").await);
        drop(locks.acquire("sha-256:bb").await);

        let _c = locks.acquire("sha-256:cc").await;
        // The two released identities were swept during the third acquire.
        assert_eq!(locks.len(), 1);
    }
}
