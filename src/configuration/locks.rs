use std::collections::HashMap;
use std::sync::{Arc, Weak};

use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// One async mutex per user, created on demand and dropped once unused.
/// Different users never share a lock.
#[derive(Default)]
pub struct UserLocks {
    locks: Mutex<HashMap<Uuid, Weak<Mutex<()>>>>,
}

impl UserLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, user_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.retain(|_, lock| lock.strong_count() > 0);

            match locks.get(&user_id).and_then(Weak::upgrade) {
                Some(lock) => lock,
                None => {
                    let lock = Arc::new(Mutex::new(()));
                    locks.insert(user_id, Arc::downgrade(&lock));
                    lock
                }
            }
        };

        lock.lock_owned().await
    }

    /// Users with a held or awaited lock
    #[cfg(test)]
    pub async fn active(&self) -> usize {
        self.locks
            .lock()
            .await
            .values()
            .filter(|lock| lock.strong_count() > 0)
            .count()
    }
}
