use std::sync::Arc;

use uuid::Uuid;

use crate::access::Identity;
use crate::configuration::{ConfigStore, StoreOptions};
use crate::crypto::{ConfigCipher, ServerSecret};
use crate::database::MemoryPersistence;

const TEST_SECRET: &[u8] = b"test-secret-with-at-least-32-bytes!!";

/// Cipher with a fixed secret, so blobs written by a test can be opened by it
pub fn test_cipher() -> ConfigCipher {
    ConfigCipher::new(ServerSecret::new(TEST_SECRET.to_vec()).expect("test secret is long enough"))
}

pub fn identity(access: &str, company: &str, store: Option<&str>) -> Identity {
    Identity::from_session(Uuid::new_v4(), Some(access), company, store)
}

/// Store wired to an in-memory backend, with registered users
pub struct TestContext {
    pub persistence: Arc<MemoryPersistence>,
    pub store: ConfigStore,
}

impl TestContext {
    pub async fn new() -> Self {
        let persistence = Arc::new(MemoryPersistence::new());
        let store = ConfigStore::new(persistence.clone(), test_cipher(), StoreOptions::default());
        Self { persistence, store }
    }

    /// Registered store user of company "Acme"
    pub async fn user(&self) -> Identity {
        self.user_with("user", "Acme", Some("S1")).await
    }

    pub async fn user_with(&self, access: &str, company: &str, store: Option<&str>) -> Identity {
        let identity = identity(access, company, store);
        self.persistence.add_user(identity.user_id).await;
        identity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_users_are_distinct_and_registered() {
        let ctx = TestContext::new().await;
        let a = ctx.user().await;
        let b = ctx.user().await;

        assert_ne!(a.user_id, b.user_id);
        assert!(ctx.persistence.stored(a.user_id).await.is_some());
    }
}
