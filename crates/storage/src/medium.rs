use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

/// One storage backend the store can write preferences to.
///
/// `get` returns `Ok(None)` for a key that was never written or has been removed; an `Err` means the
/// medium itself is unreachable or rejected the call. Removing an absent key must succeed.
#[async_trait]
pub trait PreferenceMedium: Send + Sync {
    fn name(&self) -> &str;
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
}

#[async_trait]
impl<T> PreferenceMedium for Arc<T>
where
    T: PreferenceMedium + ?Sized,
{
    fn name(&self) -> &str {
        self.as_ref().name()
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.as_ref().get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.as_ref().set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.as_ref().remove(key).await
    }
}
