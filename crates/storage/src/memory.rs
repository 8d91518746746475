use std::{
    collections::HashMap,
    sync::atomic::{AtomicBool, Ordering},
};

use anyhow::{bail, Result};
use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::PreferenceMedium;

/// In-memory medium. Lives only as long as the process; flip `set_faulty` to make every call fail.
pub struct MemoryPreferences {
    name: String,
    entries: Mutex<HashMap<String, String>>,
    faulty: AtomicBool,
}

impl MemoryPreferences {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Mutex::new(HashMap::new()),
            faulty: AtomicBool::new(false),
        }
    }

    pub fn set_faulty(&self, faulty: bool) {
        self.faulty.store(faulty, Ordering::SeqCst);
    }

    /// Raw stored text, bypassing the fault switch.
    pub async fn peek(&self, key: &str) -> Option<String> {
        self.entries.lock().await.get(key).cloned()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    fn check_available(&self) -> Result<()> {
        if self.faulty.load(Ordering::SeqCst) {
            bail!("medium '{}' is unavailable", self.name);
        }
        Ok(())
    }
}

impl Default for MemoryPreferences {
    fn default() -> Self {
        Self::new("memory")
    }
}

#[async_trait]
impl PreferenceMedium for MemoryPreferences {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.check_available()?;
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.check_available()?;
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.check_available()?;
        self.entries.lock().await.remove(key);
        Ok(())
    }
}
