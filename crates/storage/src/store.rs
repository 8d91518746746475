use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::{MediumFault, PreferenceMedium, StoreError};

/// Preference store that walks an ordered list of media.
///
/// Every operation starts at the first medium. A later medium is consulted only after the one before
/// it faults; an absent value is a valid answer and ends the walk. The media are never reconciled, so
/// after a partial failure the medium that took the most recent write is the one that answers reads
/// as long as the media before it keep faulting.
#[derive(Clone)]
pub struct DurableStore {
    media: Arc<[Arc<dyn PreferenceMedium>]>,
}

#[derive(Default)]
pub struct DurableStoreBuilder {
    media: Vec<Arc<dyn PreferenceMedium>>,
}

impl DurableStoreBuilder {
    pub fn medium(mut self, medium: impl PreferenceMedium + 'static) -> Self {
        self.media.push(Arc::new(medium));
        self
    }

    pub fn build(self) -> DurableStore {
        DurableStore::new(self.media)
    }
}

impl DurableStore {
    pub fn new(media: Vec<Arc<dyn PreferenceMedium>>) -> Self {
        Self {
            media: media.into(),
        }
    }

    pub fn builder() -> DurableStoreBuilder {
        DurableStoreBuilder::default()
    }

    /// Medium names in the order they are tried.
    pub fn media(&self) -> Vec<&str> {
        self.media.iter().map(|medium| medium.name()).collect()
    }

    pub async fn set<T>(&self, key: &str, value: &T) -> Result<(), StoreError>
    where
        T: Serialize + ?Sized,
    {
        validate_key(key)?;
        let text = serde_json::to_string(value).map_err(|source| StoreError::Serialize {
            key: key.to_string(),
            source,
        })?;
        self.set_raw(key, &text).await
    }

    /// Returns `Ok(None)` when the key is absent. Text that does not parse as `T` is a
    /// [`StoreError::Deserialize`], never `None`.
    pub async fn get<T>(&self, key: &str) -> Result<Option<T>, StoreError>
    where
        T: DeserializeOwned,
    {
        let Some(text) = self.get_raw(key).await? else {
            return Ok(None);
        };
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|source| StoreError::Deserialize {
                key: key.to_string(),
                source,
            })
    }

    pub async fn set_raw(&self, key: &str, text: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        let mut faults = Vec::new();
        for medium in self.ordered_media()? {
            match medium.set(key, text).await {
                Ok(()) => {
                    debug!("storage: wrote key={key} medium={}", medium.name());
                    return Ok(());
                }
                Err(err) => {
                    warn!(
                        "storage: medium {} failed to write key={key}, trying next: {err:#}",
                        medium.name()
                    );
                    faults.push(MediumFault::new(medium.name(), &err));
                }
            }
        }
        Err(StoreError::Unavailable {
            key: key.to_string(),
            faults,
        })
    }

    /// Stored text for `key`. Empty text counts as absent.
    pub async fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError> {
        validate_key(key)?;
        let mut faults = Vec::new();
        for medium in self.ordered_media()? {
            match medium.get(key).await {
                Ok(value) => {
                    debug!(
                        "storage: read key={key} medium={} present={}",
                        medium.name(),
                        value.is_some()
                    );
                    return Ok(value.filter(|text| !text.is_empty()));
                }
                Err(err) => {
                    warn!(
                        "storage: medium {} failed to read key={key}, trying next: {err:#}",
                        medium.name()
                    );
                    faults.push(MediumFault::new(medium.name(), &err));
                }
            }
        }
        Err(StoreError::Unavailable {
            key: key.to_string(),
            faults,
        })
    }

    /// Removing an absent key succeeds.
    ///
    /// Only the first medium that answers without a fault is cleared; later media are left alone.
    /// A value written to a later medium while an earlier one was down can therefore reappear if
    /// the earlier medium faults again after the removal.
    pub async fn remove(&self, key: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        let mut faults = Vec::new();
        for medium in self.ordered_media()? {
            match medium.remove(key).await {
                Ok(()) => {
                    debug!("storage: removed key={key} medium={}", medium.name());
                    return Ok(());
                }
                Err(err) => {
                    warn!(
                        "storage: medium {} failed to remove key={key}, trying next: {err:#}",
                        medium.name()
                    );
                    faults.push(MediumFault::new(medium.name(), &err));
                }
            }
        }
        Err(StoreError::Unavailable {
            key: key.to_string(),
            faults,
        })
    }

    fn ordered_media(&self) -> Result<&[Arc<dyn PreferenceMedium>], StoreError> {
        if self.media.is_empty() {
            return Err(StoreError::NoMedia);
        }
        Ok(&self.media)
    }
}

fn validate_key(key: &str) -> Result<(), StoreError> {
    if key.is_empty() {
        return Err(StoreError::InvalidKey);
    }
    Ok(())
}
