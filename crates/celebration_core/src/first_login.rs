use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use serde_json::Value;
use shared::domain::{FirstLoginState, FIRST_LOGIN_KEY};
use storage::{DurableStore, StoreError};
use tracing::{debug, error, info};

/// Decides, once per app session, whether the first-login celebration runs.
///
/// The flag is device-local: it lives in whatever store this controller was built with. Two app
/// instances sharing one store may both see `pending` and both celebrate, or race the other way;
/// that is a cosmetic anomaly and no cross-instance locking is attempted.
#[derive(Clone)]
pub struct FirstLoginController {
    store: DurableStore,
    claimed: Arc<AtomicBool>,
}

impl FirstLoginController {
    pub fn new(store: DurableStore) -> Self {
        Self {
            store,
            claimed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// True only when the stored flag is the string `"true"`. Every fault reads as `false`.
    pub async fn is_first_login(&self) -> bool {
        match self.store.get::<Value>(FIRST_LOGIN_KEY).await {
            Ok(Some(Value::String(text))) => {
                FirstLoginState::from_sentinel(&text) == FirstLoginState::Pending
            }
            Ok(Some(other)) => {
                debug!("first login: ignoring non-string flag value {other}");
                false
            }
            Ok(None) => false,
            Err(err) => {
                error!("first login: flag read failed, skipping celebration: {err}");
                false
            }
        }
    }

    /// Retires the flag. Safe to call repeatedly; write faults are logged and swallowed.
    pub async fn mark_first_login_complete(&self) {
        match self
            .store
            .set(FIRST_LOGIN_KEY, FirstLoginState::Consumed.sentinel())
            .await
        {
            Ok(()) => info!("first login: celebration marked complete"),
            Err(err) => error!("first login: failed to retire flag: {err}"),
        }
    }

    /// Re-arms the flag. Called by the auth session when an account is created.
    pub async fn arm(&self) -> Result<(), StoreError> {
        self.store
            .set(FIRST_LOGIN_KEY, FirstLoginState::Pending.sentinel())
            .await?;
        info!("first login: flag armed");
        Ok(())
    }

    /// The single load-time decision for this controller and all its clones.
    ///
    /// The first call reads the flag and hands out a ticket if it is pending; every later call returns
    /// `None` without touching the store.
    pub async fn claim_celebration(&self) -> Option<CelebrationTicket> {
        if self.claimed.swap(true, Ordering::SeqCst) {
            debug!("first login: decision already taken this session");
            return None;
        }
        if !self.is_first_login().await {
            return None;
        }
        Some(CelebrationTicket {
            controller: self.clone(),
        })
    }
}

/// Proof that this session owns the pending celebration.
///
/// Dropping the ticket without calling [`CelebrationTicket::complete`] leaves the flag pending, so a
/// sequence cut short by the process exiting is shown again next time.
#[must_use = "call `complete` once the celebration sequence has finished"]
pub struct CelebrationTicket {
    controller: FirstLoginController,
}

impl CelebrationTicket {
    pub async fn complete(self) {
        self.controller.mark_first_login_complete().await;
    }
}

#[cfg(test)]
#[path = "tests/first_login_tests.rs"]
mod tests;
