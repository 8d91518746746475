use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use shared::{
    domain::{Identity, UserId, DISPLAY_NAME_KEY},
    error::{AuthError, ErrorCode},
};
use storage::DurableStore;
use tokio::sync::{watch, Mutex};
use tracing::{error, info, warn};

use crate::first_login::FirstLoginController;

const MIN_PASSWORD_LEN: usize = 6;

/// Identity provider seam. Implementations own credentials and the signed-in state.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn register(&self, email: &str, password: &str) -> Result<Identity, AuthError>;
    async fn login(&self, email: &str, password: &str) -> Result<Identity, AuthError>;
    async fn logout(&self) -> Result<(), AuthError>;
    fn subscribe(&self) -> watch::Receiver<Option<Identity>>;

    fn current_user(&self) -> Option<Identity> {
        let state = self.subscribe();
        let current = state.borrow().clone();
        current
    }
}

struct Account {
    user_id: UserId,
    password: String,
}

/// In-process provider for development builds and tests. Accounts vanish with the process.
pub struct LocalAuthProvider {
    accounts: Mutex<HashMap<String, Account>>,
    state: watch::Sender<Option<Identity>>,
}

impl LocalAuthProvider {
    pub fn new() -> Self {
        let (state, _) = watch::channel(None);
        Self {
            accounts: Mutex::new(HashMap::new()),
            state,
        }
    }

    fn sign_in(&self, user_id: UserId, email: &str) -> Identity {
        let identity = Identity {
            user_id,
            email: email.to_string(),
            signed_in_at: Utc::now(),
        };
        self.state.send_replace(Some(identity.clone()));
        identity
    }
}

impl Default for LocalAuthProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthProvider for LocalAuthProvider {
    async fn register(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let email = normalize_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::new(
                ErrorCode::WeakPassword,
                format!("password should be at least {MIN_PASSWORD_LEN} characters"),
            ));
        }

        let user_id = {
            let mut accounts = self.accounts.lock().await;
            if accounts.contains_key(&email) {
                return Err(AuthError::new(
                    ErrorCode::EmailInUse,
                    "email already registered",
                ));
            }
            let user_id = UserId::new();
            accounts.insert(
                email.clone(),
                Account {
                    user_id,
                    password: password.to_string(),
                },
            );
            user_id
        };

        Ok(self.sign_in(user_id, &email))
    }

    async fn login(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let email = normalize_email(email)?;
        let user_id = {
            let accounts = self.accounts.lock().await;
            match accounts.get(&email) {
                Some(account) if account.password == password => account.user_id,
                _ => {
                    return Err(AuthError::new(
                        ErrorCode::InvalidCredential,
                        "unknown email or wrong password",
                    ))
                }
            }
        };
        Ok(self.sign_in(user_id, &email))
    }

    async fn logout(&self) -> Result<(), AuthError> {
        self.state.send_replace(None);
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.state.subscribe()
    }
}

fn normalize_email(raw: &str) -> Result<String, AuthError> {
    let email = raw.trim().to_ascii_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };
    if !valid {
        return Err(AuthError::new(
            ErrorCode::InvalidEmail,
            format!("'{}' is not a valid email address", raw.trim()),
        ));
    }
    Ok(email)
}

#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub display_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// App-facing auth facade: delegates credentials to the provider and keeps the local
/// side effects of account creation (first-login flag, display name) in the store.
pub struct AuthSession<P: AuthProvider> {
    provider: P,
    store: DurableStore,
    first_login: FirstLoginController,
}

impl<P: AuthProvider> AuthSession<P> {
    pub fn new(provider: P, store: DurableStore) -> Self {
        let first_login = FirstLoginController::new(store.clone());
        Self {
            provider,
            store,
            first_login,
        }
    }

    pub fn first_login(&self) -> &FirstLoginController {
        &self.first_login
    }

    /// Creates the account, then arms the first-login flag and remembers the display name.
    ///
    /// Once the provider has accepted the account the call succeeds; local bookkeeping failures are
    /// only logged.
    pub async fn register(&self, form: &RegistrationForm) -> Result<Identity, AuthError> {
        if form.password != form.confirm_password {
            return Err(AuthError::new(
                ErrorCode::PasswordMismatch,
                "password confirmation does not match",
            ));
        }

        let identity = self.provider.register(&form.email, &form.password).await?;
        info!("auth: registered user_id={}", identity.user_id);

        if let Err(err) = self.first_login.arm().await {
            error!(
                "auth: could not arm first-login flag for user_id={}: {err}",
                identity.user_id
            );
        }

        let display_name = form.display_name.trim();
        if !display_name.is_empty() {
            if let Err(err) = self.store.set(DISPLAY_NAME_KEY, display_name).await {
                warn!("auth: could not store display name: {err}");
            }
        }

        Ok(identity)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let identity = self.provider.login(email, password).await?;
        info!("auth: signed in user_id={}", identity.user_id);
        Ok(identity)
    }

    pub async fn logout(&self) -> Result<(), AuthError> {
        self.provider.logout().await?;
        info!("auth: signed out");
        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        self.provider.current_user().is_some()
    }

    /// Follows the provider's signed-in identity.
    pub fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.provider.subscribe()
    }

    pub async fn display_name(&self) -> Option<String> {
        match self.store.get::<String>(DISPLAY_NAME_KEY).await {
            Ok(name) => name,
            Err(err) => {
                warn!("auth: could not read display name: {err}");
                None
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/auth_tests.rs"]
mod tests;
