use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;

use crate::api::models::{AuthResponse, RegisterRequest, ResetPasswordRequest, User};
use crate::api::{ApiClient, ApiError};
use crate::db::models::StoredSession;
use crate::db::sessions::{SessionStore, StoreError};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("You are not signed in")]
    NotAuthenticated,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum AuthState {
    #[default]
    Unauthenticated,
    Checking,
    Authenticated {
        token: String,
        user: User,
    },
}

/// Token lifecycle for one device (one chat, for the bot).
///
/// The session owns an [`ApiClient`] whose default bearer token tracks the state:
/// set on every successful sign-in, cleared on logout or a failed verification.
/// Sign-in flows write nothing until the backend has answered successfully, so a
/// failed attempt leaves both storage and in-memory state exactly as they were.
pub struct AuthSession {
    key: String,
    client: ApiClient,
    store: Arc<dyn SessionStore>,
    state: AuthState,
}

impl AuthSession {
    pub fn new(key: impl Into<String>, client: &ApiClient, store: Arc<dyn SessionStore>) -> Self {
        let mut client = client.clone();
        client.set_token(None);
        Self {
            key: key.into(),
            client,
            store,
            state: AuthState::Unauthenticated,
        }
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    /// Client carrying the session's bearer token, if any.
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn user(&self) -> Option<&User> {
        match &self.state {
            AuthState::Authenticated { user, .. } => Some(user),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user().is_some()
    }

    /// Restores a stored session, re-validating its token once.
    ///
    /// Any verification failure, whether the network is down or the token was
    /// rejected, clears storage and leaves the session unauthenticated.
    pub async fn restore(&mut self) -> Result<&AuthState, StoreError> {
        let Some(stored) = self.store.load(&self.key).await? else {
            self.state = AuthState::Unauthenticated;
            return Ok(&self.state);
        };

        self.state = AuthState::Checking;
        let client = self.client.with_token(&stored.token);

        match client.auth().verify().await {
            Ok(verified) => {
                log::info!("Restored session for {}", self.key);
                self.client = client;
                self.state = AuthState::Authenticated {
                    token: stored.token,
                    user: verified.user.unwrap_or(stored.user),
                };
            }
            Err(e) => {
                log::warn!("Stored session for {} rejected: {}", self.key, e);
                self.client.set_token(None);
                self.state = AuthState::Unauthenticated;
                self.store.clear(&self.key).await?;
            }
        }

        Ok(&self.state)
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<User, SessionError> {
        let response = self.client.auth().login(email, password).await?;
        self.establish(response).await
    }

    pub async fn register(&mut self, request: &RegisterRequest) -> Result<User, SessionError> {
        let response = self.client.auth().register(request).await?;
        self.establish(response).await
    }

    pub async fn verify_otp(&mut self, email: &str, otp: &str) -> Result<User, SessionError> {
        let response = self.client.auth().verify_otp(email, otp).await?;
        self.establish(response).await
    }

    pub async fn reset_password(
        &mut self,
        request: &ResetPasswordRequest,
    ) -> Result<User, SessionError> {
        let response = self.client.auth().reset_password(request).await?;
        self.establish(response).await
    }

    pub async fn forgot_password(&self, email: &str) -> Result<Option<String>, SessionError> {
        Ok(self.client.auth().forgot_password(email).await?.message)
    }

    pub async fn verify_reset_otp(
        &self,
        email: &str,
        otp: &str,
    ) -> Result<Option<String>, SessionError> {
        Ok(self.client.auth().verify_reset_otp(email, otp).await?.message)
    }

    pub async fn resend_reset_otp(&self, email: &str) -> Result<Option<String>, SessionError> {
        Ok(self.client.auth().resend_reset_otp(email).await?.message)
    }

    /// Saves a full profile and replaces the stored user with the server's copy.
    pub async fn update_profile(&mut self, profile: &User) -> Result<User, SessionError> {
        let token = match &self.state {
            AuthState::Authenticated { token, .. } => token.clone(),
            _ => return Err(SessionError::NotAuthenticated),
        };

        let updated = self.client.auth().update_profile(profile).await?;
        self.store
            .save(&self.key, &StoredSession::new(token.clone(), updated.clone()))
            .await?;
        self.state = AuthState::Authenticated {
            token,
            user: updated.clone(),
        };
        Ok(updated)
    }

    pub async fn logout(&mut self) -> Result<(), SessionError> {
        self.store.clear(&self.key).await?;
        self.client.set_token(None);
        self.state = AuthState::Unauthenticated;
        log::info!("Signed out {}", self.key);
        Ok(())
    }

    async fn establish(&mut self, response: AuthResponse) -> Result<User, SessionError> {
        let AuthResponse { token, user } = response;

        self.store
            .save(&self.key, &StoredSession::new(token.clone(), user.clone()))
            .await?;
        self.client.set_token(Some(token.clone()));
        self.state = AuthState::Authenticated {
            token,
            user: user.clone(),
        };

        log::info!("Signed in {} as {:?}", self.key, user.role);
        Ok(user)
    }
}

/// All live sessions, restored lazily from storage on first use.
#[derive(Clone)]
pub struct Sessions {
    client: ApiClient,
    store: Arc<dyn SessionStore>,
    active: Arc<Mutex<HashMap<String, Arc<Mutex<AuthSession>>>>>,
}

impl Sessions {
    pub fn new(client: ApiClient, store: Arc<dyn SessionStore>) -> Self {
        Self {
            client,
            store,
            active: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Returns the session for `key`, restoring it from storage the first time.
    pub async fn get(&self, key: &str) -> Arc<Mutex<AuthSession>> {
        let mut active = self.active.lock().await;
        if let Some(session) = active.get(key) {
            return session.clone();
        }

        let session = Arc::new(Mutex::new(AuthSession::new(
            key,
            &self.client,
            self.store.clone(),
        )));
        // Hold the session while restoring so concurrent callers wait for the outcome.
        let mut guard = session.clone().lock_owned().await;
        active.insert(key.to_string(), session.clone());
        drop(active);

        if let Err(e) = guard.restore().await {
            log::error!("Failed to restore session for {}: {}", key, e);
        }

        session
    }
}
