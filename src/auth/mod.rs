pub mod firebase;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;

use crate::cli::Args;
use self::firebase::FirebaseAuthClient;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Please enter both email and password")]
    MissingCredentials,
    // Rejection reason reported by the identity service, shown verbatim.
    #[error("{0}")]
    Provider(String),
    #[error("auth request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub uid: String,
    pub email: String,
    pub id_token: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum AuthState {
    #[default]
    SignedOut,
    SignedIn(AuthUser),
}

impl AuthState {
    pub fn user(&self) -> Option<&AuthUser> {
        match self {
            AuthState::SignedIn(user) => Some(user),
            AuthState::SignedOut => None,
        }
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthError>;
    async fn register(&self, email: &str, password: &str) -> Result<AuthUser, AuthError>;
}

/// Holds the active identity and broadcasts every change to subscribers.
pub struct AuthGateway {
    provider: Arc<dyn IdentityProvider>,
    state: watch::Sender<AuthState>,
}

impl AuthGateway {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        let (state, _) = watch::channel(AuthState::default());
        Self { provider, state }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }
        let user = self.provider.sign_in(email, password).await?;
        self.state.send_replace(AuthState::SignedIn(user.clone()));
        Ok(user)
    }

    pub async fn register(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }
        let user = self.provider.register(email, password).await?;
        self.state.send_replace(AuthState::SignedIn(user.clone()));
        Ok(user)
    }

    pub fn sign_out(&self) {
        self.state.send_replace(AuthState::SignedOut);
    }

    pub fn current_user(&self) -> Option<AuthUser> {
        self.state.borrow().user().cloned()
    }

    pub fn subscribe(&self) -> AuthSubscription {
        AuthSubscription { rx: self.state.subscribe() }
    }
}

/// One listener on the auth state. Dropping it releases the listener.
pub struct AuthSubscription {
    rx: watch::Receiver<AuthState>,
}

impl AuthSubscription {
    pub fn current(&self) -> AuthState {
        self.rx.borrow().clone()
    }

    pub async fn changed(&mut self) -> Result<(), watch::error::RecvError> {
        self.rx.changed().await
    }
}

pub fn create_gateway(args: &Args) -> AuthGateway {
    let client = FirebaseAuthClient::new(
        Some(args.auth_base_url.clone()),
        args.auth_api_key.clone()
    );
    AuthGateway::new(Arc::new(client))
}
