//! Sign-in and sign-up forms plus session persistence.

use std::sync::Arc;

use tracing::{info, warn};

use crate::application::error::AppError;
use crate::application::repos::{AuthGateway, Credentials, LocalState};
use crate::application::session::SessionStore;
use crate::domain::entities::{Identity, Session};
use crate::domain::error::DomainError;

/// Local storage key holding the serialized session.
pub const SESSION_KEY: &str = "session";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    #[default]
    SignIn,
    SignUp,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthForm {
    pub mode: AuthMode,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl AuthForm {
    pub fn sign_in(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            mode: AuthMode::SignIn,
            email: email.into(),
            password: password.into(),
            confirm_password: String::new(),
        }
    }

    pub fn sign_up(
        email: impl Into<String>,
        password: impl Into<String>,
        confirm_password: impl Into<String>,
    ) -> Self {
        Self {
            mode: AuthMode::SignUp,
            email: email.into(),
            password: password.into(),
            confirm_password: confirm_password.into(),
        }
    }

    fn validate(&self) -> Result<Credentials, DomainError> {
        let email = self.email.trim();
        if email.is_empty() {
            return Err(DomainError::validation("Email is required"));
        }
        if !email.contains('@') {
            return Err(DomainError::validation("Please enter a valid email address"));
        }
        if self.password.is_empty() {
            return Err(DomainError::validation("Password is required"));
        }
        if self.mode == AuthMode::SignUp && self.password != self.confirm_password {
            return Err(DomainError::validation("Passwords do not match"));
        }

        Ok(Credentials {
            email: email.to_string(),
            password: self.password.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    SignedIn(Identity),
    /// Account created; the backend sent a confirmation email.
    ConfirmationSent { email: String },
}

#[derive(Clone)]
pub struct AuthService {
    gateway: Arc<dyn AuthGateway>,
    session: SessionStore,
    state: Arc<dyn LocalState>,
}

impl AuthService {
    pub fn new(
        gateway: Arc<dyn AuthGateway>,
        session: SessionStore,
        state: Arc<dyn LocalState>,
    ) -> Self {
        Self {
            gateway,
            session,
            state,
        }
    }

    pub async fn submit(&self, form: &AuthForm) -> Result<AuthOutcome, AppError> {
        let credentials = form.validate()?;

        match form.mode {
            AuthMode::SignUp => {
                self.gateway.sign_up(&credentials).await.map_err(|err| {
                    warn!(error = %err, "Sign-up failed");
                    AppError::from(err)
                })?;
                info!("Sign-up accepted, confirmation pending");
                Ok(AuthOutcome::ConfirmationSent {
                    email: credentials.email,
                })
            }
            AuthMode::SignIn => {
                let session = self.gateway.sign_in(&credentials).await.map_err(|err| {
                    warn!(error = %err, "Sign-in failed");
                    AppError::from(err)
                })?;
                let identity = session.user.clone();
                self.persist(&session)?;
                self.session.set(Some(session));
                info!(user_id = %identity.id, "Signed in");
                Ok(AuthOutcome::SignedIn(identity))
            }
        }
    }

    pub fn sign_out(&self) -> Result<(), AppError> {
        self.state.remove(SESSION_KEY)?;
        self.session.set(None);
        info!("Signed out");
        Ok(())
    }

    /// Load a previously persisted session into the store.
    ///
    /// An unreadable stored session is discarded rather than failing start-up.
    pub fn restore(&self) -> Result<Option<Identity>, AppError> {
        let Some(raw) = self.state.get_or_reset(SESSION_KEY)? else {
            return Ok(None);
        };

        match serde_json::from_str::<Session>(&raw) {
            Ok(session) => {
                let identity = session.user.clone();
                self.session.set(Some(session));
                Ok(Some(identity))
            }
            Err(err) => {
                warn!(error = %err, "Discarding unreadable stored session");
                self.state.remove(SESSION_KEY)?;
                Ok(None)
            }
        }
    }

    fn persist(&self, session: &Session) -> Result<(), AppError> {
        let raw = serde_json::to_string(session)
            .map_err(|err| AppError::unexpected(format!("failed to encode session: {err}")))?;
        self.state.set(SESSION_KEY, &raw)?;
        Ok(())
    }
}
