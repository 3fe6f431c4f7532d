//! Subscribable holder of the current sign-in session.

use std::sync::Arc;

use tokio::sync::watch;

use crate::domain::entities::{Identity, Session};

/// Shared view of who is signed in.
///
/// Reads are synchronous snapshots. Components that need to react to sign-in
/// or sign-out hold a receiver from [`SessionStore::subscribe`].
#[derive(Debug, Clone)]
pub struct SessionStore {
    tx: Arc<watch::Sender<Option<Session>>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(None)
    }
}

impl SessionStore {
    pub fn new(initial: Option<Session>) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    pub fn current(&self) -> Option<Session> {
        self.tx.borrow().clone()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.tx.borrow().as_ref().map(|session| session.user.clone())
    }

    pub fn access_token(&self) -> Option<String> {
        self.tx
            .borrow()
            .as_ref()
            .map(|session| session.access_token.clone())
    }

    pub fn is_signed_in(&self) -> bool {
        self.tx.borrow().is_some()
    }

    pub fn set(&self, session: Option<Session>) {
        self.tx.send_replace(session);
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn session(email: &str) -> Session {
        Session {
            access_token: "token".into(),
            refresh_token: None,
            expires_at: None,
            user: Identity {
                id: Uuid::new_v4(),
                email: Some(email.to_string()),
            },
        }
    }

    #[test]
    fn snapshots_follow_updates() {
        let store = SessionStore::default();
        assert!(store.identity().is_none());

        let signed_in = session("reader@example.com");
        store.set(Some(signed_in.clone()));
        assert_eq!(store.identity(), Some(signed_in.user));
        assert_eq!(store.access_token().as_deref(), Some("token"));

        store.set(None);
        assert!(!store.is_signed_in());
    }

    #[tokio::test]
    async fn subscribers_are_notified() {
        let store = SessionStore::default();
        let mut rx = store.subscribe();

        let clone = store.clone();
        clone.set(Some(session("author@example.com")));

        rx.changed().await.expect("sender alive");
        let email = rx
            .borrow()
            .as_ref()
            .and_then(|session| session.user.email.clone());
        assert_eq!(email.as_deref(), Some("author@example.com"));
    }
}
