//! Like button state and the anonymous voter token.

use std::sync::{Arc, Mutex};

use tracing::{info, warn};
use uuid::Uuid;

use crate::application::error::AppError;
use crate::application::repos::{LikesRepo, LocalState};
use crate::application::session::SessionStore;
use crate::domain::entities::Voter;
use crate::util::lock::mutex_lock;

/// Local storage key holding the anonymous voter token.
pub const ANONYMOUS_ID_KEY: &str = "anonymous_user_id";

const LOCK_TARGET: &str = "application::likes";

/// Return the persisted anonymous token, generating and storing one on first use.
pub fn anonymous_voter_id(state: &dyn LocalState) -> Result<String, AppError> {
    if let Some(existing) = state.get_or_reset(ANONYMOUS_ID_KEY)? {
        if !existing.trim().is_empty() {
            return Ok(existing);
        }
    }

    let token = Uuid::new_v4().to_string();
    state.set(ANONYMOUS_ID_KEY, &token)?;
    info!("Generated anonymous voter id");
    Ok(token)
}

/// The signed-in member when there is one, the anonymous token otherwise.
pub fn resolve_voter(session: &SessionStore, state: &dyn LocalState) -> Result<Voter, AppError> {
    match session.identity() {
        Some(identity) => Ok(Voter::Member(identity.id)),
        None => anonymous_voter_id(state).map(Voter::Anonymous),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LikeSnapshot {
    pub liked: bool,
    pub count: u64,
    pub busy: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Applied(LikeSnapshot),
    /// Another toggle or refresh is still running; nothing was sent.
    InFlight,
}

/// Clears the busy flag when dropped, however the operation ended.
struct BusyGuard<'a> {
    state: &'a Mutex<LikeSnapshot>,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        mutex_lock(self.state, LOCK_TARGET, "busy_release").busy = false;
    }
}

#[derive(Clone)]
pub struct LikeButton {
    likes: Arc<dyn LikesRepo>,
    post_id: Uuid,
    voter: Voter,
    state: Arc<Mutex<LikeSnapshot>>,
}

impl LikeButton {
    pub fn new(likes: Arc<dyn LikesRepo>, post_id: Uuid, voter: Voter) -> Self {
        Self {
            likes,
            post_id,
            voter,
            state: Arc::new(Mutex::new(LikeSnapshot::default())),
        }
    }

    pub fn post_id(&self) -> Uuid {
        self.post_id
    }

    pub fn voter(&self) -> &Voter {
        &self.voter
    }

    pub fn snapshot(&self) -> LikeSnapshot {
        *mutex_lock(&self.state, LOCK_TARGET, "snapshot")
    }

    fn try_acquire(&self) -> Option<BusyGuard<'_>> {
        let mut state = mutex_lock(&self.state, LOCK_TARGET, "acquire");
        if state.busy {
            return None;
        }
        state.busy = true;
        Some(BusyGuard { state: &self.state })
    }

    /// Load whether this voter liked the post and the total like count.
    pub async fn refresh(&self) -> Result<ToggleOutcome, AppError> {
        let Some(_guard) = self.try_acquire() else {
            return Ok(ToggleOutcome::InFlight);
        };

        let liked = self.likes.find_like(self.post_id, &self.voter).await?.is_some();
        let count = self.likes.count_likes(self.post_id).await?;

        let mut state = mutex_lock(&self.state, LOCK_TARGET, "refresh");
        state.liked = liked;
        state.count = count;
        Ok(ToggleOutcome::Applied(LikeSnapshot {
            busy: false,
            ..*state
        }))
    }

    /// Flip this voter's like on the post.
    ///
    /// Reads the remote row first, then deletes or inserts it. The displayed
    /// count moves by one and never drops below zero. A failed call leaves
    /// the displayed state unchanged.
    pub async fn toggle(&self) -> Result<ToggleOutcome, AppError> {
        let Some(_guard) = self.try_acquire() else {
            return Ok(ToggleOutcome::InFlight);
        };

        let existing = self.likes.find_like(self.post_id, &self.voter).await;
        let result = match existing {
            Ok(Some(_)) => self
                .likes
                .delete_like(self.post_id, &self.voter)
                .await
                .map(|()| false),
            Ok(None) => self
                .likes
                .insert_like(self.post_id, &self.voter)
                .await
                .map(|()| true),
            Err(err) => Err(err),
        };

        let liked = match result {
            Ok(liked) => liked,
            Err(err) => {
                warn!(post_id = %self.post_id, error = %err, "Failed to toggle like");
                return Err(err.into());
            }
        };

        let mut state = mutex_lock(&self.state, LOCK_TARGET, "toggle");
        state.liked = liked;
        state.count = if liked {
            state.count.saturating_add(1)
        } else {
            state.count.saturating_sub(1)
        };
        info!(post_id = %self.post_id, liked, count = state.count, "Toggled like");

        Ok(ToggleOutcome::Applied(LikeSnapshot {
            busy: false,
            ..*state
        }))
    }
}
