//! Comment thread shown under a vitamin.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::application::error::AppError;
use crate::application::repos::{CommentsRepo, CreateCommentParams, UsersRepo};
use crate::application::session::SessionStore;
use crate::domain::entities::CommentRecord;
use crate::domain::error::DomainError;
use crate::domain::routes::Route;

/// Shown when a comment's author cannot be resolved.
pub const ANONYMOUS_AUTHOR: &str = "Anonymous";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentOutcome {
    Posted(CommentRecord),
    /// Nobody is signed in; the caller should navigate here instead.
    SignInRequired(Route),
}

pub struct CommentThread {
    comments_repo: Arc<dyn CommentsRepo>,
    users: Arc<dyn UsersRepo>,
    session: SessionStore,
    post_id: Uuid,
    comments: Vec<CommentRecord>,
    authors: HashMap<Uuid, String>,
}

impl CommentThread {
    pub fn new(
        comments_repo: Arc<dyn CommentsRepo>,
        users: Arc<dyn UsersRepo>,
        session: SessionStore,
        post_id: Uuid,
    ) -> Self {
        Self {
            comments_repo,
            users,
            session,
            post_id,
            comments: Vec::new(),
            authors: HashMap::new(),
        }
    }

    pub fn post_id(&self) -> Uuid {
        self.post_id
    }

    /// Comments newest first.
    pub fn comments(&self) -> &[CommentRecord] {
        &self.comments
    }

    pub fn can_comment(&self) -> bool {
        self.session.is_signed_in()
    }

    pub fn display_name(&self, comment: &CommentRecord) -> &str {
        comment
            .user_id
            .and_then(|id| self.authors.get(&id))
            .map(String::as_str)
            .unwrap_or(ANONYMOUS_AUTHOR)
    }

    /// Fetch the thread and resolve author emails in one batched lookup.
    ///
    /// A failed author lookup is logged and leaves authors as "Anonymous".
    pub async fn load(&mut self) -> Result<(), AppError> {
        let comments = self.comments_repo.list_comments(self.post_id).await?;

        let mut author_ids: Vec<Uuid> = comments.iter().filter_map(|c| c.user_id).collect();
        author_ids.sort_unstable();
        author_ids.dedup();

        let authors = if author_ids.is_empty() {
            HashMap::new()
        } else {
            match self.users.emails_for(&author_ids).await {
                Ok(authors) => authors,
                Err(err) => {
                    warn!(post_id = %self.post_id, error = %err, "Failed to resolve comment authors");
                    HashMap::new()
                }
            }
        };

        self.comments = comments;
        self.authors = authors;
        Ok(())
    }

    /// Post a comment as the signed-in user and show it at the top.
    ///
    /// Without a session nothing is sent and the caller is pointed at the
    /// login screen. Blank text is rejected locally.
    pub async fn add_comment(&mut self, text: &str) -> Result<CommentOutcome, AppError> {
        let Some(identity) = self.session.identity() else {
            return Ok(CommentOutcome::SignInRequired(Route::Login));
        };

        let content = text.trim();
        if content.is_empty() {
            return Err(DomainError::validation("Comment cannot be empty").into());
        }

        let result = self
            .comments_repo
            .insert_comment(CreateCommentParams {
                post_id: self.post_id,
                user_id: identity.id,
                content: content.to_string(),
            })
            .await;

        let comment = result.map_err(|err| {
            warn!(post_id = %self.post_id, error = %err, "Failed to add comment");
            AppError::from(err)
        })?;

        if let Some(email) = identity.email {
            self.authors.entry(identity.id).or_insert(email);
        }
        self.comments.insert(0, comment.clone());
        info!(post_id = %self.post_id, comment_id = %comment.id, "Added comment");

        Ok(CommentOutcome::Posted(comment))
    }
}
