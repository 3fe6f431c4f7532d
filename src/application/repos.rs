//! Collaborator traits describing the hosted backend and client-local storage.

use std::collections::HashMap;
use std::num::NonZeroU32;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::domain::entities::{CommentRecord, PostRecord, Session, Voter};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("remote call failed: {0}")]
    Remote(String),
    #[error("backend rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("resource not found")]
    NotFound,
    #[error("not authorized: {0}")]
    Unauthorized(String),
    #[error("unexpected response body: {0}")]
    Decode(String),
    #[error("remote call timed out")]
    Timeout,
}

impl RepoError {
    pub fn from_remote(err: impl std::fmt::Display) -> Self {
        Self::Remote(err.to_string())
    }

    /// Message suitable for showing to the person who triggered the call.
    pub fn user_message(&self) -> String {
        match self {
            RepoError::Rejected { message, .. } | RepoError::Unauthorized(message) => {
                message.clone()
            }
            RepoError::NotFound => "Not found".to_string(),
            RepoError::Timeout => "The server took too long to respond".to_string(),
            RepoError::Remote(_) | RepoError::Decode(_) => {
                "Could not reach the server, please try again".to_string()
            }
        }
    }
}

/// Offset window over posts ordered newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub offset: u64,
    pub limit: u32,
}

impl PageWindow {
    pub fn for_page(page: u32, page_size: NonZeroU32) -> Self {
        Self {
            offset: u64::from(page) * u64::from(page_size.get()),
            limit: page_size.get(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePostParams {
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
    pub author_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatePostParams {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
    pub updated_at: time::OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCommentParams {
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    /// Posts ordered by creation time, newest first, within `window`.
    async fn list_posts(&self, window: PageWindow) -> Result<Vec<PostRecord>, RepoError>;

    async fn list_all_posts(&self) -> Result<Vec<PostRecord>, RepoError>;

    async fn find_post(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError>;

    async fn insert_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError>;

    async fn update_post(&self, params: UpdatePostParams) -> Result<(), RepoError>;

    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError>;
}

#[async_trait]
pub trait CommentsRepo: Send + Sync {
    /// Comments on `post_id`, newest first.
    async fn list_comments(&self, post_id: Uuid) -> Result<Vec<CommentRecord>, RepoError>;

    async fn insert_comment(&self, params: CreateCommentParams)
    -> Result<CommentRecord, RepoError>;
}

#[async_trait]
pub trait LikesRepo: Send + Sync {
    /// Id of the like row owned by `voter` on `post_id`, if any.
    async fn find_like(&self, post_id: Uuid, voter: &Voter) -> Result<Option<Uuid>, RepoError>;

    async fn count_likes(&self, post_id: Uuid) -> Result<u64, RepoError>;

    async fn insert_like(&self, post_id: Uuid, voter: &Voter) -> Result<(), RepoError>;

    async fn delete_like(&self, post_id: Uuid, voter: &Voter) -> Result<(), RepoError>;
}

#[async_trait]
pub trait UsersRepo: Send + Sync {
    /// Email addresses for the given users. Unknown ids are simply absent.
    async fn emails_for(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, String>, RepoError>;
}

#[async_trait]
pub trait AuthGateway: Send + Sync {
    async fn sign_up(&self, credentials: &Credentials) -> Result<(), RepoError>;

    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, RepoError>;
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        content_type: &str,
        payload: Bytes,
    ) -> Result<(), RepoError>;

    fn public_url(&self, bucket: &str, path: &str) -> String;
}

#[derive(Debug, Error)]
pub enum LocalStateError {
    #[error("local state io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("local state is corrupt: {0}")]
    Corrupt(String),
}

/// Small persistent key/value store living on the client.
pub trait LocalState: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, LocalStateError>;

    fn set(&self, key: &str, value: &str) -> Result<(), LocalStateError>;

    fn remove(&self, key: &str) -> Result<(), LocalStateError>;

    /// Drop every stored value.
    fn reset(&self) -> Result<(), LocalStateError>;

    /// Read `key`, wiping the store first when its contents cannot be decoded.
    fn get_or_reset(&self, key: &str) -> Result<Option<String>, LocalStateError> {
        match self.get(key) {
            Err(LocalStateError::Corrupt(reason)) => {
                warn!(key, reason = %reason, "Resetting unreadable local state");
                self.reset()?;
                Ok(None)
            }
            other => other,
        }
    }
}
