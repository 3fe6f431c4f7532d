//! Single-vitamin lookup for the detail screen.

use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::application::error::AppError;
use crate::application::repos::{PostsRepo, RepoError};
use crate::domain::entities::PostRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostDetail {
    Found(PostRecord),
    /// The id resolves to nothing: deleted, never existed, or hidden.
    NotFound,
}

#[derive(Clone)]
pub struct PostDetailService {
    posts: Arc<dyn PostsRepo>,
}

impl PostDetailService {
    pub fn new(posts: Arc<dyn PostsRepo>) -> Self {
        Self { posts }
    }

    /// Look a vitamin up by id. Missing rows are a state, not an error.
    pub async fn load(&self, id: Uuid) -> Result<PostDetail, AppError> {
        match self.posts.find_post(id).await {
            Ok(Some(post)) => Ok(PostDetail::Found(post)),
            Ok(None) | Err(RepoError::NotFound) => {
                debug!(post_id = %id, "Vitamin not found");
                Ok(PostDetail::NotFound)
            }
            Err(err) => {
                warn!(post_id = %id, error = %err, "Failed to load vitamin");
                Err(err.into())
            }
        }
    }
}
