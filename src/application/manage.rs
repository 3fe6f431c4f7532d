//! Author-facing management list: every vitamin, with edit and delete.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::application::editor::{PostForm, SavedPost};
use crate::application::error::AppError;
use crate::application::repos::PostsRepo;
use crate::domain::entities::PostRecord;

/// Whether the author confirmed a destructive action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Declined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Cancelled,
}

pub struct ManageVitamins {
    posts: Arc<dyn PostsRepo>,
    listed: Vec<PostRecord>,
}

impl ManageVitamins {
    pub fn new(posts: Arc<dyn PostsRepo>) -> Self {
        Self {
            posts,
            listed: Vec::new(),
        }
    }

    /// Posts newest first, as of the last refresh.
    pub fn posts(&self) -> &[PostRecord] {
        &self.listed
    }

    pub async fn refresh(&mut self) -> Result<(), AppError> {
        match self.posts.list_all_posts().await {
            Ok(posts) => {
                self.listed = posts;
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "Failed to load vitamins for management");
                Err(err.into())
            }
        }
    }

    /// Delete a vitamin once confirmed; the local row goes only after the
    /// backend accepted the delete.
    pub async fn delete(
        &mut self,
        id: Uuid,
        confirmation: Confirmation,
    ) -> Result<DeleteOutcome, AppError> {
        if confirmation == Confirmation::Declined {
            return Ok(DeleteOutcome::Cancelled);
        }

        self.posts.delete_post(id).await.map_err(|err| {
            warn!(post_id = %id, error = %err, "Failed to delete vitamin");
            AppError::from(err)
        })?;

        self.listed.retain(|post| post.id != id);
        info!(post_id = %id, "Deleted vitamin");
        Ok(DeleteOutcome::Deleted)
    }

    /// Edit form seeded from a listed vitamin.
    pub fn begin_edit(&self, id: Uuid) -> Option<PostForm> {
        self.listed
            .iter()
            .find(|post| post.id == id)
            .cloned()
            .map(PostForm::edit)
    }

    /// Refetch after a create or update so the list reflects the backend.
    pub async fn after_save(&mut self, saved: &SavedPost) -> Result<(), AppError> {
        info!(post_id = %saved.post().id, "Refreshing management list after save");
        self.refresh().await
    }
}
