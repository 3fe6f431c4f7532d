//! Wiring of collaborators into the screen controllers.

use std::num::{NonZeroU32, NonZeroU64};
use std::sync::Arc;

use uuid::Uuid;

use crate::application::auth::AuthService;
use crate::application::comments::CommentThread;
use crate::application::detail::PostDetailService;
use crate::application::editor::PostEditor;
use crate::application::error::AppError;
use crate::application::likes::{LikeButton, resolve_voter};
use crate::application::listing::VitaminListing;
use crate::application::manage::ManageVitamins;
use crate::application::repos::{
    AuthGateway, CommentsRepo, LikesRepo, LocalState, ObjectStorage, PostsRepo, UsersRepo,
};
use crate::application::session::SessionStore;
use crate::config::Settings;

pub const DEFAULT_PAGE_SIZE: u32 = 9;
pub const DEFAULT_IMAGE_BUCKET: &str = "vitamin-images";
pub const DEFAULT_MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

/// Tunables the controllers need from configuration.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub page_size: NonZeroU32,
    pub image_bucket: String,
    pub max_image_bytes: NonZeroU64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            page_size: NonZeroU32::new(DEFAULT_PAGE_SIZE).unwrap_or(NonZeroU32::MIN),
            image_bucket: DEFAULT_IMAGE_BUCKET.to_string(),
            max_image_bytes: NonZeroU64::new(DEFAULT_MAX_IMAGE_BYTES).unwrap_or(NonZeroU64::MIN),
        }
    }
}

impl From<&Settings> for ClientOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            page_size: settings.listing.page_size,
            image_bucket: settings.storage.bucket.clone(),
            max_image_bytes: settings.storage.max_image_bytes,
        }
    }
}

/// Everything a screen needs to talk to the backend and local storage.
#[derive(Clone)]
pub struct ClientContext {
    pub posts: Arc<dyn PostsRepo>,
    pub comments: Arc<dyn CommentsRepo>,
    pub likes: Arc<dyn LikesRepo>,
    pub users: Arc<dyn UsersRepo>,
    pub auth: Arc<dyn AuthGateway>,
    pub storage: Arc<dyn ObjectStorage>,
    pub local: Arc<dyn LocalState>,
    pub session: SessionStore,
    pub options: ClientOptions,
}

impl ClientContext {
    /// Build a context from one backend implementing every collaborator trait.
    pub fn from_backend<B>(
        backend: Arc<B>,
        local: Arc<dyn LocalState>,
        session: SessionStore,
        options: ClientOptions,
    ) -> Self
    where
        B: PostsRepo
            + CommentsRepo
            + LikesRepo
            + UsersRepo
            + AuthGateway
            + ObjectStorage
            + 'static,
    {
        Self {
            posts: backend.clone(),
            comments: backend.clone(),
            likes: backend.clone(),
            users: backend.clone(),
            auth: backend.clone(),
            storage: backend,
            local,
            session,
            options,
        }
    }

    pub fn listing(&self) -> VitaminListing {
        VitaminListing::new(self.posts.clone(), self.options.page_size)
    }

    pub fn detail(&self) -> PostDetailService {
        PostDetailService::new(self.posts.clone())
    }

    pub fn editor(&self) -> PostEditor {
        PostEditor::new(
            self.posts.clone(),
            self.storage.clone(),
            self.session.clone(),
            self.options.image_bucket.clone(),
        )
    }

    pub fn manage(&self) -> ManageVitamins {
        ManageVitamins::new(self.posts.clone())
    }

    pub fn auth_service(&self) -> AuthService {
        AuthService::new(self.auth.clone(), self.session.clone(), self.local.clone())
    }

    pub fn comment_thread(&self, post_id: Uuid) -> CommentThread {
        CommentThread::new(
            self.comments.clone(),
            self.users.clone(),
            self.session.clone(),
            post_id,
        )
    }

    /// Like button for the current voter, creating the anonymous token if needed.
    pub fn like_button(&self, post_id: Uuid) -> Result<LikeButton, AppError> {
        let voter = resolve_voter(&self.session, self.local.as_ref())?;
        Ok(LikeButton::new(self.likes.clone(), post_id, voter))
    }
}
