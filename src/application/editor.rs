//! Create/edit form for vitamins, including the optional image upload.

use std::num::NonZeroU64;
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use slug::slugify;
use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::application::error::AppError;
use crate::application::repos::{CreatePostParams, ObjectStorage, PostsRepo, UpdatePostParams};
use crate::application::session::SessionStore;
use crate::domain::entities::PostRecord;
use crate::domain::error::DomainError;
use crate::util::bytes::format_bytes;

/// An image picked for upload, already checked for type and size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    file_name: String,
    content_type: String,
    payload: Bytes,
}

impl ImageAttachment {
    /// Validate a picked file before it is attached to the form.
    ///
    /// The name must map to an `image/*` MIME type, the payload must not exceed
    /// `max_bytes`, and the bytes must carry a recognizable image header.
    pub fn new(
        file_name: impl Into<String>,
        payload: Bytes,
        max_bytes: NonZeroU64,
    ) -> Result<Self, DomainError> {
        let file_name = file_name.into();

        if payload.is_empty() {
            return Err(DomainError::validation("Image file is empty"));
        }
        if payload.len() as u64 > max_bytes.get() {
            return Err(DomainError::validation(format!(
                "Image must be at most {}",
                format_bytes(max_bytes.get())
            )));
        }

        let content_type = mime_guess::from_path(&file_name)
            .first_raw()
            .filter(|mime| mime.starts_with("image/"))
            .ok_or_else(|| DomainError::validation("Please choose an image file"))?
            .to_string();

        if imagesize::blob_size(&payload).is_err() {
            return Err(DomainError::validation(
                "The selected file is not a readable image",
            ));
        }

        Ok(Self {
            file_name,
            content_type,
            payload,
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Unique object path: `<uuid>-<slugified stem>.<ext>`.
    fn storage_path(&self) -> String {
        let path = Path::new(&self.file_name);
        let stem = path
            .file_stem()
            .map(|stem| slugify(stem.to_string_lossy()))
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_else(|| "img".to_string());

        let id = Uuid::new_v4();
        if stem.is_empty() {
            format!("{id}.{extension}")
        } else {
            format!("{id}-{stem}.{extension}")
        }
    }
}

/// Local state of the create/edit form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostForm {
    pub title: String,
    pub content: String,
    image: Option<ImageAttachment>,
    editing: Option<PostRecord>,
    submitting: bool,
    error: Option<String>,
}

impl PostForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Form pre-filled from an existing post.
    pub fn edit(post: PostRecord) -> Self {
        Self {
            title: post.title.clone(),
            content: post.content.clone(),
            image: None,
            editing: Some(post),
            submitting: false,
            error: None,
        }
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    pub fn editing(&self) -> Option<&PostRecord> {
        self.editing.as_ref()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn image(&self) -> Option<&ImageAttachment> {
        self.image.as_ref()
    }

    pub fn attach_image(&mut self, image: ImageAttachment) {
        self.image = Some(image);
    }

    pub fn clear_image(&mut self) {
        self.image = None;
    }

    /// Image URL the post will carry once saved, ignoring a pending upload.
    pub fn current_image_url(&self) -> Option<&str> {
        self.editing
            .as_ref()
            .and_then(|post| post.image_url.as_deref())
    }

    fn validate(&self) -> Result<(), DomainError> {
        if self.title.trim().is_empty() {
            return Err(DomainError::validation("Title is required"));
        }
        if self.content.trim().is_empty() {
            return Err(DomainError::validation("Content is required"));
        }
        Ok(())
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Result of a successful submit, handed back so the caller can refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SavedPost {
    Created(PostRecord),
    Updated(PostRecord),
}

impl SavedPost {
    pub fn post(&self) -> &PostRecord {
        match self {
            SavedPost::Created(post) | SavedPost::Updated(post) => post,
        }
    }
}

#[derive(Clone)]
pub struct PostEditor {
    posts: Arc<dyn PostsRepo>,
    storage: Arc<dyn ObjectStorage>,
    session: SessionStore,
    bucket: String,
}

impl PostEditor {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        storage: Arc<dyn ObjectStorage>,
        session: SessionStore,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            posts,
            storage,
            session,
            bucket: bucket.into(),
        }
    }

    /// Validate, upload the attached image if any, then write exactly one row.
    ///
    /// On success the form is cleared. On failure the field values are kept,
    /// the error message is stored on the form, and nothing is retried.
    pub async fn submit(&self, form: &mut PostForm) -> Result<SavedPost, AppError> {
        form.error = None;
        form.submitting = true;
        let result = self.save(form).await;
        form.submitting = false;

        match result {
            Ok(saved) => {
                form.reset();
                Ok(saved)
            }
            Err(err) => {
                form.error = Some(err.presentation_message());
                Err(err)
            }
        }
    }

    async fn save(&self, form: &PostForm) -> Result<SavedPost, AppError> {
        form.validate()?;

        let author = match &form.editing {
            Some(_) => None,
            None => Some(self.session.identity().ok_or(AppError::SignInRequired)?),
        };

        let uploaded_url = match &form.image {
            Some(image) => Some(self.upload(image).await?),
            None => None,
        };

        let title = form.title.trim().to_string();
        let content = form.content.clone();

        match (&form.editing, author) {
            (Some(existing), _) => {
                let image_url = uploaded_url.or_else(|| existing.image_url.clone());
                let updated_at = OffsetDateTime::now_utc();
                self.posts
                    .update_post(UpdatePostParams {
                        id: existing.id,
                        title: title.clone(),
                        content: content.clone(),
                        image_url: image_url.clone(),
                        updated_at,
                    })
                    .await?;

                info!(post_id = %existing.id, "Updated vitamin");
                Ok(SavedPost::Updated(PostRecord {
                    title,
                    content,
                    image_url,
                    updated_at: Some(updated_at),
                    ..existing.clone()
                }))
            }
            (None, Some(author)) => {
                let post = self
                    .posts
                    .insert_post(CreatePostParams {
                        title,
                        content,
                        image_url: uploaded_url,
                        author_id: author.id,
                    })
                    .await?;

                info!(post_id = %post.id, author_id = %author.id, "Created vitamin");
                Ok(SavedPost::Created(post))
            }
            (None, None) => Err(AppError::SignInRequired),
        }
    }

    async fn upload(&self, image: &ImageAttachment) -> Result<String, AppError> {
        let path = image.storage_path();
        self.storage
            .upload(
                &self.bucket,
                &path,
                image.content_type(),
                image.payload.clone(),
            )
            .await
            .map_err(|err| {
                warn!(bucket = %self.bucket, path = %path, error = %err, "Image upload failed");
                err
            })?;

        Ok(self.storage.public_url(&self.bucket, &path))
    }
}
