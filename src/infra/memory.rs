//! In-process backend with call recording, failure injection and latency.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use crate::application::repos::{
    AuthGateway, CommentsRepo, CreateCommentParams, CreatePostParams, Credentials, LikesRepo,
    ObjectStorage, PageWindow, PostsRepo, RepoError, UpdatePostParams, UsersRepo,
};
use crate::domain::entities::{CommentRecord, Identity, PostRecord, Session, Voter};
use crate::util::lock::mutex_lock;

const TARGET: &str = "infra::memory";

#[derive(Debug, Clone)]
struct LikeEntry {
    id: Uuid,
    post_id: Uuid,
    voter: Voter,
}

#[derive(Debug, Clone)]
struct Account {
    identity: Identity,
    password: String,
}

#[derive(Debug, Default)]
struct Tables {
    posts: Vec<PostRecord>,
    comments: Vec<CommentRecord>,
    likes: Vec<LikeEntry>,
    accounts: HashMap<String, Account>,
    objects: HashMap<String, (String, Bytes)>,
}

/// Backend double holding every table in memory.
///
/// Each trait call is recorded by operation name (`"list_posts"`,
/// `"insert_like"`, ...). [`MemoryBackend::fail_next`] queues an error for the
/// next call of an operation; [`MemoryBackend::delay_next`] queues latency.
/// Reads capture their result before sleeping, so a delayed response reflects
/// the data at the time it was requested.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    tables: Mutex<Tables>,
    calls: Mutex<Vec<&'static str>>,
    failures: Mutex<HashMap<&'static str, VecDeque<RepoError>>>,
    delays: Mutex<HashMap<&'static str, VecDeque<Duration>>>,
    clock: Mutex<Option<OffsetDateTime>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend pre-filled with a handful of vitamins for offline use.
    pub fn with_sample_content() -> Self {
        let backend = Self::new();
        let samples = [
            (
                "Faith for Today",
                "Faith does not make things easy.\nIt makes them possible.",
            ),
            (
                "Hope & Grace",
                "Hope is the anchor of the soul.\nGrace is the wind in the sails.",
            ),
            (
                "Quiet Mornings",
                "Begin the day in stillness.\nListen before you speak.",
            ),
        ];
        for (title, content) in samples {
            backend.seed_post(title, content);
        }
        backend
    }

    /// Insert a post with a creation time later than every existing post.
    pub fn seed_post(&self, title: &str, content: &str) -> PostRecord {
        let post = PostRecord {
            id: Uuid::new_v4(),
            title: title.to_string(),
            content: content.to_string(),
            image_url: None,
            author_id: None,
            created_at: self.tick(),
            updated_at: None,
        };
        mutex_lock(&self.tables, TARGET, "seed_post")
            .posts
            .push(post.clone());
        post
    }

    pub fn seed_posts(&self, count: usize) -> Vec<PostRecord> {
        (0..count)
            .map(|index| self.seed_post(&format!("Vitamin {}", index + 1), "Take daily."))
            .collect()
    }

    /// Register an account that can sign in immediately.
    pub fn seed_account(&self, email: &str, password: &str) -> Identity {
        let identity = Identity {
            id: Uuid::new_v4(),
            email: Some(email.to_string()),
        };
        mutex_lock(&self.tables, TARGET, "seed_account").accounts.insert(
            email.to_string(),
            Account {
                identity: identity.clone(),
                password: password.to_string(),
            },
        );
        identity
    }

    pub fn seed_comment(&self, post_id: Uuid, user_id: Option<Uuid>, content: &str) -> CommentRecord {
        let comment = CommentRecord {
            id: Uuid::new_v4(),
            post_id,
            user_id,
            content: content.to_string(),
            created_at: self.tick(),
        };
        mutex_lock(&self.tables, TARGET, "seed_comment")
            .comments
            .push(comment.clone());
        comment
    }

    pub fn seed_like(&self, post_id: Uuid, voter: Voter) {
        mutex_lock(&self.tables, TARGET, "seed_like")
            .likes
            .push(LikeEntry {
                id: Uuid::new_v4(),
                post_id,
                voter,
            });
    }

    /// Queue `error` to be returned by the next call of `op`.
    pub fn fail_next(&self, op: &'static str, error: RepoError) {
        mutex_lock(&self.failures, TARGET, "fail_next")
            .entry(op)
            .or_default()
            .push_back(error);
    }

    /// Queue `delay` before the next call of `op` completes.
    pub fn delay_next(&self, op: &'static str, delay: Duration) {
        mutex_lock(&self.delays, TARGET, "delay_next")
            .entry(op)
            .or_default()
            .push_back(delay);
    }

    pub fn calls(&self) -> Vec<&'static str> {
        mutex_lock(&self.calls, TARGET, "calls").clone()
    }

    pub fn call_count(&self, op: &str) -> usize {
        mutex_lock(&self.calls, TARGET, "call_count")
            .iter()
            .filter(|recorded| **recorded == op)
            .count()
    }

    /// Number of recorded calls. `public_url` is computed locally and never counts.
    pub fn total_calls(&self) -> usize {
        mutex_lock(&self.calls, TARGET, "total_calls").len()
    }

    pub fn posts(&self) -> Vec<PostRecord> {
        let mut posts = mutex_lock(&self.tables, TARGET, "posts").posts.clone();
        newest_first(&mut posts);
        posts
    }

    pub fn likes_on(&self, post_id: Uuid) -> usize {
        mutex_lock(&self.tables, TARGET, "likes_on")
            .likes
            .iter()
            .filter(|like| like.post_id == post_id)
            .count()
    }

    pub fn object(&self, bucket: &str, path: &str) -> Option<(String, Bytes)> {
        mutex_lock(&self.tables, TARGET, "object")
            .objects
            .get(&object_key(bucket, path))
            .cloned()
    }

    /// Record the call, then either fail or return the queued latency.
    fn enter(&self, op: &'static str) -> Result<Option<Duration>, RepoError> {
        mutex_lock(&self.calls, TARGET, "enter").push(op);
        debug!(op, "Memory backend call");

        if let Some(error) = mutex_lock(&self.failures, TARGET, "enter")
            .get_mut(op)
            .and_then(VecDeque::pop_front)
        {
            return Err(error);
        }

        Ok(mutex_lock(&self.delays, TARGET, "enter")
            .get_mut(op)
            .and_then(VecDeque::pop_front))
    }

    async fn settle(delay: Option<Duration>) {
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn tick(&self) -> OffsetDateTime {
        let mut clock = mutex_lock(&self.clock, TARGET, "tick");
        let next = match *clock {
            Some(last) => last + time::Duration::seconds(1),
            None => OffsetDateTime::now_utc(),
        };
        *clock = Some(next);
        next
    }
}

fn newest_first(posts: &mut [PostRecord]) {
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

fn object_key(bucket: &str, path: &str) -> String {
    format!("{bucket}/{path}")
}

#[async_trait]
impl PostsRepo for MemoryBackend {
    async fn list_posts(&self, window: PageWindow) -> Result<Vec<PostRecord>, RepoError> {
        let delay = self.enter("list_posts")?;
        let page = {
            let mut posts = mutex_lock(&self.tables, TARGET, "list_posts").posts.clone();
            newest_first(&mut posts);
            let offset = usize::try_from(window.offset).unwrap_or(usize::MAX);
            posts
                .into_iter()
                .skip(offset)
                .take(window.limit as usize)
                .collect::<Vec<_>>()
        };
        Self::settle(delay).await;
        Ok(page)
    }

    async fn list_all_posts(&self) -> Result<Vec<PostRecord>, RepoError> {
        let delay = self.enter("list_all_posts")?;
        let posts = self.posts();
        Self::settle(delay).await;
        Ok(posts)
    }

    async fn find_post(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError> {
        let delay = self.enter("find_post")?;
        let found = mutex_lock(&self.tables, TARGET, "find_post")
            .posts
            .iter()
            .find(|post| post.id == id)
            .cloned();
        Self::settle(delay).await;
        Ok(found)
    }

    async fn insert_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let delay = self.enter("insert_post")?;
        Self::settle(delay).await;
        let post = PostRecord {
            id: Uuid::new_v4(),
            title: params.title,
            content: params.content,
            image_url: params.image_url,
            author_id: Some(params.author_id),
            created_at: self.tick(),
            updated_at: None,
        };
        mutex_lock(&self.tables, TARGET, "insert_post")
            .posts
            .push(post.clone());
        Ok(post)
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<(), RepoError> {
        let delay = self.enter("update_post")?;
        Self::settle(delay).await;
        let mut tables = mutex_lock(&self.tables, TARGET, "update_post");
        let post = tables
            .posts
            .iter_mut()
            .find(|post| post.id == params.id)
            .ok_or(RepoError::NotFound)?;
        post.title = params.title;
        post.content = params.content;
        post.image_url = params.image_url;
        post.updated_at = Some(params.updated_at);
        Ok(())
    }

    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError> {
        let delay = self.enter("delete_post")?;
        Self::settle(delay).await;
        let mut tables = mutex_lock(&self.tables, TARGET, "delete_post");
        let before = tables.posts.len();
        tables.posts.retain(|post| post.id != id);
        if tables.posts.len() == before {
            return Err(RepoError::NotFound);
        }
        tables.comments.retain(|comment| comment.post_id != id);
        tables.likes.retain(|like| like.post_id != id);
        Ok(())
    }
}

#[async_trait]
impl CommentsRepo for MemoryBackend {
    async fn list_comments(&self, post_id: Uuid) -> Result<Vec<CommentRecord>, RepoError> {
        let delay = self.enter("list_comments")?;
        let mut comments: Vec<CommentRecord> = mutex_lock(&self.tables, TARGET, "list_comments")
            .comments
            .iter()
            .filter(|comment| comment.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Self::settle(delay).await;
        Ok(comments)
    }

    async fn insert_comment(
        &self,
        params: CreateCommentParams,
    ) -> Result<CommentRecord, RepoError> {
        let delay = self.enter("insert_comment")?;
        Self::settle(delay).await;
        let comment = CommentRecord {
            id: Uuid::new_v4(),
            post_id: params.post_id,
            user_id: Some(params.user_id),
            content: params.content,
            created_at: self.tick(),
        };
        mutex_lock(&self.tables, TARGET, "insert_comment")
            .comments
            .push(comment.clone());
        Ok(comment)
    }
}

#[async_trait]
impl LikesRepo for MemoryBackend {
    async fn find_like(&self, post_id: Uuid, voter: &Voter) -> Result<Option<Uuid>, RepoError> {
        let delay = self.enter("find_like")?;
        let found = mutex_lock(&self.tables, TARGET, "find_like")
            .likes
            .iter()
            .find(|like| like.post_id == post_id && &like.voter == voter)
            .map(|like| like.id);
        Self::settle(delay).await;
        Ok(found)
    }

    async fn count_likes(&self, post_id: Uuid) -> Result<u64, RepoError> {
        let delay = self.enter("count_likes")?;
        let count = self.likes_on(post_id) as u64;
        Self::settle(delay).await;
        Ok(count)
    }

    async fn insert_like(&self, post_id: Uuid, voter: &Voter) -> Result<(), RepoError> {
        let delay = self.enter("insert_like")?;
        Self::settle(delay).await;
        let mut tables = mutex_lock(&self.tables, TARGET, "insert_like");
        if tables
            .likes
            .iter()
            .any(|like| like.post_id == post_id && &like.voter == voter)
        {
            return Err(RepoError::Rejected {
                status: 409,
                message: "duplicate key value violates unique constraint".to_string(),
            });
        }
        tables.likes.push(LikeEntry {
            id: Uuid::new_v4(),
            post_id,
            voter: voter.clone(),
        });
        Ok(())
    }

    async fn delete_like(&self, post_id: Uuid, voter: &Voter) -> Result<(), RepoError> {
        let delay = self.enter("delete_like")?;
        Self::settle(delay).await;
        mutex_lock(&self.tables, TARGET, "delete_like")
            .likes
            .retain(|like| !(like.post_id == post_id && &like.voter == voter));
        Ok(())
    }
}

#[async_trait]
impl UsersRepo for MemoryBackend {
    async fn emails_for(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, String>, RepoError> {
        let delay = self.enter("emails_for")?;
        let found: HashMap<Uuid, String> = mutex_lock(&self.tables, TARGET, "emails_for")
            .accounts
            .values()
            .filter(|account| ids.contains(&account.identity.id))
            .filter_map(|account| {
                account
                    .identity
                    .email
                    .clone()
                    .map(|email| (account.identity.id, email))
            })
            .collect();
        Self::settle(delay).await;
        Ok(found)
    }
}

#[async_trait]
impl AuthGateway for MemoryBackend {
    async fn sign_up(&self, credentials: &Credentials) -> Result<(), RepoError> {
        let delay = self.enter("sign_up")?;
        Self::settle(delay).await;
        let mut tables = mutex_lock(&self.tables, TARGET, "sign_up");
        if tables.accounts.contains_key(&credentials.email) {
            return Err(RepoError::Rejected {
                status: 422,
                message: "User already registered".to_string(),
            });
        }
        tables.accounts.insert(
            credentials.email.clone(),
            Account {
                identity: Identity {
                    id: Uuid::new_v4(),
                    email: Some(credentials.email.clone()),
                },
                password: credentials.password.clone(),
            },
        );
        Ok(())
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, RepoError> {
        let delay = self.enter("sign_in")?;
        Self::settle(delay).await;
        let tables = mutex_lock(&self.tables, TARGET, "sign_in");
        let account = tables
            .accounts
            .get(&credentials.email)
            .filter(|account| account.password == credentials.password)
            .ok_or_else(|| RepoError::Rejected {
                status: 400,
                message: "Invalid login credentials".to_string(),
            })?;
        Ok(Session {
            access_token: format!("memory-{}", Uuid::new_v4()),
            refresh_token: None,
            expires_at: None,
            user: account.identity.clone(),
        })
    }
}

#[async_trait]
impl ObjectStorage for MemoryBackend {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        content_type: &str,
        payload: Bytes,
    ) -> Result<(), RepoError> {
        let delay = self.enter("upload")?;
        Self::settle(delay).await;
        mutex_lock(&self.tables, TARGET, "upload")
            .objects
            .insert(object_key(bucket, path), (content_type.to_string(), payload));
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("memory://{bucket}/{path}")
    }
}
