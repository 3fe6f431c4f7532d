//! Wire shapes for the hosted Spiritual Vitamins backend.
//!
//! Rows mirror the `posts`, `comments`, `likes` and `users` tables exposed by
//! the REST gateway; the auth types mirror the password-grant endpoints. The
//! client crate converts these into its domain records.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Table names exposed by the REST gateway.
pub mod tables {
    pub const POSTS: &str = "posts";
    pub const COMMENTS: &str = "comments";
    pub const LIKES: &str = "likes";
    pub const USERS: &str = "users";
}

/// Column projection used for post listings and lookups.
pub const POST_COLUMNS: &str = "id,title,content,image_url,author_id,created_at,updated_at";

/// Column projection used for comment listings.
pub const COMMENT_COLUMNS: &str = "id,post_id,user_id,content,created_at";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRow {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub author_id: Option<Uuid>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPostRow {
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
    pub author_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostPatch {
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRow {
    pub id: Uuid,
    pub post_id: Uuid,
    #[serde(default)]
    pub user_id: Option<Uuid>,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCommentRow {
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeRow {
    pub id: Uuid,
    pub post_id: Uuid,
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub anonymous_id: Option<String>,
}

/// Insert payload for a like. Exactly one of `user_id` / `anonymous_id` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLikeRow {
    pub post_id: Uuid,
    pub user_id: Option<Uuid>,
    pub anonymous_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRow {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordCredentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

/// Body returned by the password grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    pub user: AuthUser,
}

/// Error body shapes produced by the gateway, auth and storage services.
///
/// The services disagree on the field name, so every variant is optional and
/// [`ErrorBody::message`] picks the first one present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    pub fn message(&self) -> Option<&str> {
        self.message
            .as_deref()
            .or(self.msg.as_deref())
            .or(self.error_description.as_deref())
            .or(self.error.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_row_accepts_gateway_timestamps() {
        let body = r#"{
            "id": "5b0c6f0e-8a4f-4d62-9d0b-3f3c2f0f1a11",
            "title": "Hope",
            "content": "Keep going",
            "image_url": null,
            "author_id": null,
            "created_at": "2024-03-01T10:15:30.123456+00:00"
        }"#;

        let row: PostRow = serde_json::from_str(body).expect("post row");
        assert_eq!(row.title, "Hope");
        assert!(row.updated_at.is_none());
        assert_eq!(row.created_at.year(), 2024);
    }

    #[test]
    fn error_body_prefers_message_field() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#)
                .expect("error body");
        assert_eq!(body.message(), Some("Invalid login credentials"));

        let body: ErrorBody = serde_json::from_str(r#"{"message":"duplicate key"}"#).expect("body");
        assert_eq!(body.message(), Some("duplicate key"));
    }
}
