//! Domain records mirrored from the hosted backend.
//!
//! The client only ever holds transient copies; every mutation goes through a
//! repository and local state is updated from what the backend confirmed.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::slug::generate_slug;

/// A published vitamin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostRecord {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
    pub author_id: Option<Uuid>,
    pub created_at: OffsetDateTime,
    pub updated_at: Option<OffsetDateTime>,
}

impl PostRecord {
    pub fn slug(&self) -> String {
        generate_slug(&self.title)
    }

    /// Body split into display paragraphs, one per source line.
    pub fn paragraphs(&self) -> impl Iterator<Item = &str> {
        self.content.split('\n')
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentRecord {
    pub id: Uuid,
    pub post_id: Uuid,
    pub user_id: Option<Uuid>,
    pub content: String,
    pub created_at: OffsetDateTime,
}

/// The signed-in account as far as the client cares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub email: Option<String>,
}

/// Credentials returned by a successful password sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub expires_at: Option<OffsetDateTime>,
    pub user: Identity,
}

/// Who a like belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Voter {
    Member(Uuid),
    Anonymous(String),
}

impl Voter {
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Voter::Member(id) => Some(*id),
            Voter::Anonymous(_) => None,
        }
    }

    pub fn anonymous_id(&self) -> Option<&str> {
        match self {
            Voter::Member(_) => None,
            Voter::Anonymous(token) => Some(token.as_str()),
        }
    }
}
