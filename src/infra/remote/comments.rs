use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Method;
use uuid::Uuid;
use vitamins_api_types::{COMMENT_COLUMNS, CommentRow, NewCommentRow, UserRow, tables};

use crate::application::repos::{CommentsRepo, CreateCommentParams, RepoError, UsersRepo};
use crate::domain::entities::CommentRecord;

use super::{PREFER_HEADER, RETURN_REPRESENTATION, RemoteClient, eq};

impl From<CommentRow> for CommentRecord {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            post_id: row.post_id,
            user_id: row.user_id,
            content: row.content,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl CommentsRepo for RemoteClient {
    async fn list_comments(&self, post_id: Uuid) -> Result<Vec<CommentRecord>, RepoError> {
        let url = self.rest_url(
            tables::COMMENTS,
            &[
                ("select", COMMENT_COLUMNS.to_string()),
                ("post_id", eq(post_id)),
                ("order", "created_at.desc".to_string()),
            ],
        )?;
        let rows: Vec<CommentRow> = self
            .fetch_json("list_comments", self.request(Method::GET, url)?)
            .await?;
        Ok(rows.into_iter().map(CommentRecord::from).collect())
    }

    async fn insert_comment(
        &self,
        params: CreateCommentParams,
    ) -> Result<CommentRecord, RepoError> {
        let url = self.rest_url(tables::COMMENTS, &[("select", COMMENT_COLUMNS.to_string())])?;
        let body = NewCommentRow {
            post_id: params.post_id,
            user_id: params.user_id,
            content: params.content,
        };
        let request = self
            .request(Method::POST, url)?
            .header(PREFER_HEADER, RETURN_REPRESENTATION)
            .json(&body);

        let rows: Vec<CommentRow> = self.fetch_json("insert_comment", request).await?;
        rows.into_iter()
            .next()
            .map(CommentRecord::from)
            .ok_or_else(|| RepoError::Decode("insert returned no row".to_string()))
    }
}

#[async_trait]
impl UsersRepo for RemoteClient {
    async fn emails_for(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, String>, RepoError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let list = ids
            .iter()
            .map(Uuid::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let url = self.rest_url(
            tables::USERS,
            &[
                ("select", "id,email".to_string()),
                ("id", format!("in.({list})")),
            ],
        )?;
        let rows: Vec<UserRow> = self
            .fetch_json("emails_for", self.request(Method::GET, url)?)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| row.email.map(|email| (row.id, email)))
            .collect())
    }
}
