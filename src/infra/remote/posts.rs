use async_trait::async_trait;
use reqwest::Method;
use uuid::Uuid;
use vitamins_api_types::{NewPostRow, POST_COLUMNS, PostPatch, PostRow, tables};

use crate::application::repos::{
    CreatePostParams, PageWindow, PostsRepo, RepoError, UpdatePostParams,
};
use crate::domain::entities::PostRecord;

use super::{PREFER_HEADER, RETURN_REPRESENTATION, RemoteClient, eq};

const NEWEST_FIRST: &str = "created_at.desc";

impl From<PostRow> for PostRecord {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            content: row.content,
            image_url: row.image_url.filter(|url| !url.trim().is_empty()),
            author_id: row.author_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl PostsRepo for RemoteClient {
    async fn list_posts(&self, window: PageWindow) -> Result<Vec<PostRecord>, RepoError> {
        let url = self.rest_url(
            tables::POSTS,
            &[
                ("select", POST_COLUMNS.to_string()),
                ("order", NEWEST_FIRST.to_string()),
                ("offset", window.offset.to_string()),
                ("limit", window.limit.to_string()),
            ],
        )?;
        let rows: Vec<PostRow> = self
            .fetch_json("list_posts", self.request(Method::GET, url)?)
            .await?;
        Ok(rows.into_iter().map(PostRecord::from).collect())
    }

    async fn list_all_posts(&self) -> Result<Vec<PostRecord>, RepoError> {
        let url = self.rest_url(
            tables::POSTS,
            &[
                ("select", POST_COLUMNS.to_string()),
                ("order", NEWEST_FIRST.to_string()),
            ],
        )?;
        let rows: Vec<PostRow> = self
            .fetch_json("list_all_posts", self.request(Method::GET, url)?)
            .await?;
        Ok(rows.into_iter().map(PostRecord::from).collect())
    }

    async fn find_post(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError> {
        let url = self.rest_url(
            tables::POSTS,
            &[
                ("select", POST_COLUMNS.to_string()),
                ("id", eq(id)),
                ("limit", "1".to_string()),
            ],
        )?;
        let rows: Vec<PostRow> = self
            .fetch_json("find_post", self.request(Method::GET, url)?)
            .await?;
        Ok(rows.into_iter().next().map(PostRecord::from))
    }

    async fn insert_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let url = self.rest_url(tables::POSTS, &[("select", POST_COLUMNS.to_string())])?;
        let body = NewPostRow {
            title: params.title,
            content: params.content,
            image_url: params.image_url,
            author_id: params.author_id,
        };
        let request = self
            .request(Method::POST, url)?
            .header(PREFER_HEADER, RETURN_REPRESENTATION)
            .json(&body);

        let rows: Vec<PostRow> = self.fetch_json("insert_post", request).await?;
        rows.into_iter()
            .next()
            .map(PostRecord::from)
            .ok_or_else(|| RepoError::Decode("insert returned no row".to_string()))
    }

    async fn update_post(&self, params: UpdatePostParams) -> Result<(), RepoError> {
        let url = self.rest_url(
            tables::POSTS,
            &[("id", eq(params.id)), ("select", "id".to_string())],
        )?;
        let body = PostPatch {
            title: params.title,
            content: params.content,
            image_url: params.image_url,
            updated_at: params.updated_at,
        };
        let request = self
            .request(Method::PATCH, url)?
            .header(PREFER_HEADER, RETURN_REPRESENTATION)
            .json(&body);

        // The gateway answers 200 with no rows when the id is unknown or not ours.
        let rows: Vec<serde_json::Value> = self.fetch_json("update_post", request).await?;
        if rows.is_empty() {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError> {
        let url = self.rest_url(tables::POSTS, &[("id", eq(id)), ("select", "id".to_string())])?;
        let request = self
            .request(Method::DELETE, url)?
            .header(PREFER_HEADER, RETURN_REPRESENTATION);

        let rows: Vec<serde_json::Value> = self.fetch_json("delete_post", request).await?;
        if rows.is_empty() {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
