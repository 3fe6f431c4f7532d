use async_trait::async_trait;
use reqwest::Method;
use uuid::Uuid;
use vitamins_api_types::{LikeRow, NewLikeRow, tables};

use crate::application::repos::{LikesRepo, RepoError};
use crate::domain::entities::Voter;

use super::{PREFER_HEADER, RETURN_MINIMAL, RemoteClient, content_range_total, eq};

/// Filter pairs selecting `voter`'s like on `post_id`.
fn voter_filter(post_id: Uuid, voter: &Voter) -> Vec<(&'static str, String)> {
    let owner = match voter {
        Voter::Member(user_id) => ("user_id", eq(user_id)),
        Voter::Anonymous(token) => ("anonymous_id", eq(token)),
    };
    vec![("post_id", eq(post_id)), owner]
}

#[async_trait]
impl LikesRepo for RemoteClient {
    async fn find_like(&self, post_id: Uuid, voter: &Voter) -> Result<Option<Uuid>, RepoError> {
        let mut query = voter_filter(post_id, voter);
        query.push(("select", "id,post_id,user_id,anonymous_id".to_string()));
        query.push(("limit", "1".to_string()));

        let url = self.rest_url(tables::LIKES, &query)?;
        let rows: Vec<LikeRow> = self
            .fetch_json("find_like", self.request(Method::GET, url)?)
            .await?;
        Ok(rows.into_iter().next().map(|row| row.id))
    }

    async fn count_likes(&self, post_id: Uuid) -> Result<u64, RepoError> {
        let url = self.rest_url(
            tables::LIKES,
            &[("select", "id".to_string()), ("post_id", eq(post_id))],
        )?;
        let request = self
            .request(Method::GET, url)?
            .header(PREFER_HEADER, "count=exact");

        let response = self.send("count_likes", request).await?;
        if let Some(total) = content_range_total(&response) {
            return Ok(total);
        }

        let rows: Vec<serde_json::Value> = super::decode(response).await?;
        Ok(rows.len() as u64)
    }

    async fn insert_like(&self, post_id: Uuid, voter: &Voter) -> Result<(), RepoError> {
        let url = self.rest_url(tables::LIKES, &[])?;
        let body = NewLikeRow {
            post_id,
            user_id: voter.user_id(),
            anonymous_id: voter.anonymous_id().map(str::to_string),
        };
        let request = self
            .request(Method::POST, url)?
            .header(PREFER_HEADER, RETURN_MINIMAL)
            .json(&body);

        self.send("insert_like", request).await?;
        Ok(())
    }

    async fn delete_like(&self, post_id: Uuid, voter: &Voter) -> Result<(), RepoError> {
        let url = self.rest_url(tables::LIKES, &voter_filter(post_id, voter))?;
        let request = self
            .request(Method::DELETE, url)?
            .header(PREFER_HEADER, RETURN_MINIMAL);

        self.send("delete_like", request).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn members_and_anonymous_voters_filter_different_columns() {
        let post = Uuid::nil();
        let member = voter_filter(post, &Voter::Member(Uuid::nil()));
        assert_eq!(member[1].0, "user_id");

        let anon = voter_filter(post, &Voter::Anonymous("tok".into()));
        assert_eq!(anon[1], ("anonymous_id", "eq.tok".to_string()));
    }
}
