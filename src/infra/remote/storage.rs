use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Method, header::CONTENT_TYPE};

use crate::application::repos::{ObjectStorage, RepoError};

use super::RemoteClient;

#[async_trait]
impl ObjectStorage for RemoteClient {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        content_type: &str,
        payload: Bytes,
    ) -> Result<(), RepoError> {
        let url = self.url(&format!("storage/v1/object/{bucket}/{path}"), &[])?;
        let request = self
            .request(Method::POST, url)?
            .header(CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(payload);

        self.send("upload", request).await?;
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}storage/v1/object/public/{bucket}/{path}", self.base)
    }
}
