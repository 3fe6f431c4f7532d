use async_trait::async_trait;
use reqwest::Method;
use time::{Duration, OffsetDateTime};
use vitamins_api_types::{PasswordCredentials, SessionResponse};

use crate::application::repos::{AuthGateway, Credentials, RepoError};
use crate::domain::entities::{Identity, Session};

use super::RemoteClient;

impl From<&Credentials> for PasswordCredentials {
    fn from(credentials: &Credentials) -> Self {
        Self {
            email: credentials.email.clone(),
            password: credentials.password.clone(),
        }
    }
}

fn session_from_response(response: SessionResponse, now: OffsetDateTime) -> Session {
    Session {
        access_token: response.access_token,
        refresh_token: response.refresh_token,
        expires_at: response
            .expires_in
            .map(|seconds| now + Duration::seconds(seconds)),
        user: Identity {
            id: response.user.id,
            email: response.user.email,
        },
    }
}

#[async_trait]
impl AuthGateway for RemoteClient {
    async fn sign_up(&self, credentials: &Credentials) -> Result<(), RepoError> {
        let url = self.url("auth/v1/signup", &[])?;
        let request = self
            .request(Method::POST, url)?
            .json(&PasswordCredentials::from(credentials));

        self.send("sign_up", request).await?;
        Ok(())
    }

    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, RepoError> {
        let url = self.url("auth/v1/token", &[("grant_type", "password".to_string())])?;
        let request = self
            .request(Method::POST, url)?
            .json(&PasswordCredentials::from(credentials));

        let response: SessionResponse = self.fetch_json("sign_in", request).await?;
        Ok(session_from_response(
            response,
            OffsetDateTime::now_utc(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;
    use vitamins_api_types::AuthUser;

    use super::*;

    #[test]
    fn expiry_is_relative_to_sign_in_time() {
        let response = SessionResponse {
            access_token: "token".into(),
            refresh_token: None,
            expires_in: Some(3600),
            user: AuthUser {
                id: Uuid::nil(),
                email: Some("reader@example.com".into()),
            },
        };

        let session = session_from_response(response, OffsetDateTime::UNIX_EPOCH);
        assert_eq!(
            session.expires_at,
            Some(OffsetDateTime::UNIX_EPOCH + Duration::hours(1))
        );
        assert_eq!(session.user.email.as_deref(), Some("reader@example.com"));
    }
}
