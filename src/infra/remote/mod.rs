//! HTTP adapter for the hosted backend (REST gateway, auth and object storage).

mod auth;
mod comments;
mod likes;
mod posts;
mod storage;

use std::time::Instant;

use metrics::{counter, histogram};
use reqwest::{
    Client, Method, RequestBuilder, Response, StatusCode, Url,
    header::{AUTHORIZATION, HeaderValue},
};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use vitamins_api_types::ErrorBody;

use crate::application::repos::RepoError;
use crate::application::session::SessionStore;
use crate::config::BackendSettings;
use crate::infra::error::InfraError;
use crate::infra::telemetry::{REMOTE_FAILURES_TOTAL, REMOTE_REQUEST_MS, REMOTE_REQUESTS_TOTAL};

const API_KEY_HEADER: &str = "apikey";
const PREFER_HEADER: &str = "Prefer";
const RETURN_REPRESENTATION: &str = "return=representation";
const RETURN_MINIMAL: &str = "return=minimal";

/// Backend client implementing every collaborator trait over HTTP.
///
/// Requests carry the anon key as `apikey` and, when someone is signed in,
/// their access token as the bearer credential.
#[derive(Clone, Debug)]
pub struct RemoteClient {
    http: Client,
    base: Url,
    anon_key: String,
    session: SessionStore,
}

impl RemoteClient {
    pub fn new(settings: &BackendSettings, session: SessionStore) -> Result<Self, InfraError> {
        let url = settings.url.as_ref().ok_or_else(|| {
            InfraError::configuration(
                "backend URL is required (use --backend-url or VITAMINS__BACKEND__URL)",
            )
        })?;
        let anon_key = settings.anon_key.clone().ok_or_else(|| {
            InfraError::configuration("anon key is required (use --anon-key or VITAMINS_ANON_KEY)")
        })?;

        let http = Client::builder()
            .user_agent(Self::user_agent())
            .timeout(settings.timeout)
            .build()
            .map_err(|err| InfraError::http_client(err.to_string()))?;

        Ok(Self {
            http,
            base: normalize_base(url),
            anon_key,
            session,
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("vitamins/", env!("CARGO_PKG_VERSION"))
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn url(&self, path: &str, query: &[(&str, String)]) -> Result<Url, RepoError> {
        let mut url = self
            .base
            .join(path)
            .map_err(|err| RepoError::Remote(format!("invalid request URL: {err}")))?;
        if !query.is_empty() {
            url.set_query(None);
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    fn rest_url(&self, table: &str, query: &[(&str, String)]) -> Result<Url, RepoError> {
        self.url(&format!("rest/v1/{table}"), query)
    }

    fn bearer(&self) -> Result<HeaderValue, RepoError> {
        let token = self
            .session
            .access_token()
            .unwrap_or_else(|| self.anon_key.clone());
        HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|err| RepoError::Remote(format!("invalid credential header: {err}")))
    }

    fn request(&self, method: Method, url: Url) -> Result<RequestBuilder, RepoError> {
        Ok(self
            .http
            .request(method, url)
            .header(API_KEY_HEADER, self.anon_key.as_str())
            .header(AUTHORIZATION, self.bearer()?))
    }

    /// Send a request, recording metrics and mapping failures onto [`RepoError`].
    async fn send(&self, op: &'static str, request: RequestBuilder) -> Result<Response, RepoError> {
        counter!(REMOTE_REQUESTS_TOTAL, "op" => op).increment(1);
        let started = Instant::now();

        let outcome = match request.send().await {
            Ok(response) => check_status(response).await,
            Err(err) if err.is_timeout() => Err(RepoError::Timeout),
            Err(err) => Err(RepoError::from_remote(err)),
        };

        histogram!(REMOTE_REQUEST_MS, "op" => op).record(started.elapsed().as_secs_f64() * 1000.0);

        match outcome {
            Ok(response) => {
                debug!(op, status = response.status().as_u16(), "Backend call succeeded");
                Ok(response)
            }
            Err(err) => {
                counter!(REMOTE_FAILURES_TOTAL, "op" => op).increment(1);
                warn!(op, error = %err, "Backend call failed");
                Err(err)
            }
        }
    }

    async fn fetch_json<T: DeserializeOwned>(
        &self,
        op: &'static str,
        request: RequestBuilder,
    ) -> Result<T, RepoError> {
        let response = self.send(op, request).await?;
        decode(response).await
    }
}

fn normalize_base(url: &Url) -> Url {
    let mut base = url.clone();
    base.set_query(None);
    base.set_fragment(None);
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base
}

async fn check_status(response: Response) -> Result<Response, RepoError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.bytes().await.unwrap_or_default();
    let message = serde_json::from_slice::<ErrorBody>(&body)
        .ok()
        .and_then(|parsed| parsed.message().map(str::to_string))
        .unwrap_or_else(|| {
            let text = String::from_utf8_lossy(&body).trim().to_string();
            if text.is_empty() {
                status.canonical_reason().unwrap_or("request failed").to_string()
            } else {
                text
            }
        });

    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RepoError::Unauthorized(message),
        StatusCode::NOT_FOUND => RepoError::NotFound,
        _ => RepoError::Rejected {
            status: status.as_u16(),
            message,
        },
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, RepoError> {
    let bytes = response.bytes().await.map_err(RepoError::from_remote)?;
    serde_json::from_slice(&bytes).map_err(|err| RepoError::Decode(err.to_string()))
}

/// Total from a `Content-Range` header such as `0-8/42` or `*/0`.
fn content_range_total(response: &Response) -> Option<u64> {
    response
        .headers()
        .get(reqwest::header::CONTENT_RANGE)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_content_range_total)
}

fn parse_content_range_total(value: &str) -> Option<u64> {
    let (_, total) = value.rsplit_once('/')?;
    total.trim().parse().ok()
}

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{value}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_range_total_is_parsed() {
        assert_eq!(parse_content_range_total("0-8/42"), Some(42));
        assert_eq!(parse_content_range_total("*/0"), Some(0));
        assert_eq!(parse_content_range_total("0-8/*"), None);
        assert_eq!(parse_content_range_total("garbage"), None);
    }

    #[test]
    fn base_url_gains_trailing_slash() {
        let url = Url::parse("https://project.example.co/prefix?x=1").expect("url");
        assert_eq!(
            normalize_base(&url).as_str(),
            "https://project.example.co/prefix/"
        );
    }
}
