use std::time::Duration;

use bytes::Bytes;
use httpmock::MockServer;
use url::Url;
use uuid::Uuid;
use vitamins::application::repos::{
    AuthGateway, CommentsRepo, CreateCommentParams, Credentials, LikesRepo, ObjectStorage, PageWindow,
    PostsRepo, RepoError, UpdatePostParams, UsersRepo,
};
use vitamins::application::session::SessionStore;
use vitamins::config::BackendSettings;
use vitamins::domain::entities::{Identity, Session, Voter};
use vitamins::infra::remote::RemoteClient;

const ANON_KEY: &str = "anon-key";
const POST_ID: &str = "5b0c6f0e-8a4f-4d62-9d0b-3f3c2f0f1a11";

fn client(server: &MockServer, session: SessionStore) -> RemoteClient {
    let settings = BackendSettings {
        url: Some(Url::parse(&server.base_url()).expect("base url")),
        anon_key: Some(ANON_KEY.to_string()),
        timeout: Duration::from_secs(5),
    };
    RemoteClient::new(&settings, session).expect("client")
}

fn signed_in(token: &str) -> SessionStore {
    SessionStore::new(Some(Session {
        access_token: token.to_string(),
        refresh_token: None,
        expires_at: None,
        user: Identity {
            id: Uuid::nil(),
            email: None,
        },
    }))
}

#[tokio::test]
async fn list_posts_sends_window_order_and_keys() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("GET")
            .path("/rest/v1/posts")
            .query_param("order", "created_at.desc")
            .query_param("offset", "9")
            .query_param("limit", "9")
            .header("apikey", ANON_KEY)
            .header("authorization", "Bearer anon-key");
        then.status(200)
            .header("content-type", "application/json")
            .body(format!(
                r#"[{{"id":"{POST_ID}","title":"Hope","content":"Keep going","image_url":"","author_id":null,"created_at":"2024-03-01T10:15:30+00:00","updated_at":null}}]"#
            ));
    });

    let posts = client(&server, SessionStore::default())
        .list_posts(PageWindow {
            offset: 9,
            limit: 9,
        })
        .await
        .expect("posts");

    mock.assert();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].title, "Hope");
    assert_eq!(posts[0].image_url, None);
}

#[tokio::test]
async fn signed_in_requests_carry_the_session_token() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("GET")
            .path("/rest/v1/likes")
            .query_param("post_id", format!("eq.{POST_ID}"))
            .header("apikey", ANON_KEY)
            .header("authorization", "Bearer user-token")
            .header("prefer", "count=exact");
        then.status(200)
            .header("content-type", "application/json")
            .header("content-range", "0-6/7")
            .body("[]");
    });

    let count = client(&server, signed_in("user-token"))
        .count_likes(Uuid::parse_str(POST_ID).expect("uuid"))
        .await
        .expect("count");

    mock.assert();
    assert_eq!(count, 7);
}

#[tokio::test]
async fn anonymous_like_filters_by_token() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("GET")
            .path("/rest/v1/likes")
            .query_param("post_id", format!("eq.{POST_ID}"))
            .query_param("anonymous_id", "eq.tok-123");
        then.status(200)
            .header("content-type", "application/json")
            .body(format!(
                r#"[{{"id":"{POST_ID}","post_id":"{POST_ID}","user_id":null,"anonymous_id":"tok-123"}}]"#
            ));
    });

    let found = client(&server, SessionStore::default())
        .find_like(
            Uuid::parse_str(POST_ID).expect("uuid"),
            &Voter::Anonymous("tok-123".into()),
        )
        .await
        .expect("like");

    mock.assert();
    assert!(found.is_some());
}

#[tokio::test]
async fn rejected_insert_surfaces_backend_message() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("POST").path("/rest/v1/comments");
        then.status(400)
            .header("content-type", "application/json")
            .body(r#"{"message":"new row violates row-level security policy"}"#);
    });

    let err = client(&server, SessionStore::default())
        .insert_comment(CreateCommentParams {
            post_id: Uuid::nil(),
            user_id: Uuid::nil(),
            content: "Amen".into(),
        })
        .await
        .expect_err("rejected");

    match err {
        RepoError::Rejected { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "new row violates row-level security policy");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn unauthorized_status_maps_to_unauthorized() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("GET").path("/rest/v1/posts");
        then.status(401)
            .header("content-type", "application/json")
            .body(r#"{"message":"JWT expired"}"#);
    });

    let err = client(&server, signed_in("stale"))
        .list_all_posts()
        .await
        .expect_err("unauthorized");
    assert!(matches!(err, RepoError::Unauthorized(ref message) if message == "JWT expired"));
}

#[tokio::test]
async fn update_matching_no_rows_is_not_found() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("PATCH")
            .path("/rest/v1/posts")
            .query_param("id", format!("eq.{POST_ID}"))
            .header("prefer", "return=representation");
        then.status(200)
            .header("content-type", "application/json")
            .body("[]");
    });

    let err = client(&server, signed_in("user-token"))
        .update_post(UpdatePostParams {
            id: Uuid::parse_str(POST_ID).expect("uuid"),
            title: "Hope".into(),
            content: "Keep going".into(),
            image_url: None,
            updated_at: time::OffsetDateTime::UNIX_EPOCH,
        })
        .await
        .expect_err("no rows");

    mock.assert();
    assert!(matches!(err, RepoError::NotFound));
}

#[tokio::test]
async fn emails_are_fetched_in_one_batch() {
    let server = MockServer::start();
    let first = Uuid::from_u128(1);
    let second = Uuid::from_u128(2);
    let mock = server.mock(|when, then| {
        when.method("GET")
            .path("/rest/v1/users")
            .query_param("id", format!("in.({first},{second})"));
        then.status(200)
            .header("content-type", "application/json")
            .body(format!(r#"[{{"id":"{first}","email":"a@example.com"}}]"#));
    });

    let emails = client(&server, SessionStore::default())
        .emails_for(&[first, second])
        .await
        .expect("emails");

    mock.assert();
    assert_eq!(emails.len(), 1);
    assert_eq!(emails.get(&first).map(String::as_str), Some("a@example.com"));
}

#[tokio::test]
async fn password_sign_in_returns_session() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("POST")
            .path("/auth/v1/token")
            .query_param("grant_type", "password")
            .json_body_includes(r#"{"email":"reader@example.com"}"#);
        then.status(200)
            .header("content-type", "application/json")
            .body(format!(
                r#"{{"access_token":"jwt","refresh_token":"r","expires_in":3600,"token_type":"bearer","user":{{"id":"{POST_ID}","email":"reader@example.com"}}}}"#
            ));
    });

    let session = client(&server, SessionStore::default())
        .sign_in(&Credentials {
            email: "reader@example.com".into(),
            password: "secret".into(),
        })
        .await
        .expect("session");

    mock.assert();
    assert_eq!(session.access_token, "jwt");
    assert_eq!(session.user.email.as_deref(), Some("reader@example.com"));
    assert!(session.expires_at.is_some());
}

#[tokio::test]
async fn upload_posts_bytes_and_public_url_points_at_bucket() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("POST")
            .path("/storage/v1/object/vitamin-images/abc-hope.png")
            .header("content-type", "image/png");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"Key":"vitamin-images/abc-hope.png"}"#);
    });

    let client = client(&server, signed_in("user-token"));
    client
        .upload(
            "vitamin-images",
            "abc-hope.png",
            "image/png",
            Bytes::from_static(b"\x89PNG"),
        )
        .await
        .expect("upload");

    mock.assert();
    assert_eq!(
        client.public_url("vitamin-images", "abc-hope.png"),
        format!(
            "{}/storage/v1/object/public/vitamin-images/abc-hope.png",
            server.base_url()
        )
    );
}

#[test]
fn missing_backend_settings_fail_fast() {
    let settings = BackendSettings {
        url: None,
        anon_key: Some(ANON_KEY.into()),
        timeout: Duration::from_secs(5),
    };
    assert!(RemoteClient::new(&settings, SessionStore::default()).is_err());
}
