use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;
use vitamins::application::comments::{ANONYMOUS_AUTHOR, CommentOutcome};
use vitamins::application::context::{ClientContext, ClientOptions};
use vitamins::application::likes::{ANONYMOUS_ID_KEY, LikeSnapshot, ToggleOutcome};
use vitamins::application::repos::{LocalState, RepoError};
use vitamins::application::session::SessionStore;
use vitamins::domain::entities::{Identity, Session, Voter};
use vitamins::domain::routes::Route;
use vitamins::infra::local_store::MemoryState;
use vitamins::infra::memory::MemoryBackend;

fn context(backend: &Arc<MemoryBackend>, session: SessionStore) -> (ClientContext, Arc<MemoryState>) {
    let local = Arc::new(MemoryState::new());
    let ctx = ClientContext::from_backend(
        backend.clone(),
        local.clone(),
        session,
        ClientOptions::default(),
    );
    (ctx, local)
}

fn session_for(identity: &Identity) -> SessionStore {
    SessionStore::new(Some(Session {
        access_token: "token".into(),
        refresh_token: None,
        expires_at: None,
        user: identity.clone(),
    }))
}

fn applied(outcome: ToggleOutcome) -> LikeSnapshot {
    match outcome {
        ToggleOutcome::Applied(snapshot) => snapshot,
        ToggleOutcome::InFlight => panic!("unexpected in-flight outcome"),
    }
}

#[tokio::test]
async fn toggling_twice_returns_to_the_original_count() {
    let backend = Arc::new(MemoryBackend::new());
    let post = backend.seed_post("Hope", "Keep going");
    backend.seed_like(post.id, Voter::Anonymous("someone-else".into()));
    backend.seed_like(post.id, Voter::Member(Uuid::new_v4()));
    let (ctx, _) = context(&backend, SessionStore::default());

    let button = ctx.like_button(post.id).expect("button");
    let initial = applied(button.refresh().await.expect("refresh"));
    assert_eq!((initial.liked, initial.count), (false, 2));

    let liked = applied(button.toggle().await.expect("like"));
    assert_eq!((liked.liked, liked.count), (true, 3));
    assert_eq!(backend.likes_on(post.id), 3);

    let unliked = applied(button.toggle().await.expect("unlike"));
    assert_eq!((unliked.liked, unliked.count), (false, 2));
    assert_eq!(backend.likes_on(post.id), 2);
}

#[tokio::test]
async fn displayed_count_never_goes_negative() {
    let backend = Arc::new(MemoryBackend::new());
    let post = backend.seed_post("Hope", "Keep going");
    let (ctx, local) = context(&backend, SessionStore::default());

    let button = ctx.like_button(post.id).expect("button");
    let token = local
        .get(ANONYMOUS_ID_KEY)
        .expect("read")
        .expect("token stored");
    backend.seed_like(post.id, Voter::Anonymous(token));

    // No refresh: the button still shows zero while the backend holds our like.
    let snapshot = applied(button.toggle().await.expect("unlike"));
    assert!(!snapshot.liked);
    assert_eq!(snapshot.count, 0);
}

#[tokio::test(start_paused = true)]
async fn second_toggle_while_busy_sends_nothing() {
    let backend = Arc::new(MemoryBackend::new());
    let post = backend.seed_post("Hope", "Keep going");
    let (ctx, _) = context(&backend, SessionStore::default());
    let button = ctx.like_button(post.id).expect("button");
    backend.delay_next("find_like", Duration::from_millis(100));

    let (first, second) = tokio::join!(button.toggle(), button.toggle());

    assert!(matches!(first, Ok(ToggleOutcome::Applied(_))));
    assert_eq!(second.expect("second"), ToggleOutcome::InFlight);
    assert_eq!(backend.call_count("find_like"), 1);
    assert_eq!(backend.call_count("insert_like"), 1);
    assert!(!button.snapshot().busy);
}

#[tokio::test]
async fn failed_toggle_leaves_display_unchanged() {
    let backend = Arc::new(MemoryBackend::new());
    let post = backend.seed_post("Hope", "Keep going");
    let (ctx, _) = context(&backend, SessionStore::default());
    let button = ctx.like_button(post.id).expect("button");
    button.refresh().await.expect("refresh");

    backend.fail_next("insert_like", RepoError::Remote("connection reset".into()));
    button.toggle().await.expect_err("insert fails");

    assert_eq!(button.snapshot(), LikeSnapshot::default());
    assert_eq!(backend.likes_on(post.id), 0);
}

#[tokio::test]
async fn anonymous_token_is_reused_and_members_vote_as_themselves() {
    let backend = Arc::new(MemoryBackend::new());
    let post = backend.seed_post("Hope", "Keep going");
    let (ctx, _) = context(&backend, SessionStore::default());

    let first = ctx.like_button(post.id).expect("button");
    let second = ctx.like_button(post.id).expect("button");
    assert!(matches!(first.voter(), Voter::Anonymous(_)));
    assert_eq!(first.voter(), second.voter());

    let member = backend.seed_account("reader@example.com", "secret");
    let (ctx, _) = context(&backend, session_for(&member));
    let button = ctx.like_button(post.id).expect("button");
    assert_eq!(button.voter(), &Voter::Member(member.id));
}

#[tokio::test]
async fn commenting_signed_out_redirects_without_calls() {
    let backend = Arc::new(MemoryBackend::new());
    let post = backend.seed_post("Hope", "Keep going");
    let (ctx, _) = context(&backend, SessionStore::default());

    let mut thread = ctx.comment_thread(post.id);
    assert!(!thread.can_comment());
    let outcome = thread.add_comment("Amen").await.expect("outcome");

    assert_eq!(outcome, CommentOutcome::SignInRequired(Route::Login));
    assert_eq!(backend.total_calls(), 0);
    assert!(thread.comments().is_empty());
}

#[tokio::test]
async fn posted_comment_appears_first_with_author_email() {
    let backend = Arc::new(MemoryBackend::new());
    let post = backend.seed_post("Hope", "Keep going");
    backend.seed_comment(post.id, None, "Older comment");
    let member = backend.seed_account("reader@example.com", "secret");
    let (ctx, _) = context(&backend, session_for(&member));

    let mut thread = ctx.comment_thread(post.id);
    thread.load().await.expect("load");
    assert_eq!(thread.display_name(&thread.comments()[0]), ANONYMOUS_AUTHOR);

    let outcome = thread.add_comment("  Amen  ").await.expect("posted");
    let CommentOutcome::Posted(comment) = outcome else {
        panic!("expected a posted comment");
    };
    assert_eq!(comment.content, "Amen");
    assert_eq!(thread.comments().len(), 2);
    assert_eq!(thread.comments()[0].id, comment.id);
    assert_eq!(thread.display_name(&comment), "reader@example.com");
}

#[tokio::test(start_paused = true)]
async fn abandoned_comment_does_not_block_the_next_one() {
    let backend = Arc::new(MemoryBackend::new());
    let post = backend.seed_post("Hope", "Keep going");
    let member = backend.seed_account("reader@example.com", "secret");
    let (ctx, _) = context(&backend, session_for(&member));
    backend.delay_next("insert_comment", Duration::from_secs(30));

    let mut thread = ctx.comment_thread(post.id);
    let abandoned =
        tokio::time::timeout(Duration::from_secs(1), thread.add_comment("First try")).await;
    assert!(abandoned.is_err());
    assert!(thread.comments().is_empty());

    let outcome = thread.add_comment("Second try").await.expect("posted");
    let CommentOutcome::Posted(comment) = outcome else {
        panic!("expected a posted comment");
    };
    assert_eq!(comment.content, "Second try");
    assert_eq!(thread.comments().len(), 1);
    assert_eq!(backend.call_count("insert_comment"), 2);
}

#[tokio::test]
async fn blank_comment_is_rejected_locally() {
    let backend = Arc::new(MemoryBackend::new());
    let post = backend.seed_post("Hope", "Keep going");
    let member = backend.seed_account("reader@example.com", "secret");
    let (ctx, _) = context(&backend, session_for(&member));

    let mut thread = ctx.comment_thread(post.id);
    let err = thread.add_comment("   ").await.expect_err("blank");
    assert_eq!(err.presentation_message(), "Comment cannot be empty");
    assert_eq!(backend.total_calls(), 0);
}

#[tokio::test]
async fn author_lookup_failure_falls_back_to_anonymous() {
    let backend = Arc::new(MemoryBackend::new());
    let post = backend.seed_post("Hope", "Keep going");
    let member = backend.seed_account("reader@example.com", "secret");
    backend.seed_comment(post.id, Some(member.id), "Amen");
    backend.fail_next("emails_for", RepoError::Timeout);
    let (ctx, _) = context(&backend, SessionStore::default());

    let mut thread = ctx.comment_thread(post.id);
    thread.load().await.expect("comments still load");
    assert_eq!(thread.comments().len(), 1);
    assert_eq!(thread.display_name(&thread.comments()[0]), ANONYMOUS_AUTHOR);
}
