use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use vitamins::application::listing::{LoadOutcome, VitaminListing};
use vitamins::application::repos::RepoError;
use vitamins::infra::memory::MemoryBackend;

fn listing(backend: &Arc<MemoryBackend>) -> VitaminListing {
    VitaminListing::new(backend.clone(), NonZeroU32::new(9).expect("non-zero"))
}

#[tokio::test]
async fn full_page_means_more_and_partial_page_means_done() {
    let backend = Arc::new(MemoryBackend::new());
    backend.seed_posts(10);
    let listing = listing(&backend);

    let first = listing.load_page(0).await.expect("page 0");
    assert_eq!(first, LoadOutcome::Applied { page: 0, received: 9 });
    let snapshot = listing.snapshot();
    assert!(snapshot.has_more);
    assert_eq!(snapshot.loaded[0].title, "Vitamin 10");

    let second = listing.load_more().await.expect("page 1");
    assert_eq!(second, LoadOutcome::Applied { page: 1, received: 1 });
    let snapshot = listing.snapshot();
    assert!(!snapshot.has_more);
    assert_eq!(snapshot.page, 1);
    assert_eq!(snapshot.loaded.len(), 10);
    assert_eq!(snapshot.loaded[9].title, "Vitamin 1");
}

#[tokio::test]
async fn exactly_one_full_page_needs_an_empty_fetch_to_finish() {
    let backend = Arc::new(MemoryBackend::new());
    backend.seed_posts(9);
    let listing = listing(&backend);

    let first = listing.load_page(0).await.expect("page 0");
    assert_eq!(first, LoadOutcome::Applied { page: 0, received: 9 });
    assert!(listing.snapshot().has_more);

    let second = listing.load_more().await.expect("page 1");
    assert_eq!(second, LoadOutcome::Applied { page: 1, received: 0 });
    let snapshot = listing.snapshot();
    assert!(!snapshot.has_more);
    assert_eq!(snapshot.page, 1);
    assert_eq!(snapshot.loaded.len(), 9);

    assert_eq!(
        listing.load_more().await.expect("skip"),
        LoadOutcome::Skipped
    );
    assert_eq!(backend.call_count("list_posts"), 2);
}

#[tokio::test]
async fn load_more_is_skipped_once_exhausted() {
    let backend = Arc::new(MemoryBackend::new());
    backend.seed_posts(8);
    let listing = listing(&backend);

    listing.load_page(0).await.expect("page 0");
    assert!(!listing.snapshot().has_more);

    assert_eq!(
        listing.load_more().await.expect("skip"),
        LoadOutcome::Skipped
    );
    assert_eq!(backend.call_count("list_posts"), 1);
}

#[tokio::test]
async fn load_more_before_any_load_is_skipped() {
    let backend = Arc::new(MemoryBackend::new());
    backend.seed_posts(3);
    let listing = listing(&backend);

    assert_eq!(
        listing.load_more().await.expect("skip"),
        LoadOutcome::Skipped
    );
    assert_eq!(backend.total_calls(), 0);
}

#[tokio::test]
async fn failed_load_more_keeps_state_and_can_be_retried() {
    let backend = Arc::new(MemoryBackend::new());
    backend.seed_posts(12);
    let listing = listing(&backend);
    listing.load_page(0).await.expect("page 0");

    backend.fail_next("list_posts", RepoError::Timeout);
    let err = listing.load_more().await.expect_err("injected failure");
    assert_eq!(
        err.presentation_message(),
        "The server took too long to respond"
    );

    let snapshot = listing.snapshot();
    assert_eq!(snapshot.page, 0);
    assert_eq!(snapshot.loaded.len(), 9);
    assert!(snapshot.has_more);
    assert!(!snapshot.loading);

    let retried = listing.load_more().await.expect("retry");
    assert_eq!(retried, LoadOutcome::Applied { page: 1, received: 3 });
    assert_eq!(listing.snapshot().loaded.len(), 12);
}

#[tokio::test]
async fn search_filters_loaded_titles_without_refetching_more() {
    let backend = Arc::new(MemoryBackend::new());
    backend.seed_post("Faith", "a");
    backend.seed_post("Hope", "b");
    backend.seed_post("Grace", "c");
    let listing = listing(&backend);
    listing.load_page(0).await.expect("page 0");

    listing.set_query("HOPE").await.expect("search");
    let visible = listing.visible();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].title, "Hope");
    assert_eq!(listing.snapshot().loaded.len(), 3);

    listing.set_query("").await.expect("clear");
    let titles: Vec<_> = listing.visible().into_iter().map(|p| p.title).collect();
    assert_eq!(titles, vec!["Grace", "Hope", "Faith"]);
}

#[tokio::test(start_paused = true)]
async fn slow_first_page_cannot_overwrite_newer_search() {
    let backend = Arc::new(MemoryBackend::new());
    backend.seed_posts(3);
    let listing = listing(&backend);
    backend.delay_next("list_posts", Duration::from_millis(200));

    let slow = listing.clone();
    let (stale, fresh) = tokio::join!(slow.load_page(0), listing.set_query("Vitamin 2"));

    assert_eq!(stale.expect("stale load"), LoadOutcome::Superseded);
    assert_eq!(
        fresh.expect("fresh load"),
        LoadOutcome::Applied { page: 0, received: 3 }
    );

    let snapshot = listing.snapshot();
    assert!(!snapshot.loading);
    assert_eq!(snapshot.query, "Vitamin 2");
    assert_eq!(snapshot.visible().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn loading_flag_tracks_in_flight_requests() {
    let backend = Arc::new(MemoryBackend::new());
    backend.seed_posts(2);
    let listing = listing(&backend);
    backend.delay_next("list_posts", Duration::from_millis(50));

    let observer = listing.clone();
    let (outcome, observed) = tokio::join!(listing.load_page(0), async move {
        tokio::task::yield_now().await;
        observer.snapshot().loading
    });

    assert!(observed);
    assert!(matches!(outcome, Ok(LoadOutcome::Applied { .. })));
    assert!(!listing.snapshot().loading);
}
