//! Paginated vitamin listing with client-side title search.
//!
//! Pages are fetched newest first and accumulated locally. Each request is
//! tagged with the epoch it was issued in; loading page 0 opens a new epoch,
//! so a slow response from a superseded load is dropped instead of clobbering
//! newer state.

use std::num::NonZeroU32;
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::application::error::AppError;
use crate::application::repos::{PageWindow, PostsRepo};
use crate::domain::entities::PostRecord;
use crate::domain::search::filter_by_title;
use crate::util::lock::mutex_lock;

const LOCK_TARGET: &str = "application::listing";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The page was applied to local state.
    Applied { page: u32, received: usize },
    /// A newer load started while this one was in flight; its result was dropped.
    Superseded,
    /// Nothing was requested: no more pages, or a load is already running.
    Skipped,
}

/// Point-in-time copy of the listing state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingSnapshot {
    pub loaded: Vec<PostRecord>,
    pub page: u32,
    pub has_more: bool,
    pub loading: bool,
    pub query: String,
}

impl ListingSnapshot {
    /// Loaded posts matching the current query, in load order.
    pub fn visible(&self) -> Vec<&PostRecord> {
        filter_by_title(&self.loaded, &self.query)
    }
}

#[derive(Debug, Default)]
struct ListingState {
    loaded: Vec<PostRecord>,
    page: u32,
    has_more: bool,
    query: String,
    epoch: u64,
    pending: u32,
}

impl ListingState {
    fn begin(&mut self, page: u32) -> u64 {
        if page == 0 {
            self.epoch += 1;
            self.pending = 0;
        }
        self.pending += 1;
        self.epoch
    }

    fn release(&mut self, epoch: u64) {
        if epoch == self.epoch {
            self.pending = self.pending.saturating_sub(1);
        }
    }

    fn loading(&self) -> bool {
        self.pending > 0
    }

    fn snapshot(&self) -> ListingSnapshot {
        ListingSnapshot {
            loaded: self.loaded.clone(),
            page: self.page,
            has_more: self.has_more,
            loading: self.loading(),
            query: self.query.clone(),
        }
    }
}

/// Releases the in-flight slot if the load future is dropped before settling.
struct PendingLoad {
    state: Arc<Mutex<ListingState>>,
    page: u32,
    epoch: u64,
    settled: bool,
}

impl Drop for PendingLoad {
    fn drop(&mut self) {
        if !self.settled {
            mutex_lock(&self.state, LOCK_TARGET, "pending_drop").release(self.epoch);
        }
    }
}

/// Listing controller shared by the home and "all vitamins" screens.
#[derive(Clone)]
pub struct VitaminListing {
    posts: Arc<dyn PostsRepo>,
    page_size: NonZeroU32,
    state: Arc<Mutex<ListingState>>,
}

impl VitaminListing {
    pub fn new(posts: Arc<dyn PostsRepo>, page_size: NonZeroU32) -> Self {
        Self {
            posts,
            page_size,
            state: Arc::new(Mutex::new(ListingState::default())),
        }
    }

    pub fn page_size(&self) -> NonZeroU32 {
        self.page_size
    }

    pub fn snapshot(&self) -> ListingSnapshot {
        mutex_lock(&self.state, LOCK_TARGET, "snapshot").snapshot()
    }

    /// Loaded posts matching the current query.
    pub fn visible(&self) -> Vec<PostRecord> {
        let state = mutex_lock(&self.state, LOCK_TARGET, "visible");
        filter_by_title(&state.loaded, &state.query)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Fetch page `page`. Page 0 replaces the loaded posts, later pages append.
    ///
    /// Failures leave the loaded posts, page counter and `has_more` untouched.
    pub async fn load_page(&self, page: u32) -> Result<LoadOutcome, AppError> {
        let pending = {
            let mut state = mutex_lock(&self.state, LOCK_TARGET, "load_page");
            self.begin(&mut state, page)
        };
        self.fetch(pending).await
    }

    /// Fetch the page after the last applied one.
    ///
    /// Skipped when there is nothing more to load or a load is in flight, so
    /// repeated calls never request the same page twice.
    pub async fn load_more(&self) -> Result<LoadOutcome, AppError> {
        let pending = {
            let mut state = mutex_lock(&self.state, LOCK_TARGET, "load_more");
            if !state.has_more || state.loading() {
                debug!(
                    has_more = state.has_more,
                    loading = state.loading(),
                    "Skipping load_more"
                );
                return Ok(LoadOutcome::Skipped);
            }
            let next = state.page + 1;
            self.begin(&mut state, next)
        };
        self.fetch(pending).await
    }

    /// Change the title filter and restart from page 0.
    ///
    /// The query is applied locally to whatever has been loaded; it is never
    /// sent to the backend.
    pub async fn set_query(&self, query: impl Into<String>) -> Result<LoadOutcome, AppError> {
        {
            let mut state = mutex_lock(&self.state, LOCK_TARGET, "set_query");
            state.query = query.into();
        }
        self.load_page(0).await
    }

    fn begin(&self, state: &mut ListingState, page: u32) -> PendingLoad {
        let epoch = state.begin(page);
        PendingLoad {
            state: Arc::clone(&self.state),
            page,
            epoch,
            settled: false,
        }
    }

    async fn fetch(&self, mut pending: PendingLoad) -> Result<LoadOutcome, AppError> {
        let page = pending.page;
        let window = PageWindow::for_page(page, self.page_size);
        let result = self.posts.list_posts(window).await;

        let mut state = mutex_lock(&self.state, LOCK_TARGET, "fetch_settle");
        pending.settled = true;
        let current = pending.epoch == state.epoch;
        state.release(pending.epoch);

        if !current {
            debug!(page, epoch = pending.epoch, "Dropping superseded listing response");
            return Ok(LoadOutcome::Superseded);
        }

        match result {
            Ok(posts) => {
                let received = posts.len();
                if page == 0 {
                    state.loaded = posts;
                } else {
                    state.loaded.extend(posts);
                }
                state.page = page;
                state.has_more = received >= self.page_size.get() as usize;
                info!(
                    page,
                    received,
                    has_more = state.has_more,
                    total = state.loaded.len(),
                    "Loaded vitamins page"
                );
                Ok(LoadOutcome::Applied { page, received })
            }
            Err(err) => {
                warn!(page, error = %err, "Failed to load vitamins page");
                Err(AppError::from(err))
            }
        }
    }
}
