//! Client-side title search over already loaded vitamins.

use crate::domain::entities::PostRecord;

/// Keep the posts whose title contains `query`, ignoring case.
///
/// Only titles are matched. An empty query keeps every post. Order is
/// preserved. Results are bounded by what the caller has loaded.
pub fn filter_by_title<'a>(posts: &'a [PostRecord], query: &str) -> Vec<&'a PostRecord> {
    if query.is_empty() {
        return posts.iter().collect();
    }

    let needle = query.to_lowercase();
    posts
        .iter()
        .filter(|post| post.title.to_lowercase().contains(&needle))
        .collect()
}
