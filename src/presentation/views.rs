//! Plain-text renderings of the client screens.

use crate::application::auth::AuthMode;
use crate::application::comments::CommentThread;
use crate::application::likes::LikeSnapshot;
use crate::application::listing::ListingSnapshot;
use crate::domain::entities::PostRecord;
use crate::domain::routes::Route;
use crate::util::dates::{long_date, short_date_time};

const EXCERPT_CHARS: usize = 160;
pub const HOME_CARD_LIMIT: usize = 6;

pub const ABOUT_TEXT: &str = "Spiritual Vitamins is a small collection of short, \
inspirational posts. Each vitamin is a daily dose of encouragement: read one, \
like the ones that speak to you, and share your thoughts in the comments.";

/// First characters of the body on a single line, ellipsized when cut.
pub fn excerpt(content: &str) -> String {
    let flattened = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if flattened.chars().count() <= EXCERPT_CHARS {
        return flattened;
    }
    let cut: String = flattened.chars().take(EXCERPT_CHARS).collect();
    format!("{}…", cut.trim_end())
}

pub fn card(post: &PostRecord) -> String {
    let image = post.image_url.as_deref().unwrap_or("No image");
    format!(
        "{title}\n  {excerpt}\n  {date} · {path}\n  [{image}]",
        title = post.title,
        excerpt = excerpt(&post.content),
        date = long_date(post.created_at),
        path = Route::for_post(post).path(),
    )
}

fn cards<'a>(posts: impl IntoIterator<Item = &'a PostRecord>) -> Vec<String> {
    posts.into_iter().map(card).collect()
}

pub fn navigation() -> String {
    format!(
        "Home {} · All Vitamins {} · About {}",
        Route::Home,
        Route::Vitamins,
        Route::About
    )
}

pub fn home(latest: &[PostRecord]) -> String {
    let mut sections = vec!["Latest".to_string()];
    let shown = cards(latest.iter().take(HOME_CARD_LIMIT));
    if shown.is_empty() {
        sections.push("No spiritual vitamins yet.".to_string());
    } else {
        sections.extend(shown);
    }
    sections.push(navigation());
    sections.join("\n\n")
}

pub fn listing(snapshot: &ListingSnapshot) -> String {
    let mut sections = vec!["All Your Vitamins".to_string()];
    if !snapshot.query.is_empty() {
        sections.push(format!("Search: \"{}\"", snapshot.query));
    }

    let visible = snapshot.visible();
    if visible.is_empty() {
        sections.push("No spiritual vitamins found.".to_string());
    } else {
        sections.extend(cards(visible));
        if snapshot.has_more {
            sections.push(format!(
                "More vitamins available (use --pages {} to load them).",
                snapshot.page + 2
            ));
        }
    }
    sections.join("\n\n")
}

pub fn likes_line(likes: &LikeSnapshot) -> String {
    let marker = if likes.liked { "♥" } else { "♡" };
    let noun = if likes.count == 1 { "like" } else { "likes" };
    format!("{marker} {} {noun}", likes.count)
}

pub fn comments(thread: &CommentThread) -> String {
    let mut lines = vec!["Comments".to_string()];
    if !thread.can_comment() {
        lines.push(format!("Log in to leave a comment ({}).", Route::Login));
    }
    if thread.comments().is_empty() {
        lines.push("No comments yet. Be the first to comment!".to_string());
    }
    for comment in thread.comments() {
        lines.push(format!(
            "- {} · {}\n  {}",
            thread.display_name(comment),
            short_date_time(comment.created_at),
            comment.content
        ));
    }
    lines.join("\n")
}

pub fn detail(post: &PostRecord, likes: &LikeSnapshot, thread: &CommentThread) -> String {
    let mut header = vec![post.title.clone(), long_date(post.created_at)];
    if let Some(updated) = post.updated_at {
        header.push(format!("Updated {}", long_date(updated)));
    }
    if let Some(url) = post.image_url.as_deref() {
        header.push(format!("[{url}]"));
    }

    let body = post.paragraphs().collect::<Vec<_>>().join("\n");

    [
        format!("← Back to vitamins {}", Route::Vitamins),
        header.join("\n"),
        body,
        likes_line(likes),
        comments(thread),
    ]
    .join("\n\n")
}

pub fn not_found() -> String {
    format!(
        "Vitamin not found.\n\n← Back to vitamins {}",
        Route::Vitamins
    )
}

pub fn manage(posts: &[PostRecord]) -> String {
    if posts.is_empty() {
        return "Manage Vitamins\n\nNo vitamins yet. Create one with `vitamins create`.".to_string();
    }

    let rows = posts
        .iter()
        .map(|post| {
            format!(
                "{}  {}  {}",
                post.id,
                long_date(post.created_at),
                post.title
            )
        })
        .collect::<Vec<_>>();
    format!("Manage Vitamins\n\n{}", rows.join("\n"))
}

pub fn about() -> String {
    format!("About\n\n{ABOUT_TEXT}\n\n{}", navigation())
}

pub fn auth_prompt(mode: AuthMode) -> String {
    match mode {
        AuthMode::SignIn => format!(
            "Log in\n\nRun `vitamins login --email <EMAIL>` with VITAMINS_PASSWORD set.\n\
             No account yet? See {}",
            Route::Signup
        ),
        AuthMode::SignUp => format!(
            "Sign up\n\nRun `vitamins signup --email <EMAIL>` with VITAMINS_PASSWORD and \
             VITAMINS_CONFIRM_PASSWORD set.\nAlready registered? See {}",
            Route::Login
        ),
    }
}
