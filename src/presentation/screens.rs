//! Assemble full screens from the controllers.

use tracing::debug;
use uuid::Uuid;

use crate::application::auth::AuthMode;
use crate::application::context::ClientContext;
use crate::application::detail::PostDetail;
use crate::application::error::AppError;
use crate::application::likes::ToggleOutcome;
use crate::application::listing::LoadOutcome;
use crate::domain::routes::Route;

use super::views;

/// Render whatever screen `route` points at.
pub async fn render_route(ctx: &ClientContext, route: &Route) -> Result<String, AppError> {
    debug!(route = %route, "Rendering screen");
    match route {
        Route::Home => render_home(ctx).await,
        Route::Vitamins => render_listing(ctx, 1, None).await,
        Route::VitaminDetail { id, .. } => match id.uuid() {
            Some(id) => render_detail(ctx, id).await,
            None => Ok(views::not_found()),
        },
        Route::ManageVitamins => render_manage(ctx).await,
        Route::Login => Ok(views::auth_prompt(AuthMode::SignIn)),
        Route::Signup => Ok(views::auth_prompt(AuthMode::SignUp)),
        Route::About => Ok(views::about()),
    }
}

pub async fn render_home(ctx: &ClientContext) -> Result<String, AppError> {
    let listing = ctx.listing();
    listing.load_page(0).await?;
    Ok(views::home(&listing.visible()))
}

/// Load `pages` pages (stopping early when the backend runs out) and render them.
///
/// The search filter, when given, is set first so it applies to every page.
pub async fn render_listing(
    ctx: &ClientContext,
    pages: u32,
    search: Option<&str>,
) -> Result<String, AppError> {
    let listing = ctx.listing();
    match search {
        Some(query) => listing.set_query(query).await?,
        None => listing.load_page(0).await?,
    };

    for _ in 1..pages {
        match listing.load_more().await? {
            LoadOutcome::Applied { .. } => {}
            LoadOutcome::Skipped | LoadOutcome::Superseded => break,
        }
    }

    Ok(views::listing(&listing.snapshot()))
}

pub async fn render_detail(ctx: &ClientContext, id: Uuid) -> Result<String, AppError> {
    let post = match ctx.detail().load(id).await? {
        PostDetail::Found(post) => post,
        PostDetail::NotFound => return Ok(views::not_found()),
    };

    let likes = ctx.like_button(post.id)?;
    let mut thread = ctx.comment_thread(post.id);
    let (outcome, ()) = futures::try_join!(likes.refresh(), thread.load())?;
    let snapshot = match outcome {
        ToggleOutcome::Applied(snapshot) => snapshot,
        ToggleOutcome::InFlight => likes.snapshot(),
    };

    Ok(views::detail(&post, &snapshot, &thread))
}

pub async fn render_manage(ctx: &ClientContext) -> Result<String, AppError> {
    let mut manage = ctx.manage();
    manage.refresh().await?;
    Ok(views::manage(manage.posts()))
}
