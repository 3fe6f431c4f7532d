//! Command handlers behind the `vitamins` binary.

use std::path::Path;

use bytes::Bytes;
use tracing::info;
use uuid::Uuid;

use crate::application::auth::{AuthForm, AuthOutcome};
use crate::application::comments::CommentOutcome;
use crate::application::context::ClientContext;
use crate::application::editor::{ImageAttachment, PostForm, SavedPost};
use crate::application::error::AppError;
use crate::application::likes::ToggleOutcome;
use crate::application::manage::{Confirmation, DeleteOutcome};
use crate::config::{
    Command, CommentArgs, CreateArgs, DeleteArgs, EditArgs, LikeArgs, ListArgs, LoginArgs,
    OpenArgs, ShowArgs, SignupArgs,
};
use crate::domain::routes::Route;
use crate::domain::slug::generate_slug;
use crate::infra::error::InfraError;

use super::{screens, views};

/// Run one command and return the text to print.
pub async fn execute(ctx: &ClientContext, command: Command) -> Result<String, AppError> {
    match command {
        Command::Open(args) => open(ctx, args).await,
        Command::List(args) => list(ctx, args).await,
        Command::Show(ShowArgs { id }) => screens::render_detail(ctx, id).await,
        Command::Create(args) => create(ctx, args).await,
        Command::Edit(args) => edit(ctx, args).await,
        Command::Delete(args) => delete(ctx, args).await,
        Command::Like(LikeArgs { id }) => like(ctx, id).await,
        Command::Comment(args) => comment(ctx, args).await,
        Command::Login(args) => login(ctx, args).await,
        Command::Signup(args) => signup(ctx, args).await,
        Command::Logout => {
            ctx.auth_service().sign_out()?;
            Ok("Signed out.".to_string())
        }
        Command::Whoami => Ok(whoami(ctx)),
        Command::Slug(args) => Ok(generate_slug(&args.title)),
    }
}

async fn open(ctx: &ClientContext, args: OpenArgs) -> Result<String, AppError> {
    let route: Route = args.path.parse()?;
    screens::render_route(ctx, &route).await
}

async fn list(ctx: &ClientContext, args: ListArgs) -> Result<String, AppError> {
    let search = args.search.as_deref().filter(|query| !query.is_empty());
    screens::render_listing(ctx, args.pages, search).await
}

async fn create(ctx: &ClientContext, args: CreateArgs) -> Result<String, AppError> {
    let mut form = PostForm::new();
    form.title = args.title;
    form.content = read_value(args.content, args.content_file.as_deref()).await?;
    if let Some(path) = args.image.as_deref() {
        form.attach_image(read_image(ctx, path).await?);
    }

    let saved = ctx.editor().submit(&mut form).await?;
    Ok(saved_message(&saved))
}

async fn edit(ctx: &ClientContext, args: EditArgs) -> Result<String, AppError> {
    let mut manage = ctx.manage();
    manage.refresh().await?;
    let mut form = manage.begin_edit(args.id).ok_or(AppError::NotFound)?;

    if let Some(title) = args.title {
        form.title = title;
    }
    if args.content.is_some() || args.content_file.is_some() {
        form.content = read_value(args.content, args.content_file.as_deref()).await?;
    }
    if let Some(path) = args.image.as_deref() {
        form.attach_image(read_image(ctx, path).await?);
    }

    let saved = ctx.editor().submit(&mut form).await?;
    manage.after_save(&saved).await?;
    Ok(saved_message(&saved))
}

async fn delete(ctx: &ClientContext, args: DeleteArgs) -> Result<String, AppError> {
    let confirmation = if args.yes {
        Confirmation::Confirmed
    } else {
        Confirmation::Declined
    };

    match ctx.manage().delete(args.id, confirmation).await? {
        DeleteOutcome::Deleted => Ok(format!("Deleted vitamin {}.", args.id)),
        DeleteOutcome::Cancelled => {
            Ok("Not deleted. Pass --yes to confirm the deletion.".to_string())
        }
    }
}

async fn like(ctx: &ClientContext, id: Uuid) -> Result<String, AppError> {
    let button = ctx.like_button(id)?;
    button.refresh().await?;
    match button.toggle().await? {
        ToggleOutcome::Applied(snapshot) => Ok(views::likes_line(&snapshot)),
        ToggleOutcome::InFlight => Ok(views::likes_line(&button.snapshot())),
    }
}

async fn comment(ctx: &ClientContext, args: CommentArgs) -> Result<String, AppError> {
    let mut thread = ctx.comment_thread(args.id);
    match thread.add_comment(&args.text).await? {
        CommentOutcome::Posted(comment) => Ok(format!(
            "Comment posted on {}.",
            Route::VitaminDetail {
                id: comment.post_id.into(),
                slug: None
            }
        )),
        CommentOutcome::SignInRequired(route) => {
            info!(redirect = %route, "Comment needs a signed-in user");
            Err(AppError::SignInRequired)
        }
    }
}

async fn login(ctx: &ClientContext, args: LoginArgs) -> Result<String, AppError> {
    let form = AuthForm::sign_in(args.email, args.password);
    match ctx.auth_service().submit(&form).await? {
        AuthOutcome::SignedIn(identity) => Ok(format!(
            "Signed in as {}.",
            identity.email.unwrap_or_else(|| identity.id.to_string())
        )),
        AuthOutcome::ConfirmationSent { email } => Ok(confirmation_message(&email)),
    }
}

async fn signup(ctx: &ClientContext, args: SignupArgs) -> Result<String, AppError> {
    let form = AuthForm::sign_up(args.email, args.password, args.confirm_password);
    match ctx.auth_service().submit(&form).await? {
        AuthOutcome::ConfirmationSent { email } => Ok(confirmation_message(&email)),
        AuthOutcome::SignedIn(identity) => Ok(format!("Signed in as {}.", identity.id)),
    }
}

fn whoami(ctx: &ClientContext) -> String {
    match ctx.session.identity() {
        Some(identity) => identity.email.unwrap_or_else(|| identity.id.to_string()),
        None => "Not signed in.".to_string(),
    }
}

fn confirmation_message(email: &str) -> String {
    format!("Check your email ({email}) for the confirmation link.")
}

fn saved_message(saved: &SavedPost) -> String {
    let verb = match saved {
        SavedPost::Created(_) => "Created",
        SavedPost::Updated(_) => "Updated",
    };
    let post = saved.post();
    format!("{verb} \"{}\" at {}", post.title, Route::for_post(post))
}

async fn read_value(value: Option<String>, file: Option<&Path>) -> Result<String, AppError> {
    match file {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .map_err(|err| AppError::from(InfraError::from(err))),
        None => Ok(value.unwrap_or_default()),
    }
}

async fn read_image(ctx: &ClientContext, path: &Path) -> Result<ImageAttachment, AppError> {
    let payload = tokio::fs::read(path)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    Ok(ImageAttachment::new(
        file_name,
        Bytes::from(payload),
        ctx.options.max_image_bytes,
    )?)
}
