use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};
use uuid::Uuid;

/// Command-line arguments for the `vitamins` binary.
#[derive(Debug, Parser)]
#[command(
    name = "vitamins",
    version,
    about = "Spiritual Vitamins client: browse, write and share short inspirational posts"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "VITAMINS_CONFIG_FILE",
        value_name = "PATH",
        global = true
    )]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: ClientOverrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ClientOverrides {
    /// Override the backend base URL.
    #[arg(long = "backend-url", value_name = "URL", global = true)]
    pub backend_url: Option<String>,

    /// Override the backend anonymous (public) key.
    #[arg(
        long = "anon-key",
        env = "VITAMINS_ANON_KEY",
        hide_env_values = true,
        value_name = "KEY",
        global = true
    )]
    pub anon_key: Option<String>,

    /// Override the directory holding local client state.
    #[arg(long = "state-dir", value_name = "PATH", global = true)]
    pub state_dir: Option<PathBuf>,

    /// Override the number of vitamins fetched per page.
    #[arg(long = "page-size", value_name = "COUNT", global = true)]
    pub page_size: Option<u32>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,

    /// Run against a seeded in-process backend instead of the hosted one.
    #[arg(long, action = clap::ArgAction::SetTrue, global = true)]
    pub offline: bool,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Render the screen behind a site path, e.g. `/vitamins` or `/about`.
    Open(OpenArgs),
    /// List vitamins newest first.
    List(ListArgs),
    /// Show one vitamin with its likes and comments.
    Show(ShowArgs),
    /// Create a vitamin (requires login).
    Create(CreateArgs),
    /// Edit an existing vitamin.
    Edit(EditArgs),
    /// Delete a vitamin.
    Delete(DeleteArgs),
    /// Like or unlike a vitamin.
    Like(LikeArgs),
    /// Comment on a vitamin (requires login).
    Comment(CommentArgs),
    /// Sign in with email and password.
    Login(LoginArgs),
    /// Create an account.
    Signup(SignupArgs),
    /// Forget the stored session.
    Logout,
    /// Print the signed-in account.
    Whoami,
    /// Print the URL slug generated for a title.
    Slug(SlugArgs),
}

#[derive(Debug, Args, Clone)]
pub struct OpenArgs {
    /// Site path to render.
    #[arg(value_name = "PATH", default_value = "/")]
    pub path: String,
}

#[derive(Debug, Args, Clone)]
pub struct ListArgs {
    /// Number of pages to load before printing.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub pages: u32,

    /// Case-insensitive title filter applied to the loaded pages.
    #[arg(long)]
    pub search: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct ShowArgs {
    pub id: Uuid,
}

#[derive(Debug, Args, Clone)]
pub struct CreateArgs {
    #[arg(long)]
    pub title: String,

    #[arg(long, conflicts_with = "content_file")]
    pub content: Option<String>,

    /// Read the body from a file instead of `--content`.
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub content_file: Option<PathBuf>,

    /// Image to upload with the vitamin.
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub image: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct EditArgs {
    pub id: Uuid,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long, conflicts_with = "content_file")]
    pub content: Option<String>,

    #[arg(long, value_hint = ValueHint::FilePath)]
    pub content_file: Option<PathBuf>,

    /// Replace the image; the current one is kept when omitted.
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub image: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct DeleteArgs {
    pub id: Uuid,

    /// Confirm the deletion.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub yes: bool,
}

#[derive(Debug, Args, Clone)]
pub struct LikeArgs {
    pub id: Uuid,
}

#[derive(Debug, Args, Clone)]
pub struct CommentArgs {
    pub id: Uuid,

    #[arg(long)]
    pub text: String,
}

#[derive(Debug, Args, Clone)]
pub struct LoginArgs {
    #[arg(long)]
    pub email: String,

    /// Password (read from the environment to keep it out of shell history).
    #[arg(long, env = "VITAMINS_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Debug, Args, Clone)]
pub struct SignupArgs {
    #[arg(long)]
    pub email: String,

    #[arg(long, env = "VITAMINS_PASSWORD", hide_env_values = true)]
    pub password: String,

    #[arg(long, env = "VITAMINS_CONFIRM_PASSWORD", hide_env_values = true)]
    pub confirm_password: String,
}

#[derive(Debug, Args, Clone)]
pub struct SlugArgs {
    pub title: String,
}
