use std::{process, sync::Arc};

use tracing::{Level, debug, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;
use vitamins::{
    application::{
        context::{ClientContext, ClientOptions},
        error::{AppError, ErrorReport},
        repos::LocalState,
        session::SessionStore,
    },
    config::{self, Command},
    domain::slug::generate_slug,
    infra::{
        local_store::{FileStateStore, MemoryState},
        memory::MemoryBackend,
        remote::RemoteClient,
        telemetry,
    },
    presentation::commands,
};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        eprintln!("error: {}", error.presentation_message());
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    let report = ErrorReport::from_error("vitamins::main", error);
    if dispatcher::has_been_set() {
        error!(source = report.source, error = %report.summary(), "command failed");
        return;
    }

    let subscriber = tracing_fmt()
        .with_writer(std::io::stderr)
        .with_max_level(Level::ERROR)
        .finish();
    let dispatch = dispatcher::Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(source = report.source, error = %report.summary(), "command failed");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    // Needs neither a backend nor local state.
    if let Command::Slug(args) = &cli_args.command {
        println!("{}", generate_slug(&args.title));
        return Ok(());
    }

    let session = SessionStore::default();
    let options = ClientOptions::from(&settings);

    let ctx = if cli_args.overrides.offline {
        info!("Running against the offline sample backend");
        let local: Arc<dyn LocalState> = Arc::new(MemoryState::new());
        ClientContext::from_backend(
            Arc::new(MemoryBackend::with_sample_content()),
            local,
            session,
            options,
        )
    } else {
        let client = RemoteClient::new(&settings.backend, session.clone())?;
        debug!(base = %client.base(), "Using hosted backend");
        let local: Arc<dyn LocalState> =
            Arc::new(FileStateStore::new(&settings.client.state_dir));
        ClientContext::from_backend(Arc::new(client), local, session, options)
    };

    if let Some(identity) = ctx.auth_service().restore()? {
        debug!(user_id = %identity.id, "Restored session");
    }

    let output = commands::execute(&ctx, cli_args.command).await?;
    println!("{output}");
    Ok(())
}
