use std::{process, sync::Arc};

use clap::Parser;
use rookery::{
    application::{error::AppError, feed::FeedService},
    cache::TimelineCache,
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, HttpState},
        memory::InMemoryRepositories,
        telemetry,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let cli_args = config::CliArgs::parse();
    let settings = config::load(&cli_args)
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(args) => run_serve(settings, args.in_memory).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
    }
}

async fn run_serve(settings: config::Settings, in_memory: bool) -> Result<(), AppError> {
    let cache = settings
        .cache
        .enabled
        .then(|| Arc::new(TimelineCache::new(&settings.cache)));

    let page_size = settings.feed.page_size.get();
    let (feed, db) = if in_memory {
        info!("serving from in-memory repositories");
        let repos = Arc::new(InMemoryRepositories::new());
        let feed = FeedService::new(
            repos.clone(),
            repos.clone(),
            repos.clone(),
            repos.clone(),
            repos,
            cache,
            page_size,
        );
        (Arc::new(feed), None)
    } else {
        let db = connect_database(&settings).await?;
        let feed = FeedService::new(
            db.clone(),
            db.clone(),
            db.clone(),
            db.clone(),
            db.clone(),
            cache,
            page_size,
        );
        (Arc::new(feed), Some(db))
    };

    let router = http::build_router(HttpState {
        feed,
        db,
        auth: settings.auth.clone(),
    });

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(addr = %settings.server.addr, "listening");

    axum::serve(listener, router.into_make_service())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    let db = connect_database(&settings).await?;
    PostgresRepositories::run_migrations(db.pool())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;
    info!("migrations applied");
    Ok(())
}

async fn connect_database(settings: &config::Settings) -> Result<Arc<PostgresRepositories>, AppError> {
    let url = settings.database.url.as_deref().ok_or_else(|| {
        AppError::from(InfraError::configuration(
            "database.url is required unless serving --in-memory",
        ))
    })?;

    let pool = PostgresRepositories::connect(url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;
    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}
