use std::{future::Future, path::PathBuf, sync::Arc};

use tracing_subscriber::EnvFilter;

mod article;
mod client;
mod comments;
mod compat;
mod config;
mod format;
mod generate;
mod listing;
mod model;
mod page;
mod preview;
mod routes;
mod site;

#[derive(thiserror::Error, Debug)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Content(#[from] client::ContentError),

    #[error(transparent)]
    Site(#[from] model::ApiError),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), StartupError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args();
    let program = args.next().unwrap_or_else(|| "spacetraveling".to_string());
    let config_path = args
        .next()
        .map(PathBuf::from)
        .ok_or(config::ConfigError::Usage(program))?;
    let config = config::Config::load(&config_path)?;
    tracing::debug!(endpoint = %config.repository.endpoint, "loaded configuration");

    let client = client::PrismicClient::new(
        config.repository.endpoint.clone(),
        config.repository.access_token.clone(),
    )?;
    let site = Arc::new(site::Site::new(&config, Arc::new(client))?);

    match generate::generate_all(&site).await {
        Ok(count) => tracing::info!(count, "static generation finished"),
        Err(error) => {
            tracing::warn!(%error, "static generation failed, articles will render on demand")
        }
    }

    let app = routes::router(
        site,
        config.site.static_dir.as_deref(),
        &config.net.base_path,
    );

    let listener = tokio::net::TcpListener::bind(config.net.bind).await?;
    tracing::info!(
        bind = %config.net.bind,
        public = %config.net.proto_host,
        "serving"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_on(tokio::signal::ctrl_c()))
        .await?;

    Ok(())
}

/// Resolves once `signal` fires. A signal that cannot be installed never
/// resolves, so the server keeps running.
async fn shutdown_on(signal: impl Future<Output = std::io::Result<()>>) {
    if let Err(error) = signal.await {
        tracing::error!(%error, "could not listen for ctrl-c, serving until killed");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
